//! The credential store: the [`Account`] entity and its persistence contract.

mod entity;
mod memory;
mod postgres;
mod store;

pub use entity::{Account, AccountResponse};
pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;
pub use store::AccountStore;
