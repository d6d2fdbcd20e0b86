use gatewarden::{ConfigBuilder, init_tracing, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build()?;

    init_tracing(&config.logging);

    server::run(config).await?;
    Ok(())
}
