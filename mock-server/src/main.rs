use anyhow::Context;
use invoice_mock_server::config::load_config;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load config")?;

    let log_filter = format!(
        "{},invoice_mock_server={},tower_http=debug",
        config.log_level, config.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, page_size = config.page_size, "mock invoice backend listening");
    invoice_mock_server::run(listener, &config).await?;
    Ok(())
}
