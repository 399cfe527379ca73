use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| std::io::Error::other(format!("failed to init logging: {e}")))
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    init_logging()?;
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(user = mock_server::USER, token = mock_server::TOKEN, "serving /v1/ on {addr}");
    mock_server::run(listener).await
}
