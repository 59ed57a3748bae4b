use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let private_key = std::env::var("PRIVATE_API_KEY").unwrap_or_else(|_| "test-private".to_string());
    let public_key = std::env::var("PUBLIC_API_KEY").unwrap_or_else(|_| "test-public".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock Pivot Security API listening");
    mock_server::run(listener, mock_server::MockState::new(&private_key, &public_key)).await
}
