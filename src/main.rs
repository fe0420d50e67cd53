use ollama_swarm_proxy::{ProxyConfig, SwarmProxy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = ProxyConfig {
        host: std::env::var("PROXY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: std::env::var("PROXY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000),
        ..ProxyConfig::default()
    };

    let proxy = SwarmProxy::new(config)?;
    proxy.start().await
}
