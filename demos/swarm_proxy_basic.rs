/// Basic example of running the swarm proxy
///
/// This example starts a proxy with the default configuration. Backend hosts
/// register themselves afterwards via POST /register.
///
/// Usage:
///   cargo run --example swarm_proxy_basic

use ollama_swarm_proxy::{ProxyConfig, SwarmProxy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = ProxyConfig::new(
        "0.0.0.0".to_string(), // Host
        8000,                  // Port
        60,                    // Inference timeout in seconds
        600,                   // Model-pull timeout in seconds
    );

    let proxy = SwarmProxy::new(config)?;

    println!("Starting swarm proxy on 0.0.0.0:8000");
    println!("Available endpoints:");
    println!("  - POST /register");
    println!("  - POST /unregister");
    println!("  - GET  /hosts");
    println!("  - POST /admin/pull");
    println!("  - GET  /admin/list_models");
    println!("  - ANY  /{{path}} (forwarded to a backend host)");

    proxy.start().await
}
