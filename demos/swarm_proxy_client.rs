/// Example client for the swarm proxy
///
/// Registers a backend host, lists the pool, and sends a generate request
/// through the proxy.
///
/// Usage:
///   cargo run --example swarm_proxy_client

use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let proxy_url = "http://localhost:8000";

    println!("Testing swarm proxy at {}", proxy_url);

    // Test 1: Register a backend host
    println!("\n1. Registering a backend host...");
    let register_response = client
        .post(format!("{}/register", proxy_url))
        .json(&json!({ "url": "http://localhost:11434" }))
        .send()
        .await?;
    println!("   Status: {}", register_response.status());
    println!("   Response: {}", register_response.text().await?);

    // Test 2: List the registered hosts
    println!("\n2. Listing registered hosts...");
    let hosts_response = client.get(format!("{}/hosts", proxy_url)).send().await?;
    println!("   Status: {}", hosts_response.status());
    println!("   Response: {}", hosts_response.text().await?);

    // Test 3: Send a generate request through the proxy
    println!("\n3. Sending /api/generate through the proxy...");
    let generate_request = json!({
        "model": "llama3",
        "prompt": "What is the capital of France?",
        "stream": false
    });

    match client
        .post(format!("{}/api/generate", proxy_url))
        .json(&generate_request)
        .send()
        .await
    {
        Ok(response) => {
            println!("   Status: {}", response.status());
            println!("   Response: {}", response.text().await?);
        }
        Err(e) => {
            println!("   Error: {}", e);
        }
    }

    // Test 4: Fan out a model listing to every host
    println!("\n4. Listing models on every host...");
    match client
        .get(format!("{}/admin/list_models", proxy_url))
        .send()
        .await
    {
        Ok(response) => {
            println!("   Status: {}", response.status());
            let results: serde_json::Value = response.json().await?;
            println!("   Response: {}", serde_json::to_string_pretty(&results)?);
        }
        Err(e) => {
            println!("   Error: {}", e);
        }
    }

    Ok(())
}
