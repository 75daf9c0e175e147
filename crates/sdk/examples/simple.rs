//! Simple SDK Example
//!
//! Walks one client through the chair: register, call, complete.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    WALKIN_PERSIST=false cargo run --package walkin-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package walkin-sdk --example simple
//!    ```

use walkin_sdk::{StatsRequest, WalkinClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("WALKIN_RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:9610".into());
    println!("Walk-in SDK - Simple Example");
    println!("============================\n");

    // 1. Connect to daemon
    let client = WalkinClient::connect(&url).await?;
    let status = client.status().await?;
    println!("1. Connected to v{} ({} providers)\n", status.version, status.providers_total);

    // 2. Reuse or create a provider
    let provider = match client
        .list_providers()
        .await?
        .into_iter()
        .find(|p| p.name == "Example Barber")
    {
        Some(p) => p,
        None => client.create_provider("Example Barber").await?,
    };
    println!("2. Provider: {} ({})\n", provider.name, provider.id);

    // 3. Register a walk-in
    let ticket = client.register("Example Client", 99, &provider.id).await?;
    println!(
        "3. Registered #{} at position {}\n",
        ticket.display_number, ticket.position
    );

    // 4. Call the next client and finish the service
    if let Some(serving) = client.call_next(&provider.id).await? {
        println!("4. Now serving #{} {}", serving.display_number, serving.client_name);
        let done = client.complete(&serving.id).await?;
        println!("   Finished as {}\n", done.state);
    } else {
        println!("4. Chair busy, ticket stays in line\n");
    }

    // 5. Today's numbers
    let stats = client.stats(StatsRequest::default()).await?;
    println!(
        "5. Today: {} completed, avg wait {} ms",
        stats.totals.completed_count, stats.totals.avg_wait_ms
    );

    Ok(())
}
