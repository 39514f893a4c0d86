//! A standalone town server: five-player rooms relaying movement
//! between browser clients.
//!
//! Run with `cargo run -p town-relay`, point clients at
//! `ws://127.0.0.1:3000`, and watch frames with
//! `RUST_LOG=tilemates=debug`.

use tilemates::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("town_relay=info".parse()?)
                .add_directive("tilemates=info".parse()?),
        )
        .init();

    let addr = std::env::var("TOWN_RELAY_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    let server = Server::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "town relay listening");

    server.run().await?;
    Ok(())
}
