//! Multi-user TCP chat server - entry point
//!
//! Starts the listener, pre-creates the default room, and accepts
//! connections until a shutdown signal arrives.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bisonchat::gate::DirectoryGate;
use bisonchat::session::handle_connection;
use bisonchat::types::DEFAULT_ROOM;

/// Default server address
const DEFAULT_ADDR: &str = "0.0.0.0:8888";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=bisonchat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bisonchat=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let gate = Arc::new(DirectoryGate::default());

    // The default room exists before the first connection arrives
    gate.with_write(|dir| dir.create_room(DEFAULT_ROOM)).await;

    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", addr);

    // Main execution loop
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!("New connection from {}", peer);
                        let gate = gate.clone();

                        // Spawn a worker task for each connection
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, gate).await {
                                error!("Connection handler error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // Orderly shutdown under write permission: dropping every user record
    // drops its outbound channel, which ends the write tasks and closes
    // the client sockets
    let (users, rooms) = gate
        .with_write(|dir| {
            let counts = (dir.user_count(), dir.room_count());
            dir.clear();
            counts
        })
        .await;
    info!("Closed {} client(s), released {} room(s)", users, rooms);

    Ok(())
}
