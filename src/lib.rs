//! Multi-user TCP Chat Server Library
//!
//! A line-protocol chat server where clients adopt usernames, join rooms,
//! and form direct connections, with messages routed by shared-room
//! membership and the direct-connection graph.
//!
//! # Features
//! - Guest identity on connect, `login` to rename
//! - Named rooms with create/join/leave and empty-room collection
//! - Symmetric direct connections (DMs) between users
//! - Broadcast routing over room co-members and DM peers, deduplicated
//! - Reader-priority reader/writer gate around all shared state
//!
//! # Architecture
//! One worker task per connection; the only shared state is the
//! [`Directory`](directory::Directory) behind a
//! [`DirectoryGate`](gate::DirectoryGate):
//! - Workers execute commands inside `with_read`/`with_write` sections
//! - Any number of readers share the gate; writers are exclusive
//! - Each user's outbound text flows through its own channel to a
//!   dedicated socket-write task
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use bisonchat::{gate::DirectoryGate, session::handle_connection, types::DEFAULT_ROOM};
//!
//! #[tokio::main]
//! async fn main() {
//!     let gate = Arc::new(DirectoryGate::default());
//!     gate.with_write(|dir| dir.create_room(DEFAULT_ROOM)).await;
//!
//!     let listener = TcpListener::bind("127.0.0.1:8888").await.unwrap();
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let gate = gate.clone();
//!         tokio::spawn(handle_connection(stream, gate));
//!     }
//! }
//! ```

pub mod command;
pub mod directory;
pub mod error;
pub mod gate;
pub mod room;
pub mod router;
pub mod session;
pub mod types;
pub mod user;

// Re-export main types for convenience
pub use command::Command;
pub use directory::Directory;
pub use error::{AppError, SendError};
pub use gate::DirectoryGate;
pub use room::Room;
pub use router::{route, RouteOutcome};
pub use session::handle_connection;
pub use types::ConnId;
pub use user::User;
