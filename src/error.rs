//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (reported to the client, no state change).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the transport (fatal for the session)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Registration-time display name collision; the insert is dropped
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Attempt to direct-connect a user to itself
    #[error("Cannot connect to yourself")]
    SelfConnection,

    /// Direct connection already exists in either direction
    #[error("Already connected")]
    AlreadyConnected,

    /// Remove of a user from a room it was not a member of
    #[error("Not a member of the room")]
    NotAMember,
}

/// Message send errors
///
/// Occurs when attempting to deliver text through a closed outbound channel.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
