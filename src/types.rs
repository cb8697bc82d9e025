//! Basic type definitions and protocol constants
//!
//! Provides the connection identifier newtype plus the handful of
//! protocol-wide constants (default room, prompt marker, name bound).

use std::sync::atomic::{AtomicU64, Ordering};

/// Room every connection is placed into on arrival.
///
/// Exempt from empty-room garbage collection.
pub const DEFAULT_ROOM: &str = "Lobby";

/// Prompt marker terminating every server response.
pub const PROMPT: &str = "chat>";

/// Banner sent on connect, prompt included.
pub const MOTD: &str = "Thanks for connecting to the BisonChat Server.\n\nchat>";

/// Maximum length of user and room names, in characters.
pub const MAX_NAME_LEN: usize = 30;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique connection identifier (newtype pattern)
///
/// Allocated from a process-wide monotone counter when a connection is
/// accepted, so it doubles as the seed for the `guest<N>` default name.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

impl ConnId {
    /// Allocate the next connection ID
    pub fn next() -> Self {
        Self(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Default display name for this connection
    pub fn guest_name(&self) -> String {
        format!("guest{}", self.0)
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clamp a user-supplied name to [`MAX_NAME_LEN`] characters.
///
/// Over-long names are truncated, not rejected.
pub fn bounded_name(raw: &str) -> String {
    raw.chars().take(MAX_NAME_LEN).collect()
}
