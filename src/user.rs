//! User record definition
//!
//! Represents a connected user with their display name, outbound text
//! channel, and direct-connection peer set.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::types::ConnId;

/// Connected user information
///
/// Holds all per-user state owned by the directory: the connection ID,
/// the display name, the server-to-client text channel, and the set of
/// direct-connection peers. The peer set is this user's half of every
/// edge; the directory keeps both halves in step.
#[derive(Debug)]
pub struct User {
    /// Identifier of the connection this user arrived on
    pub id: ConnId,
    /// Display name (guest name until `login`)
    pub name: String,
    /// Server → client text channel
    pub sender: mpsc::UnboundedSender<String>,
    /// Direct-connection peers, by connection ID
    pub peers: HashSet<ConnId>,
}

impl User {
    /// Create a new user with the given ID, name, and sender channel
    pub fn new(id: ConnId, name: String, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            name,
            sender,
            peers: HashSet::new(),
        }
    }

    /// Send text to this user's connection
    ///
    /// Returns an error if the channel is closed (client disconnected).
    /// Never blocks; delivery is best-effort.
    pub fn send(&self, text: &str) -> Result<(), SendError> {
        self.sender
            .send(text.to_string())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Replace the display name in place
    pub fn rename(&mut self, name: String) {
        self.name = name;
    }

    /// Check whether this user holds a direct connection to `peer`
    pub fn has_peer(&self, peer: ConnId) -> bool {
        self.peers.contains(&peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_creation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let user = User::new(ConnId(7), "guest7".to_string(), tx);

        assert_eq!(user.name, "guest7");
        assert!(user.peers.is_empty());
    }

    #[tokio::test]
    async fn test_user_rename() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut user = User::new(ConnId(7), "guest7".to_string(), tx);

        user.rename("alice".to_string());
        assert_eq!(user.name, "alice");
    }

    #[tokio::test]
    async fn test_user_send_delivers_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let user = User::new(ConnId(7), "guest7".to_string(), tx);

        user.send("hello").unwrap();
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_user_send_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let user = User::new(ConnId(7), "guest7".to_string(), tx);

        drop(rx);
        assert!(matches!(user.send("hello"), Err(SendError::ChannelClosed)));
    }
}
