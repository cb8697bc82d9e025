//! Message routing
//!
//! Computes the recipient set for an outgoing message - every co-member
//! of every room the sender is in, plus every direct-connection peer,
//! deduplicated with the sender excluded - and fans the formatted text
//! out to each recipient's connection. Fan-out is best-effort: a failed
//! delivery is logged and does not affect the others.
//!
//! Runs entirely under read permission; it never mutates the directory.

use std::collections::HashSet;

use tracing::debug;

use crate::directory::Directory;
use crate::types::{ConnId, PROMPT};

/// Result of routing one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Message delivered to this many recipients
    Delivered(usize),
    /// Recipient set was empty; nothing was sent
    NoRecipients,
}

/// Frame a broadcast line for delivery
///
/// Recipients see the message outside their own command loop, so it is
/// prefixed with a newline and re-issues the prompt.
pub fn format_broadcast(from: &str, line: &str) -> String {
    format!("\n::{from}> {line}\n{PROMPT}")
}

/// Route `line` from `sender` to its recipient set
pub fn route(dir: &Directory, sender: ConnId, line: &str) -> RouteOutcome {
    let Some(me) = dir.find_user_by_conn(sender) else {
        return RouteOutcome::NoRecipients;
    };

    let mut recipients: HashSet<ConnId> = HashSet::new();

    // everyone sharing a room with the sender
    for room in dir.rooms() {
        if room.contains(sender) {
            recipients.extend(room.members().filter(|&m| m != sender));
        }
    }

    // every direct-connection peer
    recipients.extend(me.peers.iter().copied().filter(|&p| p != sender));

    if recipients.is_empty() {
        return RouteOutcome::NoRecipients;
    }

    let text = format_broadcast(&me.name, line);
    let mut delivered = 0;
    for id in recipients {
        // recipient set already excludes the sender; keep the check anyway
        if id == sender {
            continue;
        }
        if let Some(user) = dir.find_user_by_conn(id) {
            match user.send(&text) {
                Ok(()) => delivered += 1,
                Err(_) => debug!("Delivery to {} failed (channel closed)", id),
            }
        }
    }

    RouteOutcome::Delivered(delivered)
}
