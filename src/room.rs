//! Room struct definition
//!
//! Represents a named chat room with an unordered member set.

use std::collections::HashSet;

use crate::types::ConnId;

/// Chat room
///
/// A room is a name plus the set of member connection IDs. Membership is
/// what matters; order is insignificant. Rooms are created on first
/// reference and (apart from the default room) garbage-collected when
/// they empty out.
#[derive(Debug)]
pub struct Room {
    /// Room name, unique within the directory
    pub name: String,
    /// Member set, by connection ID
    members: HashSet<ConnId>,
}

impl Room {
    /// Create a new empty room with the given name
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    /// Add a member to the room
    ///
    /// Idempotent: returns false if the user was already a member.
    pub fn add_member(&mut self, id: ConnId) -> bool {
        self.members.insert(id)
    }

    /// Remove a member from the room
    ///
    /// Returns false if the user was not a member.
    pub fn remove_member(&mut self, id: ConnId) -> bool {
        self.members.remove(&id)
    }

    /// Check if a connection is a member of this room
    pub fn contains(&self, id: ConnId) -> bool {
        self.members.contains(&id)
    }

    /// Check if the room has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Get the number of members in the room
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterate over the member connection IDs
    pub fn members(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.members.iter().copied()
    }
}
