//! Shared directory of users, rooms, and direct connections
//!
//! The single unit of synchronization: every worker reads and mutates this
//! store through the gate. Users are keyed by connection ID, rooms by name
//! (which makes room names unique by construction), and the direct-connection
//! graph lives in the per-user peer sets, both halves always updated inside
//! the same call.
//!
//! All methods assume the caller holds the matching gate permission; the
//! only way to reach a `Directory` reference is through
//! [`DirectoryGate::with_read`](crate::gate::DirectoryGate::with_read) /
//! [`with_write`](crate::gate::DirectoryGate::with_write), so that holds by
//! construction.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::room::Room;
use crate::types::{bounded_name, ConnId};
use crate::user::User;

/// The shared store of all users, rooms, and direct-connection edges
#[derive(Debug, Default)]
pub struct Directory {
    /// All connected users: ConnId -> User
    users: HashMap<ConnId, User>,
    /// All rooms: name -> Room
    rooms: HashMap<String, Room>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user under `name`
    ///
    /// Inserts only if the display name is not already taken; on collision
    /// the insert is dropped and [`AppError::DuplicateName`] returned. The
    /// caller is expected to log and carry on rather than fail the
    /// connection (legacy permissive behavior).
    pub fn register_user(
        &mut self,
        id: ConnId,
        name: &str,
        sender: mpsc::UnboundedSender<String>,
    ) -> Result<(), AppError> {
        let name = bounded_name(name);
        if self.find_user_by_name(&name).is_some() {
            warn!("Duplicate name on registration: {}", name);
            return Err(AppError::DuplicateName(name));
        }
        self.users.insert(id, User::new(id, name, sender));
        Ok(())
    }

    /// Exact-match lookup by display name
    pub fn find_user_by_name(&self, name: &str) -> Option<&User> {
        self.users.values().find(|u| u.name == name)
    }

    /// Lookup by connection ID
    pub fn find_user_by_conn(&self, id: ConnId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Rename a user in place
    ///
    /// Uniqueness is deliberately not enforced here: `login` may produce
    /// duplicate display names. Returns false if the user is gone.
    pub fn rename_user(&mut self, id: ConnId, name: &str) -> bool {
        match self.users.get_mut(&id) {
            Some(user) => {
                user.rename(bounded_name(name));
                true
            }
            None => false,
        }
    }

    /// Create a room, or return silently if the name already exists
    pub fn create_room(&mut self, name: &str) {
        let name = bounded_name(name);
        if !self.rooms.contains_key(&name) {
            debug!("Room {} created", name);
            self.rooms.insert(name.clone(), Room::new(name));
        }
    }

    /// Lookup a room by name
    pub fn find_room(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    /// Add a user to a room
    ///
    /// Idempotent: returns false if the user was already a member or the
    /// room does not exist.
    pub fn add_member(&mut self, room: &str, id: ConnId) -> bool {
        match self.rooms.get_mut(room) {
            Some(room) => room.add_member(id),
            None => false,
        }
    }

    /// Remove a user from a room
    ///
    /// Signals [`AppError::NotAMember`] if the user was not a member (or
    /// the room does not exist); callers treat that as a silent no-op.
    pub fn remove_member(&mut self, room: &str, id: ConnId) -> Result<(), AppError> {
        match self.rooms.get_mut(room) {
            Some(room) => {
                if room.remove_member(id) {
                    Ok(())
                } else {
                    Err(AppError::NotAMember)
                }
            }
            None => Err(AppError::NotAMember),
        }
    }

    /// Iterate over all rooms
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Snapshot of all room names, iteration order insignificant
    pub fn list_room_names(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    /// Snapshot of all user display names, iteration order insignificant
    pub fn list_user_names(&self) -> Vec<String> {
        self.users.values().map(|u| u.name.clone()).collect()
    }

    /// Delete every empty room except `except`
    ///
    /// Called from the `leave` path only; teardown leaves empty rooms in
    /// place until the next `leave`.
    pub fn delete_empty_rooms(&mut self, except: &str) {
        self.rooms.retain(|name, room| {
            let keep = !room.is_empty() || name == except;
            if !keep {
                debug!("Room {} deleted (empty)", name);
            }
            keep
        });
    }

    /// Establish a direct connection between two users
    ///
    /// The edge is symmetric: both peer sets are updated before returning.
    /// Fails with [`AppError::SelfConnection`] for `a == b` and
    /// [`AppError::AlreadyConnected`] if the edge exists in either
    /// direction (no state change in either case).
    pub fn connect(&mut self, a: ConnId, b: ConnId) -> Result<(), AppError> {
        if a == b {
            return Err(AppError::SelfConnection);
        }
        if self.is_connected(a, b) {
            return Err(AppError::AlreadyConnected);
        }
        // Both endpoints must be present so the two halves stay in step
        if self.users.contains_key(&a) && self.users.contains_key(&b) {
            if let Some(ua) = self.users.get_mut(&a) {
                ua.peers.insert(b);
            }
            if let Some(ub) = self.users.get_mut(&b) {
                ub.peers.insert(a);
            }
        }
        Ok(())
    }

    /// Remove the direct connection between two users, both halves
    ///
    /// No-op if the edge is absent.
    pub fn disconnect(&mut self, a: ConnId, b: ConnId) {
        if let Some(ua) = self.users.get_mut(&a) {
            ua.peers.remove(&b);
        }
        if let Some(ub) = self.users.get_mut(&b) {
            ub.peers.remove(&a);
        }
    }

    /// Check for a direct connection in either direction
    pub fn is_connected(&self, a: ConnId, b: ConnId) -> bool {
        self.users.get(&a).is_some_and(|u| u.has_peer(b))
            || self.users.get(&b).is_some_and(|u| u.has_peer(a))
    }

    /// Remove a user and every relationship it participates in
    ///
    /// Strips room memberships, removes both halves of every direct
    /// connection, then drops the record. Runs to completion inside one
    /// writer critical section, so no reader can observe a half-removed
    /// user. Does not garbage-collect rooms emptied by the removal.
    pub fn remove_user_entirely(&mut self, id: ConnId) {
        for room in self.rooms.values_mut() {
            room.remove_member(id);
        }

        let peers: Vec<ConnId> = self
            .users
            .get(&id)
            .map(|u| u.peers.iter().copied().collect())
            .unwrap_or_default();
        for peer in peers {
            self.disconnect(id, peer);
        }

        self.users.remove(&id);
    }

    /// Drop every user and room at once
    ///
    /// Shutdown path only; dropping the users releases their outbound
    /// channels, which is what closes the client connections.
    pub fn clear(&mut self) {
        self.users.clear();
        self.rooms.clear();
    }

    /// Number of connected users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
