use parley_core::{ConnId, RoomId};
use std::collections::{HashMap, HashSet};

/// Room id → member set. Empty rooms are removed immediately.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, HashSet<ConnId>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn_id` to the room (creating it if needed) and returns the
    /// members that were already there. Rejoining is a no-op and returns an
    /// empty list.
    pub fn join(&mut self, room_id: &RoomId, conn_id: &ConnId) -> Vec<ConnId> {
        let members = self.rooms.entry(room_id.clone()).or_default();
        if members.contains(conn_id) {
            return Vec::new();
        }
        let previous = snapshot(members, conn_id);
        members.insert(conn_id.clone());
        previous
    }

    /// Removes `conn_id` and returns who is left, or `None` if it was not a
    /// member. The room entry is dropped once nobody remains.
    pub fn leave(&mut self, room_id: &RoomId, conn_id: &ConnId) -> Option<Vec<ConnId>> {
        let members = self.rooms.get_mut(room_id)?;
        if !members.remove(conn_id) {
            return None;
        }

        let remaining = snapshot(members, conn_id);
        if members.is_empty() {
            self.rooms.remove(room_id);
        }
        Some(remaining)
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ConnId> {
        self.rooms
            .get(room_id)
            .map(|members| {
                let mut ids: Vec<ConnId> = members.iter().cloned().collect();
                ids.sort();
                ids
            })
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_id: &RoomId, conn_id: &ConnId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|members| members.contains(conn_id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

// Sorted so fan-out order and `all-users` payloads are stable.
fn snapshot(members: &HashSet<ConnId>, exclude: &ConnId) -> Vec<ConnId> {
    let mut ids: Vec<ConnId> = members.iter().filter(|m| *m != exclude).cloned().collect();
    ids.sort();
    ids
}
