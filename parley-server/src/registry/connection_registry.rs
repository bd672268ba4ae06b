use crate::error::RouteError;
use parley_core::{ConnId, RoomId};
use std::collections::HashMap;

/// Source of truth for "which room is this connection in".
///
/// Not synchronized on its own: the router owns it together with the
/// [`RoomDirectory`](crate::RoomDirectory) so both change in one step.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnId, Option<RoomId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the id was already registered.
    pub fn register(&mut self, conn_id: ConnId) -> bool {
        if self.connections.contains_key(&conn_id) {
            return false;
        }
        self.connections.insert(conn_id, None);
        true
    }

    /// Forgets the connection and hands back the room it was in.
    /// Calling it again for the same id returns `None`.
    pub fn unregister(&mut self, conn_id: &ConnId) -> Option<RoomId> {
        self.connections.remove(conn_id).flatten()
    }

    pub fn room_of(&self, conn_id: &ConnId) -> Option<&RoomId> {
        self.connections.get(conn_id).and_then(Option::as_ref)
    }

    /// Replaces the connection's room, returning the previous one.
    pub fn set_room(
        &mut self,
        conn_id: &ConnId,
        room_id: Option<RoomId>,
    ) -> Result<Option<RoomId>, RouteError> {
        let Some(slot) = self.connections.get_mut(conn_id) else {
            return Err(RouteError::NotRegistered(conn_id.clone()));
        };
        Ok(std::mem::replace(slot, room_id))
    }

    pub fn contains(&self, conn_id: &ConnId) -> bool {
        self.connections.contains_key(conn_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
