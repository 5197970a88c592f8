//! Room manager: live observer connections per meeting.
//!
//! A room is the set of connections subscribed to one meeting. Each
//! connection is a member of at most one room. Broadcasts serialize an
//! event once, deliver to a snapshot of the room with the lock released,
//! and prune every connection whose send failed.

use crate::ports::connection::{Connection, DeliveryError};
use council_domain::{ConnectionId, MeetingId, WireEvent};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

type Room = HashMap<ConnectionId, Arc<dyn Connection>>;

#[derive(Default)]
struct Rooms {
    rooms: HashMap<MeetingId, Room>,
    memberships: HashMap<ConnectionId, MeetingId>,
}

impl Rooms {
    /// Remove a connection from `meeting_id`'s room, deleting the room when
    /// it becomes empty. No-op unless the connection is a member of that room.
    fn remove_from(&mut self, meeting_id: &MeetingId, conn_id: &ConnectionId) -> bool {
        if self.memberships.get(conn_id) != Some(meeting_id) {
            return false;
        }
        self.memberships.remove(conn_id);
        if let Some(room) = self.rooms.get_mut(meeting_id) {
            room.remove(conn_id);
            if room.is_empty() {
                self.rooms.remove(meeting_id);
            }
        }
        true
    }
}

/// Summary of a meeting's room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub meeting_id: MeetingId,
    pub active_connections: usize,
    pub is_active: bool,
}

/// Tracks observer connections per meeting and fans out wire events
#[derive(Default)]
pub struct RoomManager {
    state: RwLock<Rooms>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a meeting and greet it.
    ///
    /// Re-connecting to the same room is a no-op for membership; a
    /// connection that is in another room is moved. The new member then
    /// receives `connection_established`; if that send fails the
    /// connection is pruned and the error returned to the transport.
    pub async fn connect(
        &self,
        conn: Arc<dyn Connection>,
        meeting_id: &MeetingId,
    ) -> Result<(), DeliveryError> {
        let conn_id = conn.id().clone();
        let participants_count = {
            let mut state = self.state.write().await;
            if let Some(previous) = state.memberships.get(&conn_id).cloned()
                && previous != *meeting_id
            {
                state.remove_from(&previous, &conn_id);
                debug!(conn_id = %conn_id, from = %previous, to = %meeting_id, "Connection moved");
            }
            state
                .memberships
                .insert(conn_id.clone(), meeting_id.clone());
            let room = state.rooms.entry(meeting_id.clone()).or_default();
            room.insert(conn_id.clone(), Arc::clone(&conn));
            room.len()
        };

        info!(
            conn_id = %conn_id,
            meeting_id = %meeting_id,
            participants_count,
            "Connection joined room"
        );

        let greeting = WireEvent::connection_established(meeting_id.clone(), participants_count);
        let frame: Arc<str> = match greeting.to_frame() {
            Ok(json) => json.into(),
            Err(e) => {
                self.prune(meeting_id, std::slice::from_ref(&conn_id)).await;
                return Err(DeliveryError::Serialization(e.to_string()));
            }
        };

        if let Err(e) = conn.send(frame).await {
            warn!(conn_id = %conn_id, meeting_id = %meeting_id, error = %e, "Greeting failed, pruning connection");
            self.prune(meeting_id, std::slice::from_ref(&conn_id)).await;
            return Err(e);
        }
        Ok(())
    }

    /// Remove a connection from whatever room it is in. Unknown ids are a no-op.
    pub async fn disconnect(&self, conn_id: &ConnectionId) {
        let mut state = self.state.write().await;
        if let Some(meeting_id) = state.memberships.get(conn_id).cloned() {
            state.remove_from(&meeting_id, conn_id);
            info!(conn_id = %conn_id, meeting_id = %meeting_id, "Connection left room");
        }
    }

    /// Deliver an event to every member of a meeting's room.
    ///
    /// Never fails: connections that cannot be reached are pruned and the
    /// rest still receive the event. Returns the number of successful sends.
    pub async fn broadcast(&self, meeting_id: &MeetingId, event: &WireEvent) -> usize {
        let members: Vec<Arc<dyn Connection>> = {
            let state = self.state.read().await;
            match state.rooms.get(meeting_id) {
                Some(room) => room.values().cloned().collect(),
                None => return 0,
            }
        };

        let frame: Arc<str> = match event.to_frame() {
            Ok(json) => json.into(),
            Err(e) => {
                warn!(event_type = event.event_type(), error = %e, "Failed to serialize event");
                return 0;
            }
        };

        let results = join_all(members.iter().map(|conn| {
            let frame = Arc::clone(&frame);
            async move { (conn.id().clone(), conn.send(frame).await) }
        }))
        .await;

        let mut failed = Vec::new();
        for (conn_id, result) in results {
            if let Err(e) = result {
                warn!(conn_id = %conn_id, meeting_id = %meeting_id, error = %e, "Delivery failed, pruning connection");
                failed.push(conn_id);
            }
        }
        let delivered = members.len() - failed.len();
        debug!(
            event_type = event.event_type(),
            meeting_id = %meeting_id,
            delivered,
            pruned = failed.len(),
            "Broadcast event"
        );

        if !failed.is_empty() {
            self.prune(meeting_id, &failed).await;
        }
        delivered
    }

    async fn prune(&self, meeting_id: &MeetingId, conn_ids: &[ConnectionId]) {
        let mut state = self.state.write().await;
        for conn_id in conn_ids {
            state.remove_from(meeting_id, conn_id);
        }
    }

    pub async fn room_size(&self, meeting_id: &MeetingId) -> usize {
        let state = self.state.read().await;
        state.rooms.get(meeting_id).map(HashMap::len).unwrap_or(0)
    }

    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    pub async fn room_info(&self, meeting_id: &MeetingId) -> RoomInfo {
        let active_connections = self.room_size(meeting_id).await;
        RoomInfo {
            meeting_id: meeting_id.clone(),
            active_connections,
            is_active: active_connections > 0,
        }
    }

    /// Meeting a connection is subscribed to, if any.
    pub async fn membership(&self, conn_id: &ConnectionId) -> Option<MeetingId> {
        self.state.read().await.memberships.get(conn_id).cloned()
    }
}
