//! Observer connection port
//!
//! A [`Connection`] is one live observer subscribed to a meeting's event
//! stream. The transport (WebSocket, SSE, an in-process channel) implements
//! it; the room manager only ever sees this trait.

use async_trait::async_trait;
use council_domain::ConnectionId;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while delivering a frame to one connection
///
/// Delivery failures are transient per connection: the room manager prunes
/// the failing connection and carries on with everyone else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Connection closed")]
    Closed,

    #[error("Send timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A live observer connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Stable identity of this connection, unique per transport.
    fn id(&self) -> &ConnectionId;

    /// Deliver one serialized wire event.
    ///
    /// The same frame is shared by every member of a room, so it is handed
    /// over as an `Arc<str>` rather than copied per connection.
    async fn send(&self, frame: Arc<str>) -> Result<(), DeliveryError>;
}
