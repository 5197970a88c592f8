//! In-process observer connection
//!
//! [`ChannelConnection`] hands wire frames to a bounded `mpsc` channel whose
//! receiver is owned by whoever renders them (a terminal printer, a socket
//! writer task). A full queue gets a short grace period; a receiver that is
//! gone or stays full fails the send, and the room prunes the connection.

use async_trait::async_trait;
use council_application::{Connection, DeliveryError};
use council_domain::ConnectionId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Default number of frames buffered per connection
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default grace period for a full queue
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Observer connection backed by a bounded channel
pub struct ChannelConnection {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<str>>,
    send_timeout: Duration,
    /// Frames that could not be delivered
    dropped_frames: AtomicU64,
}

impl ChannelConnection {
    /// Create a connection and the receiver its frames arrive on.
    pub fn new(
        id: impl Into<ConnectionId>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let connection = Self {
            id: id.into(),
            tx,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            dropped_frames: AtomicU64::new(0),
        };
        (connection, rx)
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    fn dropped(&self, error: DeliveryError) -> DeliveryError {
        self.dropped_frames.fetch_add(1, Ordering::Relaxed);
        error
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    async fn send(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        let frame = match self.tx.try_send(frame) {
            Ok(()) => return Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                return Err(self.dropped(DeliveryError::Closed));
            }
            Err(mpsc::error::TrySendError::Full(frame)) => frame,
        };

        warn!(
            connection_id = %self.id,
            frame_len = frame.len(),
            "Send queue full, waiting"
        );
        match tokio::time::timeout(self.send_timeout, self.tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(self.dropped(DeliveryError::Closed)),
            Err(_) => Err(self.dropped(DeliveryError::Timeout)),
        }
    }
}
