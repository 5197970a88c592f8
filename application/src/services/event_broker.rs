//! Event broker: ordered, non-blocking delivery of domain events.
//!
//! Producers call [`EventSink::emit_event`], which only enqueues onto an
//! unbounded FIFO channel and never waits. A single consumer task drains
//! the queue in order, maps each event to its [`WireEvent`] and hands it to
//! the [`RoomManager`]. All sends of one event complete before the next
//! event is dequeued, so observers of a meeting see events in emission
//! order.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──▶ start() ──▶ (emit_event ...) ──▶ shutdown()
//! ```
//!
//! Events emitted before `start()` wait in the queue. `flush()` waits for
//! the queue to run dry. `shutdown()` cancels the consumer, lets an
//! in-flight broadcast finish and discards whatever is still queued.

use crate::config::BrokerParams;
use crate::ports::event_journal::{EventJournal, NoEventJournal};
use crate::services::room_manager::RoomManager;
use council_domain::{DomainError, DomainEvent, WireEvent};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Anything that accepts domain events for delivery.
///
/// `emit_event` must not block or suspend: it is called from inside the
/// run controller's critical section.
pub trait EventSink: Send + Sync {
    fn emit_event(&self, event: DomainEvent);
}

/// Maps and fans out one event at a time
#[derive(Clone)]
struct Dispatcher {
    rooms: Arc<RoomManager>,
    journal: Arc<dyn EventJournal>,
}

impl Dispatcher {
    async fn deliver(&self, event: DomainEvent) {
        let Some(meeting_id) = event.meeting_id().cloned() else {
            warn!(
                event_type = event.event_type(),
                "Dropping event without meeting_id"
            );
            return;
        };
        let wire = WireEvent::from_domain(event);
        trace!(meeting_id = %meeting_id, event_type = wire.event_type(), "Dispatching event");
        self.rooms.broadcast(&meeting_id, &wire).await;
        self.journal.record(&meeting_id, &wire);
    }
}

/// Single-consumer event pipeline
pub struct EventBroker {
    sender: mpsc::UnboundedSender<DomainEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<DomainEvent>>>,
    dispatcher: Dispatcher,
    idle_wait: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    /// Events queued or being delivered
    pending: Arc<AtomicUsize>,
}

/// How often `flush` re-checks the queue.
const FLUSH_POLL: Duration = Duration::from_millis(10);

impl EventBroker {
    pub fn new(rooms: Arc<RoomManager>, params: &BrokerParams) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            dispatcher: Dispatcher {
                rooms,
                journal: Arc::new(NoEventJournal),
            },
            idle_wait: params.idle_wait,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Record every delivered wire event to `journal`.
    pub fn with_journal(mut self, journal: Arc<dyn EventJournal>) -> Self {
        self.dispatcher.journal = journal;
        self
    }

    /// Spawn the consumer task. Returns `false` if it was already started
    /// (or the broker was shut down).
    pub async fn start(&self) -> bool {
        let Some(receiver) = self.receiver.lock().await.take() else {
            warn!("Event broker already started");
            return false;
        };
        let handle = tokio::spawn(consume(
            receiver,
            self.dispatcher.clone(),
            self.idle_wait,
            self.cancel.clone(),
            Arc::clone(&self.pending),
        ));
        *self.task.lock().await = Some(handle);
        info!(idle_wait_ms = self.idle_wait.as_millis() as u64, "Event broker started");
        true
    }

    /// Stop the consumer and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        // Never started: drop the queue so later emits are discarded.
        self.receiver.lock().await.take();

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Event broker task ended abnormally");
        }
        info!("Event broker stopped");
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Events emitted but not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until every emitted event has been delivered, for at most
    /// `max_wait`. Returns whether the queue ran dry.
    pub async fn flush(&self, max_wait: Duration) -> bool {
        let drained = tokio::time::timeout(max_wait, async {
            while self.pending() > 0 && !self.is_shutting_down() {
                tokio::time::sleep(FLUSH_POLL).await;
            }
        })
        .await;
        drained.is_ok() && self.pending() == 0
    }

    /// Parse a producer's JSON event and enqueue it.
    ///
    /// A known event type with malformed fields is rejected; an unknown
    /// type is delivered as `unknown`.
    pub fn emit_json(&self, value: Value) -> Result<(), DomainError> {
        match DomainEvent::from_json(value) {
            Ok(event) => {
                self.emit_event(event);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Rejected producer event");
                Err(e)
            }
        }
    }
}

impl EventSink for EventBroker {
    fn emit_event(&self, event: DomainEvent) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            debug!(
                event_type = event.event_type(),
                "Event broker stopped, event discarded"
            );
        }
    }
}

async fn consume(
    mut receiver: mpsc::UnboundedReceiver<DomainEvent>,
    dispatcher: Dispatcher,
    idle_wait: Duration,
    cancel: CancellationToken,
    pending: Arc<AtomicUsize>,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = tokio::time::timeout(idle_wait, receiver.recv()) => match received {
                Ok(Some(event)) => {
                    dispatcher.deliver(event).await;
                    pending.fetch_sub(1, Ordering::SeqCst);
                }
                Ok(None) => break,
                Err(_) => continue,
            },
        }
    }

    receiver.close();
    let mut discarded = 0usize;
    while receiver.try_recv().is_ok() {
        discarded += 1;
    }
    pending.fetch_sub(discarded, Ordering::SeqCst);
    if discarded > 0 {
        debug!(discarded, "Discarded queued events on shutdown");
    }
}
