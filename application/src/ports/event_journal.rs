//! Port for journaling delivered wire events.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while a journal keeps the exact stream that
//! observers of a meeting received, in a machine-readable format (JSONL).

use council_domain::{MeetingId, WireEvent};

/// Port for recording every wire event the broker delivers.
///
/// `record` is synchronous and non-fallible so it never holds up delivery;
/// implementations log and swallow their own failures.
pub trait EventJournal: Send + Sync {
    fn record(&self, meeting_id: &MeetingId, event: &WireEvent);
}

/// No-op implementation for tests and when journaling is disabled.
pub struct NoEventJournal;

impl EventJournal for NoEventJournal {
    fn record(&self, _meeting_id: &MeetingId, _event: &WireEvent) {}
}
