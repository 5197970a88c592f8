//! Helpers shared by use cases.

use crate::services::event_broker::EventSink;
use council_domain::{DomainEvent, MeetingId, StatusChange};

/// Publish scheduler status changes as `participant_status` events, in order.
pub(crate) fn publish_status_changes(
    events: &dyn EventSink,
    meeting_id: &MeetingId,
    changes: &[StatusChange],
) {
    for change in changes {
        events.emit_event(DomainEvent::participant_status(
            meeting_id.clone(),
            change.agent_id.clone(),
            change.role,
            change.status,
        ));
    }
}
