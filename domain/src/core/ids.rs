//! Identifier value objects.
//!
//! - [`MeetingId`] - a meeting, the unit of room membership and participant scope
//! - [`RunId`] - one execution of a meeting's council
//! - [`AgentId`] - a participant agent
//! - [`ConnectionId`] - a live observer connection supplied by the transport

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the id carries no usable value.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a meeting.
    MeetingId
);

string_id!(
    /// Identifier of a single run of a meeting.
    ///
    /// Run ids are never reused: a stopped run stays stopped and the next
    /// run of the same meeting gets a fresh id.
    RunId
);

string_id!(
    /// Identifier of a participant agent.
    AgentId
);

string_id!(
    /// Identifier of an observer connection.
    ConnectionId
);

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl RunId {
    /// Generate a run id from the meeting id and start time.
    ///
    /// Format: `run_{meeting}_{YYYYMMDD_HHMMSS}_{seq}`. The process-wide
    /// sequence keeps ids unique for runs started within the same second.
    pub fn generate(meeting_id: &MeetingId, started_at: DateTime<Utc>) -> Self {
        let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "run_{}_{}_{}",
            meeting_id,
            started_at.format("%Y%m%d_%H%M%S"),
            seq
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_run_ids_are_unique() {
        let meeting = MeetingId::new("m1");
        let now = Utc::now();
        let a = RunId::generate(&meeting, now);
        let b = RunId::generate(&meeting, now);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("run_m1_"));
    }

    #[test]
    fn test_blank_ids() {
        assert!(MeetingId::new("").is_blank());
        assert!(MeetingId::new("  ").is_blank());
        assert!(!MeetingId::new("m1").is_blank());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = AgentId::new("expert_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"expert_1\"");
    }
}
