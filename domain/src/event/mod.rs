//! Event domain.
//!
//! - [`domain_event::DomainEvent`]: what producers report about a meeting
//! - [`wire::WireEvent`]: what observers receive, one JSON object per message

pub mod domain_event;
pub mod wire;
