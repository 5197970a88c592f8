//! Participant domain.
//!
//! - [`entities::Participant`]: an agent seated in a meeting, with role and turn status
//! - [`speaking_order::SpeakingOrder`]: the deterministic rotation of turns for a run

pub mod entities;
pub mod speaking_order;
