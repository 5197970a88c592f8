//! Council services
//!
//! Long-lived, stateful components shared by all use cases:
//!
//! - [`ParticipantRegistry`]: participants and their turn status per meeting
//! - [`TurnScheduler`]: speaking orders per run
//! - [`RunController`]: run lifecycle per meeting
//! - [`RoomManager`]: observer connections per meeting
//! - [`EventBroker`]: ordered delivery of domain events to rooms
//!
//! [`CouncilServices`] constructs and wires them; nothing here is global.

pub mod event_broker;
pub mod participant_registry;
pub mod room_manager;
pub mod run_controller;
pub mod turn_scheduler;

pub use event_broker::{EventBroker, EventSink};
pub use participant_registry::ParticipantRegistry;
pub use room_manager::{RoomInfo, RoomManager};
pub use run_controller::{RunController, RunStatusView};
pub use turn_scheduler::{TurnScheduler, TurnUpdate};

use crate::config::CouncilConfig;
use crate::ports::event_journal::EventJournal;
use std::sync::Arc;

/// The wired set of council services
#[derive(Clone)]
pub struct CouncilServices {
    pub registry: Arc<ParticipantRegistry>,
    pub scheduler: Arc<TurnScheduler>,
    pub rooms: Arc<RoomManager>,
    pub broker: Arc<EventBroker>,
    pub controller: Arc<RunController>,
}

impl CouncilServices {
    pub fn new(config: &CouncilConfig, journal: Arc<dyn EventJournal>) -> Self {
        let registry = Arc::new(ParticipantRegistry::new());
        let scheduler = Arc::new(TurnScheduler::new(Arc::clone(&registry)));
        let rooms = Arc::new(RoomManager::new());
        let broker =
            Arc::new(EventBroker::new(Arc::clone(&rooms), config.broker()).with_journal(journal));
        let controller = Arc::new(RunController::new(broker.clone()));
        Self {
            registry,
            scheduler,
            rooms,
            broker,
            controller,
        }
    }

    /// Event sink used by use cases (the broker).
    pub fn events(&self) -> Arc<dyn EventSink> {
        self.broker.clone()
    }

    pub async fn start(&self) {
        self.broker.start().await;
    }

    pub async fn shutdown(&self) {
        self.broker.shutdown().await;
    }
}
