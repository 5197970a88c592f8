//! Meeting store adapters

mod memory;

pub use memory::InMemoryMeetingStore;
