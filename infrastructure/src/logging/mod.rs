//! Logging infrastructure: the durable event journal.
//!
//! Provides [`JsonlEventJournal`], a JSONL file writer that implements
//! the [`EventJournal`](council_application::EventJournal) port.

mod jsonl_journal;

pub use jsonl_journal::JsonlEventJournal;
