//! JSONL file writer for delivered wire events.
//!
//! Each [`WireEvent`] is serialized as a single JSON line carrying its
//! `type` and `payload` plus the `meeting_id` it was delivered to and a
//! `timestamp`, appended to the file via a buffered writer.

use council_application::EventJournal;
use council_domain::{MeetingId, WireEvent};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL event journal that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventJournal {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventJournal {
    /// Open a journal appending to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event journal directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event journal {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventJournal for JsonlEventJournal {
    fn record(&self, meeting_id: &MeetingId, event: &WireEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut record = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return,
            Err(e) => {
                warn!(event_type = event.event_type(), error = %e, "Could not journal event");
                return;
            }
        };
        record.insert(
            "meeting_id".to_string(),
            serde_json::Value::String(meeting_id.to_string()),
        );
        record.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Append-only, flush every line
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventJournal {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
