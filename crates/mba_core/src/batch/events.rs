//! Events emitted by the batch worker.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One message from the worker to the consumer.
///
/// The serialized form (tag plus field names) is a stable contract for
/// consumers that persist or forward the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Work on a new file is starting. `index` is 1-based.
    BatchProgress {
        index: usize,
        total: usize,
        filename: String,
    },
    /// Human-readable stage description for the current file.
    Status { message: String },
    /// Packet-sampling progress for the current file, 0 to 100.
    Progress { value: u32 },
    /// The current file finished; `path` is the rendered chart.
    FileComplete { path: PathBuf },
    /// The current file failed. The batch moves on to the next file.
    Error { message: String },
    /// Every file has been processed. Always the final event.
    BatchComplete { total: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let event = AnalysisEvent::BatchProgress {
            index: 1,
            total: 3,
            filename: "clip.mkv".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"batch_progress\""));
        assert!(json.contains("\"index\":1"));
        assert!(json.contains("\"filename\":\"clip.mkv\""));

        let json = serde_json::to_string(&AnalysisEvent::BatchComplete { total: 3 }).unwrap();
        assert!(json.contains("\"type\":\"batch_complete\""));
    }

    #[test]
    fn events_round_trip() {
        let event = AnalysisEvent::Progress { value: 42 };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: AnalysisEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
