use crate::conversion::ConversionProgress;
use std::path::PathBuf;
use uuid::Uuid;

/// Pushed by the conversion service whenever its observable state changes.
///
/// Every event carries the id of the input selection it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    InputSelected {
        selection_id: Uuid,
        path: PathBuf,
    },
    MetadataLoaded {
        selection_id: Uuid,
        format_summary: String,
        preset_count: usize,
        is_fallback: bool,
    },
    MetadataFailed {
        selection_id: Uuid,
        error: String,
    },
    ConversionStarted {
        selection_id: Uuid,
        command: String,
    },
    ConversionProgress {
        selection_id: Uuid,
        progress: ConversionProgress,
    },
    ConversionCompleted {
        selection_id: Uuid,
        output_path: PathBuf,
    },
    ConversionFailed {
        selection_id: Uuid,
        error: String,
    },
    SelectionCleared,
}

impl AppEvent {
    /// One-line description for the activity history; `None` for noisy
    /// events.
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::InputSelected { path, .. } => Some(format!("Selected {}", path.display())),
            Self::MetadataLoaded {
                format_summary,
                preset_count,
                is_fallback,
                ..
            } => Some(if *is_fallback {
                format!("Detected {}; offering all {} presets", format_summary, preset_count)
            } else {
                format!("Detected {}; {} matching presets", format_summary, preset_count)
            }),
            Self::MetadataFailed { error, .. } => Some(format!("Could not read media info: {}", error)),
            Self::ConversionStarted { command, .. } => Some(format!("Started: {}", command)),
            Self::ConversionProgress { .. } => None,
            Self::ConversionCompleted { output_path, .. } => {
                Some(format!("Saved {}", output_path.display()))
            }
            Self::ConversionFailed { error, .. } => Some(format!("Conversion failed: {}", error)),
            Self::SelectionCleared => Some("Cleared selection".to_string()),
        }
    }
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
