use crate::conversion::ConversionProgress;
use crate::metadata::MediaMetadata;
use crate::presets::{ConversionPreset, PresetId, PresetMatch};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversionStatus {
    #[default]
    Idle,
    FetchingMetadata,
    Ready,
    Converting {
        start_time: Instant,
        progress: ConversionProgress,
    },
    Succeeded {
        output_path: PathBuf,
        duration: Duration,
    },
    Failed {
        error: String,
    },
}

impl ConversionStatus {
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::FetchingMetadata)
    }

    pub fn is_converting(&self) -> bool {
        matches!(self, Self::Converting { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    pub fn accepts_conversion(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::FetchingMetadata => "Reading media info",
            Self::Ready => "Ready",
            Self::Converting { .. } => "Converting",
            Self::Succeeded { .. } => "Completed",
            Self::Failed { .. } => "Failed",
        }
    }

    pub fn transition_to_converting() -> Self {
        Self::Converting {
            start_time: Instant::now(),
            progress: ConversionProgress::default(),
        }
    }

    pub fn update_progress(&mut self, new_progress: ConversionProgress) {
        if let Self::Converting { progress, .. } = self {
            *progress = new_progress;
        }
    }

    pub fn transition_to_succeeded(self, output_path: PathBuf) -> Self {
        match self {
            Self::Converting { start_time, .. } => Self::Succeeded {
                output_path,
                duration: start_time.elapsed(),
            },
            _ => self,
        }
    }

    pub fn transition_to_failed(self, error: String) -> Self {
        match self {
            Self::Converting { .. } => Self::Failed { error },
            _ => self,
        }
    }
}

/// Everything derived from the currently selected input file.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub input_file: Option<PathBuf>,
    pub metadata: Option<MediaMetadata>,
    /// Probe failure text; conversion stays possible with fallback presets.
    pub probe_error: Option<String>,
    pub presets: Vec<&'static ConversionPreset>,
    pub is_fallback: bool,
    pub selected_preset: Option<&'static ConversionPreset>,
    pub output_file: Option<PathBuf>,
    pub log: String,
    pub status: ConversionStatus,
}

impl Selection {
    pub fn for_input(path: PathBuf) -> Self {
        Self {
            input_file: Some(path),
            status: ConversionStatus::FetchingMetadata,
            ..Self::default()
        }
    }

    pub fn apply_presets(&mut self, matched: PresetMatch) {
        self.selected_preset = matched.default_selection();
        self.is_fallback = matched.is_fallback;
        self.presets = matched.presets;
    }

    pub fn select_preset(&mut self, id: PresetId) -> bool {
        match self.presets.iter().find(|preset| preset.id == id) {
            Some(preset) => {
                self.selected_preset = Some(*preset);
                true
            }
            None => false,
        }
    }

    pub fn can_start_conversion(&self) -> bool {
        self.input_file.is_some() && self.selected_preset.is_some() && self.status.accepts_conversion()
    }

    pub fn append_log(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.log.is_empty() && !self.log.ends_with('\n') {
            self.log.push('\n');
        }
        self.log.push_str(text);
    }

    pub fn complete_conversion(&mut self, output_path: PathBuf) {
        let old_status = std::mem::take(&mut self.status);
        self.status = old_status.transition_to_succeeded(output_path);
    }

    pub fn fail_conversion(&mut self, error: String) {
        let old_status = std::mem::take(&mut self.status);
        self.status = old_status.transition_to_failed(error);
    }
}
