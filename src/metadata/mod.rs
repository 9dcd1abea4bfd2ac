use std::collections::{BTreeSet, HashSet};

pub const UNKNOWN: &str = "Unknown";

const INPUT_PREFIX: &str = "Input #0,";
const FROM_MARKER: &str = ", from";
const DURATION_LABEL: &str = "Duration:";
const VIDEO_LABEL: &str = "Video:";
const AUDIO_LABEL: &str = "Audio:";

/// Container vocabulary used for preset matching.
///
/// Demuxer names reported by the probing tool map onto these members;
/// anything unrecognised becomes [`ContainerFormat::Other`], which never
/// matches a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerFormat {
    Mov,
    Mp4,
    M4a,
    ThreeGp,
    ThreeG2,
    Mj2,
    Matroska,
    Webm,
    Avi,
    MpegTs,
    Mpeg,
    Flv,
    Asf,
    Ogg,
    Wav,
    Mp3,
    Flac,
    Gif,
    Other,
}

impl ContainerFormat {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "mov" | "qt" => Self::Mov,
            "mp4" | "m4v" => Self::Mp4,
            "m4a" => Self::M4a,
            "3gp" => Self::ThreeGp,
            "3g2" => Self::ThreeG2,
            "mj2" => Self::Mj2,
            "matroska" | "mkv" => Self::Matroska,
            "webm" => Self::Webm,
            "avi" => Self::Avi,
            "mpegts" | "ts" | "m2ts" => Self::MpegTs,
            "mpeg" | "mpg" | "vob" => Self::Mpeg,
            "flv" => Self::Flv,
            "asf" | "wmv" | "wma" => Self::Asf,
            "ogg" | "ogv" | "oga" => Self::Ogg,
            "wav" => Self::Wav,
            "mp3" => Self::Mp3,
            "flac" => Self::Flac,
            "gif" => Self::Gif,
            _ => Self::Other,
        }
    }
}

/// What the probing tool told us about one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub primary_format: String,
    /// Lowercase demuxer aliases from the `Input #0` line.
    pub format_identifiers: BTreeSet<String>,
    pub duration: Option<String>,
    pub video_summary: String,
    pub audio_summary: Option<String>,
}

impl Default for MediaMetadata {
    fn default() -> Self {
        Self {
            primary_format: UNKNOWN.to_string(),
            format_identifiers: BTreeSet::new(),
            duration: None,
            video_summary: UNKNOWN.to_string(),
            audio_summary: None,
        }
    }
}

impl MediaMetadata {
    /// Sorted, comma-joined uppercase identifiers, or the primary format when
    /// none were reported.
    pub fn format_summary(&self) -> String {
        if self.format_identifiers.is_empty() {
            return self.primary_format.clone();
        }

        let mut names: Vec<String> = self
            .format_identifiers
            .iter()
            .map(|id| id.to_uppercase())
            .collect();
        names.sort();
        names.join(", ")
    }

    pub fn containers(&self) -> HashSet<ContainerFormat> {
        self.format_identifiers
            .iter()
            .map(|id| ContainerFormat::from_token(id))
            .filter(|format| *format != ContainerFormat::Other)
            .collect()
    }

    /// Reported duration in seconds, when it is a `HH:MM:SS.ss` timestamp.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration.as_deref().and_then(parse_timestamp)
    }
}

/// Builds a [`MediaMetadata`] from the probing tool's combined output.
///
/// Unrecognised or empty text yields defaults; this never fails.
pub fn parse_probe_output(output: &str) -> MediaMetadata {
    let mut metadata = MediaMetadata::default();
    let mut seen_input = false;

    for line in output.lines() {
        let trimmed = line.trim_start();

        if !seen_input {
            if let Some(formats) = input_formats(trimmed) {
                seen_input = true;
                let tokens: Vec<String> = formats
                    .split(',')
                    .map(|token| token.trim().to_lowercase())
                    .filter(|token| !token.is_empty())
                    .collect();

                if let Some(first) = tokens.first() {
                    metadata.primary_format = first.to_uppercase();
                }
                metadata.format_identifiers.extend(tokens);
            }
        }

        if line.contains(DURATION_LABEL) {
            if let Some(segment) = line.split(',').find(|part| part.contains(DURATION_LABEL)) {
                let value = segment.replacen(DURATION_LABEL, "", 1).trim().to_string();
                metadata.duration = Some(value);
            }
        }

        // Multiple streams of the same kind: the last one reported wins.
        if let Some(summary) = stream_summary(line, VIDEO_LABEL) {
            metadata.video_summary = summary;
        }

        if let Some(summary) = stream_summary(line, AUDIO_LABEL) {
            metadata.audio_summary = Some(summary);
        }
    }

    metadata
}

fn input_formats(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(INPUT_PREFIX)?;
    let end = rest.find(FROM_MARKER)?;
    Some(&rest[..end])
}

fn stream_summary(line: &str, label: &str) -> Option<String> {
    line.find(label).map(|start| line[start..].trim().to_string())
}

/// Parses `HH:MM:SS(.fraction)` into seconds.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let mut parts = value.trim().split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
