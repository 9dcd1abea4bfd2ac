use crate::metadata::parse_timestamp;
use crate::presets::ConversionPreset;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Argument list for the transcoding tool:
/// `-hide_banner -y -i <input> <preset options...> <output>`.
pub fn build_transcode_args(
    preset: &ConversionPreset,
    input: &Path,
    output: &Path,
) -> Vec<String> {
    let mut args = Vec::with_capacity(preset.options.len() + 5);
    args.push("-hide_banner".to_string());
    args.push("-y".to_string());
    args.push("-i".to_string());
    args.push(input.to_string_lossy().to_string());
    args.extend(preset.options.iter().map(|option| option.to_string()));
    args.push(output.to_string_lossy().to_string());
    args
}

/// Argument list for the probing tool: `-hide_banner <input>`.
pub fn build_probe_args(input: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        input.to_string_lossy().to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionProgress {
    /// Known only when the probe reported a duration.
    pub percentage: Option<f32>,
    pub current_frame: u32,
    pub fps: f32,
    pub speed: f32,
    pub bitrate: String,
    pub time_elapsed: String,
    pub size: String,
}

struct ProgressPatterns {
    frame: Regex,
    fps: Regex,
    time: Regex,
    speed: Regex,
    bitrate: Regex,
    size: Regex,
}

fn patterns() -> &'static ProgressPatterns {
    static PATTERNS: OnceLock<ProgressPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ProgressPatterns {
        frame: Regex::new(r"frame=\s*(\d+)").expect("frame pattern"),
        fps: Regex::new(r"fps=\s*([\d.]+)").expect("fps pattern"),
        time: Regex::new(r"time=\s*(-?\d+:\d{2}:\d{2}(?:\.\d+)?)").expect("time pattern"),
        speed: Regex::new(r"speed=\s*([\d.]+)x").expect("speed pattern"),
        bitrate: Regex::new(r"bitrate=\s*([\d.]+\w+/s)").expect("bitrate pattern"),
        size: Regex::new(r"size=\s*(\d+\w+)").expect("size pattern"),
    })
}

/// Reads the transcoder's periodic status lines.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    duration_seconds: Option<f64>,
}

impl ProgressParser {
    pub fn new(duration_seconds: Option<f64>) -> Self {
        Self {
            duration_seconds: duration_seconds.filter(|duration| *duration > 0.0),
        }
    }

    /// Returns `None` for anything that is not a status line.
    pub fn parse_line(&self, line: &str) -> Option<ConversionProgress> {
        let patterns = patterns();
        if !line.contains("time=") || !(line.contains("frame=") || line.contains("size=")) {
            return None;
        }

        let mut progress = ConversionProgress::default();

        if let Some(caps) = patterns.frame.captures(line) {
            progress.current_frame = caps[1].parse().unwrap_or(0);
        }

        if let Some(caps) = patterns.fps.captures(line) {
            progress.fps = caps[1].parse().unwrap_or(0.0);
        }

        if let Some(caps) = patterns.speed.captures(line) {
            progress.speed = caps[1].parse().unwrap_or(0.0);
        }

        if let Some(caps) = patterns.bitrate.captures(line) {
            progress.bitrate = caps[1].to_string();
        }

        if let Some(caps) = patterns.size.captures(line) {
            progress.size = caps[1].to_string();
        }

        if let Some(caps) = patterns.time.captures(line) {
            progress.time_elapsed = caps[1].to_string();

            if let (Some(elapsed), Some(duration)) =
                (parse_timestamp(&caps[1]), self.duration_seconds)
            {
                let percentage = (elapsed / duration * 100.0).clamp(0.0, 100.0);
                progress.percentage = Some(percentage as f32);
            }
        }

        Some(progress)
    }
}
