// App Constants
pub const APP_NAME: &str = "FFmpeg Preset Converter";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONFIG_DIR_NAME: &str = "preset-converter";

// External tools, looked up on PATH unless configured
pub const DEFAULT_PROBE_TOOL: &str = "ffprobe";
pub const DEFAULT_TRANSCODE_TOOL: &str = "ffmpeg";

pub const NO_OUTPUT_NOTICE: &str = "Conversion completed without additional output.";

// UI
pub const REPAINT_INTERVAL_MS: u64 = 100;
pub const MAX_LOG_LINES: usize = 1000;

// File dialog filter
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp", "ogv", "ts", "m2ts", "mpg",
    "mp3", "m4a", "wav", "flac", "ogg", "gif",
];
