use crate::metadata::{ContainerFormat, MediaMetadata};
use std::fmt;

use ContainerFormat::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresetId(pub &'static str);

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetCategory {
    Remux,
    Video,
    Audio,
    Animation,
    Professional,
}

impl fmt::Display for PresetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remux => write!(f, "Fast Remux"),
            Self::Video => write!(f, "Video"),
            Self::Audio => write!(f, "Audio Extraction"),
            Self::Animation => write!(f, "Animation"),
            Self::Professional => write!(f, "Professional"),
        }
    }
}

/// A fixed bundle of transcoder options.
#[derive(Debug, PartialEq, Eq)]
pub struct ConversionPreset {
    pub id: PresetId,
    pub name: &'static str,
    pub description: &'static str,
    pub category: PresetCategory,
    /// Without the leading dot.
    pub output_extension: &'static str,
    /// Empty means the preset works from any source container.
    pub supported_containers: &'static [ContainerFormat],
    /// Inserted between the input and the output path.
    pub options: &'static [&'static str],
}

impl ConversionPreset {
    pub fn is_universal(&self) -> bool {
        self.supported_containers.is_empty()
    }

    pub fn supports(&self, container: ContainerFormat) -> bool {
        self.supported_containers.contains(&container)
    }
}

static CATALOG: &[ConversionPreset] = &[
    ConversionPreset {
        id: PresetId("remux-mp4"),
        name: "Fast Remux to MP4",
        description: "Copy all streams into an MP4 container without re-encoding",
        category: PresetCategory::Remux,
        output_extension: "mp4",
        supported_containers: &[Mov, Mp4, M4a, ThreeGp, ThreeG2, Mj2, Matroska, MpegTs],
        options: &["-c", "copy", "-movflags", "+faststart"],
    },
    ConversionPreset {
        id: PresetId("h264-mp4"),
        name: "Web Standard (H.264/MP4)",
        description: "Standard web video with good quality/size balance",
        category: PresetCategory::Video,
        output_extension: "mp4",
        supported_containers: &[
            Mov, Mp4, M4a, ThreeGp, ThreeG2, Matroska, Webm, Avi, MpegTs, Mpeg, Flv, Asf, Ogg,
        ],
        options: &[
            "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p", "-c:a",
            "aac", "-b:a", "192k", "-movflags", "+faststart",
        ],
    },
    ConversionPreset {
        id: PresetId("hevc-mp4"),
        name: "Small File Size (H.265/MP4)",
        description: "Smaller files with the H.265 codec, tagged for Apple players",
        category: PresetCategory::Video,
        output_extension: "mp4",
        supported_containers: &[Mov, Mp4, M4a, Matroska, MpegTs],
        options: &[
            "-c:v", "libx265", "-crf", "28", "-tag:v", "hvc1", "-c:a", "aac", "-b:a", "160k",
        ],
    },
    ConversionPreset {
        id: PresetId("remux-mkv"),
        name: "Fast Remux to MKV",
        description: "Copy all streams into a Matroska container without re-encoding",
        category: PresetCategory::Remux,
        output_extension: "mkv",
        supported_containers: &[Mov, Mp4, M4a, Matroska, Webm, Avi, MpegTs, Flv],
        options: &["-map", "0", "-c", "copy"],
    },
    ConversionPreset {
        id: PresetId("vp9-webm"),
        name: "WebM for Web (VP9/Opus)",
        description: "WebM format optimized for web playback",
        category: PresetCategory::Video,
        output_extension: "webm",
        supported_containers: &[Mov, Mp4, Matroska, Webm, Avi, Flv, Ogg],
        options: &[
            "-c:v", "libvpx-vp9", "-crf", "32", "-b:v", "0", "-row-mt", "1", "-c:a", "libopus",
            "-b:a", "128k",
        ],
    },
    ConversionPreset {
        id: PresetId("prores-mov"),
        name: "Editing Intermediate (ProRes/MOV)",
        description: "ProRes 422 HQ video with PCM audio for editing software",
        category: PresetCategory::Professional,
        output_extension: "mov",
        supported_containers: &[Mov, Mp4, Matroska, Webm, Avi, MpegTs],
        options: &[
            "-c:v", "prores_ks", "-profile:v", "3", "-c:a", "pcm_s16le",
        ],
    },
    ConversionPreset {
        id: PresetId("audio-mp3"),
        name: "Extract Audio (MP3)",
        description: "Drop the video and encode the audio as variable bitrate MP3",
        category: PresetCategory::Audio,
        output_extension: "mp3",
        supported_containers: &[],
        options: &["-vn", "-c:a", "libmp3lame", "-q:a", "2"],
    },
    ConversionPreset {
        id: PresetId("audio-aac"),
        name: "Extract Audio (AAC/M4A)",
        description: "Drop the video and encode the audio as 192 kb/s AAC",
        category: PresetCategory::Audio,
        output_extension: "m4a",
        supported_containers: &[],
        options: &["-vn", "-c:a", "aac", "-b:a", "192k"],
    },
    ConversionPreset {
        id: PresetId("audio-wav"),
        name: "Audio-Only PCM WAV",
        description: "Extract audio to uncompressed PCM WAV format",
        category: PresetCategory::Audio,
        output_extension: "wav",
        supported_containers: &[],
        options: &["-vn", "-c:a", "pcm_s16le"],
    },
    ConversionPreset {
        id: PresetId("gif"),
        name: "Animated GIF",
        description: "480px wide looping GIF at 12 fps with a generated palette",
        category: PresetCategory::Animation,
        output_extension: "gif",
        supported_containers: &[],
        options: &[
            "-vf",
            "fps=12,scale=480:-1:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
            "-loop",
            "0",
        ],
    },
];

/// The built-in presets in declaration order.
pub fn catalog() -> &'static [ConversionPreset] {
    CATALOG
}

/// Presets offered for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetMatch {
    pub presets: Vec<&'static ConversionPreset>,
    /// True when the list is the whole catalog because nothing narrowed it.
    pub is_fallback: bool,
}

impl PresetMatch {
    pub fn default_selection(&self) -> Option<&'static ConversionPreset> {
        self.presets.first().copied()
    }
}

pub fn match_presets(metadata: Option<&MediaMetadata>) -> PresetMatch {
    match_presets_in(CATALOG, metadata)
}

/// Filters `catalog` against the detected containers, keeping declaration
/// order. Falls back to the whole catalog when there is no metadata or when
/// nothing survives the filter.
pub fn match_presets_in(
    catalog: &'static [ConversionPreset],
    metadata: Option<&MediaMetadata>,
) -> PresetMatch {
    let full = || PresetMatch {
        presets: catalog.iter().collect(),
        is_fallback: true,
    };

    let Some(metadata) = metadata else {
        return full();
    };

    let containers = metadata.containers();
    let presets: Vec<&'static ConversionPreset> = catalog
        .iter()
        .filter(|preset| {
            preset.is_universal() || containers.iter().any(|container| preset.supports(*container))
        })
        .collect();

    if presets.is_empty() {
        tracing::debug!(
            "No preset matches {}, offering the full catalog",
            metadata.format_summary()
        );
        return full();
    }

    PresetMatch {
        presets,
        is_fallback: false,
    }
}
