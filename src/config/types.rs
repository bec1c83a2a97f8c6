use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Extension appended to a segment file name to name its index
    #[serde(default = "default_index_extension")]
    pub index_extension: String,

    /// File name of the segment manifest inside the recording directory
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Prefix for generated segment file names
    #[serde(default = "default_segment_prefix")]
    pub segment_prefix: String,

    /// Extension of generated segment files
    #[serde(default = "default_segment_extension")]
    pub segment_extension: String,

    /// Rotate once a segment reaches this many bytes (0 disables)
    #[serde(default = "default_max_segment_bytes")]
    pub max_segment_bytes: u64,

    /// Rotate once a segment spans this many timestamp units (0 disables)
    #[serde(default)]
    pub max_segment_duration: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            index_extension: default_index_extension(),
            manifest_name: default_manifest_name(),
            segment_prefix: default_segment_prefix(),
            segment_extension: default_segment_extension(),
            max_segment_bytes: default_max_segment_bytes(),
            max_segment_duration: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Resolve seeks outside the recorded range to the nearest known
    /// position instead of failing
    #[serde(default = "default_true")]
    pub clamp_to_nearest: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            clamp_to_nearest: true,
        }
    }
}

fn default_index_extension() -> String {
    "idx".to_string()
}

fn default_manifest_name() -> String {
    "recording.json".to_string()
}

fn default_segment_prefix() -> String {
    "seg".to_string()
}

fn default_segment_extension() -> String {
    "ts".to_string()
}

fn default_max_segment_bytes() -> u64 {
    2 * 1024 * 1024 * 1024
}

fn default_true() -> bool {
    true
}
