//! Error types for towebm.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving a conversion request.
///
/// Everything here is detected before the first ffmpeg command runs. Failures of
/// ffmpeg itself are reported as exit codes by the runner, not as errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("--duration and --end may not be used together")]
    DurationWithEnd,

    #[error("--segment may not be used with other segment selectors")]
    SegmentWithSelectors,

    #[error("--fade-out requires --duration, --end, or --segment")]
    FadeOutUnbounded,

    #[error("unparseable duration: '{0}'")]
    UnparseableDuration(String),

    #[error("unexpected channel layout fix value '{0}' (choose from 0, 4.1, 5.0, 5.1)")]
    InvalidChannelLayoutFix(String),

    #[error("{format} does not require a channel layout fix")]
    ChannelLayoutFixUnsupported { format: &'static str },

    #[error("invalid source file: {}", path.display())]
    InvalidSourceFile { path: PathBuf },

    #[error("invalid container '{name}' for {format} (choose from {choices})")]
    InvalidContainer {
        name: String,
        format: &'static str,
        choices: String,
    },

    #[error("invalid pass {pass}: {format} uses {passes} pass(es)")]
    InvalidPass {
        pass: u8,
        format: &'static str,
        passes: u8,
    },

    #[error("invalid audio quality '{value}': {reason}")]
    InvalidAudioQuality { value: String, reason: &'static str },

    #[error("at least one positive audio quality must be specified")]
    NoAudioTrack,

    #[error("only one non-zero audio quality may be specified for {target}")]
    TooManyAudioTracks { target: &'static str },

    #[error("{format} conversion requires video options")]
    MissingVideoOptions { format: &'static str },

    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_source_file(path: impl Into<PathBuf>) -> Self {
        Self::InvalidSourceFile { path: path.into() }
    }

    pub fn invalid_audio_quality(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidAudioQuality {
            value: value.into(),
            reason,
        }
    }
}
