//! The resolved, immutable description of one tool invocation.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::formats::{AudioQuality, Container};
use crate::segment::Segment;

/// Channel remapping applied to a source audio track before other filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ChannelLayoutFix {
    #[default]
    None,
    /// 5.1(side) relabelled as 5.1(rear).
    Side51,
    /// 5.0(side) widened to 5.1(rear).
    Surround50,
    /// 4.1 with a back centre spread to both rear channels.
    Surround41,
}

impl ChannelLayoutFix {
    /// Parses `0`, `4.1`, `5.0` or `5.1`; blank means no fix.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "" | "0" => Ok(Self::None),
            "5.1" => Ok(Self::Side51),
            "5.0" => Ok(Self::Surround50),
            "4.1" => Ok(Self::Surround41),
            other => Err(Error::InvalidChannelLayoutFix(other.to_string())),
        }
    }

    /// The remapping filter, or `None` for no fix.
    pub fn filter(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Side51 => Some("channelmap=channel_layout=5.1"),
            Self::Surround50 => Some("pan=5.1|FR=FR|FL=FL|FC=FC|BL=SL|BR=SR"),
            Self::Surround41 => Some("pan=5.1|FR=FR|FL=FL|FC=FC|BL=BC|BR=BC|LFE=LFE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum Deinterlace {
    /// Output a frame from each pair of input fields
    #[value(name = "frame")]
    Frame,
    /// Output an interpolated frame from each input field
    #[value(name = "field")]
    Field,
    /// Inverse telecine
    #[value(name = "ivtc")]
    Ivtc,
    /// Inverse telecine with fallback deinterlace
    #[value(name = "ivtc+")]
    IvtcFallback,
    /// Selectively deinterlace frames
    #[value(name = "selframe")]
    SelectiveFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum Parity {
    /// Top field first
    #[value(name = "tff")]
    TopFieldFirst,
    /// Bottom field first
    #[value(name = "bff")]
    BottomFieldFirst,
}

impl Parity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopFieldFirst => "tff",
            Self::BottomFieldFirst => "bff",
        }
    }
}

/// Fades shared by the audio and video chains, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FadeOptions {
    pub fade_in: Option<f64>,
    pub fade_out: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFilterOptions {
    pub volume: f64,
    pub custom: Vec<String>,
}

impl Default for AudioFilterOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            custom: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoFilterOptions {
    pub deinterlace: Option<Deinterlace>,
    pub parity: Option<Parity>,
    pub grayscale: bool,
    pub crop43: bool,
    pub gamma: f64,
    /// Left and right pixels to remove.
    pub crop_width: Option<(u32, u32)>,
    /// Top and bottom pixels to remove.
    pub crop_height: Option<(u32, u32)>,
    pub scale23: bool,
    pub custom: Vec<String>,
}

impl Default for VideoFilterOptions {
    fn default() -> Self {
        Self {
            deinterlace: None,
            parity: None,
            grayscale: false,
            crop43: false,
            gamma: 1.0,
            crop_width: None,
            crop_height: None,
            scale23: false,
            custom: Vec::new(),
        }
    }
}

/// Options only meaningful to video tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoOptions {
    pub quality: u32,
    pub filters: VideoFilterOptions,
    /// Run only this pass of a multi-pass encode.
    pub only_pass: Option<u8>,
    /// Delete the pass log instead of keeping it with a timestamp.
    pub delete_log: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub source_files: Vec<PathBuf>,
    pub always_number: bool,
    pub pretend: bool,
    pub verbose: u8,
    pub container: &'static Container,
    pub segments: Vec<Segment>,
    /// One entry per source audio track; `None` skips the track.
    pub audio_quality: Vec<Option<AudioQuality>>,
    /// Indexed like `audio_quality`; may be shorter.
    pub channel_layout_fix: Vec<ChannelLayoutFix>,
    pub fade: FadeOptions,
    pub audio_filters: AudioFilterOptions,
    pub video: Option<VideoOptions>,
    pub passthrough_args: Vec<String>,
}

impl Config {
    /// Retained audio tracks as `(input_index, quality)`, in source order.
    /// The position in the returned list is the output stream index.
    pub fn retained_tracks(&self) -> Vec<(usize, AudioQuality)> {
        self.audio_quality
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.map(|q| (i, q)))
            .collect()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_quality.iter().any(Option::is_some)
    }

    pub fn channel_layout_fix(&self, input_index: usize) -> ChannelLayoutFix {
        self.channel_layout_fix
            .get(input_index)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::formats::WEBM;
    use crate::segment::TimeSelection;

    /// A minimal configuration for a single unbounded segment.
    pub(crate) fn config(audio_quality: Vec<Option<AudioQuality>>) -> Config {
        Config {
            source_files: vec![PathBuf::from("movie.mp4")],
            always_number: false,
            pretend: false,
            verbose: 0,
            container: &WEBM,
            segments: TimeSelection::default().resolve().unwrap().segments,
            audio_quality,
            channel_layout_fix: Vec::new(),
            fade: FadeOptions::default(),
            audio_filters: AudioFilterOptions::default(),
            video: Some(VideoOptions {
                quality: 30,
                filters: VideoFilterOptions::default(),
                only_pass: None,
                delete_log: false,
            }),
            passthrough_args: Vec::new(),
        }
    }

    #[test]
    fn channel_layout_fix_values() {
        assert_eq!(ChannelLayoutFix::parse("0").unwrap(), ChannelLayoutFix::None);
        assert_eq!(ChannelLayoutFix::parse("").unwrap(), ChannelLayoutFix::None);
        assert_eq!(
            ChannelLayoutFix::parse("4.1").unwrap().filter(),
            Some("pan=5.1|FR=FR|FL=FL|FC=FC|BL=BC|BR=BC|LFE=LFE")
        );
        assert!(matches!(
            ChannelLayoutFix::parse("7.1").unwrap_err(),
            Error::InvalidChannelLayoutFix(ref v) if v == "7.1"
        ));
    }

    #[test]
    fn retained_tracks_keep_input_indices() {
        let cfg = config(vec![
            None,
            Some(AudioQuality::Bitrate(128)),
            None,
            Some(AudioQuality::Bitrate(96)),
        ]);
        assert_eq!(
            cfg.retained_tracks(),
            [(1, AudioQuality::Bitrate(128)), (3, AudioQuality::Bitrate(96))]
        );
        assert!(cfg.has_audio());
        assert_eq!(cfg.channel_layout_fix(3), ChannelLayoutFix::None);
    }
}
