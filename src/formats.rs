//! Static descriptions of the supported containers, audio formats and video formats.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::util::format_float;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Container {
    pub name: &'static str,
    /// Name passed to ffmpeg's `-f`.
    pub ffmpeg_format: &'static str,
    pub extension: &'static str,
    pub supports_multiple_tracks: bool,
}

impl Container {
    /// Matches either the ffmpeg format name or the extension without its dot.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        name == self.ffmpeg_format || name == self.extension.trim_start_matches('.')
    }
}

pub static OGG: Container = Container {
    name: "Ogg",
    ffmpeg_format: "ogg",
    extension: ".ogg",
    supports_multiple_tracks: true,
};

pub static OGG_OPUS: Container = Container {
    name: "Ogg Opus",
    ffmpeg_format: "opus",
    extension: ".opus",
    supports_multiple_tracks: true,
};

pub static FLAC_CONTAINER: Container = Container {
    name: "FLAC",
    ffmpeg_format: "flac",
    extension: ".flac",
    supports_multiple_tracks: false,
};

pub static MATROSKA: Container = Container {
    name: "Matroska",
    ffmpeg_format: "matroska",
    extension: ".mkv",
    supports_multiple_tracks: true,
};

pub static WEBM: Container = Container {
    name: "WebM",
    ffmpeg_format: "webm",
    extension: ".webm",
    supports_multiple_tracks: true,
};

pub static MP4: Container = Container {
    name: "MP4",
    ffmpeg_format: "mp4",
    extension: ".mp4",
    supports_multiple_tracks: true,
};

/// How an audio codec expresses quality on the ffmpeg command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioQualityKind {
    /// Integer kbps, `-b:a 128k`.
    Bitrate,
    /// Perceptual float, `-q:a 6.0`.
    Quality,
    /// Integer encoder effort, `-compression_level:a 8`.
    CompressionLevel,
}

impl AudioQualityKind {
    /// Parses one entry of a per-track quality list. Empty and zero entries skip
    /// the track and yield `None`.
    pub fn parse(self, value: &str) -> Result<Option<AudioQuality>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let number: f64 = value
            .parse()
            .map_err(|_| Error::invalid_audio_quality(value, "not a number"))?;
        if !number.is_finite() {
            return Err(Error::invalid_audio_quality(value, "must be a finite number"));
        }
        if number < 0.0 {
            return Err(Error::invalid_audio_quality(value, "must not be negative"));
        }
        if number == 0.0 {
            return Ok(None);
        }
        let integer = || -> Result<u32> {
            value
                .parse()
                .map_err(|_| Error::invalid_audio_quality(value, "must be an integer"))
        };
        Ok(Some(match self {
            Self::Bitrate => AudioQuality::Bitrate(integer()?),
            Self::Quality => AudioQuality::Quality(number),
            Self::CompressionLevel => AudioQuality::CompressionLevel(integer()?),
        }))
    }

    pub fn default_quality(self, default: f64) -> AudioQuality {
        match self {
            Self::Bitrate => AudioQuality::Bitrate(default as u32),
            Self::Quality => AudioQuality::Quality(default),
            Self::CompressionLevel => AudioQuality::CompressionLevel(default as u32),
        }
    }
}

/// A quality value for one retained audio track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AudioQuality {
    Bitrate(u32),
    Quality(f64),
    CompressionLevel(u32),
}

impl AudioQuality {
    /// Flag and value for this quality. With a stream index the flag is scoped to
    /// that output audio stream (`-b:a:1`).
    pub fn args(&self, stream_index: Option<usize>) -> [String; 2] {
        let (flag, value) = match self {
            Self::Bitrate(kbps) => ("-b", format!("{kbps}k")),
            Self::Quality(q) => ("-q", format_float(*q)),
            Self::CompressionLevel(level) => ("-compression_level", level.to_string()),
        };
        let flag = match stream_index {
            Some(i) => format!("{flag}:a:{i}"),
            None => format!("{flag}:a"),
        };
        [flag, value]
    }
}

#[derive(Debug, Serialize)]
pub struct AudioFormat {
    pub name: &'static str,
    pub codec: &'static str,
    /// Containers for audio-only output; the first is the default.
    pub containers: &'static [&'static Container],
    pub quality_kind: AudioQualityKind,
    pub default_quality: f64,
    pub supports_multi_track: bool,
    /// True if 5.1(side), 5.0 and 4.1 sources must be remapped to 5.1(rear).
    pub requires_channel_layout_fix: bool,
    pub codec_args: &'static [&'static str],
}

// Vorbis output is not picky about channel layout.
pub static VORBIS: AudioFormat = AudioFormat {
    name: "Vorbis",
    codec: "libvorbis",
    containers: &[&OGG],
    quality_kind: AudioQualityKind::Quality,
    default_quality: 6.0,
    supports_multi_track: true,
    requires_channel_layout_fix: false,
    codec_args: &[],
};

// ffmpeg will write multi-track opus; not every player handles it.
pub static OPUS: AudioFormat = AudioFormat {
    name: "Opus",
    codec: "libopus",
    containers: &[&OGG_OPUS, &OGG],
    quality_kind: AudioQualityKind::Bitrate,
    default_quality: 160.0,
    supports_multi_track: true,
    requires_channel_layout_fix: true,
    codec_args: &[],
};

pub static FLAC: AudioFormat = AudioFormat {
    name: "FLAC",
    codec: "flac",
    containers: &[&FLAC_CONTAINER, &OGG],
    quality_kind: AudioQualityKind::CompressionLevel,
    default_quality: 8.0,
    supports_multi_track: false,
    requires_channel_layout_fix: false,
    codec_args: &[],
};

#[derive(Debug, Serialize)]
pub struct VideoQualityArg {
    pub flag: &'static str,
    pub default: u32,
    pub help: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VideoFormat {
    pub name: &'static str,
    pub codec: &'static str,
    pub containers: &'static [&'static Container],
    pub passes: u8,
    pub audio_format: &'static AudioFormat,
    pub quality_arg: VideoQualityArg,
    /// Index 0 applies to every pass, index N only to pass N.
    pub codec_args: &'static [&'static [&'static str]],
}

impl VideoFormat {
    /// Codec arguments for `pass`: the all-pass arguments followed by the pass-specific ones.
    pub fn pass_codec_args(&self, pass: u8) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        if let Some(all) = self.codec_args.first() {
            args.extend(all.iter().map(|s| s.to_string()));
        }
        if pass > 0 {
            if let Some(specific) = self.codec_args.get(usize::from(pass)) {
                args.extend(specific.iter().map(|s| s.to_string()));
            }
        }
        args
    }
}

pub static VP9: VideoFormat = VideoFormat {
    name: "VP9",
    codec: "libvpx-vp9",
    containers: &[&WEBM, &MATROSKA, &MP4],
    passes: 2,
    audio_format: &OPUS,
    quality_arg: VideoQualityArg {
        flag: "-crf",
        default: 30,
        help: "video quality, lower is better",
    },
    codec_args: &[
        &[
            "-b:v",
            "0",
            "-tile-columns",
            "2",
            "-row-mt",
            "1",
            "-auto-alt-ref",
            "1",
            "-lag-in-frames",
            "25",
            "-threads",
            "8",
            "-pix_fmt",
            "yuv420p",
        ],
        &["-cpu-used", "4"],
        &["-cpu-used", "2"],
    ],
};

pub static AV1_SVT: VideoFormat = VideoFormat {
    name: "AV1",
    codec: "libsvtav1",
    containers: &[&MATROSKA, &MP4],
    passes: 1,
    audio_format: &OPUS,
    quality_arg: VideoQualityArg {
        flag: "-crf",
        default: 30,
        help: "video quality, lower is better",
    },
    codec_args: &[&["-preset", "3"]],
};

pub static AV1_AOM: VideoFormat = VideoFormat {
    name: "AV1 (libaom)",
    codec: "libaom-av1",
    containers: &[&MATROSKA, &MP4],
    passes: 2,
    audio_format: &OPUS,
    quality_arg: VideoQualityArg {
        flag: "-crf",
        default: 30,
        help: "video quality, lower is better",
    },
    codec_args: &[
        &[
            "-b:v",
            "0",
            "-tile-columns",
            "2",
            "-row-mt",
            "1",
            "-auto-alt-ref",
            "1",
            "-lag-in-frames",
            "25",
        ],
        &["-cpu-used", "4"],
        &["-cpu-used", "2"],
    ],
};

/// Resolves a user-selected container against a format's supported list. `None`
/// selects the first (default) container.
pub fn select_container(
    containers: &'static [&'static Container],
    requested: Option<&str>,
    format: &'static str,
) -> Result<&'static Container> {
    let found = match requested {
        None => containers.first().copied(),
        Some(name) => containers.iter().copied().find(|c| c.matches(name)),
    };
    found.ok_or_else(|| Error::InvalidContainer {
        name: requested.unwrap_or_default().to_string(),
        format,
        choices: containers
            .iter()
            .map(|c| c.extension.trim_start_matches('.'))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_args_by_kind() {
        assert_eq!(AudioQuality::Bitrate(128).args(None), ["-b:a", "128k"]);
        assert_eq!(AudioQuality::Quality(6.0).args(Some(1)), ["-q:a:1", "6.0"]);
        assert_eq!(
            AudioQuality::CompressionLevel(8).args(Some(0)),
            ["-compression_level:a:0", "8"]
        );
    }

    #[test]
    fn zero_and_blank_entries_skip_tracks() {
        let kind = AudioQualityKind::Bitrate;
        assert_eq!(kind.parse("").unwrap(), None);
        assert_eq!(kind.parse("0").unwrap(), None);
        assert_eq!(kind.parse("96").unwrap(), Some(AudioQuality::Bitrate(96)));
    }

    #[test]
    fn integer_kinds_reject_fractions() {
        assert!(AudioQualityKind::Bitrate.parse("96.5").is_err());
        assert!(AudioQualityKind::CompressionLevel.parse("x").is_err());
        assert_eq!(
            AudioQualityKind::Quality.parse("4.5").unwrap(),
            Some(AudioQuality::Quality(4.5))
        );
        assert!(AudioQualityKind::Quality.parse("-1").is_err());
    }

    #[test]
    fn non_finite_qualities_are_rejected() {
        for value in ["nan", "inf", "-inf", "infinity"] {
            for kind in [AudioQualityKind::Quality, AudioQualityKind::Bitrate] {
                assert!(
                    matches!(kind.parse(value), Err(Error::InvalidAudioQuality { .. })),
                    "{kind:?} accepted {value}"
                );
            }
        }
    }

    #[test]
    fn per_pass_codec_args() {
        let pass1 = VP9.pass_codec_args(1);
        assert_eq!(pass1.first().map(String::as_str), Some("-b:v"));
        assert_eq!(&pass1[pass1.len() - 2..], ["-cpu-used", "4"]);
        assert_eq!(&VP9.pass_codec_args(2)[pass1.len() - 2..], ["-cpu-used", "2"]);
        assert_eq!(AV1_SVT.pass_codec_args(1), ["-preset", "3"]);
        assert!(!AV1_AOM.pass_codec_args(2).contains(&"-threads".to_string()));
    }

    #[test]
    fn container_selection() {
        assert_eq!(select_container(VP9.containers, None, VP9.name).unwrap(), &WEBM);
        assert_eq!(
            select_container(VP9.containers, Some("mkv"), VP9.name).unwrap(),
            &MATROSKA
        );
        assert_eq!(
            select_container(VP9.containers, Some("matroska"), VP9.name).unwrap(),
            &MATROSKA
        );
        let err = select_container(AV1_SVT.containers, Some("webm"), AV1_SVT.name).unwrap_err();
        assert!(err.to_string().contains("mkv, mp4"), "{err}");
    }
}
