//! Command-line surface shared by the conversion tools.
//!
//! Each tool composes the option groups below and resolves them into a
//! [`Config`] before anything runs. Invalid combinations are reported through
//! clap's error output and exit with status 2.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, ValueEnum};
use tracing::warn;

use crate::command::FFMPEG;
use crate::config::{
    AudioFilterOptions, ChannelLayoutFix, Config, Deinterlace, FadeOptions, Parity,
    VideoFilterOptions, VideoOptions,
};
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::formats::{select_container, AudioFormat, AudioQuality, Container, VideoFormat};
use crate::logging;
use crate::runner::{Orchestrator, SystemRunner};
use crate::segment::{Segment, TimeSelection};

#[derive(Debug, Args)]
pub struct BasicArgs {
    /// Always add a number to the output file name
    #[arg(short = '#', long)]
    pub always_number: bool,

    /// Display command lines but do not execute
    #[arg(long)]
    pub pretend: bool,

    /// Verbose output; repeat to also dump the resolved configuration
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// All values are in ffmpeg duration format. --segment may not be combined with
/// the other selectors.
#[derive(Debug, Args)]
#[command(next_help_heading = "Source segment")]
pub struct TimecodeArgs {
    /// Starting source position
    #[arg(long)]
    pub start: Option<String>,

    /// Duration to encode
    #[arg(long)]
    pub duration: Option<String>,

    /// Ending source position
    #[arg(long)]
    pub end: Option<String>,

    /// Segment start and end source position; may be repeated to encode several
    /// segments to separate, numbered files
    #[arg(
        long = "segment",
        num_args = 2,
        value_names = ["START", "END"],
        action = ArgAction::Append
    )]
    pub segments: Vec<String>,
}

impl TimecodeArgs {
    pub fn selection(&self) -> TimeSelection {
        TimeSelection {
            start: self.start.clone(),
            duration: self.duration.clone(),
            end: self.end.clone(),
            segments: self
                .segments
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect(),
        }
    }
}

/// Parses a float option, refusing values ffmpeg cannot take such as `nan`
/// and `inf`.
fn finite_float(value: &str) -> std::result::Result<f64, String> {
    let number: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(format!("'{value}' is not a finite number"))
    }
}

#[derive(Debug, Args)]
pub struct FadeArgs {
    /// Apply a fade-in at the start of each output
    #[arg(long, value_name = "SECONDS", value_parser = finite_float)]
    pub fade_in: Option<f64>,

    /// Apply a fade-out at the end of each output
    #[arg(long, value_name = "SECONDS", value_parser = finite_float)]
    pub fade_out: Option<f64>,
}

impl FadeArgs {
    fn options(&self) -> FadeOptions {
        FadeOptions {
            fade_in: self.fade_in,
            fade_out: self.fade_out,
        }
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Filters")]
pub struct AudioFilterArgs {
    #[command(flatten)]
    pub fade: FadeArgs,

    /// Custom audio filter, applied after the standard filters
    #[arg(short = 'f', long = "filter", value_name = "FILTER")]
    pub audio_filter: Vec<String>,

    /// Amplitude multiplier, < 1.0 to reduce volume or > 1.0 to increase it
    #[arg(long, default_value_t = 1.0, value_parser = finite_float)]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StandardFilter {
    /// Crop horizontally to a 4:3 aspect ratio
    #[value(name = "crop43")]
    Crop43,
    /// Scale down by 2/3 (e.g. 1080p to 720p)
    #[value(name = "scale23")]
    Scale23,
    /// Convert to grayscale
    #[value(name = "gray")]
    Gray,
}

/// Deinterlacing runs first, then standard crops, custom crops, scaling,
/// fades, and finally the custom -f and -a filters.
#[derive(Debug, Args)]
#[command(next_help_heading = "Video/audio filters")]
pub struct VideoFilterArgs {
    /// Standard video filter
    #[arg(short = 's', long, value_enum)]
    pub standard_filter: Vec<StandardFilter>,

    /// Deinterlace filter
    #[arg(short = 'd', long, value_enum)]
    pub deinterlace: Option<Deinterlace>,

    /// Field parity for the frame and field deinterlace filters
    #[arg(long, value_enum)]
    pub parity: Option<Parity>,

    #[command(flatten)]
    pub fade: FadeArgs,

    /// Left and right crop values
    #[arg(short = 'x', long, num_args = 2, value_names = ["LEFT", "RIGHT"])]
    pub crop_width: Option<Vec<u32>>,

    /// Top and bottom crop values
    #[arg(short = 'y', long, num_args = 2, value_names = ["TOP", "BOTTOM"])]
    pub crop_height: Option<Vec<u32>>,

    /// Gamma correction (1.0 applies no correction)
    #[arg(short = 'g', long, default_value_t = 1.0, value_parser = finite_float)]
    pub gamma: f64,

    /// Custom video filter
    #[arg(short = 'f', long = "filter", value_name = "FILTER")]
    pub video_filter: Vec<String>,

    /// Custom audio filter
    #[arg(short = 'a', long, value_name = "FILTER")]
    pub audio_filter: Vec<String>,

    /// Amplitude multiplier, < 1.0 to reduce volume or > 1.0 to increase it
    #[arg(long, default_value_t = 1.0, value_parser = finite_float)]
    pub volume: f64,
}

fn pair(values: &Option<Vec<u32>>) -> Option<(u32, u32)> {
    match values.as_deref() {
        Some([a, b]) => Some((*a, *b)),
        _ => None,
    }
}

impl VideoFilterArgs {
    fn options(&self) -> VideoFilterOptions {
        VideoFilterOptions {
            deinterlace: self.deinterlace,
            parity: self.parity,
            grayscale: self.standard_filter.contains(&StandardFilter::Gray),
            crop43: self.standard_filter.contains(&StandardFilter::Crop43),
            gamma: self.gamma,
            crop_width: pair(&self.crop_width),
            crop_height: pair(&self.crop_height),
            scale23: self.standard_filter.contains(&StandardFilter::Scale23),
            custom: self.video_filter.clone(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(version)]
pub struct AudioCli {
    #[command(flatten)]
    pub basic: BasicArgs,

    /// Audio quality (bitrate in kbps, quality level, or compression level,
    /// depending on the format); a colon-delimited list selects source audio
    /// tracks, with 0 or blank skipping a track
    #[arg(
        short = 'q',
        long = "quality",
        visible_short_alias = 'b',
        visible_alias = "bitrate",
        value_name = "QUALITY"
    )]
    pub audio_quality: Option<String>,

    /// Remap 4.1, 5.0 or 5.1(side) sources to 5.1(rear); colon-delimited per
    /// source track, 0 or blank applies no fix
    #[arg(long, value_name = "FIX_STRING")]
    pub channel_layout_fix: Option<String>,

    /// Container format (defaults to the first supported container)
    #[arg(short = 'C', long)]
    pub container: Option<String>,

    #[command(flatten)]
    pub timecode: TimecodeArgs,

    #[command(flatten)]
    pub filters: AudioFilterArgs,

    /// Source files to convert
    #[arg(required = true, value_name = "SOURCE_FILE")]
    pub source_files: Vec<PathBuf>,

    /// Output arguments passed to ffmpeg as-is before the output file name
    #[arg(last = true, value_name = "ARG")]
    pub passthrough_args: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(version)]
pub struct VideoCli {
    #[command(flatten)]
    pub basic: BasicArgs,

    /// Video quality, lower is better (defaults to the format's value)
    #[arg(short = 'q', long)]
    pub quality: Option<u32>,

    /// Audio quality; a colon-delimited list selects source audio tracks, with
    /// 0 or blank skipping a track
    #[arg(
        short = 'b',
        long = "audio-quality",
        visible_alias = "bitrate",
        value_name = "QUALITY"
    )]
    pub audio_quality: Option<String>,

    /// Remap 4.1, 5.0 or 5.1(side) sources to 5.1(rear); colon-delimited per
    /// source track, 0 or blank applies no fix
    #[arg(long, value_name = "FIX_STRING")]
    pub channel_layout_fix: Option<String>,

    /// Run only the given pass
    #[arg(long = "pass", value_parser = clap::value_parser!(u8).range(1..=2))]
    pub only_pass: Option<u8>,

    /// Delete the pass 1 log (otherwise keep it with a timestamp)
    #[arg(long)]
    pub delete_log: bool,

    /// Container format (defaults to the first supported container)
    #[arg(short = 'C', long)]
    pub container: Option<String>,

    #[command(flatten)]
    pub timecode: TimecodeArgs,

    #[command(flatten)]
    pub filters: VideoFilterArgs,

    /// Source files to convert
    #[arg(required = true, value_name = "SOURCE_FILE")]
    pub source_files: Vec<PathBuf>,

    /// Output arguments passed to ffmpeg as-is before the output file name
    #[arg(last = true, value_name = "ARG")]
    pub passthrough_args: Vec<String>,
}

/// Parses a colon-delimited per-track quality list; `None` yields the
/// format's default for a single track.
pub fn parse_audio_quality(
    raw: Option<&str>,
    format: &AudioFormat,
) -> Result<Vec<Option<AudioQuality>>> {
    match raw {
        None => Ok(vec![Some(
            format.quality_kind.default_quality(format.default_quality),
        )]),
        Some(raw) => raw
            .split(':')
            .map(|value| format.quality_kind.parse(value))
            .collect(),
    }
}

pub fn parse_channel_layout_fix(
    raw: Option<&str>,
    format: &AudioFormat,
) -> Result<Vec<ChannelLayoutFix>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let fixes = raw
        .split(':')
        .map(ChannelLayoutFix::parse)
        .collect::<Result<Vec<_>>>()?;
    if !format.requires_channel_layout_fix && fixes.iter().any(|f| *f != ChannelLayoutFix::None) {
        return Err(Error::ChannelLayoutFixUnsupported { format: format.name });
    }
    Ok(fixes)
}

fn check_track_count(
    tracks: &[Option<AudioQuality>],
    format: &AudioFormat,
    container: &Container,
) -> Result<()> {
    let retained = tracks.iter().filter(|t| t.is_some()).count();
    if retained > 1 && !format.supports_multi_track {
        return Err(Error::TooManyAudioTracks { target: format.name });
    }
    if retained > 1 && !container.supports_multiple_tracks {
        return Err(Error::TooManyAudioTracks {
            target: container.name,
        });
    }
    Ok(())
}

/// A fade-out needs to know where each output ends.
fn check_fade_out(fade: &FadeOptions, segments: &[Segment]) -> Result<()> {
    if fade.fade_out.is_some() && segments.iter().any(Segment::is_unbounded) {
        return Err(Error::FadeOutUnbounded);
    }
    Ok(())
}

/// Every source must be an existing regular file; all are checked before any
/// conversion starts.
pub fn check_source_files(files: &[PathBuf]) -> Result<()> {
    match files.iter().find(|f| !f.is_file()) {
        Some(bad) => Err(Error::invalid_source_file(bad)),
        None => Ok(()),
    }
}

impl AudioCli {
    pub fn into_config(self, format: &'static AudioFormat) -> Result<Config> {
        let resolved = self.timecode.selection().resolve()?;
        let fade = self.filters.fade.options();
        check_fade_out(&fade, &resolved.segments)?;

        let audio_quality = parse_audio_quality(self.audio_quality.as_deref(), format)?;
        if !audio_quality.iter().any(Option::is_some) {
            return Err(Error::NoAudioTrack);
        }
        let channel_layout_fix =
            parse_channel_layout_fix(self.channel_layout_fix.as_deref(), format)?;
        let container =
            select_container(format.containers, self.container.as_deref(), format.name)?;
        check_track_count(&audio_quality, format, container)?;
        check_source_files(&self.source_files)?;

        Ok(Config {
            source_files: self.source_files,
            always_number: self.basic.always_number || resolved.numbered,
            pretend: self.basic.pretend,
            verbose: self.basic.verbose,
            container,
            segments: resolved.segments,
            audio_quality,
            channel_layout_fix,
            fade,
            audio_filters: AudioFilterOptions {
                volume: self.filters.volume,
                custom: self.filters.audio_filter,
            },
            video: None,
            passthrough_args: self.passthrough_args,
        })
    }
}

impl VideoCli {
    pub fn into_config(self, format: &'static VideoFormat) -> Result<Config> {
        let resolved = self.timecode.selection().resolve()?;
        let fade = self.filters.fade.options();
        check_fade_out(&fade, &resolved.segments)?;

        let audio_format = format.audio_format;
        let audio_quality = parse_audio_quality(self.audio_quality.as_deref(), audio_format)?;
        let channel_layout_fix =
            parse_channel_layout_fix(self.channel_layout_fix.as_deref(), audio_format)?;
        let container =
            select_container(format.containers, self.container.as_deref(), format.name)?;
        check_track_count(&audio_quality, audio_format, container)?;

        if let Some(pass) = self.only_pass {
            if pass > format.passes {
                return Err(Error::InvalidPass {
                    pass,
                    format: format.name,
                    passes: format.passes,
                });
            }
        }
        check_source_files(&self.source_files)?;

        Ok(Config {
            source_files: self.source_files,
            always_number: self.basic.always_number || resolved.numbered,
            pretend: self.basic.pretend,
            verbose: self.basic.verbose,
            container,
            segments: resolved.segments,
            audio_quality,
            channel_layout_fix,
            fade,
            audio_filters: AudioFilterOptions {
                volume: self.filters.volume,
                custom: self.filters.audio_filter.clone(),
            },
            video: Some(VideoOptions {
                quality: self.quality.unwrap_or(format.quality_arg.default),
                filters: self.filters.options(),
                only_pass: self.only_pass,
                delete_log: self.delete_log,
            }),
            passthrough_args: self.passthrough_args,
        })
    }
}

/// Checks that ffmpeg can be found; skipped when only printing commands.
fn check_tools(config: &Config) -> Result<()> {
    if config.pretend {
        return Ok(());
    }
    which::which(FFMPEG).map(|_| ()).map_err(|_| Error::ToolNotFound {
        tool: FFMPEG.into(),
    })
}

fn dump_config(config: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn execute(config: &Config, converter: &Converter<'_>) -> i32 {
    if config.verbose >= 2 {
        if let Err(e) = dump_config(config) {
            warn!("could not display configuration: {e}");
        }
    }
    Orchestrator::new(converter, SystemRunner).run()
}

/// Parses arguments for an audio tool, converts every source file and returns
/// the process exit code.
pub fn audio_main(name: &'static str, about: &'static str, format: &'static AudioFormat) -> i32 {
    let mut command = AudioCli::command().name(name).bin_name(name).about(about);
    let matches = command.get_matches_mut();
    let cli = AudioCli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    logging::init(cli.basic.verbose);

    let config = cli
        .into_config(format)
        .and_then(|config| check_tools(&config).map(|_| config))
        .unwrap_or_else(|e| command.error(ErrorKind::ValueValidation, e).exit());
    execute(&config, &Converter::audio(&config, format))
}

/// Parses arguments for a video tool, converts every source file and returns
/// the process exit code.
pub fn video_main(name: &'static str, about: &'static str, format: &'static VideoFormat) -> i32 {
    let mut command = VideoCli::command().name(name).bin_name(name).about(about);
    let matches = command.get_matches_mut();
    let cli = VideoCli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    logging::init(cli.basic.verbose);

    let config = cli
        .into_config(format)
        .and_then(|config| check_tools(&config).map(|_| config))
        .unwrap_or_else(|e| command.error(ErrorKind::ValueValidation, e).exit());
    let converter = Converter::video(&config, format)
        .unwrap_or_else(|e| command.error(ErrorKind::ValueValidation, e).exit());
    execute(&config, &converter)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::formats::{FLAC, MATROSKA, OPUS, VORBIS, VP9, WEBM};

    fn source() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.mp4");
        fs::write(&path, b"").unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    fn video(args: &[&str]) -> Result<Config> {
        let cli = VideoCli::try_parse_from(std::iter::once("towebm").chain(args.iter().copied()))
            .unwrap();
        cli.into_config(&VP9)
    }

    fn audio(format: &'static AudioFormat, args: &[&str]) -> Result<Config> {
        let cli = AudioCli::try_parse_from(std::iter::once("toopus").chain(args.iter().copied()))
            .unwrap();
        cli.into_config(format)
    }

    #[test]
    fn video_defaults() {
        let (_dir, src) = source();
        let cfg = video(&[&src]).unwrap();
        assert_eq!(cfg.container, &WEBM);
        assert_eq!(cfg.audio_quality, [Some(AudioQuality::Bitrate(160))]);
        assert_eq!(cfg.segments.len(), 1);
        assert!(!cfg.always_number);
        let options = cfg.video.unwrap();
        assert_eq!(options.quality, 30);
        assert_eq!(options.filters.gamma, 1.0);
    }

    #[test]
    fn video_filters_and_passthrough() {
        let (_dir, src) = source();
        let cfg = video(&[
            "-s", "crop43", "-s", "gray", "-d", "field", "--parity", "tff", "-x", "10", "20",
            "-g", "1.2", "-C", "mkv", "-q", "25", &src, "--", "-t", "5",
        ])
        .unwrap();
        let options = cfg.video.unwrap();
        assert!(options.filters.crop43 && options.filters.grayscale);
        assert!(!options.filters.scale23);
        assert_eq!(options.filters.deinterlace, Some(Deinterlace::Field));
        assert_eq!(options.filters.parity, Some(Parity::TopFieldFirst));
        assert_eq!(options.filters.crop_width, Some((10, 20)));
        assert_eq!(options.quality, 25);
        assert_eq!(cfg.container, &MATROSKA);
        assert_eq!(cfg.passthrough_args, ["-t", "5"]);
    }

    #[test]
    fn segments_force_numbering() {
        let (_dir, src) = source();
        let cfg = video(&["--segment", "0", "10", "--segment", "1:00", "1:30", &src]).unwrap();
        assert_eq!(cfg.segments.len(), 2);
        assert!(cfg.always_number);
        assert_eq!(cfg.segments[1].duration, Some(30.0));
    }

    #[test]
    fn conflicting_selectors_are_rejected() {
        let (_dir, src) = source();
        assert!(matches!(
            video(&["--duration", "10", "--end", "20", &src]),
            Err(Error::DurationWithEnd)
        ));
        assert!(matches!(
            video(&["--start", "5", "--segment", "0", "10", &src]),
            Err(Error::SegmentWithSelectors)
        ));
        assert!(matches!(
            video(&["--fade-out", "2", &src]),
            Err(Error::FadeOutUnbounded)
        ));
        assert!(video(&["--fade-out", "2", "--duration", "60", &src]).is_ok());
    }

    #[test]
    fn pass_must_exist_for_format() {
        let (_dir, src) = source();
        assert_eq!(video(&["--pass", "2", &src]).unwrap().video.unwrap().only_pass, Some(2));
        let cli = VideoCli::try_parse_from(["toav1", "--pass", "2", src.as_str()]).unwrap();
        assert!(matches!(
            cli.into_config(&crate::formats::AV1_SVT),
            Err(Error::InvalidPass { pass: 2, passes: 1, .. })
        ));
        assert!(VideoCli::try_parse_from(["towebm", "--pass", "3", src.as_str()]).is_err());
    }

    #[test]
    fn missing_source_is_rejected() {
        let (dir, src) = source();
        let missing = dir.path().join("missing.mp4");
        let missing = missing.to_string_lossy();
        assert!(matches!(
            video(&[&src, &missing]),
            Err(Error::InvalidSourceFile { path }) if path.ends_with("missing.mp4")
        ));
        let dir_path = dir.path().to_string_lossy();
        assert!(video(&[&dir_path]).is_err());
    }

    #[test]
    fn audio_quality_lists() {
        let (_dir, src) = source();
        let cfg = audio(&OPUS, &["-b", "128::0:96", &src]).unwrap();
        assert_eq!(
            cfg.audio_quality,
            [
                Some(AudioQuality::Bitrate(128)),
                None,
                None,
                Some(AudioQuality::Bitrate(96))
            ]
        );
        assert!(cfg.video.is_none());
        assert!(matches!(audio(&OPUS, &["-q", "0", &src]), Err(Error::NoAudioTrack)));
        assert!(matches!(
            audio(&OPUS, &["-q", "12.5", &src]),
            Err(Error::InvalidAudioQuality { .. })
        ));
        assert_eq!(
            audio(&VORBIS, &["--quality", "4.5", &src]).unwrap().audio_quality,
            [Some(AudioQuality::Quality(4.5))]
        );
    }

    #[test]
    fn single_track_formats_and_containers() {
        let (_dir, src) = source();
        assert!(matches!(
            audio(&FLAC, &["-q", "5:5", &src]),
            Err(Error::TooManyAudioTracks { target: "FLAC" })
        ));
        assert!(audio(&FLAC, &["-q", "0:5", &src]).is_ok());
        assert!(matches!(
            audio(&FLAC, &["-C", "mkv", &src]),
            Err(Error::InvalidContainer { .. })
        ));
    }

    #[test]
    fn channel_layout_fix_only_where_needed() {
        let (_dir, src) = source();
        let cfg = audio(&OPUS, &["--channel-layout-fix", ":5.0", &src]).unwrap();
        assert_eq!(
            cfg.channel_layout_fix,
            [ChannelLayoutFix::None, ChannelLayoutFix::Surround50]
        );
        assert!(matches!(
            audio(&OPUS, &["--channel-layout-fix", "7.1", &src]),
            Err(Error::InvalidChannelLayoutFix(_))
        ));
        assert!(matches!(
            audio(&VORBIS, &["--channel-layout-fix", "5.1", &src]),
            Err(Error::ChannelLayoutFixUnsupported { format: "Vorbis" })
        ));
        assert!(audio(&VORBIS, &["--channel-layout-fix", "0", &src]).is_ok());
    }

    #[test]
    fn basic_flags() {
        let (_dir, src) = source();
        let cfg = audio(&OPUS, &["-#", "--pretend", "-vv", &src]).unwrap();
        assert!(cfg.always_number && cfg.pretend);
        assert_eq!(cfg.verbose, 2);
        assert!(check_tools(&cfg).is_ok());
    }

    #[test]
    fn float_options_must_be_finite() {
        let (_dir, src) = source();
        for args in [
            ["--gamma", "nan"],
            ["--volume", "inf"],
            ["--fade-in", "NaN"],
            ["--fade-out", "infinity"],
        ] {
            let argv = ["towebm", args[0], args[1], src.as_str()];
            let err = VideoCli::try_parse_from(argv).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{args:?}");
        }
        assert!(AudioCli::try_parse_from(["toopus", "--volume", "nan", src.as_str()]).is_err());
        assert_eq!(finite_float("0.5"), Ok(0.5));
    }

    #[test]
    fn non_finite_audio_quality_is_a_config_error() {
        let (_dir, src) = source();
        assert!(matches!(
            audio(&VORBIS, &["-q", "nan", &src]),
            Err(Error::InvalidAudioQuality { .. })
        ));
    }
}
