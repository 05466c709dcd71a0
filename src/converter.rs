//! Synthesis of the ffmpeg command lines for one segment of one source file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::command::{Step, ToolCommand, FFMPEG};
use crate::config::{Config, VideoOptions};
use crate::error::{Error, Result};
use crate::filters::{audio_filter_args, video_filter_args};
use crate::formats::{AudioFormat, VideoFormat};
use crate::segment::Segment;
use crate::util::file_title;

#[cfg(windows)]
const NULL_OUTPUT: &str = "NUL";
#[cfg(not(windows))]
const NULL_OUTPUT: &str = "/dev/null";

/// Returns `path` unchanged if it does not exist and `always_number` is false.
/// Otherwise appends `_NN` before the extension, using the first of `_00` to
/// `_99` that does not exist. If all are taken, `path` is returned as is.
pub fn safe_filename(path: &Path, always_number: bool) -> PathBuf {
    if !always_number && !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (0..100)
        .map(|i| path.with_file_name(format!("{stem}_{i:02}{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

enum Target<'a> {
    Audio(&'static AudioFormat),
    Video(&'static VideoFormat, &'a VideoOptions),
}

/// Builds the steps that produce the outputs of a conversion.
pub struct Converter<'a> {
    config: &'a Config,
    target: Target<'a>,
}

impl<'a> Converter<'a> {
    pub fn audio(config: &'a Config, format: &'static AudioFormat) -> Self {
        Self {
            config,
            target: Target::Audio(format),
        }
    }

    /// Fails when `config` carries no video options, as for an audio tool.
    pub fn video(config: &'a Config, format: &'static VideoFormat) -> Result<Self> {
        let options = config
            .video
            .as_ref()
            .ok_or(Error::MissingVideoOptions { format: format.name })?;
        Ok(Self {
            config,
            target: Target::Video(format, options),
        })
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    fn audio_format(&self) -> &'static AudioFormat {
        match &self.target {
            Target::Audio(format) => *format,
            Target::Video(format, _) => format.audio_format,
        }
    }

    /// The steps for one segment of `source`, in execution order.
    pub fn segment_steps(&self, segment: &Segment, source: &Path) -> Vec<Step> {
        match &self.target {
            Target::Audio(_) => vec![self.audio_command(segment, source).into()],
            Target::Video(format, options) => {
                self.video_steps(format, options, segment, source, Local::now())
            }
        }
    }

    fn base_command(&self, segment: &Segment, source: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(FFMPEG);
        cmd.args(["-nostdin", "-hide_banner"])
            .args(segment.input_args())
            .arg("-i")
            .arg(source.to_string_lossy())
            .args(["-f", self.config.container.ffmpeg_format]);
        cmd
    }

    fn output_path(&self, title: &str) -> PathBuf {
        let name = format!("{title}{}", self.config.container.extension);
        safe_filename(Path::new(&name), self.config.always_number)
    }

    /// Quality arguments for each retained track, scoped by output stream index.
    fn audio_quality_args(&self) -> Vec<String> {
        self.config
            .retained_tracks()
            .into_iter()
            .enumerate()
            .flat_map(|(output_index, (_, quality))| quality.args(Some(output_index)))
            .collect()
    }

    /// Copies stream metadata (title, language) from each retained input track to
    /// its output stream.
    fn audio_metadata_map_args(&self) -> Vec<String> {
        self.config
            .retained_tracks()
            .into_iter()
            .enumerate()
            .flat_map(|(output_index, (input_index, _))| {
                [
                    format!("-map_metadata:s:a:{output_index}"),
                    format!("0:s:a:{input_index}"),
                ]
            })
            .collect()
    }

    fn audio_codec_args(&self) -> Vec<&'static str> {
        self.audio_format().codec_args.to_vec()
    }

    fn audio_command(&self, segment: &Segment, source: &Path) -> ToolCommand {
        let format = self.audio_format();
        let title = file_title(source);

        let mut cmd = self.base_command(segment, source);
        cmd.args(["-vn", "-c:a", format.codec])
            .args(audio_filter_args(self.config, segment))
            .args(self.audio_quality_args())
            .args(self.audio_codec_args())
            .args(self.audio_metadata_map_args())
            .args(self.config.passthrough_args.iter().cloned())
            .arg(self.output_path(&title).to_string_lossy());
        cmd
    }

    fn video_codec_args(
        &self,
        format: &VideoFormat,
        options: &VideoOptions,
        segment: &Segment,
        pass: u8,
    ) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), format.codec.to_string()];
        args.extend(format.pass_codec_args(pass));
        args.extend([format.quality_arg.flag.to_string(), options.quality.to_string()]);
        args.extend(video_filter_args(&options.filters, &self.config.fade, segment));
        args
    }

    /// Audio arguments for a video output, or `-an` when every track is skipped.
    fn video_audio_args(&self, segment: &Segment) -> Vec<String> {
        if !self.config.has_audio() {
            return vec!["-an".into()];
        }
        let mut args = vec!["-c:a".to_string(), self.audio_format().codec.to_string()];
        args.extend(audio_filter_args(self.config, segment));
        args.extend(self.audio_codec_args().into_iter().map(String::from));
        args.extend(self.audio_quality_args());
        args
    }

    fn one_pass_command(
        &self,
        format: &VideoFormat,
        options: &VideoOptions,
        segment: &Segment,
        source: &Path,
    ) -> ToolCommand {
        let title = file_title(source);
        let mut cmd = self.base_command(segment, source);
        cmd.args(self.video_codec_args(format, options, segment, 1))
            .args(self.video_audio_args(segment))
            .args(["-metadata".to_string(), format!("title={title}")])
            .args(self.audio_metadata_map_args())
            .args(self.config.passthrough_args.iter().cloned())
            .arg(self.output_path(&title).to_string_lossy());
        cmd
    }

    /// A video-only analysis pass that writes its statistics to the pass log
    /// and discards the encoded output.
    fn analysis_pass_command(
        &self,
        format: &VideoFormat,
        options: &VideoOptions,
        segment: &Segment,
        source: &Path,
        pass: u8,
    ) -> ToolCommand {
        let title = file_title(source);
        let mut cmd = self.base_command(segment, source);
        cmd.args(self.video_codec_args(format, options, segment, pass))
            .args(["-an", "-y", "-pass"])
            .arg(pass.to_string())
            .arg("-passlogfile")
            .arg(title.as_str())
            .args(self.config.passthrough_args.iter().cloned())
            .arg(NULL_OUTPUT);
        cmd
    }

    fn final_pass_command(
        &self,
        format: &VideoFormat,
        options: &VideoOptions,
        segment: &Segment,
        source: &Path,
        pass: u8,
    ) -> ToolCommand {
        let title = file_title(source);
        let mut cmd = self.base_command(segment, source);
        cmd.args(self.video_codec_args(format, options, segment, pass))
            .args(self.video_audio_args(segment))
            .arg("-pass")
            .arg(pass.to_string())
            .arg("-passlogfile")
            .arg(title.as_str())
            .args(["-metadata".to_string(), format!("title={title}")])
            .args(self.audio_metadata_map_args())
            .args(self.config.passthrough_args.iter().cloned())
            .arg(self.output_path(&title).to_string_lossy());
        cmd
    }

    /// Deletes the pass log, or keeps it under a timestamped name.
    fn log_step(&self, options: &VideoOptions, source: &Path, now: DateTime<Local>) -> Step {
        let title = file_title(source);
        let log = PathBuf::from(format!("{title}-0.log"));
        if options.delete_log {
            Step::RemoveFile(log)
        } else {
            Step::RenameFile {
                from: log,
                to: PathBuf::from(format!("{title}_{}.log", now.format("%Y%m%d-%H%M%S"))),
            }
        }
    }

    fn video_steps(
        &self,
        format: &VideoFormat,
        options: &VideoOptions,
        segment: &Segment,
        source: &Path,
        now: DateTime<Local>,
    ) -> Vec<Step> {
        if format.passes <= 1 {
            return vec![self.one_pass_command(format, options, segment, source).into()];
        }

        let passes: Vec<u8> = match options.only_pass {
            Some(pass) => vec![pass],
            None => (1..=format.passes).collect(),
        };

        let mut steps: Vec<Step> = Vec::new();
        for pass in passes {
            if pass < format.passes {
                steps.push(
                    self.analysis_pass_command(format, options, segment, source, pass)
                        .into(),
                );
            } else {
                steps.push(
                    self.final_pass_command(format, options, segment, source, pass)
                        .into(),
                );
                steps.push(self.log_step(options, source, now));
            }
        }
        steps
    }
}
