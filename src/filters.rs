//! Filter graph composition.
//!
//! Stages are emitted in a fixed order regardless of the order options were
//! given: deinterlace, grayscale, 4:3 crop, gamma, pixel crop, 2/3 scale,
//! fades, then custom filters.

use crate::config::{Config, Deinterlace, FadeOptions, VideoFilterOptions};
use crate::segment::Segment;
use crate::util::format_float;

/// Fade filters for one segment. Fade times are relative to the start of the
/// output, so fade-in starts at zero and fade-out ends with the segment.
fn fade_filters(fade: &FadeOptions, segment: &Segment, filter_name: &str) -> Vec<String> {
    let mut filters = Vec::new();
    if let Some(fade_in) = fade.fade_in {
        filters.push(format!("{filter_name}=t=in:st=0:d={}", format_float(fade_in)));
    }
    if let (Some(fade_out), Some(duration)) = (fade.fade_out, segment.duration) {
        filters.push(format!(
            "{filter_name}=t=out:st={}:d={}",
            format_float(duration - fade_out),
            format_float(fade_out)
        ));
    }
    filters
}

pub fn video_filters(
    options: &VideoFilterOptions,
    fade: &FadeOptions,
    segment: &Segment,
) -> Vec<String> {
    let mut filters: Vec<String> = Vec::new();

    let parity = options
        .parity
        .map(|p| format!(":{}", p.as_str()))
        .unwrap_or_default();
    match options.deinterlace {
        Some(Deinterlace::Frame) => filters.push(format!("bwdif=send_frame{parity}")),
        Some(Deinterlace::Field) => filters.push(format!("bwdif=send_field{parity}")),
        Some(Deinterlace::Ivtc) => filters.extend(["fieldmatch", "decimate"].map(String::from)),
        Some(Deinterlace::IvtcFallback) => {
            filters.extend(["fieldmatch", "bwdif=send_frame", "decimate"].map(String::from))
        }
        Some(Deinterlace::SelectiveFrame) => {
            filters.extend(["fieldmatch", "bwdif=0:-1:1"].map(String::from))
        }
        None => {}
    }

    if options.grayscale {
        filters.push("format=gray".into());
    }
    if options.crop43 {
        filters.push("crop=w=(in_h*4/3)".into());
    }

    if options.gamma != 1.0 {
        filters.push(format!("eq=gamma={}", format_float(options.gamma)));
    }

    match (options.crop_width, options.crop_height) {
        (Some((left, right)), Some((top, bottom))) => filters.push(format!(
            "crop=x={left}:w=in_w-{left}-{right}:y={top}:h=in_h-{top}-{bottom}"
        )),
        (Some((left, right)), None) => {
            filters.push(format!("crop=x={left}:w=in_w-{left}-{right}"))
        }
        (None, Some((top, bottom))) => {
            filters.push(format!("crop=y={top}:h=in_h-{top}-{bottom}"))
        }
        (None, None) => {}
    }

    if options.scale23 {
        filters.push("scale=h=in_h*2/3:w=-1".into());
    }

    filters.extend(fade_filters(fade, segment, "fade"));
    filters.extend(options.custom.iter().cloned());

    if filters.is_empty() {
        filters.push("copy".into());
    }
    filters
}

/// `-filter_complex` arguments for the video stream. Never empty.
pub fn video_filter_args(
    options: &VideoFilterOptions,
    fade: &FadeOptions,
    segment: &Segment,
) -> Vec<String> {
    vec![
        "-filter_complex".into(),
        format!("[0:v]{}", video_filters(options, fade, segment).join(",")),
    ]
}

/// The standard audio chain shared by every retained track.
pub fn audio_filters(config: &Config, segment: &Segment) -> Vec<String> {
    let mut filters = Vec::new();
    if config.audio_filters.volume != 1.0 {
        filters.push(format!("volume={}", format_float(config.audio_filters.volume)));
    }
    filters.extend(fade_filters(&config.fade, segment, "afade"));
    filters.extend(config.audio_filters.custom.iter().cloned());
    filters
}

/// `-filter_complex` arguments with one labelled graph per retained track, or
/// nothing when no track is retained.
pub fn audio_filter_args(config: &Config, segment: &Segment) -> Vec<String> {
    let filters = audio_filters(config, segment);

    let per_track: Vec<String> = config
        .retained_tracks()
        .into_iter()
        .map(|(input_index, _)| {
            let mut chain: Vec<String> = Vec::new();
            if let Some(fix) = config.channel_layout_fix(input_index).filter() {
                chain.push(fix.to_string());
            }
            chain.extend(filters.iter().cloned());
            if chain.is_empty() {
                chain.push("acopy".into());
            }
            format!("[0:a:{input_index}]{}", chain.join(","))
        })
        .collect();

    if per_track.is_empty() {
        Vec::new()
    } else {
        vec!["-filter_complex".into(), per_track.join(";")]
    }
}
