//! Source segments: the time ranges of an input that become separate outputs.

use serde::Serialize;

use crate::duration::duration_to_seconds;
use crate::error::{Error, Result};

/// A bounded or unbounded region of a source file.
///
/// The original strings are kept because ffmpeg receives them verbatim; the
/// second values are only used for arithmetic such as fade-out timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start_str: Option<String>,
    pub end_str: Option<String>,
    pub duration_str: Option<String>,
    pub start: f64,
    pub end: Option<f64>,
    pub duration: Option<f64>,
}

impl Segment {
    pub fn new(
        start: Option<String>,
        end: Option<String>,
        duration: Option<String>,
    ) -> Result<Self> {
        if end.is_some() && duration.is_some() {
            return Err(Error::DurationWithEnd);
        }

        let start_sec = start.as_deref().map(duration_to_seconds).transpose()?.unwrap_or(0.0);
        let end_sec = end.as_deref().map(duration_to_seconds).transpose()?;
        let duration_sec = duration.as_deref().map(duration_to_seconds).transpose()?;

        let (end_sec, duration_sec) = match (end_sec, duration_sec) {
            (Some(end), None) => (Some(end), Some(end - start_sec)),
            (None, Some(duration)) => (Some(start_sec + duration), Some(duration)),
            other => other,
        };

        Ok(Self {
            start_str: start,
            end_str: end,
            duration_str: duration,
            start: start_sec,
            end: end_sec,
            duration: duration_sec,
        })
    }

    /// True when the segment runs to the end of the input.
    pub fn is_unbounded(&self) -> bool {
        self.duration.is_none()
    }

    /// ffmpeg input options selecting this segment.
    pub fn input_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(start) = &self.start_str {
            args.extend(["-accurate_seek".to_string(), "-ss".to_string(), start.clone()]);
        }
        if let Some(end) = &self.end_str {
            args.extend(["-to".to_string(), end.clone()]);
        }
        if let Some(duration) = &self.duration_str {
            args.extend(["-t".to_string(), duration.clone()]);
        }
        args
    }
}

/// The raw time selectors as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct TimeSelection {
    pub start: Option<String>,
    pub duration: Option<String>,
    pub end: Option<String>,
    /// `(START, END)` pairs from repeated `--segment` options.
    pub segments: Vec<(String, String)>,
}

/// Segments resolved from a [`TimeSelection`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSegments {
    pub segments: Vec<Segment>,
    /// More than one segment forces numbered output names.
    pub numbered: bool,
}

impl TimeSelection {
    pub fn resolve(&self) -> Result<ResolvedSegments> {
        if self.duration.is_some() && self.end.is_some() {
            return Err(Error::DurationWithEnd);
        }

        if self.segments.is_empty() {
            let segment =
                Segment::new(self.start.clone(), self.end.clone(), self.duration.clone())?;
            return Ok(ResolvedSegments {
                segments: vec![segment],
                numbered: false,
            });
        }

        if self.start.is_some() || self.duration.is_some() || self.end.is_some() {
            return Err(Error::SegmentWithSelectors);
        }
        let segments = self
            .segments
            .iter()
            .map(|(start, end)| Segment::new(Some(start.clone()), Some(end.clone()), None))
            .collect::<Result<Vec<_>>>()?;
        Ok(ResolvedSegments {
            numbered: segments.len() > 1,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(start: Option<&str>, duration: Option<&str>, end: Option<&str>) -> TimeSelection {
        TimeSelection {
            start: start.map(String::from),
            duration: duration.map(String::from),
            end: end.map(String::from),
            segments: Vec::new(),
        }
    }

    #[test]
    fn no_selectors_is_one_unbounded_segment() {
        let resolved = TimeSelection::default().resolve().unwrap();
        assert_eq!(resolved.segments.len(), 1);
        assert!(!resolved.numbered);
        let segment = &resolved.segments[0];
        assert_eq!(segment.start, 0.0);
        assert!(segment.is_unbounded());
        assert_eq!(segment.end, None);
        assert!(segment.input_args().is_empty());
    }

    #[test]
    fn end_is_derived_from_duration() {
        let resolved = selection(Some("10"), Some("5"), None).resolve().unwrap();
        let segment = &resolved.segments[0];
        assert_eq!(segment.end, Some(15.0));
        assert_eq!(segment.duration, Some(5.0));
        assert_eq!(segment.input_args(), ["-accurate_seek", "-ss", "10", "-t", "5"]);
    }

    #[test]
    fn duration_is_derived_from_end() {
        let resolved = selection(Some("1:00"), None, Some("1:30")).resolve().unwrap();
        let segment = &resolved.segments[0];
        assert_eq!(segment.duration, Some(30.0));
        assert_eq!(segment.input_args(), ["-accurate_seek", "-ss", "1:00", "-to", "1:30"]);
    }

    #[test]
    fn duration_and_end_conflict() {
        let err = selection(None, Some("5"), Some("10")).resolve().unwrap_err();
        assert!(matches!(err, Error::DurationWithEnd));
    }

    #[test]
    fn explicit_segments() {
        let mut sel = TimeSelection::default();
        sel.segments = vec![("0".into(), "10".into()), ("1:00".into(), "1:05.5".into())];
        let resolved = sel.resolve().unwrap();
        assert!(resolved.numbered);
        assert_eq!(resolved.segments[1].start, 60.0);
        assert_eq!(resolved.segments[1].duration, Some(5.5));
        assert_eq!(resolved.segments[1].duration_str, None);

        sel.segments.truncate(1);
        assert!(!sel.resolve().unwrap().numbered);
    }

    #[test]
    fn segments_exclude_other_selectors() {
        let mut sel = selection(Some("3"), None, None);
        sel.segments = vec![("0".into(), "10".into())];
        assert!(matches!(sel.resolve().unwrap_err(), Error::SegmentWithSelectors));
    }

    #[test]
    fn bad_timecode_is_reported() {
        let err = selection(Some("soon"), None, None).resolve().unwrap_err();
        assert!(matches!(err, Error::UnparseableDuration(ref s) if s == "soon"));
    }
}
