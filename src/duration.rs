//! Parsing of ffmpeg duration strings.
//!
//! Two forms are accepted: `[[HH:]MM:]SS[.frac]` and `N[.frac]` followed by one of
//! the unit suffixes `s`, `ms` or `us`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^((((?P<hms_grp1>\d*):)?((?P<hms_grp2>\d*):)?(?P<hms_secs>\d+([.]\d*)?))",
            r"|((?P<smu_value>\d+([.]\d*)?)(?P<smu_units>s|ms|us)))$",
        ))
        .expect("duration pattern is valid")
    })
}

/// Converts an ffmpeg duration string to seconds.
///
/// With a single colon group the leading value is minutes; with two it is
/// hours then minutes. Empty groups (`"1::05"`) count as zero.
pub fn duration_to_seconds(duration: &str) -> Result<f64> {
    let unparseable = || Error::UnparseableDuration(duration.to_string());
    let caps = duration_regex().captures(duration).ok_or_else(unparseable)?;

    if let Some(secs) = caps.name("hms_secs") {
        let mut value: f64 = secs.as_str().parse().map_err(|_| unparseable())?;
        let group = |name: &str| -> Result<Option<f64>> {
            match caps.name(name) {
                None => Ok(None),
                Some(m) if m.as_str().is_empty() => Ok(Some(0.0)),
                Some(m) => m.as_str().parse().map(Some).map_err(|_| unparseable()),
            }
        };
        match (group("hms_grp1")?, group("hms_grp2")?) {
            (hours, Some(minutes)) => value += hours.unwrap_or(0.0) * 3600.0 + minutes * 60.0,
            (Some(minutes), None) => value += minutes * 60.0,
            (None, None) => {}
        }
        return Ok(value);
    }

    let value: f64 = caps["smu_value"].parse().map_err(|_| unparseable())?;
    Ok(match &caps["smu_units"] {
        "ms" => value / 1_000.0,
        "us" => value / 1_000_000.0,
        _ => value,
    })
}
