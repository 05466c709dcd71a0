use std::path::Path;

/// Formats a float for ffmpeg option strings, keeping at least one fractional
/// digit so `2` and `2.0` render identically.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Returns the file name of `path` without directory or extension.
pub fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Renders an argument for display, single-quoting it when the shell would
/// otherwise split or expand it. Embedded quotes become `'\''`.
pub fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", escape_single_quotes(arg))
    }
}

pub fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_keep_a_fraction() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(4.25), "4.25");
        assert_eq!(format_float(-1.0), "-1.0");
    }

    #[test]
    fn title_strips_directory_and_extension() {
        assert_eq!(file_title(Path::new("/videos/movie.mp4")), "movie");
        assert_eq!(file_title(Path::new("clip.part1.mkv")), "clip.part1");
        assert_eq!(file_title(Path::new("noext")), "noext");
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_arg("-c:v"), "-c:v");
        assert_eq!(quote_arg("[0:v]copy"), "'[0:v]copy'");
        assert_eq!(quote_arg("it's.mp4"), r"'it'\''s.mp4'");
        assert_eq!(quote_arg(""), "''");
    }
}
