//! Display helpers for file paths

use std::path::Path;

/// Width a file name is shortened to in report tables
pub const MAX_DISPLAY_WIDTH: usize = 30;

/// Path of `file` relative to `base`, or `file` unchanged when it lies elsewhere
pub fn relative_display_path(base: &Path, file: &str) -> String {
    Path::new(file)
        .strip_prefix(base)
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file.to_string())
}

/// Shorten a `/`-separated path to at most `max_length` characters
///
/// Directories after the first are elided from the left (`src/../deep/file.rs`);
/// when nothing fits the result is `../<file name>`.
pub fn pretty_path_name(path: &str, max_length: usize) -> String {
    if path.chars().count() <= max_length {
        return path.to_string();
    }

    let (root, rest) = match path.strip_prefix('/') {
        Some(rest) => ("/", rest),
        None => ("", path),
    };
    let mut segments: Vec<&str> = rest.split('/').collect();
    let base = segments.pop().unwrap_or_default();

    let mut dirs = segments.into_iter();
    let first_dir = dirs.next().unwrap_or_default();
    let mut remaining: Vec<&str> = dirs.collect();

    while !remaining.is_empty() {
        remaining.remove(0);
        let middle = std::iter::once("..")
            .chain(remaining.iter().copied())
            .collect::<Vec<_>>()
            .join("/");
        let candidate = format!("{}{}/{}/{}", root, first_dir, middle, base);
        if candidate.chars().count() <= max_length {
            return candidate;
        }
    }

    format!("../{}", base)
}
