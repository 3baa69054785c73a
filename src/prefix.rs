//! Two-digit numeric prefix allocation for ordered folder/file insertion

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use walkdir::WalkDir;

fn two_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2}").expect("valid regex"))
}

/// Highest two-digit prefix found among `dir`'s direct children, or `None`
/// if the directory is missing or nothing matched.
///
/// With a `file_extension`, only files with that suffix are considered and
/// the prefix is matched against the filename stem; otherwise only
/// subdirectories are considered, matched against the full name. The prefix
/// is the first two consecutive digits anywhere in the candidate name
/// (`01_Intro`, `WK03`, `season_07` all match).
pub fn max_prefix(dir: &Path, file_extension: Option<&str>) -> Option<u32> {
    if !dir.is_dir() {
        return None;
    }

    let wanted_ext = file_extension.map(|e| e.trim_start_matches('.'));
    let mut max: Option<u32> = None;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let candidate = match wanted_ext {
            Some(ext) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                match entry.path().extension().and_then(|e| e.to_str()) {
                    Some(found) if found == ext => {}
                    _ => continue,
                }
                match entry.path().file_stem().and_then(|s| s.to_str()) {
                    Some(stem) => stem.to_string(),
                    None => continue,
                }
            }
            None => {
                if !entry.file_type().is_dir() {
                    continue;
                }
                entry.file_name().to_string_lossy().into_owned()
            }
        };

        if let Some(m) = two_digits().find(&candidate) {
            if let Ok(n) = m.as_str().parse::<u32>() {
                max = Some(max.map_or(n, |cur| cur.max(n)));
            }
        }
    }

    max
}

/// Next available zero-padded two-digit prefix for `dir`.
///
/// Returns `max(found) + 1`, or `"01"` when nothing matched or the directory
/// does not exist. Re-running against a partially populated directory is
/// therefore additive, never destructive. Not atomic: concurrent writers
/// must be serialized by the caller.
pub fn next_prefix(dir: &Path, file_extension: Option<&str>) -> String {
    let next = max_prefix(dir, file_extension).map_or(1, |m| m + 1);
    format!("{next:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_returns_01() {
        assert_eq!(next_prefix(Path::new("/nonexistent/dir"), None), "01");
    }

    #[test]
    fn test_empty_dir_returns_01() {
        let dir = TempDir::new().unwrap();
        assert_eq!(next_prefix(dir.path(), None), "01");
    }

    #[test]
    fn test_monotonic_over_folders() {
        let dir = TempDir::new().unwrap();
        for name in ["01_intro", "02_basics", "05_advanced"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        // Files must not count when scanning folders.
        std::fs::write(dir.path().join("09_notes.txt"), b"").unwrap();
        assert_eq!(next_prefix(dir.path(), None), "06");
    }

    #[test]
    fn test_prefix_anywhere_in_name() {
        let dir = TempDir::new().unwrap();
        for name in ["WK03", "season_07", "no_digits"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        assert_eq!(next_prefix(dir.path(), None), "08");
    }

    #[test]
    fn test_file_extension_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("01_overview.md"), b"").unwrap();
        std::fs::write(dir.path().join("03_setup.md"), b"").unwrap();
        std::fs::write(dir.path().join("07_other.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("09_folder")).unwrap();
        assert_eq!(next_prefix(dir.path(), Some("md")), "04");
        assert_eq!(next_prefix(dir.path(), Some(".md")), "04");
    }

    #[test]
    fn test_max_prefix_none_when_unmatched() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("extras")).unwrap();
        assert_eq!(max_prefix(dir.path(), None), None);
    }
}
