//! Environment-variable-aware path resolution
//!
//! Persisted records keep symbolic `$VAR` forms so they stay portable across
//! machines, while disk I/O always uses the fully expanded form. An unset
//! variable expands to an empty string (shell `$VAR` semantics), never an
//! error.

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn env_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}|\$([A-Za-z0-9_]+)").expect("valid regex"))
}

/// Fallback source when no raw path is given.
#[derive(Debug, Clone)]
pub enum Parent<'a> {
    /// A string that may still carry `$VAR` tokens.
    Symbolic(&'a str),
    /// An already-resolved on-disk path, used as-is for both values.
    Disk(&'a Path),
}

/// Expands `$VAR` / `${VAR}` tokens against the process environment.
/// Missing variables become empty strings.
pub fn expand_env_vars(path: &str) -> String {
    env_token()
        .replace_all(path, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(name).unwrap_or_default()
        })
        .into_owned()
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_user(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// The user's Documents directory, the last-resort root for text hierarchies.
pub fn documents_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default root for the Jellyfin-style video hierarchy (`~/Videos/courses`).
pub fn default_video_root() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courses")
}

/// Resolves a possibly symbolic path into `(disk_path, symbolic_path)`.
///
/// With `raw_path` given, the disk path is the env-var and `~` expansion of
/// it; the symbolic path is `raw_path` unchanged when `keep_symbolic` is set,
/// else the same expansion. With no raw path the parent is processed the
/// same way (or returned as-is when it is already a disk path). With neither,
/// both values fall back to the Documents directory.
pub fn resolve(
    raw_path: Option<&str>,
    parent_path: Option<Parent<'_>>,
    keep_symbolic: bool,
) -> (PathBuf, String) {
    let expand_one = |raw: &str| {
        let symbolic = if keep_symbolic {
            raw.to_string()
        } else {
            expand_env_vars(raw)
        };
        let disk = expand_user(&expand_env_vars(raw));
        (disk, symbolic)
    };

    if let Some(raw) = raw_path {
        return expand_one(raw);
    }

    match parent_path {
        Some(Parent::Symbolic(s)) => expand_one(s),
        Some(Parent::Disk(p)) => (p.to_path_buf(), p.display().to_string()),
        None => {
            let fallback = documents_dir();
            let symbolic = fallback.display().to_string();
            (fallback, symbolic)
        }
    }
}

/// Appends a created entry name to a symbolic path without expanding it.
pub fn join_symbolic(symbolic: &str, name: &str) -> String {
    Path::new(symbolic).join(name).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_preserved_disk_expanded() {
        std::env::set_var("SCAFFOLD_TEST_DATALIB", "/srv/datalib");
        let (disk, symbolic) = resolve(Some("$SCAFFOLD_TEST_DATALIB/courses"), None, true);
        assert!(symbolic.contains("$SCAFFOLD_TEST_DATALIB"));
        assert_eq!(disk, PathBuf::from("/srv/datalib/courses"));
    }

    #[test]
    fn test_unset_var_expands_to_empty() {
        let expanded = expand_env_vars("pre/$SCAFFOLD_TEST_UNSET_VAR/post");
        assert_eq!(expanded, "pre//post");
    }

    #[test]
    fn test_braced_var() {
        std::env::set_var("SCAFFOLD_TEST_BRACED", "x");
        assert_eq!(expand_env_vars("${SCAFFOLD_TEST_BRACED}/y"), "x/y");
    }

    #[test]
    fn test_parent_fallbacks() {
        std::env::set_var("SCAFFOLD_TEST_PARENT", "/tmp/parent");
        let (disk, symbolic) = resolve(None, Some(Parent::Symbolic("$SCAFFOLD_TEST_PARENT")), true);
        assert_eq!(disk, PathBuf::from("/tmp/parent"));
        assert_eq!(symbolic, "$SCAFFOLD_TEST_PARENT");

        let p = Path::new("/tmp/already");
        let (disk, symbolic) = resolve(None, Some(Parent::Disk(p)), true);
        assert_eq!(disk, p);
        assert_eq!(symbolic, "/tmp/already");
    }

    #[test]
    fn test_both_missing_falls_back_to_documents() {
        let (disk, symbolic) = resolve(None, None, true);
        assert_eq!(disk.display().to_string(), symbolic);
    }

    #[test]
    fn test_join_symbolic_keeps_tokens() {
        assert_eq!(
            join_symbolic("$DATALIB/courses", "01_Intro"),
            "$DATALIB/courses/01_Intro"
        );
    }
}
