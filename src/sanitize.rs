//! Display-name to filesystem-name conversion

use regex::Regex;
use std::sync::OnceLock;

fn special_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn underscore_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("valid regex"))
}

/// Converts a display name into a filesystem-safe folder/file name.
///
/// `'Course Name 123!'` becomes `'Course_Name_123'`. A trailing `.ext`
/// (single dot) is detected and the base is sanitized separately so the
/// extension survives untouched. Names that start with `_` keep exactly one
/// leading underscore (convention-carrying names like `_publish`).
///
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> String {
    if let Some((base, ext)) = name.rsplit_once('.') {
        format!("{}.{}", sanitize_part(base), ext)
    } else {
        sanitize_part(name)
    }
}

fn sanitize_part(name: &str) -> String {
    let keep_leading_underscore = name.starts_with('_');

    let cleaned = special_chars().replace_all(name, "");
    let cleaned = cleaned.replace('-', "_");
    let cleaned = whitespace_runs().replace_all(&cleaned, "_");
    let cleaned = underscore_runs().replace_all(&cleaned, "_");
    let trimmed = cleaned.trim_matches('_');

    if keep_leading_underscore {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}
