//! Error types for the structure generator

use std::path::PathBuf;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// Error taxonomy for scaffolding operations.
///
/// Configuration and template errors are fatal and indicate a broken
/// install or a template-authoring bug. Filesystem conflicts surface as a
/// distinct condition so callers can decide (skip/rename/abort) instead of
/// the lower layer guessing.
#[derive(thiserror::Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no template registered for type={entity_type}, variant={variant}")]
    TemplateNotFound {
        entity_type: String,
        variant: String,
    },

    #[error("template file missing: {0}")]
    TemplateFileMissing(PathBuf),

    #[error("template render failed: {0}")]
    Render(#[from] minijinja::Error),

    #[error("template output is not valid JSON ({source}); rendered text starts with: {snippet}")]
    StructureParse {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid structure: top-level node has neither 'folder' nor 'file'")]
    InvalidStructure,

    #[error("target folder already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("season folder '{0}' has no trailing two-digit number; cannot derive episode naming")]
    MissingSeasonNumber(String),

    #[error("payload node missing required field: {0}")]
    MissingField(&'static str),

    #[error("record store error: {0}")]
    Records(String),
}
