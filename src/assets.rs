//! Cover-art roles and the image-generation seam
//!
//! The renderer infers intent from the destination filename: a file leaf
//! named `poster.jpg` is cover art, not an empty marker file. The roles form
//! a closed enumeration with an explicit required-context contract; pixel
//! rendering itself is a collaborator behind [`ImageGenerator`].

use crate::error::Result;
use serde_json::Map;
use std::path::Path;

/// Role a file leaf plays in the generated tree, resolved once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Background,
    Fanart,
    Logo,
    Poster,
    Thumb,
    /// Anything else: created as an empty file.
    Generic,
}

impl FileRole {
    /// Case-insensitive suffix match on the destination filename.
    pub fn from_filename(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with("background.jpg") {
            FileRole::Background
        } else if lower.ends_with("fanart.jpg") {
            FileRole::Fanart
        } else if lower.ends_with("logo.png") {
            FileRole::Logo
        } else if lower.ends_with("poster.jpg") {
            FileRole::Poster
        } else if lower.ends_with("thumb.jpg") {
            FileRole::Thumb
        } else {
            FileRole::Generic
        }
    }

    /// Context key that must be present for this role to be generated.
    /// Absence of the key means skip generation and fall through to touch.
    pub fn required_key(&self) -> Option<&'static str> {
        match self {
            FileRole::Background | FileRole::Logo => Some("logo_public_id"),
            FileRole::Fanart => Some("fanart_public_id"),
            FileRole::Poster => Some("poster_base_id"),
            FileRole::Thumb => Some("thumb_base_id"),
            FileRole::Generic => None,
        }
    }
}

/// Entity context handed to the image generator (asset ids, titles, year).
pub type AssetContext = Map<String, serde_json::Value>;

/// Collaborator that materializes cover art at a given path.
pub trait ImageGenerator {
    fn generate(&self, role: FileRole, context: &AssetContext, out_path: &Path) -> Result<()>;
}

/// Default generator: touches the target file and leaves pixels to someone
/// else. Keeps the core runnable without any image backend configured.
pub struct PlaceholderGenerator;

impl ImageGenerator for PlaceholderGenerator {
    fn generate(&self, role: FileRole, _context: &AssetContext, out_path: &Path) -> Result<()> {
        tracing::debug!("🖼️ placeholder for {:?} at {}", role, out_path.display());
        std::fs::File::create(out_path)?;
        Ok(())
    }
}
