/// Course Scaffolder
///
/// Template-driven generator for course folder hierarchies. A JSON payload
/// describing courses, chapters, and lessons is walked against Jinja-style
/// structure templates, producing numbered folders and files on disk (plus
/// an optional Jellyfin-style video hierarchy) and mirroring the created
/// entities into a record store.

pub mod assets;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod manager;
pub mod model;
pub mod paths;
pub mod prefix;
pub mod records;
pub mod sanitize;
pub mod structure;
pub mod templates;

// Re-export main types for easy access
pub use crate::assets::{AssetContext, FileRole, ImageGenerator, PlaceholderGenerator};
pub use crate::config::Config;
pub use crate::error::{Result, ScaffoldError};
pub use crate::hierarchy::{apply_paths, HierarchyWalker, PathMap, WalkOptions};
pub use crate::manager::CourseManager;
pub use crate::model::{ChapterNode, CourseNode, LessonNode, NodeId, Payload};
pub use crate::records::{MemoryRecordStore, RecordFields, RecordHandle, RecordStore};
pub use crate::sanitize::sanitize;
pub use crate::structure::{RenderOutcome, StructureNode, StructureRenderer};
pub use crate::templates::TemplateManager;
