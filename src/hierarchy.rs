//! Course → Chapter → Lesson hierarchy walking
//!
//! The walker is a pure recursive traversal with accumulating context: no
//! state is persisted between levels. Text and video hierarchies are built
//! by two independent passes, each returning a path map keyed by node id;
//! [`apply_paths`] merges the maps back onto the payload. Symbolic paths
//! (with `$VAR` tokens intact) are what end up in the maps; disk paths are
//! derived from them only for I/O.

use crate::assets::{AssetContext, ImageGenerator};
use crate::config::Config;
use crate::error::{Result, ScaffoldError};
use crate::model::{ChapterNode, CourseNode, LessonNode, NodeId};
use crate::paths::{self, Parent};
use crate::prefix::{max_prefix, next_prefix};
use crate::sanitize::sanitize;
use crate::structure::{StructureNode, StructureRenderer};
use crate::templates::TemplateManager;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Symbolic path per node id, produced by one walking pass.
pub type PathMap = HashMap<NodeId, String>;

fn season_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2})$").expect("valid regex"))
}

fn episode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[eE](\d{2})").expect("valid regex"))
}

/// Per-run walking options.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Create folders/files on disk; when off, paths are resolved only
    /// (dry-run/JSON-only mode) and no video tree is built.
    pub create_folders: bool,

    /// Build the parallel Jellyfin-style video hierarchy.
    pub include_video: bool,

    /// Keep `$VAR` tokens in recorded paths.
    pub keep_symbolic: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            create_folders: true,
            include_video: false,
            keep_symbolic: true,
        }
    }
}

/// Walks a course payload and materializes its folder hierarchies.
pub struct HierarchyWalker<'a> {
    config: &'a Config,
    templates: &'a TemplateManager,
    renderer: StructureRenderer<'a>,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(
        config: &'a Config,
        templates: &'a TemplateManager,
        images: &'a dyn ImageGenerator,
    ) -> Self {
        Self {
            config,
            templates,
            renderer: StructureRenderer::new(templates, images),
        }
    }

    /// Build the text tree (and the video tree when requested) for one
    /// course and merge the resulting paths onto the payload nodes.
    pub fn scaffold_course(&self, course: &mut CourseNode, options: &WalkOptions) -> Result<()> {
        let text = self.build_text_tree(course, options)?;
        let video = if options.include_video && options.create_folders {
            let course_text_path = text.get(&course.node_id).cloned();
            Some(self.build_video_tree(course, course_text_path.as_deref(), options)?)
        } else {
            None
        };
        apply_paths(course, &text, video.as_ref());
        Ok(())
    }

    /// Text hierarchy pass. Returns symbolic paths keyed by node id.
    pub fn build_text_tree(&self, course: &CourseNode, options: &WalkOptions) -> Result<PathMap> {
        let mut map = PathMap::new();

        let parent = self.config.folders.course_root.as_deref().map(Parent::Symbolic);
        let (disk, symbolic) =
            paths::resolve(course.path.as_deref(), parent, options.keep_symbolic);
        let variant = self.variant_of(course.template.as_deref());

        if !options.create_folders {
            map.insert(course.node_id, symbolic.clone());
            for chapter in &course.chapters {
                self.walk_chapter_text(chapter, &symbolic, None, options, &mut map)?;
            }
            return Ok(map);
        }

        let prefix = next_prefix(&disk, None);
        let mut context = self.course_context(course, &prefix);
        let outcome = self
            .renderer
            .render_and_create("course", &variant, &mut context, &disk, true)?;
        let folder_name = file_name_string(&outcome.full_path);

        // The created name (with its env-driven prefix) is appended onto the
        // UN-expanded symbolic path so persisted records stay portable.
        let course_symbolic = paths::join_symbolic(&symbolic, &folder_name);
        map.insert(course.node_id, course_symbolic.clone());
        tracing::info!("📁 Course '{}' → {}", course.name, course_symbolic);

        let passed = match &course.child_folder_name {
            Some(explicit) => Some(explicit.clone()),
            None => self.templates.child_folder_name("course", &variant)?,
        };
        for chapter in &course.chapters {
            self.walk_chapter_text(chapter, &course_symbolic, passed.as_deref(), options, &mut map)?;
        }

        Ok(map)
    }

    /// Chapter-level entry, usable directly for additive runs against an
    /// already-created course folder.
    pub fn build_text_chapters(
        &self,
        chapters: &[ChapterNode],
        parent_path: &str,
        passed_child_folder: Option<&str>,
        options: &WalkOptions,
    ) -> Result<PathMap> {
        let mut map = PathMap::new();
        for chapter in chapters {
            self.walk_chapter_text(chapter, parent_path, passed_child_folder, options, &mut map)?;
        }
        Ok(map)
    }

    fn walk_chapter_text(
        &self,
        chapter: &ChapterNode,
        parent_symbolic: &str,
        passed: Option<&str>,
        options: &WalkOptions,
        map: &mut PathMap,
    ) -> Result<()> {
        let (disk, symbolic) = paths::resolve(
            chapter.path.as_deref(),
            Some(Parent::Symbolic(parent_symbolic)),
            options.keep_symbolic,
        );
        let variant = self.variant_of(chapter.template.as_deref());

        if !options.create_folders {
            map.insert(chapter.node_id, symbolic.clone());
            for lesson in &chapter.lessons {
                let (_, lesson_symbolic) = paths::resolve(
                    lesson.path.as_deref(),
                    Some(Parent::Symbolic(&symbolic)),
                    options.keep_symbolic,
                );
                map.insert(lesson.node_id, lesson_symbolic);
            }
            return Ok(());
        }

        // Nesting priority: explicit on the node, then the value handed down
        // from the course, then the level fallback.
        let nesting = chapter
            .child_folder_name
            .clone()
            .or_else(|| passed.map(str::to_string))
            .unwrap_or_else(|| "chapters".to_string());
        let (target_disk, target_symbolic) = if chapter.enable_subfolder.unwrap_or(true) {
            (disk.join(&nesting), paths::join_symbolic(&symbolic, &nesting))
        } else {
            (disk, symbolic)
        };

        let prefix = next_prefix(&target_disk, None);
        let mut context = chapter_context(chapter, &prefix);
        let outcome =
            self.renderer
                .render_and_create("chapter", &variant, &mut context, &target_disk, false)?;
        let chapter_symbolic =
            paths::join_symbolic(&target_symbolic, &file_name_string(&outcome.full_path));
        map.insert(chapter.node_id, chapter_symbolic.clone());
        tracing::info!("📂 Chapter '{}' → {}", chapter.name, chapter_symbolic);

        let lesson_passed = match &chapter.child_folder_name {
            Some(explicit) => Some(explicit.clone()),
            None => self.templates.child_folder_name("chapter", &variant)?,
        };
        for lesson in &chapter.lessons {
            self.walk_lesson_text(lesson, &chapter_symbolic, lesson_passed.as_deref(), options, map)?;
        }

        Ok(())
    }

    fn walk_lesson_text(
        &self,
        lesson: &LessonNode,
        parent_symbolic: &str,
        passed: Option<&str>,
        options: &WalkOptions,
        map: &mut PathMap,
    ) -> Result<()> {
        let (disk, symbolic) = paths::resolve(
            lesson.path.as_deref(),
            Some(Parent::Symbolic(parent_symbolic)),
            options.keep_symbolic,
        );
        let variant = self.variant_of(lesson.template.as_deref());

        if !options.create_folders {
            map.insert(lesson.node_id, symbolic);
            return Ok(());
        }

        let nesting = lesson
            .child_folder_name
            .clone()
            .or_else(|| passed.map(str::to_string))
            .unwrap_or_else(|| "lessons".to_string());
        let (target_disk, target_symbolic) = if lesson.enable_subfolder.unwrap_or(true) {
            (disk.join(&nesting), paths::join_symbolic(&symbolic, &nesting))
        } else {
            (disk, symbolic)
        };

        let ext = lesson
            .ext
            .clone()
            .unwrap_or_else(|| self.config.folders.lesson_extension.clone());
        let prefix = next_prefix(&target_disk, Some(&ext));
        let mut context = serde_json::Map::new();
        context.insert("name".into(), Value::from(lesson.name.clone()));
        context.insert("numeric_prefix".into(), Value::from(prefix));
        context.insert("ext".into(), Value::from(ext));

        let outcome =
            self.renderer
                .render_and_create("lesson", &variant, &mut context, &target_disk, false)?;
        let lesson_symbolic =
            paths::join_symbolic(&target_symbolic, &file_name_string(&outcome.full_path));
        tracing::debug!("📝 Lesson '{}' → {}", lesson.name, lesson_symbolic);
        map.insert(lesson.node_id, lesson_symbolic);

        Ok(())
    }

    /// Video hierarchy pass. Root priority: nested inside the text course
    /// folder when configured so, else the configured video root, else
    /// `~/Videos/courses`. Always uses the `"video"` template variants.
    pub fn build_video_tree(
        &self,
        course: &CourseNode,
        text_course_path: Option<&str>,
        options: &WalkOptions,
    ) -> Result<PathMap> {
        let mut map = PathMap::new();

        let (root_disk, root_symbolic) = self.video_root(text_course_path, options);

        let prefix = next_prefix(&root_disk, None);
        let mut context = self.course_context(course, &prefix);
        let outcome =
            self.renderer
                .render_and_create("course", "video", &mut context, &root_disk, true)?;
        let course_symbolic =
            paths::join_symbolic(&root_symbolic, &file_name_string(&outcome.full_path));
        map.insert(course.node_id, course_symbolic.clone());
        tracing::info!("🎬 Video course '{}' → {}", course.name, course_symbolic);

        for (index, chapter) in course.chapters.iter().enumerate() {
            self.walk_chapter_video(chapter, index, &course_symbolic, course, options, &mut map)?;
        }

        Ok(map)
    }

    fn video_root(&self, text_course_path: Option<&str>, options: &WalkOptions) -> (PathBuf, String) {
        if self.config.folders.video_in_course_folder {
            if let Some(path) = text_course_path {
                return paths::resolve(None, Some(Parent::Symbolic(path)), options.keep_symbolic);
            }
        }
        if let Some(root) = &self.config.folders.video_root {
            return paths::resolve(None, Some(Parent::Symbolic(root)), options.keep_symbolic);
        }
        let fallback = paths::default_video_root();
        let symbolic = fallback.display().to_string();
        (fallback, symbolic)
    }

    fn walk_chapter_video(
        &self,
        chapter: &ChapterNode,
        index: usize,
        parent_symbolic: &str,
        course: &CourseNode,
        options: &WalkOptions,
        map: &mut PathMap,
    ) -> Result<()> {
        let (disk, symbolic) = paths::resolve(
            None,
            Some(Parent::Symbolic(parent_symbolic)),
            options.keep_symbolic,
        );

        // Season folders must not gain an extra wrapper directory: nesting
        // is off in video mode unless the node explicitly asks for it.
        let (target_disk, target_symbolic) = if chapter.enable_subfolder == Some(true) {
            let nesting = chapter
                .child_folder_name
                .clone()
                .unwrap_or_else(|| "chapters".to_string());
            (disk.join(&nesting), paths::join_symbolic(&symbolic, &nesting))
        } else {
            (disk, symbolic)
        };

        // Template-created marker files can leave the directory non-empty
        // without any prefixed entries; the loop index breaks the tie.
        let prefix = match max_prefix(&target_disk, None) {
            Some(found) => format!("{:02}", found + 1),
            None if dir_non_empty(&target_disk) => format!("{:02}", index + 1),
            None => "01".to_string(),
        };

        let mut context = chapter_context(chapter, &prefix);
        self.extend_video_context(&mut context, course, Some(&chapter.name));
        let outcome =
            self.renderer
                .render_and_create("chapter", "video", &mut context, &target_disk, false)?;
        let season_symbolic =
            paths::join_symbolic(&target_symbolic, &file_name_string(&outcome.full_path));
        map.insert(chapter.node_id, season_symbolic.clone());
        tracing::info!("🎞️ Season '{}' → {}", chapter.name, season_symbolic);

        for lesson in &chapter.lessons {
            self.walk_lesson_video(lesson, &season_symbolic, &outcome.full_path, course, map)?;
        }

        Ok(())
    }

    fn walk_lesson_video(
        &self,
        lesson: &LessonNode,
        parent_symbolic: &str,
        parent_disk: &Path,
        course: &CourseNode,
        map: &mut PathMap,
    ) -> Result<()> {
        let folder_name = file_name_string(parent_disk);
        let season_number = season_suffix_re()
            .captures(&folder_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ScaffoldError::MissingSeasonNumber(folder_name.clone()))?;

        let ext = self.config.folders.video_extension.clone();
        let episode = next_episode(parent_disk, &ext);

        let mut context = serde_json::Map::new();
        context.insert("name".into(), Value::from(lesson.name.clone()));
        context.insert("season_number".into(), Value::from(season_number));
        context.insert("episode_number".into(), Value::from(format!("{episode:02}")));
        context.insert("numeric_prefix".into(), Value::from(format!("{episode:02}")));
        context.insert("ext".into(), Value::from(ext));
        self.extend_video_context(&mut context, course, None);

        let outcome =
            self.renderer
                .render_and_create("lesson", "video", &mut context, parent_disk, false)?;

        // The renderer, not the caller, decides the episode filename; read
        // it back from the rendered structure.
        let video_path = match &outcome.structure {
            StructureNode::File { .. } => {
                paths::join_symbolic(parent_symbolic, &file_name_string(&outcome.full_path))
            }
            other => {
                let folder = file_name_string(&outcome.full_path);
                let base = paths::join_symbolic(parent_symbolic, &folder);
                match self.renderer.first_file_name(other, &context)? {
                    Some(file) => paths::join_symbolic(&base, &file),
                    None => base,
                }
            }
        };
        tracing::debug!("🎥 Episode '{}' → {}", lesson.name, video_path);
        map.insert(lesson.node_id, video_path);

        Ok(())
    }

    fn variant_of(&self, declared: Option<&str>) -> String {
        declared
            .map(str::to_string)
            .unwrap_or_else(|| self.config.defaults.template.clone())
    }

    /// Full course context: identity, ordering, and the asset ids the image
    /// generator contracts require (course overrides, config defaults).
    fn course_context(&self, course: &CourseNode, prefix: &str) -> AssetContext {
        let defaults = &self.config.defaults;
        let mut context = serde_json::Map::new();
        context.insert("name".into(), Value::from(course.name.clone()));
        context.insert("numeric_prefix".into(), Value::from(prefix));
        if let Some(description) = &course.description {
            context.insert("description".into(), Value::from(description.clone()));
        }
        context.insert(
            "instructor".into(),
            Value::from(course.instructor.clone().unwrap_or_else(|| defaults.instructor.clone())),
        );
        context.insert(
            "institute".into(),
            Value::from(course.institute.clone().unwrap_or_else(|| defaults.institute.clone())),
        );
        context.insert(
            "year".into(),
            Value::from(course.year.unwrap_or(defaults.year)),
        );
        context.insert(
            "logo_public_id".into(),
            Value::from(course.logo_public_id.clone().unwrap_or_else(|| defaults.logo_public_id.clone())),
        );
        context.insert(
            "fanart_public_id".into(),
            Value::from(course.fanart_public_id.clone().unwrap_or_else(|| defaults.fanart_public_id.clone())),
        );
        context.insert(
            "poster_base_id".into(),
            Value::from(course.poster_base_id.clone().unwrap_or_else(|| defaults.poster_base_id.clone())),
        );
        context.insert(
            "thumb_base_id".into(),
            Value::from(course.thumb_base_id.clone().unwrap_or_else(|| defaults.thumb_base_id.clone())),
        );
        context.insert("course_title".into(), Value::from(course.name.clone()));
        context
    }

    /// Course-level asset ids and titles propagated into chapter/lesson
    /// video contexts (season posters, episode thumbnails).
    fn extend_video_context(
        &self,
        context: &mut AssetContext,
        course: &CourseNode,
        chapter_title: Option<&str>,
    ) {
        let base = self.course_context(course, "");
        for (key, value) in base {
            if key == "name" || key == "numeric_prefix" {
                continue;
            }
            context.entry(key).or_insert(value);
        }
        context.insert("course_name".into(), Value::from(sanitize(&course.name)));
        if let Some(title) = chapter_title {
            context.insert("chapter_title".into(), Value::from(title.to_string()));
        }
    }
}

/// Merge text and video path maps onto the payload. Nodes without a video
/// entry keep `None`, which serializes as the `"NA"` sentinel.
pub fn apply_paths(course: &mut CourseNode, text: &PathMap, video: Option<&PathMap>) {
    let lookup = |map: Option<&PathMap>, id: NodeId| map.and_then(|m| m.get(&id).cloned());

    if let Some(path) = text.get(&course.node_id) {
        course.path = Some(path.clone());
    }
    course.video_path = lookup(video, course.node_id);

    for chapter in &mut course.chapters {
        if let Some(path) = text.get(&chapter.node_id) {
            chapter.path = Some(path.clone());
        }
        chapter.video_path = lookup(video, chapter.node_id);

        for lesson in &mut chapter.lessons {
            if let Some(path) = text.get(&lesson.node_id) {
                lesson.path = Some(path.clone());
            }
            lesson.video_path = lookup(video, lesson.node_id);
        }
    }
}

fn chapter_context(chapter: &ChapterNode, prefix: &str) -> AssetContext {
    let mut context = serde_json::Map::new();
    context.insert("name".into(), Value::from(chapter.name.clone()));
    context.insert("numeric_prefix".into(), Value::from(prefix));
    let lesson_names: Vec<Value> = chapter
        .lessons
        .iter()
        .map(|l| Value::from(l.name.clone()))
        .collect();
    context.insert("lessons".into(), Value::from(lesson_names));
    context
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn dir_non_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Next unused episode number among files with the given extension.
fn next_episode(dir: &Path, ext: &str) -> u32 {
    let wanted = ext.trim_start_matches('.');
    let mut max = 0u32;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match path.extension().and_then(|e| e.to_str()) {
                Some(found) if found == wanted => {}
                _ => continue,
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                for caps in episode_re().captures_iter(stem) {
                    if let Ok(n) = caps[1].parse::<u32>() {
                        max = max.max(n);
                    }
                }
            }
        }
    }
    max + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_season_suffix_regex() {
        let caps = season_suffix_re().captures("season_07").unwrap();
        assert_eq!(&caps[1], "07");
        assert!(season_suffix_re().captures("extras").is_none());
        // Only a trailing two-digit group counts.
        assert!(season_suffix_re().captures("07_season_x").is_none());
    }

    #[test]
    fn test_next_episode_scan() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("course_s01e01.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("course_s01e03.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("course_s01e09.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("poster.jpg"), b"").unwrap();
        assert_eq!(next_episode(dir.path(), "mkv"), 4);
        assert_eq!(next_episode(dir.path(), "mp4"), 10);
        assert_eq!(next_episode(dir.path(), "avi"), 1);
    }
}
