//! Structure rendering: template → JSON node tree → folders and files
//!
//! Rendering and parsing happen fully before any filesystem mutation, so a
//! template-authoring bug (malformed JSON output) surfaces before a partial
//! folder is created. Leaf name expressions get a second micro-templating
//! pass against the same context, so templates can compose names from
//! values like `numeric_prefix` inside string literals.

use crate::assets::{AssetContext, FileRole, ImageGenerator};
use crate::error::{Result, ScaffoldError};
use crate::sanitize::sanitize;
use crate::templates::TemplateManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Maximum length of the diagnostic snippet echoed on a bad render.
const SNIPPET_LEN: usize = 300;

/// A node of the rendered structure tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructureNode {
    Folder {
        folder: String,
        #[serde(default)]
        subfolders: Vec<StructureNode>,
        #[serde(default)]
        files: Vec<FileLeaf>,
    },
    File {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        template_content: Option<String>,
    },
    /// Node with neither `folder` nor `file`. Tolerated (skipped) inside a
    /// subtree, a hard error at the top level.
    Sparse(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLeaf {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_content: Option<String>,
}

/// What a render-and-create pass produced: the root path on disk and the
/// parsed structure (callers may need the rendered video filename).
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub full_path: PathBuf,
    pub structure: StructureNode,
}

/// Renders an entity's template and materializes the resulting tree.
pub struct StructureRenderer<'a> {
    templates: &'a TemplateManager,
    images: &'a dyn ImageGenerator,
}

impl<'a> StructureRenderer<'a> {
    pub fn new(templates: &'a TemplateManager, images: &'a dyn ImageGenerator) -> Self {
        Self { templates, images }
    }

    /// Render the `(entity_type, variant)` template against `context` and
    /// parse the output into a structure tree. No filesystem mutation.
    ///
    /// The entity's `name` is sanitized into the `<entity_type>_name`
    /// context key before rendering.
    pub fn render_structure(
        &self,
        entity_type: &str,
        variant: &str,
        context: &mut AssetContext,
    ) -> Result<StructureNode> {
        let name = context
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ScaffoldError::MissingField("name"))?;
        context.insert(format!("{entity_type}_name"), Value::from(sanitize(name)));

        let rendered = self.templates.render(entity_type, variant, &*context)?;
        let node: StructureNode =
            serde_json::from_str(&rendered).map_err(|e| ScaffoldError::StructureParse {
                snippet: rendered.chars().take(SNIPPET_LEN).collect(),
                source: e,
            })?;

        if matches!(node, StructureNode::Sparse(_)) {
            return Err(ScaffoldError::InvalidStructure);
        }
        Ok(node)
    }

    /// Final (rendered and sanitized) name of the tree's root entry.
    pub fn root_name(&self, node: &StructureNode, context: &AssetContext) -> Result<String> {
        let expr = match node {
            StructureNode::Folder { folder, .. } => folder,
            StructureNode::File { file, .. } => file,
            StructureNode::Sparse(_) => return Err(ScaffoldError::InvalidStructure),
        };
        Ok(sanitize(&self.templates.render_expression(expr, context)?))
    }

    /// Rendered name of the first file leaf, if the tree declares one. Used
    /// by video-mode lessons where the template decides the final episode
    /// filename.
    pub fn first_file_name(
        &self,
        node: &StructureNode,
        context: &AssetContext,
    ) -> Result<Option<String>> {
        match node {
            StructureNode::File { file, .. } => {
                Ok(Some(sanitize(&self.templates.render_expression(file, context)?)))
            }
            StructureNode::Folder { files, .. } => match files.iter().find_map(|l| l.file.as_ref()) {
                Some(expr) => Ok(Some(sanitize(&self.templates.render_expression(expr, context)?))),
                None => Ok(None),
            },
            StructureNode::Sparse(_) => Ok(None),
        }
    }

    /// Render, optionally guard against an existing root folder, then create
    /// the structure under `parent_path`.
    pub fn render_and_create(
        &self,
        entity_type: &str,
        variant: &str,
        context: &mut AssetContext,
        parent_path: &Path,
        guard_existing: bool,
    ) -> Result<RenderOutcome> {
        let structure = self.render_structure(entity_type, variant, context)?;

        if guard_existing {
            let target = parent_path.join(self.root_name(&structure, context)?);
            if target.exists() {
                return Err(ScaffoldError::AlreadyExists(target));
            }
        }

        std::fs::create_dir_all(parent_path)?;
        let full_path = self.create(&structure, context, parent_path)?;
        Ok(RenderOutcome {
            full_path,
            structure,
        })
    }

    /// Walk a parsed tree and create it on disk. Directory creation is
    /// idempotent; sparse subtree nodes are skipped.
    pub fn create(
        &self,
        node: &StructureNode,
        context: &AssetContext,
        base_path: &Path,
    ) -> Result<PathBuf> {
        match node {
            StructureNode::Folder {
                folder,
                subfolders,
                files,
            } => {
                let name = sanitize(&self.templates.render_expression(folder, context)?);
                let dir = base_path.join(&name);
                std::fs::create_dir_all(&dir)?;

                for sub in subfolders {
                    if let StructureNode::Sparse(value) = sub {
                        tracing::debug!("skipping sparse structure node: {value}");
                        continue;
                    }
                    self.create(sub, context, &dir)?;
                }

                for leaf in files {
                    let Some(expr) = &leaf.file else { continue };
                    let file_name = sanitize(&self.templates.render_expression(expr, context)?);
                    self.write_file(&dir.join(&file_name), leaf.template_content.as_deref(), context)?;
                }

                Ok(dir)
            }
            StructureNode::File {
                file,
                template_content,
            } => {
                let file_name = sanitize(&self.templates.render_expression(file, context)?);
                let target = base_path.join(&file_name);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                self.write_file(&target, template_content.as_deref(), context)?;
                Ok(target)
            }
            StructureNode::Sparse(_) => Err(ScaffoldError::InvalidStructure),
        }
    }

    /// Literal content wins; otherwise the filename decides the role and the
    /// image generator runs when its required context key is present. Plain
    /// files are touched empty.
    fn write_file(&self, target: &Path, content: Option<&str>, context: &AssetContext) -> Result<()> {
        if let Some(content) = content {
            std::fs::write(target, content)?;
            return Ok(());
        }

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let role = FileRole::from_filename(file_name);
        let has_context = role
            .required_key()
            .map(|key| context.get(key).map_or(false, |v| !v.is_null()))
            .unwrap_or(false);

        if role != FileRole::Generic && has_context {
            self.images.generate(role, context, target)
        } else {
            std::fs::File::create(target)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::PlaceholderGenerator;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingGenerator {
        calls: Mutex<Vec<(FileRole, PathBuf)>>,
    }

    impl RecordingGenerator {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageGenerator for RecordingGenerator {
        fn generate(&self, role: FileRole, _context: &AssetContext, out_path: &Path) -> Result<()> {
            self.calls.lock().unwrap().push((role, out_path.to_path_buf()));
            std::fs::File::create(out_path)?;
            Ok(())
        }
    }

    fn setup(templates: &[(&str, &str, &str, &str)]) -> (TempDir, TemplateManager) {
        let dir = TempDir::new().unwrap();
        let mut registry = serde_json::Map::new();
        for (entity_type, variant, file, source) in templates {
            registry
                .entry(entity_type.to_string())
                .or_insert_with(|| json!({}))
                .as_object_mut()
                .unwrap()
                .insert(variant.to_string(), json!(file));
            std::fs::write(dir.path().join(file), source).unwrap();
        }
        std::fs::write(
            dir.path().join("templates.json"),
            serde_json::to_string(&registry).unwrap(),
        )
        .unwrap();
        let manager = TemplateManager::new(dir.path()).unwrap();
        (dir, manager)
    }

    fn ctx(pairs: serde_json::Value) -> AssetContext {
        pairs.as_object().unwrap().clone()
    }

    #[test]
    fn test_folder_tree_with_literal_content() {
        let (_dir, manager) = setup(&[(
            "course",
            "default",
            "course.j2",
            r##"{
                "folder": "{{ numeric_prefix }}_{{ course_name }}",
                "subfolders": [{ "folder": "notes" }],
                "files": [{ "file": "README.md", "template_content": "# {{ name }}\n" }]
            }"##,
        )]);
        let out = TempDir::new().unwrap();
        let images = PlaceholderGenerator;
        let renderer = StructureRenderer::new(&manager, &images);

        let mut context = ctx(json!({"name": "Intro to Lighting", "numeric_prefix": "01"}));
        let outcome = renderer
            .render_and_create("course", "default", &mut context, out.path(), true)
            .unwrap();

        assert_eq!(
            outcome.full_path,
            out.path().join("01_Intro_to_Lighting")
        );
        assert!(outcome.full_path.join("notes").is_dir());
        let readme = std::fs::read_to_string(outcome.full_path.join("README.md")).unwrap();
        assert_eq!(readme, "# Intro to Lighting\n");
    }

    #[test]
    fn test_malformed_render_fails_before_any_mutation() {
        let (_dir, manager) = setup(&[("course", "broken", "broken.j2", "not json at all {{ name }}")]);
        let out = TempDir::new().unwrap();
        let images = PlaceholderGenerator;
        let renderer = StructureRenderer::new(&manager, &images);

        let mut context = ctx(json!({"name": "X"}));
        let err = renderer
            .render_and_create("course", "broken", &mut context, &out.path().join("sub"), false)
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::StructureParse { .. }));
        if let ScaffoldError::StructureParse { snippet, .. } = err {
            assert!(snippet.starts_with("not json"));
        }
        // The parent dir passed in was never created.
        assert!(!out.path().join("sub").exists());
    }

    #[test]
    fn test_sparse_subtree_skipped_sparse_root_fatal() {
        let (_dir, manager) = setup(&[
            (
                "chapter",
                "default",
                "chapter.j2",
                r#"{"folder": "{{ chapter_name }}", "subfolders": [{"comment": "ignored"}, {"folder": "real"}]}"#,
            ),
            ("chapter", "empty", "empty.j2", r#"{"comment": "nothing here"}"#),
        ]);
        let out = TempDir::new().unwrap();
        let images = PlaceholderGenerator;
        let renderer = StructureRenderer::new(&manager, &images);

        let mut context = ctx(json!({"name": "Week 1"}));
        let outcome = renderer
            .render_and_create("chapter", "default", &mut context, out.path(), false)
            .unwrap();
        assert!(outcome.full_path.join("real").is_dir());

        let mut context = ctx(json!({"name": "Week 1"}));
        let err = renderer
            .render_and_create("chapter", "empty", &mut context, out.path(), false)
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidStructure));
    }

    #[test]
    fn test_image_dispatch_and_silent_skip() {
        let (_dir, manager) = setup(&[(
            "course",
            "video",
            "course_video.j2",
            r#"{
                "folder": "{{ course_name }}",
                "files": [{ "file": "logo.png" }, { "file": "poster.jpg" }, { "file": "notes.txt" }]
            }"#,
        )]);
        let out = TempDir::new().unwrap();
        let images = RecordingGenerator::new();
        let renderer = StructureRenderer::new(&manager, &images);

        // logo_public_id present, poster_base_id absent: logo generated,
        // poster silently touched, notes.txt plain touch.
        let mut context = ctx(json!({"name": "My Course", "logo_public_id": "icon/logo"}));
        let outcome = renderer
            .render_and_create("course", "video", &mut context, out.path(), false)
            .unwrap();

        let calls = images.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, FileRole::Logo);
        assert!(outcome.full_path.join("poster.jpg").is_file());
        assert!(outcome.full_path.join("notes.txt").is_file());
    }

    #[test]
    fn test_existing_root_guard() {
        let (_dir, manager) = setup(&[(
            "course",
            "default",
            "course.j2",
            r#"{"folder": "{{ course_name }}"}"#,
        )]);
        let out = TempDir::new().unwrap();
        std::fs::create_dir(out.path().join("My_Course")).unwrap();
        let images = PlaceholderGenerator;
        let renderer = StructureRenderer::new(&manager, &images);

        let mut context = ctx(json!({"name": "My Course"}));
        let err = renderer
            .render_and_create("course", "default", &mut context, out.path(), true)
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(_)));
    }

    #[test]
    fn test_second_stage_expression() {
        // {% raw %} survives the first render; leaf pass resolves it.
        let (_dir, manager) = setup(&[(
            "lesson",
            "default",
            "lesson.j2",
            r#"{ "file": "{% raw %}{{ numeric_prefix }}{% endraw %}_{{ lesson_name }}.md" }"#,
        )]);
        let out = TempDir::new().unwrap();
        let images = PlaceholderGenerator;
        let renderer = StructureRenderer::new(&manager, &images);

        let mut context = ctx(json!({"name": "Overview", "numeric_prefix": "02"}));
        let outcome = renderer
            .render_and_create("lesson", "default", &mut context, out.path(), false)
            .unwrap();
        assert_eq!(
            outcome.full_path.file_name().unwrap().to_str().unwrap(),
            "02_Overview.md"
        );
    }
}
