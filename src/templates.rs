//! Template registry and static template inspection
//!
//! `templates.json` maps `(entity_type, variant)` to a `.j2` file. Nesting
//! policy is discovered from the template source itself (a top-level constant
//! `{% set child_folder_name = "..." %}`), never by executing the template:
//! the template stays the single source of truth for where its children live.

use crate::error::{Result, ScaffoldError};
use minijinja::{path_loader, Environment, UndefinedBehavior};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn child_folder_assign() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{%-?\s*set\s+child_folder_name\s*=\s*(?:"([^"]*)"|'([^']*)')\s*-?%\}"#)
            .expect("valid regex")
    })
}

/// Loads the template registry and renders/inspects individual templates.
#[derive(Debug)]
pub struct TemplateManager {
    templates_dir: PathBuf,
    registry: HashMap<String, HashMap<String, String>>,
    env: Environment<'static>,
}

impl TemplateManager {
    /// Read `templates.json` from `templates_dir` and set up the render
    /// environment. A missing registry file is a configuration error.
    pub fn new(templates_dir: &Path) -> Result<Self> {
        let lookup_file = templates_dir.join("templates.json");
        let raw = std::fs::read_to_string(&lookup_file).map_err(|_| {
            ScaffoldError::Config(format!("missing templates.json at {}", lookup_file.display()))
        })?;
        let registry: HashMap<String, HashMap<String, String>> = serde_json::from_str(&raw)
            .map_err(|e| {
                ScaffoldError::Config(format!("invalid templates.json ({}): {e}", lookup_file.display()))
            })?;

        let mut env = Environment::new();
        env.set_loader(path_loader(templates_dir));
        // Undefined variables render as empty text; partial/test contexts are
        // expected and must not fail the render.
        env.set_undefined_behavior(UndefinedBehavior::Lenient);

        Ok(Self {
            templates_dir: templates_dir.to_path_buf(),
            registry,
            env,
        })
    }

    /// The directory the registry was loaded from.
    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    fn template_file(&self, entity_type: &str, variant: &str) -> Result<&str> {
        self.registry
            .get(entity_type)
            .and_then(|variants| variants.get(variant))
            .map(String::as_str)
            .ok_or_else(|| ScaffoldError::TemplateNotFound {
                entity_type: entity_type.to_string(),
                variant: variant.to_string(),
            })
    }

    /// Resolve `(entity_type, variant)` to an existing template file path.
    /// An unresolvable pair or a missing file is a hard error, never a
    /// silent fallback.
    pub fn get_template_path(&self, entity_type: &str, variant: &str) -> Result<PathBuf> {
        let file = self.template_file(entity_type, variant)?;
        let path = self.templates_dir.join(file);
        if !path.is_file() {
            return Err(ScaffoldError::TemplateFileMissing(path));
        }
        Ok(path)
    }

    /// Discover a constant `child_folder_name` declared at the top level of
    /// the template source, without rendering it.
    pub fn child_folder_name(&self, entity_type: &str, variant: &str) -> Result<Option<String>> {
        let path = self.get_template_path(entity_type, variant)?;
        let source = std::fs::read_to_string(&path)?;
        Ok(child_folder_assign().captures(&source).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
        }))
    }

    /// Whether the template references `var_name` as an undeclared variable.
    /// Static analysis on the compiled template; nothing is rendered.
    pub fn references_variable(
        &self,
        entity_type: &str,
        variant: &str,
        var_name: &str,
    ) -> Result<bool> {
        let file = self.template_file(entity_type, variant)?.to_string();
        if !self.templates_dir.join(&file).is_file() {
            return Ok(false);
        }
        let template = self.env.get_template(&file)?;
        Ok(template.undeclared_variables(true).contains(var_name))
    }

    /// Render the template for `(entity_type, variant)` against `context`.
    pub fn render<S: Serialize>(&self, entity_type: &str, variant: &str, context: S) -> Result<String> {
        // Existence check first so a missing file surfaces as our error type.
        self.get_template_path(entity_type, variant)?;
        let file = self.template_file(entity_type, variant)?;
        let template = self.env.get_template(file)?;
        Ok(template.render(context)?)
    }

    /// Second-stage micro-templating: evaluate `{{ }}` placeholders inside a
    /// leaf expression (folder/file names), leaving plain strings untouched.
    pub fn render_expression<S: Serialize>(&self, expr: &str, context: S) -> Result<String> {
        if expr.contains("{{") && expr.contains("}}") {
            Ok(self.env.render_str(expr, context)?)
        } else {
            Ok(expr.to_string())
        }
    }
}
