use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the structure generator.
///
/// Constructed once at process start and threaded through by reference; no
/// module-level mutable defaults. Every field can be overridden per-call in
/// tests by building the struct directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Template registry settings
    pub templates: TemplatesConfig,

    /// Root folders for the text and video hierarchies
    pub folders: FoldersConfig,

    /// Payload-level defaults (template variant, asset ids)
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding templates.json and the .j2 files
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldersConfig {
    /// Root for the text hierarchy; Documents when unset
    pub course_root: Option<String>,

    /// Root for the video hierarchy; ~/Videos/courses when unset
    pub video_root: Option<String>,

    /// Nest the video tree inside the text course folder
    pub video_in_course_folder: bool,

    /// File extension for video-mode lesson files
    pub video_extension: String,

    /// File extension for text-mode lesson files
    pub lesson_extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Template variant used when a node declares none
    pub template: String,

    /// Default cover-art asset ids, overridable per course
    pub logo_public_id: String,
    pub fanart_public_id: String,
    pub poster_base_id: String,
    pub thumb_base_id: String,

    /// Default instructor/institute lines for generated artwork
    pub instructor: String,
    pub institute: String,

    /// Year stamped into generated contexts
    pub year: i32,
}

impl Config {
    /// Load configuration from file, falling back to env overrides on defaults.
    pub fn load() -> anyhow::Result<Self> {
        let config_paths = [
            "course-scaffolder.toml",
            "config/course-scaffolder.toml",
            "~/.config/course-scaffolder/config.toml",
        ];

        for path in &config_paths {
            let candidate = crate::paths::expand_user(path);
            if let Ok(config_str) = std::fs::read_to_string(&candidate) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", candidate.display());
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        Ok(Self::default().with_env_overrides())
    }

    /// Apply environment-variable overrides onto this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("SCAFFOLD_TEMPLATES_PATH") {
            self.templates.dir = crate::paths::expand_user(&crate::paths::expand_env_vars(&dir));
        }
        if let Ok(root) = std::env::var("COURSE_FOLDER_PATH") {
            self.folders.course_root = Some(root);
        }
        if let Ok(root) = std::env::var("VIDEO_COURSE_FOLDER_PATH") {
            self.folders.video_root = Some(root);
        }
        if let Ok(flag) = std::env::var("VIDEO_IN_COURSE_FOLDER") {
            self.folders.video_in_course_folder = flag == "1";
        }
        if let Ok(ext) = std::env::var("VIDEO_EXTENSION") {
            self.folders.video_extension = ext.trim_start_matches('.').to_string();
        }
        self
    }

    /// Save configuration to file.
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates: TemplatesConfig {
                dir: PathBuf::from("templates"),
            },
            folders: FoldersConfig {
                course_root: None,
                video_root: None,
                video_in_course_folder: false,
                video_extension: "mkv".to_string(),
                lesson_extension: "md".to_string(),
            },
            defaults: DefaultsConfig {
                template: "default".to_string(),
                logo_public_id: "icon/course_logo".to_string(),
                fanart_public_id: "banner/fanart".to_string(),
                poster_base_id: "poster/base_image".to_string(),
                thumb_base_id: "thumb/base_image".to_string(),
                instructor: "Unknown Instructor".to_string(),
                institute: "Independent".to_string(),
                year: chrono::Utc::now().year(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.template, "default");
        assert_eq!(config.folders.video_extension, "mkv");
        assert_eq!(config.folders.lesson_extension, "md");
        assert!(!config.folders.video_in_course_folder);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.defaults.template, config.defaults.template);
        assert_eq!(back.templates.dir, config.templates.dir);
    }
}
