//! Orchestration: payload in, folders on disk and rows in the record store out

use crate::assets::ImageGenerator;
use crate::config::Config;
use crate::error::{Result, ScaffoldError};
use crate::hierarchy::{HierarchyWalker, WalkOptions};
use crate::model::{ChapterNode, CourseNode, LessonNode, Payload};
use crate::records::{RecordFields, RecordHandle, RecordStore};
use crate::templates::TemplateManager;
use serde_json::Value;

/// Drives the full pipeline for a payload: duplicate check against the
/// record store, hierarchy creation, then record insertion with the
/// symbolic paths the walker produced.
pub struct CourseManager<'a> {
    config: &'a Config,
    templates: &'a TemplateManager,
    images: &'a dyn ImageGenerator,
    store: &'a dyn RecordStore,
}

impl<'a> CourseManager<'a> {
    pub fn new(
        config: &'a Config,
        templates: &'a TemplateManager,
        images: &'a dyn ImageGenerator,
        store: &'a dyn RecordStore,
    ) -> Self {
        Self {
            config,
            templates,
            images,
            store,
        }
    }

    /// Process every course in the payload. The payload is enriched in
    /// place with the resolved paths, ready to be written back out.
    pub fn process(&self, payload: &mut Payload, options: &WalkOptions) -> Result<()> {
        let walker = HierarchyWalker::new(self.config, self.templates, self.images);
        for course in &mut payload.courses {
            if self.store.exists(&course.name)? {
                return Err(ScaffoldError::Records(format!(
                    "course '{}' already recorded",
                    course.name
                )));
            }

            walker.scaffold_course(course, options)?;

            if options.create_folders {
                self.record_course(course)?;
            }
            tracing::info!("✅ Course '{}' processed", course.name);
        }
        Ok(())
    }

    fn record_course(&self, course: &CourseNode) -> Result<()> {
        let handle = self.store.insert(None, &course_fields(course))?;
        for chapter in &course.chapters {
            self.record_chapter(chapter, &handle)?;
        }
        Ok(())
    }

    fn record_chapter(&self, chapter: &ChapterNode, course_handle: &RecordHandle) -> Result<()> {
        let handle = self.store.insert(Some(course_handle), &chapter_fields(chapter))?;
        for lesson in &chapter.lessons {
            self.store.insert(Some(&handle), &lesson_fields(lesson))?;
        }
        Ok(())
    }
}

fn base_fields(name: &str, path: Option<&str>, video_path: Option<&str>) -> RecordFields {
    let mut fields = RecordFields::new();
    fields.insert("name".into(), Value::from(name));
    fields.insert("path".into(), Value::from(path.unwrap_or_default()));
    // Tabular consumers expect the column to always be present.
    fields.insert("video_path".into(), Value::from(video_path.unwrap_or("NA")));
    fields
}

fn course_fields(course: &CourseNode) -> RecordFields {
    let mut fields = base_fields(
        &course.name,
        course.path.as_deref(),
        course.video_path.as_deref(),
    );
    fields.insert("kind".into(), Value::from("course"));
    if let Some(description) = &course.description {
        fields.insert("description".into(), Value::from(description.clone()));
    }
    if let Some(instructor) = &course.instructor {
        fields.insert("instructor".into(), Value::from(instructor.clone()));
    }
    fields
}

fn chapter_fields(chapter: &ChapterNode) -> RecordFields {
    let mut fields = base_fields(
        &chapter.name,
        chapter.path.as_deref(),
        chapter.video_path.as_deref(),
    );
    fields.insert("kind".into(), Value::from("chapter"));
    fields
}

fn lesson_fields(lesson: &LessonNode) -> RecordFields {
    let mut fields = base_fields(
        &lesson.name,
        lesson.path.as_deref(),
        lesson.video_path.as_deref(),
    );
    fields.insert("kind".into(), Value::from("lesson"));
    fields
}
