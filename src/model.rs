//! Payload data model: Course → Chapter → Lesson nodes
//!
//! Nodes are constructed transiently from input JSON, enriched with resolved
//! paths by the hierarchy walker, and discarded after the run; the remote
//! record store is the system of record beyond that.
//!
//! `video_path` is an `Option` internally. The `"NA"` sentinel required by
//! downstream tabular consumers is applied (and stripped) only at the serde
//! boundary, never inside the core.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable per-node identity assigned at payload ingestion. Path maps from
/// the text and video walks are keyed by it and merged by the caller.
pub type NodeId = u32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub courses: Vec<CourseNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseNode {
    #[serde(skip)]
    pub node_id: NodeId,

    pub name: String,

    /// Symbolic, possibly `$VAR`-bearing location; absent until resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Parallel video-hierarchy path; serialized as the literal `"NA"` when
    /// video mode was not requested for this node.
    #[serde(default, serialize_with = "ser_na", deserialize_with = "de_na")]
    pub video_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_subfolder: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_folder_name: Option<String>,

    // Asset/image generation context, propagated into video contexts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fanart_public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_base_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default)]
    pub chapters: Vec<ChapterNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterNode {
    #[serde(skip)]
    pub node_id: NodeId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, serialize_with = "ser_na", deserialize_with = "de_na")]
    pub video_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_subfolder: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_folder_name: Option<String>,

    #[serde(default)]
    pub lessons: Vec<LessonNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonNode {
    #[serde(skip)]
    pub node_id: NodeId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, serialize_with = "ser_na", deserialize_with = "de_na")]
    pub video_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_subfolder: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_folder_name: Option<String>,

    /// File extension for the text-mode lesson file (default from config).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

impl Payload {
    /// Parse a payload from JSON text and assign node ids.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut payload: Payload = serde_json::from_str(raw)?;
        payload.assign_ids();
        Ok(payload)
    }

    /// Assign sequential ids to every node, depth-first. Must run before the
    /// walker so text and video path maps agree on node identity.
    pub fn assign_ids(&mut self) {
        let mut next: NodeId = 0;
        for course in &mut self.courses {
            course.node_id = bump(&mut next);
            for chapter in &mut course.chapters {
                chapter.node_id = bump(&mut next);
                for lesson in &mut chapter.lessons {
                    lesson.node_id = bump(&mut next);
                }
            }
        }
    }
}

fn bump(next: &mut NodeId) -> NodeId {
    let id = *next;
    *next += 1;
    id
}

fn ser_na<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(path) => serializer.serialize_str(path),
        None => serializer.serialize_str("NA"),
    }
}

fn de_na<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| s != "NA"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_ids_depth_first() {
        let mut payload = Payload::from_json(
            r#"{"courses": [{"name": "A", "chapters": [
                {"name": "C1", "lessons": [{"name": "L1"}, {"name": "L2"}]},
                {"name": "C2"}
            ]}]}"#,
        )
        .unwrap();
        payload.assign_ids();

        let course = &payload.courses[0];
        assert_eq!(course.node_id, 0);
        assert_eq!(course.chapters[0].node_id, 1);
        assert_eq!(course.chapters[0].lessons[0].node_id, 2);
        assert_eq!(course.chapters[0].lessons[1].node_id, 3);
        assert_eq!(course.chapters[1].node_id, 4);
    }

    #[test]
    fn test_video_path_na_boundary() {
        let payload = Payload::from_json(r#"{"courses": [{"name": "A"}]}"#).unwrap();
        let out = serde_json::to_value(&payload).unwrap();
        assert_eq!(out["courses"][0]["video_path"], "NA");

        let parsed = Payload::from_json(r#"{"courses": [{"name": "A", "video_path": "NA"}]}"#).unwrap();
        assert_eq!(parsed.courses[0].video_path, None);

        let parsed =
            Payload::from_json(r#"{"courses": [{"name": "A", "video_path": "$DATALIB/v"}]}"#).unwrap();
        assert_eq!(parsed.courses[0].video_path.as_deref(), Some("$DATALIB/v"));
    }

    #[test]
    fn test_defaults_absent_fields() {
        let payload = Payload::from_json(r#"{"courses": [{"name": "A"}]}"#).unwrap();
        let course = &payload.courses[0];
        assert!(course.template.is_none());
        assert!(course.enable_subfolder.is_none());
        assert!(course.chapters.is_empty());
    }
}
