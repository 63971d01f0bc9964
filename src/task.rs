//! Task data model matching the taskwarrior `export` JSON shape.
//!
//! Tasks are owned by taskwarrior; this crate only reads them and requests
//! mutations through [`crate::store::TaskStore`]. Optional fields are plain
//! strings where an empty value means "unset", mirroring the export format.

use serde::{Deserialize, Serialize};

/// A single taskwarrior task as returned by `task export`.
///
/// `effort`, `impact`, `est` and `fun` are user-defined attributes (UDAs);
/// `blocks` counts how many other tasks this one is blocking. `urgency` is
/// computed by taskwarrior and treated as read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub id: u64,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    /// H, M, L or empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priority: String,
    /// Hard deadline, taskwarrior date format.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub due: String,
    /// Soft target date.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheduled: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub urgency: f64,
    /// E (easy), N (normal), D (difficult).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub effort: String,
    /// H, M, L.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub impact: String,
    /// Pessimistic time estimate: 15m, 30m, 1h, 2h, 4h, 8h, 2d.
    #[serde(default, rename = "est", skip_serializing_if = "String::is_empty")]
    pub estimate: String,
    /// H (fun), M (neutral), L (boring).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fun: String,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub blocks: u32,
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

/// A requested mutation of an existing task.
///
/// There is deliberately no `description` field: batch enrichment must never
/// overwrite descriptions that originate from an external sync source, so the
/// delta type cannot express that change at all. `project: None` leaves the
/// stored project untouched. Empty strings are skipped when building the
/// `task modify` arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDelta {
    pub project: Option<String>,
    pub priority: String,
    pub due: String,
    pub scheduled: String,
    pub effort: String,
    pub impact: String,
    pub estimate: String,
    pub fun: String,
    pub blocks: u32,
    pub tags: Vec<String>,
}

impl Task {
    /// Whether the task carries any goal ("beacon") tag.
    pub fn has_beacon_tag(&self) -> bool {
        self.tags.iter().any(|t| t.starts_with("b."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_taskwarrior_export_row() {
        let json = r#"{
            "id": 12,
            "uuid": "3f0a2e1c-9f2d-4f0e-8e7b-2b8a41f0c111",
            "description": "Review PR for authentication changes",
            "project": "work",
            "priority": "H",
            "tags": ["b.great.dev", "d.sw.design"],
            "status": "pending",
            "urgency": 9.13,
            "est": "1h",
            "blocks": 2
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 12);
        assert_eq!(task.estimate, "1h");
        assert_eq!(task.blocks, 2);
        assert!(task.has_beacon_tag());
        assert!(task.due.is_empty());
    }

    #[test]
    fn beacon_tag_detection_ignores_other_tags() {
        let task = Task {
            tags: vec!["waste".into(), "d.sw.design".into()],
            ..Task::default()
        };
        assert!(!task.has_beacon_tag());
    }
}
