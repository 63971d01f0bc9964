//! Taskwarrior subprocess client.
//!
//! All task persistence goes through the `task` binary: `export` for reads,
//! `add` for creation and `<uuid> modify` for mutation. The argument builders
//! are plain functions so the exact command lines are unit-testable without
//! spawning anything.

use std::process::Command;

use thiserror::Error;

use crate::task::{Task, TaskDelta};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("failed to parse task export output: {0}")]
    BadExport(#[from] serde_json::Error),
    #[error("could not determine the uuid of the created task")]
    MissingUuid,
}

/// Read/write access to the underlying task store.
///
/// `Send + Sync` so a shared handle can be moved onto worker threads.
pub trait TaskStore: Send + Sync {
    /// Tasks matching a taskwarrior filter expression (empty = all).
    fn export(&self, filter: &str) -> Result<Vec<Task>, StoreError>;
    /// Pending tasks carrying no beacon tag.
    fn untagged_pending(&self) -> Result<Vec<Task>, StoreError>;
    /// Create a task, returning its uuid.
    fn create(&self, task: &Task) -> Result<String, StoreError>;
    /// Apply a delta to an existing task. The delta cannot touch the
    /// description.
    fn modify(&self, uuid: &str, delta: &TaskDelta) -> Result<(), StoreError>;
}

/// [`TaskStore`] implementation shelling out to the `task` binary.
pub struct TaskCli {
    binary: String,
}

impl TaskCli {
    pub fn new() -> Self {
        TaskCli {
            binary: "task".into(),
        }
    }

    fn run(&self, args: &[String]) -> Result<String, StoreError> {
        let command = format!("{} {}", self.binary, args.join(" "));
        tracing::debug!(%command, "running task command");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| StoreError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TaskCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for TaskCli {
    fn export(&self, filter: &str) -> Result<Vec<Task>, StoreError> {
        let mut args: Vec<String> = filter.split_whitespace().map(str::to_string).collect();
        args.push("export".into());
        let stdout = self.run(&args)?;
        let tasks: Vec<Task> = serde_json::from_str(stdout.trim())?;
        Ok(tasks)
    }

    fn untagged_pending(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.export("status:pending")?;
        Ok(tasks.into_iter().filter(|t| !t.has_beacon_tag()).collect())
    }

    fn create(&self, task: &Task) -> Result<String, StoreError> {
        self.run(&add_args(task))?;
        // `task add` prints only a numeric id; export the most recent task to
        // recover its uuid.
        let stdout = self.run(&["+LATEST".into(), "export".into()])?;
        let latest: Vec<Task> = serde_json::from_str(stdout.trim())?;
        latest
            .into_iter()
            .next()
            .map(|t| t.uuid)
            .filter(|u| !u.is_empty())
            .ok_or(StoreError::MissingUuid)
    }

    fn modify(&self, uuid: &str, delta: &TaskDelta) -> Result<(), StoreError> {
        self.run(&modify_args(uuid, delta))?;
        Ok(())
    }
}

/// Arguments for `task add` from a new task. Empty fields are omitted.
pub fn add_args(task: &Task) -> Vec<String> {
    let mut args = vec!["add".to_string(), task.description.clone()];
    push_attr(&mut args, "project", &task.project);
    push_attr(&mut args, "priority", &task.priority);
    push_attr(&mut args, "due", &task.due);
    push_attr(&mut args, "scheduled", &task.scheduled);
    push_attr(&mut args, "effort", &task.effort);
    push_attr(&mut args, "impact", &task.impact);
    push_attr(&mut args, "est", &task.estimate);
    push_attr(&mut args, "fun", &task.fun);
    if task.blocks > 0 {
        args.push(format!("blocks:{}", task.blocks));
    }
    for tag in &task.tags {
        args.push(format!("+{tag}"));
    }
    args
}

/// Arguments for `task <uuid> modify` from a delta.
///
/// The delta has no description field, so a modify can never rewrite the
/// stored description.
pub fn modify_args(uuid: &str, delta: &TaskDelta) -> Vec<String> {
    let mut args = vec![uuid.to_string(), "modify".to_string()];
    if let Some(project) = &delta.project {
        push_attr(&mut args, "project", project);
    }
    push_attr(&mut args, "priority", &delta.priority);
    push_attr(&mut args, "due", &delta.due);
    push_attr(&mut args, "scheduled", &delta.scheduled);
    push_attr(&mut args, "effort", &delta.effort);
    push_attr(&mut args, "impact", &delta.impact);
    push_attr(&mut args, "est", &delta.estimate);
    push_attr(&mut args, "fun", &delta.fun);
    if delta.blocks > 0 {
        args.push(format!("blocks:{}", delta.blocks));
    }
    for tag in &delta.tags {
        args.push(format!("+{tag}"));
    }
    args
}

fn push_attr(args: &mut Vec<String>, name: &str, value: &str) {
    if !value.is_empty() {
        args.push(format!("{name}:{value}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_args_include_all_set_fields() {
        let task = Task {
            description: "Fix login bug".into(),
            project: "work".into(),
            priority: "H".into(),
            estimate: "1h".into(),
            blocks: 2,
            tags: vec!["b.great.dev".into(), "d.sw.design".into()],
            ..Task::default()
        };
        let args = add_args(&task);
        assert_eq!(args[0], "add");
        assert_eq!(args[1], "Fix login bug");
        assert!(args.contains(&"project:work".to_string()));
        assert!(args.contains(&"priority:H".to_string()));
        assert!(args.contains(&"est:1h".to_string()));
        assert!(args.contains(&"blocks:2".to_string()));
        assert!(args.contains(&"+b.great.dev".to_string()));
        assert!(args.contains(&"+d.sw.design".to_string()));
        // Unset fields are omitted entirely.
        assert!(!args.iter().any(|a| a.starts_with("due:")));
        assert!(!args.iter().any(|a| a.starts_with("fun:")));
    }

    #[test]
    fn modify_args_never_carry_a_description() {
        let delta = TaskDelta {
            project: Some("infra".into()),
            priority: "M".into(),
            tags: vec!["b.organized".into(), "waste".into()],
            ..TaskDelta::default()
        };
        let args = modify_args("abc-123", &delta);
        assert_eq!(args[0], "abc-123");
        assert_eq!(args[1], "modify");
        assert!(args.contains(&"project:infra".to_string()));
        assert!(args.contains(&"+waste".to_string()));
        // No bare positional argument after "modify": nothing can change the
        // stored description.
        assert!(args[2..]
            .iter()
            .all(|a| a.contains(':') || a.starts_with('+')));
    }

    #[test]
    fn modify_args_skip_project_when_preserved() {
        let delta = TaskDelta {
            project: None,
            priority: "L".into(),
            ..TaskDelta::default()
        };
        let args = modify_args("abc-123", &delta);
        assert!(!args.iter().any(|a| a.starts_with("project:")));
    }
}
