//! The focus balancer: a pure computation turning the pending task set into
//! a quota-capped, urgency-ordered work queue.
//!
//! Tasks are partitioned into groups — either by focus-group pattern rules
//! or, when none are configured, by project name — then each group is capped
//! at its quota (highest urgency first) and the survivors are merged into one
//! globally urgency-sorted list. Holds no state; safe to call on any task
//! snapshot.

use std::collections::BTreeMap;

use crate::config::{Config, FocusGroup};
use crate::task::Task;

/// Placeholder group for tasks without a project when no focus groups are
/// configured.
pub const NO_PROJECT: &str = "(no project)";

/// One task selected into the focus view, with its resolved group.
#[derive(Debug, Clone)]
pub struct FocusEntry {
    pub group: String,
    pub task: Task,
}

/// Per-group selected/total counts for the summary header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub name: String,
    pub selected: usize,
    pub total: usize,
}

/// The balanced view: summaries in group-name order, entries in global
/// urgency order.
#[derive(Debug, Clone, Default)]
pub struct FocusView {
    pub summaries: Vec<GroupSummary>,
    pub entries: Vec<FocusEntry>,
    /// Whether focus-group rules (rather than raw projects) were used.
    pub grouped: bool,
}

/// Match a focus-group glob against a project name.
///
/// Only three forms are interpreted: `*` matches everything, a trailing `*`
/// matches by prefix, anything else matches exactly.
pub fn match_pattern(pattern: &str, project: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return project.starts_with(prefix);
    }
    pattern == project
}

/// Resolve the focus group for a project, rule by rule in configured order.
///
/// Within a rule the exclusion patterns (prefixed `!`) are tested first: any
/// exclusion match skips the whole rule, even when an inclusion pattern in
/// the same rule would match. Otherwise the first matching inclusion pattern
/// assigns the group. Returns `None` when no rule matches.
pub fn resolve_group(groups: &[FocusGroup], project: &str) -> Option<String> {
    for group in groups {
        let excluded = group
            .patterns
            .iter()
            .filter_map(|p| p.strip_prefix('!'))
            .any(|p| match_pattern(p, project));
        if excluded {
            continue;
        }
        let included = group
            .patterns
            .iter()
            .filter(|p| !p.starts_with('!'))
            .any(|p| match_pattern(p, project));
        if included {
            return Some(group.name.clone());
        }
    }
    None
}

/// Build the balanced focus view from a snapshot of pending tasks.
pub fn balance(tasks: &[Task], cfg: &Config) -> FocusView {
    let grouped = !cfg.focus_groups.is_empty();

    // Partition. With focus groups active, unmatched tasks are dropped
    // entirely; without them every task lands in its project's own group.
    let mut groups: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        let name = if grouped {
            match resolve_group(&cfg.focus_groups, &task.project) {
                Some(name) => name,
                None => continue,
            }
        } else if task.project.is_empty() {
            NO_PROJECT.to_string()
        } else {
            task.project.clone()
        };
        groups.entry(name).or_default().push(task.clone());
    }

    let mut summaries = Vec::new();
    let mut selected: Vec<FocusEntry> = Vec::new();

    for (name, mut members) in groups {
        // Stable sort keeps store order for equal urgencies.
        members.sort_by(|a, b| {
            b.urgency
                .partial_cmp(&a.urgency)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let quota = if grouped {
            cfg.focus_group_quota(&name)
        } else {
            cfg.project_quota(&name)
        };
        let take = members.len().min(quota);
        summaries.push(GroupSummary {
            name: name.clone(),
            selected: take,
            total: members.len(),
        });
        selected.extend(members.into_iter().take(take).map(|task| FocusEntry {
            group: name.clone(),
            task,
        }));
    }

    // Final display order interleaves groups by urgency; a group may appear
    // more than once in the rendered run-length headers, which is accepted.
    selected.sort_by(|a, b| {
        b.task
            .urgency
            .partial_cmp(&a.task.urgency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    FocusView {
        summaries,
        entries: selected,
        grouped,
    }
}
