//! Messages exchanged between the workflow state machines and the runner.
//!
//! State machines never touch the store or the suggestion service directly:
//! they return [`Effect`]s describing what should happen, and later receive a
//! [`Msg`] carrying the outcome. At most one effect is in flight at a time,
//! so completions can never interleave.

use crate::llm::{Enrichment, ProviderError};
use crate::store::StoreError;
use crate::task::{Task, TaskDelta};

/// Side effects requested by a workflow.
#[derive(Debug)]
pub enum Effect {
    /// Export tasks from the store, optionally filtered.
    LoadTasks { filter: Option<String> },
    /// Ask the suggestion service about one description.
    FetchEnrichment { description: String },
    /// Create a new task.
    CreateTask(Task),
    /// Modify an existing task without touching its description.
    ModifyTask { uuid: String, delta: TaskDelta },
    /// Leave the event loop.
    Quit,
}

/// Completion notifications delivered back to a workflow.
#[derive(Debug)]
pub enum Msg {
    TasksLoaded(Result<Vec<Task>, StoreError>),
    EnrichmentReady(Result<Enrichment, ProviderError>),
    TaskCreated(Result<String, StoreError>),
    TaskModified(Result<(), StoreError>),
}
