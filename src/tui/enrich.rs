//! Batch enrichment: walk every untagged pending task through the
//! suggestion service, one at a time.
//!
//! State machine for `tb enrich`. Tasks are processed strictly in store
//! order with one suggestion in flight at a time. Descriptions are never
//! modified; an existing project assignment is never overwritten. Escape
//! ends the whole batch while `s`/`n` skips only the current task, and any
//! store or service failure halts the batch keeping the commits already
//! made.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::llm::Enrichment;
use crate::task::{Task, TaskDelta};
use crate::tui::add::{field_line, form_lines, help_line, render_banner, render_spinner, tag_line};
use crate::tui::colors;
use crate::tui::event::{Effect, Msg};
use crate::tui::form::EnrichForm;
use crate::tui::run::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichState {
    Loading,
    Fetching,
    Preview,
    Editing,
    Committing,
    Done,
    Failed,
}

pub struct EnrichApp {
    state: EnrichState,
    /// Explicit taskwarrior filter; defaults to all untagged pending tasks.
    filter: Option<String>,
    queue: Vec<Task>,
    index: usize,
    staged: Enrichment,
    form: EnrichForm,
    processed: usize,
    skipped: usize,
    error: Option<String>,
    frame: usize,
}

impl EnrichApp {
    pub fn new(filter: Option<String>) -> Self {
        EnrichApp {
            state: EnrichState::Loading,
            filter,
            queue: Vec::new(),
            index: 0,
            staged: Enrichment::default(),
            form: EnrichForm::new(false),
            processed: 0,
            skipped: 0,
            error: None,
            frame: 0,
        }
    }

    pub fn state(&self) -> EnrichState {
        self.state
    }

    fn current(&self) -> Option<&Task> {
        self.queue.get(self.index)
    }

    /// Move to the next queued task, fetching its suggestion, or finish.
    fn advance(&mut self) -> Vec<Effect> {
        self.index += 1;
        match self.current() {
            Some(task) => {
                let description = task.description.clone();
                self.state = EnrichState::Fetching;
                vec![Effect::FetchEnrichment { description }]
            }
            None => {
                self.state = EnrichState::Done;
                vec![]
            }
        }
    }

    /// The delta to apply to the current task. Descriptions are untouched by
    /// construction; the project is only set when the task has none.
    fn build_delta(&self) -> TaskDelta {
        let keep_project = self
            .current()
            .map(|t| !t.project.is_empty())
            .unwrap_or(true);
        let project = if keep_project || self.staged.project.is_empty() {
            None
        } else {
            Some(self.staged.project.clone())
        };
        let mut tags = self.staged.beacons.clone();
        tags.extend(self.staged.directions.iter().cloned());
        if self.staged.is_waste {
            tags.push("waste".to_string());
        }
        TaskDelta {
            project,
            priority: self.staged.priority.clone(),
            due: self.staged.due.clone(),
            scheduled: self.staged.scheduled.clone(),
            effort: self.staged.effort.clone(),
            impact: self.staged.impact.clone(),
            estimate: self.staged.estimate.clone(),
            fun: self.staged.fun.clone(),
            blocks: self.staged.blocks,
            tags,
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('a') => {
                let Some(task) = self.current() else {
                    return vec![];
                };
                let uuid = task.uuid.clone();
                self.state = EnrichState::Committing;
                vec![Effect::ModifyTask {
                    uuid,
                    delta: self.build_delta(),
                }]
            }
            KeyCode::Char('e') => {
                self.form.populate(&self.staged);
                self.state = EnrichState::Editing;
                vec![]
            }
            KeyCode::Char('s') | KeyCode::Char('n') => {
                self.skipped += 1;
                self.advance()
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                self.state = EnrichState::Done;
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => self.state = EnrichState::Preview,
            KeyCode::Tab => self.form.focus_next(),
            KeyCode::BackTab => self.form.focus_prev(),
            KeyCode::Enter => {
                self.form.commit_focused(&mut self.staged);
                if self.form.is_last_focused() {
                    self.state = EnrichState::Preview;
                } else {
                    self.form.focus_next();
                }
            }
            KeyCode::Backspace => self.form.focused_input_mut().handle_backspace(),
            KeyCode::Delete => self.form.focused_input_mut().handle_delete(),
            KeyCode::Left => self.form.focused_input_mut().move_cursor_left(),
            KeyCode::Right => self.form.focused_input_mut().move_cursor_right(),
            KeyCode::Char(c) => self.form.focused_input_mut().handle_char(c),
            _ => {}
        }
        vec![]
    }

    fn progress(&self) -> String {
        format!("Task {}/{}", self.index + 1, self.queue.len())
    }

    fn render_preview(&self, frame: &mut Frame) {
        let Some(task) = self.current() else {
            return;
        };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(self.progress(), Style::new().fg(colors::PRIMARY).bold()),
                Span::raw("  "),
                Span::raw(task.description.clone()),
            ]),
            Line::raw(""),
        ];
        if self.staged.is_waste {
            lines.push(Line::from(Span::styled(
                "⚠ aligned with no beacon (will be tagged +waste)",
                Style::new().fg(colors::ERROR).bold(),
            )));
            lines.push(Line::raw(""));
        }
        lines.push(tag_line("Beacons", &self.staged.beacons, colors::PRIMARY));
        lines.push(tag_line(
            "Directions",
            &self.staged.directions,
            colors::SECONDARY,
        ));
        if task.project.is_empty() {
            lines.push(field_line("Project", &self.staged.project));
        } else {
            lines.push(field_line("Project", &format!("{} (kept)", task.project)));
        }
        lines.push(field_line("Priority", &self.staged.priority));
        lines.push(field_line("Due", &self.staged.due));
        lines.push(field_line("Scheduled", &self.staged.scheduled));
        lines.push(field_line("Effort", &self.staged.effort));
        lines.push(field_line("Impact", &self.staged.impact));
        lines.push(field_line("Estimate", &self.staged.estimate));
        lines.push(field_line("Fun", &self.staged.fun));
        lines.push(field_line("Blocks", &self.staged.blocks.to_string()));
        if !self.staged.reasoning.is_empty() {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                self.staged.reasoning.clone(),
                Style::new().fg(colors::MUTED).italic(),
            )));
        }
        lines.push(Line::raw(""));
        lines.push(help_line(
            "enter/a apply · e edit · s skip task · esc end batch",
        ));
        frame.render_widget(Paragraph::new(lines), frame.area());
    }

    fn render_editing(&self, frame: &mut Frame) {
        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} · edit suggestion", self.progress()),
                Style::new().fg(colors::PRIMARY).bold(),
            )),
            Line::raw(""),
        ];
        lines.extend(form_lines(&self.form));
        lines.push(Line::raw(""));
        lines.push(help_line(
            "enter confirm field · tab/shift-tab move · esc back",
        ));
        frame.render_widget(Paragraph::new(lines), frame.area());
    }
}

impl Workflow for EnrichApp {
    fn init(&mut self) -> Vec<Effect> {
        vec![Effect::LoadTasks {
            filter: self.filter.clone(),
        }]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Effect::Quit];
        }
        match self.state {
            EnrichState::Loading | EnrichState::Fetching | EnrichState::Committing => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => vec![Effect::Quit],
                    _ => vec![],
                }
            }
            EnrichState::Preview => self.handle_preview_key(key),
            EnrichState::Editing => self.handle_editing_key(key),
            EnrichState::Done | EnrichState::Failed => vec![Effect::Quit],
        }
    }

    fn handle_msg(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::TasksLoaded(Ok(tasks)) => {
                if tasks.is_empty() {
                    self.state = EnrichState::Done;
                    return vec![Effect::Quit];
                }
                self.queue = tasks;
                self.index = 0;
                self.state = EnrichState::Fetching;
                vec![Effect::FetchEnrichment {
                    description: self.queue[0].description.clone(),
                }]
            }
            Msg::TasksLoaded(Err(e)) => {
                self.error = Some(e.to_string());
                self.state = EnrichState::Failed;
                vec![]
            }
            Msg::EnrichmentReady(Ok(enrichment)) => {
                self.staged = enrichment;
                self.state = EnrichState::Preview;
                vec![]
            }
            Msg::EnrichmentReady(Err(e)) => {
                self.error = Some(e.to_string());
                self.state = EnrichState::Failed;
                vec![]
            }
            Msg::TaskModified(Ok(())) => {
                self.processed += 1;
                self.advance()
            }
            Msg::TaskModified(Err(e)) => {
                self.error = Some(e.to_string());
                self.state = EnrichState::Failed;
                vec![]
            }
            _ => vec![],
        }
    }

    fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    fn render(&self, frame: &mut Frame) {
        match self.state {
            EnrichState::Loading => render_spinner(frame, self.frame, "Loading untagged tasks..."),
            EnrichState::Fetching => {
                let text = format!("{} · consulting the beacons...", self.progress());
                render_spinner(frame, self.frame, &text);
            }
            EnrichState::Committing => {
                let text = format!("{} · applying...", self.progress());
                render_spinner(frame, self.frame, &text);
            }
            EnrichState::Preview => self.render_preview(frame),
            EnrichState::Editing => self.render_editing(frame),
            EnrichState::Done => render_banner(
                frame,
                colors::SUCCESS,
                "✓ batch finished (press any key to exit)",
            ),
            EnrichState::Failed => {
                let msg = format!(
                    "✗ {} (press any key to exit)",
                    self.error.as_deref().unwrap_or("unknown error")
                );
                render_banner(frame, colors::ERROR, &msg);
            }
        }
    }

    fn summary(&self) -> Option<String> {
        let mut lines = vec![format!(
            "Enriched {} of {} tasks ({} skipped)",
            self.processed,
            self.queue.len(),
            self.skipped
        )];
        if let Some(error) = &self.error {
            lines.push(format!("Stopped early: {error}"));
        }
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderError;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn task(uuid: &str, description: &str, project: &str) -> Task {
        Task {
            uuid: uuid.into(),
            description: description.into(),
            project: project.into(),
            status: "pending".into(),
            ..Task::default()
        }
    }

    fn suggestion(project: &str) -> Enrichment {
        Enrichment {
            beacons: vec!["b.organized".into()],
            project: project.into(),
            priority: "M".into(),
            ..Enrichment::default()
        }
    }

    #[test]
    fn empty_queue_finishes_immediately() {
        let mut app = EnrichApp::new(None);
        let effects = app.handle_msg(Msg::TasksLoaded(Ok(vec![])));
        assert_eq!(app.state(), EnrichState::Done);
        assert!(matches!(effects[0], Effect::Quit));
    }

    #[test]
    fn explicit_filter_is_passed_to_the_store() {
        let mut app = EnrichApp::new(Some("project:work".into()));
        let effects = app.init();
        assert!(
            matches!(&effects[0], Effect::LoadTasks { filter: Some(f) } if f == "project:work")
        );
    }

    #[test]
    fn project_is_only_set_when_the_task_has_none() {
        let mut app = EnrichApp::new(None);
        let effects = app.handle_msg(Msg::TasksLoaded(Ok(vec![
            task("u1", "set up backups", ""),
            task("u2", "rotate credentials", "ops"),
        ])));
        assert!(matches!(&effects[0], Effect::FetchEnrichment { description } if description == "set up backups"));

        // First task has no project: the suggestion assigns one.
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("infra"))));
        let effects = app.handle_key(key(KeyCode::Enter));
        let Effect::ModifyTask { uuid, delta } = &effects[0] else {
            panic!("expected ModifyTask");
        };
        assert_eq!(uuid, "u1");
        assert_eq!(delta.project.as_deref(), Some("infra"));
        assert_eq!(delta.tags, vec!["b.organized"]);

        // Second task already has a project: the suggestion cannot move it.
        let effects = app.handle_msg(Msg::TaskModified(Ok(())));
        assert!(matches!(&effects[0], Effect::FetchEnrichment { description } if description == "rotate credentials"));
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("infra"))));
        let effects = app.handle_key(key(KeyCode::Enter));
        let Effect::ModifyTask { uuid, delta } = &effects[0] else {
            panic!("expected ModifyTask");
        };
        assert_eq!(uuid, "u2");
        assert_eq!(delta.project, None);
    }

    #[test]
    fn skip_advances_without_modifying() {
        let mut app = EnrichApp::new(None);
        app.handle_msg(Msg::TasksLoaded(Ok(vec![
            task("u1", "one", ""),
            task("u2", "two", ""),
        ])));
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("x"))));
        let effects = app.handle_key(key(KeyCode::Char('s')));
        assert!(matches!(&effects[0], Effect::FetchEnrichment { description } if description == "two"));
        assert_eq!(app.state(), EnrichState::Fetching);

        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("x"))));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.state(), EnrichState::Done);
        assert_eq!(app.summary().unwrap(), "Enriched 0 of 2 tasks (2 skipped)");
    }

    #[test]
    fn escape_ends_the_batch_keeping_prior_commits() {
        let mut app = EnrichApp::new(None);
        app.handle_msg(Msg::TasksLoaded(Ok(vec![
            task("u1", "one", ""),
            task("u2", "two", ""),
        ])));
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("x"))));
        app.handle_key(key(KeyCode::Enter));
        app.handle_msg(Msg::TaskModified(Ok(())));
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("x"))));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state(), EnrichState::Done);
        assert_eq!(app.summary().unwrap(), "Enriched 1 of 2 tasks (0 skipped)");
    }

    #[test]
    fn service_failure_halts_the_batch() {
        let mut app = EnrichApp::new(None);
        app.handle_msg(Msg::TasksLoaded(Ok(vec![
            task("u1", "one", ""),
            task("u2", "two", ""),
        ])));
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion("x"))));
        app.handle_key(key(KeyCode::Enter));
        app.handle_msg(Msg::TaskModified(Ok(())));
        let effects = app.handle_msg(Msg::EnrichmentReady(Err(ProviderError::EmptyResponse)));
        assert!(effects.is_empty());
        assert_eq!(app.state(), EnrichState::Failed);
        let summary = app.summary().unwrap();
        assert!(summary.contains("Enriched 1 of 2"));
        assert!(summary.contains("Stopped early"));
    }

    #[test]
    fn processing_follows_store_order() {
        let mut app = EnrichApp::new(None);
        let effects = app.handle_msg(Msg::TasksLoaded(Ok(vec![
            task("u1", "alpha", ""),
            task("u2", "beta", ""),
            task("u3", "gamma", ""),
        ])));
        assert!(matches!(&effects[0], Effect::FetchEnrichment { description } if description == "alpha"));
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion(""))));
        app.handle_key(key(KeyCode::Enter));
        let effects = app.handle_msg(Msg::TaskModified(Ok(())));
        assert!(matches!(&effects[0], Effect::FetchEnrichment { description } if description == "beta"));
    }
}
