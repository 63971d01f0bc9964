//! Interactive task creation: describe, review the suggestion, commit.
//!
//! State machine for `tb add`. The flow fetches one suggestion for the given
//! description, previews it for acceptance or editing, and creates exactly
//! one task (or none, when the user backs out).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::llm::Enrichment;
use crate::task::Task;
use crate::tui::colors;
use crate::tui::event::{Effect, Msg};
use crate::tui::form::EnrichForm;
use crate::tui::run::{Workflow, SPINNER_FRAMES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddState {
    Loading,
    Preview,
    Editing,
    Committing,
    Done,
    Failed,
}

pub struct AddApp {
    state: AddState,
    /// The description as typed on the command line.
    original: String,
    staged: Enrichment,
    form: EnrichForm,
    /// Set when the user chose to commit without the suggestion.
    skipped: bool,
    created_uuid: Option<String>,
    error: Option<String>,
    frame: usize,
}

impl AddApp {
    pub fn new(description: String) -> Self {
        AddApp {
            state: AddState::Loading,
            original: description,
            staged: Enrichment::default(),
            form: EnrichForm::new(true),
            skipped: false,
            created_uuid: None,
            error: None,
            frame: 0,
        }
    }

    pub fn state(&self) -> AddState {
        self.state
    }

    /// The task to create from the staged suggestion.
    fn build_task(&self) -> Task {
        let description = if self.staged.description.is_empty() {
            self.original.clone()
        } else {
            self.staged.description.clone()
        };
        let mut tags = self.staged.beacons.clone();
        tags.extend(self.staged.directions.iter().cloned());
        if self.staged.is_waste {
            tags.push("waste".to_string());
        }
        Task {
            description,
            project: self.staged.project.clone(),
            priority: self.staged.priority.clone(),
            due: self.staged.due.clone(),
            scheduled: self.staged.scheduled.clone(),
            effort: self.staged.effort.clone(),
            impact: self.staged.impact.clone(),
            estimate: self.staged.estimate.clone(),
            fun: self.staged.fun.clone(),
            blocks: self.staged.blocks,
            tags,
            ..Task::default()
        }
    }

    /// The task to create when the suggestion is skipped: description only.
    fn bare_task(&self) -> Task {
        Task {
            description: self.original.clone(),
            ..Task::default()
        }
    }

    fn handle_preview_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('a') => {
                self.state = AddState::Committing;
                vec![Effect::CreateTask(self.build_task())]
            }
            KeyCode::Char('e') => {
                self.form.populate(&self.staged);
                self.state = AddState::Editing;
                vec![]
            }
            KeyCode::Char('s') => {
                self.skipped = true;
                self.state = AddState::Committing;
                vec![Effect::CreateTask(self.bare_task())]
            }
            KeyCode::Esc | KeyCode::Char('q') => vec![Effect::Quit],
            _ => vec![],
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Esc => {
                // Unconfirmed keystrokes are dropped; the staged suggestion
                // was only ever updated on enter.
                self.state = AddState::Preview;
            }
            KeyCode::Tab => self.form.focus_next(),
            KeyCode::BackTab => self.form.focus_prev(),
            KeyCode::Enter => {
                self.form.commit_focused(&mut self.staged);
                if self.form.is_last_focused() {
                    self.state = AddState::Preview;
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

    fn render_preview(&self, frame: &mut Frame) {
        let mut lines = vec![
            Line::from(Span::styled(
                "Suggested task",
                Style::new().fg(colors::PRIMARY).bold(),
            )),
            Line::raw(""),
        ];
        if self.staged.is_waste {
            lines.push(Line::from(Span::styled(
                "⚠ aligned with no beacon (will be tagged +waste)",
                Style::new().fg(colors::ERROR).bold(),
            )));
            lines.push(Line::raw(""));
        }
        let description = if self.staged.description.is_empty() {
            &self.original
        } else {
            &self.staged.description
        };
        lines.push(field_line("Description", description));
        lines.push(tag_line("Beacons", &self.staged.beacons, colors::PRIMARY));
        lines.push(tag_line(
            "Directions",
            &self.staged.directions,
            colors::SECONDARY,
        ));
        lines.push(field_line("Project", &self.staged.project));
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
            "enter/a accept · e edit · s skip suggestion · esc cancel",
        ));
        frame.render_widget(Paragraph::new(lines), frame.area());
    }

    fn render_editing(&self, frame: &mut Frame) {
        let mut lines = vec![
            Line::from(Span::styled(
                "Edit suggestion",
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

impl Workflow for AddApp {
    fn init(&mut self) -> Vec<Effect> {
        vec![Effect::FetchEnrichment {
            description: self.original.clone(),
        }]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Effect::Quit];
        }
        match self.state {
            AddState::Loading | AddState::Committing => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => vec![Effect::Quit],
                _ => vec![],
            },
            AddState::Preview => self.handle_preview_key(key),
            AddState::Editing => self.handle_editing_key(key),
            AddState::Done | AddState::Failed => vec![Effect::Quit],
        }
    }

    fn handle_msg(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::EnrichmentReady(Ok(enrichment)) => {
                self.staged = enrichment;
                self.state = AddState::Preview;
            }
            Msg::EnrichmentReady(Err(e)) => {
                self.error = Some(e.to_string());
                self.state = AddState::Failed;
            }
            Msg::TaskCreated(Ok(uuid)) => {
                self.created_uuid = Some(uuid);
                self.state = AddState::Done;
            }
            Msg::TaskCreated(Err(e)) => {
                self.error = Some(e.to_string());
                self.state = AddState::Failed;
            }
            _ => {}
        }
        vec![]
    }

    fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    fn render(&self, frame: &mut Frame) {
        match self.state {
            AddState::Loading => render_spinner(frame, self.frame, "Consulting the beacons..."),
            AddState::Committing => render_spinner(frame, self.frame, "Creating task..."),
            AddState::Preview => self.render_preview(frame),
            AddState::Editing => self.render_editing(frame),
            AddState::Done => render_banner(
                frame,
                colors::SUCCESS,
                "✓ task created (press any key to exit)",
            ),
            AddState::Failed => {
                let msg = format!(
                    "✗ {} (press any key to exit)",
                    self.error.as_deref().unwrap_or("unknown error")
                );
                render_banner(frame, colors::ERROR, &msg);
            }
        }
    }

    fn summary(&self) -> Option<String> {
        match self.state {
            AddState::Done => {
                let uuid = self.created_uuid.as_deref().unwrap_or("?");
                if self.skipped {
                    Some(format!("Created task {uuid} (suggestion skipped)"))
                } else {
                    Some(format!("Created task {uuid}"))
                }
            }
            AddState::Failed => self.error.as_ref().map(|e| format!("Error: {e}")),
            _ => None,
        }
    }
}

// Render helpers shared by the add and enrich screens.

pub(crate) fn field_line<'a>(label: &'a str, value: &str) -> Line<'a> {
    let shown = if value.is_empty() {
        Span::styled("-", Style::new().fg(colors::MUTED))
    } else {
        Span::raw(value.to_string())
    };
    Line::from(vec![
        Span::styled(
            format!("{label:>12}: "),
            Style::new().fg(colors::SECONDARY),
        ),
        shown,
    ])
}

pub(crate) fn tag_line<'a>(
    label: &'a str,
    tags: &[String],
    color: ratatui::style::Color,
) -> Line<'a> {
    if tags.is_empty() {
        return field_line(label, "");
    }
    Line::from(vec![
        Span::styled(
            format!("{label:>12}: "),
            Style::new().fg(colors::SECONDARY),
        ),
        Span::styled(tags.join(" "), Style::new().fg(color)),
    ])
}

pub(crate) fn form_lines<'a>(form: &'a EnrichForm) -> Vec<Line<'a>> {
    form.fields()
        .map(|(label, input)| {
            let marker = if input.focused { "▸ " } else { "  " };
            let value_style = if input.focused {
                Style::new().fg(colors::PRIMARY)
            } else {
                Style::new()
            };
            Line::from(vec![
                Span::styled(marker, Style::new().fg(colors::PRIMARY)),
                Span::styled(
                    format!("{label:>12}: "),
                    Style::new().fg(colors::SECONDARY),
                ),
                Span::styled(input.value.clone(), value_style),
            ])
        })
        .collect()
}

pub(crate) fn help_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::new().fg(colors::MUTED),
    ))
}

pub(crate) fn render_spinner(frame: &mut Frame, tick: usize, text: &str) {
    let spinner = SPINNER_FRAMES[tick % SPINNER_FRAMES.len()];
    let line = Line::from(vec![
        Span::styled(spinner, Style::new().fg(colors::PRIMARY)),
        Span::raw(" "),
        Span::raw(text.to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), centered_line(frame.area()));
}

pub(crate) fn render_banner(frame: &mut Frame, color: ratatui::style::Color, text: &str) {
    let line = Line::from(Span::styled(text.to_string(), Style::new().fg(color).bold()));
    frame.render_widget(Paragraph::new(line), centered_line(frame.area()));
}

fn centered_line(area: Rect) -> Rect {
    Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 1.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn suggestion() -> Enrichment {
        Enrichment {
            description: "Fix login redirect loop".into(),
            beacons: vec!["b.great.dev".into()],
            directions: vec!["d.sw.design".into()],
            project: "work".into(),
            priority: "H".into(),
            estimate: "2h".into(),
            ..Enrichment::default()
        }
    }

    #[test]
    fn accept_creates_the_enriched_task() {
        let mut app = AddApp::new("fix login".into());
        let effects = app.init();
        assert!(matches!(&effects[0], Effect::FetchEnrichment { description } if description == "fix login"));

        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion())));
        assert_eq!(app.state(), AddState::Preview);

        let effects = app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state(), AddState::Committing);
        let Effect::CreateTask(task) = &effects[0] else {
            panic!("expected CreateTask");
        };
        assert_eq!(task.description, "Fix login redirect loop");
        assert_eq!(task.project, "work");
        assert_eq!(task.priority, "H");
        assert_eq!(task.tags, vec!["b.great.dev", "d.sw.design"]);
        assert!(!task.tags.contains(&"waste".to_string()));
    }

    #[test]
    fn waste_suggestion_adds_the_waste_tag() {
        let mut app = AddApp::new("doomscroll".into());
        app.handle_msg(Msg::EnrichmentReady(Ok(Enrichment {
            is_waste: true,
            ..suggestion()
        })));
        let effects = app.handle_key(key(KeyCode::Char('a')));
        let Effect::CreateTask(task) = &effects[0] else {
            panic!("expected CreateTask");
        };
        assert!(task.tags.contains(&"waste".to_string()));
    }

    #[test]
    fn skip_commits_only_the_original_description() {
        let mut app = AddApp::new("water the plants".into());
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion())));
        let effects = app.handle_key(key(KeyCode::Char('s')));
        let Effect::CreateTask(task) = &effects[0] else {
            panic!("expected CreateTask");
        };
        assert_eq!(task.description, "water the plants");
        assert!(task.project.is_empty());
        assert!(task.tags.is_empty());
    }

    #[test]
    fn edited_field_lands_in_the_created_task() {
        let mut app = AddApp::new("fix login".into());
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion())));
        app.handle_key(key(KeyCode::Char('e')));
        assert_eq!(app.state(), AddState::Editing);

        // First field is the description; retype it and confirm.
        for _ in 0.."Fix login redirect loop".len() {
            app.handle_key(key(KeyCode::Backspace));
        }
        for c in "Fix login".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state(), AddState::Preview);

        let effects = app.handle_key(key(KeyCode::Enter));
        let Effect::CreateTask(task) = &effects[0] else {
            panic!("expected CreateTask");
        };
        assert_eq!(task.description, "Fix login");
        // Unedited fields survive.
        assert_eq!(task.priority, "H");
    }

    #[test]
    fn escape_in_editing_discards_unconfirmed_keystrokes() {
        let mut app = AddApp::new("fix login".into());
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion())));
        app.handle_key(key(KeyCode::Char('e')));
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Esc));
        let effects = app.handle_key(key(KeyCode::Enter));
        let Effect::CreateTask(task) = &effects[0] else {
            panic!("expected CreateTask");
        };
        assert_eq!(task.description, "Fix login redirect loop");
    }

    #[test]
    fn fetch_failure_reaches_the_error_screen_then_quits() {
        let mut app = AddApp::new("fix login".into());
        app.handle_msg(Msg::EnrichmentReady(Err(
            crate::llm::ProviderError::EmptyResponse,
        )));
        assert_eq!(app.state(), AddState::Failed);
        assert!(app.summary().unwrap().contains("empty response"));
        let effects = app.handle_key(key(KeyCode::Char('x')));
        assert!(matches!(effects[0], Effect::Quit));
    }

    #[test]
    fn escape_in_preview_creates_nothing() {
        let mut app = AddApp::new("fix login".into());
        app.handle_msg(Msg::EnrichmentReady(Ok(suggestion())));
        let effects = app.handle_key(key(KeyCode::Esc));
        assert!(matches!(effects[0], Effect::Quit));
        assert!(app.summary().is_none());
    }
}
