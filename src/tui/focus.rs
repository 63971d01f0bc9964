//! The balanced focus view: a read-only screen over the pending task set.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::sync::Arc;

use crate::config::Config;
use crate::focus::{balance, FocusView};
use crate::task::Task;
use crate::tui::add::render_spinner;
use crate::tui::colors;
use crate::tui::event::{Effect, Msg};
use crate::tui::run::Workflow;

const DESCRIPTION_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Loading,
    Display,
    Failed,
}

pub struct FocusApp {
    state: FocusState,
    config: Arc<Config>,
    view: FocusView,
    error: Option<String>,
    frame: usize,
}

impl FocusApp {
    pub fn new(config: Arc<Config>) -> Self {
        FocusApp {
            state: FocusState::Loading,
            config,
            view: FocusView::default(),
            error: None,
            frame: 0,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn view(&self) -> &FocusView {
        &self.view
    }

    fn render_view(&self, frame: &mut Frame) {
        let mut lines = vec![
            Line::from(Span::styled(
                "Focus",
                Style::new().fg(colors::PRIMARY).bold(),
            )),
            Line::raw(""),
        ];

        let heading = if self.view.grouped {
            "Groups:"
        } else {
            "Projects:"
        };
        lines.push(Line::from(Span::styled(
            heading,
            Style::new().fg(colors::SECONDARY),
        )));
        for summary in &self.view.summaries {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(summary.name.clone(), Style::new().fg(colors::PROJECT)),
                Span::styled(
                    format!(": {}/{}", summary.selected, summary.total),
                    Style::new().fg(colors::MUTED),
                ),
            ]));
        }
        lines.push(Line::from(Span::styled(
            format!("Total focus: {} tasks", self.view.entries.len()),
            Style::new().fg(colors::MUTED),
        )));
        lines.push(Line::raw(""));

        let today = Utc::now().date_naive();
        let mut last_group: Option<&str> = None;
        for entry in &self.view.entries {
            // A header per contiguous run; a group reappearing later in the
            // urgency order gets a fresh header.
            if last_group != Some(entry.group.as_str()) {
                lines.push(Line::from(Span::styled(
                    entry.group.clone(),
                    Style::new().fg(colors::PRIMARY).bold(),
                )));
                last_group = Some(entry.group.as_str());
            }
            lines.push(task_line(entry, self.view.grouped, today));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "q quit",
            Style::new().fg(colors::MUTED),
        )));
        frame.render_widget(Paragraph::new(lines), frame.area());
    }
}

impl Workflow for FocusApp {
    fn init(&mut self) -> Vec<Effect> {
        vec![Effect::LoadTasks {
            filter: Some("status:pending".to_string()),
        }]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Effect::Quit];
        }
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => vec![Effect::Quit],
            _ => vec![],
        }
    }

    fn handle_msg(&mut self, msg: Msg) -> Vec<Effect> {
        match msg {
            Msg::TasksLoaded(Ok(tasks)) => {
                self.view = balance(&tasks, &self.config);
                self.state = FocusState::Display;
            }
            Msg::TasksLoaded(Err(e)) => {
                self.error = Some(e.to_string());
                self.state = FocusState::Failed;
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
            FocusState::Loading => render_spinner(frame, self.frame, "Loading pending tasks..."),
            FocusState::Display => self.render_view(frame),
            FocusState::Failed => {
                let msg = format!(
                    "✗ {} (press any key to exit)",
                    self.error.as_deref().unwrap_or("unknown error")
                );
                crate::tui::add::render_banner(frame, colors::ERROR, &msg);
            }
        }
    }

    fn summary(&self) -> Option<String> {
        match self.state {
            FocusState::Failed => self.error.as_ref().map(|e| format!("Error: {e}")),
            _ => None,
        }
    }
}

fn task_line(entry: &crate::focus::FocusEntry, grouped: bool, today: NaiveDate) -> Line<'static> {
    let task = &entry.task;
    let mut spans = vec![
        Span::styled(format!("  {:>4} ", task.id), Style::new().fg(colors::MUTED)),
        Span::styled(
            format!("{:>5.1} ", task.urgency),
            Style::new().fg(colors::URGENCY),
        ),
        priority_span(&task.priority),
    ];
    if task.blocks > 0 {
        spans.push(Span::styled(
            format!("B{} ", task.blocks),
            Style::new().fg(colors::ERROR),
        ));
    }
    if grouped && !task.project.is_empty() {
        spans.push(Span::styled(
            format!("{:<12} ", truncate(&task.project, 12)),
            Style::new().fg(colors::PROJECT),
        ));
    }
    spans.push(Span::raw(truncate(&task.description, DESCRIPTION_WIDTH)));
    // Due wins over scheduled when both are set.
    if let Some(text) = date_suffix(task, today) {
        spans.push(Span::styled(
            format!("  {text}"),
            Style::new().fg(colors::SECONDARY),
        ));
    }
    Line::from(spans)
}

fn priority_span(priority: &str) -> Span<'static> {
    let color = match priority {
        "H" => colors::ERROR,
        "M" => colors::URGENCY,
        "L" => colors::MUTED,
        _ => colors::MUTED,
    };
    let shown = if priority.is_empty() { "-" } else { priority };
    Span::styled(format!("{shown} "), Style::new().fg(color))
}

fn date_suffix(task: &Task, today: NaiveDate) -> Option<String> {
    if !task.due.is_empty() {
        return Some(format!("due:{}", relative_date(&task.due, today)));
    }
    if !task.scheduled.is_empty() {
        return Some(format!("sched:{}", relative_date(&task.scheduled, today)));
    }
    None
}

/// Render a taskwarrior export date relative to today. Unparseable values
/// are shown verbatim.
fn relative_date(raw: &str, today: NaiveDate) -> String {
    let Some(date) = parse_task_date(raw) else {
        return raw.to_string();
    };
    let days = (date - today).num_days();
    match days {
        d if d < 0 => format!("{}d ago", -d),
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d => format!("{d}d"),
    }
}

fn parse_task_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%SZ") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
