//! Terminal setup and the shared workflow event loop.
//!
//! The runner owns the terminal, the input poll and the completion channel;
//! workflows own all state. Effects run on short-lived worker threads that
//! report back through an mpsc channel, so the draw loop never blocks on the
//! store or the suggestion service.

use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Frame, Terminal};

use crate::config::Config;
use crate::llm::{Provider, ProviderError};
use crate::store::TaskStore;
use crate::tui::event::{Effect, Msg};

/// Shared handles a workflow's effects run against.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<Config>,
    pub store: Arc<dyn TaskStore>,
    pub provider: Option<Arc<dyn Provider>>,
}

/// A full-screen interactive workflow driven by the shared event loop.
pub trait Workflow {
    /// Effects to run before the first frame.
    fn init(&mut self) -> Vec<Effect>;
    /// React to a key press.
    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect>;
    /// React to a completed effect.
    fn handle_msg(&mut self, msg: Msg) -> Vec<Effect>;
    /// Advance animations. Called once per poll interval.
    fn tick(&mut self);
    fn render(&self, frame: &mut Frame);
    /// Text printed to stdout after the terminal is restored.
    fn summary(&self) -> Option<String>;
}

/// Initialise the terminal and run a workflow to completion.
pub fn run_workflow(workflow: &mut dyn Workflow, services: &Services) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(workflow, services, &mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    if let Some(summary) = workflow.summary() {
        println!("{summary}");
    }
    Ok(())
}

fn event_loop(
    workflow: &mut dyn Workflow,
    services: &Services,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    if dispatch(workflow.init(), services, &tx) {
        return Ok(());
    }

    loop {
        terminal.draw(|f| workflow.render(f))?;
        workflow.tick();

        while let Ok(msg) = rx.try_recv() {
            if dispatch(workflow.handle_msg(msg), services, &tx) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if dispatch(workflow.handle_key(key), services, &tx) {
                    return Ok(());
                }
            }
        }
    }
}

/// Run each effect, spawning blocking work onto a thread. Returns true when
/// the workflow asked to quit.
fn dispatch(effects: Vec<Effect>, services: &Services, tx: &mpsc::Sender<Msg>) -> bool {
    for effect in effects {
        match effect {
            Effect::Quit => return true,
            other => run_effect(other, services, tx),
        }
    }
    false
}

fn run_effect(effect: Effect, services: &Services, tx: &mpsc::Sender<Msg>) {
    let tx = tx.clone();
    match effect {
        Effect::LoadTasks { filter } => {
            let store = Arc::clone(&services.store);
            thread::spawn(move || {
                let result = match filter {
                    Some(filter) => store.export(&filter),
                    None => store.untagged_pending(),
                };
                let _ = tx.send(Msg::TasksLoaded(result));
            });
        }
        Effect::FetchEnrichment { description } => {
            let Some(provider) = services.provider.as_ref().map(Arc::clone) else {
                let _ = tx.send(Msg::EnrichmentReady(Err(ProviderError::Request(
                    "no suggestion service configured".to_string(),
                ))));
                return;
            };
            let config = Arc::clone(&services.config);
            thread::spawn(move || {
                let result = provider.enrich(&description, &config.beacons, &config.projects);
                let _ = tx.send(Msg::EnrichmentReady(result));
            });
        }
        Effect::CreateTask(task) => {
            let store = Arc::clone(&services.store);
            thread::spawn(move || {
                let _ = tx.send(Msg::TaskCreated(store.create(&task)));
            });
        }
        Effect::ModifyTask { uuid, delta } => {
            let store = Arc::clone(&services.store);
            thread::spawn(move || {
                let _ = tx.send(Msg::TaskModified(store.modify(&uuid, &delta)));
            });
        }
        Effect::Quit => {}
    }
}

/// Spinner frames shared by the loading screens.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
