mod app;
mod catalog;
mod config;
mod entity;
mod fetch;
mod models;
mod moves;
mod nav;
mod sprite;
mod state;
mod ui;
mod utils;

use clap::Parser;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::app::{run_effect, App, AppEvent, Effect};
use crate::config::Args;
use crate::fetch::{HttpUpstream, Upstream};
use crate::ui::draw_ui;

enum Step {
    Continue(Vec<Effect>),
    Quit,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let start = args.start_route()?;
    info!(api_base = %args.api_base, route = %start, "pokedex-browser starting");

    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(&args.api_base));
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(start, !args.no_sprites);
    spawn_effects(app.enter(), &upstream, &tx);

    let result = run(&mut terminal, &mut app, &upstream, &tx, &mut rx);

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("pokedex-browser exiting");
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    upstream: &Arc<dyn Upstream>,
    tx: &UnboundedSender<AppEvent>,
    rx: &mut UnboundedReceiver<AppEvent>,
) -> Result<(), Box<dyn Error>> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        // Apply whatever finished since the last frame
        while let Ok(event) = rx.try_recv() {
            let effects = app.handle(event);
            spawn_effects(effects, upstream, tx);
        }

        draw_ui(terminal, app)?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match handle_key(app, key) {
                        Step::Continue(effects) => spawn_effects(effects, upstream, tx),
                        Step::Quit => return Ok(()),
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Step {
    if app.prompt.is_some() {
        let effects = match key.code {
            KeyCode::Enter => app.submit_prompt(),
            KeyCode::Esc => {
                app.close_prompt();
                Vec::new()
            }
            KeyCode::Backspace => {
                app.prompt_backspace();
                Vec::new()
            }
            KeyCode::Char(c) => {
                app.prompt_input(c);
                Vec::new()
            }
            _ => Vec::new(),
        };
        return Step::Continue(effects);
    }

    if app.show_help {
        match key.code {
            KeyCode::Char('q') => return Step::Quit,
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::F(1) => app.show_help = false,
            _ => {}
        }
        return Step::Continue(Vec::new());
    }

    let effects = match key.code {
        KeyCode::Char('q') => return Step::Quit,
        KeyCode::F(1) | KeyCode::Char('h') => {
            app.show_help = true;
            Vec::new()
        }
        KeyCode::Char('/') => {
            app.open_prompt();
            Vec::new()
        }
        KeyCode::Up => app.select_up(),
        KeyCode::Down => app.select_down(),
        KeyCode::Left => app.select_left(),
        KeyCode::Right => app.select_right(),
        KeyCode::Enter => app.activate(),
        KeyCode::Char('n') | KeyCode::PageDown => app.next_page(),
        KeyCode::Char('p') | KeyCode::PageUp => app.prev_page(),
        KeyCode::Char('a') => app.open_ancestor(),
        KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Esc => app.back(),
        KeyCode::Char('r') => app.reload(),
        _ => Vec::new(),
    };
    Step::Continue(effects)
}

/// Run each effect as its own task; the result comes back over `tx`.
fn spawn_effects(effects: Vec<Effect>, upstream: &Arc<dyn Upstream>, tx: &UnboundedSender<AppEvent>) {
    for effect in effects {
        debug!(?effect, "spawning effect");
        let upstream = Arc::clone(upstream);
        let tx = tx.clone();
        tokio::spawn(async move {
            let event = run_effect(effect, upstream).await;
            // receiver is gone once the UI has exited
            let _ = tx.send(event);
        });
    }
}

fn init_logging(path: Option<&Path>) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}
