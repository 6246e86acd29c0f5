use aidmap::config::Args;
use aidmap::data::{self, CountryFeature, ProjectRecord};
use aidmap::ui;
use aidmap::{App, Command, FlowCategory};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const IDLE_POLL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    // Both sources are needed; nothing is drawn from a partial load
    let loaded = data::load_sources(&args.geography_path(), &args.projects_path(), &args.fields());
    if let Err(ref e) = loaded {
        error!(error = %e, "data load failed");
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = match loaded {
        Ok((features, records)) => run(&mut terminal, features, records),
        Err(e) => show_load_error(&mut terminal, &e.to_string()).and_then(|()| Err(e.into())),
    };

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to a file; stdout belongs to the terminal UI
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

/// Handle mouse events for hover, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row, now),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.dispatch(
            Command::ZoomInAt {
                col: mouse.column,
                row: mouse.row,
            },
            now,
        ),
        MouseEventKind::ScrollDown => app.dispatch(
            Command::ZoomOutAt {
                col: mouse.column,
                row: mouse.row,
            },
            now,
        ),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.dispatch(Command::Pan { dx: -15, dy: 0 }, now),
        MouseEventKind::ScrollRight => app.dispatch(Command::Pan { dx: 15, dy: 0 }, now),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row, now),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn key_command(code: KeyCode) -> Option<Command> {
    let command = match code {
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,

        // Flow category controls
        KeyCode::Char('1') | KeyCode::Char('o') | KeyCode::Char('O') => {
            Command::SelectCategory(FlowCategory::Oda)
        }
        KeyCode::Char('2') | KeyCode::Char('f') | KeyCode::Char('F') => {
            Command::SelectCategory(FlowCategory::Oof)
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => Command::Pan { dx: -10, dy: 0 },
        KeyCode::Right | KeyCode::Char('l') => Command::Pan { dx: 10, dy: 0 },
        KeyCode::Up | KeyCode::Char('k') => Command::Pan { dx: 0, dy: -6 },
        KeyCode::Down | KeyCode::Char('j') => Command::Pan { dx: 0, dy: 6 },

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => Command::ZoomIn,
        KeyCode::Char('-') | KeyCode::Char('_') => Command::ZoomOut,

        // Reset view
        KeyCode::Char('r') | KeyCode::Char('0') => Command::ResetView,

        _ => return None,
    };
    Some(command)
}

fn run(terminal: &mut DefaultTerminal, features: Vec<CountryFeature>, records: Vec<ProjectRecord>) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        features,
        records,
        size.width as usize,
        size.height as usize,
        Instant::now(),
    );
    info!(countries = app.map.len(), "map ready");

    // Main loop
    loop {
        let now = Instant::now();
        terminal.draw(|frame| ui::render(frame, &app, now))?;

        // ~60fps while fills are moving, otherwise wake only for input
        let timeout = if app.map.is_animating(now) { FRAME } else { IDLE_POLL };
        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(command) = key_command(key.code) {
                        app.dispatch(command, now);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse, now),
                Event::Resize(width, height) => app.dispatch(Command::Resize { width, height }, now),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Error screen until the user quits
fn show_load_error(terminal: &mut DefaultTerminal, message: &str) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render_load_error(frame, message))?;

        if event::poll(IDLE_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }
    }
    Ok(())
}
