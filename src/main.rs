use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use visit_map::app::{cell_to_pixel, App, MapEvent};
use visit_map::config::Args;
use visit_map::data;
use visit_map::interaction::InputEvent;
use visit_map::style::Palette;
use visit_map::ui;

/// Keyboard pan step in canvas pixels
const KEY_PAN_X: f64 = 20.0;
const KEY_PAN_Y: f64 = 12.0;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &args);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Logs go to `--log-file` only, since the terminal belongs to the map
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt::fmt()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();
    Ok(())
}

fn build_app(args: &Args, width: u16, height: u16) -> App {
    let regions = data::load_or_builtin(&args.world);
    let mut app = App::new(
        regions,
        args.visited_sets(),
        args.map_config(),
        args.palette(Palette::flat()),
        args.palette(Palette::globe()),
        width as usize,
        height as usize,
    );
    if args.globe {
        app.toggle_mode();
    }
    app
}

/// Translate terminal mouse events into pointer input
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);
    let (x, y) = cell_to_pixel(mouse.column, mouse.row);

    let input = match mouse.kind {
        MouseEventKind::ScrollUp => InputEvent::Scroll { x, y, notches: 1.0 },
        MouseEventKind::ScrollDown => InputEvent::Scroll { x, y, notches: -1.0 },
        MouseEventKind::Down(MouseButton::Left) => InputEvent::Down { x, y },
        MouseEventKind::Drag(MouseButton::Left) => InputEvent::Move { x, y },
        MouseEventKind::Up(MouseButton::Left) => InputEvent::Up { x, y },
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => return app.pan(KEY_PAN_X, 0.0),
        MouseEventKind::ScrollRight => return app.pan(-KEY_PAN_X, 0.0),
        _ => return,
    };
    app.handle_input(input);
}

fn run(terminal: &mut DefaultTerminal, args: &Args) -> Result<()> {
    let size = terminal.size()?;
    let mut app = build_app(args, size.width, size.height);

    // Main loop
    loop {
        let canvas = app.render_canvas();
        terminal.draw(|frame| ui::render(frame, &app, &canvas))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(KEY_PAN_X, 0.0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(-KEY_PAN_X, 0.0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0.0, KEY_PAN_Y),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0.0, -KEY_PAN_Y),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_mode(),
                            KeyCode::Char('c') => app.clear_selection(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        for event in app.drain_events() {
            match event {
                MapEvent::SelectionChanged(key) => tracing::info!(selected = ?key, "selection changed"),
                MapEvent::TransformChanged(t) => tracing::trace!(x = t.x, y = t.y, k = t.k, "transform changed"),
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
