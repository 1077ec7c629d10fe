mod archive;
mod config;
mod session;

use anyhow::Result;
use clap::Parser;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use room_forge_core::{
    Cell, DoorDirection, InMemoryArchive, ItemKind, LayoutArchive, TileArchetype, TilePalette,
    WallDirection,
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::{
    archive::JsonArchive,
    config::AppConfig,
    session::{AgentKind, EpisodeReport, Session},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Room width, overriding the config file
    #[arg(long)]
    width: Option<usize>,

    /// Room height, overriding the config file
    #[arg(long)]
    height: Option<usize>,

    /// Seed of the first room; episode `n` uses `seed + n`
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Run without a terminal UI and log one line per episode
    #[arg(long)]
    headless: bool,

    /// Episodes to run in headless mode
    #[arg(short, long, default_value_t = 10)]
    episodes: u64,

    /// Directory for high-engagement layouts; kept in memory when omitted
    #[arg(long, value_name = "DIR")]
    archive_dir: Option<PathBuf>,

    /// Agent that plays each room
    #[arg(long, value_enum, default_value_t = AgentKind::Planner)]
    agent: AgentKind,
}

type Glyph = Span<'static>;

/// Characters used to draw each archetype.
fn glyph_palette() -> TilePalette<Glyph> {
    TilePalette::from_fn(|archetype| match archetype {
        TileArchetype::Wall(direction) => {
            let symbol = match direction {
                WallDirection::Top | WallDirection::Bottom => "─",
                WallDirection::Left | WallDirection::Right => "│",
                WallDirection::TopLeft => "┌",
                WallDirection::TopRight => "┐",
                WallDirection::BottomLeft => "└",
                WallDirection::BottomRight => "┘",
            };
            Span::styled(symbol, Style::default().fg(Color::DarkGray))
        }
        TileArchetype::Door(direction) => {
            let symbol = match direction {
                DoorDirection::Top | DoorDirection::Bottom => "=",
                DoorDirection::Left | DoorDirection::Right => "‖",
            };
            Span::styled(symbol, Style::default().fg(Color::Green).bold())
        }
        TileArchetype::Floor => Span::raw(" "),
        TileArchetype::Pit => Span::styled("o", Style::default().fg(Color::Blue)),
        TileArchetype::Item(ItemKind::Coin) => Span::styled("c", Style::default().fg(Color::Yellow)),
        TileArchetype::Item(ItemKind::Key) => Span::styled("k", Style::default().fg(Color::Cyan)),
        TileArchetype::Item(ItemKind::Bomb) => Span::styled("b", Style::default().fg(Color::Red)),
    })
}

struct App {
    session: Session<Glyph>,
    /// Flag to control the main loop.
    should_quit: bool,
    paused: bool,
}

impl App {
    fn new(session: Session<Glyph>) -> Self {
        App {
            session,
            should_quit: false,
            paused: false,
        }
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) -> Result<()> {
        if !self.paused {
            self.session.tick()?;
        }
        Ok(())
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.headless { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.generator.width = width;
    }
    if let Some(height) = args.height {
        config.generator.height = height;
    }

    let archive: Box<dyn LayoutArchive> = match &args.archive_dir {
        Some(dir) => {
            let archive = JsonArchive::new(dir)?;
            log::info!("Archiving layouts to {}", archive.dir().display());
            Box::new(archive)
        }
        None => Box::new(InMemoryArchive::new()),
    };
    let session = Session::new(config, args.agent, args.seed, glyph_palette(), archive)?;

    if args.headless {
        return run_headless(session, args.episodes);
    }

    // Set up the terminal
    let mut terminal = setup_terminal()?;
    let mut app = App::new(session);
    let result = run_app(&mut terminal, &mut app);
    // Restore the terminal state even when the loop failed
    restore_terminal(&mut terminal)?;
    result
}

fn run_headless(mut session: Session<Glyph>, episodes: u64) -> Result<()> {
    for _ in 0..episodes {
        let report = session.run_episode()?;
        log::info!("{}", summary(&report));
    }
    log::info!(
        "Finished {} episodes, best engagement {:.2}",
        episodes,
        session.tracker().highest().score()
    );
    Ok(())
}

fn summary(report: &EpisodeReport) -> String {
    let metrics = report.outcome.metrics;
    format!(
        "episode {} seed {}: {} after {} steps, reward {:.2} exploration {:.0} pickups {:.0}, score {:.2}{}",
        report.episode,
        report.seed,
        if report.exited { "exited" } else { "timed out" },
        report.steps,
        metrics.reward_score,
        metrics.exploration,
        metrics.item_pickups,
        report.outcome.score,
        if report.archived { " (new best, archived)" } else { "" }
    )
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char(' ') => app.paused = !app.paused,
                    KeyCode::Char('n') => {
                        app.session.finish_episode()?;
                    }
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick()?;
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(65), // Area for the room
            Constraint::Percentage(25), // Area for agent and engagement
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], &app.session);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_layout[1]);
    render_inventory(frame, panels[0], &app.session);
    render_engagement(frame, panels[1], &app.session);

    let status = if app.paused { "Paused. " } else { "" };
    let help_text = Paragraph::new(format!(
        "{}'space' pause, 'n' next room, 'q' or 'Esc' quit.",
        status
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the agent's position and collected items.
fn render_inventory(frame: &mut Frame, area: Rect, session: &Session<Glyph>) {
    let environment = session.environment();
    let agent = environment.agent();
    let inventory = agent.inventory;
    let lines = vec![
        Line::from(format!(
            "Pos: ({}, {})  Steps: {}/{}",
            agent.position.x,
            agent.position.y,
            environment.steps(),
            environment.max_steps()
        )),
        Line::from(vec![
            Span::styled("c", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" {}  ", inventory.coins)),
            Span::styled("k", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}  ", inventory.keys)),
            Span::styled("b", Style::default().fg(Color::Red)),
            Span::raw(format!(" {}", inventory.bombs)),
        ]),
    ];
    let widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Inventory"));
    frame.render_widget(widget, area);
}

/// Renders current, previous and best engagement with the weights in use.
fn render_engagement(frame: &mut Frame, area: Rect, session: &Session<Glyph>) {
    let tracker = session.tracker();
    let current = tracker.current();
    let mut lines = vec![
        Line::from(format!(
            "Episode {}  current {:.2} (reward {:.2}, explored {:.0}, pickups {:.0})",
            session.episode(),
            current.score(),
            current.reward_score,
            current.exploration,
            current.item_pickups
        )),
        Line::from(format!(
            "Previous {:.2}  best {:.2}  buffer x{:.2}",
            tracker.previous().score(),
            tracker.highest().score(),
            tracker.increase_buffer()
        )),
    ];
    match session.room().weights() {
        Some(weights) => lines.push(Line::from(format!(
            "Weights item {:.3}  pit {:.3}  floor {:.3}",
            weights.item_weight(),
            weights.pit_weight(),
            weights.floor_weight()
        ))),
        None => lines.push(Line::from("Weights: not used by this method")),
    }
    if let Some(report) = session.last_report() {
        let style = if report.archived {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        lines.push(Line::styled(summary(report), style));
    }
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Engagement"));
    frame.render_widget(widget, area);
}

/// Renders the room with `y` growing upwards.
fn render_map(frame: &mut Frame, area: Rect, session: &Session<Glyph>) {
    let environment = session.environment();
    let grid = environment.grid();
    let palette = session.generator().palette();
    let agent_pos = environment.agent().position;

    let mut lines: Vec<Line> = Vec::with_capacity(grid.height());
    for y in (0..grid.height()).rev() {
        let mut spans: Vec<Span> = Vec::with_capacity(grid.width());
        for x in 0..grid.width() {
            if agent_pos.x == x && agent_pos.y == y {
                spans.push(Span::styled("@", Style::default().fg(Color::Red).bold()));
                continue;
            }
            let Some(cell) = grid.get(x, y) else {
                continue;
            };
            let span = match (cell, palette.get(cell.archetype())) {
                (Cell::Floor { explored: true }, _) => {
                    Span::styled("·", Style::default().fg(Color::DarkGray))
                }
                (_, Some(glyph)) => glyph.clone(),
                (_, None) => Span::raw("?"),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let seed = session
        .generator()
        .current()
        .map(|rendered| rendered.seed)
        .unwrap_or_default();
    let map_paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!("Room Forge (seed {})", seed))
                .borders(Borders::ALL),
        )
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
