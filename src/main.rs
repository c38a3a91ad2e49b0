pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use ratecatch::{
    app_dirs::AppDirs,
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore, RateSource},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    sequence::format_rate,
    storage::{self, KeyValueStore, SqliteStore, UnavailableStore},
    timer::CycleTimer,
    EngineError, RateGameEngine, SelectionPolicy, Transition,
};
use std::{
    error::Error,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Redraw cadence for animations while the cycle timer is quiet.
const FRAME_MS: u64 = 50;

/// catch the rate: stop the cycling rate as high as you can
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal reflex game. Rates cycle rapidly; press ENTER to catch one. The highest rate you ever caught is remembered between sessions."
)]
pub struct Cli {
    /// how the next rate is picked on every tick
    #[clap(short = 'p', long, value_enum)]
    policy: Option<SelectionPolicy>,

    /// milliseconds between rate changes
    #[clap(short = 't', long)]
    tick_ms: Option<u64>,

    /// explicit comma separated rates, e.g. 0.1,0.5,1.0
    #[clap(long, value_delimiter = ',', conflicts_with = "start")]
    rates: Option<Vec<f64>>,

    /// first rate of a generated sequence
    #[clap(long, requires_all = ["step", "count"])]
    start: Option<f64>,

    /// distance between generated rates
    #[clap(long, requires = "start")]
    step: Option<f64>,

    /// number of generated rates
    #[clap(long, requires = "start")]
    count: Option<usize>,

    /// index each round starts from
    #[clap(short = 'i', long)]
    initial_index: Option<usize>,

    /// seed for the random policy, for reproducible rounds
    #[clap(long)]
    seed: Option<u64>,

    /// path of the best-rate database
    #[clap(long)]
    db: Option<PathBuf>,

    /// path of the config file
    #[clap(long)]
    config: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// print the best caught rate and exit
    #[clap(long)]
    show_best: bool,
}

impl Cli {
    /// Layer command line overrides on top of the file config.
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(policy) = self.policy {
            cfg.policy = policy;
        }
        if let Some(tick_ms) = self.tick_ms {
            cfg.tick_ms = tick_ms;
        }
        if let Some(values) = &self.rates {
            cfg.rates = RateSource::Listed {
                values: values.clone(),
            };
        } else if let (Some(start), Some(step), Some(count)) = (self.start, self.step, self.count) {
            cfg.rates = RateSource::Stepped { start, step, count };
        }
        if let Some(initial_index) = self.initial_index {
            cfg.initial_index = initial_index;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

/// The host around the engine: owns the cycle timer and the new-best burst,
/// and keeps the timer in step with the engine's status.
#[derive(Debug)]
pub struct App {
    pub engine: RateGameEngine,
    pub timer: CycleTimer,
    pub celebration: Celebration,
}

impl App {
    pub fn new(config: &Config, store: Box<dyn KeyValueStore>) -> Result<Self, EngineError> {
        let sequence = config.rates.build()?;
        let engine = RateGameEngine::new(sequence, store, config.engine_options())?;
        let mut timer = CycleTimer::new(config.tick_interval()?);
        timer.start(Instant::now());

        Ok(Self {
            engine,
            timer,
            celebration: Celebration::new(),
        })
    }

    pub fn on_tick(&mut self) {
        if let Err(err) = self.engine.advance() {
            tracing::debug!(error = %err, "tick after stop; cancelling timer");
            self.timer.cancel();
        }
    }

    pub fn on_frame(&mut self) {
        self.celebration
            .update(Duration::from_millis(FRAME_MS).as_secs_f64());
    }

    pub fn catch(&mut self, now: Instant, area: Rect) -> Transition {
        let transition = self.engine.catch();
        self.follow(transition, now);
        if let Transition::Stopped(caught) = transition {
            if caught.new_best {
                let (x, y) = ui::best_anchor(area);
                self.celebration.start(x, y, area.width, area.height);
            }
        }
        transition
    }

    pub fn reset(&mut self, now: Instant) -> Transition {
        let transition = self.engine.reset();
        self.follow(transition, now);
        self.celebration.stop();
        transition
    }

    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.celebration.stop();
    }

    fn follow(&mut self, transition: Transition, now: Instant) {
        match transition {
            Transition::Stopped(_) => self.timer.cancel(),
            Transition::Resumed => self.timer.start(now),
            Transition::Unchanged => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent, area: Rect) -> Control {
    // Held keys repeat; only a fresh press counts as a catch.
    if key.kind != KeyEventKind::Press {
        return Control::Continue;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Control::Quit
        }
        KeyCode::Enter => {
            app.catch(Instant::now(), area);
        }
        KeyCode::Char('r') | KeyCode::Char(' ') => {
            if !app.engine.is_running() {
                app.reset(Instant::now());
            }
        }
        _ => {}
    }
    Control::Continue
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some((log_path, file)) = open_log_file() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %log_path.display(), "logging initialized");
        return;
    }

    // Never log to the terminal; it would corrupt the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> Option<(PathBuf, std::fs::File)> {
    let path = AppDirs::log_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    Some((path, file))
}

fn open_store(path: Option<PathBuf>) -> Box<dyn KeyValueStore> {
    let Some(path) = path.or_else(AppDirs::db_path) else {
        tracing::warn!("no state directory; best rate will not be saved");
        return Box::new(UnavailableStore::new("no state directory"));
    };
    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "best rate will not be saved");
            Box::new(UnavailableStore::new(err.to_string()))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config_store = cli.config_store();
    let config = cli.apply_to(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
    }

    let store = open_store(cli.db.clone());

    if cli.show_best {
        match storage::load_best(store.as_ref()) {
            Some(best) => println!("{}", format_rate(best)),
            None => println!("none"),
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(&config, store)?;
    tracing::info!(
        config = %config_store.path().display(),
        policy = %app.engine.policy(),
        initial_index = app.engine.initial_index(),
        rates = app.engine.sequence().len(),
        "starting session"
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(FRAME_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match runner.step(&mut app.timer) {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Frame => {
                if !app.celebration.is_active {
                    continue;
                }
                app.on_frame();
            }
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                let size = terminal.size()?;
                let area = Rect::new(0, 0, size.width, size.height);
                if handle_key(app, key, area) == Control::Quit {
                    break;
                }
            }
        }
        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
