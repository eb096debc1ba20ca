mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keystride::{
    app_dirs::AppDirs,
    config::{Preferences, TestDuration},
    history::{export_csv, HistoryStats},
    runtime::{CrosstermEventSource, FixedTicker, Runner, TrainerEvent},
    session::Key,
    store::Storage,
    texts::{self, Difficulty},
    trainer::Trainer,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Instant,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KEYSTRIDE_LOG";

/// typing speed trainer with live wpm, accuracy and error analysis
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing trainer for the terminal: timed tests on themed texts with live WPM and accuracy, a consistency score, error-pattern analysis with targeted exercises, and a local result history."
)]
pub struct Cli {
    /// test length in seconds (15, 30, 60 or 120)
    #[clap(short = 'd', long)]
    duration: Option<TestDuration>,

    /// text difficulty
    #[clap(short = 'l', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// text topic, e.g. science or history
    #[clap(short = 't', long)]
    theme: Option<String>,

    /// print the available topics and exit
    #[clap(long)]
    list_themes: bool,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// database file (defaults to the app state directory)
    #[clap(long)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// list, export or prune saved results
    History {
        /// write results as CSV to this file ("-" for stdout)
        #[clap(long)]
        export: Option<PathBuf>,

        /// delete the result with this id
        #[clap(long)]
        delete: Option<String>,

        /// delete all results
        #[clap(long)]
        clear: bool,
    },
}

impl Cli {
    fn storage(&self) -> Storage {
        match &self.db {
            Some(path) => Storage::open(path),
            None => Storage::open_default(),
        }
    }

    /// Persisted preferences with command line overrides applied.
    fn preferences(&self, storage: &mut Storage) -> Preferences {
        let mut prefs = Preferences::load(storage);
        let mut changed = false;

        if let Some(duration) = self.duration {
            prefs.duration = duration;
            changed = true;
        }
        if let Some(difficulty) = self.difficulty {
            prefs.difficulty = Some(difficulty);
            changed = true;
        }
        if let Some(theme) = &self.theme {
            prefs.topic = Some(theme.clone());
            changed = true;
        }
        if changed {
            prefs.save(storage);
        }
        prefs
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Help,
    Typing,
    Results,
    Analysis,
}

#[derive(Debug)]
pub struct App {
    pub trainer: Trainer,
    pub state: AppState,
    pub history_stats: HistoryStats,
    /// Clock reading the screens render against
    pub now: Instant,
}

impl App {
    pub fn new(trainer: Trainer) -> Self {
        let history_stats = HistoryStats::from_history(&trainer.storage().history());
        let state = if trainer.preferences().tutorial_seen {
            AppState::Typing
        } else {
            AppState::Help
        };
        Self {
            trainer,
            state,
            history_stats,
            now: Instant::now(),
        }
    }

    fn dismiss_help(&mut self) {
        if !self.trainer.preferences().tutorial_seen {
            self.trainer.mark_tutorial_seen();
        }
        self.state = AppState::Typing;
    }

    fn on_finished(&mut self) {
        self.history_stats = HistoryStats::from_history(&self.trainer.storage().history());
        self.state = AppState::Results;
    }

    pub fn reset(&mut self, exit: ExitType) {
        match exit {
            ExitType::Restart => self.trainer.retry(),
            ExitType::New => self.trainer.new_test(),
            ExitType::Quit => return,
        }
        self.state = AppState::Typing;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    if cli.list_themes {
        let mut out = io::stdout().lock();
        for theme in texts::themes() {
            writeln!(out, "{theme}")?;
        }
        return Ok(());
    }

    let mut storage = cli.storage();

    if let Some(Command::History {
        export,
        delete,
        clear,
    }) = &cli.command
    {
        return run_history(&mut storage, export.as_ref(), delete.as_deref(), *clear);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let prefs = cli.preferences(&mut storage);
    let trainer = match &cli.prompt {
        Some(prompt) => Trainer::with_text(storage, prefs, prompt.clone()),
        None => Trainer::new(storage, prefs),
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(trainer);
    let result = start_tui(&mut terminal, &mut app);
    app.trainer.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Log to a file in the state dir, only when asked to; the TUI owns stdout.
fn init_logging() {
    let Ok(level) = std::env::var(LOG_ENV) else {
        return;
    };
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        if fs::create_dir_all(dir).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let directive = match level.as_str() {
        "" | "1" | "true" => "keystride=debug",
        other => other,
    };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("keystride=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn run_history(
    storage: &mut Storage,
    export: Option<&PathBuf>,
    delete: Option<&str>,
    clear: bool,
) -> Result<(), Box<dyn Error>> {
    let mut out = io::stdout().lock();

    if clear {
        if !storage.clear_history() {
            return Err("could not clear history".into());
        }
        writeln!(out, "History cleared")?;
        return Ok(());
    }

    if let Some(id) = delete {
        if !storage.delete_result(id) {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, format!("no result with id {id}"))
                .exit();
        }
        writeln!(out, "Deleted {id}")?;
        return Ok(());
    }

    let history = storage.history();

    if let Some(path) = export {
        if path.as_os_str() == "-" {
            export_csv(&history, &mut out)?;
        } else {
            export_csv(&history, File::create(path)?)?;
            writeln!(out, "Exported {} results to {}", history.len(), path.display())?;
        }
        return Ok(());
    }

    if history.is_empty() {
        writeln!(out, "No results yet")?;
        return Ok(());
    }

    for result in &history {
        writeln!(
            out,
            "{}  {}  {:>3}s  {:>6.1} wpm  {:>5.1}% acc  {}",
            result.id,
            result.timestamp.format("%Y-%m-%d %H:%M"),
            result.duration,
            result.wpm,
            result.accuracy,
            result.text_preview
        )?;
    }

    let stats = HistoryStats::from_history(&history);
    writeln!(
        out,
        "\n{} tests   avg {:.1} wpm   best {:.1} wpm   avg {:.1}% acc   trend {:+.1} wpm",
        stats.total_tests, stats.avg_wpm, stats.max_wpm, stats.avg_accuracy, stats.recent_improvement
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitType {
    Restart,
    New,
    Quit,
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let exit_type = loop {
            let event = runner.step();
            app.now = Instant::now();

            match event {
                TrainerEvent::Tick => {
                    let running = app.trainer.countdown().is_running();
                    app.trainer.handle_tick(app.now);
                    if app.state == AppState::Typing && app.trainer.session().has_finished() {
                        app.on_finished();
                    }
                    if running {
                        terminal.draw(|f| ui::draw(app, f))?;
                    }
                }
                TrainerEvent::Resize => {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
                TrainerEvent::Key(key) => {
                    if let Some(exit) = handle_key(app, key) {
                        break exit;
                    }
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
        };

        if exit_type == ExitType::Quit {
            break;
        }
        app.reset(exit_type);
    }

    Ok(())
}

/// Returns an exit type when the key ends the current screen.
fn handle_key(app: &mut App, key: KeyEvent) -> Option<ExitType> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ExitType::Quit);
    }

    match (app.state, key.code) {
        (_, KeyCode::Esc) => Some(ExitType::Quit),
        (AppState::Help, _) => {
            app.dismiss_help();
            None
        }
        (_, KeyCode::Left) => Some(ExitType::Restart),
        (_, KeyCode::Right) => Some(ExitType::New),
        (AppState::Typing, KeyCode::Tab) if !app.trainer.session().has_started() => {
            app.trainer.cycle_duration();
            None
        }
        (AppState::Typing, KeyCode::F(1)) if !app.trainer.session().has_started() => {
            app.state = AppState::Help;
            None
        }
        (AppState::Typing, _) => {
            app.trainer.handle_key(Key::from(key), app.now);
            if app.trainer.session().has_finished() {
                app.on_finished();
            }
            None
        }
        (AppState::Results, KeyCode::Char('r')) | (AppState::Analysis, KeyCode::Char('r')) => {
            Some(ExitType::Restart)
        }
        (AppState::Results, KeyCode::Char('n')) | (AppState::Analysis, KeyCode::Char('n')) => {
            Some(ExitType::New)
        }
        (AppState::Results, KeyCode::Char('a')) => {
            app.state = AppState::Analysis;
            None
        }
        (AppState::Analysis, KeyCode::Char('b')) | (AppState::Analysis, KeyCode::Backspace) => {
            app.state = AppState::Results;
            None
        }
        _ => None,
    }
}
