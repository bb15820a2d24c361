mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use typequote::{
    action::Action,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{
        describe_age, export_csv, HistorySummary, MemoryScoreStore, ScoreRecord, ScoreStore,
        SqliteScoreStore, HISTORY_LIMIT,
    },
    provider::{
        acquire_text, Collection, QuoteBook, QuoteFileProvider, StaticProvider, TextProvider,
        PLACEHOLDER_TEXT,
    },
    round::{Flow, Round},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, SessionEvent, TickFeed},
    tq_info, tq_warn, SessionError,
};

/// How long the event loop waits before redrawing without input
const POLL_MS: u64 = 100;

/// typing test on famous quotes with live wpm, accuracy and score history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test on famous quotes. Shows live words-per-minute and accuracy while you type and keeps your last scores for comparison."
)]
pub struct Cli {
    /// number of seconds to run test (defaults to the saved setting, 60 out of the box)
    #[clap(
        short = 's',
        long,
        conflicts_with = "untimed",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    number_of_secs: Option<u64>,

    /// run without a time limit until the whole quote is typed
    #[clap(long)]
    untimed: bool,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// quote collection to draw from
    #[clap(short = 'c', long, value_enum)]
    collection: Option<Collection>,

    /// read quotes from a JSON file holding {"quote": ...} or a list of those
    #[clap(short = 'q', long, conflicts_with = "prompt")]
    quote_file: Option<PathBuf>,

    /// print the most recent scores and exit
    #[clap(long)]
    history: bool,

    /// write the most recent scores as CSV to PATH and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// write debug lines to the log file
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Fold command line overrides into the saved configuration
    fn apply_to(&self, config: &mut Config) {
        if self.untimed {
            config.time_limit_secs = None;
        } else if let Some(secs) = self.number_of_secs {
            config.time_limit_secs = Some(secs);
        }
        if let Some(collection) = self.collection {
            config.collection = collection;
        }
    }

    fn text_provider(&self, config: &Config) -> Box<dyn TextProvider> {
        if let Some(prompt) = &self.prompt {
            return Box::new(StaticProvider::new(prompt.clone()));
        }
        if let Some(path) = &self.quote_file {
            return Box::new(QuoteFileProvider::new(path));
        }

        match QuoteBook::new(config.collection) {
            Ok(book) => Box::new(book),
            Err(e) => {
                tq_warn!("main", "quote collection unavailable: {e}");
                Box::new(StaticProvider::new(PLACEHOLDER_TEXT))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
}

pub struct App {
    pub round: Round,
    pub state: AppState,
    /// Newest first
    pub history: Vec<ScoreRecord>,
    provider: Box<dyn TextProvider>,
    store: Box<dyn ScoreStore>,
    time_limit: Option<u64>,
    tick_feed: Option<TickFeed>,
}

impl App {
    pub fn new(
        mut provider: Box<dyn TextProvider>,
        store: Box<dyn ScoreStore>,
        time_limit: Option<u64>,
    ) -> Result<Self, SessionError> {
        let round = Round::new(acquire_text(provider.as_mut()), time_limit)?;
        let mut app = Self {
            round,
            state: AppState::Typing,
            history: Vec::new(),
            provider,
            store,
            time_limit,
            tick_feed: None,
        };
        app.refresh_history();
        Ok(app)
    }

    /// Ticks start on the first keystroke of each round and stop when it ends
    pub fn attach_tick_feed(&mut self, feed: TickFeed) {
        self.tick_feed = Some(feed);
        self.sync_tick_feed();
    }

    /// Returns true when the app should quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool, SessionError> {
        match self.round.apply(action, self.store.as_mut()) {
            Flow::Continue => self.sync_state(),
            Flow::Restart => self.reset(false)?,
            Flow::NewText => self.reset(true)?,
            Flow::Quit => return Ok(true),
        }
        self.sync_tick_feed();
        Ok(false)
    }

    pub fn on_tick(&mut self) {
        self.round.tick(self.store.as_mut());
        self.sync_state();
        self.sync_tick_feed();
    }

    fn sync_tick_feed(&mut self) {
        if let Some(feed) = self.tick_feed.as_mut() {
            feed.follow(self.round.session());
        }
    }

    fn reset(&mut self, new_text: bool) -> Result<(), SessionError> {
        if new_text {
            self.round = Round::new(acquire_text(self.provider.as_mut()), self.time_limit)?;
        } else {
            self.round.restart()?;
        }
        self.state = AppState::Typing;
        Ok(())
    }

    fn sync_state(&mut self) {
        if self.state == AppState::Typing && self.round.result().is_some() {
            self.state = AppState::Results;
            self.refresh_history();
        }
    }

    fn refresh_history(&mut self) {
        match self.store.recent() {
            Ok(records) => self.history = records,
            Err(e) => tq_warn!("main", "could not load score history: {e:#}"),
        }
    }
}

fn open_store() -> Box<dyn ScoreStore> {
    match AppDirs::db_path().map(|path| SqliteScoreStore::open(path, HISTORY_LIMIT)) {
        Some(Ok(store)) => Box::new(store),
        Some(Err(e)) => {
            tq_warn!("main", "falling back to in-memory history: {e:#}");
            Box::new(MemoryScoreStore::new())
        }
        None => Box::new(MemoryScoreStore::new()),
    }
}

fn format_history(records: &[ScoreRecord], now: chrono::DateTime<chrono::Local>) -> Vec<String> {
    if records.is_empty() {
        return vec!["no scores yet".to_string()];
    }

    let mut lines: Vec<String> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{:>2}. {:>3} wpm  {:>3}% acc  {}",
                i + 1,
                r.wpm,
                r.accuracy,
                describe_age(r, now)
            )
        })
        .collect();

    if let Some(summary) = HistorySummary::from_records(records) {
        lines.push(format!(
            "avg {:.1} wpm (sd {:.2})  best {} wpm  avg {:.1}% acc",
            summary.mean_wpm, summary.wpm_std_dev, summary.best_wpm, summary.mean_accuracy
        ));
    }

    lines
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        typequote::log::init(path, cli.verbose);
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);

    let store = open_store();

    if cli.history {
        for line in format_history(&store.recent()?, chrono::Local::now()) {
            println!("{line}");
        }
        return Ok(());
    }

    if let Some(path) = &cli.export {
        let records = store.recent()?;
        export_csv(&records, path)?;
        println!("exported {} scores to {}", records.len(), path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = config_store.save(&config) {
        tq_warn!("main", "could not save settings: {e:#}");
    }

    let mut app = App::new(cli.text_provider(&config), store, config.time_limit_secs)?;
    tq_info!(
        "main",
        "starting, time limit {:?}, collection {}",
        config.time_limit_secs,
        config.collection
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (source, feed) = CrosstermEventSource::new(FixedTicker::default());
    app.attach_tick_feed(feed);
    let runner = Runner::new(source, Duration::from_millis(POLL_MS));
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let Some(event) = runner.step() else {
            continue;
        };

        match event {
            SessionEvent::Tick => app.on_tick(),
            SessionEvent::Resize => {}
            SessionEvent::Key(key) => {
                if let Some(action) = Action::from_key(key) {
                    if app.handle_action(action)? {
                        break;
                    }
                }
            }
        }

        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}
