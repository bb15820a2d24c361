use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::session::TypingSession;

/// Production tick rate: one tick per elapsed second
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of serialized session events (keyboard, resize, ticks)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

enum TickControl {
    Start,
    Stop,
}

/// Handle on a ticker thread: idle until started, phase-aligned to each start
#[derive(Debug)]
pub struct TickFeed {
    control: Sender<TickControl>,
    active: bool,
}

impl TickFeed {
    /// Start ticking one interval from now; restarting re-aligns the phase
    pub fn start(&mut self) {
        self.active = self.control.send(TickControl::Start).is_ok();
    }

    pub fn stop(&mut self) {
        let _ = self.control.send(TickControl::Stop);
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Run the feed exactly while the session is Running
    pub fn follow(&mut self, session: &TypingSession) {
        match (session.is_running(), self.active) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }
}

/// Spawn a ticker thread feeding `tx`. It emits nothing until started
/// and exits once either the feed handle or the receiving side is dropped.
pub fn spawn_ticker<T: Ticker>(tx: Sender<SessionEvent>, ticker: T) -> TickFeed {
    let (control, commands) = mpsc::channel();

    thread::spawn(move || {
        let mut deadline: Option<Instant> = None;
        loop {
            let command = match deadline {
                None => match commands.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
                Some(at) => {
                    match commands.recv_timeout(at.saturating_duration_since(Instant::now())) {
                        Ok(command) => command,
                        Err(RecvTimeoutError::Timeout) => {
                            if tx.send(SessionEvent::Tick).is_err() {
                                break;
                            }
                            deadline = Some(at + ticker.interval());
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            };

            deadline = match command {
                TickControl::Start => Some(Instant::now() + ticker.interval()),
                TickControl::Stop => None,
            };
        }
    });

    TickFeed {
        control,
        active: false,
    }
}

/// Production event source: terminal events and ticks merged into one ordered channel
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    /// The returned feed drives the tick half of the channel
    pub fn new<T: Ticker>(ticker: T) -> (Self, TickFeed) {
        let (tx, rx) = mpsc::channel();

        let feed = spawn_ticker(tx.clone(), ticker);

        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(SessionEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(SessionEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    crate::tq_error!("runtime", "terminal input failed: {e}");
                    break;
                }
            }
        });

        (Self { rx }, feed)
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for headless tests
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands out events one at a time, in arrival order
pub struct Runner<E: EventSource> {
    event_source: E,
    poll: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, poll: Duration) -> Self {
        Self { event_source, poll }
    }

    /// Blocks up to the poll interval; `None` when nothing arrived
    pub fn step(&self) -> Option<SessionEvent> {
        match self.event_source.recv_timeout(self.poll) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
