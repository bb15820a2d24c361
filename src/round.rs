use crate::action::Action;
use crate::history::{ScoreRecord, ScoreStore};
use crate::session::{Score, SessionError, TypingSession};

/// What the front end should do after an action was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Restart,
    NewText,
    Quit,
}

/// One typing test: a session plus the bookkeeping around it.
///
/// Guards every dispatch with the session's preconditions, so events that
/// arrive in the wrong state (ticks after the finish, backspace at the start,
/// keys after completion) are dropped here and never reach the session.
#[derive(Debug, Clone)]
pub struct Round {
    text: String,
    time_limit: Option<u64>,
    session: TypingSession,
    result: Option<Score>,
}

impl Round {
    pub fn new(text: impl Into<String>, time_limit: Option<u64>) -> Result<Self, SessionError> {
        let text = text.into();
        let session = TypingSession::with_time_limit(&text, time_limit)?;
        Ok(Self {
            text,
            time_limit,
            session,
            result: None,
        })
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Final score, once the session finished
    pub fn result(&self) -> Option<Score> {
        self.result
    }

    /// Start over on the same text
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.session = TypingSession::with_time_limit(&self.text, self.time_limit)?;
        self.result = None;
        Ok(())
    }

    pub fn apply(&mut self, action: Action, store: &mut dyn ScoreStore) -> Flow {
        match action {
            Action::Insert(c) if self.session.is_finished() => match c {
                'r' => Flow::Restart,
                'n' => Flow::NewText,
                _ => Flow::Continue,
            },
            Action::Insert(c) => {
                if let Err(e) = self.session.on_character(c) {
                    crate::tq_warn!("round", "dropped keystroke: {e}");
                }
                self.finish_if_done(store);
                Flow::Continue
            }
            Action::Delete => {
                if self.session.is_running() && self.session.cursor() > 0 {
                    if let Err(e) = self.session.on_backspace() {
                        crate::tq_warn!("round", "dropped backspace: {e}");
                    }
                }
                Flow::Continue
            }
            Action::Restart => Flow::Restart,
            Action::NewText => Flow::NewText,
            Action::Quit => Flow::Quit,
        }
    }

    pub fn tick(&mut self, store: &mut dyn ScoreStore) {
        if !self.session.is_running() {
            return;
        }
        if let Err(e) = self.session.on_tick() {
            crate::tq_warn!("round", "dropped tick: {e}");
        }
        self.finish_if_done(store);
    }

    fn finish_if_done(&mut self, store: &mut dyn ScoreStore) {
        if self.result.is_some() || !self.session.is_finished() {
            return;
        }

        let score = match self.session.finalize() {
            Ok(score) => score,
            Err(e) => {
                crate::tq_error!("round", "could not finalize finished session: {e}");
                return;
            }
        };
        self.result = Some(score);

        crate::tq_info!(
            "round",
            "finished after {}s: {} wpm, {}% accuracy, {}/{} characters",
            self.session.elapsed_seconds(),
            score.wpm,
            score.accuracy,
            self.session.cursor(),
            self.session.len()
        );

        if let Err(e) = store.record(ScoreRecord::now(score)) {
            crate::tq_error!("round", "failed to record score: {e:#}");
        }
    }
}
