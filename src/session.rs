use std::fmt;

use crate::scoring;

/// Per-position marking of the target text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CharState {
    #[default]
    Untouched,
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// Final or live wpm/accuracy snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    pub wpm: u32,
    pub accuracy: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    EmptyTarget,
    InvalidState {
        op: &'static str,
        state: SessionState,
    },
    OutOfRange {
        cursor: usize,
        len: usize,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyTarget => write!(f, "target text is empty"),
            SessionError::InvalidState { op, state } => {
                write!(f, "{op} is not allowed while the session is {state}")
            }
            SessionError::OutOfRange { cursor, len } => {
                write!(f, "cursor {cursor} is already at the end of a {len} character text")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// A single typing test over a fixed target text.
///
/// The session does not own a clock: it counts the ticks it is fed while running.
/// Callers serialize keystrokes and ticks into one ordered stream and check
/// preconditions (`is_finished`, `cursor`) before dispatching.
#[derive(Clone, Debug)]
pub struct TypingSession {
    text: Vec<char>,
    states: Vec<CharState>,
    cursor: usize,
    errors: usize,
    elapsed_secs: u64,
    time_limit: Option<u64>,
    state: SessionState,
}

impl TypingSession {
    /// Session that only finishes when the whole text was typed
    pub fn new(text: &str) -> Result<Self, SessionError> {
        Self::with_time_limit(text, None)
    }

    pub fn with_time_limit(text: &str, time_limit: Option<u64>) -> Result<Self, SessionError> {
        let text: Vec<char> = text.chars().collect();
        if text.is_empty() {
            return Err(SessionError::EmptyTarget);
        }

        Ok(Self {
            states: vec![CharState::Untouched; text.len()],
            text,
            cursor: 0,
            errors: 0,
            elapsed_secs: 0,
            time_limit,
            state: SessionState::Idle,
        })
    }

    pub fn on_tick(&mut self) -> Result<(), SessionError> {
        self.require_running("tick")?;

        self.elapsed_secs += 1;
        if let Some(limit) = self.time_limit {
            if self.elapsed_secs >= limit {
                self.state = SessionState::Finished;
            }
        }

        Ok(())
    }

    pub fn on_character(&mut self, c: char) -> Result<(), SessionError> {
        if self.cursor == self.text.len() {
            return Err(SessionError::OutOfRange {
                cursor: self.cursor,
                len: self.text.len(),
            });
        }
        if self.state == SessionState::Finished {
            return Err(self.invalid("character"));
        }

        if self.state == SessionState::Idle {
            self.state = SessionState::Running;
        }

        if c == self.text[self.cursor] {
            self.states[self.cursor] = CharState::Correct;
        } else {
            self.states[self.cursor] = CharState::Incorrect;
            self.errors += 1;
        }
        self.cursor += 1;

        if self.cursor == self.text.len() {
            self.state = SessionState::Finished;
        }

        Ok(())
    }

    pub fn on_backspace(&mut self) -> Result<(), SessionError> {
        self.require_running("backspace")?;
        if self.cursor == 0 {
            return Err(self.invalid("backspace"));
        }

        self.cursor -= 1;
        if self.states[self.cursor] == CharState::Incorrect {
            self.errors -= 1;
        }
        self.states[self.cursor] = CharState::Untouched;

        Ok(())
    }

    pub fn current_accuracy(&self) -> u32 {
        scoring::accuracy(self.cursor, self.errors)
    }

    pub fn current_wpm(&self) -> u32 {
        scoring::wpm(self.cursor, self.errors, self.elapsed_secs)
    }

    /// Live snapshot, valid in any state
    pub fn score(&self) -> Score {
        Score {
            wpm: self.current_wpm(),
            accuracy: self.current_accuracy(),
        }
    }

    pub fn finalize(&self) -> Result<Score, SessionError> {
        if self.state != SessionState::Finished {
            return Err(self.invalid("finalize"));
        }
        Ok(self.score())
    }

    pub fn text(&self) -> &[char] {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Always false: construction rejects empty text
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed_secs))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    pub fn char_states(&self) -> &[CharState] {
        &self.states
    }

    pub fn char_state(&self, idx: usize) -> Option<CharState> {
        self.states.get(idx).copied()
    }

    /// Character under the cursor, `None` once the text is complete
    pub fn expected_char(&self) -> Option<char> {
        self.text.get(self.cursor).copied()
    }

    fn require_running(&self, op: &'static str) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            Ok(())
        } else {
            Err(self.invalid(op))
        }
    }

    fn invalid(&self, op: &'static str) -> SessionError {
        SessionError::InvalidState {
            op,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn type_str(session: &mut TypingSession, s: &str) {
        for c in s.chars() {
            session.on_character(c).unwrap();
        }
    }

    fn tick_n(session: &mut TypingSession, n: u64) {
        for _ in 0..n {
            session.on_tick().unwrap();
        }
    }

    #[test]
    fn test_new_session() {
        let session = TypingSession::new("hello").unwrap();

        assert_eq!(session.len(), 5);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.error_count(), 0);
        assert_eq!(session.elapsed_seconds(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session
            .char_states()
            .iter()
            .all(|s| *s == CharState::Untouched));
        assert_eq!(session.expected_char(), Some('h'));
        assert_eq!(session.seconds_remaining(), None);
    }

    #[test]
    fn test_empty_target_is_rejected() {
        assert_matches!(TypingSession::new(""), Err(SessionError::EmptyTarget));
        assert_matches!(
            TypingSession::with_time_limit("", Some(60)),
            Err(SessionError::EmptyTarget)
        );
    }

    #[test]
    fn test_multibyte_text_is_indexed_by_char() {
        let mut session = TypingSession::new("é ü").unwrap();
        assert_eq!(session.len(), 3);

        session.on_character('é').unwrap();
        assert_eq!(session.char_state(0), Some(CharState::Correct));
        assert_eq!(session.expected_char(), Some(' '));
    }

    #[test]
    fn test_first_character_starts_session() {
        let mut session = TypingSession::new("abc").unwrap();

        session.on_character('a').unwrap();

        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.char_state(0), Some(CharState::Correct));
    }

    #[test]
    fn test_incorrect_character_counts_error() {
        let mut session = TypingSession::new("abc").unwrap();

        session.on_character('x').unwrap();

        assert_eq!(session.error_count(), 1);
        assert_eq!(session.char_state(0), Some(CharState::Incorrect));
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_tick_before_start_is_rejected() {
        let mut session = TypingSession::new("abc").unwrap();

        assert_matches!(
            session.on_tick(),
            Err(SessionError::InvalidState {
                op: "tick",
                state: SessionState::Idle
            })
        );
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[test]
    fn test_tick_after_finish_is_rejected() {
        let mut session = TypingSession::new("ab").unwrap();
        type_str(&mut session, "ab");

        assert_matches!(
            session.on_tick(),
            Err(SessionError::InvalidState {
                state: SessionState::Finished,
                ..
            })
        );
    }

    #[test]
    fn test_tick_counts_seconds() {
        let mut session = TypingSession::new("abc").unwrap();
        session.on_character('a').unwrap();

        tick_n(&mut session, 3);

        assert_eq!(session.elapsed_seconds(), 3);
        assert!(session.is_running());
    }

    #[test]
    fn test_time_limit_finishes_session() {
        let mut session = TypingSession::with_time_limit("abcdef", Some(2)).unwrap();
        session.on_character('a').unwrap();

        session.on_tick().unwrap();
        assert_eq!(session.seconds_remaining(), Some(1));
        assert!(session.is_running());

        session.on_tick().unwrap();
        assert_eq!(session.seconds_remaining(), Some(0));
        assert!(session.is_finished());
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_character_after_time_limit_is_invalid_state() {
        let mut session = TypingSession::with_time_limit("abcdef", Some(1)).unwrap();
        session.on_character('a').unwrap();
        session.on_tick().unwrap();

        assert_matches!(
            session.on_character('b'),
            Err(SessionError::InvalidState {
                op: "character",
                state: SessionState::Finished
            })
        );
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn test_character_past_end_is_out_of_range() {
        let mut session = TypingSession::new("ab").unwrap();
        type_str(&mut session, "ab");
        let before = session.clone();

        assert_matches!(
            session.on_character('c'),
            Err(SessionError::OutOfRange { cursor: 2, len: 2 })
        );
        assert_eq!(session.state(), before.state());
        assert_eq!(session.cursor(), before.cursor());
        assert_eq!(session.error_count(), before.error_count());
    }

    #[test]
    fn test_backspace_after_correct_keystroke() {
        let mut session = TypingSession::new("abc").unwrap();
        session.on_character('x').unwrap();
        let errors_before = session.error_count();

        session.on_character('b').unwrap();
        session.on_backspace().unwrap();

        assert_eq!(session.error_count(), errors_before);
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.char_state(1), Some(CharState::Untouched));
    }

    #[test]
    fn test_backspace_after_incorrect_keystroke() {
        let mut session = TypingSession::new("abc").unwrap();
        session.on_character('a').unwrap();
        session.on_character('x').unwrap();
        assert_eq!(session.error_count(), 1);

        session.on_backspace().unwrap();

        assert_eq!(session.error_count(), 0);
        assert_eq!(session.char_state(1), Some(CharState::Untouched));
    }

    #[test]
    fn test_backspace_at_start_is_rejected() {
        let mut session = TypingSession::new("abc").unwrap();
        assert_matches!(
            session.on_backspace(),
            Err(SessionError::InvalidState { op: "backspace", .. })
        );

        session.on_character('a').unwrap();
        session.on_backspace().unwrap();
        assert_matches!(
            session.on_backspace(),
            Err(SessionError::InvalidState {
                op: "backspace",
                state: SessionState::Running
            })
        );
        assert_eq!(session.cursor(), 0);
        assert!(session.is_running());
    }

    #[test]
    fn test_backspace_after_finish_is_rejected() {
        let mut session = TypingSession::new("ab").unwrap();
        type_str(&mut session, "ab");

        assert!(session.on_backspace().is_err());
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn test_retyped_character_counts_once() {
        let mut session = TypingSession::new("abcde").unwrap();
        session.on_character('x').unwrap();
        session.on_backspace().unwrap();
        type_str(&mut session, "abcde");

        assert_eq!(session.error_count(), 0);
        assert_eq!(session.current_accuracy(), 100);
    }

    #[test]
    fn test_accuracy_getter() {
        let mut session = TypingSession::new("abcdefghijkl").unwrap();
        assert_eq!(session.current_accuracy(), 0);

        type_str(&mut session, "abcdefghXX");

        assert_eq!(session.cursor(), 10);
        assert_eq!(session.error_count(), 2);
        assert_eq!(session.current_accuracy(), 80);
    }

    #[test]
    fn test_wpm_is_zero_without_ticks() {
        let mut session = TypingSession::new("abcdefgh").unwrap();
        type_str(&mut session, "abcdefg");

        assert_eq!(session.current_wpm(), 0);
    }

    #[test]
    fn test_all_correct_in_a_minute() {
        let mut session = TypingSession::new("abcde").unwrap();
        session.on_character('a').unwrap();
        tick_n(&mut session, 60);
        type_str(&mut session, "bcde");

        let score = session.finalize().unwrap();
        assert_eq!(score, Score { wpm: 1, accuracy: 100 });
    }

    #[test]
    fn test_one_error_in_half_a_minute() {
        let mut session = TypingSession::new("abcde").unwrap();
        session.on_character('a').unwrap();
        tick_n(&mut session, 30);
        type_str(&mut session, "bxde");

        assert_eq!(session.error_count(), 1);
        let score = session.finalize().unwrap();
        assert_eq!(score, Score { wpm: 2, accuracy: 80 });
    }

    #[test]
    fn test_finalize_requires_finished() {
        let mut session = TypingSession::new("abc").unwrap();
        assert_matches!(
            session.finalize(),
            Err(SessionError::InvalidState { op: "finalize", .. })
        );

        session.on_character('a').unwrap();
        assert!(session.finalize().is_err());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut session = TypingSession::new("abc").unwrap();
        session.on_character('a').unwrap();
        session.on_tick().unwrap();
        type_str(&mut session, "bc");

        let first = session.finalize().unwrap();
        let second = session.finalize().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SessionError::EmptyTarget.to_string(), "target text is empty");
        assert_eq!(
            SessionError::InvalidState {
                op: "tick",
                state: SessionState::Idle
            }
            .to_string(),
            "tick is not allowed while the session is Idle"
        );
        assert_eq!(
            SessionError::OutOfRange { cursor: 3, len: 3 }.to_string(),
            "cursor 3 is already at the end of a 3 character text"
        );
    }
}
