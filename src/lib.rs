// Library surface for headless/integration tests and reuse.
// Terminal rendering stays in the binary (main.rs, ui.rs).
pub mod action;
pub mod app_dirs;
pub mod config;
pub mod history;
pub mod log;
pub mod provider;
pub mod round;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod time_series;

pub use session::{CharState, Score, SessionError, SessionState, TypingSession};
