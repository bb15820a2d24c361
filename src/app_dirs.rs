use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typequote";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/typequote`, or the platform data dir when HOME is unset
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("typequote.log"))
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typequote_config.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_in_state_dir() {
        if let Some(state) = AppDirs::state_dir() {
            assert_eq!(AppDirs::db_path().unwrap(), state.join("history.db"));
            assert_eq!(AppDirs::log_path().unwrap(), state.join("typequote.log"));
        }
    }

    #[test]
    fn test_config_path_file_name() {
        assert!(AppDirs::config_path().ends_with("config.json"));
    }
}
