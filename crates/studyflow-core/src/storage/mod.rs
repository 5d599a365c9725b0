mod config;
pub mod store;

pub use config::{
    parse_clock_time, AutoScheduleSection, Config, DailySection, PackerSection, PomodoroConfig,
    PrioritySection,
};
pub use store::{JsonStore, StoreMeta};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/studyflow/`, or `$STUDYFLOW_HOME` when set.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYFLOW_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("studyflow"),
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
