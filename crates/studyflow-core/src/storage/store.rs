//! JSON-file task and block store.
//!
//! The planner itself never persists anything; this is the snapshot store
//! the CLI loads from and merges results back into. Layout under the data
//! directory:
//!
//! - `tasks.json`: every task with its sessions
//! - `blocks.json`: weekly unavailable blocks
//! - `meta.json`: bookkeeping such as the last urgency refresh day

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::availability::{UnavailableTimeBlock, WeeklyAvailability};
use crate::error::Result;
use crate::task::{PomodoroSession, Task};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    #[serde(default)]
    pub last_urgency_refresh: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at [`data_dir`].
    pub fn open() -> Result<Self> {
        Ok(Self::new(data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        self.read("tasks.json")
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write("tasks.json", &tasks)
    }

    /// Replace the task with the same id, or append it.
    pub fn upsert_task(&self, task: &Task) -> Result<()> {
        let mut tasks = self.load_tasks()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => tasks.push(task.clone()),
        }
        self.save_tasks(&tasks)
    }

    /// Remove a task (and with it, its sessions). Returns it if it existed.
    pub fn remove_task(&self, id: &str) -> Result<Option<Task>> {
        let mut tasks = self.load_tasks()?;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let removed = tasks.remove(index);
        self.save_tasks(&tasks)?;
        Ok(Some(removed))
    }

    /// Sessions of every task except `exclude`.
    pub fn occupied_sessions(&self, exclude: Option<&str>) -> Result<Vec<PomodoroSession>> {
        Ok(self
            .load_tasks()?
            .into_iter()
            .filter(|t| Some(t.id.as_str()) != exclude)
            .flat_map(|t| t.sessions)
            .collect())
    }

    /// Blocks are re-validated on load.
    pub fn load_blocks(&self) -> Result<WeeklyAvailability> {
        let blocks: Vec<UnavailableTimeBlock> = self.read("blocks.json")?;
        Ok(WeeklyAvailability::from_blocks(blocks)?)
    }

    pub fn save_blocks(&self, availability: &WeeklyAvailability) -> Result<()> {
        self.write("blocks.json", &availability.blocks())
    }

    pub fn load_meta(&self) -> Result<StoreMeta> {
        self.read("meta.json")
    }

    pub fn save_meta(&self, meta: &StoreMeta) -> Result<()> {
        self.write("meta.json", meta)
    }

    fn read<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        match std::fs::read_to_string(self.dir.join(name)) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    // Sibling temp file, then rename over the target.
    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
