use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{SettingsFile, Task, TasksFile};

const DATA_FILE: &str = "data.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Current file layout, or the bare array the web build kept in localStorage.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StoredTasks {
    Versioned(TasksFile),
    Legacy(Vec<Task>),
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let stored: StoredTasks = self.load_json(self.root.join(DATA_FILE))?;
        Ok(match stored {
            StoredTasks::Versioned(file) => file.tasks,
            StoredTasks::Legacy(tasks) => {
                log::info!("loaded legacy task array count={}", tasks.len());
                tasks
            }
        })
    }

    /// Missing file means a fresh install; unreadable content is moved aside so
    /// the next save does not overwrite it. Either way the list starts empty.
    pub fn load_tasks_or_empty(&self) -> Vec<Task> {
        match self.load_tasks() {
            Ok(tasks) => tasks,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => {
                log::warn!("saved tasks unreadable, starting empty: {err}");
                match self.quarantine_data_file() {
                    Ok(path) => log::warn!("moved unreadable tasks to {}", path.display()),
                    Err(move_err) => log::error!("failed to move unreadable tasks: {move_err}"),
                }
                Vec::new()
            }
        }
    }

    pub fn load_settings(&self) -> Result<SettingsFile, StorageError> {
        self.load_json(self.root.join(SETTINGS_FILE))
    }

    pub fn save_tasks(&self, data: &TasksFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(DATA_FILE), data)
    }

    pub fn save_settings(&self, data: &SettingsFile) -> Result<(), StorageError> {
        self.write_atomic(self.root.join(SETTINGS_FILE), data)
    }

    fn load_json<T: DeserializeOwned>(&self, path: PathBuf) -> Result<T, StorageError> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    fn write_atomic<T: Serialize>(&self, path: PathBuf, data: &T) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(data)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }

    fn quarantine_data_file(&self) -> Result<PathBuf, StorageError> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let target = self.root.join(format!("data.corrupt-{timestamp}.json"));
        fs::rename(self.root.join(DATA_FILE), &target)?;
        Ok(target)
    }
}
