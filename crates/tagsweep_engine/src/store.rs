use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sweep_logging::sweep_debug;
use tagsweep_core::{Settings, Stats};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "settings.ron";
pub const STATS_FILENAME: &str = "stats.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize {what}: {message}")]
    Serialize { what: &'static str, message: String },
    #[error("failed to parse {path:?}: {message}")]
    Deserialize { path: PathBuf, message: String },
}

/// Key-value persistence for settings and aggregate stats.
pub trait Store: Send + Sync {
    /// Stored settings, or defaults when nothing was saved yet.
    fn load_settings(&self) -> Result<Settings, StoreError>;
    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError>;
    fn load_stats(&self) -> Result<Stats, StoreError>;
    /// Add `delta` to the stored totals and return the new totals.
    fn add_stats(&self, delta: &Stats) -> Result<Stats, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedStats {
    totals: Stats,
    updated_utc: Option<String>,
}

/// RON files in a state directory, replaced atomically on every write.
pub struct RonStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl RonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned + Default>(&self, filename: &str) -> Result<T, StoreError> {
        let path = self.dir.join(filename);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(err) => return Err(err.into()),
        };
        ron::from_str(&content).map_err(|err| StoreError::Deserialize {
            path,
            message: err.to_string(),
        })
    }

    fn write<T: Serialize>(&self, filename: &str, what: &'static str, value: &T) -> Result<(), StoreError> {
        let content = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::new()).map_err(
            |err| StoreError::Serialize {
                what,
                message: err.to_string(),
            },
        )?;
        write_atomically(&self.dir, filename, &content)?;
        sweep_debug!("Wrote {} to {:?}", what, self.dir.join(filename));
        Ok(())
    }
}

impl Store for RonStore {
    fn load_settings(&self) -> Result<Settings, StoreError> {
        self.read::<Settings>(SETTINGS_FILENAME)
            .map(Settings::normalized)
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let _guard = lock(&self.write_lock);
        self.write(SETTINGS_FILENAME, "settings", settings)
    }

    fn load_stats(&self) -> Result<Stats, StoreError> {
        self.read::<PersistedStats>(STATS_FILENAME)
            .map(|persisted| persisted.totals)
    }

    fn add_stats(&self, delta: &Stats) -> Result<Stats, StoreError> {
        let _guard = lock(&self.write_lock);
        let mut persisted = self.read::<PersistedStats>(STATS_FILENAME)?;
        persisted.totals.merge(delta);
        persisted.updated_utc = Some(Utc::now().to_rfc3339());
        self.write(STATS_FILENAME, "stats", &persisted)?;
        Ok(persisted.totals)
    }
}

/// Create `dir` if needed.
fn ensure_state_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        if !fs::metadata(dir)?.is_dir() {
            return Err(StoreError::StateDir(format!("{dir:?} is not a directory")));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// Write to a temp file in `dir`, sync it, then rename over `{dir}/{filename}`.
fn write_atomically(dir: &Path, filename: &str, content: &str) -> Result<(), StoreError> {
    ensure_state_dir(dir)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::StateDir(e.to_string()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(dir.join(filename))
        .map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// In-memory store for tests and embedders without a state directory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Option<Settings>>,
    stats: Mutex<Stats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            stats: Mutex::new(Stats::default()),
        }
    }
}

impl Store for MemoryStore {
    fn load_settings(&self) -> Result<Settings, StoreError> {
        Ok(lock(&self.settings).clone().unwrap_or_default())
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        *lock(&self.settings) = Some(settings.clone());
        Ok(())
    }

    fn load_stats(&self) -> Result<Stats, StoreError> {
        Ok(*lock(&self.stats))
    }

    fn add_stats(&self, delta: &Stats) -> Result<Stats, StoreError> {
        let mut stats = lock(&self.stats);
        stats.merge(delta);
        Ok(*stats)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
