//! Run description for the sweep binary, read from `./tagsweep.ron`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sweep_logging::LogDestination;

pub const RUN_FILENAME: &str = "tagsweep.ron";
pub const DISCOVER_URL: &str = "https://bandcamp.com/discover";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSource {
    Url(String),
    /// Saved page; links resolve against `RunConfig::base_url`.
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub page: PageSource,
    pub base_url: Option<String>,
    pub state_dir: PathBuf,
    /// Fragments appended one per finished pass, standing in for infinite scroll.
    pub more: Vec<PathBuf>,
    pub log: LogTarget,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            page: PageSource::Url(DISCOVER_URL.to_string()),
            base_url: None,
            state_dir: PathBuf::from(".tagsweep"),
            more: Vec::new(),
            log: LogTarget::Terminal,
        }
    }
}

impl RunConfig {
    /// Missing file means defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        };
        ron::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn base_url(&self) -> &str {
        match (&self.page, &self.base_url) {
            (_, Some(base)) => base,
            (PageSource::Url(url), None) => url,
            (PageSource::File(_), None) => DISCOVER_URL,
        }
    }
}
