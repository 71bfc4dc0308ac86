use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Flat, process-wide configuration record.
///
/// Serialized with camelCase keys. Missing keys fall back to [`Settings::default`],
/// unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    /// Delay between batches.
    pub check_delay_ms: u64,
    pub scroll_debounce_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub batch_size: usize,
    pub debug_mode: bool,
    /// Politeness delay before every outbound request.
    pub request_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub retry_base_delay_ms: u64,
    pub rate_limit_delay_ms: u64,
    pub initial_delay_ms: u64,
    pub periodic_interval_ms: u64,
    pub near_bottom_px: u64,
    pub target_tag: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            check_delay_ms: 1_000,
            scroll_debounce_ms: 2_000,
            max_retries: 2,
            batch_size: 4,
            debug_mode: false,
            request_delay_ms: 2_000,
            request_timeout_ms: 15_000,
            retry_base_delay_ms: 2_000,
            rate_limit_delay_ms: 30_000,
            initial_delay_ms: 2_000,
            periodic_interval_ms: 60_000,
            near_bottom_px: 1_000,
            target_tag: "dungeon synth".to_string(),
        }
    }
}

impl Settings {
    /// Clamp values that would stall the pipeline.
    pub fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.periodic_interval_ms = self.periodic_interval_ms.max(1);
        if self.target_tag.trim().is_empty() {
            self.target_tag = Settings::default().target_tag;
        }
        self
    }

    pub fn check_delay(&self) -> Duration {
        Duration::from_millis(self.check_delay_ms)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn periodic_interval(&self) -> Duration {
        Duration::from_millis(self.periodic_interval_ms)
    }
}
