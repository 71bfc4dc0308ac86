use std::time::Duration;

use crate::{Settings, TimerKind};

/// Change-trigger state: debounce bookkeeping plus the scanning flag fed back
/// by the scan consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerState {
    enabled: bool,
    scroll_debounce: Duration,
    initial_delay: Duration,
    near_bottom_px: u64,
    last_scroll_y: u64,
    scrolling: bool,
    scanning: bool,
    scroll_generation: u64,
    mutation_generation: u64,
}

impl Default for TriggerState {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl TriggerState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            enabled: settings.enabled,
            scroll_debounce: settings.scroll_debounce(),
            initial_delay: settings.initial_delay(),
            near_bottom_px: settings.near_bottom_px,
            last_scroll_y: 0,
            scrolling: false,
            scanning: false,
            scroll_generation: 0,
            mutation_generation: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    pub(crate) fn apply_settings(&mut self, settings: &Settings) {
        self.enabled = settings.enabled;
        self.scroll_debounce = settings.scroll_debounce();
        self.initial_delay = settings.initial_delay();
        self.near_bottom_px = settings.near_bottom_px;
    }

    pub(crate) fn scroll_debounce(&self) -> Duration {
        self.scroll_debounce
    }

    pub(crate) fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub(crate) fn near_bottom_px(&self) -> u64 {
        self.near_bottom_px
    }

    /// Records the new position; returns whether the move was downward.
    pub(crate) fn record_scroll(&mut self, scroll_y: u64) -> bool {
        let downward = scroll_y > self.last_scroll_y;
        self.last_scroll_y = scroll_y;
        self.scrolling = true;
        downward
    }

    pub(crate) fn set_scrolling(&mut self, scrolling: bool) {
        self.scrolling = scrolling;
    }

    pub(crate) fn set_scanning(&mut self, scanning: bool) {
        self.scanning = scanning;
    }

    /// Supersede any pending timer of this kind and return the new generation.
    pub(crate) fn bump_generation(&mut self, timer: TimerKind) -> u64 {
        match timer {
            TimerKind::ScrollProximity | TimerKind::ScrollSettle => {
                self.scroll_generation += 1;
                self.scroll_generation
            }
            TimerKind::Mutation => {
                self.mutation_generation += 1;
                self.mutation_generation
            }
            TimerKind::Initial => 0,
        }
    }

    pub(crate) fn is_current(&self, timer: TimerKind, generation: u64) -> bool {
        match timer {
            TimerKind::ScrollProximity | TimerKind::ScrollSettle => {
                generation == self.scroll_generation
            }
            TimerKind::Mutation => generation == self.mutation_generation,
            TimerKind::Initial => true,
        }
    }
}
