use crate::{Settings, TimerKind};

/// Viewport position reported with every scroll event, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_y: u64,
    pub viewport_height: u64,
    pub document_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The page finished loading; arms the initial scan.
    PageReady,
    /// The user scrolled.
    Scrolled(ScrollMetrics),
    /// Structural additions were observed in the watched content region.
    ContentAdded { item_links: usize },
    /// A timer armed by [`crate::Effect::ArmTimer`] fired.
    TimerElapsed { timer: TimerKind, generation: u64 },
    /// Fallback interval tick.
    PeriodicTick,
    /// Explicit scan request from the user.
    ScanNowRequested,
    /// The scan consumer started a pass.
    ScanStarted,
    /// The scan consumer finished a pass.
    ScanFinished,
    SettingsChanged(Settings),
}
