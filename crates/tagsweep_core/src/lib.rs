//! Tagsweep core: pure domain types and the change-trigger state machine.
mod batch;
mod dedup;
mod effect;
mod item;
mod msg;
mod retry;
mod settings;
mod state;
mod stats;
mod update;

pub use batch::{partition, Batch};
pub use dedup::DedupTracker;
pub use effect::{Effect, TimerKind, TriggerSource};
pub use item::{canonicalize_item_url, ContainerId, Item, ItemId, ITEM_PATH_MARKER};
pub use msg::{Msg, ScrollMetrics};
pub use retry::{AttemptState, FailureSignal, RetryPolicy, RetryTracker};
pub use settings::Settings;
pub use state::TriggerState;
pub use stats::{Stats, StatsCheckpoint};
pub use update::update;
