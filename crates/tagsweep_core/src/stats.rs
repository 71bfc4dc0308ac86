use serde::{Deserialize, Serialize};

/// Session counters. Only ever increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_checked: u64,
    pub total_removed: u64,
    pub errors: u64,
}

impl Stats {
    pub fn record_checked(&mut self) {
        self.total_checked = self.total_checked.saturating_add(1);
    }

    pub fn record_removed(&mut self) {
        self.total_removed = self.total_removed.saturating_add(1);
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    pub fn merge(&mut self, other: &Stats) {
        self.total_checked = self.total_checked.saturating_add(other.total_checked);
        self.total_removed = self.total_removed.saturating_add(other.total_removed);
        self.errors = self.errors.saturating_add(other.errors);
    }

    /// Counts accumulated since `earlier`.
    pub fn delta_since(&self, earlier: &Stats) -> Stats {
        Stats {
            total_checked: self.total_checked.saturating_sub(earlier.total_checked),
            total_removed: self.total_removed.saturating_sub(earlier.total_removed),
            errors: self.errors.saturating_sub(earlier.errors),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Stats::default()
    }
}

/// Tracks what part of the session stats already reached the persistent store.
///
/// Flushing only the pending delta keeps repeated checkpoints idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsCheckpoint {
    flushed: Stats,
}

impl StatsCheckpoint {
    pub fn pending(&self, current: &Stats) -> Stats {
        current.delta_since(&self.flushed)
    }

    /// Call once the pending delta has been stored.
    pub fn commit(&mut self, current: &Stats) {
        self.flushed = *current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_yields_each_count_once() {
        let mut session = Stats::default();
        let mut checkpoint = StatsCheckpoint::default();
        session.record_checked();
        session.record_checked();
        session.record_removed();

        let first = checkpoint.pending(&session);
        assert_eq!(first.total_checked, 2);
        assert_eq!(first.total_removed, 1);
        checkpoint.commit(&session);
        assert!(checkpoint.pending(&session).is_zero());

        session.record_error();
        let second = checkpoint.pending(&session);
        assert_eq!(
            second,
            Stats {
                total_checked: 0,
                total_removed: 0,
                errors: 1
            }
        );
    }
}
