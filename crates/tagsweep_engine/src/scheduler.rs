use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use sweep_logging::{sweep_debug, sweep_info, sweep_warn};
use tagsweep_core::{partition, DedupTracker, Item, Stats};
use tokio::sync::mpsc;

use crate::{CheckOutcome, ItemOutcome, ItemReport, PageAdapter, RetryController, SweepEvent};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: SweepEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<SweepEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<SweepEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: SweepEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: SweepEvent) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// Another run was active; nothing was dispatched.
    Busy,
    Completed(Vec<ItemReport>),
}

/// Splits items into fixed-size batches and checks each batch concurrently.
///
/// Batches run strictly in sequence with `inter_batch_delay` between them.
/// Runs are non-reentrant.
pub struct BatchScheduler {
    controller: RetryController,
    batch_size: usize,
    inter_batch_delay: Duration,
    busy: AtomicBool,
}

impl BatchScheduler {
    pub fn new(controller: RetryController, batch_size: usize, inter_batch_delay: Duration) -> Self {
        Self {
            controller,
            batch_size: batch_size.max(1),
            inter_batch_delay,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Check every item, hide the matches on `page`, and fold the outcomes into `stats`.
    ///
    /// Ids already seen are dropped before batching, so every batch but the
    /// last is full. The rest are marked in `dedup` as their batch is entered.
    pub async fn run(
        &self,
        items: Vec<Item>,
        dedup: &mut DedupTracker,
        stats: &mut Stats,
        page: &dyn PageAdapter,
        sink: &dyn ProgressSink,
    ) -> RunResult {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            sweep_debug!("Batch run already active; skipping");
            return RunResult::Busy;
        };

        let fresh = dedup.unseen(items);
        if fresh.is_empty() {
            sweep_debug!("Nothing new to check");
            return RunResult::Completed(Vec::new());
        }
        let batches = partition(fresh, self.batch_size);
        let total = batches.len();
        let mut reports = Vec::new();

        for batch in batches {
            let entering: Vec<Item> = batch
                .items
                .into_iter()
                .filter(|item| dedup.mark_seen(&item.id))
                .collect();
            sweep_info!(
                "Processing batch {}/{} ({} items)",
                batch.index + 1,
                total,
                entering.len()
            );
            sink.emit(SweepEvent::BatchStarted {
                index: batch.index,
                total,
                size: entering.len(),
            });

            let outcomes = join_all(
                entering
                    .iter()
                    .map(|item| self.controller.check_with_retry(item.url())),
            )
            .await;

            for (item, check) in entering.into_iter().zip(outcomes) {
                reports.push(settle(item, check, stats, page, sink));
            }
            sink.emit(SweepEvent::BatchSettled {
                index: batch.index,
                total,
            });

            if batch.index + 1 < total {
                sweep_debug!("Waiting {:?} before next batch", self.inter_batch_delay);
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        RunResult::Completed(reports)
    }
}

fn settle(
    item: Item,
    check: CheckOutcome,
    stats: &mut Stats,
    page: &dyn PageAdapter,
    sink: &dyn ProgressSink,
) -> ItemReport {
    let outcome = match check.failure {
        Some(err) => {
            stats.record_error();
            ItemOutcome::FailedOpen(err)
        }
        None => {
            stats.record_checked();
            if check.matches && page.hide(&item) {
                stats.record_removed();
                sweep_info!("Hid '{}' by {} ({})", item.title, item.artist, item.id);
                sink.emit(SweepEvent::ItemHidden {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    artist: item.artist.clone(),
                });
                ItemOutcome::Removed
            } else {
                if check.matches {
                    sweep_warn!("No container to hide for {}", item.id);
                }
                ItemOutcome::Kept
            }
        }
    };
    ItemReport {
        item,
        outcome,
        attempts: check.attempts,
    }
}

struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
