use std::sync::Arc;

use sweep_logging::{sweep_debug, sweep_error, sweep_info, sweep_warn};
use tagsweep_core::{
    update, DedupTracker, Effect, Msg, RetryPolicy, ScrollMetrics, Settings, Stats,
    StatsCheckpoint, TriggerSource, TriggerState,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    BatchScheduler, ItemOutcome, PageAdapter, PageClassifier, PassReport, ProgressSink,
    RetryController, RunResult, Store, SweepEvent,
};

/// Pending scan requests beyond this are collapsed into the ones already queued.
const SCAN_QUEUE_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy)]
struct ScanRequest {
    source: TriggerSource,
}

/// Handle to a running sweep: a trigger driver task producing scan requests
/// and a single scan consumer task that owns the scheduler, the dedup set and
/// the session stats.
pub struct SweepHandle {
    msg_tx: mpsc::UnboundedSender<Msg>,
    settings_tx: watch::Sender<Settings>,
    cancel: CancellationToken,
    driver: JoinHandle<()>,
    consumer: JoinHandle<Stats>,
}

impl SweepHandle {
    pub fn spawn(
        settings: Settings,
        classifier: Arc<dyn PageClassifier>,
        page: Arc<dyn PageAdapter>,
        store: Arc<dyn Store>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let settings = settings.normalized();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (scan_tx, scan_rx) = mpsc::channel(SCAN_QUEUE_CAPACITY);
        let (settings_tx, settings_rx) = watch::channel(settings.clone());
        let cancel = CancellationToken::new();

        let consumer = ScanConsumer {
            scheduler: scheduler_for(&classifier, &settings),
            classifier,
            settings_rx,
            page,
            store,
            sink,
            dedup: DedupTracker::new(),
            stats: Stats::default(),
            checkpoint: StatsCheckpoint::default(),
            msg_tx: msg_tx.clone(),
        };
        let driver = TriggerDriver {
            state: TriggerState::new(&settings),
            periodic: settings.periodic_interval(),
            msg_tx: msg_tx.clone(),
            scan_tx,
        };

        let consumer = tokio::spawn(consumer.run(scan_rx, cancel.clone()));
        let driver = tokio::spawn(driver.run(msg_rx, cancel.clone()));

        Self {
            msg_tx,
            settings_tx,
            cancel,
            driver,
            consumer,
        }
    }

    pub fn page_ready(&self) {
        self.send(Msg::PageReady);
    }

    pub fn scrolled(&self, metrics: ScrollMetrics) {
        self.send(Msg::Scrolled(metrics));
    }

    pub fn content_added(&self, item_links: usize) {
        self.send(Msg::ContentAdded { item_links });
    }

    pub fn scan_now(&self) {
        self.send(Msg::ScanNowRequested);
    }

    /// Trigger fields apply at once; batching and retry fields from the next pass.
    pub fn update_settings(&self, settings: Settings) {
        let settings = settings.normalized();
        let _ = self.settings_tx.send(settings.clone());
        self.send(Msg::SettingsChanged(settings));
    }

    /// Stop both tasks, flush the stats checkpoint, and return the session stats.
    pub async fn shutdown(self) -> Stats {
        self.cancel.cancel();
        if let Err(err) = self.driver.await {
            sweep_error!("Trigger driver ended abnormally: {}", err);
        }
        match self.consumer.await {
            Ok(stats) => stats,
            Err(err) => {
                sweep_error!("Scan consumer ended abnormally: {}", err);
                Stats::default()
            }
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}

struct TriggerDriver {
    state: TriggerState,
    periodic: std::time::Duration,
    msg_tx: mpsc::UnboundedSender<Msg>,
    scan_tx: mpsc::Sender<ScanRequest>,
}

impl TriggerDriver {
    async fn run(mut self, mut msg_rx: mpsc::UnboundedReceiver<Msg>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.periodic, self.periodic);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => Msg::PeriodicTick,
                received = msg_rx.recv() => match received {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let (next, effects) = update(self.state, msg);
            self.state = next;
            for effect in effects {
                self.execute(effect, &cancel);
            }
        }
        sweep_debug!("Trigger driver stopped");
    }

    fn execute(&self, effect: Effect, cancel: &CancellationToken) {
        match effect {
            Effect::ArmTimer {
                timer,
                generation,
                delay,
            } => {
                let msg_tx = self.msg_tx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            let _ = msg_tx.send(Msg::TimerElapsed { timer, generation });
                        }
                    }
                });
            }
            Effect::RequestScan { source } => {
                if self.scan_tx.try_send(ScanRequest { source }).is_err() {
                    sweep_debug!("Scan queue full; {:?} request collapsed", source);
                }
            }
        }
    }
}

struct ScanConsumer {
    scheduler: BatchScheduler,
    classifier: Arc<dyn PageClassifier>,
    settings_rx: watch::Receiver<Settings>,
    page: Arc<dyn PageAdapter>,
    store: Arc<dyn Store>,
    sink: Arc<dyn ProgressSink>,
    dedup: DedupTracker,
    stats: Stats,
    checkpoint: StatsCheckpoint,
    msg_tx: mpsc::UnboundedSender<Msg>,
}

impl ScanConsumer {
    async fn run(mut self, mut scan_rx: mpsc::Receiver<ScanRequest>, cancel: CancellationToken) -> Stats {
        loop {
            let request = tokio::select! {
                _ = cancel.cancelled() => break,
                received = scan_rx.recv() => match received {
                    Some(request) => request,
                    None => break,
                },
            };
            let collapsed = drain(&mut scan_rx);
            if collapsed > 0 {
                sweep_debug!("Collapsed {} queued scan requests", collapsed);
            }

            self.refresh_scheduler();
            let _ = self.msg_tx.send(Msg::ScanStarted);
            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = self.pass(request.source) => false,
            };
            self.flush_stats();
            if !cancelled {
                let discarded = drain(&mut scan_rx);
                if discarded > 0 {
                    sweep_debug!("Dropped {} scan requests raised during the pass", discarded);
                }
            }
            // Requests raised after this point start the next pass.
            let _ = self.msg_tx.send(Msg::ScanFinished);
            if cancelled {
                sweep_info!("Sweep cancelled mid-pass");
                break;
            }
        }

        self.flush_stats();
        self.stats
    }

    fn refresh_scheduler(&mut self) {
        if !matches!(self.settings_rx.has_changed(), Ok(true)) {
            return;
        }
        let settings = self.settings_rx.borrow_and_update().clone();
        sweep_debug!(
            "Applying settings: batch size {}, {} retries",
            settings.batch_size,
            settings.max_retries
        );
        self.scheduler = scheduler_for(&self.classifier, &settings);
    }

    async fn pass(&mut self, source: TriggerSource) {
        let discovered = self.page.discover_items();
        let fresh = self.dedup.unseen(discovered.iter().cloned());
        sweep_info!(
            "Scan ({:?}): {} items on page, {} new",
            source,
            discovered.len(),
            fresh.len()
        );

        let mut report = PassReport {
            discovered: discovered.len(),
            ..PassReport::default()
        };
        if !fresh.is_empty() {
            self.sink.emit(SweepEvent::PassStarted {
                source,
                items: fresh.len(),
            });
            let run = self
                .scheduler
                .run(
                    fresh,
                    &mut self.dedup,
                    &mut self.stats,
                    self.page.as_ref(),
                    self.sink.as_ref(),
                )
                .await;
            match run {
                RunResult::Busy => sweep_warn!("Scheduler busy; scan skipped"),
                RunResult::Completed(items) => {
                    report.dispatched = items.len();
                    for item in &items {
                        match item.outcome {
                            ItemOutcome::Removed => report.removed += 1,
                            ItemOutcome::FailedOpen(_) => report.failed += 1,
                            ItemOutcome::Kept => {}
                        }
                    }
                }
            }
        }

        report.stats = self.stats;
        sweep_info!(
            "Scan complete: {} removed, {} checked, {} errors this session",
            self.stats.total_removed,
            self.stats.total_checked,
            self.stats.errors
        );
        self.sink.emit(SweepEvent::PassFinished { source, report });
    }

    fn flush_stats(&mut self) {
        let pending = self.checkpoint.pending(&self.stats);
        if pending.is_zero() {
            return;
        }
        match self.store.add_stats(&pending) {
            Ok(totals) => {
                self.checkpoint.commit(&self.stats);
                sweep_debug!("Stats checkpoint stored; totals now {:?}", totals);
            }
            Err(err) => sweep_error!("Failed to store stats checkpoint: {}", err),
        }
    }
}

fn scheduler_for(classifier: &Arc<dyn PageClassifier>, settings: &Settings) -> BatchScheduler {
    let controller = RetryController::new(classifier.clone(), RetryPolicy::from_settings(settings));
    BatchScheduler::new(controller, settings.batch_size, settings.check_delay())
}

fn drain(scan_rx: &mut mpsc::Receiver<ScanRequest>) -> usize {
    let mut drained = 0;
    while scan_rx.try_recv().is_ok() {
        drained += 1;
    }
    drained
}
