#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tagsweep_core::{ContainerId, Item, ItemId};
use tagsweep_engine::{Classification, ClassifyError, PageAdapter, PageClassifier, ProgressSink, SweepEvent};
use tokio::time::Instant;

pub fn init_logging() {
    sweep_logging::initialize_for_tests();
}

pub fn item(n: usize) -> Item {
    Item {
        id: ItemId::new(format!("https://artist{n}.bandcamp.com/album/record-{n}")),
        title: format!("Record {n}"),
        artist: format!("Artist {n}"),
        container: n,
    }
}

pub fn items(count: usize) -> Vec<Item> {
    (0..count).map(item).collect()
}

/// Classifier with per-url scripted answers; unscripted urls answer `default_match`.
pub struct ScriptedClassifier {
    script: Mutex<HashMap<String, VecDeque<Result<bool, ClassifyError>>>>,
    default_match: bool,
    latency: Duration,
    calls: Mutex<Vec<(String, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(default_match: bool) -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            default_match,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(self, url: &str, answers: Vec<Result<bool, ClassifyError>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), answers.into());
        self
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PageClassifier for ScriptedClassifier {
    async fn classify(&self, url: &str) -> Result<Classification, ClassifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let answer = self
            .script
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|answers| answers.pop_front())
            .unwrap_or(Ok(self.default_match));
        answer.map(|matches| Classification {
            url: url.to_string(),
            matches,
        })
    }
}

#[derive(Default)]
pub struct FakePage {
    items: Mutex<Vec<Item>>,
    hidden: Mutex<HashSet<ContainerId>>,
}

impl FakePage {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            hidden: Mutex::new(HashSet::new()),
        }
    }

    pub fn push(&self, more: Vec<Item>) {
        self.items.lock().unwrap().extend(more);
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.lock().unwrap().len()
    }
}

impl PageAdapter for FakePage {
    fn discover_items(&self) -> Vec<Item> {
        self.items.lock().unwrap().clone()
    }

    fn hide(&self, item: &Item) -> bool {
        self.hidden.lock().unwrap().insert(item.container);
        true
    }

    fn is_hidden(&self, container: ContainerId) -> bool {
        self.hidden.lock().unwrap().contains(&container)
    }
}

#[derive(Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SweepEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<SweepEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: SweepEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Paused-clock timings land on millisecond ticks; allow for that rounding.
pub fn assert_close(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(5);
    assert!(
        actual >= expected && actual <= expected + slack,
        "expected ~{expected:?}, got {actual:?}"
    );
}
