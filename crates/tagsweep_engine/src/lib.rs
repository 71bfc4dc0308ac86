//! Tagsweep engine: fetch proxy, retry/backoff, batch scheduling and the sweep runtime.
mod classify;
mod decode;
mod fetch;
mod messaging;
mod page;
mod retry;
mod scheduler;
mod store;
mod sweeper;
mod types;

pub use classify::TagMatcher;
pub use decode::decode_body;
pub use fetch::{FetchSettings, PageClassifier, ReqwestClassifier};
pub use messaging::{Coordinator, MessageError, MessagingClassifier, Request, Response};
pub use page::{HtmlPage, PageAdapter};
pub use retry::RetryController;
pub use scheduler::{BatchScheduler, ChannelProgressSink, NullSink, ProgressSink, RunResult};
pub use store::{MemoryStore, RonStore, Store, StoreError, SETTINGS_FILENAME, STATS_FILENAME};
pub use sweeper::SweepHandle;
pub use types::{
    CheckOutcome, Classification, ClassifyError, ItemOutcome, ItemReport, PassReport, SweepEvent,
};
