use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use sweep_logging::{level_for, sweep_info, sweep_warn};
use tagsweep_core::Settings;
use tagsweep_engine::{
    ChannelProgressSink, Coordinator, FetchSettings, HtmlPage, MessagingClassifier,
    ReqwestClassifier, RonStore, Store, SweepEvent, SweepHandle,
};
use tokio::sync::mpsc;

use super::report::RunReport;
use super::run_config::{PageSource, RunConfig, RUN_FILENAME};

pub fn run_app() -> anyhow::Result<()> {
    let run = RunConfig::load(Path::new(RUN_FILENAME))?;
    let store = Arc::new(RonStore::new(&run.state_dir));
    let settings = store
        .load_settings()
        .with_context(|| format!("loading settings from {}", run.state_dir.display()))?;

    sweep_logging::initialize(run.log.into(), level_for(settings.debug_mode));
    sweep_info!(
        "tagsweep starting: removing '{}' items, state in {:?}",
        settings.target_tag,
        store.dir()
    );

    if !settings.enabled {
        sweep_info!("Sweeping is disabled in settings; nothing to do");
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(sweep(run, settings, store))
}

async fn sweep(run: RunConfig, settings: Settings, store: Arc<RonStore>) -> anyhow::Result<()> {
    let fetcher = Arc::new(ReqwestClassifier::new(FetchSettings::from_settings(&settings))?);
    let html = match &run.page {
        PageSource::Url(url) => fetcher
            .fetch_html(url)
            .await
            .with_context(|| format!("fetching {url}"))?,
        PageSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
    };
    let page = Arc::new(HtmlPage::parse(&html, run.base_url())?);
    sweep_info!("Loaded page with {} items", page.item_count());

    let coordinator = Arc::new(Coordinator::new(fetcher, store.clone()));
    let classifier = Arc::new(MessagingClassifier::new(coordinator));
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let handle = SweepHandle::spawn(
        settings,
        classifier,
        page.clone(),
        store.clone(),
        Arc::new(ChannelProgressSink::new(event_tx)),
    );
    handle.page_ready();

    let mut report = RunReport::default();
    let mut pending = run.more.iter();
    let mut outcome = Ok(());
    while let Some(event) = event_rx.recv().await {
        report.record(&event);
        if !matches!(event, SweepEvent::PassFinished { .. }) {
            continue;
        }
        match load_more(&mut pending, &page) {
            Ok(Some(links)) => handle.content_added(links),
            Ok(None) => break,
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }

    let session = handle.shutdown().await;
    let totals = store.load_stats().unwrap_or_else(|err| {
        sweep_warn!("Could not read stored stats: {}", err);
        session
    });
    sweep_info!("Finished after {} passes", report.pass_count());
    println!("{}", report.render(&session, &totals));
    outcome
}

/// Append the next fragment that carries item links; `None` once they run out.
fn load_more<'a>(
    pending: &mut impl Iterator<Item = &'a PathBuf>,
    page: &HtmlPage,
) -> anyhow::Result<Option<usize>> {
    for path in pending {
        let fragment = fs::read_to_string(path)
            .with_context(|| format!("reading fragment {}", path.display()))?;
        let links = page.append_html(&fragment);
        if links > 0 {
            sweep_info!("Appended {} ({} item links)", path.display(), links);
            return Ok(Some(links));
        }
        sweep_warn!("Fragment {} has no item links; skipping", path.display());
    }
    Ok(None)
}
