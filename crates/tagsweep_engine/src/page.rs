use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use scraper::{ElementRef, Html, Selector};
use sweep_logging::sweep_debug;
use tagsweep_core::{canonicalize_item_url, ContainerId, Item, ItemId};
use url::Url;

/// Capability interface over the live page.
///
/// Keeps the scan pipeline independent of any concrete document structure.
pub trait PageAdapter: Send + Sync {
    /// All items currently on the page, in document order.
    fn discover_items(&self) -> Vec<Item>;
    /// Hide the item's container. Returns `false` if the container is unknown.
    fn hide(&self, item: &Item) -> bool;
    fn is_hidden(&self, container: ContainerId) -> bool;
}

const ITEM_LINK_SELECTOR: &str = "a[href*=\"/album/\"]";
const CONTAINER_CLASSES: &[&str] = &[
    "discover-item",
    "discover-results-item",
    "item-details",
    "art",
    "discover-detail-inner",
];
const TITLE_SELECTORS: &[&str] = &[".discover-item-title", ".discover-title", "strong"];
const ARTIST_SELECTORS: &[&str] = &[
    ".discover-item-artist",
    ".discover-artist",
    ".subhead",
    "span",
];
const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Page adapter over a parsed discover-page snapshot.
///
/// Newly loaded content is fed in through [`HtmlPage::append_html`]. Hiding
/// only marks containers; nothing is removed from the snapshot.
pub struct HtmlPage {
    base: Url,
    inner: Mutex<PageInner>,
}

#[derive(Default)]
struct PageInner {
    items: Vec<Item>,
    known: HashSet<ItemId>,
    containers: usize,
    hidden: BTreeSet<ContainerId>,
}

struct PageSelectors {
    link: Option<Selector>,
    title: Vec<Selector>,
    artist: Vec<Selector>,
}

impl PageSelectors {
    fn new() -> Self {
        let parse_all = |list: &[&str]| {
            list.iter()
                .filter_map(|sel| Selector::parse(sel).ok())
                .collect::<Vec<_>>()
        };
        Self {
            link: Selector::parse(ITEM_LINK_SELECTOR).ok(),
            title: parse_all(TITLE_SELECTORS),
            artist: parse_all(ARTIST_SELECTORS),
        }
    }
}

impl HtmlPage {
    pub fn parse(html: &str, base_url: &str) -> Result<Self, url::ParseError> {
        let page = Self {
            base: Url::parse(base_url)?,
            inner: Mutex::new(PageInner::default()),
        };
        let doc = Html::parse_document(html);
        let found = page.absorb(&doc);
        sweep_debug!("Parsed page {} with {} item links", page.base, found);
        Ok(page)
    }

    /// Add freshly loaded markup. Returns the number of item links it contained.
    pub fn append_html(&self, fragment: &str) -> usize {
        let doc = Html::parse_fragment(fragment);
        self.absorb(&doc)
    }

    pub fn item_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn hidden_items(&self) -> Vec<Item> {
        let inner = self.lock();
        inner
            .items
            .iter()
            .filter(|item| inner.hidden.contains(&item.container))
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, PageInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn absorb(&self, doc: &Html) -> usize {
        let selectors = PageSelectors::new();
        let Some(link_sel) = selectors.link.as_ref() else {
            return 0;
        };

        let mut inner = self.lock();
        let mut container_ids = HashMap::new();
        let mut links = 0;

        for link in doc.select(link_sel) {
            let Some(id) = link
                .value()
                .attr("href")
                .and_then(|href| canonicalize_item_url(href, &self.base))
            else {
                continue;
            };
            links += 1;
            if inner.known.contains(&id) {
                continue;
            }
            let Some(container) = find_container(link) else {
                continue;
            };

            let next_id = inner.containers;
            let container_id = *container_ids.entry(container.id()).or_insert(next_id);
            if container_id == next_id {
                inner.containers += 1;
            }

            let item = Item {
                title: first_text(container, link, &selectors.title)
                    .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                artist: first_text(container, link, &selectors.artist)
                    .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                container: container_id,
                id,
            };
            sweep_debug!("Found item {} ('{}' by {})", item.id, item.title, item.artist);
            inner.known.insert(item.id.clone());
            inner.items.push(item);
        }
        links
    }
}

impl PageAdapter for HtmlPage {
    fn discover_items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    fn hide(&self, item: &Item) -> bool {
        let mut inner = self.lock();
        if item.container >= inner.containers {
            return false;
        }
        inner.hidden.insert(item.container);
        true
    }

    fn is_hidden(&self, container: ContainerId) -> bool {
        self.lock().hidden.contains(&container)
    }
}

/// Closest card-like ancestor, then the parent of an enclosing `.meta`, then the grandparent.
fn find_container(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let has_class = |el: &ElementRef<'_>, names: &[&str]| {
        el.value().classes().any(|class| names.contains(&class))
    };

    if let Some(card) = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| has_class(el, CONTAINER_CLASSES))
    {
        return Some(card);
    }
    if let Some(meta) = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| has_class(el, &["meta"]))
    {
        return meta.parent().and_then(ElementRef::wrap);
    }
    link.parent()
        .and_then(|parent| parent.parent())
        .and_then(ElementRef::wrap)
}

fn first_text(container: ElementRef<'_>, link: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .find_map(|sel| container.select(sel).next().or_else(|| link.select(sel).next()))
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}
