use std::fmt;

use url::Url;

/// Path fragment every item URL must contain.
pub const ITEM_PATH_MARKER: &str = "/album/";

/// Canonical URL of an item; the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to the visual container of an item, issued by a page adapter.
pub type ContainerId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub artist: String,
    pub container: ContainerId,
}

impl Item {
    pub fn url(&self) -> &str {
        self.id.as_str()
    }
}

/// Resolve a raw `href` into a canonical item id.
///
/// - absolute `http(s)://` links are kept
/// - root-relative `/path` links are joined to the origin of `base`
/// - anything else is treated as a scheme-less `host/path` and gets `https://`
///
/// The fragment is dropped. Returns `None` for unparsable links and for links
/// whose path does not contain [`ITEM_PATH_MARKER`].
pub fn canonicalize_item_url(href: &str, base: &Url) -> Option<ItemId> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    let mut url = if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(href).ok()?
    } else if href.starts_with('/') {
        base.join(href).ok()?
    } else {
        Url::parse(&format!("https://{href}")).ok()?
    };

    if !url.path().contains(ITEM_PATH_MARKER) {
        return None;
    }
    url.set_fragment(None);
    Some(ItemId(url.into()))
}
