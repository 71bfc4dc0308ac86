use scraper::{Html, Selector};

/// Places in an item page where genre tags show up.
const TAG_SELECTORS: &[&str] = &[
    "a.tag",
    ".tag",
    "a[href*=\"/tag/\"]",
    ".tralbum-tags a",
    ".tags a",
];
const META_SELECTOR: &str = "meta[name=\"keywords\"], meta[name=\"description\"]";

/// Case-insensitive tag predicate over an item page.
///
/// A tag like `Dungeon Synth` also matches `dungeonsynth` and `DUNGEON   synth`.
#[derive(Debug, Clone)]
pub struct TagMatcher {
    needles: Vec<String>,
}

impl TagMatcher {
    pub fn new(tag: &str) -> Self {
        let spaced = normalize(tag);
        let joined: String = spaced.split(' ').collect();
        let mut needles = Vec::new();
        if !spaced.is_empty() {
            if joined != spaced {
                needles.push(joined);
            }
            needles.insert(0, spaced);
        }

        Self { needles }
    }

    pub fn matches_text(&self, text: &str) -> bool {
        let text = normalize(text);
        !text.is_empty() && self.needles.iter().any(|needle| text.contains(needle.as_str()))
    }

    pub fn matches_html(&self, html: &str) -> bool {
        let doc = Html::parse_document(html);
        let tag_selectors = TAG_SELECTORS
            .iter()
            .filter_map(|sel| Selector::parse(sel).ok());

        let in_tags = tag_selectors.into_iter().any(|sel| {
            doc.select(&sel)
                .any(|el| self.matches_text(&el.text().collect::<String>()))
        });
        if in_tags {
            return true;
        }

        Selector::parse(META_SELECTOR).ok().is_some_and(|sel| {
            doc.select(&sel)
                .filter_map(|meta| meta.value().attr("content"))
                .any(|content| self.matches_text(content))
        })
    }
}

/// Lowercase with whitespace runs collapsed to single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
