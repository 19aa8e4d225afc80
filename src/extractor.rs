use regex::Regex;
use scraper::{ElementRef, Html};

const STATUS_KEYWORDS: [&str; 7] = [
    "for sale", "pending", "sold", "contingent", "active", "off market", "new listing",
];

const MAX_STATUS_LEN: usize = 80;

/// Engagement counters shown under the price, e.g. "3 days on Redfin • 1,204 views • 52 favorites".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Engagement {
    pub on_redfin: Option<String>,
    pub views: Option<String>,
    pub favorites: Option<String>,
}

pub struct Extractor {
    engagement_regex: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            engagement_regex: Regex::new(
                r"(?i)(?P<on_redfin>[0-9,]+\s+\w+\s+on\s+Redfin)\s•\s(?P<views>[0-9,]+\sviews)\s•\s(?P<favorites>[0-9,]+\sfavorites)",
            )
            .expect("engagement pattern is valid"),
        }
    }

    pub fn has_engagement(&self, body_text: &str) -> bool {
        self.engagement_regex.is_match(body_text)
    }

    pub fn extract_engagement(&self, body_text: &str) -> Option<Engagement> {
        let caps = self.engagement_regex.captures(body_text)?;
        let group = |name: &str| clean_stat(caps.name(name).map(|m| m.as_str()));
        Some(Engagement {
            on_redfin: group("on_redfin"),
            views: group("views"),
            favorites: group("favorites"),
        })
    }

    /// Returns the first candidate that reads like a listing status.
    pub fn pick_status<'a, I>(&self, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().find_map(|raw| {
            let cleaned = collapse_whitespace(raw);
            if cleaned.is_empty() || cleaned.chars().count() > MAX_STATUS_LEN {
                return None;
            }
            let lowered = cleaned.to_lowercase();
            STATUS_KEYWORDS
                .iter()
                .any(|kw| lowered.contains(kw))
                .then_some(cleaned)
        })
    }

    /// Same keyword test as `pick_status` but line by line through the page text, without the length cap.
    pub fn status_from_body(&self, body_text: &str) -> Option<String> {
        body_text.lines().find_map(|line| {
            let cleaned = collapse_whitespace(line);
            let lowered = cleaned.to_lowercase();
            (!cleaned.is_empty() && STATUS_KEYWORDS.iter().any(|kw| lowered.contains(kw)))
                .then_some(cleaned)
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Empty and missing values pass through untouched.
pub fn clean_stat(value: Option<&str>) -> Option<String> {
    match value {
        None => None,
        Some("") => Some(String::new()),
        Some(v) => Some(collapse_whitespace(v)),
    }
}

/// Text nodes of `element`, each trimmed, empties dropped, joined by `separator`.
pub fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Elements whose text never shows up in the rendered page.
const HIDDEN_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Approximates `innerText` of the body: one line per non-blank visible text node.
pub fn document_text(document: &Html) -> String {
    let body = scraper::Selector::parse("body").expect("valid selector");
    let root = document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element());

    root.descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| HIDDEN_TEXT_ELEMENTS.contains(&el.name()))
            })
        })
        .map(|(_, text)| text.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", base_url, href)
    }
}
