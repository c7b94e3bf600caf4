//! HTML scanning helpers shared by the catalog source and the link resolver.
//!
//! Every function parses, scans, and drops the document synchronously and
//! returns owned strings; `scraper::Html` is not `Send` and must never be held
//! across an `.await`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Variable name the reference site assigns its embedded JSON payload to.
pub const WINDOW_DATA_VAR: &str = "window.__data";

static WINDOW_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?s)^window\.__data\s*=\s*(.*?)[\s;]*$"));

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

fn parse_selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// An element matched by a selector, reduced to the attributes callers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedElement {
    /// Value of the `src` attribute, trimmed; empty when absent.
    pub src: String,
    /// Value of the `type` attribute, trimmed; `None` when absent.
    pub media_type: Option<String>,
}

impl ScannedElement {
    fn from_element(element: ElementRef<'_>) -> Self {
        let attr = |name: &str| element.value().attr(name).map(str::trim);
        Self {
            src: attr("src").unwrap_or_default().to_string(),
            media_type: attr("type")
                .filter(|t| !t.is_empty())
                .map(std::string::ToString::to_string),
        }
    }
}

/// Returns every element matching `css`, in document order.
#[must_use]
pub fn scan_elements(html: &str, css: &str) -> Vec<ScannedElement> {
    let Some(selector) = parse_selector(css) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .map(ScannedElement::from_element)
        .collect()
}

/// Returns the JSON text assigned to `window.__data` in the first inline
/// `<script>` that carries it.
#[must_use]
pub fn window_data_payload(html: &str) -> Option<String> {
    let selector = parse_selector("script")?;
    let document = Html::parse_document(html);
    document.select(&selector).find_map(|script| {
        let text: String = script.text().collect();
        let text = text.trim();
        if !text.starts_with(WINDOW_DATA_VAR) {
            return None;
        }
        WINDOW_DATA_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|payload| !payload.is_empty())
    })
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns the value as-is if it already starts with `http://` or `https://`;
/// normalizes `//...` to the base scheme; otherwise joins with `base_url`.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    let base = Url::parse(base_url).ok()?;
    if let Some(rest) = value.strip_prefix("//") {
        return Some(format!("{}://{rest}", base.scheme()));
    }
    base.join(value).ok().map(|url| url.to_string())
}
