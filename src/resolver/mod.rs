//! Link resolution: item page → media container → terminal media URL(s).
//!
//! Resolution runs as an explicit state machine, one run per item:
//!
//! ```text
//! Start → PageFetched → ContainerFound → ContainerFetched → MediaLocated → Resolved
//!   \__________\______________\________________\_______________\→ Failed(ResolveError)
//! ```
//!
//! - Episodes: the page embeds an `<iframe>` player; the iframe document holds
//!   a `video > source` element whose `type` must be `video/mp4`.
//! - Chapters: the page embeds a `window.__data` script listing every page
//!   image with its type (`image/jpeg` or `image/png`), in reading order.
//!
//! At most two fetch hops are made per item and nothing is retried; a failure
//! is terminal for the item within the current cycle.

mod error;

use std::fmt;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub use error::ResolveError;

use crate::catalog::{Item, ItemExtra, ItemKind};
use crate::fetch::{FetchedPage, Fetcher};
use crate::html::{absolutize_url, scan_elements, window_data_payload};

/// Media types accepted for episode streams.
pub const EPISODE_MEDIA_TYPES: &[&str] = &["video/mp4"];

/// Media types accepted for chapter pages.
pub const CHAPTER_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Upper bound on network fetches for one item (page + container).
pub const MAX_FETCH_HOPS: usize = 2;

const FRAME_SELECTOR: &str = "iframe";
const MEDIA_SOURCE_SELECTOR: &str = "video > source";

/// States of the resolution machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    Start,
    PageFetched,
    ContainerFound,
    ContainerFetched,
    MediaLocated,
}

impl ResolveStage {
    /// Stable label for structured log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::PageFetched => "page_fetched",
            Self::ContainerFound => "container_found",
            Self::ContainerFetched => "container_fetched",
            Self::MediaLocated => "media_located",
        }
    }
}

impl fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Start => "fetching item page",
            Self::PageFetched => "scanning item page",
            Self::ContainerFound => "fetching container",
            Self::ContainerFetched => "scanning container",
            Self::MediaLocated => "returning media",
        };
        f.write_str(text)
    }
}

/// One terminal media location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Absolute URL of the raw media.
    pub url: String,
    /// Declared media type, normalized (lowercase, no parameters).
    pub media_type: String,
}

/// Successful resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one stream (episodes).
    Single(MediaRef),
    /// Ordered page images (chapters); order is reading order.
    Pages(Vec<MediaRef>),
}

#[derive(Debug, Deserialize)]
struct ChapterPayload {
    chapter: ChapterData,
}

#[derive(Debug, Deserialize)]
struct ChapterData {
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default)]
    url: String,
    #[serde(default, rename = "type")]
    media_type: Option<String>,
}

/// Where the media list lives once the item page has been scanned.
#[derive(Debug)]
enum Container {
    /// Separate document that must be fetched (second hop).
    Frame { url: String },
    /// Data already embedded in the item page.
    Inline { page_url: String, payload: String },
}

/// A container's scannable contents.
#[derive(Debug)]
enum ContainerBody {
    Frame(FetchedPage),
    ChapterPages { url: String, pages: Vec<PageEntry> },
}

#[derive(Debug)]
enum State {
    Start,
    PageFetched(FetchedPage),
    ContainerFound(Container),
    ContainerFetched(ContainerBody),
    MediaLocated(Resolution),
}

impl State {
    fn stage(&self) -> ResolveStage {
        match self {
            Self::Start => ResolveStage::Start,
            Self::PageFetched(_) => ResolveStage::PageFetched,
            Self::ContainerFound(_) => ResolveStage::ContainerFound,
            Self::ContainerFetched(_) => ResolveStage::ContainerFetched,
            Self::MediaLocated(_) => ResolveStage::MediaLocated,
        }
    }
}

/// Resolves items of one kind to their terminal media.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver {
    kind: ItemKind,
}

impl LinkResolver {
    /// Creates a resolver for `kind` items.
    #[must_use]
    pub fn new(kind: ItemKind) -> Self {
        Self { kind }
    }

    /// Returns the accepted media types for this resolver's kind.
    #[must_use]
    pub fn accepted_types(&self) -> &'static [&'static str] {
        match self.kind {
            ItemKind::Episode => EPISODE_MEDIA_TYPES,
            ItemKind::Chapter => CHAPTER_MEDIA_TYPES,
        }
    }

    /// Runs the resolution machine for `item`.
    ///
    /// # Errors
    ///
    /// Returns the [`ResolveError`] that made the machine enter `Failed`.
    #[instrument(skip(self, fetcher, item), fields(kind = self.kind.as_str(), number = item.number, href = %item.href))]
    pub async fn resolve(
        &self,
        fetcher: &dyn Fetcher,
        item: &Item,
    ) -> Result<Resolution, ResolveError> {
        let mut hops = 0usize;
        let mut state = State::Start;

        loop {
            state = match state {
                State::Start => {
                    hops += 1;
                    let page = fetcher
                        .get_text(&item.href)
                        .await
                        .map_err(|e| ResolveError::fetch(&item.href, ResolveStage::Start, e))?;
                    State::PageFetched(page)
                }
                State::PageFetched(page) => State::ContainerFound(self.find_container(&page)?),
                State::ContainerFound(container) => {
                    State::ContainerFetched(open_container(fetcher, container, &mut hops).await?)
                }
                State::ContainerFetched(body) => State::MediaLocated(self.locate_media(body)?),
                State::MediaLocated(resolution) => {
                    if let (Resolution::Pages(pages), ItemExtra::Chapter { pages: announced }) =
                        (&resolution, &item.extra)
                        && usize::try_from(*announced).ok() != Some(pages.len())
                    {
                        warn!(
                            announced,
                            resolved = pages.len(),
                            "chapter page count differs from catalog"
                        );
                    }
                    return Ok(resolution);
                }
            };
            debug_assert!(hops <= MAX_FETCH_HOPS);
            debug!(stage = state.stage().as_str(), hops, "resolver advanced");
        }
    }

    fn find_container(&self, page: &FetchedPage) -> Result<Container, ResolveError> {
        match self.kind {
            ItemKind::Episode => scan_elements(&page.body, FRAME_SELECTOR)
                .into_iter()
                .find_map(|frame| absolutize_url(&frame.src, &page.url))
                .map(|url| Container::Frame { url })
                .ok_or_else(|| ResolveError::no_container(&page.url)),
            ItemKind::Chapter => window_data_payload(&page.body)
                .map(|payload| Container::Inline {
                    page_url: page.url.clone(),
                    payload,
                })
                .ok_or_else(|| ResolveError::no_container(&page.url)),
        }
    }

    fn locate_media(&self, body: ContainerBody) -> Result<Resolution, ResolveError> {
        let accepted = self.accepted_types();
        match body {
            ContainerBody::Frame(frame) => {
                let sources: Vec<_> = scan_elements(&frame.body, MEDIA_SOURCE_SELECTOR)
                    .into_iter()
                    .filter(|source| !source.src.is_empty())
                    .collect();
                let Some(first) = sources.first() else {
                    return Err(ResolveError::no_media(&frame.url));
                };

                let mut matching: Vec<MediaRef> = Vec::new();
                for source in &sources {
                    let Some(media_type) = source
                        .media_type
                        .as_deref()
                        .map(normalize_media_type)
                        .filter(|t| is_accepted(accepted, t))
                    else {
                        continue;
                    };
                    let Some(url) = absolutize_url(&source.src, &frame.url) else {
                        continue;
                    };
                    if !matching.iter().any(|m| m.url == url) {
                        matching.push(MediaRef { url, media_type });
                    }
                }

                match matching.len() {
                    0 => Err(ResolveError::type_mismatch(
                        &frame.url,
                        first.media_type.as_deref(),
                        accepted,
                    )),
                    1 => Ok(Resolution::Single(matching.remove(0))),
                    count => Err(ResolveError::ambiguous(&frame.url, count)),
                }
            }
            ContainerBody::ChapterPages { url, pages } => {
                if pages.is_empty() {
                    return Err(ResolveError::no_media(&url));
                }
                pages
                    .into_iter()
                    .map(|page| {
                        let media_type = page
                            .media_type
                            .as_deref()
                            .map(normalize_media_type)
                            .filter(|t| is_accepted(accepted, t))
                            .ok_or_else(|| {
                                ResolveError::type_mismatch(
                                    &url,
                                    page.media_type.as_deref(),
                                    accepted,
                                )
                            })?;
                        let page_url = absolutize_url(&page.url, &url)
                            .ok_or_else(|| ResolveError::no_media(&url))?;
                        Ok(MediaRef {
                            url: page_url,
                            media_type,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Resolution::Pages)
            }
        }
    }
}

async fn open_container(
    fetcher: &dyn Fetcher,
    container: Container,
    hops: &mut usize,
) -> Result<ContainerBody, ResolveError> {
    match container {
        Container::Frame { url } => {
            *hops += 1;
            let frame = fetcher
                .get_text(&url)
                .await
                .map_err(|e| ResolveError::fetch(&url, ResolveStage::ContainerFound, e))?;
            Ok(ContainerBody::Frame(frame))
        }
        Container::Inline { page_url, payload } => {
            let decoded: ChapterPayload = serde_json::from_str(&payload)
                .map_err(|e| ResolveError::invalid_container(&page_url, e.to_string()))?;
            Ok(ContainerBody::ChapterPages {
                url: page_url,
                pages: decoded.chapter.pages,
            })
        }
    }
}

fn is_accepted(accepted: &[&str], media_type: &str) -> bool {
    accepted.iter().any(|candidate| *candidate == media_type)
}

/// Lowercases a media type and strips parameters (`; charset=...`).
#[must_use]
pub fn normalize_media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
