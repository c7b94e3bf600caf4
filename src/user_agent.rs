//! Shared User-Agent string for every outgoing request.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/catalog-dl";

/// Default User-Agent for page, container, and media requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("catalog-dl/{version} (+{PROJECT_UA_URL})")
}
