use serde::Serialize;

use crate::error::ScraperError;

/// A (name, URL) pair discovered on the entry page. Immutable once produced;
/// the discovery step deduplicates by URL with first occurrence winning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTarget {
    pub name: String,
    pub url: String,
}

/// A listing as extracted from a summary card, before normalization.
///
/// The text fields carry whatever the card showed (`"$1,250 / night"`,
/// `"4.95 (312 reviews)"`); capacity counts stay zero until the detail
/// worker pool fills them in.
#[derive(Debug, Clone, Serialize)]
pub struct RawListing {
    pub title: String,
    pub price_text: String,
    pub location_text: String,
    pub rating_text: String,
    /// Raw href as scraped, possibly polluted with search-state query
    /// parameters. Canonicalized at the point URLs enter the detail pool.
    pub url: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub guests: i32,
}

/// Capacity counts read from one detail page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailCounts {
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub guests: i32,
}

/// The outcome of fetching one detail page, keyed by canonical URL.
///
/// Exactly one of these exists per distinct canonical URL submitted to the
/// worker pool. A populated `error` means every attempt failed; the counts
/// are zero in that case.
#[derive(Debug)]
pub struct DetailResult {
    /// Canonical URL this result belongs to.
    pub url: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub guests: i32,
    pub error: Option<ScraperError>,
}

impl DetailResult {
    /// Builds a successful result from fetched counts.
    #[must_use]
    pub fn success(url: String, counts: DetailCounts) -> Self {
        Self {
            url,
            bedrooms: counts.bedrooms,
            bathrooms: counts.bathrooms,
            guests: counts.guests,
            error: None,
        }
    }

    /// Builds a terminal-failure result with zeroed counts.
    #[must_use]
    pub fn failure(url: String, error: ScraperError) -> Self {
        Self {
            url,
            bedrooms: 0,
            bathrooms: 0,
            guests: 0,
            error: Some(error),
        }
    }
}
