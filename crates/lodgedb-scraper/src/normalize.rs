//! Field normalization: raw card text to canonical typed values.
//!
//! [`canonicalize_url`] is the linchpin of deduplication — every map keyed
//! by URL anywhere in the pipeline goes through it, never through the raw
//! scraped string. It is idempotent, so applying it at multiple boundaries
//! is safe.

use std::str::FromStr;
use std::sync::LazyLock;

use lodgedb_core::NormalizedListing;
use regex::Regex;
use rust_decimal::Decimal;
use url::Url;

use crate::types::{DetailResult, RawListing};

/// Path marker used by the manual fallback when a scraped href does not
/// parse as an absolute URL.
const ROOM_PATH_MARKER: &str = "/rooms/";

/// Upper bound of a valid rating. Leading numbers above this are review
/// counts or other noise, normalized to unrated.
const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

static LEADING_DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid rating regex"));

/// Normalizes a price string to a decimal amount.
///
/// Strips currency symbols, thousands separators, and suffixes like
/// `"/night"` by keeping only ASCII digits and the decimal point. Empty or
/// unparsable input normalizes to zero.
#[must_use]
pub fn normalize_price(text: &str) -> Decimal {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if digits.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&digits).unwrap_or(Decimal::ZERO)
}

/// Normalizes a rating string to a decimal in `[0, 5]`.
///
/// Extracts the leading decimal number from shapes like
/// `"4.95 (312 reviews)"` or `"4.95 out of 5 average rating"`, discarding
/// parenthetical review counts. Unparsable input — `"New"` — and values
/// outside the rating scale normalize to zero.
#[must_use]
pub fn normalize_rating(text: &str) -> Decimal {
    let Some(m) = LEADING_DECIMAL_RE.find(text) else {
        return Decimal::ZERO;
    };

    let value = Decimal::from_str(m.as_str()).unwrap_or(Decimal::ZERO);
    if value > MAX_RATING {
        return Decimal::ZERO;
    }
    value
}

/// Reduces a listing URL to its canonical form: `scheme://host/path` with
/// the trailing slash stripped and all query parameters dropped. Query
/// parameters on the target site encode session and search state, so
/// keeping them would make every visit to the same listing a distinct key.
///
/// If the input does not parse as an absolute URL, falls back to locating
/// the `/rooms/` path marker and truncating at the first following `?`;
/// without the marker the input is returned unchanged.
///
/// Idempotent: `canonicalize_url(canonicalize_url(u)) == canonicalize_url(u)`.
#[must_use]
pub fn canonicalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) if parsed.has_host() => {
            let scheme = parsed.scheme();
            let host = parsed.host_str().unwrap_or_default();
            let path = parsed.path().trim_end_matches('/');
            match parsed.port() {
                Some(port) => format!("{scheme}://{host}:{port}{path}"),
                None => format!("{scheme}://{host}{path}"),
            }
        }
        _ => fallback_room_url(raw),
    }
}

fn fallback_room_url(raw: &str) -> String {
    let Some(marker_idx) = raw.find(ROOM_PATH_MARKER) else {
        return raw.to_string();
    };

    match raw[marker_idx..].find('?') {
        Some(query_offset) => raw[..marker_idx + query_offset].to_string(),
        None => raw.to_string(),
    }
}

/// Collapses runs of whitespace (including newlines from `innerText`) into
/// single spaces and trims the ends.
#[must_use]
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converts a raw listing into its normalized, storable form, folding in
/// detail counts when a successful [`DetailResult`] is present.
#[must_use]
pub fn normalize_listing(raw: &RawListing, detail: Option<&DetailResult>) -> NormalizedListing {
    let (bedrooms, bathrooms, guests) = match detail {
        Some(result) if result.error.is_none() => {
            (result.bedrooms, result.bathrooms, result.guests)
        }
        _ => (raw.bedrooms, raw.bathrooms, raw.guests),
    };

    NormalizedListing {
        title: raw.title.clone(),
        price: normalize_price(&raw.price_text),
        location: raw.location_text.clone(),
        rating: normalize_rating(&raw.rating_text),
        url: canonicalize_url(&raw.url),
        bedrooms,
        bathrooms,
        guests,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
