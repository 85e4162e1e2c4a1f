use std::str::FromStr;

use rust_decimal::Decimal;

use super::{canonicalize_url, normalize_listing, normalize_price, normalize_rating};
use crate::error::ScraperError;
use crate::types::{DetailResult, RawListing};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("valid decimal literal")
}

// ---------------------------------------------------------------------------
// normalize_price
// ---------------------------------------------------------------------------

#[test]
fn price_strips_currency_and_thousands_separator() {
    assert_eq!(normalize_price("$1,250"), dec("1250"));
}

#[test]
fn price_keeps_decimal_point() {
    assert_eq!(normalize_price("$120.50 night"), dec("120.50"));
}

#[test]
fn price_strips_night_suffix() {
    assert_eq!(normalize_price("€89 / night"), dec("89"));
}

#[test]
fn empty_price_normalizes_to_zero() {
    assert_eq!(normalize_price(""), Decimal::ZERO);
}

#[test]
fn non_numeric_price_normalizes_to_zero() {
    assert_eq!(normalize_price("Price unavailable"), Decimal::ZERO);
}

#[test]
fn price_with_multiple_points_normalizes_to_zero() {
    // Leftover digits "1.250.50" are not a valid decimal.
    assert_eq!(normalize_price("$1.250.50"), Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// normalize_rating
// ---------------------------------------------------------------------------

#[test]
fn rating_extracts_leading_decimal_and_drops_review_count() {
    assert_eq!(normalize_rating("4.95 (312 reviews)"), dec("4.95"));
}

#[test]
fn rating_from_aria_label_shape() {
    assert_eq!(
        normalize_rating("4.8 out of 5 average rating, 127 reviews"),
        dec("4.8")
    );
}

#[test]
fn unrated_listing_normalizes_to_zero() {
    assert_eq!(normalize_rating("New"), Decimal::ZERO);
}

#[test]
fn empty_rating_normalizes_to_zero() {
    assert_eq!(normalize_rating(""), Decimal::ZERO);
}

#[test]
fn leading_number_above_scale_is_treated_as_noise() {
    // A bare review count must not become a rating.
    assert_eq!(normalize_rating("312 reviews"), Decimal::ZERO);
}

#[test]
fn integer_rating_is_accepted() {
    assert_eq!(normalize_rating("5 (2 reviews)"), dec("5"));
}

// ---------------------------------------------------------------------------
// canonicalize_url
// ---------------------------------------------------------------------------

#[test]
fn canonicalize_strips_query_parameters() {
    assert_eq!(
        canonicalize_url("https://x/rooms/1?a=1&b=2"),
        "https://x/rooms/1"
    );
}

#[test]
fn canonicalize_strips_trailing_slash() {
    assert_eq!(
        canonicalize_url("https://www.airbnb.com/rooms/12345/"),
        "https://www.airbnb.com/rooms/12345"
    );
}

#[test]
fn canonicalize_drops_fragment() {
    assert_eq!(
        canonicalize_url("https://www.airbnb.com/rooms/12345#reviews"),
        "https://www.airbnb.com/rooms/12345"
    );
}

#[test]
fn canonicalize_preserves_port() {
    assert_eq!(
        canonicalize_url("http://localhost:8080/rooms/1?x=1"),
        "http://localhost:8080/rooms/1"
    );
}

#[test]
fn canonicalize_is_idempotent() {
    let inputs = [
        "https://www.airbnb.com/rooms/12345?search_mode=flex&check_in=2026-09-01",
        "https://www.airbnb.com/rooms/12345/",
        "http://localhost:8080/rooms/1?x=1",
        "not a url at all",
    ];
    for input in inputs {
        let once = canonicalize_url(input);
        let twice = canonicalize_url(&once);
        assert_eq!(once, twice, "canonicalization not idempotent for {input}");
    }
}

#[test]
fn unparsable_input_falls_back_to_room_marker_truncation() {
    assert_eq!(
        canonicalize_url("airbnb.com/rooms/42?source=homepage"),
        "airbnb.com/rooms/42"
    );
}

#[test]
fn unparsable_input_without_marker_is_returned_unchanged() {
    assert_eq!(canonicalize_url("not a url at all"), "not a url at all");
}

#[test]
fn empty_input_stays_empty() {
    assert_eq!(canonicalize_url(""), "");
}

// ---------------------------------------------------------------------------
// normalize_listing
// ---------------------------------------------------------------------------

fn raw_listing() -> RawListing {
    RawListing {
        title: "Seaside loft".to_string(),
        price_text: "$1,250 night".to_string(),
        location_text: "Lisbon, Portugal".to_string(),
        rating_text: "4.95 (312 reviews)".to_string(),
        url: "https://www.airbnb.com/rooms/12345?check_in=2026-09-01".to_string(),
        bedrooms: 0,
        bathrooms: 0,
        guests: 0,
    }
}

#[test]
fn normalize_listing_canonicalizes_url_and_parses_fields() {
    let listing = normalize_listing(&raw_listing(), None);

    assert_eq!(listing.title, "Seaside loft");
    assert_eq!(listing.price, dec("1250"));
    assert_eq!(listing.rating, dec("4.95"));
    assert_eq!(listing.url, "https://www.airbnb.com/rooms/12345");
    assert_eq!(listing.bedrooms, 0);
}

#[test]
fn normalize_listing_merges_successful_detail_counts() {
    let raw = raw_listing();
    let detail = DetailResult {
        url: "https://www.airbnb.com/rooms/12345".to_string(),
        bedrooms: 2,
        bathrooms: 1,
        guests: 4,
        error: None,
    };

    let listing = normalize_listing(&raw, Some(&detail));

    assert_eq!(listing.bedrooms, 2);
    assert_eq!(listing.bathrooms, 1);
    assert_eq!(listing.guests, 4);
}

#[test]
fn normalize_listing_ignores_failed_detail_result() {
    let raw = raw_listing();
    let detail = DetailResult {
        url: "https://www.airbnb.com/rooms/12345".to_string(),
        bedrooms: 0,
        bathrooms: 0,
        guests: 0,
        error: Some(ScraperError::DetailFetch {
            url: raw.url.clone(),
            reason: "timed out".to_string(),
        }),
    };

    let listing = normalize_listing(&raw, Some(&detail));

    assert_eq!(listing.bedrooms, 0);
    assert_eq!(listing.guests, 0);
}
