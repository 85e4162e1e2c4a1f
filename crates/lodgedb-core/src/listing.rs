use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A property listing after normalization, ready for storage and analytics.
///
/// This is the only shape that crosses into the persistence layer. The `url`
/// field is always canonical (scheme + host + path, no query parameters) and
/// is the natural deduplication key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedListing {
    pub title: String,
    /// Nightly price; `0` when the card showed no parseable price.
    pub price: Decimal,
    pub location: String,
    /// Guest rating in `[0, 5]`; `0` for unrated ("New") listings.
    pub rating: Decimal,
    /// Canonical listing URL, e.g. `"https://www.airbnb.com/rooms/12345"`.
    pub url: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub guests: i32,
}

impl NormalizedListing {
    /// Returns `true` if the listing carries the fields required for
    /// persistence: a non-empty title and a non-empty canonical URL.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        !self.title.is_empty() && !self.url.is_empty()
    }

    /// Returns `true` if the detail-page capacity counts were filled in.
    ///
    /// All three counts default to zero until the detail fetch succeeds, so
    /// a fully-zero triple means the detail page was never read.
    #[must_use]
    pub fn has_capacity_data(&self) -> bool {
        self.bedrooms > 0 || self.bathrooms > 0 || self.guests > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_listing() -> NormalizedListing {
        NormalizedListing {
            title: "Seaside loft".to_string(),
            price: Decimal::new(125_00, 2),
            location: "Lisbon, Portugal".to_string(),
            rating: Decimal::new(495, 2),
            url: "https://www.airbnb.com/rooms/12345".to_string(),
            bedrooms: 2,
            bathrooms: 1,
            guests: 4,
        }
    }

    #[test]
    fn is_storable_with_title_and_url() {
        assert!(make_listing().is_storable());
    }

    #[test]
    fn not_storable_without_title() {
        let mut listing = make_listing();
        listing.title = String::new();
        assert!(!listing.is_storable());
    }

    #[test]
    fn not_storable_without_url() {
        let mut listing = make_listing();
        listing.url = String::new();
        assert!(!listing.is_storable());
    }

    #[test]
    fn has_capacity_data_when_any_count_set() {
        let mut listing = make_listing();
        listing.bedrooms = 0;
        listing.bathrooms = 0;
        assert!(listing.has_capacity_data());
    }

    #[test]
    fn no_capacity_data_when_all_counts_zero() {
        let mut listing = make_listing();
        listing.bedrooms = 0;
        listing.bathrooms = 0;
        listing.guests = 0;
        assert!(!listing.has_capacity_data());
    }

    #[test]
    fn serde_roundtrip() {
        let listing = make_listing();
        let json = serde_json::to_string(&listing).expect("serialization failed");
        let decoded: NormalizedListing =
            serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded.title, listing.title);
        assert_eq!(decoded.price, listing.price);
        assert_eq!(decoded.rating, listing.rating);
        assert_eq!(decoded.url, listing.url);
        assert_eq!(decoded.guests, listing.guests);
    }
}
