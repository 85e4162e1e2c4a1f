//! Capacity-count extraction from detail-page overview text.
//!
//! The overview block renders a summary line such as
//! `"4 guests · 2 bedrooms · 3 beds · 1.5 baths"`. Counts are pulled out
//! with labeled-number patterns; a label that never appears (a studio has
//! no "bedroom" segment) yields zero for that field.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::DetailCounts;

static GUESTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\+?\s*guest").expect("valid guests regex"));
static BEDROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*bedroom").expect("valid bedrooms regex"));
// Fractional baths ("1.5 baths") keep only the whole part.
static BATHROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)(?:\.\d+)?\s*(?:shared\s+|private\s+)?bath").expect("valid bathrooms regex"));

/// Extracts guest/bedroom/bathroom counts from overview text.
///
/// Absent or unparsable segments yield zero — the same default the counts
/// start from, so a thin overview block degrades to "unknown capacity"
/// rather than an error.
#[must_use]
pub fn parse_detail_counts(text: &str) -> DetailCounts {
    DetailCounts {
        bedrooms: first_capture(&BEDROOMS_RE, text),
        bathrooms: first_capture(&BATHROOMS_RE, text),
        guests: first_capture(&GUESTS_RE, text),
    }
}

fn first_capture(re: &Regex, text: &str) -> i32 {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_overview_line() {
        let counts = parse_detail_counts("4 guests · 2 bedrooms · 3 beds · 1 bath");
        assert_eq!(counts.guests, 4);
        assert_eq!(counts.bedrooms, 2);
        assert_eq!(counts.bathrooms, 1);
    }

    #[test]
    fn parses_singular_labels() {
        let counts = parse_detail_counts("1 guest · 1 bedroom · 1 bed · 1 bath");
        assert_eq!(counts.guests, 1);
        assert_eq!(counts.bedrooms, 1);
        assert_eq!(counts.bathrooms, 1);
    }

    #[test]
    fn fractional_baths_keep_whole_part() {
        let counts = parse_detail_counts("6 guests · 3 bedrooms · 4 beds · 1.5 baths");
        assert_eq!(counts.bathrooms, 1);
    }

    #[test]
    fn caps_marker_on_guest_count_is_accepted() {
        let counts = parse_detail_counts("16+ guests · 8 bedrooms · 10 beds · 5 baths");
        assert_eq!(counts.guests, 16);
    }

    #[test]
    fn studio_has_zero_bedrooms() {
        let counts = parse_detail_counts("2 guests · Studio · 1 bed · 1 bath");
        assert_eq!(counts.bedrooms, 0);
        assert_eq!(counts.guests, 2);
    }

    #[test]
    fn shared_bath_label_is_recognized() {
        let counts = parse_detail_counts("2 guests · 1 bedroom · 1 bed · 1 shared bath");
        assert_eq!(counts.bathrooms, 1);
    }

    #[test]
    fn empty_text_yields_all_zeroes() {
        assert_eq!(parse_detail_counts(""), DetailCounts::default());
    }

    #[test]
    fn unrelated_text_yields_all_zeroes() {
        let counts = parse_detail_counts("Entire home hosted by Marta");
        assert_eq!(counts, DetailCounts::default());
    }

    #[test]
    fn case_insensitive_labels() {
        let counts = parse_detail_counts("4 Guests · 2 Bedrooms · 2 Baths");
        assert_eq!(counts.guests, 4);
        assert_eq!(counts.bedrooms, 2);
        assert_eq!(counts.bathrooms, 2);
    }
}
