//! The page-query rule set for the target listings site.
//!
//! Every DOM read the pipeline performs lives here as a named JavaScript
//! rule that returns a JSON string, decoded into a typed row on the Rust
//! side. Control flow in discovery/extract/details never embeds selectors,
//! so markup drift on the target site is absorbed by editing this file.
//!
//! Rules follow one convention: evaluate to `JSON.stringify(...)` of a
//! shape matching the corresponding row struct below.

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Summary-card container on search result pages; also the visibility
/// sentinel for "results have rendered".
pub const SUMMARY_CARD_SELECTOR: &str = r#"[data-testid="card-container"]"#;

/// Overview block on a listing detail page; the only place capacity counts
/// are rendered.
pub const DETAIL_OVERVIEW_SELECTOR: &str = r#"div[data-section-id*="OVERVIEW"]"#;

/// Next-page anchors in preference order. The probe and the click must use
/// the same list or the probe will report a control the click cannot find.
const NEXT_CONTROL_SELECTORS: &[&str] = &[
    r#"a[aria-label="Next"]"#,
    r#"a[aria-label*="next"]"#,
    "nav a:last-child",
];

/// Location anchors on the entry page: label from inner text, falling back
/// to the accessibility label, then a placeholder that the filter drops.
/// Only `/s/…/homes` search links survive; capped at 20 rows.
pub const LOCATION_CARDS_QUERY: &str = r#"
JSON.stringify(
    Array.from(document.querySelectorAll('a[href*="/s/"]')).map(link => ({
        name: (link.innerText || '').trim() || link.getAttribute('aria-label') || 'Unknown',
        url: link.href
    })).filter(loc =>
        loc.url.includes('/s/') &&
        loc.url.includes('/homes') &&
        loc.name !== '' &&
        loc.name !== 'Unknown'
    ).slice(0, 20)
)
"#;

/// Summary cards on a result page, at most 20, each with selector fallbacks
/// for the fields the site renders under shifting test ids.
pub const SUMMARY_CARDS_QUERY: &str = r#"
JSON.stringify(
    Array.from(document.querySelectorAll('[data-testid="card-container"]')).slice(0, 20).map(card => {
        const getText = (selector) => {
            const el = card.querySelector(selector);
            return el ? el.innerText.trim() : '';
        };
        const getAttr = (selector, attr) => {
            const el = card.querySelector(selector);
            return el ? (el.getAttribute(attr) || '') : '';
        };
        return {
            title: getText('[data-testid="listing-card-title"]') ||
                   getText('[itemprop="name"]') ||
                   getText('div[id*="title"]'),
            price: getText('[data-testid="price-availability-row"]') ||
                   getText('span._tyxjp1') ||
                   getText('span[aria-label*="price"]'),
            location: getText('[data-testid="listing-card-subtitle"]') ||
                      getText('span[data-testid="listing-card-name"]'),
            rating: getAttr('[aria-label*="rating"]', 'aria-label') ||
                    getText('span[aria-label*="rating"]'),
            url: card.querySelector('a') ? card.querySelector('a').href : ''
        };
    })
)
"#;

/// Probes for a usable "next page" control without clicking it.
///
/// `aria-disabled` set to anything but `"false"` counts as disabled — the
/// site marks the control disabled on the last page rather than removing it.
pub const NEXT_CONTROL_PROBE: &str = r#"
JSON.stringify((() => {
    const next = document.querySelector('a[aria-label="Next"]') ||
                 document.querySelector('a[aria-label*="next"]') ||
                 document.querySelector('nav a:last-child');
    if (!next) {
        return { present: false, disabled: false };
    }
    const dis = next.getAttribute('aria-disabled');
    return { present: true, disabled: dis !== null && dis !== 'false' };
})())
"#;

/// Inner text of the detail-page overview block (guests/bedrooms/bathrooms
/// summary line). Empty string when the block is missing.
pub const DETAIL_OVERVIEW_QUERY: &str = r#"
JSON.stringify((() => {
    const section = document.querySelector('div[data-section-id*="OVERVIEW"]');
    return section ? section.innerText : '';
})())
"#;

pub const SCROLL_TO_MIDPOINT: &str = "window.scrollTo(0, document.body.scrollHeight / 2)";
pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0)";

/// Row shape produced by [`LOCATION_CARDS_QUERY`].
#[derive(Debug, Deserialize)]
pub struct LocationRow {
    pub name: String,
    pub url: String,
}

/// Row shape produced by [`SUMMARY_CARDS_QUERY`].
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryCardRow {
    pub title: String,
    pub price: String,
    pub location: String,
    pub rating: String,
    pub url: String,
}

/// Shape produced by [`NEXT_CONTROL_PROBE`].
#[derive(Debug, Deserialize)]
pub struct NextControlProbe {
    pub present: bool,
    pub disabled: bool,
}

/// Failure modes of one page-query evaluation. Callers map these into their
/// own [`crate::ScraperError`] variant with page/URL context attached.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("evaluation failed: {0}")]
    Eval(String),
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

/// Evaluates a named query rule and decodes its JSON-string result.
///
/// # Errors
///
/// Returns [`QueryError::Eval`] if the browser rejects the script and
/// [`QueryError::Decode`] if the returned payload does not match `T` —
/// the signature that the rule no longer matches the site's markup.
pub async fn eval_query<T: DeserializeOwned>(page: &Page, script: &str) -> Result<T, QueryError> {
    let value: String = page
        .evaluate(script.to_string())
        .await
        .map_err(|e| QueryError::Eval(e.to_string()))?
        .into_value()
        .map_err(|e| QueryError::Eval(e.to_string()))?;

    Ok(serde_json::from_str::<T>(&value)?)
}

/// Runs a side-effecting script (scrolls) where no result is expected.
///
/// # Errors
///
/// Returns [`QueryError::Eval`] if the browser rejects the script.
pub async fn eval_action(page: &Page, script: &str) -> Result<(), QueryError> {
    page.evaluate(script.to_string())
        .await
        .map_err(|e| QueryError::Eval(e.to_string()))?;
    Ok(())
}

/// Clicks the "next page" control, trying each known selector in order.
///
/// # Errors
///
/// Returns [`QueryError::Eval`] if no selector resolves to a clickable
/// element. Run [`NEXT_CONTROL_PROBE`] first to distinguish "pagination
/// ended" from "control present but click failed".
pub async fn click_next_control(page: &Page) -> Result<(), QueryError> {
    let mut last_err = String::from("no next-control selector matched");

    for selector in NEXT_CONTROL_SELECTORS {
        match page.find_element(*selector).await {
            Ok(element) => match element.click().await {
                Ok(_) => return Ok(()),
                Err(e) => last_err = e.to_string(),
            },
            Err(e) => last_err = e.to_string(),
        }
    }

    Err(QueryError::Eval(last_err))
}

/// Polls for `selector` until it appears or `timeout` elapses.
///
/// Returns `true` if the element showed up. The poll interval is coarse;
/// rendering on this site is settled by pacing pauses, not by this loop.
pub async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> bool {
    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_ok() {
            return true;
        }
        if tokio::time::Instant::now() + POLL_INTERVAL > deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_rows_decode_from_query_shape() {
        let payload = r#"[{"name":"Lisbon","url":"https://www.airbnb.com/s/Lisbon/homes"}]"#;
        let rows: Vec<LocationRow> = serde_json::from_str(payload).expect("rows should decode");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Lisbon");
    }

    #[test]
    fn summary_rows_decode_from_query_shape() {
        let payload = r#"[{
            "title": "Seaside loft",
            "price": "$125 night",
            "location": "Lisbon, Portugal",
            "rating": "4.95 (312 reviews)",
            "url": "https://www.airbnb.com/rooms/12345?check_in=2026-09-01"
        }]"#;
        let rows: Vec<SummaryCardRow> = serde_json::from_str(payload).expect("rows should decode");
        assert_eq!(rows[0].title, "Seaside loft");
        assert_eq!(rows[0].rating, "4.95 (312 reviews)");
    }

    #[test]
    fn next_probe_decodes_both_fields() {
        let probe: NextControlProbe =
            serde_json::from_str(r#"{"present":true,"disabled":false}"#).expect("probe decodes");
        assert!(probe.present);
        assert!(!probe.disabled);
    }

    #[test]
    fn decode_failure_is_reported_as_decode_variant() {
        let result = serde_json::from_str::<Vec<LocationRow>>(r#"{"oops":1}"#)
            .map_err(QueryError::from);
        assert!(matches!(result, Err(QueryError::Decode(_))));
    }
}
