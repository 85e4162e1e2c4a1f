//! Location discovery: one session against the entry page.
//!
//! The entry page renders its location cards lazily on scroll, so a naive
//! single-shot query after load captures only the first viewport's worth.
//! Discovery therefore scrolls to the page midpoint and back before running
//! the location-card rule.

use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::pacing::{sleep_cancellable, with_cancel};
use crate::queries::{self, LocationRow, QueryError};
use crate::session::StealthSession;
use crate::types::LocationTarget;
use crate::ListingScraper;

/// Settle after the entry page's initial load; the location rail hydrates
/// well after `DOMContentLoaded`.
const ENTRY_SETTLE: Duration = Duration::from_secs(5);

/// Settle after each scroll action while lazy cards stream in.
const SCROLL_SETTLE: Duration = Duration::from_secs(2);

impl ListingScraper {
    /// Discovers location targets from the configured entry page.
    ///
    /// Returns an empty list when the page renders no location cards — a
    /// valid result the caller treats as "nothing to scrape".
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Session`] if the browser cannot be launched; fatal
    ///   to the run since nothing downstream can proceed without locations.
    /// - [`ScraperError::Discovery`] if navigation or the query evaluation
    ///   itself fails.
    /// - [`ScraperError::Cancelled`] if the token fires mid-discovery.
    pub async fn discover_locations(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocationTarget>, ScraperError> {
        let session = StealthSession::launch(&self.config).await?;
        let result = self.discover_on(session.page(), cancel).await;
        session.close().await;
        result
    }

    async fn discover_on(
        &self,
        page: &chromiumoxide::Page,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocationTarget>, ScraperError> {
        let base_url = &self.config.base_url;

        tracing::info!(url = %base_url, "visiting entry page to discover locations");

        with_cancel(cancel, page.goto(base_url.clone()))
            .await?
            .map_err(|e| ScraperError::Discovery {
                reason: format!("failed to navigate to {base_url}: {e}"),
            })?;

        sleep_cancellable(ENTRY_SETTLE, cancel).await?;

        // Scroll to the midpoint and back to trigger lazy loading.
        run_scroll(page, queries::SCROLL_TO_MIDPOINT, cancel).await?;
        sleep_cancellable(SCROLL_SETTLE, cancel).await?;
        run_scroll(page, queries::SCROLL_TO_TOP, cancel).await?;
        sleep_cancellable(SCROLL_SETTLE, cancel).await?;

        let rows: Vec<LocationRow> =
            with_cancel(cancel, queries::eval_query(page, queries::LOCATION_CARDS_QUERY))
                .await?
                .map_err(|e| match e {
                    QueryError::Eval(reason) => ScraperError::Discovery { reason },
                    QueryError::Decode(source) => ScraperError::QueryDecode {
                        query: "location_cards",
                        source,
                    },
                })?;

        let locations = dedup_by_url(rows);
        tracing::info!(count = locations.len(), "discovered unique locations");

        Ok(locations)
    }
}

async fn run_scroll(
    page: &chromiumoxide::Page,
    script: &str,
    cancel: &CancellationToken,
) -> Result<(), ScraperError> {
    with_cancel(cancel, queries::eval_action(page, script))
        .await?
        .map_err(|e| ScraperError::Discovery {
            reason: format!("scroll action failed: {e}"),
        })
}

/// Deduplicates discovered rows by URL, first occurrence winning, preserving
/// encounter order.
fn dedup_by_url(rows: Vec<LocationRow>) -> Vec<LocationTarget> {
    let mut seen = HashSet::new();
    let mut locations = Vec::with_capacity(rows.len());

    for row in rows {
        if !seen.insert(row.url.clone()) {
            continue;
        }
        locations.push(LocationTarget {
            name: row.name,
            url: row.url,
        });
    }

    locations
}
