//! Paginated listing extraction for one location.
//!
//! Pagination on the target site is DOM-driven: the "next page" control
//! mutates the result list in place rather than navigating to a distinct
//! URL. Advancing is therefore a stateful UI action — click, settle, wait
//! for the card container to reappear — not an idempotent URL fetch, and
//! each failure mode is handled at the page it occurs on.
//!
//! The page-walking state machine is written against [`ResultsPage`] so its
//! transitions are exercised in tests with scripted pages; production runs
//! drive a stealth session through the query rules in [`crate::queries`].

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::normalize::clean_text;
use crate::pacing::{with_cancel, Pacer};
use crate::queries::{self, NextControlProbe, QueryError, SummaryCardRow};
use crate::session::StealthSession;
use crate::types::RawListing;
use crate::ListingScraper;

/// The operations the extraction state machine performs against one
/// location's result pages.
#[async_trait]
pub(crate) trait ResultsPage: Send {
    /// Navigates to the location URL and waits for the card container.
    async fn open(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Runs the summary-card rule against the currently rendered page.
    async fn query_cards(&mut self) -> Result<Vec<SummaryCardRow>, ScraperError>;

    /// Probes for a usable "next page" control without clicking it.
    async fn probe_next(&mut self) -> Result<NextControlProbe, ScraperError>;

    /// Clicks the "next page" control.
    async fn click_next(&mut self) -> Result<(), ScraperError>;

    /// Waits for the card container to reappear after advancing.
    /// Returns `false` on a bounded-wait timeout.
    async fn wait_for_cards(&mut self) -> Result<bool, ScraperError>;
}

/// Outcome of one pagination advance.
enum PageAdvance {
    /// Clicked through; the next page's cards are visible.
    Advanced,
    /// No usable control — pagination genuinely ended.
    End,
    /// Probe, click, or post-click wait failed; already-extracted pages
    /// are kept.
    Failed(String),
}

impl ListingScraper {
    /// Extracts summary cards from up to `max_pages` result pages of one
    /// location, `properties_per_page` cards per page.
    ///
    /// Failures below page granularity degrade to partial results: an
    /// extraction failure yields zero cards for that page, an advance
    /// failure stops early with the pages collected so far.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Session`] if the browser cannot be launched.
    /// - [`ScraperError::PageLoad`] if the first page's card container
    ///   never becomes visible; the caller skips this location only.
    /// - [`ScraperError::Cancelled`] if the token fires mid-extraction.
    pub async fn extract_listings(
        &self,
        cancel: &CancellationToken,
        location_url: &str,
    ) -> Result<Vec<RawListing>, ScraperError> {
        let session = StealthSession::launch(&self.config).await?;
        let mut page = BrowserResultsPage {
            page: session.page().clone(),
            cancel: cancel.clone(),
            timeout_secs: self.config.timeout_secs,
        };

        let result = run_extraction(
            &mut page,
            &self.pacer,
            cancel,
            location_url,
            self.config.max_pages,
            self.config.properties_per_page,
        )
        .await;

        session.close().await;
        result
    }
}

/// The state machine: open the first page, then alternate extracting and
/// advancing until `max_pages` is reached or pagination ends.
pub(crate) async fn run_extraction(
    page: &mut dyn ResultsPage,
    pacer: &Pacer,
    cancel: &CancellationToken,
    location_url: &str,
    max_pages: u32,
    per_page: usize,
) -> Result<Vec<RawListing>, ScraperError> {
    tracing::info!(url = %location_url, max_pages, "starting listing extraction");

    page.open(location_url).await?;

    let mut all_listings = Vec::new();

    for page_num in 1..=max_pages {
        pacer.settle(cancel).await?;

        // A query failure is logged and treated as zero results for this
        // page; the location is not aborted.
        match page.query_cards().await {
            Ok(rows) => {
                let listings = cards_to_listings(rows, per_page);
                tracing::info!(
                    page = page_num,
                    count = listings.len(),
                    "extracted listings from page"
                );
                all_listings.extend(listings);
            }
            Err(ScraperError::Cancelled) => return Err(ScraperError::Cancelled),
            Err(e) => {
                tracing::warn!(
                    page = page_num,
                    error = %e,
                    "card extraction failed; treating page as empty"
                );
            }
        }

        if page_num == max_pages {
            break;
        }

        match advance_page(page, pacer, cancel).await? {
            PageAdvance::Advanced => {}
            PageAdvance::End => {
                tracing::info!(page = page_num, "no further pages available");
                break;
            }
            PageAdvance::Failed(reason) => {
                tracing::warn!(
                    page = page_num,
                    reason = %reason,
                    "pagination advance failed; keeping pages extracted so far"
                );
                break;
            }
        }
    }

    tracing::info!(
        url = %location_url,
        total = all_listings.len(),
        "finished listing extraction"
    );
    Ok(all_listings)
}

/// Advances to the next result page: probe the control, click it, settle,
/// then wait for the card container to reappear. Only cancellation
/// propagates as an error; every other failure becomes a terminal
/// [`PageAdvance`] for this location.
async fn advance_page(
    page: &mut dyn ResultsPage,
    pacer: &Pacer,
    cancel: &CancellationToken,
) -> Result<PageAdvance, ScraperError> {
    let probe = match page.probe_next().await {
        Ok(probe) => probe,
        Err(ScraperError::Cancelled) => return Err(ScraperError::Cancelled),
        Err(e) => return Ok(PageAdvance::Failed(format!("next-control probe: {e}"))),
    };

    if !probe.present || probe.disabled {
        return Ok(PageAdvance::End);
    }

    if let Err(e) = page.click_next().await {
        if matches!(e, ScraperError::Cancelled) {
            return Err(ScraperError::Cancelled);
        }
        return Ok(PageAdvance::Failed(format!("next-control click: {e}")));
    }

    pacer.settle(cancel).await?;

    if page.wait_for_cards().await? {
        Ok(PageAdvance::Advanced)
    } else {
        Ok(PageAdvance::Failed(
            "cards did not reappear after advancing".to_string(),
        ))
    }
}

/// Maps query rows into [`RawListing`]s: the first `per_page` cards are
/// kept, the rest discarded, and cards missing a title or URL are dropped.
fn cards_to_listings(rows: Vec<SummaryCardRow>, per_page: usize) -> Vec<RawListing> {
    rows.into_iter()
        .take(per_page)
        .filter_map(|row| {
            let title = clean_text(&row.title);
            if title.is_empty() || row.url.is_empty() {
                return None;
            }
            Some(RawListing {
                title,
                price_text: clean_text(&row.price),
                location_text: clean_text(&row.location),
                rating_text: clean_text(&row.rating),
                url: row.url,
                bedrooms: 0,
                bathrooms: 0,
                guests: 0,
            })
        })
        .collect()
}

/// Production implementation: one stealth session's page driven through the
/// query rule set, every blocking call racing the run's cancellation token.
struct BrowserResultsPage {
    page: chromiumoxide::Page,
    cancel: CancellationToken,
    timeout_secs: u64,
}

impl BrowserResultsPage {
    fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[async_trait]
impl ResultsPage for BrowserResultsPage {
    async fn open(&mut self, url: &str) -> Result<(), ScraperError> {
        let page = &self.page;

        with_cancel(&self.cancel, page.goto(url.to_string()))
            .await?
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "first page navigation failed");
                ScraperError::PageLoad {
                    url: url.to_string(),
                    timeout_secs: self.timeout_secs,
                }
            })?;

        let visible = with_cancel(
            &self.cancel,
            queries::wait_for_selector(page, queries::SUMMARY_CARD_SELECTOR, self.wait_timeout()),
        )
        .await?;
        if visible {
            Ok(())
        } else {
            Err(ScraperError::PageLoad {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            })
        }
    }

    async fn query_cards(&mut self) -> Result<Vec<SummaryCardRow>, ScraperError> {
        with_cancel(
            &self.cancel,
            queries::eval_query::<Vec<SummaryCardRow>>(
                &self.page,
                queries::SUMMARY_CARDS_QUERY,
            ),
        )
        .await?
        .map_err(|e| match e {
            QueryError::Eval(reason) => ScraperError::Extraction { reason },
            QueryError::Decode(source) => ScraperError::QueryDecode {
                query: "summary_cards",
                source,
            },
        })
    }

    async fn probe_next(&mut self) -> Result<NextControlProbe, ScraperError> {
        with_cancel(
            &self.cancel,
            queries::eval_query::<NextControlProbe>(
                &self.page,
                queries::NEXT_CONTROL_PROBE,
            ),
        )
        .await?
        .map_err(|e| match e {
            QueryError::Eval(reason) => ScraperError::Pagination { reason },
            QueryError::Decode(source) => ScraperError::QueryDecode {
                query: "next_control_probe",
                source,
            },
        })
    }

    async fn click_next(&mut self) -> Result<(), ScraperError> {
        with_cancel(&self.cancel, queries::click_next_control(&self.page))
            .await?
            .map_err(|e| ScraperError::Pagination {
                reason: e.to_string(),
            })
    }

    async fn wait_for_cards(&mut self) -> Result<bool, ScraperError> {
        with_cancel(
            &self.cancel,
            queries::wait_for_selector(
                &self.page,
                queries::SUMMARY_CARD_SELECTOR,
                self.wait_timeout(),
            ),
        )
        .await
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
