//! Detail worker pool: bounded concurrent fetch of per-listing capacity
//! counts.
//!
//! A fixed number of workers consume a shared queue of canonical URLs. Each
//! worker owns its own browser session for its whole lifetime — the
//! underlying driver does not support concurrent navigations in one session
//! — and retries each URL with a local attempt counter before recording a
//! terminal failure. Workers never touch the results map: completions flow
//! through a channel to a single collecting loop.
//!
//! The pool is written against [`DetailSession`]/[`DetailSessionFactory`]
//! so the queue/retry/fan-in logic is exercised in tests with scripted
//! sessions; production runs use one stealth session per worker.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lodgedb_core::ScraperConfig;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;
use crate::normalize::canonicalize_url;
use crate::pacing::Pacer;
use crate::parse::parse_detail_counts;
use crate::queries;
use crate::session::StealthSession;
use crate::types::{DetailCounts, DetailResult};
use crate::ListingScraper;

/// One unit of detail-fetch capability, owned by exactly one worker.
#[async_trait]
pub trait DetailSession: Send {
    /// Fetches capacity counts for one listing URL. One call is one
    /// attempt; the pool applies the per-attempt timeout and retry policy.
    async fn fetch_counts(&mut self, url: &str) -> Result<DetailCounts, ScraperError>;

    /// Deterministic teardown of whatever the session owns.
    async fn close(self: Box<Self>) {}
}

/// Opens a fresh [`DetailSession`] per worker.
#[async_trait]
pub trait DetailSessionFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Session`] when a session cannot be
    /// constructed; the failing worker exits and the rest of the pool
    /// drains the queue.
    async fn open_session(&self) -> Result<Box<dyn DetailSession>, ScraperError>;
}

/// Pool sizing and retry policy, fixed per run.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub worker_count: usize,
    /// Additional attempts per URL after the first failure.
    pub max_retries: u32,
    /// Bound on a single attempt (navigate + wait + query).
    pub per_attempt_timeout: Duration,
    /// Jitter range used between retry attempts.
    pub pacer: Pacer,
}

impl ListingScraper {
    /// Fetches capacity counts for `urls` with the configured worker pool.
    ///
    /// Returns a map with exactly one [`DetailResult`] per distinct
    /// canonical URL — success or terminal failure — once every submitted
    /// URL has been accounted for. Per-URL failures never abort the pool.
    pub async fn fetch_details(
        &self,
        cancel: &CancellationToken,
        urls: &[String],
    ) -> HashMap<String, DetailResult> {
        let options = PoolOptions {
            worker_count: self.config.worker_count,
            max_retries: self.config.max_retries,
            per_attempt_timeout: Duration::from_secs(self.config.timeout_secs),
            pacer: self.pacer,
        };
        let factory: Arc<dyn DetailSessionFactory> = Arc::new(BrowserSessionFactory {
            config: self.config.clone(),
        });
        fetch_details_with(cancel, urls, &options, factory).await
    }
}

/// Pool implementation, parameterized over the session factory.
///
/// This is a join point: it returns only after every distinct canonical URL
/// from `urls` has exactly one entry in the result map.
pub async fn fetch_details_with(
    cancel: &CancellationToken,
    urls: &[String],
    options: &PoolOptions,
    factory: Arc<dyn DetailSessionFactory>,
) -> HashMap<String, DetailResult> {
    // Canonicalize once, at the point URLs enter the pool, so queue entries,
    // result keys, and the caller's merge lookups all agree.
    let mut seen = HashSet::new();
    let mut work = VecDeque::new();
    for url in urls {
        let canonical = canonicalize_url(url);
        if canonical.is_empty() {
            tracing::debug!(url = %url, "skipping listing with empty URL");
            continue;
        }
        if seen.insert(canonical.clone()) {
            work.push_back(canonical);
        }
    }

    let expected: Vec<String> = work.iter().cloned().collect();
    let mut results = HashMap::with_capacity(expected.len());
    if expected.is_empty() {
        return results;
    }

    tracing::info!(
        urls = expected.len(),
        workers = options.worker_count,
        "starting detail worker pool"
    );

    let queue = Arc::new(Mutex::new(work));
    let (tx, mut rx) = mpsc::channel::<DetailResult>(expected.len());

    let worker_count = options.worker_count.clamp(1, expected.len());
    let mut workers = JoinSet::new();
    for worker_id in 0..worker_count {
        workers.spawn(run_worker(
            worker_id,
            Arc::clone(&queue),
            tx.clone(),
            cancel.clone(),
            options.clone(),
            Arc::clone(&factory),
        ));
    }
    drop(tx);

    // Single collecting loop: workers never write the map directly.
    while let Some(result) = rx.recv().await {
        results.insert(result.url.clone(), result);
    }
    while workers.join_next().await.is_some() {}

    // Completion contract: back-fill URLs no worker got to (all sessions
    // failed to open, or the run was cancelled mid-queue).
    for url in expected {
        results.entry(url.clone()).or_insert_with(|| {
            let error = if cancel.is_cancelled() {
                ScraperError::Cancelled
            } else {
                ScraperError::Session {
                    reason: "no worker available to process this URL".to_string(),
                }
            };
            DetailResult::failure(url, error)
        });
    }

    results
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<String>>>,
    tx: mpsc::Sender<DetailResult>,
    cancel: CancellationToken,
    options: PoolOptions,
    factory: Arc<dyn DetailSessionFactory>,
) {
    let mut session = match factory.open_session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(worker = worker_id, error = %e, "worker could not open a session; exiting");
            return;
        }
    };

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Lock only to pop; never held across an await on page work.
        let url = queue.lock().await.pop_front();
        let Some(url) = url else { break };

        let result = fetch_one(worker_id, session.as_mut(), &url, &cancel, &options).await;
        if tx.send(result).await.is_err() {
            break;
        }
    }

    session.close().await;
}

/// Drives one URL to a terminal [`DetailResult`]: up to `1 + max_retries`
/// attempts, each bounded by the per-attempt timeout, with a jittered pause
/// between attempts. The attempt counter is local to this call — no retry
/// state is shared between workers.
async fn fetch_one(
    worker_id: usize,
    session: &mut dyn DetailSession,
    url: &str,
    cancel: &CancellationToken,
    options: &PoolOptions,
) -> DetailResult {
    let mut attempt: u32 = 0;

    loop {
        let bounded = tokio::time::timeout(options.per_attempt_timeout, session.fetch_counts(url));
        let attempt_error = tokio::select! {
            () = cancel.cancelled() => {
                return DetailResult::failure(url.to_string(), ScraperError::Cancelled);
            }
            outcome = bounded => match outcome {
                Ok(Ok(counts)) => return DetailResult::success(url.to_string(), counts),
                Ok(Err(e)) => e,
                Err(_) => ScraperError::DetailFetch {
                    url: url.to_string(),
                    reason: format!(
                        "attempt timed out after {}s",
                        options.per_attempt_timeout.as_secs()
                    ),
                },
            },
        };

        if matches!(attempt_error, ScraperError::Cancelled) {
            return DetailResult::failure(url.to_string(), ScraperError::Cancelled);
        }

        if attempt >= options.max_retries || !attempt_error.is_retriable() {
            tracing::warn!(
                worker = worker_id,
                url,
                attempts = attempt + 1,
                error = %attempt_error,
                "detail fetch failed terminally"
            );
            return DetailResult::failure(url.to_string(), attempt_error);
        }

        attempt += 1;
        tracing::warn!(
            worker = worker_id,
            url,
            attempt,
            max_retries = options.max_retries,
            error = %attempt_error,
            "detail fetch attempt failed; retrying"
        );

        // A cancelled run must not sleep through its remaining retries.
        if options.pacer.settle(cancel).await.is_err() {
            return DetailResult::failure(url.to_string(), ScraperError::Cancelled);
        }
    }
}

/// Production factory: one stealth browser session per worker.
struct BrowserSessionFactory {
    config: ScraperConfig,
}

#[async_trait]
impl DetailSessionFactory for BrowserSessionFactory {
    async fn open_session(&self) -> Result<Box<dyn DetailSession>, ScraperError> {
        let session = StealthSession::launch(&self.config).await?;
        let page = session.page().clone();
        Ok(Box::new(BrowserDetailSession {
            session,
            page,
            pacer: Pacer::from_config(&self.config),
            wait_timeout: Duration::from_secs(self.config.timeout_secs),
        }))
    }
}

struct BrowserDetailSession {
    session: StealthSession,
    page: chromiumoxide::Page,
    pacer: Pacer,
    wait_timeout: Duration,
}

#[async_trait]
impl DetailSession for BrowserDetailSession {
    async fn fetch_counts(&mut self, url: &str) -> Result<DetailCounts, ScraperError> {
        let page = &self.page;

        page.goto(url.to_string())
            .await
            .map_err(|e| ScraperError::DetailFetch {
                url: url.to_string(),
                reason: format!("navigation failed: {e}"),
            })?;

        if !queries::wait_for_selector(page, queries::DETAIL_OVERVIEW_SELECTOR, self.wait_timeout)
            .await
        {
            return Err(ScraperError::DetailFetch {
                url: url.to_string(),
                reason: format!(
                    "overview section not visible within {}s",
                    self.wait_timeout.as_secs()
                ),
            });
        }

        // Self-throttle between the wait and the read, like every other
        // page interaction. The per-attempt timeout still bounds the whole
        // attempt from outside.
        tokio::time::sleep(self.pacer.delay()).await;

        let overview: String = queries::eval_query(page, queries::DETAIL_OVERVIEW_QUERY)
            .await
            .map_err(|e| ScraperError::DetailFetch {
                url: url.to_string(),
                reason: format!("overview query failed: {e}"),
            })?;

        Ok(parse_detail_counts(&overview))
    }

    async fn close(self: Box<Self>) {
        self.session.close().await;
    }
}

#[cfg(test)]
#[path = "details_test.rs"]
mod tests;
