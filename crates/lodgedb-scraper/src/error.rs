use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser session error: {reason}")]
    Session { reason: String },

    #[error("location discovery failed: {reason}")]
    Discovery { reason: String },

    #[error("page load timed out for {url} after {timeout_secs}s")]
    PageLoad { url: String, timeout_secs: u64 },

    #[error("listing extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("pagination advance failed: {reason}")]
    Pagination { reason: String },

    #[error("detail fetch failed for {url}: {reason}")]
    DetailFetch { url: String, reason: String },

    #[error("page query {query} returned malformed data: {source}")]
    QueryDecode {
        query: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl ScraperError {
    /// Returns `true` for failures worth retrying with the same session:
    /// navigation/visibility timeouts and per-URL detail failures.
    ///
    /// Cancellation and decode errors are not retriable — the former must
    /// short-circuit, the latter means the extraction rules no longer match
    /// the markup and retrying returns the same payload.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ScraperError::PageLoad { .. }
                | ScraperError::DetailFetch { .. }
                | ScraperError::Session { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_load_is_retriable() {
        let err = ScraperError::PageLoad {
            url: "https://example.com/rooms/1".to_string(),
            timeout_secs: 30,
        };
        assert!(err.is_retriable());
    }

    #[test]
    fn cancelled_is_not_retriable() {
        assert!(!ScraperError::Cancelled.is_retriable());
    }

    #[test]
    fn query_decode_is_not_retriable() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ScraperError::QueryDecode {
            query: "summary_cards",
            source,
        };
        assert!(!err.is_retriable());
    }
}
