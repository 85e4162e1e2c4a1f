pub mod details;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pacing;
pub mod parse;
pub mod queries;
pub mod session;
pub mod types;

pub use details::{fetch_details_with, DetailSession, DetailSessionFactory, PoolOptions};
pub use error::ScraperError;
pub use normalize::{canonicalize_url, normalize_listing, normalize_price, normalize_rating};
pub use pacing::Pacer;
pub use session::StealthSession;
pub use types::{DetailCounts, DetailResult, LocationTarget, RawListing};

use lodgedb_core::ScraperConfig;

/// The scraping pipeline's public surface: location discovery, paginated
/// listing extraction, and the detail worker pool.
///
/// Holds one immutable [`ScraperConfig`] for the lifetime of a run; every
/// session it opens inherits the same stealth settings and pacing range.
pub struct ListingScraper {
    config: ScraperConfig,
    pacer: Pacer,
}

impl ListingScraper {
    #[must_use]
    pub fn new(config: ScraperConfig) -> Self {
        let pacer = Pacer::from_config(&config);
        Self { config, pacer }
    }

    #[must_use]
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }
}
