use thiserror::Error;

mod config;
mod listing;

pub use config::{
    database_url, load_scrape_config, OutputConfig, ScrapeConfig, ScraperConfig,
};
pub use listing::NormalizedListing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}
