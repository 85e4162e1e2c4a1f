use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Top-level scrape configuration, loaded from a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Scraper behavior: target site, pagination bounds, worker pool sizing,
/// anti-detection pacing, and retry policy.
///
/// The struct is immutable for the lifetime of a pipeline run; every
/// component receives it by reference from its constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Entry URL for location discovery, e.g. `"https://www.airbnb.com"`.
    pub base_url: String,
    /// Result pages to walk per location before stopping.
    pub max_pages: u32,
    /// Summary cards kept per page; cards beyond this are discarded.
    pub properties_per_page: usize,
    /// Concurrent detail-page workers, each with its own browser session.
    pub worker_count: usize,
    /// Lower bound for the jittered settle pause between page actions.
    pub delay_min_ms: u64,
    /// Upper bound for the jittered settle pause between page actions.
    pub delay_max_ms: u64,
    /// Run the browser headless. Disable for selector debugging.
    pub headless: bool,
    /// Bounded wait applied to navigation, visibility waits, and one
    /// detail-fetch attempt.
    pub timeout_secs: u64,
    /// Additional attempts per detail URL after the first failure.
    pub max_retries: u32,
}

/// Output plumbing: console JSON dump and CSV export target.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the raw listings as JSON after extraction.
    pub json_console: bool,
    /// Default path for the `export` command.
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_console: false,
            csv_path: "listings.csv".to_string(),
        }
    }
}

/// Load and validate the scrape configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_scrape_config(path: &Path) -> Result<ScrapeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_scrape_config(&content)
}

/// Parse and validate configuration from a YAML string.
///
/// Split out from [`load_scrape_config`] so validation can be tested without
/// touching the filesystem.
fn parse_scrape_config(content: &str) -> Result<ScrapeConfig, ConfigError> {
    let config: ScrapeConfig = serde_yaml::from_str(content)?;
    validate_scrape_config(&config)?;
    Ok(config)
}

fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    let s = &config.scraper;

    if s.base_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "scraper.base_url must be non-empty".to_string(),
        ));
    }

    if s.max_pages == 0 {
        return Err(ConfigError::Validation(
            "scraper.max_pages must be at least 1".to_string(),
        ));
    }

    if s.properties_per_page == 0 {
        return Err(ConfigError::Validation(
            "scraper.properties_per_page must be at least 1".to_string(),
        ));
    }

    if s.worker_count == 0 {
        return Err(ConfigError::Validation(
            "scraper.worker_count must be at least 1".to_string(),
        ));
    }

    if s.delay_min_ms > s.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "scraper.delay_min_ms ({}) must not exceed scraper.delay_max_ms ({})",
            s.delay_min_ms, s.delay_max_ms
        )));
    }

    if s.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "scraper.timeout_secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Read `DATABASE_URL` from the environment, loading `.env` files first.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] if `DATABASE_URL` is unset.
pub fn database_url() -> Result<String, ConfigError> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fully-populated valid YAML document.
    fn valid_yaml() -> &'static str {
        r"
scraper:
  base_url: https://www.airbnb.com
  max_pages: 2
  properties_per_page: 5
  worker_count: 3
  delay_min_ms: 1500
  delay_max_ms: 3500
  headless: true
  timeout_secs: 30
  max_retries: 3
output:
  json_console: true
  csv_path: out.csv
"
    }

    #[test]
    fn parses_valid_config() {
        let config = parse_scrape_config(valid_yaml()).expect("valid YAML should parse");
        assert_eq!(config.scraper.base_url, "https://www.airbnb.com");
        assert_eq!(config.scraper.max_pages, 2);
        assert_eq!(config.scraper.properties_per_page, 5);
        assert_eq!(config.scraper.worker_count, 3);
        assert_eq!(config.scraper.delay_min_ms, 1500);
        assert_eq!(config.scraper.delay_max_ms, 3500);
        assert!(config.scraper.headless);
        assert_eq!(config.scraper.timeout_secs, 30);
        assert_eq!(config.scraper.max_retries, 3);
        assert!(config.output.json_console);
        assert_eq!(config.output.csv_path, "out.csv");
    }

    #[test]
    fn output_section_is_optional_with_defaults() {
        let yaml = r"
scraper:
  base_url: https://www.airbnb.com
  max_pages: 1
  properties_per_page: 5
  worker_count: 1
  delay_min_ms: 0
  delay_max_ms: 0
  headless: true
  timeout_secs: 10
  max_retries: 0
";
        let config = parse_scrape_config(yaml).expect("config without output should parse");
        assert!(!config.output.json_console);
        assert_eq!(config.output.csv_path, "listings.csv");
    }

    #[test]
    fn rejects_empty_base_url() {
        let yaml = valid_yaml().replace("https://www.airbnb.com", "\"  \"");
        let result = parse_scrape_config(&yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("base_url")),
            "expected base_url validation error, got: {result:?}"
        );
    }

    #[test]
    fn rejects_zero_max_pages() {
        let yaml = valid_yaml().replace("max_pages: 2", "max_pages: 0");
        let result = parse_scrape_config(&yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("max_pages")),
            "expected max_pages validation error, got: {result:?}"
        );
    }

    #[test]
    fn rejects_zero_worker_count() {
        let yaml = valid_yaml().replace("worker_count: 3", "worker_count: 0");
        let result = parse_scrape_config(&yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("worker_count")),
            "expected worker_count validation error, got: {result:?}"
        );
    }

    #[test]
    fn rejects_inverted_delay_range() {
        let yaml = valid_yaml().replace("delay_min_ms: 1500", "delay_min_ms: 5000");
        let result = parse_scrape_config(&yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("delay_min_ms")),
            "expected delay range validation error, got: {result:?}"
        );
    }

    #[test]
    fn equal_delay_bounds_are_allowed() {
        let yaml = valid_yaml().replace("delay_max_ms: 3500", "delay_max_ms: 1500");
        assert!(parse_scrape_config(&yaml).is_ok());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = parse_scrape_config("scraper: [not, a, mapping");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
