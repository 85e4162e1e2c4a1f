//! The pipeline driver: composes discovery, per-location extraction, the
//! detail worker pool, normalization, and persistence.
//!
//! Error containment follows the pipeline's propagation policy: only
//! session-creation and discovery failures abort the run; a failed
//! location, page, or detail URL degrades to partial results.

use lodgedb_core::ScrapeConfig;
use lodgedb_scraper::{
    canonicalize_url, normalize_listing, ListingScraper, RawListing, ScraperError,
};
use tokio_util::sync::CancellationToken;

pub(crate) async fn run(config: &ScrapeConfig) -> anyhow::Result<()> {
    tracing::info!("starting lodging market scraper");

    let pool = crate::open_pool().await?;
    let scraper = ListingScraper::new(config.scraper.clone());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            interrupt.cancel();
        }
    });

    // Step 1: discover location targets from the entry page.
    let locations = scraper.discover_locations(&cancel).await?;
    if locations.is_empty() {
        tracing::warn!("no locations found on entry page; nothing to scrape");
        return Ok(());
    }
    tracing::info!(count = locations.len(), "locations discovered");
    for (idx, location) in locations.iter().enumerate() {
        tracing::info!(n = idx + 1, name = %location.name, "  location");
    }

    // Step 2: extract listings per location, strictly sequentially —
    // pagination is stateful per location, so there is nothing to overlap.
    let mut all_raw: Vec<RawListing> = Vec::new();
    for (idx, location) in locations.iter().enumerate() {
        tracing::info!(
            n = idx + 1,
            total = locations.len(),
            name = %location.name,
            url = %location.url,
            "scraping location"
        );

        match scraper.extract_listings(&cancel, &location.url).await {
            Ok(listings) if listings.is_empty() => {
                tracing::warn!(name = %location.name, "no listings found for location");
            }
            Ok(listings) => {
                tracing::info!(
                    name = %location.name,
                    count = listings.len(),
                    "got listings from location"
                );
                all_raw.extend(listings);
            }
            Err(ScraperError::Cancelled) => {
                tracing::warn!("run cancelled during listing extraction");
                break;
            }
            Err(e) => {
                tracing::error!(name = %location.name, error = %e, "failed to scrape location");
            }
        }
    }

    tracing::info!(
        total = all_raw.len(),
        locations = locations.len(),
        "listing extraction finished"
    );

    if all_raw.is_empty() {
        tracing::warn!("no listings extracted; exiting");
        return Ok(());
    }

    if config.output.json_console {
        match serde_json::to_string_pretty(&all_raw) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to render raw listing summary"),
        }
    }

    // Step 3: fetch capacity counts. URLs are canonicalized here, where
    // they enter the pool, with the same function the merge below uses.
    let urls: Vec<String> = all_raw
        .iter()
        .filter(|listing| !listing.url.is_empty())
        .map(|listing| canonicalize_url(&listing.url))
        .collect();

    tracing::info!(count = urls.len(), "fetching detail pages");
    let details = scraper.fetch_details(&cancel, &urls).await;

    // Step 4: merge, normalize, persist. Upsert errors are per-record.
    let mut saved: usize = 0;
    let mut skipped: usize = 0;

    for raw in &all_raw {
        let detail = details.get(&canonicalize_url(&raw.url));
        let listing = normalize_listing(raw, detail);

        if !listing.is_storable() {
            tracing::warn!("skipping listing without title or URL");
            skipped += 1;
            continue;
        }

        match lodgedb_db::upsert_listing(&pool, &listing).await {
            Ok(_) => {
                saved += 1;
                tracing::info!(title = %listing.title, price = %listing.price, "saved listing");
            }
            Err(e) => {
                skipped += 1;
                tracing::error!(title = %listing.title, error = %e, "failed to save listing");
            }
        }
    }

    tracing::info!(
        locations = locations.len(),
        extracted = all_raw.len(),
        saved,
        skipped,
        "scrape complete"
    );
    #[allow(clippy::cast_precision_loss)]
    let per_location = all_raw.len() as f64 / locations.len() as f64;
    tracing::info!(average_listings_per_location = %format!("{per_location:.1}"));

    Ok(())
}
