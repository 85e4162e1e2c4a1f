//! CSV export of stored listings.

use std::io::Write;
use std::path::PathBuf;

use lodgedb_core::ScrapeConfig;
use lodgedb_db::ListingRow;

pub(crate) async fn run(config: &ScrapeConfig, out: Option<PathBuf>) -> anyhow::Result<()> {
    let pool = crate::open_pool().await?;
    let rows = lodgedb_db::list_all_listings(&pool).await?;

    if rows.is_empty() {
        tracing::warn!("no listings to export");
        return Ok(());
    }

    let path = out.unwrap_or_else(|| PathBuf::from(&config.output.csv_path));
    let file = std::fs::File::create(&path)?;
    write_listings(&rows, file)?;

    tracing::info!(count = rows.len(), path = %path.display(), "exported listings to CSV");
    Ok(())
}

/// Writes a header row plus one record per listing to `writer`.
fn write_listings<W: Write>(rows: &[ListingRow], writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "id",
        "title",
        "price",
        "location",
        "rating",
        "url",
        "bedrooms",
        "bathrooms",
        "guests",
        "created_at",
        "updated_at",
    ])?;

    for row in rows {
        csv_writer.write_record([
            row.id.to_string(),
            row.title.clone(),
            row.price.to_string(),
            row.location.clone(),
            row.rating.to_string(),
            row.url.clone(),
            row.bedrooms.to_string(),
            row.bathrooms.to_string(),
            row.guests.to_string(),
            row.created_at.to_rfc3339(),
            row.updated_at.to_rfc3339(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
