//! Database operations for the `listings` table.

use chrono::{DateTime, Utc};
use lodgedb_core::NormalizedListing;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `listings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub title: String,
    /// Nightly price as `NUMERIC(10,2)`.
    pub price: Decimal,
    pub location: String,
    /// Guest rating as `NUMERIC(3,2)`, `0.00` for unrated listings.
    pub rating: Decimal,
    /// Canonical listing URL; carries a `UNIQUE` constraint.
    pub url: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub guests: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a listing row, keyed by canonical URL.
///
/// Conflicts on `url` update `title`, `price`, `location`, `rating`,
/// `bedrooms`, `bathrooms`, `guests`, and `updated_at` in place, so
/// re-scraping the same listing refreshes it rather than duplicating it.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_listing(pool: &PgPool, listing: &NormalizedListing) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO listings \
             (title, price, location, rating, url, bedrooms, bathrooms, guests) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (url) DO UPDATE SET \
             title      = EXCLUDED.title, \
             price      = EXCLUDED.price, \
             location   = EXCLUDED.location, \
             rating     = EXCLUDED.rating, \
             bedrooms   = EXCLUDED.bedrooms, \
             bathrooms  = EXCLUDED.bathrooms, \
             guests     = EXCLUDED.guests, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(&listing.title)
    .bind(listing.price)
    .bind(&listing.location)
    .bind(listing.rating)
    .bind(&listing.url)
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(listing.guests)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Fetches all stored listings, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_listings(pool: &PgPool) -> Result<Vec<ListingRow>, DbError> {
    let rows = sqlx::query_as::<_, ListingRow>(
        "SELECT id, title, price, location, rating, url, \
                bedrooms, bathrooms, guests, created_at, updated_at \
         FROM listings \
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
