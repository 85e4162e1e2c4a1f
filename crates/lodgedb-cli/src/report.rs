//! Market analytics over stored listings.

use lodgedb_db::ListingRow;
use rust_decimal::Decimal;

/// Aggregated statistics computed from the full listings table.
struct MarketReport {
    total: usize,
    average_price: Decimal,
    min_price: Decimal,
    max_price: Decimal,
    most_expensive: Option<String>,
    per_location: Vec<(String, usize)>,
    top_rated: Vec<(String, Decimal)>,
}

pub(crate) async fn run() -> anyhow::Result<()> {
    let pool = crate::open_pool().await?;
    let rows = lodgedb_db::list_all_listings(&pool).await?;
    let report = build_report(&rows);

    if report.total == 0 {
        println!("No listings stored yet. Run `lodgedb scrape` first.");
        return Ok(());
    }

    println!("=== MARKET REPORT ===");
    println!("Total listings:  {}", report.total);
    println!("Average price:   {}", report.average_price);
    println!("Min price:       {}", report.min_price);
    println!("Max price:       {}", report.max_price);
    if let Some(title) = &report.most_expensive {
        println!("Most expensive:  {title}");
    }

    println!("\nListings per location:");
    for (location, count) in &report.per_location {
        println!("  {location}: {count}");
    }

    println!("\nTop rated:");
    for (title, rating) in &report.top_rated {
        println!("  {rating}  {title}");
    }

    Ok(())
}

/// Pure aggregation over the stored rows; `run` handles I/O.
fn build_report(rows: &[ListingRow]) -> MarketReport {
    if rows.is_empty() {
        return MarketReport {
            total: 0,
            average_price: Decimal::ZERO,
            min_price: Decimal::ZERO,
            max_price: Decimal::ZERO,
            most_expensive: None,
            per_location: Vec::new(),
            top_rated: Vec::new(),
        };
    }

    let mut total_price = Decimal::ZERO;
    let mut min_price = rows[0].price;
    let mut max_price = rows[0].price;
    let mut most_expensive = &rows[0];
    let mut per_location: Vec<(String, usize)> = Vec::new();

    for row in rows {
        total_price += row.price;

        if row.price > max_price {
            max_price = row.price;
            most_expensive = row;
        }
        if row.price < min_price {
            min_price = row.price;
        }

        match per_location.iter_mut().find(|(loc, _)| *loc == row.location) {
            Some((_, count)) => *count += 1,
            None => per_location.push((row.location.clone(), 1)),
        }
    }

    per_location.sort_by(|a, b| b.1.cmp(&a.1));

    let mut by_rating: Vec<&ListingRow> = rows.iter().collect();
    by_rating.sort_by(|a, b| b.rating.cmp(&a.rating));
    let top_rated = by_rating
        .into_iter()
        .take(5)
        .map(|row| (row.title.clone(), row.rating))
        .collect();

    let average_price = (total_price / Decimal::from(rows.len())).round_dp(2);

    MarketReport {
        total: rows.len(),
        average_price,
        min_price,
        max_price,
        most_expensive: Some(most_expensive.title.clone()),
        per_location,
        top_rated,
    }
}
