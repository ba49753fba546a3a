use tracing::debug;

use crate::aggregate::{rank, saturating_sum, sum_by_one, top_n, Filter};
use crate::error::DashboardError;
use crate::models::{
    BrandOverview, Column, Dataset, EventRecord, KeyValue, MarketplaceShare, PivotTable,
    RankedEntry, SummaryStats,
};

/// Number of suspect (infringing) brands listed per overview.
pub const SUSPECT_BRANDS: usize = 2;

/// Marketplace shares of a brand's latest-week total, largest first.
pub fn marketplace_shares(
    brand: &str,
    rows: &[&EventRecord],
) -> Result<Vec<MarketplaceShare>, DashboardError> {
    let total = saturating_sum(rows.iter().map(|r| r.count));
    if total == 0 {
        return Err(DashboardError::DivisionByZero {
            brand: brand.to_string(),
        });
    }

    let shares = rank(sum_by_one(rows.iter().copied(), Column::MarketplaceId, &Filter::new()))
        .into_iter()
        .map(|entry| MarketplaceShare {
            percent: entry.total as f64 / total as f64 * 100.0,
            marketplace_id: entry.key,
        })
        .collect();
    Ok(shares)
}

/// Latest-week digest for one brand.
///
/// A zero total leaves `top_marketplace` and `top_category` empty instead
/// of failing.
pub fn summarize_brand(dataset: &Dataset, brand: &str, latest_week: i64) -> BrandOverview {
    let filter = Filter::new()
        .with(Column::ProtectedBrandName, [brand])
        .with(Column::Week, [latest_week]);
    let rows: Vec<&EventRecord> = dataset.records.iter().filter(|r| filter.matches(r)).collect();
    let total = saturating_sum(rows.iter().map(|r| r.count));

    let top_marketplace = match marketplace_shares(brand, &rows) {
        Ok(shares) => shares.into_iter().next(),
        Err(err) => {
            debug!(brand, week = latest_week, error = %err, "omitting marketplace share");
            None
        }
    };

    let top_category = if total == 0 {
        None
    } else {
        top_n(
            sum_by_one(rows.iter().copied(), Column::GlProductGroupDesc, &Filter::new()),
            1,
        )
        .into_iter()
        .next()
    };

    let suspect_brands = top_n(
        sum_by_one(rows.iter().copied(), Column::InfringingBrand, &Filter::new()),
        SUSPECT_BRANDS,
    );

    BrandOverview {
        brand: brand.to_string(),
        week: latest_week,
        total,
        top_marketplace,
        top_category,
        suspect_brands,
    }
}

/// One overview per data row of the (top-brand) pivot. The Grand Total row
/// is never summarized.
pub fn summarize_brands(
    dataset: &Dataset,
    top_brands: &PivotTable,
    latest_week: Option<i64>,
) -> Vec<BrandOverview> {
    let Some(week) = latest_week else {
        return Vec::new();
    };
    top_brands
        .rows
        .iter()
        .map(|row| summarize_brand(dataset, &row.key, week))
        .collect()
}

/// Whole-dataset headline numbers, independent of the week window.
pub fn summary_stats(dataset: &Dataset) -> SummaryStats {
    let all = Filter::new();
    let dates = dataset.records.iter().filter_map(|r| r.action_date);
    SummaryStats {
        total_suppressions: saturating_sum(dataset.records.iter().map(|r| r.count)),
        event_rows: dataset.records.len(),
        total_brands: sum_by_one(&dataset.records, Column::ProtectedBrandName, &all).len(),
        total_marketplaces: sum_by_one(&dataset.records, Column::MarketplaceId, &all).len(),
        first_action_date: dates.clone().min(),
        last_action_date: dates.max(),
    }
}

/// Totals per brand over the rows whose week is in `weeks`.
pub fn brand_totals(dataset: &Dataset, weeks: &[i64]) -> Vec<(KeyValue, u64)> {
    if weeks.is_empty() {
        return Vec::new();
    }
    let filter = Filter::new().with(Column::Week, weeks.iter().copied());
    sum_by_one(&dataset.records, Column::ProtectedBrandName, &filter)
        .into_iter()
        .collect()
}

/// Top brands by total count across `weeks`.
pub fn top_brands(dataset: &Dataset, weeks: &[i64], n: usize) -> Vec<RankedEntry> {
    top_n(brand_totals(dataset, weeks), n)
}
