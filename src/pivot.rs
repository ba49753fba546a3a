use std::collections::HashMap;

use tracing::debug;

use crate::aggregate::{saturating_sum, sum_by, Filter};
use crate::models::{
    Column, Dataset, KeyValue, PivotRow, PivotTable, WeekWindow, WeeklySummary, WeeklyTotal,
    GRAND_TOTAL,
};

/// Reshapes `row_column` × week sums into a dense matrix over the window.
///
/// When `restrict_to` is given the table has exactly those rows (zero-filled
/// if absent from the data); otherwise one row per key present. Rows are
/// sorted by their total, descending, ties by key. The Grand Total row is
/// computed after sorting.
pub fn build_pivot(
    dataset: &Dataset,
    row_column: Column,
    window: &WeekWindow,
    restrict_to: Option<&[String]>,
) -> PivotTable {
    let mut filter = Filter::new().with(Column::Week, window.descending().iter().copied());
    if let Some(keys) = restrict_to {
        filter = filter.with(row_column, keys.iter().map(|k| k.as_str()));
    }

    let grouped = if window.is_empty() || restrict_to.is_some_and(|keys| keys.is_empty()) {
        HashMap::new()
    } else {
        sum_by(&dataset.records, &[row_column, Column::Week], &filter)
    };

    let weeks = window.ascending();
    let column_of: HashMap<i64, usize> = weeks.iter().enumerate().map(|(i, w)| (*w, i)).collect();

    let mut matrix: HashMap<String, Vec<u64>> = HashMap::new();
    if let Some(keys) = restrict_to {
        for key in keys {
            matrix.insert(key.clone(), vec![0; weeks.len()]);
        }
    }
    for (key, total) in grouped {
        let (row_key, week) = match key.as_slice() {
            [row_key, KeyValue::Week(week)] => (row_key.to_string(), *week),
            _ => continue,
        };
        if let Some(&col) = column_of.get(&week) {
            let cell = &mut matrix.entry(row_key).or_insert_with(|| vec![0; weeks.len()])[col];
            *cell = cell.saturating_add(total);
        }
    }

    let mut rows: Vec<PivotRow> = matrix
        .into_iter()
        .map(|(key, cells)| PivotRow {
            total: saturating_sum(cells.iter().copied()),
            key,
            cells,
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));

    let mut column_totals = vec![0u64; weeks.len()];
    for row in &rows {
        for (sum, cell) in column_totals.iter_mut().zip(&row.cells) {
            *sum = sum.saturating_add(*cell);
        }
    }
    let grand_total = PivotRow {
        key: GRAND_TOTAL.to_string(),
        total: saturating_sum(column_totals.iter().copied()),
        cells: column_totals,
    };

    debug!(
        row_column = row_column.name(),
        rows = rows.len(),
        weeks = weeks.len(),
        "built pivot"
    );

    PivotTable {
        row_label: row_column.name().to_string(),
        weeks,
        rows,
        grand_total,
    }
}

/// Per-week totals in the window's own (newest-first) order.
pub fn build_weekly_summary(dataset: &Dataset, window: &WeekWindow) -> WeeklySummary {
    let filter = Filter::new().with(Column::Week, window.descending().iter().copied());
    let grouped = if window.is_empty() {
        HashMap::new()
    } else {
        sum_by(&dataset.records, &[Column::Week], &filter)
    };

    let weeks: Vec<WeeklyTotal> = window
        .descending()
        .iter()
        .map(|&week| WeeklyTotal {
            week,
            total: grouped.get(&vec![KeyValue::Week(week)]).copied().unwrap_or(0),
        })
        .collect();
    let grand_total = saturating_sum(weeks.iter().map(|w| w.total));

    WeeklySummary { weeks, grand_total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, scenario};
    use crate::loader::select_week_window;
    use pretty_assertions::assert_eq;

    fn row(key: &str, cells: &[u64], total: u64) -> PivotRow {
        PivotRow {
            key: key.to_string(),
            cells: cells.to_vec(),
            total,
        }
    }

    #[test]
    fn scenario_brand_pivot() {
        let dataset = scenario();
        let window = select_week_window(&dataset);
        let pivot = build_pivot(&dataset, Column::ProtectedBrandName, &window, None);

        assert_eq!(pivot.column_headers(), vec!["1", "2", "Grand Total"]);
        assert_eq!(pivot.rows, vec![row("A", &[10, 20], 30), row("B", &[5, 0], 5)]);
        assert_eq!(pivot.grand_total, row(GRAND_TOTAL, &[15, 20], 35));
    }

    #[test]
    fn scenario_weekly_summary() {
        let dataset = scenario();
        let window = select_week_window(&dataset);
        let summary = build_weekly_summary(&dataset, &window);

        assert_eq!(
            summary.weeks,
            vec![
                WeeklyTotal { week: 2, total: 20 },
                WeeklyTotal { week: 1, total: 15 },
            ]
        );
        assert_eq!(summary.grand_total, 35);
    }

    #[test]
    fn rows_outside_the_window_are_ignored() {
        let dataset = Dataset::new(vec![
            record(100, "Old", "US", 1),
            record(1, "A", "US", 2),
            record(2, "A", "US", 3),
            record(3, "B", "US", 4),
            record(4, "B", "US", 5),
        ]);
        let window = select_week_window(&dataset);
        let pivot = build_pivot(&dataset, Column::ProtectedBrandName, &window, None);

        assert_eq!(pivot.weeks, vec![2, 3, 4, 5]);
        assert_eq!(pivot.row_keys(), vec!["B", "A"]);
        assert_eq!(pivot.grand_total.total, 10);
    }

    #[test]
    fn restricted_rows_keep_absent_keys_as_zero() {
        let dataset = scenario();
        let window = select_week_window(&dataset);
        let keys = vec!["B".to_string(), "Ghost".to_string()];
        let pivot = build_pivot(&dataset, Column::ProtectedBrandName, &window, Some(&keys));

        assert_eq!(pivot.rows, vec![row("B", &[5, 0], 5), row("Ghost", &[0, 0], 0)]);
        assert_eq!(pivot.grand_total, row(GRAND_TOTAL, &[5, 0], 5));
    }

    #[test]
    fn equal_totals_sort_by_key() {
        let dataset = Dataset::new(vec![
            record(5, "zeta", "US", 1),
            record(5, "alpha", "US", 1),
            record(5, "mid", "US", 1),
        ]);
        let window = select_week_window(&dataset);
        let pivot = build_pivot(&dataset, Column::MarketplaceId, &window, None);
        assert_eq!(pivot.row_keys(), vec!["US"]);

        let pivot = build_pivot(&dataset, Column::ProtectedBrandName, &window, None);
        assert_eq!(pivot.row_keys(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn totals_are_consistent() {
        let dataset = Dataset::new(vec![
            record(3, "A", "US", 1),
            record(8, "A", "UK", 2),
            record(2, "B", "US", 2),
            record(9, "C", "DE", 3),
            record(4, "B", "DE", 4),
            record(6, "C", "US", 4),
        ]);
        let window = select_week_window(&dataset);
        let input_total: u64 = dataset.records.iter().map(|r| r.count).sum();

        for column in [Column::ProtectedBrandName, Column::MarketplaceId] {
            let pivot = build_pivot(&dataset, column, &window, None);
            assert_eq!(pivot.grand_total.total, input_total);
            for r in &pivot.rows {
                assert_eq!(r.total, r.cells.iter().sum::<u64>());
            }
            for (idx, cell) in pivot.grand_total.cells.iter().enumerate() {
                let column_sum: u64 = pivot.rows.iter().map(|r| r.cells[idx]).sum();
                assert_eq!(*cell, column_sum);
            }
        }
    }

    #[test]
    fn empty_dataset_builds_empty_tables() {
        let dataset = Dataset::default();
        let window = select_week_window(&dataset);
        let pivot = build_pivot(&dataset, Column::ProtectedBrandName, &window, None);
        assert!(pivot.rows.is_empty());
        assert_eq!(pivot.grand_total.total, 0);
        assert_eq!(pivot.column_headers(), vec!["Grand Total"]);

        let summary = build_weekly_summary(&dataset, &window);
        assert!(summary.weeks.is_empty());
        assert_eq!(summary.grand_total, 0);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let dataset = Dataset::new(vec![
            record(u64::MAX, "A", "US", 1),
            record(u64::MAX, "A", "US", 2),
            record(5, "B", "US", 2),
        ]);
        let window = select_week_window(&dataset);
        let pivot = build_pivot(&dataset, Column::ProtectedBrandName, &window, None);
        assert_eq!(pivot.rows[0], row("A", &[u64::MAX, u64::MAX], u64::MAX));
        assert_eq!(pivot.grand_total, row(GRAND_TOTAL, &[u64::MAX, u64::MAX], u64::MAX));

        let summary = build_weekly_summary(&dataset, &window);
        assert_eq!(summary.total_for(2), Some(u64::MAX));
        assert_eq!(summary.grand_total, u64::MAX);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let dataset = scenario();
        let window = select_week_window(&dataset);
        let first = build_pivot(&dataset, Column::MarketplaceId, &window, None);
        let second = build_pivot(&dataset, Column::MarketplaceId, &window, None);
        assert_eq!(first, second);
    }
}
