use std::fmt::Write;

use crate::models::{BrandOverview, PivotTable, WeeklySummary, GRAND_TOTAL};
use crate::session::Dashboard;

pub const DEFAULT_TITLE: &str = "ASIN Suppression Analysis Dashboard";

/// Renders an integer with comma thousands separators.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            output.push(',');
        }
        output.push(ch);
    }
    output
}

/// `~12.3K` style approximation used in prose.
pub fn approx_k(value: f64) -> String {
    format!("~{:.1}K", value / 1000.0)
}

/// Latest-week headline: total and change against the previous week
/// number (zero when that week is not in the summary).
pub fn overview_sentence(summary: &WeeklySummary, latest_week: i64) -> String {
    let current = summary.total_for(latest_week).unwrap_or(0) as f64;
    let previous = latest_week
        .checked_sub(1)
        .and_then(|week| summary.total_for(week))
        .unwrap_or(0) as f64;
    let change = current - previous;
    format!(
        "During WK{latest_week}, overall {} ASINs were suppressed, with a {} of {} ASINs w.r.t. previous week.",
        approx_k(current),
        if change < 0.0 { "reduction" } else { "increase" },
        approx_k(change.abs())
    )
}

pub fn render_weekly_summary(output: &mut String, summary: &WeeklySummary) {
    if summary.weeks.is_empty() {
        let _ = writeln!(output, "No data.");
        return;
    }
    let _ = writeln!(output, "| Week | ASIN Count |");
    let _ = writeln!(output, "| --- | ---: |");
    for week in &summary.weeks {
        let _ = writeln!(output, "| {} | {} |", week.week, thousands(week.total));
    }
    let _ = writeln!(
        output,
        "| {} | {} |",
        GRAND_TOTAL,
        thousands(summary.grand_total)
    );
}

/// Escapes the Markdown table cell separator.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

pub fn render_pivot(output: &mut String, pivot: &PivotTable) {
    if pivot.rows.is_empty() {
        let _ = writeln!(output, "No data.");
        return;
    }
    let headers = pivot.column_headers();
    let _ = writeln!(
        output,
        "| {} | {} |",
        escape_cell(&pivot.row_label),
        headers.join(" | ")
    );
    let _ = writeln!(
        output,
        "| --- |{}",
        " ---: |".repeat(headers.len())
    );
    for row in pivot.all_rows() {
        let cells: Vec<String> = row
            .cells
            .iter()
            .chain(std::iter::once(&row.total))
            .map(|value| thousands(*value))
            .collect();
        let _ = writeln!(output, "| {} | {} |", escape_cell(&row.key), cells.join(" | "));
    }
}

pub fn render_overview(output: &mut String, index: usize, overview: &BrandOverview) {
    let _ = writeln!(output, "#### 4.{} - {}", index, overview.brand);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Total suppressions in Week {}: {} ASINs",
        overview.week,
        approx_k(overview.total as f64)
    );

    if let Some(mkp) = &overview.top_marketplace {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Top contributing Marketplace: {} ({:.2}%)",
            mkp.marketplace_id, mkp.percent
        );
    }

    if let Some(category) = &overview.top_category {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Top category: {} ({} ASINs)",
            category.key,
            approx_k(category.total as f64)
        );
    }

    if !overview.suspect_brands.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Top suspect brands:");
        for suspect in &overview.suspect_brands {
            let _ = writeln!(
                output,
                "- {} ({} ASINs)",
                suspect.key,
                approx_k(suspect.total as f64)
            );
        }
    }
    let _ = writeln!(output);
}

pub fn build_report(title: Option<&str>, source: &str, dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", title.unwrap_or(DEFAULT_TITLE));
    let _ = writeln!(output, "Generated from {}", source);
    let _ = writeln!(output);

    let _ = writeln!(output, "### Section - 1 : Suppression Overview");
    match dashboard.latest_week() {
        Some(week) => {
            let _ = writeln!(
                output,
                "{}",
                overview_sentence(&dashboard.weekly_summary, week)
            );
        }
        None => {
            let _ = writeln!(output, "No data.");
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "### Section - 2 : WoW Overall Suppression Trend (T4W)");
    render_weekly_summary(&mut output, &dashboard.weekly_summary);
    let _ = writeln!(output);

    let _ = writeln!(
        output,
        "### Section - 3 : Top 5 Suppression Contributing Brands (T4W)"
    );
    render_pivot(&mut output, &dashboard.top_brands);
    let _ = writeln!(output);

    let _ = writeln!(output, "### Section - 4 : Brand Overview");
    if dashboard.overviews.is_empty() {
        let _ = writeln!(output, "No data.");
        let _ = writeln!(output);
    }
    for (idx, overview) in dashboard.overviews.iter().enumerate() {
        render_overview(&mut output, idx + 1, overview);
    }

    let _ = writeln!(output, "### Section - 5 : Appendix");
    let _ = writeln!(output);
    let _ = writeln!(output, "#### 5.1 - WoW Brand Wise Suppression Counts (T4W)");
    render_pivot(&mut output, &dashboard.brand_pivot);
    let _ = writeln!(output);
    let _ = writeln!(output, "#### 5.2 - Marketplace Wise Suppression Counts");
    render_pivot(&mut output, &dashboard.marketplace_pivot);

    output
}
