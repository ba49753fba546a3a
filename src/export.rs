use std::io::Write;

use crate::error::DashboardError;
use crate::models::{EventRecord, PivotTable, WeeklySummary, GRAND_TOTAL};

/// Header row: row field name, weeks ascending, `Grand Total`. The Grand
/// Total row comes last. Cells are plain integers.
pub fn write_pivot_csv<W: Write>(writer: W, pivot: &PivotTable) -> Result<(), DashboardError> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![pivot.row_label.clone()];
    header.extend(pivot.column_headers());
    writer.write_record(&header)?;

    for row in pivot.all_rows() {
        let mut record = vec![row.key.clone()];
        record.extend(row.cells.iter().map(u64::to_string));
        record.push(row.total.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_weekly_csv<W: Write>(
    writer: W,
    summary: &WeeklySummary,
) -> Result<(), DashboardError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["Week", "ASIN Count"])?;
    for week in &summary.weeks {
        writer.write_record([week.week.to_string(), week.total.to_string()])?;
    }
    writer.write_record([GRAND_TOTAL.to_string(), summary.grand_total.to_string()])?;
    writer.flush()?;
    Ok(())
}

/// Raw event rows under their original column names.
pub fn write_rows_csv<'a, W, I>(writer: W, rows: I) -> Result<usize, DashboardError>
where
    W: Write,
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut writer = csv::Writer::from_writer(writer);
    let mut written = 0usize;
    for row in rows {
        writer.serialize(row)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
