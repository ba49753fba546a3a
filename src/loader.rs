use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::DashboardError;
use crate::models::{Column, Dataset, EventRecord, WeekWindow};

/// Number of trailing weeks kept in the reporting window.
pub const WINDOW_WEEKS: usize = 4;

/// Header row plus cells, all as text, before any validation.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn load_path(path: &Path) -> Result<(Dataset, WeekWindow), DashboardError> {
    let table = read_table(path)?;
    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "read input table"
    );
    let dataset = validate(&table)?;
    let window = select_week_window(&dataset);
    info!(
        rows = dataset.records.len(),
        weeks = ?window.descending(),
        "loaded suppression dataset"
    );
    Ok((dataset, window))
}

pub fn read_table(path: &Path) -> Result<RawTable, DashboardError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv_table(std::fs::File::open(path)?),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_table(path),
        other => Err(DashboardError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{other}")
        })),
    }
}

pub fn read_csv_table<R: Read>(reader: R) -> Result<RawTable, DashboardError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

fn read_workbook_table(path: &Path) -> Result<RawTable, DashboardError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| DashboardError::Workbook(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DashboardError::Workbook("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| DashboardError::Workbook(format!("{sheet}: {e}")))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| header.iter().map(|c| cell_to_string(c).trim().to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .collect();

    Ok(RawTable { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.to_string())
            .unwrap_or_else(|| format!("{}", dt)),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Checks the header row and coerces every row into an [`EventRecord`].
///
/// The first failure aborts the whole load; no rows are skipped.
pub fn validate(table: &RawTable) -> Result<Dataset, DashboardError> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        positions.entry(header.as_str()).or_insert(idx);
    }

    let missing: Vec<String> = Column::REQUIRED
        .iter()
        .filter(|column| !positions.contains_key(column.name()))
        .map(|column| column.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::Schema { missing });
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let line = idx + 1;
        let cell = |column: Column| cell_value(row, &positions, column);
        let text = |column: Column| cell(column).to_string();

        let raw_count = cell(Column::Count);
        let count = u64::try_from(parse_integer(Column::Count, line, raw_count)?)
            .map_err(|_| type_error(Column::Count, line, raw_count))?;

        records.push(EventRecord {
            count,
            protected_brand_id: text(Column::ProtectedBrandId),
            protected_brand_name: text(Column::ProtectedBrandName),
            marketplace_id: text(Column::MarketplaceId),
            action_type: text(Column::ActionType),
            rule_id: text(Column::RuleId),
            template_source: text(Column::TemplateSource),
            infringing_brand: text(Column::InfringingBrand),
            action_date: parse_action_date(line, cell(Column::ActionDate))?,
            gl_product_group_desc: text(Column::GlProductGroupDesc),
            template_sub_type: text(Column::TemplateSubType),
            week: parse_integer(Column::Week, line, cell(Column::Week))?,
        });
    }

    Ok(Dataset::new(records))
}

/// The (up to) four greatest distinct weeks, newest first.
pub fn select_week_window(dataset: &Dataset) -> WeekWindow {
    let weeks: BTreeSet<i64> = dataset.records.iter().map(|r| r.week).collect();
    WeekWindow::from_descending(weeks.into_iter().rev().take(WINDOW_WEEKS).collect())
}

fn cell_value<'a>(row: &'a [String], positions: &HashMap<&str, usize>, column: Column) -> &'a str {
    positions
        .get(column.name())
        .and_then(|&pos| row.get(pos))
        .map(|value| value.trim())
        .unwrap_or("")
}

fn type_error(column: Column, row: usize, value: &str) -> DashboardError {
    DashboardError::TypeConversion {
        column: column.name().to_string(),
        row,
        value: value.to_string(),
    }
}

fn parse_integer(column: Column, row: usize, value: &str) -> Result<i64, DashboardError> {
    if let Ok(parsed) = value.parse::<i64>() {
        return Ok(parsed);
    }
    match value.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, which is out of range.
        Ok(parsed)
            if parsed.is_finite()
                && parsed.fract() == 0.0
                && parsed >= i64::MIN as f64
                && parsed < i64::MAX as f64 =>
        {
            Ok(parsed as i64)
        }
        _ => Err(type_error(column, row, value)),
    }
}

fn parse_action_date(row: usize, value: &str) -> Result<Option<NaiveDate>, DashboardError> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Ok(Some(date));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(stamp.date()));
        }
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(excel_serial_to_date)
        .map(Some)
        .ok_or_else(|| type_error(Column::ActionDate, row, value))
}

fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "count,protected_brand_id,protected_brand_name,marketplace_id,action_type,rule_id,template_source,infringing_brand,action_date,gl_product_group_desc,template_sub_type,Week";

    fn csv_with_weeks(weeks: &[&str]) -> String {
        let mut data = format!("{HEADER}\n");
        for week in weeks {
            data.push_str(&format!(
                "1,b1,Acme,US,suppress,r1,manual,Knockoff,2024-01-01,Toys,sub,{week}\n"
            ));
        }
        data
    }

    fn load_str(data: &str) -> Result<(Dataset, WeekWindow), DashboardError> {
        let table = read_csv_table(data.as_bytes())?;
        let dataset = validate(&table)?;
        let window = select_week_window(&dataset);
        Ok((dataset, window))
    }

    #[test]
    fn missing_marketplace_column_is_a_schema_error() {
        let data = "count,protected_brand_id,protected_brand_name,action_type,rule_id,template_source,infringing_brand,action_date,gl_product_group_desc,template_sub_type,Week\n1,b,A,x,r,t,i,2024-01-01,g,s,1\n";
        match load_str(data) {
            Err(DashboardError::Schema { missing }) => {
                assert_eq!(missing, vec!["marketplace_id".to_string()])
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_week_fails_the_whole_load() {
        let err = load_str(&csv_with_weeks(&["1", "two", "3"])).unwrap_err();
        match err {
            DashboardError::TypeConversion { column, row, value } => {
                assert_eq!(column, "Week");
                assert_eq!(row, 2);
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn integral_float_weeks_are_normalized() {
        let (dataset, _) = load_str(&csv_with_weeks(&["12.0", "13"])).unwrap();
        let weeks: Vec<i64> = dataset.records.iter().map(|r| r.week).collect();
        assert_eq!(weeks, vec![12, 13]);
        assert!(load_str(&csv_with_weeks(&["12.5"])).is_err());
    }

    #[test]
    fn out_of_range_weeks_are_rejected() {
        for week in ["-1e300", "1e30", "9223372036854775808.0"] {
            match load_str(&csv_with_weeks(&[week])) {
                Err(DashboardError::TypeConversion { column, value, .. }) => {
                    assert_eq!(column, "Week");
                    assert_eq!(value, week);
                }
                other => panic!("expected type error for {week}, got {other:?}"),
            }
        }
        let data = format!("{HEADER}\n1e30,b1,Acme,US,a,r,t,i,2024-01-01,g,s,1\n");
        assert!(matches!(
            load_str(&data),
            Err(DashboardError::TypeConversion { .. })
        ));
    }

    #[test]
    fn negative_count_is_rejected() {
        let data = format!("{HEADER}\n-3,b1,Acme,US,a,r,t,i,2024-01-01,g,s,1\n");
        assert!(matches!(
            load_str(&data),
            Err(DashboardError::TypeConversion { .. })
        ));
    }

    #[test]
    fn window_keeps_four_greatest_weeks_descending() {
        let (_, window) =
            load_str(&csv_with_weeks(&["3", "10", "7", "10", "1", "9", "2"])).unwrap();
        assert_eq!(window.descending(), &[10, 9, 7, 3]);
    }

    #[test]
    fn window_uses_all_weeks_when_fewer_than_four() {
        let (_, window) = load_str(&csv_with_weeks(&["5", "4", "5"])).unwrap();
        assert_eq!(window.descending(), &[5, 4]);
    }

    #[test]
    fn header_only_file_yields_empty_dataset() {
        let (dataset, window) = load_str(&format!("{HEADER}\n")).unwrap();
        assert!(dataset.is_empty());
        assert!(window.is_empty());
    }

    #[test]
    fn action_dates_accept_common_shapes() {
        assert_eq!(
            parse_action_date(1, "2024-03-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            parse_action_date(1, "03/05/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            parse_action_date(1, "2024-03-05 10:11:12").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            parse_action_date(1, "45356").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(parse_action_date(1, "").unwrap(), None);
        assert!(parse_action_date(1, "soon").is_err());
    }

    #[test]
    fn loads_csv_from_disk_and_rejects_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("events.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        file.write_all(csv_with_weeks(&["1", "2"]).as_bytes()).unwrap();

        let (dataset, window) = load_path(&csv_path).unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(window.descending(), &[2, 1]);

        let txt_path = dir.path().join("events.txt");
        std::fs::write(&txt_path, "x").unwrap();
        assert!(matches!(
            load_path(&txt_path),
            Err(DashboardError::UnsupportedFormat(_))
        ));
    }
}
