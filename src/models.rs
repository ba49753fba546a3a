use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Label used for the synthetic total row and column.
pub const GRAND_TOTAL: &str = "Grand Total";

/// The twelve fields every uploaded table must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Count,
    ProtectedBrandId,
    ProtectedBrandName,
    MarketplaceId,
    ActionType,
    RuleId,
    TemplateSource,
    InfringingBrand,
    ActionDate,
    GlProductGroupDesc,
    TemplateSubType,
    Week,
}

impl Column {
    pub const REQUIRED: [Column; 12] = [
        Column::Count,
        Column::ProtectedBrandId,
        Column::ProtectedBrandName,
        Column::MarketplaceId,
        Column::ActionType,
        Column::RuleId,
        Column::TemplateSource,
        Column::InfringingBrand,
        Column::ActionDate,
        Column::GlProductGroupDesc,
        Column::TemplateSubType,
        Column::Week,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Count => "count",
            Column::ProtectedBrandId => "protected_brand_id",
            Column::ProtectedBrandName => "protected_brand_name",
            Column::MarketplaceId => "marketplace_id",
            Column::ActionType => "action_type",
            Column::RuleId => "rule_id",
            Column::TemplateSource => "template_source",
            Column::InfringingBrand => "infringing_brand",
            Column::ActionDate => "action_date",
            Column::GlProductGroupDesc => "gl_product_group_desc",
            Column::TemplateSubType => "template_sub_type",
            Column::Week => "Week",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One grouping key component. Weeks keep their numeric ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Week(i64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Week(week) => write!(f, "{week}"),
            KeyValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Week(value)
    }
}

/// One suppression event row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub count: u64,
    pub protected_brand_id: String,
    pub protected_brand_name: String,
    pub marketplace_id: String,
    pub action_type: String,
    pub rule_id: String,
    pub template_source: String,
    pub infringing_brand: String,
    pub action_date: Option<NaiveDate>,
    pub gl_product_group_desc: String,
    pub template_sub_type: String,
    #[serde(rename = "Week")]
    pub week: i64,
}

impl EventRecord {
    pub fn key(&self, column: Column) -> KeyValue {
        let text = match column {
            Column::Week => return KeyValue::Week(self.week),
            Column::Count => return KeyValue::Text(self.count.to_string()),
            Column::ActionDate => {
                return KeyValue::Text(
                    self.action_date.map(|d| d.to_string()).unwrap_or_default(),
                )
            }
            Column::ProtectedBrandId => &self.protected_brand_id,
            Column::ProtectedBrandName => &self.protected_brand_name,
            Column::MarketplaceId => &self.marketplace_id,
            Column::ActionType => &self.action_type,
            Column::RuleId => &self.rule_id,
            Column::TemplateSource => &self.template_source,
            Column::InfringingBrand => &self.infringing_brand,
            Column::GlProductGroupDesc => &self.gl_product_group_desc,
            Column::TemplateSubType => &self.template_sub_type,
        };
        KeyValue::Text(text.clone())
    }
}

/// All validated rows from one uploaded file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<EventRecord>,
}

impl Dataset {
    pub fn new(records: Vec<EventRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct brand names in first-appearance order.
    pub fn brand_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| r.protected_brand_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// The most recent distinct weeks, stored newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    weeks: Vec<i64>,
}

impl WeekWindow {
    pub fn from_descending(weeks: Vec<i64>) -> Self {
        Self { weeks }
    }

    pub fn descending(&self) -> &[i64] {
        &self.weeks
    }

    pub fn ascending(&self) -> Vec<i64> {
        self.weeks.iter().rev().copied().collect()
    }

    pub fn latest(&self) -> Option<i64> {
        self.weeks.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub key: String,
    pub cells: Vec<u64>,
    pub total: u64,
}

/// Row key × week matrix with a trailing total column and total row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub row_label: String,
    /// Week columns, ascending.
    pub weeks: Vec<i64>,
    /// Data rows, sorted by total descending.
    pub rows: Vec<PivotRow>,
    pub grand_total: PivotRow,
}

impl PivotTable {
    pub fn column_headers(&self) -> Vec<String> {
        self.weeks
            .iter()
            .map(|w| w.to_string())
            .chain(std::iter::once(GRAND_TOTAL.to_string()))
            .collect()
    }

    /// Data rows followed by the Grand Total row.
    pub fn all_rows(&self) -> impl Iterator<Item = &PivotRow> {
        self.rows.iter().chain(std::iter::once(&self.grand_total))
    }

    #[cfg(test)]
    pub fn row_keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyTotal {
    pub week: i64,
    pub total: u64,
}

/// Per-week totals in window order plus an overall total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub weeks: Vec<WeeklyTotal>,
    pub grand_total: u64,
}

impl WeeklySummary {
    pub fn total_for(&self, week: i64) -> Option<u64> {
        self.weeks.iter().find(|w| w.week == week).map(|w| w.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketplaceShare {
    pub marketplace_id: String,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub total: u64,
}

/// Latest-week digest for one brand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandOverview {
    pub brand: String,
    pub week: i64,
    pub total: u64,
    pub top_marketplace: Option<MarketplaceShare>,
    pub top_category: Option<RankedEntry>,
    pub suspect_brands: Vec<RankedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total_suppressions: u64,
    pub event_rows: usize,
    pub total_brands: usize,
    pub total_marketplaces: usize,
    pub first_action_date: Option<NaiveDate>,
    pub last_action_date: Option<NaiveDate>,
}
