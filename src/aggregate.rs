use std::collections::{HashMap, HashSet};

use crate::models::{Column, EventRecord, KeyValue, RankedEntry};

/// Conjunction of set-membership predicates, one per column.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicates: Vec<(Column, HashSet<KeyValue>)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts `column` to `values`. An empty value set is ignored so an
    /// unset UI selection means "no restriction".
    pub fn with<I, V>(mut self, column: Column, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<KeyValue>,
    {
        let values: HashSet<KeyValue> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.predicates.push((column, values));
        }
        self
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        self.predicates
            .iter()
            .all(|(column, values)| values.contains(&record.key(*column)))
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

pub type Grouped = HashMap<Vec<KeyValue>, u64>;

/// Sums `count` per distinct key tuple over the rows passing `filter`.
/// Sums saturate at `u64::MAX`.
///
/// Iteration order of the result is unspecified; callers sort.
pub fn sum_by<'a, I>(records: I, keys: &[Column], filter: &Filter) -> Grouped
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut groups = Grouped::new();
    for record in records.into_iter().filter(|r| filter.matches(r)) {
        let key: Vec<KeyValue> = keys.iter().map(|column| record.key(*column)).collect();
        let total = groups.entry(key).or_insert(0);
        *total = total.saturating_add(record.count);
    }
    groups
}

/// Single-column variant of [`sum_by`] keyed by the column's text.
pub fn sum_by_one<'a, I>(records: I, key: Column, filter: &Filter) -> HashMap<KeyValue, u64>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    sum_by(records, &[key], filter)
        .into_iter()
        .filter_map(|(mut key, total)| key.pop().map(|k| (k, total)))
        .collect()
}

pub fn saturating_sum(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

pub fn filter_rows<'a>(records: &'a [EventRecord], filter: &Filter) -> Vec<&'a EventRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// Orders totals descending; equal totals fall back to ascending key order.
pub fn rank(totals: impl IntoIterator<Item = (KeyValue, u64)>) -> Vec<RankedEntry> {
    let mut entries: Vec<(KeyValue, u64)> = totals.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .map(|(key, total)| RankedEntry {
            key: key.to_string(),
            total,
        })
        .collect()
}

/// The `n` entries with the greatest totals, using the [`rank`] ordering.
pub fn top_n(totals: impl IntoIterator<Item = (KeyValue, u64)>, n: usize) -> Vec<RankedEntry> {
    let mut ranked = rank(totals);
    ranked.truncate(n);
    ranked
}
