use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::aggregate::{rank, sum_by_one, top_n, Filter};
use crate::models::{Column, Dataset, KeyValue, RankedEntry};

const DEFAULT_TOP: usize = 5;

pub const HELP_TEXT: &str = "Available commands:
- \"top brands\" or \"top N brands\"
- \"marketplace stats\"
- \"weekly trend\"
- \"brand details [brand name]\"
- \"help\"";

pub const BRAND_NOT_FOUND: &str = "Brand not found. Please specify a valid brand name.";

static TOP_N: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"top (\d+)").expect("valid regex"));
static TOP_N_BRANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"top \d+ brands").expect("valid regex"));

/// A parsed chatbot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TopBrands(usize),
    MarketplaceStats,
    WeeklyTrend,
    /// Carries the lower-cased query for brand-name matching.
    BrandDetails(String),
    Help,
}

impl Command {
    /// First matching keyword wins, in declaration order. Anything else is
    /// a help request.
    pub fn parse(query: &str) -> Self {
        let query = query.to_lowercase();

        if query.contains("top brands") || TOP_N_BRANDS.is_match(&query) {
            let n = TOP_N
                .captures(&query)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(DEFAULT_TOP);
            Command::TopBrands(n)
        } else if query.contains("marketplace stats") {
            Command::MarketplaceStats
        } else if query.contains("weekly trend") {
            Command::WeeklyTrend
        } else if query.contains("brand details") {
            Command::BrandDetails(query)
        } else {
            Command::Help
        }
    }
}

/// Stateless question answering over a dataset snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Chatbot<'a> {
    dataset: &'a Dataset,
}

impl<'a> Chatbot<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    pub fn answer(&self, query: &str) -> String {
        match Command::parse(query) {
            Command::TopBrands(n) => self.top_brands(n),
            Command::MarketplaceStats => self.marketplace_stats(),
            Command::WeeklyTrend => self.weekly_trend(),
            Command::BrandDetails(query) => self.brand_details(&query),
            Command::Help => HELP_TEXT.to_string(),
        }
    }

    fn top_brands(&self, n: usize) -> String {
        let totals = sum_by_one(&self.dataset.records, Column::ProtectedBrandName, &Filter::new());
        listing(
            &format!("Top {n} brands by suppression count:"),
            &top_n(totals, n),
        )
    }

    fn marketplace_stats(&self) -> String {
        let totals = sum_by_one(&self.dataset.records, Column::MarketplaceId, &Filter::new());
        listing("Marketplace statistics:", &rank(totals))
    }

    fn weekly_trend(&self) -> String {
        listing("Weekly trend:", &self.by_week(&Filter::new()))
    }

    fn brand_details(&self, query: &str) -> String {
        let Some(brand) = self
            .dataset
            .brand_names()
            .into_iter()
            .find(|brand| !brand.is_empty() && query.contains(&brand.to_lowercase()))
        else {
            return BRAND_NOT_FOUND.to_string();
        };

        let filter = Filter::new().with(Column::ProtectedBrandName, [brand]);
        listing(&format!("Details for {brand}:"), &self.by_week(&filter))
    }

    fn by_week(&self, filter: &Filter) -> Vec<RankedEntry> {
        let mut weeks: Vec<(KeyValue, u64)> = sum_by_one(&self.dataset.records, Column::Week, filter)
            .into_iter()
            .collect();
        weeks.sort_by(|a, b| a.0.cmp(&b.0));
        weeks
            .into_iter()
            .map(|(week, total)| RankedEntry {
                key: week.to_string(),
                total,
            })
            .collect()
    }
}

fn listing(title: &str, entries: &[RankedEntry]) -> String {
    let mut output = String::from(title);
    if entries.is_empty() {
        output.push_str("\nNo data.");
    }
    for entry in entries {
        let _ = write!(output, "\n{}: {}", entry.key, entry.total);
    }
    output
}
