use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::chatbot::Chatbot;
use crate::error::DashboardError;
use crate::loader;
use crate::models::{
    BrandOverview, Column, Dataset, PivotTable, SummaryStats, WeekWindow, WeeklySummary,
};
use crate::overview;
use crate::pivot::{build_pivot, build_weekly_summary};

/// Brands shown in the top-brand table and overviews.
pub const TOP_BRANDS: usize = 5;

/// Every table derived from one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub window: WeekWindow,
    pub stats: SummaryStats,
    pub weekly_summary: WeeklySummary,
    pub top_brands: PivotTable,
    pub overviews: Vec<BrandOverview>,
    pub brand_pivot: PivotTable,
    pub marketplace_pivot: PivotTable,
}

impl Dashboard {
    pub fn build(dataset: &Dataset, window: &WeekWindow) -> Self {
        let top: Vec<String> = overview::top_brands(dataset, window.descending(), TOP_BRANDS)
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        let top_brands = build_pivot(dataset, Column::ProtectedBrandName, window, Some(&top));
        let overviews = overview::summarize_brands(dataset, &top_brands, window.latest());

        Self {
            window: window.clone(),
            stats: overview::summary_stats(dataset),
            weekly_summary: build_weekly_summary(dataset, window),
            top_brands,
            overviews,
            brand_pivot: build_pivot(dataset, Column::ProtectedBrandName, window, None),
            marketplace_pivot: build_pivot(dataset, Column::MarketplaceId, window, None),
        }
    }

    pub fn latest_week(&self) -> Option<i64> {
        self.window.latest()
    }
}

/// One loaded file plus its derived tables. Loading a new file means
/// building a new session; nothing is updated in place.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    dashboard: Dashboard,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let (dataset, window) = loader::load_path(path)?;
        Ok(Self::new(dataset, window))
    }

    pub fn new(dataset: Dataset, window: WeekWindow) -> Self {
        if dataset.is_empty() {
            warn!("dataset has no rows; every table will be empty");
        }
        let dashboard = Dashboard::build(&dataset, &window);
        info!(
            brands = dashboard.brand_pivot.rows.len(),
            marketplaces = dashboard.marketplace_pivot.rows.len(),
            "dashboard ready"
        );
        Self { dataset, dashboard }
    }

    #[cfg(test)]
    pub fn from_dataset(dataset: Dataset) -> Self {
        let window = loader::select_week_window(&dataset);
        Self::new(dataset, window)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn chatbot(&self) -> Chatbot<'_> {
        Chatbot::new(&self.dataset)
    }
}
