use serde::Serialize;

use crate::session::Dashboard;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Line { title: String, series: Vec<Series> },
    Bar { title: String, series: Vec<Series> },
    Pie { title: String, slices: Vec<Point> },
}

/// Data behind the four dashboard charts. Grand Total rows are left out.
pub fn dashboard_charts(dashboard: &Dashboard) -> Vec<Chart> {
    vec![
        weekly_trend(dashboard),
        top_brands(dashboard),
        marketplace_share(dashboard),
        brand_trend(dashboard),
    ]
}

fn weekly_trend(dashboard: &Dashboard) -> Chart {
    let mut points: Vec<Point> = dashboard
        .weekly_summary
        .weeks
        .iter()
        .map(|w| Point {
            label: w.week.to_string(),
            value: w.total,
        })
        .collect();
    points.reverse();

    Chart::Line {
        title: "Weekly Suppression Trend (T4W)".to_string(),
        series: vec![Series {
            name: "ASIN Count".to_string(),
            points,
        }],
    }
}

fn top_brands(dashboard: &Dashboard) -> Chart {
    let points = dashboard
        .top_brands
        .rows
        .iter()
        .map(|row| Point {
            label: row.key.clone(),
            value: row.total,
        })
        .collect();

    Chart::Bar {
        title: "Top 5 Brands by Total Suppression".to_string(),
        series: vec![Series {
            name: "Grand Total".to_string(),
            points,
        }],
    }
}

fn marketplace_share(dashboard: &Dashboard) -> Chart {
    Chart::Pie {
        title: "Suppression Distribution by Marketplace".to_string(),
        slices: dashboard
            .marketplace_pivot
            .rows
            .iter()
            .map(|row| Point {
                label: row.key.clone(),
                value: row.total,
            })
            .collect(),
    }
}

fn brand_trend(dashboard: &Dashboard) -> Chart {
    let pivot = &dashboard.top_brands;
    let series = pivot
        .rows
        .iter()
        .map(|row| Series {
            name: row.key.clone(),
            points: pivot
                .weeks
                .iter()
                .zip(&row.cells)
                .map(|(week, value)| Point {
                    label: week.to_string(),
                    value: *value,
                })
                .collect(),
        })
        .collect();

    Chart::Line {
        title: "Weekly Brand-wise Trend".to_string(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenario;
    use crate::session::Session;

    #[test]
    fn charts_skip_grand_total() {
        let session = Session::from_dataset(scenario());
        let charts = dashboard_charts(session.dashboard());
        assert_eq!(charts.len(), 4);

        let json = serde_json::to_string(&charts).unwrap();
        assert!(!json.contains("Grand Total\",\"value\""));

        match &charts[0] {
            Chart::Line { series, .. } => {
                let labels: Vec<&str> = series[0].points.iter().map(|p| p.label.as_str()).collect();
                assert_eq!(labels, vec!["1", "2"]);
            }
            other => panic!("unexpected chart {other:?}"),
        }
        match &charts[2] {
            Chart::Pie { slices, .. } => {
                let total: u64 = slices.iter().map(|s| s.value).sum();
                assert_eq!(total, 35);
            }
            other => panic!("unexpected chart {other:?}"),
        }
    }

    #[test]
    fn brand_trend_has_one_series_per_top_brand() {
        let session = Session::from_dataset(scenario());
        match brand_trend(session.dashboard()) {
            Chart::Line { series, .. } => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].name, "A");
                assert_eq!(series[0].points[1].value, 20);
            }
            other => panic!("unexpected chart {other:?}"),
        }
    }

    #[test]
    fn serializes_with_kind_tag() {
        let chart = Chart::Pie {
            title: "t".to_string(),
            slices: vec![],
        };
        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["kind"], "pie");
    }
}
