//! Dashboard metrics: three counters and the per-day views series of the last
//! 30 days.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// `{ "amount": n }` returned by the counter endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricAmount {
    pub amount: u64,
}

/// One point of the views series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyViews {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsPerDayResponse {
    pub views_per_day: Vec<DailyViews>,
}

// The API sends either a full timestamp or a bare calendar day.
fn deserialize_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_day(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// Views series sorted by day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewsSeries {
    points: Vec<DailyViews>,
}

impl ViewsSeries {
    pub fn new(mut points: Vec<DailyViews>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[DailyViews] {
        &self.points
    }

    /// First and last day covered by the series.
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }

    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.amount).sum()
    }

    /// Busiest day; the earliest one wins a tie.
    pub fn peak(&self) -> Option<DailyViews> {
        self.points
            .iter()
            .copied()
            .reduce(|best, p| if p.amount > best.amount { p } else { best })
    }
}

impl From<ViewsPerDayResponse> for ViewsSeries {
    fn from(response: ViewsPerDayResponse) -> Self {
        Self::new(response.views_per_day)
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub products_sold: u64,
    pub products_available: u64,
    pub seller_views: u64,
    pub views_per_day: ViewsSeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_timestamps_and_bare_days() {
        let json = serde_json::json!({
            "viewsPerDay": [
                { "date": "2024-07-02T03:00:00.000Z", "amount": 4 },
                { "date": "2024-07-01", "amount": 7 }
            ]
        });
        let response: ViewsPerDayResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.views_per_day[0].date, day(2024, 7, 2));
        assert_eq!(response.views_per_day[1].date, day(2024, 7, 1));
    }

    #[test]
    fn rejects_garbage_dates() {
        let json = serde_json::json!({ "date": "yesterday", "amount": 1 });
        assert!(serde_json::from_value::<DailyViews>(json).is_err());
    }

    #[test]
    fn series_is_sorted_and_summarized() {
        let series = ViewsSeries::new(vec![
            DailyViews { date: day(2024, 7, 3), amount: 2 },
            DailyViews { date: day(2024, 7, 1), amount: 5 },
            DailyViews { date: day(2024, 7, 2), amount: 5 },
        ]);

        assert_eq!(series.period(), Some((day(2024, 7, 1), day(2024, 7, 3))));
        assert_eq!(series.total(), 12);
        assert_eq!(series.peak().unwrap().date, day(2024, 7, 1));
    }

    #[test]
    fn empty_series_has_no_period() {
        let series = ViewsSeries::default();
        assert_eq!(series.period(), None);
        assert_eq!(series.peak(), None);
        assert_eq!(series.total(), 0);
    }
}
