//! Per-tag time series and day-over-day deltas, the shape the chart
//! renderer consumes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tagtrend_core::HistoryRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub matched_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTrend {
    pub tag: String,
    /// Date-ordered counts, summed across sheets when no sheet is selected.
    pub series: Vec<TrendPoint>,
    pub today: Option<u64>,
    pub previous: Option<u64>,
    /// `today - previous`, with a missing previous count read as 0.
    /// `None` when the tag has no record today.
    pub delta: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendSummary {
    pub table_id: String,
    pub sheet_id: Option<String>,
    pub today: NaiveDate,
    /// Latest date before `today` with any record.
    pub previous_date: Option<NaiveDate>,
    pub tags: Vec<TagTrend>,
}

/// Summarize `records` of one table (optionally one sheet) as of `today`.
pub fn trend(
    records: &[HistoryRecord],
    table_id: &str,
    sheet: Option<&str>,
    today: NaiveDate,
) -> TrendSummary {
    let selected = records
        .iter()
        .filter(|r| r.table_id == table_id && sheet.map_or(true, |s| r.sheet_id == s));

    // tag -> date -> summed count
    let mut totals: BTreeMap<&str, BTreeMap<NaiveDate, u64>> = BTreeMap::new();
    for r in selected {
        *totals.entry(r.tag.as_str()).or_default().entry(r.date).or_default() += r.matched_count;
    }

    let previous_date = totals
        .values()
        .flat_map(|series| series.keys().copied())
        .filter(|d| *d < today)
        .max();

    let tags = totals
        .into_iter()
        .map(|(tag, series)| {
            let today_count = series.get(&today).copied();
            let previous = previous_date.and_then(|d| series.get(&d).copied());
            let delta = today_count.map(|t| t as i64 - previous.unwrap_or(0) as i64);
            TagTrend {
                tag: tag.to_string(),
                series: series
                    .into_iter()
                    .map(|(date, matched_count)| TrendPoint { date, matched_count })
                    .collect(),
                today: today_count,
                previous,
                delta,
            }
        })
        .collect();

    TrendSummary {
        table_id: table_id.to_string(),
        sheet_id: sheet.map(str::to_string),
        today,
        previous_date,
        tags,
    }
}
