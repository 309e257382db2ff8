//! `tagtrend report`: per-tag trend over the recorded history.

use std::path::Path;

use chrono::NaiveDate;
use tagtrend_config::Config;
use tagtrend_core::HistoryStore;
use tagtrend_io::xlsx::table_id_for;
use tagtrend_io::JsonHistoryStore;
use tagtrend_recon::{trend, TrendSummary};

use crate::{local_today, print_json, CliError};

pub fn cmd_report(
    config_path: &Path,
    sheet: Option<String>,
    date: Option<NaiveDate>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let today = date.unwrap_or_else(local_today);
    let sheet = sheet.or(config.sheet.clone()).filter(|s| !s.is_empty());

    let records = JsonHistoryStore::new(&config.state.history_file).load()?;
    let summary = trend(&records, &table_id_for(&config.source), sheet.as_deref(), today);

    if json_output {
        print_json(&summary)
    } else {
        print!("{}", render(&summary));
        Ok(())
    }
}

fn render(summary: &TrendSummary) -> String {
    let scope = summary.sheet_id.as_deref().unwrap_or("all sheets");
    let previous = summary
        .previous_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "none".to_string());
    let mut out = format!(
        "{} / {} on {} (previous: {})\n",
        summary.table_id, scope, summary.today, previous
    );

    if summary.tags.is_empty() {
        out.push_str("no history recorded\n");
        return out;
    }

    let width = summary.tags.iter().map(|t| t.tag.len()).max().unwrap_or(0).max(3);
    out.push_str(&format!("{:<width$}  {:>8}  {:>8}  {:>8}  {:>6}\n", "TAG", "TODAY", "PREVIOUS", "DELTA", "DAYS"));
    for tag in &summary.tags {
        let today = tag.today.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        let previous = tag.previous.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        let delta = tag.delta.map(|d| format!("{d:+}")).unwrap_or_else(|| "-".into());
        out.push_str(&format!(
            "{:<width$}  {:>8}  {:>8}  {:>8}  {:>6}\n",
            tag.tag,
            today,
            previous,
            delta,
            tag.series.len()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tagtrend_core::HistoryRecord;

    fn rec(d: u32, tag: &str, count: u64) -> HistoryRecord {
        HistoryRecord {
            table_id: "orders".into(),
            sheet_id: "Sheet1".into(),
            date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
            tag: tag.into(),
            conditions: BTreeMap::new(),
            matched_count: count,
        }
    }

    #[test]
    fn render_table() {
        let records = vec![rec(9, "east", 2), rec(10, "east", 5), rec(10, "west", 1)];
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let text = render(&trend(&records, "orders", None, today));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "orders / all sheets on 2026-03-10 (previous: 2026-03-09)");
        assert!(lines[2].starts_with("east"));
        assert!(lines[2].contains("+3"));
        assert!(lines[3].starts_with("west"));
        assert!(lines[3].contains("+1"));
    }

    #[test]
    fn render_empty_history() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let text = render(&trend(&[], "orders", Some("Sheet1"), today));
        assert!(text.contains("orders / Sheet1"));
        assert!(text.contains("no history recorded"));
    }
}
