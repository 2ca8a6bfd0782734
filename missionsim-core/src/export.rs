//! Tabular exports of detailed failure records: CSV rows and an HTML heatmap.
use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::SecondsFormat;

use crate::accumulator::FailureRecord;
use crate::model::FailureType;
use crate::numbers::count_to_f64;

pub const CSV_HEADER: &str =
    "run_number,waypoint_id,waypoint_name,scenario_id,scenario_name,failure_type,severity,timestamp";

fn csv_field(out: &mut String, value: &str) {
    if value.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

/// Render records as CSV with a header row. No records, no output.
#[must_use]
pub fn failures_to_csv(failures: &[FailureRecord]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(CSV_HEADER.len() + failures.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in failures {
        let _ = write!(out, "{},", record.run_number);
        for field in [
            record.waypoint_id.as_str(),
            record.waypoint_name.as_str(),
            record.scenario_id.as_str(),
            record.scenario_name.as_str(),
            record.failure_type.as_str(),
            record.severity.as_str(),
        ] {
            csv_field(&mut out, field);
            out.push(',');
        }
        out.push_str(&record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true));
        out.push('\n');
    }
    out
}

/// Waypoint name × failure type counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FailureHeatmap {
    pub waypoints: Vec<String>,
    pub failure_types: Vec<FailureType>,
    /// `counts[row][column]`, rows follow `waypoints`.
    pub counts: Vec<Vec<u64>>,
}

impl FailureHeatmap {
    /// Build the matrix; both axes are sorted by name.
    #[must_use]
    pub fn from_failures(failures: &[FailureRecord]) -> Self {
        let waypoints: Vec<String> = failures
            .iter()
            .map(|r| r.waypoint_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut failure_types: Vec<FailureType> = failures
            .iter()
            .map(|r| r.failure_type)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        failure_types.sort_by_key(|ft| ft.as_str());

        let mut counts = vec![vec![0; failure_types.len()]; waypoints.len()];
        for record in failures {
            let row = waypoints.binary_search(&record.waypoint_name);
            let column = failure_types.iter().position(|ft| *ft == record.failure_type);
            if let (Ok(row), Some(column)) = (row, column) {
                counts[row][column] += 1;
            }
        }
        Self {
            waypoints,
            failure_types,
            counts,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn count(&self, waypoint_name: &str, failure_type: FailureType) -> u64 {
        let row = self.waypoints.iter().position(|w| w == waypoint_name);
        let column = self.failure_types.iter().position(|ft| *ft == failure_type);
        match (row, column) {
            (Some(row), Some(column)) => self.counts[row][column],
            _ => 0,
        }
    }

    /// Self-contained HTML table, cells shaded in proportion to their count.
    #[must_use]
    pub fn to_html(&self) -> String {
        if self.is_empty() {
            return "<div>No failures to plot.</div>".to_string();
        }
        let max = self.max_count().max(1);
        let mut html = String::from(
            "<table class=\"failure-heatmap\" style=\"border-collapse:collapse\">\n<caption>Failure Heatmap by Waypoint and Type</caption>\n<thead><tr><th>Waypoint</th>",
        );
        for ft in &self.failure_types {
            let _ = write!(html, "<th>{}</th>", escape_html(ft.as_str()));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for (name, row) in self.waypoints.iter().zip(&self.counts) {
            let _ = write!(html, "<tr><th>{}</th>", escape_html(name));
            for &count in row {
                let alpha = shade(count, max);
                let _ = write!(
                    html,
                    "<td style=\"background:rgba(220,38,38,{alpha:.2});text-align:right;padding:4px\">{count}</td>"
                );
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
        html
    }
}

fn shade(count: u64, max: u64) -> f64 {
    (count_to_f64(count) / count_to_f64(max)).clamp(0.0, 1.0)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
