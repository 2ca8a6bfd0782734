use std::io::Write;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use missionsim_core::export::CSV_HEADER;
use missionsim_core::{
    Advice, FailureHeatmap, HistoryEntry, QuickSummary, RiskLevel, SimulationResult,
    failures_to_csv,
};

/// Full JSON document: the result plus advisory text.
#[derive(Serialize)]
struct SimulationReport<'a> {
    #[serde(flatten)]
    result: &'a SimulationResult,
    recommendations: &'a [Advice],
}

fn risk_label(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Low => level.as_str().green(),
        RiskLevel::Medium => level.as_str().yellow(),
        RiskLevel::High => level.as_str().red().bold(),
    }
}

fn seed_label(seed: Option<u64>) -> String {
    seed.map_or_else(|| "unseeded".to_string(), |s| s.to_string())
}

pub fn generate_console_report(
    out: &mut impl Write,
    result: &SimulationResult,
    advice: &[Advice],
    verbose: bool,
) -> Result<()> {
    let summary = &result.simulation_summary;
    let risk = &result.risk_analysis;

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("📊 {} ({})", result.mission_name, result.mission_id)
            .bright_cyan()
            .bold()
    )?;
    writeln!(out, "{}", "==============================".cyan())?;
    writeln!(out, "Trials: {}", summary.total_simulations)?;
    writeln!(out, "Seed: {}", seed_label(result.seed))?;
    writeln!(
        out,
        "Succeeded: {} ({:.2}%)",
        summary.successful_runs.to_string().green(),
        summary.success_rate_percentage
    )?;
    writeln!(
        out,
        "Failed: {} ({:.2}%)",
        summary.failed_runs.to_string().red(),
        summary.failure_rate_percentage
    )?;
    writeln!(out, "Scenario firings: {}", summary.total_failures_triggered)?;
    writeln!(
        out,
        "Risk: {} (total {:.3}, average {:.3} per waypoint)",
        risk_label(risk.risk_level),
        risk.total_risk_score,
        risk.average_risk_per_waypoint
    )?;
    writeln!(out)?;

    writeln!(out, "{}", "🛰  Waypoints".bright_yellow().bold())?;
    writeln!(out, "{}", "-".repeat(30).yellow())?;
    writeln!(
        out,
        "  {:<20} {:>8} {:>9} {:>8}",
        "waypoint", "failures", "rate", "risk"
    )?;
    for rate in &summary.waypoint_failure_rates {
        let id = rate.waypoint_id.as_str();
        let failures = summary.failures_at(id).unwrap_or(0);
        let score = risk.score_for(id).unwrap_or(0.0);
        let marker = if risk.high_risk_waypoints.iter().any(|w| w == id) {
            " ⚠".red().to_string()
        } else {
            String::new()
        };
        writeln!(
            out,
            "  {id:<20} {failures:>8} {:>8.2}% {score:>8.3}{marker}",
            rate.failure_rate
        )?;
    }
    writeln!(out)?;

    let seen_types: Vec<_> = summary
        .most_common_failure_types
        .iter()
        .filter(|(_, count)| *count > 0)
        .collect();
    if !seen_types.is_empty() {
        writeln!(out, "{}", "🔥 Failure types".bright_yellow().bold())?;
        for (failure_type, count) in seen_types {
            writeln!(out, "  {:<20} {count}", failure_type.as_str())?;
        }
        writeln!(out, "{}", "Severities".bold())?;
        for (severity, count) in summary
            .most_common_severities
            .iter()
            .filter(|(_, count)| *count > 0)
        {
            writeln!(out, "  {:<20} {count}", severity.as_str())?;
        }
        writeln!(out)?;
    }

    if !advice.is_empty() {
        writeln!(out, "{}", "💡 Recommendations".bright_green().bold())?;
        for item in advice {
            writeln!(out, "  • {item}")?;
        }
        writeln!(out)?;
    }

    if verbose && !result.detailed_failures.is_empty() {
        writeln!(
            out,
            "{}",
            format!(
                "🧾 First {} of {} failure records",
                result.detailed_failures.len(),
                summary.detailed_failures_count
            )
            .bold()
        )?;
        for record in &result.detailed_failures {
            writeln!(
                out,
                "  #{:<6} {:<16} {:<20} {:<20} {}",
                record.run_number,
                record.waypoint_id,
                record.scenario_name,
                record.failure_type.as_str(),
                record.severity
            )?;
        }
    }
    Ok(())
}

pub fn generate_quick_console_report(
    out: &mut impl Write,
    mission_name: &str,
    quick: &QuickSummary,
) -> Result<()> {
    writeln!(out, "{}", format!("⚡ {mission_name}").bright_cyan().bold())?;
    writeln!(
        out,
        "Trials: {}  Success: {:.2}%  Failure: {:.2}%",
        quick.total_simulations, quick.success_rate_percentage, quick.failure_rate_percentage
    )?;
    for (waypoint, count) in quick.waypoint_failure_counts.iter() {
        writeln!(out, "  {waypoint:<20} {count}")?;
    }
    let top: Vec<String> = quick
        .most_common_failure_types
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(ft, count)| format!("{ft} ({count})"))
        .collect();
    if !top.is_empty() {
        writeln!(out, "Top failure types: {}", top.join(", "))?;
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut impl Write,
    result: &SimulationResult,
    advice: &[Advice],
) -> Result<()> {
    let report = SimulationReport {
        result,
        recommendations: advice,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_quick_json_report(out: &mut impl Write, quick: &QuickSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, quick)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut impl Write,
    result: &SimulationResult,
    advice: &[Advice],
) -> Result<()> {
    let summary = &result.simulation_summary;
    let risk = &result.risk_analysis;

    writeln!(out, "# Mission Simulation: {}\n", result.mission_name)?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Mission id**: {}", result.mission_id)?;
    writeln!(out, "- **Trials**: {}", summary.total_simulations)?;
    writeln!(out, "- **Seed**: {}", seed_label(result.seed))?;
    writeln!(
        out,
        "- **Success rate**: {:.2}%",
        summary.success_rate_percentage
    )?;
    writeln!(
        out,
        "- **Failure rate**: {:.2}%",
        summary.failure_rate_percentage
    )?;
    writeln!(
        out,
        "- **Risk level**: {} (total {:.3})",
        risk.risk_level, risk.total_risk_score
    )?;
    writeln!(out, "- **Completed**: {}\n", result.timestamp.to_rfc3339())?;

    writeln!(out, "## Waypoints\n")?;
    writeln!(out, "| Waypoint | Failures | Rate | Risk score | High risk |")?;
    writeln!(out, "|---|---:|---:|---:|:---:|")?;
    for rate in &summary.waypoint_failure_rates {
        let id = rate.waypoint_id.as_str();
        let high = if risk.high_risk_waypoints.iter().any(|w| w == id) {
            "⚠️"
        } else {
            ""
        };
        writeln!(
            out,
            "| {id} | {} | {:.2}% | {:.3} | {high} |",
            summary.failures_at(id).unwrap_or(0),
            rate.failure_rate,
            risk.score_for(id).unwrap_or(0.0)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Failure Types\n")?;
    if summary.total_failures_triggered == 0 {
        writeln!(out, "_No failures recorded._\n")?;
    } else {
        for (failure_type, count) in &summary.most_common_failure_types {
            writeln!(out, "- {failure_type}: {count}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Recommendations\n")?;
    for item in advice {
        writeln!(out, "- {item}")?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut impl Write, result: &SimulationResult) -> Result<()> {
    if result.detailed_failures.is_empty() {
        writeln!(out, "{CSV_HEADER}")?;
    } else {
        write!(out, "{}", failures_to_csv(&result.detailed_failures))?;
    }
    Ok(())
}

pub fn generate_html_report(out: &mut impl Write, result: &SimulationResult) -> Result<()> {
    let heatmap = FailureHeatmap::from_failures(&result.detailed_failures);
    let summary = &result.simulation_summary;
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(
        out,
        "<head><meta charset=\"utf-8\"><title>Failure heatmap: {}</title></head>",
        html_text(&result.mission_name)
    )?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{}</h1>", html_text(&result.mission_name))?;
    writeln!(
        out,
        "<p>{} trials, {:.2}% failed, risk {}. Heatmap covers the first {} failure records.</p>",
        summary.total_simulations,
        summary.failure_rate_percentage,
        result.risk_analysis.risk_level,
        result.detailed_failures.len()
    )?;
    write!(out, "{}", heatmap.to_html())?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(())
}

fn html_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn generate_history_console_report(out: &mut impl Write, entries: &[HistoryEntry]) -> Result<()> {
    writeln!(out, "{}", "🗂  Simulation History".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    if entries.is_empty() {
        writeln!(out, "No simulations logged yet.")?;
        return Ok(());
    }
    for entry in entries {
        writeln!(
            out,
            "{}  {:<28} {:>6} trials  {:>7.2}% ok  {}",
            entry.logged_at.format("%Y-%m-%d %H:%M:%S"),
            entry.mission_name,
            entry.summary.total_simulations,
            entry.summary.success_rate_percentage,
            risk_label(entry.risk_analysis.risk_level)
        )?;
    }
    Ok(())
}

pub fn generate_history_json_report(out: &mut impl Write, entries: &[HistoryEntry]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)?;
    Ok(())
}
