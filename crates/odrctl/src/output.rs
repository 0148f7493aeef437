//! Terminal output for odrctl. ASCII only.

use odr_shared::{Aggregate, DpdResults, Outcome, OverallStatus, ProbeId, RcParameters, RunReport};
use owo_colors::OwoColorize;

pub const SEPARATOR: &str = "------------------------------------------------------------";

/// Width of the description column.
const DESC_WIDTH: usize = 30;

fn outcome_label(outcome: &Outcome) -> String {
    let text = format!("{:<9}", format!("[{}]", outcome.label()));
    match outcome {
        Outcome::Ok(_) => text.green().to_string(),
        Outcome::Fail(_) => text.bright_red().to_string(),
        Outcome::Pending(_) => text.yellow().to_string(),
    }
}

pub fn overall_label(status: OverallStatus) -> String {
    let text = status.to_string();
    match status {
        OverallStatus::Ok => text.bright_green().to_string(),
        OverallStatus::Degraded => text.bright_red().to_string(),
        OverallStatus::Running => text.yellow().to_string(),
    }
}

/// One row of the result table.
pub fn outcome_line(id: ProbeId, outcome: &Outcome) -> String {
    let comment = outcome.comment().unwrap_or("");
    format!(
        "{} {:<width$} {}",
        outcome_label(outcome),
        id.description(),
        comment,
        width = DESC_WIDTH
    )
    .trim_end()
    .to_string()
}

/// Lines describing what changed between two snapshots of the same Run.
pub fn transitions(previous: &Aggregate, current: &Aggregate) -> Vec<String> {
    current
        .entries()
        .iter()
        .filter(|e| previous.outcome(e.id) != Some(&e.outcome))
        .filter_map(|e| match &e.outcome {
            Outcome::Pending(Some(progress)) => Some(format!(
                "{:9} {}",
                "",
                format!("{}: {}", e.id.description(), progress).dimmed()
            )),
            Outcome::Pending(None) => None,
            terminal => Some(outcome_line(e.id, terminal)),
        })
        .collect()
}

pub fn report_lines(report: &RunReport) -> Vec<String> {
    let (ok, fail, pending) = report.aggregate.counts();
    let mut lines = vec![
        format!("ODR health check  {}", report.device.dimmed()),
        SEPARATOR.dimmed().to_string(),
    ];
    lines.extend(
        report
            .aggregate
            .entries()
            .iter()
            .map(|e| outcome_line(e.id, &e.outcome)),
    );
    lines.push(SEPARATOR.dimmed().to_string());

    let mut summary = format!(
        "Overall: {}  ({} ok, {} failed",
        overall_label(report.overall),
        ok,
        fail
    );
    if pending > 0 {
        summary.push_str(&format!(", {} pending", pending));
    }
    summary.push_str(&format!(") in {:.1}s", report.duration_ms as f64 / 1000.0));
    lines.push(summary);
    lines
}

pub fn param_table_lines(table: &RcParameters) -> Vec<String> {
    let mut lines = Vec::new();
    for (controllable, params) in table {
        lines.push(controllable.cyan().to_string());
        for (name, param) in params {
            let value = match &param.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            match &param.help {
                Some(help) => lines.push(format!("  {:<24} {:<16} {}", name, value, help.dimmed())),
                None => lines.push(format!("  {:<24} {}", name, value)),
            }
        }
    }
    lines
}

pub fn dpd_lines(results: &DpdResults) -> Vec<String> {
    let mut lines = vec![format!(
        "State:    {}",
        results.state.as_deref().unwrap_or("unknown")
    )];
    if let Some(progress) = results.stateprogress {
        lines.push(format!("Progress: {:.0}%", progress));
    }
    for line in &results.summary {
        lines.push(format!("  {}", line));
    }
    if !results.adapt_dumps.is_empty() {
        lines.push("Adapt dumps:".to_string());
        for dump in &results.adapt_dumps {
            let text = match dump {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("  {}", text));
        }
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Display an error on stderr
pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use odr_shared::RcParameter;
    use std::collections::BTreeMap;

    #[test]
    fn test_outcome_line_shows_reason() {
        let line = outcome_line(ProbeId::GpsdoQuality, &Outcome::Fail("Number of SVs (2) is too low".into()));
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("GPSDO satellite lock"));
        assert!(line.ends_with("Number of SVs (2) is too low"));
    }

    #[test]
    fn test_transitions_only_report_changes() {
        let before = Aggregate::standard();
        let mut after = before.clone();
        after.mark_ok(ProbeId::RcReachable, None).unwrap();
        after.set_progress(ProbeId::Underruns, "Check 1/3...").unwrap();

        let lines = transitions(&before, &after);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[OK]"));
        assert!(lines[1].contains("Check 1/3..."));
        assert!(transitions(&after, &after).is_empty());
    }

    #[test]
    fn test_report_summary() {
        let mut agg = Aggregate::standard();
        for id in ProbeId::ORDER {
            agg.mark_ok(id, None).unwrap();
        }
        let report = RunReport::new("http://127.0.0.1:8099", chrono::Utc::now(), agg);
        let lines = report_lines(&report);

        assert_eq!(lines.len(), 7 + 4);
        let summary = lines.last().unwrap();
        assert!(summary.contains("OK"));
        assert!(summary.contains("(7 ok, 0 failed)"));
    }

    #[test]
    fn test_param_table() {
        let mut sdr = BTreeMap::new();
        sdr.insert(
            "freq".to_string(),
            RcParameter {
                value: serde_json::json!("229072000"),
                help: Some("Transmission frequency".into()),
            },
        );
        let mut table = RcParameters::new();
        table.insert("sdr".to_string(), sdr);

        let lines = param_table_lines(&table);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("freq"));
        assert!(lines[1].contains("229072000"));
        assert!(lines[1].contains("Transmission frequency"));
    }

    #[test]
    fn test_dpd_lines() {
        let results = DpdResults {
            state: Some("Calibrating".into()),
            stateprogress: Some(40.0),
            summary: vec!["RX gain 18".into()],
            ..Default::default()
        };
        assert_eq!(
            dpd_lines(&results),
            vec!["State:    Calibrating", "Progress: 40%", "  RX gain 18"]
        );
    }
}
