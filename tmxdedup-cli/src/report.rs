//! Report rendering
//!
//! Turns pipeline reports into the text summaries and JSON documents the
//! commands print.

use anyhow::Result;
use serde::Serialize;
use tmxdedup_core::{AnalysisReport, DedupReport, UnitStatus, UnitVerdict};

/// Render the summary printed after a full deduplication run
pub fn render_run_text(report: &DedupReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Encoding:         {}\n", report.encoding));
    out.push_str(&format!("Units kept:       {}\n", report.kept));
    out.push_str(&format!("Units deleted:    {}\n", report.deleted));
    out.push_str(&format!("Duplicate groups: {}\n", report.groups));
    out.push_str(&format!("Invalid spans:    {}\n", report.skipped));
    out.push_str(&format!("Unkeyed units:    {}\n", report.unkeyed));
    out
}

/// Render the analysis report as human-readable text
pub fn render_analysis_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Encoding:         {}\n", report.encoding));
    out.push_str(&format!("Duplicate groups: {}\n", report.groups));
    out.push_str(&format!("Invalid spans:    {}\n", report.skipped));
    out.push_str(&format!("Unkeyed units:    {}\n", report.unkeyed));

    if report.verdicts.is_empty() {
        out.push_str("\nNo duplicates found.\n");
        return out;
    }

    out.push('\n');
    for verdict in &report.verdicts {
        let marker = match verdict.status {
            UnitStatus::Keep => "keep  ",
            UnitStatus::Delete => "delete",
        };
        out.push_str(&format!(
            "{marker}  {} => {}",
            verdict.source_text, verdict.target_text
        ));
        if !verdict.creation_id.is_empty() {
            out.push_str(&format!("  [creationid={}]", verdict.creation_id));
        }
        if !verdict.change_id.is_empty() {
            out.push_str(&format!("  [changeid={}]", verdict.change_id));
        }
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct AnalysisJson<'a> {
    encoding: &'a str,
    groups: u64,
    skipped: u64,
    unkeyed: u64,
    verdicts: &'a [UnitVerdict],
}

/// Render the analysis report as a JSON document
pub fn render_analysis_json(report: &AnalysisReport) -> Result<String> {
    let doc = AnalysisJson {
        encoding: &report.encoding,
        groups: report.groups,
        skipped: report.skipped,
        unkeyed: report.unkeyed,
        verdicts: &report.verdicts,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis() -> AnalysisReport {
        AnalysisReport {
            verdicts: vec![
                UnitVerdict {
                    source_text: "Hello".into(),
                    target_text: "Bonjour".into(),
                    creation_id: "alice".into(),
                    change_id: String::new(),
                    creation_date: String::new(),
                    change_date: String::new(),
                    status: UnitStatus::Keep,
                },
                UnitVerdict {
                    source_text: "Hello".into(),
                    target_text: "Salut".into(),
                    creation_id: String::new(),
                    change_id: String::new(),
                    creation_date: String::new(),
                    change_date: String::new(),
                    status: UnitStatus::Delete,
                },
            ],
            groups: 1,
            skipped: 0,
            unkeyed: 0,
            encoding: "utf-8".into(),
        }
    }

    #[test]
    fn text_report_lists_verdicts() {
        let text = render_analysis_text(&sample_analysis());
        assert!(text.contains("Duplicate groups: 1"));
        assert!(text.contains("keep    Hello => Bonjour  [creationid=alice]"));
        assert!(text.contains("delete  Hello => Salut"));
    }

    #[test]
    fn json_report_is_valid_json() {
        let json = render_analysis_json(&sample_analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["groups"], 1);
        assert_eq!(value["verdicts"][0]["status"], "keep");
        assert_eq!(value["verdicts"][1]["status"], "delete");
    }

    #[test]
    fn run_summary_includes_counts() {
        let report = DedupReport {
            kept: 10,
            deleted: 3,
            skipped: 1,
            unkeyed: 0,
            groups: 2,
            encoding: "windows-1252".into(),
            blobs: Vec::new(),
        };
        let text = render_run_text(&report);
        assert!(text.contains("Units kept:       10"));
        assert!(text.contains("Units deleted:    3"));
        assert!(text.contains("windows-1252"));
    }
}
