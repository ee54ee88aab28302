//! Run summaries - plaintext and JSON.

use serde::Serialize;
use serde_json::json;

use crate::builder::{Generated, GroupSummary};
use crate::persist::WriteOutcome;

/// What a run produced and where it went.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub package: &'a str,
    pub output: &'a str,
    pub outcome: &'static str,
    pub types: &'a [GroupSummary],
}

impl<'a> RunReport<'a> {
    pub fn new(generated: &'a Generated, output: &'a str, outcome: WriteOutcome) -> Self {
        Self {
            package: &generated.package_path,
            output,
            outcome: outcome.as_str(),
            types: &generated.groups,
        }
    }
}

/// Plain text summary.
pub fn render_plain(report: &RunReport<'_>) -> String {
    let mut out = format!(
        "{} {} ({} type{}, package {})\n",
        report.outcome,
        report.output,
        report.types.len(),
        if report.types.len() == 1 { "" } else { "s" },
        report.package
    );
    for group in report.types {
        out.push_str(&format!(
            "- {} ({}, {} constant{})\n",
            group.name,
            group.kind,
            group.constants,
            if group.constants == 1 { "" } else { "s" }
        ));
    }
    out
}

/// JSON summary.
///
/// Falls back to a minimal object if serialization fails.
pub fn render_json(report: &RunReport<'_>) -> String {
    match serde_json::to_string_pretty(report) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            json!({ "output": report.output, "outcome": report.outcome }).to_string()
        }
    }
}

/// Prints the plain summary to stdout.
pub fn print_plain(report: &RunReport<'_>) {
    print!("{}", render_plain(report));
}

/// Prints the JSON summary to stdout.
pub fn print_json(report: &RunReport<'_>) {
    println!("{}", render_json(report));
}
