//! Output formatting for lint results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::check::{Finding, LintReport, Severity};

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub config: String,
    pub passed: bool,
    pub files_scanned: usize,
    pub entries: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub findings: Vec<JsonFinding>,
    pub rules: Vec<RuleSummary>,
}

/// One finding in JSON form. `file` is empty and `line` is 0 for entities
/// without a source origin.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFinding {
    pub kind: String,
    pub severity: String,
    pub entity: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub file: String,
    pub line: usize,
}

/// Per-rule outcome counts across all entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rule: String,
    pub passed: usize,
    pub failed: usize,
    pub faulted: usize,
}

/// Whether a report counts as a pass: no error-severity findings.
pub fn passed(report: &LintReport) -> bool {
    !report.has_errors()
}

/// Aggregate rule outcomes by rule name, in first-seen order.
pub fn summarize_rules(report: &LintReport) -> Vec<RuleSummary> {
    let mut summaries: Vec<RuleSummary> = Vec::new();
    for outcome in &report.rule_outcomes {
        let idx = match summaries.iter().position(|s| s.rule == outcome.rule) {
            Some(idx) => idx,
            None => {
                summaries.push(RuleSummary {
                    rule: outcome.rule.clone(),
                    passed: 0,
                    failed: 0,
                    faulted: 0,
                });
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[idx];
        match outcome.passed {
            Some(true) => summary.passed += 1,
            Some(false) => summary.failed += 1,
            None => summary.faulted += 1,
        }
    }
    summaries
}

/// Build the JSON report structure.
pub fn json_report(
    path: &str,
    config_path: &str,
    files_scanned: usize,
    report: &LintReport,
) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        config: config_path.to_string(),
        passed: passed(report),
        files_scanned,
        entries: report.entries,
        errors: report.count(Severity::Error),
        warnings: report.count(Severity::Warning),
        infos: report.count(Severity::Info),
        findings: report.findings.iter().map(finding_to_json).collect(),
        rules: summarize_rules(report),
    }
}

/// Write results in JSON format.
pub fn write_json(
    path: &str,
    config_path: &str,
    files_scanned: usize,
    report: &LintReport,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(path, config_path, files_scanned, report))?;
    println!("{}", json);
    Ok(())
}

fn finding_to_json(f: &Finding) -> JsonFinding {
    JsonFinding {
        kind: f.kind.as_str().to_string(),
        severity: f.severity.to_string(),
        entity: f.entity.clone(),
        message: f.message.clone(),
        rule: f.rule.clone(),
        file: f
            .origin
            .as_ref()
            .map(|o| o.file.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default(),
        line: f.origin.as_ref().map(|o| o.line).unwrap_or(0),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty format to stdout.
pub fn write_pretty(path: &str, config_path: &str, files_scanned: usize, report: &LintReport) {
    // Header
    println!();
    print!("  ");
    print!("{}", "nakurity".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    print!("  {}", "Config:   ".dimmed());
    println!("{}", config_path);
    print!("  {}", "Files:    ".dimmed());
    println!("{} ({} annotated entities)", files_scanned, report.entries);
    println!();

    if !report.findings.is_empty() {
        write_findings(&report.findings);
        println!();
    }

    let rules = summarize_rules(report);
    if !rules.is_empty() {
        write_rule_summary(&rules);
        println!();
    }

    write_final_status(report);
    println!();
}

fn write_findings(findings: &[Finding]) {
    println!("  {} ({}):", "Findings".bold(), findings.len());
    println!();

    for f in findings {
        write_severity_tag(&f.severity);
        print!("   ");
        print!("{:<26}", f.kind.as_str().dimmed());
        print!("{}", f.entity.blue());
        if let Some(origin) = &f.origin {
            print!("  {}", origin.to_string().dimmed());
        }
        println!();

        // Message on next line, indented
        println!("            {}", f.message);
        println!();
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_rule_summary(rules: &[RuleSummary]) {
    println!("  {}:", "Rules".bold());
    println!();
    for r in rules {
        print!("    {:<24}", r.rule);
        print!("{}", format!("{} passed", r.passed).green());
        if r.failed > 0 {
            print!("  {}", format!("{} failed", r.failed).yellow());
        }
        if r.faulted > 0 {
            print!("  {}", format!("{} faulted", r.faulted).red());
        }
        println!();
    }
}

fn write_final_status(report: &LintReport) {
    let summary = format!(
        "{} errors, {} warnings, {} info",
        report.count(Severity::Error),
        report.count(Severity::Warning),
        report.count(Severity::Info)
    );
    if passed(report) {
        println!("  {}  {}", "PASSED".green().bold(), summary.dimmed());
    } else {
        println!("  {}  {}", "FAILED".red().bold(), summary.dimmed());
    }
}
