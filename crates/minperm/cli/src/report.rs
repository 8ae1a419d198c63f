//! Report rendering

use crate::error::CliResult;
use crate::output::OutputFormat;
use chrono::{DateTime, Utc};
use minperm_search::{SearchReport, StopReason};
use minperm_types::TestCase;
use serde::{Deserialize, Serialize};

const RULE_WIDTH: usize = 100;
const TRUNCATED: &str = " ... (truncated)";

/// Report configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Shorten long statements in the text report
    #[serde(default = "default_true")]
    pub trim_long_queries: bool,

    /// Statements longer than this many characters are shortened
    #[serde(default = "default_trim_query_size")]
    pub trim_query_size: usize,

    /// List statements that can never run
    #[serde(default)]
    pub show_invalid: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            trim_long_queries: true,
            trim_query_size: default_trim_query_size(),
            show_invalid: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_trim_query_size() -> usize {
    100
}

/// Render `report` in the requested format.
pub fn render(report: &SearchReport, config: &ReportConfig, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report, config)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&Document::new(report, config))?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&Document::new(report, config))?),
    }
}

/// Statement text as shown in the text report: control characters removed, line
/// breaks flattened, optionally truncated.
pub fn display_query(query: &str, config: &ReportConfig) -> String {
    let clean: String = query
        .chars()
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();

    if config.trim_long_queries && clean.chars().count() > config.trim_query_size {
        let mut trimmed: String = clean.chars().take(config.trim_query_size).collect();
        trimmed.push_str(TRUNCATED);
        trimmed
    } else {
        clean
    }
}

pub fn render_text(report: &SearchReport, config: &ReportConfig) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    let mut lines: Vec<String> = vec!["### Minimum Permissions".to_string()];

    for group in report.groups().iter() {
        lines.push(String::new());
        lines.push(rule.clone());
        lines.push(format!("Grants : {}", group.label()));
        lines.push(rule.clone());
        lines.extend(group.cases.iter().map(|case| display_query(&case.query, config)));
    }

    if config.show_invalid && !report.invalid.is_empty() {
        lines.push(String::new());
        lines.push("### Invalid Queries".to_string());
        for case in &report.invalid {
            lines.push(format!("- {}", display_query(&case.query, config)));
            if let Some(error) = &case.last_error {
                lines.push(format!("  error: {error}"));
            }
        }
    }

    if !report.unresolved.is_empty() {
        lines.push(String::new());
        lines.push("### Unresolved Queries".to_string());
        for case in &report.unresolved {
            lines.push(format!("- {}", display_query(&case.query, config)));
            if let Some(grants) = &case.last_tested_grants {
                lines.push(format!("  last tested grants: {grants}"));
            }
            if let Some(error) = &case.last_error {
                lines.push(format!("  last error: {error}"));
            }
        }
    }

    let unclassified: Vec<&TestCase> = report.unclassified().collect();
    if !unclassified.is_empty() {
        lines.push(String::new());
        lines.push("### Unclassified Errors".to_string());
        for case in unclassified {
            lines.push(format!("- {}", display_query(&case.query, config)));
            if let Some(error) = &case.last_error {
                lines.push(format!("  resolved despite: {error}"));
            }
        }
    }

    if !report.pruned.is_empty() {
        lines.push(String::new());
        lines.push("### Pruned Grants".to_string());
        let pruned: Vec<&str> = report.pruned.iter().map(|g| g.as_str()).collect();
        lines.push(pruned.join(", "));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} combinations tested up to depth {}; stopped: {}",
        report.attempts, report.depth_reached, report.stop_reason
    ));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Machine-readable report. Statements are kept verbatim.
#[derive(Debug, Serialize)]
struct Document<'a> {
    generated_at: DateTime<Utc>,
    stop_reason: StopReason,
    attempts: u64,
    depth_reached: usize,
    groups: Vec<DocumentGroup<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid: Option<&'a [TestCase]>,
    unresolved: &'a [TestCase],
    unclassified: Vec<&'a TestCase>,
    pruned: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct DocumentGroup<'a> {
    grants: String,
    statements: Vec<&'a str>,
}

impl<'a> Document<'a> {
    fn new(report: &'a SearchReport, config: &ReportConfig) -> Self {
        let groups = report
            .groups()
            .iter()
            .map(|group| DocumentGroup {
                grants: group.label(),
                statements: group.cases.iter().copied().map(|case| case.query.as_str()).collect(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            stop_reason: report.stop_reason,
            attempts: report.attempts,
            depth_reached: report.depth_reached,
            groups,
            invalid: config.show_invalid.then_some(report.invalid.as_slice()),
            unresolved: &report.unresolved,
            unclassified: report.unclassified().collect(),
            pruned: report.pruned.iter().map(|g| g.as_str()).collect(),
        }
    }
}
