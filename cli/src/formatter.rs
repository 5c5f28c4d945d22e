use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use serde::Serialize;

/// Variation count of one template, as reported by `count` and `count-bulk`
#[derive(Debug, Clone, Serialize)]
pub struct CountReport {
    pub path: String,
    /// Decimal string; counts do not fit JSON numbers
    pub count: Option<String>,
    pub explanation: Option<String>,
    pub error: Option<String>,
}

impl CountReport {
    pub fn counted(path: impl Into<String>, count: u128, explanation: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            count: Some(count.to_string()),
            explanation: Some(explanation.into()),
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            count: None,
            explanation: None,
            error: Some(error.into()),
        }
    }
}

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    /// Count and explanation of a single template
    pub fn format_count(&self, count: u128, explanation: &str) -> String {
        format!(
            "Total possible variations: {}\n{}\n",
            display_count(count),
            explanation
        )
    }

    pub fn format_count_table(&self, reports: &[CountReport]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Template").set_alignment(CellAlignment::Left),
            Cell::new("Variations").set_alignment(CellAlignment::Right),
            Cell::new("Explanation").set_alignment(CellAlignment::Left),
        ]));

        for report in reports {
            let count = match &report.count {
                Some(count) => count.clone(),
                None => "error".to_string(),
            };
            let detail = report
                .explanation
                .as_deref()
                .or(report.error.as_deref())
                .unwrap_or("");
            table.add_row(Row::from(vec![
                Cell::new(&report.path),
                Cell::new(count).set_alignment(CellAlignment::Right),
                Cell::new(detail),
            ]));
        }

        format!("{}\n", table)
    }

    pub fn format_count_json(&self, reports: &[CountReport]) -> serde_json::Result<String> {
        serde_json::to_string_pretty(reports)
    }

    /// One line per finished bulk run
    pub fn format_bulk_summary(&self, processed: usize, failed: &[(String, String)]) -> String {
        let mut output = format!(
            "Processed {} template(s), {} failed\n",
            processed,
            failed.len()
        );
        for (path, label) in failed {
            output.push_str(&format!("  {}: {}\n", path, label));
        }
        output
    }
}

/// Saturated counts are shown as a lower bound
fn display_count(count: u128) -> String {
    if count == u128::MAX {
        format!("at least {}", count)
    } else {
        count.to_string()
    }
}
