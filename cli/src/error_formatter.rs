use ariadne::{Color, Label, Report, ReportKind, Source};
use procgen::error::ParseErrorDetails;
use procgen::ProcgenError;

/// Format a ProcgenError for the terminal, with an Ariadne report for YAML syntax errors
pub fn format_error(error: &ProcgenError) -> String {
    match error {
        ProcgenError::Parse(details) => match details.index {
            Some(index) => format_parse_report(details, index).unwrap_or_else(|| error.to_string()),
            None => error.to_string(),
        },
        ProcgenError::InSource { source_id, error } => match error.as_ref() {
            // The report already names the file.
            ProcgenError::Parse(_) => format_error(error),
            inner => format!(
                "{} in {}\n{}",
                inner.user_label(),
                source_id,
                format_error(inner)
            ),
        },
        ProcgenError::Internal(message) => format!(
            "Internal error: {}\nThis is a bug in procgen, not in the template.",
            message
        ),
        other => other.to_string(),
    }
}

fn format_parse_report(details: &ParseErrorDetails, index: usize) -> Option<String> {
    let mut output = Vec::new();
    let end = (index + 1).min(details.source_text.len()).max(index);
    let message = format!(
        "Parse error: {} (file {}:{}:{})",
        details.message, details.source_id, details.line, details.column
    );

    let report = Report::build(ReportKind::Error, &details.source_id, index)
        .with_message(message)
        .with_label(
            Label::new((&details.source_id, index..end))
                .with_message("")
                .with_color(Color::Red),
        );

    report
        .finish()
        .write(
            (
                &details.source_id,
                Source::from(details.source_text.as_ref()),
            ),
            &mut output,
        )
        .ok()?;
    Some(String::from_utf8_lossy(&output).to_string())
}
