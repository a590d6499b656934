//! Diagnostic rendering for human-readable output.
//!
//! Renders diagnostics in a format similar to Rust compiler errors:
//!
//! ```text
//! error[E001]: MINUS is not supported
//!   --> query.sparql:3:10
//!    |
//!  3 |   MINUS { ?s :p ?o }
//!    |   ^^^^^ unsupported keyword
//!    |
//!    = note: Supported patterns: triples, FILTER, OPTIONAL, UNION, BIND
//! ```

use crate::diag::{Diagnostic, Severity};
use crate::span::LineIndex;

/// Render a diagnostic to a string.
pub fn render_diagnostic(diag: &Diagnostic, source: &str, filename: Option<&str>) -> String {
    let index = LineIndex::new(source);
    let mut output = String::new();

    // Header line: severity[code]: message
    let severity_str = match diag.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Note => "note",
    };
    output.push_str(&format!(
        "{}[{}]: {}\n",
        severity_str,
        diag.code.code(),
        diag.message
    ));

    // Location line: --> filename:line:col
    let start_loc = index.line_col(diag.span.start);
    let file = filename.unwrap_or("<input>");
    output.push_str(&format!(
        "  --> {}:{}:{}\n",
        file, start_loc.line, start_loc.col
    ));

    render_source_snippet(&mut output, source, &index, diag);

    if let Some(help) = &diag.help {
        for line in help.lines() {
            output.push_str(&format!("   = help: {}\n", line));
        }
    }

    if let Some(note) = &diag.note {
        for line in note.lines() {
            output.push_str(&format!("   = note: {}\n", line));
        }
    }

    output
}

fn render_source_snippet(output: &mut String, source: &str, index: &LineIndex, diag: &Diagnostic) {
    let start_loc = index.line_col(diag.span.start);
    let end_loc = index.line_col(diag.span.end);

    let max_line = end_loc.line;
    let gutter_width = max_line.to_string().len();

    for line_num in start_loc.line..=end_loc.line {
        let line_start = index.line_start(line_num).unwrap_or(0);
        let line_end = index.line_end(line_num, source);
        let line_text = &source[line_start.min(source.len())..line_end.min(source.len())];
        let line_text = line_text.trim_end_matches('\n');

        // Empty gutter line
        output.push_str(&format!("{:>width$} |\n", "", width = gutter_width));

        // Line with source
        output.push_str(&format!(
            "{:>width$} | {}\n",
            line_num,
            line_text,
            width = gutter_width
        ));

        // Underline
        let underline_start = if line_num == start_loc.line {
            start_loc.col as usize
        } else {
            1
        };
        let underline_end = if line_num == end_loc.line {
            end_loc.col as usize
        } else {
            line_text.len() + 1
        };

        let padding = " ".repeat(underline_start.saturating_sub(1));
        let underline_len = underline_end.saturating_sub(underline_start).max(1);
        let underline = "^".repeat(underline_len);

        // Attach the first label that starts on this line, if any
        let label_text = diag
            .labels
            .iter()
            .find(|l| index.line_col(l.span.start).line == line_num)
            .map(|l| format!(" {}", l.message))
            .unwrap_or_default();

        output.push_str(&format!(
            "{:>width$} | {}{}{}\n",
            "",
            padding,
            underline,
            label_text,
            width = gutter_width
        ));
    }

    // Final empty gutter line
    output.push_str(&format!("{:>width$} |\n", "", width = gutter_width));
}

/// Render multiple diagnostics separated by blank lines.
pub fn render_diagnostics(
    diagnostics: &[Diagnostic],
    source: &str,
    filename: Option<&str>,
) -> String {
    diagnostics
        .iter()
        .map(|d| render_diagnostic(d, source, filename))
        .collect::<Vec<_>>()
        .join("\n")
}
