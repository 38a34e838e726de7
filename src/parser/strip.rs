use crate::error::ReportError;

use super::table::TableSpan;

/// Delete the spanned lines from `raw`, leaving every other line untouched.
///
/// When removal would glue two non-blank lines together, one blank line is
/// put back in place of the table.
pub fn remove_span(raw: &str, span: TableSpan) -> Result<String, ReportError> {
    let lines: Vec<&str> = raw.split('\n').collect();
    if span.start >= span.end {
        return Err(ReportError::InvalidSpan {
            start: span.start,
            end: span.end,
        });
    }
    if span.end > lines.len() {
        return Err(ReportError::SpanOutOfBounds {
            start: span.start,
            end: span.end,
            lines: lines.len(),
        });
    }

    let before = &lines[..span.start];
    let after = &lines[span.end..];

    let mut kept: Vec<&str> = Vec::with_capacity(lines.len() - (span.end - span.start) + 1);
    kept.extend_from_slice(before);
    match (before.last(), after.first()) {
        (Some(prev), Some(next)) if !is_blank(prev) && !is_blank(next) => {
            kept.push(if prev.ends_with('\r') { "\r" } else { "" });
        }
        _ => {}
    }
    kept.extend_from_slice(after);

    Ok(kept.join("\n"))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
