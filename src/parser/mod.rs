pub mod format;
pub mod sections;
pub mod strip;
pub mod table;

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ReportError;
use table::ResultRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedReport {
    pub narrative: String,
    pub explanation: String,
    pub results: Option<Vec<ResultRow>>,
    pub table_span_removed: bool,
    /// Set when the record is the pass-through fallback.
    #[serde(skip)]
    pub degraded: bool,
}

impl ParsedReport {
    /// Pass-through record used whenever parsing fails.
    pub fn pass_through(raw: &str) -> Self {
        ParsedReport {
            narrative: raw.to_string(),
            explanation: String::new(),
            results: None,
            table_span_removed: false,
            degraded: true,
        }
    }
}

/// Pipeline: table → strip span → sections → formatted explanation.
/// Never fails; any error or panic yields [`ParsedReport::pass_through`].
pub fn parse_report(raw: &str) -> ParsedReport {
    parse_report_with(raw, try_parse_report)
}

/// Run `stage` under the degrade-on-failure policy of [`parse_report`].
///
/// A panicking stage still goes through the process panic hook before it is
/// caught; the binary installs a hook that reports through `tracing`.
pub fn parse_report_with<F>(raw: &str, stage: F) -> ParsedReport
where
    F: FnOnce(&str) -> Result<ParsedReport, ReportError>,
{
    match run_stage(raw, stage) {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, chars = raw.len(), "Failed to parse report, passing text through");
            ParsedReport::pass_through(raw)
        }
    }
}

/// Panics become [`ReportError::Panicked`].
fn run_stage<F>(raw: &str, stage: F) -> Result<ParsedReport, ReportError>
where
    F: FnOnce(&str) -> Result<ParsedReport, ReportError>,
{
    panic::catch_unwind(AssertUnwindSafe(|| stage(raw)))
        .unwrap_or_else(|payload| Err(ReportError::Panicked(panic_message(payload.as_ref()))))
}

fn try_parse_report(raw: &str) -> Result<ParsedReport, ReportError> {
    let extraction = table::extract_table(raw);
    let stripped = match extraction.span {
        Some(span) => strip::remove_span(raw, span)?,
        None => raw.to_string(),
    };

    let sections = sections::split_sections(&stripped);
    debug!(
        sections = sections.len(),
        rows = extraction.rows.as_ref().map_or(0, Vec::len),
        "report split"
    );

    let narrative = sections
        .first()
        .map(|s| s.body.clone())
        .unwrap_or_default();

    Ok(ParsedReport {
        narrative,
        explanation: format::build_explanation(&sections),
        results: extraction.rows,
        table_span_removed: extraction.span.is_some(),
        degraded: false,
    })
}

pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Tests ──
