use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("table span {start}..{end} is empty or reversed")]
    InvalidSpan { start: usize, end: usize },
    #[error("table span {start}..{end} exceeds {lines} lines")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        lines: usize,
    },
    #[error("parser stage panicked: {0}")]
    Panicked(String),
}
