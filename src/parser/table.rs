use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Half-open line range `[start, end)` of the embedded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpan {
    pub start: usize,
    pub end: usize,
}

/// One table row: column name → cell, in header order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultRow {
    cells: Vec<(String, String)>,
}

impl ResultRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableExtraction {
    /// `None` when no table was found or no row survived the arity check.
    pub rows: Option<Vec<ResultRow>>,
    /// Present whenever a header + separator pair was found.
    pub span: Option<TableSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Separator,
    PipeRow,
    Blank,
    Other,
}

enum State {
    Seeking,
    InHeader {
        start: usize,
        columns: Vec<String>,
    },
    InTable {
        start: usize,
        end: usize,
        columns: Vec<String>,
        rows: Vec<ResultRow>,
    },
}

/// Locate the first pipe table in `raw` and convert its rows.
///
/// Only the first non-separator pipe line is tried as a header. If the next
/// line is not a separator there is no table at all; later pipe lines are
/// never considered.
pub fn extract_table(raw: &str) -> TableExtraction {
    let mut state = State::Seeking;

    for (idx, line) in raw.split('\n').enumerate() {
        let kind = classify(line);
        state = match state {
            State::Seeking => match kind {
                LineKind::PipeRow => match header_columns(line) {
                    Some(columns) => State::InHeader { start: idx, columns },
                    None => {
                        debug!(line = idx, "pipe line is not a usable table header");
                        return TableExtraction::default();
                    }
                },
                _ => State::Seeking,
            },
            State::InHeader { start, columns } => match kind {
                LineKind::Separator => State::InTable {
                    start,
                    end: idx + 1,
                    columns,
                    rows: Vec::new(),
                },
                _ => {
                    debug!(line = start, "header line not followed by a separator");
                    return TableExtraction::default();
                }
            },
            State::InTable {
                start,
                columns,
                mut rows,
                end,
            } => match kind {
                LineKind::PipeRow => {
                    if let Some(row) = build_row(&columns, line) {
                        rows.push(row);
                    }
                    State::InTable {
                        start,
                        end: idx + 1,
                        columns,
                        rows,
                    }
                }
                LineKind::Separator => State::InTable {
                    start,
                    end: idx + 1,
                    columns,
                    rows,
                },
                LineKind::Blank | LineKind::Other => return finish(start, end, rows),
            },
        };
    }

    match state {
        State::InTable {
            start, end, rows, ..
        } => finish(start, end, rows),
        _ => TableExtraction::default(),
    }
}

fn finish(start: usize, end: usize, rows: Vec<ResultRow>) -> TableExtraction {
    debug!(start, end, rows = rows.len(), "table extracted");
    TableExtraction {
        rows: if rows.is_empty() { None } else { Some(rows) },
        span: Some(TableSpan { start, end }),
    }
}

fn classify(line: &str) -> LineKind {
    let t = line.trim();
    if t.is_empty() {
        LineKind::Blank
    } else if !t.contains('|') {
        LineKind::Other
    } else if is_separator(t) {
        LineKind::Separator
    } else {
        LineKind::PipeRow
    }
}

/// `|---|:---:|` style: pipes, dashes, alignment colons and whitespace only.
fn is_separator(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

/// Cells between the outer pipes; the first and last split pieces are dropped.
fn split_cells(line: &str) -> Vec<&str> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1].iter().map(|p| p.trim()).collect()
}

fn header_columns(line: &str) -> Option<Vec<String>> {
    let cells = split_cells(line);
    if cells.is_empty() || cells.iter().any(|c| c.is_empty()) {
        return None;
    }
    let mut columns: Vec<String> = Vec::with_capacity(cells.len());
    for cell in cells {
        if columns.iter().any(|c| c == cell) {
            return None;
        }
        columns.push(cell.to_string());
    }
    Some(columns)
}

fn build_row(columns: &[String], line: &str) -> Option<ResultRow> {
    let cells = split_cells(line);
    if cells.len() != columns.len() {
        return None;
    }
    Some(ResultRow {
        cells: columns
            .iter()
            .cloned()
            .zip(cells.into_iter().map(str::to_string))
            .collect(),
    })
}
