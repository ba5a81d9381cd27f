//! Markdown pipe tables.

/// A parsed table: header cells plus the rows that matched the header width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Data rows discarded for having the wrong number of cells.
    pub dropped_rows: usize,
}

impl Table {
    /// A table renders only with a header and at least one data row.
    pub fn is_renderable(&self) -> bool {
        !self.header.is_empty() && !self.rows.is_empty()
    }
}

/// `|---|:--:|` style rows: only pipes, dashes, colons and spaces.
pub fn is_separator_row(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Cells between the outer pipes, trimmed.
///
/// `| a | b |` → `["a", "b"]`. A missing trailing pipe drops the last cell
/// fragment, matching how `|a|b` has no closing boundary.
pub fn split_cells(line: &str) -> Vec<String> {
    let pieces: Vec<&str> = line.trim().split('|').collect();
    if pieces.len() < 2 {
        return Vec::new();
    }
    pieces[1..pieces.len() - 1]
        .iter()
        .map(|c| c.trim().to_string())
        .collect()
}

/// Parse collected table lines (blank lines allowed, they are ignored).
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Table {
    let mut rows = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| l.starts_with('|') && !is_separator_row(l));

    let Some(header_line) = rows.next() else {
        return Table::default();
    };
    let header = split_cells(header_line);
    let mut table = Table {
        header,
        ..Table::default()
    };
    for line in rows {
        let cells = split_cells(line);
        if cells.len() == table.header.len() {
            table.rows.push(cells);
        } else {
            table.dropped_rows += 1;
        }
    }
    table
}
