use csv::ReaderBuilder;
use tracing::{debug, trace};

use crate::process::{encoding::DataStart, ProcessError, DELIMITER};

/// A file body as rows of string cells, all rows the same width.
///
/// The empty string marks an absent cell: a field left empty in the file, or one
/// missing from the end of a short line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTable {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl DecodedTable {
    /// Build a table from ragged rows, padding every row to the widest one.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows, width }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The cell at (`row`, `col`), or `None` when it is absent.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Non-absent cells of column `col`, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |r| r.get(col))
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }
}

/// The loader's output: the table plus what was dropped on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: DecodedTable,
    /// In-body `[...]` section marker rows removed after parsing.
    pub removed_markers: usize,
    /// Lines dropped because they held more fields than the table is wide.
    pub skipped_lines: usize,
}

/// Decode `bytes`, drop the header lines and split the rest into a table.
///
/// The width is fixed by the first parsed line. Shorter lines are padded, longer
/// ones skipped. Rows whose first cell starts with `[` are section markers and are
/// removed. An empty result is `EmptyFile`.
pub fn load_table(bytes: &[u8], start: DataStart) -> Result<LoadedTable, ProcessError> {
    let text = start.codec.decode(bytes)?;
    let body = skip_lines(&text, start.line);

    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut width: Option<usize> = None;
    let mut skipped_lines = 0;

    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(record = idx, error = %e, "unreadable line skipped");
                skipped_lines += 1;
                continue;
            }
        };

        let width = *width.get_or_insert(record.len());
        if record.len() > width {
            trace!(record = idx, fields = record.len(), width, "overlong line skipped");
            skipped_lines += 1;
            continue;
        }

        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    let before = rows.len();
    rows.retain(|row| !row.first().is_some_and(|c| c.starts_with('[')));
    let removed_markers = before - rows.len();

    if rows.is_empty() {
        return Err(ProcessError::EmptyFile);
    }

    debug!(
        rows = rows.len(),
        width = width.unwrap_or_default(),
        removed_markers,
        skipped_lines,
        "table loaded"
    );

    Ok(LoadedTable {
        table: DecodedTable {
            rows,
            width: width.unwrap_or_default(),
        },
        removed_markers,
        skipped_lines,
    })
}

/// Everything after the first `n` newline-terminated lines.
fn skip_lines(text: &str, n: usize) -> &str {
    if n == 0 {
        return text;
    }
    text.match_indices('\n')
        .nth(n - 1)
        .map_or("", |(pos, _)| &text[pos + 1..])
}
