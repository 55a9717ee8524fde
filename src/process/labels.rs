use serde::Serialize;

use crate::process::{raw_table::DecodedTable, utils::clean_label};

/// Only this many leading columns are searched for label columns.
pub const LABEL_SEARCH_COLUMNS: usize = 15;

pub const ENERGY_TYPES: [&str; 2] = ["KWT", "KVR"];
pub const DIRECTIONS: [&str; 6] = ["A+", "A-", "I+", "I-", "C+", "C-"];

/// A column found by a label scan, with the number of cells that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub index: usize,
    pub hits: usize,
}

/// First column among the leading `LABEL_SEARCH_COLUMNS` holding any cell from
/// `vocabulary` (after trimming and upper-casing).
pub fn locate_tagged_column(table: &DecodedTable, vocabulary: &[&str]) -> Option<ColumnMatch> {
    (0..table.width().min(LABEL_SEARCH_COLUMNS)).find_map(|col| {
        let hits = table
            .column(col)
            .filter(|cell| vocabulary.contains(&clean_label(cell).as_str()))
            .count();
        (hits > 0).then_some(ColumnMatch { index: col, hits })
    })
}

/// Column holding the energy type (`KWT`/`KVR`). Informational only.
pub fn locate_energy_column(table: &DecodedTable) -> Option<ColumnMatch> {
    locate_tagged_column(table, &ENERGY_TYPES)
}

/// Column holding the flow direction (`A+`, `A-`, `I+`, ...).
pub fn locate_direction_column(table: &DecodedTable) -> Option<ColumnMatch> {
    locate_tagged_column(table, &DIRECTIONS)
}
