use serde::Serialize;

use crate::process::{
    encoding::{Codec, DataStart},
    labels::{locate_direction_column, locate_energy_column},
    raw_table::DecodedTable,
    value_block::{locate_value_columns, ValueColumns},
    ProcessError,
};

/// Column roles discovered in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutInfo {
    pub header_skip_count: usize,
    pub encoding: Codec,
    /// The header skip count is the fallback guess, not a detected date line.
    pub fallback_offset: bool,
    pub energy_column: Option<usize>,
    pub direction_column: usize,
    /// Always after `direction_column`.
    pub value_columns: ValueColumns,
}

pub fn infer_layout(table: &DecodedTable, start: DataStart) -> Result<LayoutInfo, ProcessError> {
    let energy_column = locate_energy_column(table).map(|m| m.index);
    let direction_column = locate_direction_column(table)
        .ok_or(ProcessError::DirectionColumnNotFound)?
        .index;
    let value_columns = locate_value_columns(table, direction_column + 1)?;

    Ok(LayoutInfo {
        header_skip_count: start.line,
        encoding: start.codec,
        fallback_offset: start.fallback,
        energy_column,
        direction_column,
        value_columns,
    })
}
