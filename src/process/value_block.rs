use serde::Serialize;
use std::fmt;

use crate::process::{
    raw_table::DecodedTable, utils::parse_reading, ProcessError, QUARTER_HOURS_PER_DAY,
};

/// Only this many leading rows are tried when searching for the value block.
pub const VALUE_SEARCH_ROWS: usize = 10;

/// Column indices of one day's quarter-hour readings: exactly
/// `QUARTER_HOURS_PER_DAY` of them, strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueColumns(Vec<usize>);

impl ValueColumns {
    /// Accepts `indices` only if it has the right length and is strictly increasing;
    /// otherwise hands back how many indices were offered.
    pub fn new(indices: Vec<usize>) -> Result<Self, usize> {
        let increasing = indices.windows(2).all(|w| w[0] < w[1]);
        if indices.len() == QUARTER_HOURS_PER_DAY && increasing {
            Ok(Self(indices))
        } else {
            Err(indices.len())
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn first(&self) -> usize {
        self.0[0]
    }

    pub fn last(&self) -> usize {
        self.0[QUARTER_HOURS_PER_DAY - 1]
    }
}

impl fmt::Display for ValueColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.first(), self.last())
    }
}

/// Result of scanning one row for the value block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowScan {
    Found(ValueColumns),
    /// The run stopped short; carries how many numeric columns it collected.
    Partial(usize),
}

/// Collect the run of numeric cells starting at `start`.
///
/// Absent cells are stepped over without breaking the run. Non-numeric cells are
/// stepped over until the first number is seen; after that one ends the run.
pub fn scan_row(row: &[String], start: usize) -> RowScan {
    let mut collected = Vec::with_capacity(QUARTER_HOURS_PER_DAY);

    for (col, cell) in row.iter().enumerate().skip(start) {
        if cell.is_empty() {
            continue;
        }
        if parse_reading(cell).is_none() {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        collected.push(col);
        if collected.len() == QUARTER_HOURS_PER_DAY {
            break;
        }
    }

    match ValueColumns::new(collected) {
        Ok(columns) => RowScan::Found(columns),
        Err(count) => RowScan::Partial(count),
    }
}

/// Try the first `VALUE_SEARCH_ROWS` rows in order; the first complete block wins.
pub fn locate_value_columns(
    table: &DecodedTable,
    start: usize,
) -> Result<ValueColumns, ProcessError> {
    let mut best = 0;
    for row in table.rows().iter().take(VALUE_SEARCH_ROWS) {
        match scan_row(row, start) {
            RowScan::Found(columns) => return Ok(columns),
            RowScan::Partial(count) => best = best.max(count),
        }
    }
    Err(ProcessError::ValueColumnsNotFound {
        expected: QUARTER_HOURS_PER_DAY,
        found: best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{},5", i)).collect()
    }

    fn row(prefix: &[&str], tail: Vec<String>) -> Vec<String> {
        prefix.iter().map(|c| c.to_string()).chain(tail).collect()
    }

    #[test]
    fn contiguous_block_after_direction() {
        let r = row(&["01012024", "KWT", "A+"], numbers(96));
        let RowScan::Found(columns) = scan_row(&r, 3) else {
            panic!("no block found");
        };
        assert_eq!(columns.first(), 3);
        assert_eq!(columns.last(), 98);
        assert_eq!(columns.to_string(), "3 to 98");
    }

    #[test]
    fn leading_absent_cell_is_tolerated() {
        let mut tail = vec![String::new()];
        tail.extend(numbers(96));
        let r = row(&["01012024", "A+"], tail);
        let RowScan::Found(columns) = scan_row(&r, 2) else {
            panic!("no block found");
        };
        assert_eq!(columns.first(), 3);
        assert_eq!(columns.last(), 98);
    }

    #[test]
    fn absent_cell_inside_block_is_skipped() {
        let mut tail = numbers(50);
        tail.push(String::new());
        tail.extend(numbers(46));
        let r = row(&["01012024", "A+"], tail);
        let RowScan::Found(columns) = scan_row(&r, 2) else {
            panic!("no block found");
        };
        assert!(!columns.indices().contains(&52));
        assert_eq!(columns.last(), 98);
    }

    #[test]
    fn text_before_first_number_is_stepped_over() {
        let r = row(&["01012024", "A+", "kWh", "OK"], numbers(96));
        assert!(matches!(scan_row(&r, 2), RowScan::Found(c) if c.first() == 4));
    }

    #[test]
    fn ninety_five_then_text_is_not_a_block() {
        let mut tail = numbers(95);
        tail.push("W".into());
        tail.extend(numbers(10));
        let r = row(&["01012024", "A+"], tail);
        assert_eq!(scan_row(&r, 2), RowScan::Partial(95));

        let table = DecodedTable::from_rows(vec![r]);
        assert_eq!(
            locate_value_columns(&table, 2),
            Err(ProcessError::ValueColumnsNotFound {
                expected: 96,
                found: 95
            })
        );
    }

    #[test]
    fn later_row_can_supply_the_block() {
        let short = row(&["01012024", "A+"], numbers(20));
        let full = row(&["02012024", "A+"], numbers(96));
        let table = DecodedTable::from_rows(vec![short, full]);
        let columns = locate_value_columns(&table, 2).unwrap();
        assert_eq!(columns.first(), 2);
    }

    #[test]
    fn only_the_first_ten_rows_are_tried() {
        let mut rows: Vec<Vec<String>> = (0..VALUE_SEARCH_ROWS)
            .map(|_| row(&["01012024", "A+"], numbers(3)))
            .collect();
        rows.push(row(&["02012024", "A+"], numbers(96)));
        let table = DecodedTable::from_rows(rows);
        assert_eq!(
            locate_value_columns(&table, 2),
            Err(ProcessError::ValueColumnsNotFound {
                expected: 96,
                found: 3
            })
        );
    }

    #[test]
    fn value_columns_invariants() {
        assert_eq!(ValueColumns::new((0..95).collect()), Err(95));
        let mut shuffled: Vec<usize> = (0..96).collect();
        shuffled.swap(3, 4);
        assert_eq!(ValueColumns::new(shuffled), Err(96));
        assert!(ValueColumns::new((10..106).collect()).is_ok());
    }
}
