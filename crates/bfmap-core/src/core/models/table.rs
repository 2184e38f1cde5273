use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TableModelError {
    #[error("A table requires at least one observable column")]
    EmptyColumns,
    #[error("Duplicate column name: '{0}'")]
    DuplicateColumn(String),
    #[error("Column '{column}' not found; available columns: {available:?}")]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("Row {key} has {found} cells, expected {expected}")]
    RowWidth {
        key: isize,
        expected: usize,
        found: usize,
    },
}

/// Checks that a column set is non-empty, has no blank names and no duplicates.
pub(crate) fn validate_columns(columns: &[String]) -> Result<(), TableModelError> {
    if columns.is_empty() {
        return Err(TableModelError::EmptyColumns);
    }
    let mut seen = HashSet::with_capacity(columns.len());
    for name in columns {
        if name.trim().is_empty() {
            return Err(TableModelError::EmptyColumns);
        }
        if !seen.insert(name.as_str()) {
            return Err(TableModelError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

/// Normalises a raw cell so that `NaN` is never stored as a value.
#[inline]
pub(crate) fn defined(cell: Option<f64>) -> Option<f64> {
    cell.filter(|v| !v.is_nan())
}

/// A validated choice of one observable column.
///
/// Only [`ObservableTable::select`] creates values of this type, so a
/// `SelectedColumn` always names a column that existed in the table it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectedColumn {
    name: String,
    index: usize,
}

impl SelectedColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Per-residue observables in crystal numbering.
///
/// Rows are keyed by residue identifier and kept in ascending order. Every row holds
/// exactly one cell per column; a cell is `None` when the observable is undefined for
/// that residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservableTable {
    columns: Vec<String>,
    rows: BTreeMap<isize, Vec<Option<f64>>>,
}

impl ObservableTable {
    pub fn new<I, S>(columns: I) -> Result<Self, TableModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        validate_columns(&columns)?;
        Ok(Self {
            columns,
            rows: BTreeMap::new(),
        })
    }

    /// Inserts or replaces the row for `residue`.
    pub fn insert_row(
        &mut self,
        residue: isize,
        cells: Vec<Option<f64>>,
    ) -> Result<(), TableModelError> {
        if cells.len() != self.columns.len() {
            return Err(TableModelError::RowWidth {
                key: residue,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        let cells = cells.into_iter().map(defined).collect();
        self.rows.insert(residue, cells);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn residues(&self) -> impl Iterator<Item = isize> + '_ {
        self.rows.keys().copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (isize, &[Option<f64>])> + '_ {
        self.rows.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    pub fn row(&self, residue: isize) -> Option<&[Option<f64>]> {
        self.rows.get(&residue).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn select(&self, name: &str) -> Result<SelectedColumn, TableModelError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|index| SelectedColumn {
                name: name.to_string(),
                index,
            })
            .ok_or_else(|| TableModelError::UnknownColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    /// Looks up the value of `column` for `residue`.
    ///
    /// Returns `None` both when the residue has no row and when its cell is undefined.
    pub fn value(&self, residue: isize, column: &SelectedColumn) -> Option<f64> {
        self.rows
            .get(&residue)
            .and_then(|row| row.get(column.index).copied().flatten())
    }

    /// Appends a column holding, for every row, the mean of its defined cells.
    pub fn push_mean_column(&mut self, name: impl Into<String>) -> Result<(), TableModelError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(TableModelError::DuplicateColumn(name));
        }
        for cells in self.rows.values_mut() {
            let (sum, count) = cells
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            let mean = (count > 0).then(|| sum / count as f64);
            cells.push(mean);
        }
        self.columns.push(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ObservableTable {
        let mut table = ObservableTable::new(["Classical", "Accelerated"]).unwrap();
        table
            .insert_row(10, vec![Some(197.21225), Some(828.368475)])
            .unwrap();
        table.insert_row(11, vec![Some(61.747075), None]).unwrap();
        table.insert_row(9, vec![Some(f64::NAN), None]).unwrap();
        table
    }

    #[test]
    fn new_rejects_empty_and_duplicate_columns() {
        assert_eq!(
            ObservableTable::new(Vec::<String>::new()),
            Err(TableModelError::EmptyColumns)
        );
        assert_eq!(
            ObservableTable::new(["A", " "]),
            Err(TableModelError::EmptyColumns)
        );
        assert_eq!(
            ObservableTable::new(["A", "B", "A"]),
            Err(TableModelError::DuplicateColumn("A".into()))
        );
    }

    #[test]
    fn insert_row_rejects_wrong_width() {
        let mut table = ObservableTable::new(["A", "B"]).unwrap();
        let result = table.insert_row(1, vec![Some(1.0)]);
        assert_eq!(
            result,
            Err(TableModelError::RowWidth {
                key: 1,
                expected: 2,
                found: 1
            })
        );
        assert!(table.is_empty());
    }

    #[test]
    fn rows_are_ordered_by_residue() {
        let table = sample_table();
        assert_eq!(table.residues().collect::<Vec<_>>(), vec![9, 10, 11]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn select_validates_column_name() {
        let table = sample_table();
        let col = table.select("Accelerated").unwrap();
        assert_eq!(col.name(), "Accelerated");
        assert_eq!(col.index(), 1);

        let err = table.select("Mean").unwrap_err();
        assert_eq!(
            err,
            TableModelError::UnknownColumn {
                column: "Mean".into(),
                available: vec!["Classical".into(), "Accelerated".into()],
            }
        );
    }

    #[test]
    fn value_distinguishes_defined_undefined_and_absent() {
        let table = sample_table();
        let classical = table.select("Classical").unwrap();
        let accelerated = table.select("Accelerated").unwrap();

        assert_eq!(table.value(10, &classical), Some(197.21225));
        assert_eq!(table.value(11, &accelerated), None);
        assert_eq!(table.value(9, &classical), None, "NaN is stored as undefined");
        assert_eq!(table.value(500, &classical), None);
    }

    #[test]
    fn push_mean_column_averages_defined_cells_only() {
        let mut table = sample_table();
        table.push_mean_column("Mean").unwrap();
        let mean = table.select("Mean").unwrap();

        let expected = (197.21225 + 828.368475) / 2.0;
        assert!((table.value(10, &mean).unwrap() - expected).abs() < 1e-9);
        assert_eq!(table.value(11, &mean), Some(61.747075));
        assert_eq!(table.value(9, &mean), None);
    }

    #[test]
    fn push_mean_column_rejects_existing_name() {
        let mut table = sample_table();
        assert_eq!(
            table.push_mean_column("Classical"),
            Err(TableModelError::DuplicateColumn("Classical".into()))
        );
    }
}
