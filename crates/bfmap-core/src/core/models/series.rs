use super::table::{TableModelError, defined, validate_columns};

/// A per-frame observable, one column per simulation run.
///
/// Each frame row carries one cell per run. Runs of different length leave the cells
/// past their last frame undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    columns: Vec<String>,
    frames: Vec<isize>,
    cells: Vec<Vec<Option<f64>>>,
}

impl FrameTable {
    pub fn new<I, S>(columns: I) -> Result<Self, TableModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        validate_columns(&columns)?;
        Ok(Self {
            columns,
            frames: Vec::new(),
            cells: Vec::new(),
        })
    }

    pub fn push_frame(
        &mut self,
        frame: isize,
        cells: Vec<Option<f64>>,
    ) -> Result<(), TableModelError> {
        if cells.len() != self.columns.len() {
            return Err(TableModelError::RowWidth {
                key: frame,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        self.frames.push(frame);
        self.cells.push(cells.into_iter().map(defined).collect());
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn frames(&self) -> &[isize] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the defined samples of column `index` in frame order.
    pub fn samples(&self, index: usize) -> Vec<f64> {
        self.cells
            .iter()
            .filter_map(|row| row.get(index).copied().flatten())
            .collect()
    }
}

/// One labelled row of a [`StatisticsTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRow {
    pub label: String,
    pub cells: Vec<Option<f64>>,
}

/// Descriptive statistics with one column per run and one labelled row per quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsTable {
    columns: Vec<String>,
    rows: Vec<StatisticsRow>,
}

impl StatisticsTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, label: impl Into<String>, cells: Vec<Option<f64>>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows.push(StatisticsRow {
            label: label.into(),
            cells,
        });
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[StatisticsRow] {
        &self.rows
    }

    pub fn row(&self, label: &str) -> Option<&StatisticsRow> {
        self.rows.iter().find(|r| r.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_skip_undefined_cells() {
        let mut table = FrameTable::new(["run1", "run2"]).unwrap();
        table.push_frame(1, vec![Some(12.0), Some(14.0)]).unwrap();
        table.push_frame(2, vec![Some(f64::NAN), Some(15.0)]).unwrap();
        table.push_frame(3, vec![Some(13.0), None]).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.frames(), &[1, 2, 3]);
        assert_eq!(table.samples(0), vec![12.0, 13.0]);
        assert_eq!(table.samples(1), vec![14.0, 15.0]);
        assert!(table.samples(7).is_empty());
    }

    #[test]
    fn push_frame_rejects_wrong_width() {
        let mut table = FrameTable::new(["run1"]).unwrap();
        assert!(matches!(
            table.push_frame(1, vec![Some(1.0), Some(2.0)]),
            Err(TableModelError::RowWidth { key: 1, .. })
        ));
        assert!(table.is_empty());
    }
}
