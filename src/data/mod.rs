//! Data structures like tables.

use std::slice::{Chunks, ChunksMut};

/// A data frame of `f64` values, stored row-first.
///
/// Used for datasets (one row per sample) as well as for SOM weights (one row per unit).
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    ncols: usize,
    nrows: usize,
    names: Vec<String>,
    data: Vec<f64>,
}

impl DataFrame {
    /// Creates an empty data frame, with the given columns and zero rows.
    pub fn empty(columns: &[&str]) -> Self {
        DataFrame {
            names: columns.iter().map(|s| s.to_string()).collect(),
            ncols: columns.len(),
            nrows: 0,
            data: vec![],
        }
    }

    /// Creates an empty data frame with `ncols` columns named `0`, `1`, ...
    pub fn with_columns(ncols: usize) -> Self {
        DataFrame {
            names: (0..ncols).map(|i| i.to_string()).collect(),
            ncols,
            nrows: 0,
            data: vec![],
        }
    }

    /// Creates a blank data frame, with the given number of rows and columns, filled with a value.
    pub fn filled(nrows: usize, ncols: usize, fill: f64) -> Self {
        DataFrame {
            names: (0..ncols).map(|i| i.to_string()).collect(),
            ncols,
            nrows,
            data: vec![fill; nrows * ncols],
        }
    }

    /// Creates a data frame from a vector of rows. Columns are named `0`, `1`, ...
    ///
    /// Panics if the rows differ in length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let ncols = rows.first().map_or(0, |r| r.len());
        let mut df = Self::with_columns(ncols);
        for row in rows {
            df.push_row(row);
        }
        df
    }

    /// Creates a data frame from names and raw row-first data.
    ///
    /// Returns `None` if the data length is not a multiple of the number of columns.
    pub fn from_raw(names: Vec<String>, data: Vec<f64>) -> Option<Self> {
        let ncols = names.len();
        if ncols == 0 {
            return if data.is_empty() {
                Some(DataFrame {
                    names,
                    ncols,
                    nrows: 0,
                    data,
                })
            } else {
                None
            };
        }
        if data.len() % ncols != 0 {
            return None;
        }
        Some(DataFrame {
            nrows: data.len() / ncols,
            names,
            ncols,
            data,
        })
    }

    /// Number of columns in the data frame.
    pub fn ncols(&self) -> usize {
        self.ncols
    }
    /// Number of rows in the data frame.
    pub fn nrows(&self) -> usize {
        self.nrows
    }
    /// If the data frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }
    /// A reference to the raw data: a flat vector of values in row-first order.
    ///
    /// Example:
    ///
    /// ` x x x x x x x x x x x x x x x ...`
    ///
    /// `|___ row 1 ___|___ row 2 ___|___ ...`
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Returns a reference to the data frame's column names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Appends a row to the end of the data frame, from a slice.
    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(row.len(), self.ncols);
        self.data.extend_from_slice(row);
        self.nrows += 1;
    }
    /// Returns a reference to the value at (row, column).
    pub fn get(&self, row: usize, col: usize) -> &f64 {
        let idx = self.index(row, col);
        &self.data[idx]
    }

    /// Returns a row as a slice reference.
    pub fn get_row(&self, row: usize) -> &[f64] {
        let idx = self.index(row, 0);
        &self.data[idx..idx + self.ncols]
    }
    /// Returns a row as a mutable slice reference.
    pub fn get_row_mut(&mut self, row: usize) -> &mut [f64] {
        let idx = self.index(row, 0);
        &mut self.data[idx..idx + self.ncols]
    }

    /// Returns the raw data index for (row, col).
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.ncols + col
    }

    /// An iterator over rows.
    pub fn iter_rows(&self) -> Chunks<f64> {
        self.data.chunks(self.ncols.max(1))
    }
    /// A mutable iterator over rows.
    pub fn iter_rows_mut(&mut self) -> ChunksMut<f64> {
        self.data.chunks_mut(self.ncols.max(1))
    }
}

#[cfg(test)]
mod test {
    use crate::data::DataFrame;

    #[test]
    fn create_df() {
        let rows = 100;
        let df = DataFrame::filled(rows, 4, 0.0);

        assert_eq!(df.ncols, 4);
        assert_eq!(df.nrows, rows);
        assert_eq!(df.data.len(), rows * 4);
        assert_eq!(df.names(), &["0", "1", "2", "3"]);
    }

    #[test]
    fn create_df_from_rows() {
        let data = vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 3.0, 4.0, 5.],
            vec![3.0, 4.0, 5.0, 6.0],
        ];
        let df = DataFrame::from_rows(&data);

        assert_eq!(df.ncols, 4);
        assert_eq!(df.nrows, 3);
        assert_eq!(df.get(1, 1), &3.0);
    }

    #[test]
    fn create_df_from_raw() {
        let names = vec!["A".to_string(), "B".to_string()];
        let df = DataFrame::from_raw(names.clone(), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(df.nrows(), 2);
        assert_eq!(df.get_row(1), &[3.0, 4.0]);

        assert!(DataFrame::from_raw(names, vec![1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn add_rows() {
        let cols = ["A", "B", "C", "D"];
        let mut df = DataFrame::empty(&cols);

        df.push_row(&[1.0, 2.0, 3.0, 4.0]);
        df.push_row(&[2.0, 3.0, 4.0, 5.0]);
        df.push_row(&[3.0, 4.0, 5.0, 6.0]);

        assert_eq!(df.ncols, cols.len());
        assert_eq!(df.nrows, 3);
        assert_eq!(df.data.len(), 3 * cols.len());

        assert_eq!(df.get_row(1), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(df.get(1, 2), &4.0);
        assert_eq!(df.get(2, 3), &6.0);
    }

    #[test]
    fn iter_rows() {
        let rows = 10;
        let mut df = DataFrame::with_columns(4);

        for _i in 0..rows {
            df.push_row(&[1.0, 2.0, 3.0, 4.0]);
        }

        assert_eq!(df.iter_rows().count(), rows);

        for row in df.iter_rows_mut() {
            row[0] = 7.0;
        }
        assert!(df.iter_rows().all(|row| row == [7.0, 2.0, 3.0, 4.0]));
    }
}
