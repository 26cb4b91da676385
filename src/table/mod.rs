//! Name-indexed feature matrix.
//!
//! A [`FeatureTable`] owns a dense `(n_samples, n_features)` matrix together
//! with one unique name per column. The two are kept in lock-step: every
//! constructor and mutation re-validates that the name count matches the
//! column count, so downstream code can index columns by position or name
//! without re-checking.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{DataError, TableIoError};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    data: Array2<f64>,
    feature_names: Vec<String>,
}

impl FeatureTable {
    /// Builds a table from a matrix and its column names.
    ///
    /// # Errors
    /// [`DataError::NameCountMismatch`] when the name count differs from the
    /// column count, [`DataError::DuplicateName`] when a name repeats.
    pub fn new(data: Array2<f64>, feature_names: Vec<String>) -> Result<Self, DataError> {
        Self::validate(&data, &feature_names)?;
        Ok(Self {
            data,
            feature_names,
        })
    }

    fn validate(data: &Array2<f64>, names: &[String]) -> Result<(), DataError> {
        if names.len() != data.ncols() {
            return Err(DataError::NameCountMismatch {
                names: names.len(),
                columns: data.ncols(),
            });
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(DataError::DuplicateName { name: name.clone() });
            }
        }
        Ok(())
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Read-only view of one feature column.
    pub fn feature(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.column(index)
    }

    /// Swaps in a new matrix and name list as one atomic operation.
    ///
    /// Matrix and names can never be set independently, so the labeled view
    /// is resynchronized by construction. Validation failures leave the table
    /// untouched.
    pub fn replace(&mut self, data: Array2<f64>, feature_names: Vec<String>) -> Result<(), DataError> {
        Self::validate(&data, &feature_names)?;
        self.data = data;
        self.feature_names = feature_names;
        Ok(())
    }

    /// Loads a table from a CSV file with a feature-name header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, TableIoError> {
        Self::from_csv_reader(csv::Reader::from_path(path)?)
    }

    pub fn from_csv_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, TableIoError> {
        let feature_names: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut values = Vec::new();
        let mut n_rows = 0usize;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != feature_names.len() {
                return Err(TableIoError::RaggedRow {
                    row,
                    got: record.len(),
                    expected: feature_names.len(),
                });
            }
            for (column, field) in record.iter().enumerate() {
                let value: f64 = field.trim().parse().map_err(|_| TableIoError::Parse {
                    value: field.to_owned(),
                    row,
                    column,
                })?;
                values.push(value);
            }
            n_rows += 1;
        }
        let data = Array2::from_shape_vec((n_rows, feature_names.len()), values)
            .expect("row-major buffer matches the counted shape");
        Ok(Self::new(data, feature_names)?)
    }

    /// Writes the table as CSV: one header row of feature names, one row per
    /// sample.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TableIoError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.feature_names)?;
        for row in self.data.rows() {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_count_must_match_columns() {
        let err = FeatureTable::new(array![[1.0, 2.0], [3.0, 4.0]], names(&["a"])).unwrap_err();
        assert!(matches!(
            err,
            DataError::NameCountMismatch { names: 1, columns: 2 }
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err =
            FeatureTable::new(array![[1.0, 2.0]], names(&["a", "a"])).unwrap_err();
        assert!(matches!(err, DataError::DuplicateName { .. }));
    }

    #[test]
    fn test_replace_is_atomic() {
        let mut table =
            FeatureTable::new(array![[1.0, 2.0], [3.0, 4.0]], names(&["a", "b"])).unwrap();

        // A bad replacement leaves the old contents in place.
        assert!(table
            .replace(array![[1.0], [2.0]], names(&["x", "y"]))
            .is_err());
        assert_eq!(table.feature_names(), &["a", "b"]);
        assert_eq!(table.n_features(), 2);

        table
            .replace(array![[9.0], [8.0]], names(&["only"]))
            .unwrap();
        assert_eq!(table.feature_names(), &["only"]);
        assert_relative_eq!(table.feature(0)[0], 9.0);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");

        let table = FeatureTable::new(
            array![[1.5, -2.0, 0.25], [3.0, 4.0, -1.0]],
            names(&["f1", "f2", "f3"]),
        )
        .unwrap();
        table.save(&path).unwrap();

        let loaded = FeatureTable::from_csv_path(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_csv_parse_failure_is_typed() {
        let data = "a,b\n1.0,oops\n";
        let err =
            FeatureTable::from_csv_reader(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(matches!(
            err,
            TableIoError::Parse { row: 0, column: 1, .. }
        ));
    }
}
