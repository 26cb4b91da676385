//! Redundancy pruning by pairwise cosine similarity.
//!
//! Columns are scanned left to right; a candidate survives only if it is not
//! a near-duplicate (absolute cosine above the threshold) of any column kept
//! before it. The scan is greedy and order-dependent: column order is part of
//! the contract, and permuting the input can change which member of a cluster
//! of mutually similar columns survives, though each cluster always keeps at
//! least one.

use std::path::Path;

use ndarray::Axis;

use crate::error::{ReduceError, TableIoError};
use crate::reduce::{store_dir_ok, unit_scale_columns, Reducer};
use crate::similarity::{AbsoluteCosine, SimilarityMeasure};
use crate::table::FeatureTable;

pub const DEFAULT_THRESHOLD: f64 = 0.86;

pub struct CosineReducer {
    threshold: f64,
}

impl Default for CosineReducer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl CosineReducer {
    /// Creates a reducer that drops a column whose similarity to an
    /// already-kept column exceeds `threshold` (expected in (0, 1]).
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Ordered original indices of the columns that survive the greedy scan.
    ///
    /// Regenerated on every call; the reducer keeps no fitted state.
    pub fn select_indices(&self, table: &FeatureTable) -> Result<Vec<usize>, ReduceError> {
        let scaled = unit_scale_columns(table.data(), table.feature_names())?;

        let mut kept: Vec<usize> = Vec::new();
        for candidate in 0..scaled.ncols() {
            let column = scaled.column(candidate);
            let is_similar = kept.iter().any(|&keep| {
                AbsoluteCosine.calculate(scaled.column(keep), column) > self.threshold
            });
            if !is_similar {
                kept.push(candidate);
            }
        }
        Ok(kept)
    }

    /// Returns a copy of `table` pruned to the kept columns, in original
    /// order. When `store_folder` is an existing directory the pruned table
    /// is written to `cos_feature.csv` and the kept names to `cos_sort.csv`;
    /// store problems are logged and never fail the call.
    pub fn reduce(
        &self,
        table: &FeatureTable,
        store_folder: Option<&Path>,
    ) -> Result<FeatureTable, ReduceError> {
        let kept = self.select_indices(table)?;
        log::debug!(
            "Cos: kept {} of {} columns at threshold {}",
            kept.len(),
            table.n_features(),
            self.threshold
        );

        let data = table.data().select(Axis(1), &kept);
        let names: Vec<String> = kept
            .iter()
            .map(|&index| table.feature_names()[index].clone())
            .collect();
        let out = FeatureTable::new(data, names)?;
        if let Some(folder) = store_folder {
            self.store(folder, &out);
        }
        Ok(out)
    }

    fn store(&self, folder: &Path, pruned: &FeatureTable) {
        if !store_dir_ok(folder, self.name()) {
            return;
        }
        let table_path = folder.join("cos_feature.csv");
        if let Err(e) = pruned.save(&table_path) {
            log::warn!("Cos: could not store pruned table to {}: {e}", table_path.display());
        }
        let names_path = folder.join("cos_sort.csv");
        if let Err(e) = Self::store_kept_names(&names_path, pruned.feature_names()) {
            log::warn!("Cos: could not store kept names to {}: {e}", names_path.display());
        }
    }

    fn store_kept_names(path: &Path, names: &[String]) -> Result<(), TableIoError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["feature"])?;
        for name in names {
            writer.write_record([name.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Reducer for CosineReducer {
    fn name(&self) -> &'static str {
        "Cos"
    }

    fn reduce(
        &mut self,
        table: &FeatureTable,
        store_folder: Option<&Path>,
    ) -> Result<FeatureTable, ReduceError> {
        CosineReducer::reduce(self, table, store_folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // 3 samples x 4 features, columns 1 and 3 identical.
    fn duplicate_table() -> FeatureTable {
        FeatureTable::new(
            array![
                [1.0, 0.0, 2.0, 1.0],
                [0.0, 1.0, -1.0, 0.0],
                [2.0, 1.0, 0.5, 2.0],
            ],
            names(&["a", "b", "c", "a_copy"]),
        )
        .unwrap()
    }

    #[test]
    fn test_exact_duplicate_is_dropped() {
        let reducer = CosineReducer::default();
        let kept = reducer.select_indices(&duplicate_table()).unwrap();
        assert_eq!(kept, vec![0, 1, 2]);

        let out = reducer.reduce(&duplicate_table(), None).unwrap();
        assert_eq!(out.feature_names(), &["a", "b", "c"]);
        assert_eq!(out.n_features(), 3);
        assert_eq!(out.feature_names().len(), out.n_features());
        // Surviving columns keep their original values.
        assert_eq!(out.feature(2).to_vec(), vec![2.0, -1.0, 0.5]);
    }

    #[test]
    fn test_threshold_one_keeps_everything() {
        let reducer = CosineReducer::new(1.0);
        let kept = reducer.select_indices(&duplicate_table()).unwrap();
        assert_eq!(kept, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_threshold_zero_keeps_only_first_column() {
        // All-positive columns, so every pairwise similarity is > 0.
        let table = FeatureTable::new(
            Array2::from_shape_fn((4, 5), |(i, j)| 1.0 + (i * (j + 1)) as f64),
            names(&["a", "b", "c", "d", "e"]),
        )
        .unwrap();
        let reducer = CosineReducer::new(0.0);
        let kept = reducer.select_indices(&table).unwrap();
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_selection_is_order_dependent_but_covers_clusters() {
        // Two clusters of mutually similar columns: {a, a2} and {b, b2}.
        let data = array![
            [1.0, 1.01, 0.0, 0.02],
            [0.0, 0.01, 1.0, 0.99],
            [1.0, 0.99, -1.0, -1.01],
        ];
        let table = FeatureTable::new(data.clone(), names(&["a", "a2", "b", "b2"])).unwrap();
        let reducer = CosineReducer::default();
        let kept = reducer.select_indices(&table).unwrap();
        assert_eq!(kept, vec![0, 2]);

        // Reversed column order keeps the other cluster members, but still
        // exactly one per cluster.
        let reversed = FeatureTable::new(
            data.select(Axis(1), &[3, 2, 1, 0]),
            names(&["b2", "b", "a2", "a"]),
        )
        .unwrap();
        let kept = reducer.select_indices(&reversed).unwrap();
        assert_eq!(kept, vec![0, 2]);
        let survivors: Vec<&str> = kept
            .iter()
            .map(|&i| reversed.feature_names()[i].as_str())
            .collect();
        assert_eq!(survivors, vec!["b2", "a2"]);
    }

    #[test]
    fn test_anti_parallel_columns_collapse() {
        // Sign is ignored by the similarity, so a negated column is redundant.
        let table = FeatureTable::new(
            array![[1.0, -1.0], [2.0, -2.0], [0.5, -0.5]],
            names(&["up", "down"]),
        )
        .unwrap();
        let kept = CosineReducer::default().select_indices(&table).unwrap();
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_zero_norm_column_is_a_data_error() {
        let table = FeatureTable::new(
            array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]],
            names(&["ok", "flat"]),
        )
        .unwrap();
        let err = CosineReducer::default().select_indices(&table).unwrap_err();
        assert!(matches!(
            err,
            ReduceError::Data(crate::error::DataError::ZeroNormColumn { index: 1, .. })
        ));
    }

    #[test]
    fn test_store_writes_table_and_kept_names() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();

        let reducer = CosineReducer::default();
        reducer.reduce(&duplicate_table(), Some(dir.path())).unwrap();

        let pruned = FeatureTable::from_csv_path(dir.path().join("cos_feature.csv")).unwrap();
        assert_eq!(pruned.feature_names(), &["a", "b", "c"]);

        let kept = std::fs::read_to_string(dir.path().join("cos_sort.csv")).unwrap();
        let lines: Vec<&str> = kept.lines().collect();
        assert_eq!(lines, vec!["feature", "a", "b", "c"]);
    }

    #[test]
    fn test_bad_store_folder_is_non_fatal() {
        let reducer = CosineReducer::default();
        let out = reducer
            .reduce(&duplicate_table(), Some(Path::new("/nonexistent/store/folder")))
            .unwrap();
        assert_eq!(out.n_features(), 3);
    }
}
