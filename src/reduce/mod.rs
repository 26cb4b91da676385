//! Feature-space reduction strategies.
//!
//! Two strategies share this module's contracts: [`pca::PcaReducer`] projects
//! the table onto a fixed number of principal components, and
//! [`cosine::CosineReducer`] prunes columns that are near-duplicates of
//! already-kept ones. Both consume a [`FeatureTable`] and return a new,
//! independent table; the input is never mutated.

pub mod cosine;
pub mod pca;

use std::path::Path;

use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::{DataError, ReduceError};
use crate::table::FeatureTable;

/// Common surface of the reduction strategies.
pub trait Reducer {
    /// Short identifier used in log output.
    fn name(&self) -> &'static str;

    /// One-call training-time entry point: fits whatever internal state the
    /// strategy keeps and returns the reduced copy of `table`. When
    /// `store_folder` names an existing directory, the strategy's output
    /// files are written into it; anywhere else the store is skipped with a
    /// warning and the table is still returned.
    fn reduce(
        &mut self,
        table: &FeatureTable,
        store_folder: Option<&Path>,
    ) -> Result<FeatureTable, ReduceError>;
}

/// Scales every column to unit L2 norm.
///
/// Both strategies agree on this normalization policy, so similarity scores
/// and component loadings are comparable across columns regardless of the
/// original feature scale.
///
/// # Errors
/// [`DataError::EmptyMatrix`] for a 0-row or 0-column input,
/// [`DataError::ZeroNormColumn`] when any column is all zeros. The guard runs
/// before the divide, so a degenerate column can never leak NaNs into the
/// output.
pub(crate) fn unit_scale_columns(
    x: ArrayView2<f64>,
    names: &[String],
) -> Result<Array2<f64>, DataError> {
    let (rows, cols) = x.dim();
    if rows == 0 || cols == 0 {
        return Err(DataError::EmptyMatrix { rows, cols });
    }

    let norms = x
        .axis_iter(Axis(1))
        .enumerate()
        .map(|(index, col)| {
            let norm = col.dot(&col).sqrt();
            if norm == 0.0 {
                Err(DataError::ZeroNormColumn {
                    index,
                    name: names[index].clone(),
                })
            } else {
                Ok(norm)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut scaled = x.to_owned();
    scaled
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .zip(norms.into_par_iter())
        .for_each(|(mut col, norm)| {
            col /= norm;
        });
    Ok(scaled)
}

/// True when `folder` is a directory we can store into. Logs the skip
/// otherwise; a bad store location is never fatal.
pub(crate) fn store_dir_ok(folder: &Path, reducer: &str) -> bool {
    if folder.is_dir() {
        true
    } else {
        log::warn!(
            "{reducer}: store folder {} is not an existing directory, skipping persistence",
            folder.display()
        );
        false
    }
}
