//! Typed failures for the reduction pipeline.
//!
//! Every fallible operation returns one of these; nothing is caught and
//! printed. Persistence problems are deliberately absent: a failed store is
//! logged as a warning and the computed table is still returned.

use thiserror::Error;

/// Degenerate input data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("matrix is empty ({rows} rows x {cols} columns)")]
    EmptyMatrix { rows: usize, cols: usize },
    #[error("column {index} ({name:?}) has zero L2 norm")]
    ZeroNormColumn { index: usize, name: String },
    #[error("{names} feature names for {columns} matrix columns")]
    NameCountMismatch { names: usize, columns: usize },
    #[error("duplicate feature name {name:?}")]
    DuplicateName { name: String },
}

/// The projection could not be fit.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("cannot fit a projection with zero components")]
    NonPositiveComponents,
    #[error("{requested} components requested but the input supports at most {feasible}")]
    RankExceeded { requested: usize, feasible: usize },
    #[error("decomposition produced no right singular vectors")]
    SvdFailed,
}

/// A fitted model was applied to data it cannot project.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transform called before fit")]
    Unfitted,
    #[error("model was fit on {expected} features but input has {got}")]
    WidthMismatch { expected: usize, got: usize },
}

/// Union error returned by the reducer entry points.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Failures while loading or saving a [`crate::table::FeatureTable`].
#[derive(Debug, Error)]
pub enum TableIoError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("row {row} has {got} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("could not parse {value:?} as a number (row {row}, column {column})")]
    Parse {
        value: String,
        row: usize,
        column: usize,
    },
    #[error(transparent)]
    Data(#[from] DataError),
}
