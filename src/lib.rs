pub mod error;
pub mod reduce;
pub mod similarity;
pub mod table;

pub use error::{DataError, FitError, ReduceError, TableIoError, TransformError};
pub use reduce::cosine::CosineReducer;
pub use reduce::pca::{PcaModel, PcaReducer, TargetPolicy};
pub use reduce::Reducer;
pub use similarity::{AbsoluteCosine, SimilarityMeasure};
pub use table::FeatureTable;
