//! Principal component reduction with a fit/transform lifecycle.
//!
//! [`PcaReducer`] scales every column of the input table to unit L2 norm,
//! centers the result, and learns an orthonormal projection onto the leading
//! right singular vectors. The fitted state lives in a [`PcaModel`] that the
//! reducer retains for later [`PcaReducer::transform`] calls on fresh data.

use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use nshare::{IntoNalgebra, IntoNdarray2};

use crate::error::{DataError, FitError, ReduceError, TableIoError, TransformError};
use crate::reduce::{store_dir_ok, unit_scale_columns, Reducer};
use crate::table::FeatureTable;

/// How the requested component count is reconciled with the input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPolicy {
    /// Legacy behaviour: any input with more feature columns than the target
    /// re-targets the fit to the smaller matrix dimension. A target of 0
    /// therefore always means "as many components as the input supports".
    #[default]
    ClampWide,
    /// Shrink the target only when the input cannot support it, i.e. when it
    /// is 0 or exceeds `min(n_samples, n_features)`.
    ClampInfeasible,
}

/// Fitted projection state: loadings over the original feature names plus the
/// column means of the unit-scaled training matrix.
#[derive(Debug, Clone)]
pub struct PcaModel {
    components: Array2<f64>,
    mean: Array1<f64>,
    input_names: Vec<String>,
}

impl PcaModel {
    /// Loading matrix, shape `(n_components, n_input_features)`. Rows are
    /// orthonormal.
    pub fn components(&self) -> ArrayView2<'_, f64> {
        self.components.view()
    }

    /// Original feature names the model was fit on, in column order.
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_inputs(&self) -> usize {
        self.components.ncols()
    }

    fn project(&self, scaled: &Array2<f64>) -> Array2<f64> {
        (scaled - &self.mean).dot(&self.components.t())
    }
}

pub struct PcaReducer {
    n_components: usize,
    policy: TargetPolicy,
    model: Option<PcaModel>,
}

impl PcaReducer {
    /// Creates a reducer targeting `n_components` output dimensions. A target
    /// of 0 leaves the count to be negotiated at fit time.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            policy: TargetPolicy::default(),
            model: None,
        }
    }

    pub fn with_target_policy(mut self, policy: TargetPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Requested output dimensionality; after a fit this reflects the actual
    /// (possibly corrected) component count.
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Changes the target count and discards any fitted model. Count and
    /// model stay in lock-step: neither can change without the other.
    pub fn set_n_components(&mut self, n_components: usize) {
        self.n_components = n_components;
        self.model = None;
    }

    /// Fitted state, if any.
    pub fn model(&self) -> Option<&PcaModel> {
        self.model.as_ref()
    }

    /// Synthetic name of output component `k` (1-based).
    pub fn feature_name(&self, k: usize) -> String {
        format!("PCA_feature_{k}")
    }

    fn output_names(&self, count: usize) -> Vec<String> {
        (1..=count).map(|k| self.feature_name(k)).collect()
    }

    /// Fits the projection on `table` and returns the reduced copy.
    ///
    /// Columns are unit-scaled, the target count is reconciled per the
    /// configured [`TargetPolicy`] (logged as a warning when it changes), and
    /// the model is fit on the centered result. Output columns are named
    /// `PCA_feature_1..=N`. When `store_folder` is an existing directory the
    /// reduced table is written to `pca_train_feature.csv` and the loading
    /// table (component rows x original-feature columns) to `pca_sort.csv`;
    /// store problems are logged and never fail the call.
    pub fn fit_and_reduce(
        &mut self,
        table: &FeatureTable,
        store_folder: Option<&Path>,
    ) -> Result<FeatureTable, ReduceError> {
        let scaled = unit_scale_columns(table.data(), table.feature_names())?;
        let (n_samples, n_features) = scaled.dim();
        let feasible = n_samples.min(n_features);

        let retarget = match self.policy {
            TargetPolicy::ClampWide => n_features > self.n_components,
            TargetPolicy::ClampInfeasible => {
                self.n_components == 0 || self.n_components > feasible
            }
        };
        if retarget && self.n_components != feasible {
            log::warn!(
                "PCA: retargeting from {} to {} components for a {} x {} input",
                self.n_components,
                feasible,
                n_samples,
                n_features
            );
            self.set_n_components(feasible);
        }

        let model = Self::fit_model(self.n_components, &scaled, table.feature_names())?;
        log::debug!(
            "PCA: fit {} components over {} features",
            model.n_components(),
            model.n_inputs()
        );

        let reduced = model.project(&scaled);
        let out = FeatureTable::new(reduced, self.output_names(model.n_components()))?;
        if let Some(folder) = store_folder {
            self.store(folder, &out, &model);
        }
        self.model = Some(model);
        Ok(out)
    }

    fn fit_model(
        n_components: usize,
        scaled: &Array2<f64>,
        input_names: &[String],
    ) -> Result<PcaModel, ReduceError> {
        let (n_samples, n_features) = scaled.dim();
        if n_components == 0 {
            return Err(FitError::NonPositiveComponents.into());
        }
        let feasible = n_samples.min(n_features);
        if n_components > feasible {
            return Err(FitError::RankExceeded {
                requested: n_components,
                feasible,
            }
            .into());
        }

        let mean = scaled.mean_axis(Axis(0)).ok_or(DataError::EmptyMatrix {
            rows: n_samples,
            cols: n_features,
        })?;
        let centered = scaled - &mean;
        let svd = centered.into_nalgebra().svd(false, true);
        let v_t = svd.v_t.ok_or(FitError::SvdFailed)?.into_ndarray2();
        let components = v_t.slice(s![..n_components, ..]).to_owned();

        Ok(PcaModel {
            components,
            mean,
            input_names: input_names.to_vec(),
        })
    }

    /// Applies the fitted projection to fresh data.
    ///
    /// The input is unit-scaled with the same per-column policy as the fit,
    /// so transforming the training table reproduces the [`Self::fit_and_reduce`]
    /// output up to floating tolerance. The input width must match the width
    /// the model was fit on. When `store_path` is given the result is saved
    /// there, best effort.
    pub fn transform(
        &self,
        table: &FeatureTable,
        store_path: Option<&Path>,
    ) -> Result<FeatureTable, ReduceError> {
        let model = self.model.as_ref().ok_or(TransformError::Unfitted)?;
        if table.n_features() != model.n_inputs() {
            return Err(TransformError::WidthMismatch {
                expected: model.n_inputs(),
                got: table.n_features(),
            }
            .into());
        }

        let scaled = unit_scale_columns(table.data(), table.feature_names())?;
        let reduced = model.project(&scaled);
        let out = FeatureTable::new(reduced, self.output_names(model.n_components()))?;
        if let Some(path) = store_path {
            if let Err(e) = out.save(path) {
                log::warn!(
                    "PCA: could not store transformed table to {}: {e}",
                    path.display()
                );
            }
        }
        Ok(out)
    }

    fn store(&self, folder: &Path, reduced: &FeatureTable, model: &PcaModel) {
        if !store_dir_ok(folder, self.name()) {
            return;
        }
        let table_path = folder.join("pca_train_feature.csv");
        if let Err(e) = reduced.save(&table_path) {
            log::warn!("PCA: could not store reduced table to {}: {e}", table_path.display());
        }
        let loadings_path = folder.join("pca_sort.csv");
        if let Err(e) = Self::store_loadings(&loadings_path, reduced.feature_names(), model) {
            log::warn!(
                "PCA: could not store loading table to {}: {e}",
                loadings_path.display()
            );
        }
    }

    fn store_loadings(
        path: &Path,
        component_names: &[String],
        model: &PcaModel,
    ) -> Result<(), TableIoError> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = Vec::with_capacity(model.n_inputs() + 1);
        header.push(String::new());
        header.extend(model.input_names().iter().cloned());
        writer.write_record(&header)?;
        for (name, row) in component_names.iter().zip(model.components().rows()) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(name.clone());
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Reducer for PcaReducer {
    fn name(&self) -> &'static str {
        "PCA"
    }

    fn reduce(
        &mut self,
        table: &FeatureTable,
        store_folder: Option<&Path>,
    ) -> Result<FeatureTable, ReduceError> {
        self.fit_and_reduce(table, store_folder)
    }
}
