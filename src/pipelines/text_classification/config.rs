use std::{fs, path::Path};

use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{
    forest::{ForestParams, DEFAULT_MIN_SAMPLES_SPLIT, DEFAULT_N_ESTIMATORS},
    search::ParamGrid,
    ModelError,
};

/// The default fraction of rows held out for evaluation
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// The default number of cross-validation folds used by the grid search
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Define configuration struct for the experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
#[serde(default)]
pub struct Training {
    /// Fraction of rows held out for evaluation
    #[new(value = "DEFAULT_TEST_SIZE")]
    pub test_size: f64,

    /// Seed for the train/test split and the forest; random when unset
    #[new(default)]
    pub seed: Option<u64>,

    /// Number of trees
    #[new(value = "DEFAULT_N_ESTIMATORS")]
    pub n_estimators: u32,

    /// Minimum number of samples required to split a node
    #[new(value = "DEFAULT_MIN_SAMPLES_SPLIT")]
    pub min_samples_split: u32,

    /// Run the hyper-parameter search instead of fitting the base pipeline
    #[new(default)]
    pub search_enabled: bool,

    /// The hyper-parameter search space
    #[new(default)]
    pub grid: ParamGrid,

    /// Number of cross-validation folds for the search
    #[new(value = "DEFAULT_CV_FOLDS")]
    pub cv_folds: usize,
}

impl Default for Training {
    fn default() -> Self {
        Self::new()
    }
}

impl Training {
    /// Load a JSON config; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path)?;

        Ok(serde_json::from_str(&raw)?)
    }

    /// Save the config as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;

        Ok(())
    }

    /// Use a fixed seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Hold out a different fraction of rows
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Use a different number of trees
    pub fn with_n_estimators(mut self, n_estimators: u32) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Enable or disable the hyper-parameter search
    pub fn with_search_enabled(mut self, search_enabled: bool) -> Self {
        self.search_enabled = search_enabled;
        self
    }

    /// Use a different search space
    pub fn with_grid(mut self, grid: ParamGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Use a different number of cross-validation folds
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// The forest parameters of the base pipeline
    pub fn forest_params(&self) -> ForestParams {
        ForestParams::new()
            .with_n_estimators(self.n_estimators)
            .with_min_samples_split(self.min_samples_split)
            .with_seed(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn defaults_fit_the_base_pipeline_without_search() {
        let config = Training::default();

        assert!(!config.search_enabled);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.forest_params(), ForestParams::default());
    }

    #[test]
    fn partial_files_take_defaults() {
        let config: Training =
            serde_json::from_str(r#"{ "seed": 42, "search_enabled": true }"#).unwrap();

        assert_eq!(
            config,
            Training::new().with_seed(Some(42)).with_search_enabled(true)
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Training::new().with_n_estimators(10).with_cv_folds(3);

        config.save(&path).unwrap();

        assert_eq!(Training::load(&path).unwrap(), config);
    }
}
