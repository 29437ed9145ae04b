use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{evaluation::exact_match_accuracy, forest::ForestParams, Model, ModelError, Pipeline};

/// The hyper-parameter values tried by the grid search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    /// Candidate tree counts
    pub n_estimators: Vec<u32>,

    /// Candidate minimum split sizes
    pub min_samples_split: Vec<u32>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 150],
            min_samples_split: vec![5, 10, 15],
        }
    }
}

impl ParamGrid {
    /// Every combination of the grid values applied to the base parameters
    pub fn candidates(&self, base: &ForestParams) -> Vec<ForestParams> {
        self.min_samples_split
            .iter()
            .flat_map(|&min_samples_split| {
                self.n_estimators.iter().map(move |&n_estimators| {
                    base.clone()
                        .with_n_estimators(n_estimators)
                        .with_min_samples_split(min_samples_split)
                })
            })
            .collect()
    }
}

/// Contiguous, unshuffled k-fold partitions of `0..n`; the first `n % k` folds get one extra row
pub fn k_fold(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for fold in 0..k {
        let size = n / k + usize::from(fold < n % k);
        let test: Vec<usize> = (start..start + size).collect();
        let train: Vec<usize> = (0..start).chain(start + size..n).collect();

        folds.push((train, test));
        start += size;
    }

    folds
}

/// Exhaustive search over a parameter grid, scored by cross-validated exact-match accuracy.
///
/// The best candidate is refit on the full training set.
#[derive(Debug, Clone)]
pub struct GridSearch {
    base: ForestParams,
    grid: ParamGrid,
    folds: usize,
    best: Option<(ForestParams, f64)>,
    pipeline: Option<Pipeline>,
}

impl GridSearch {
    /// Creates an unfitted search
    pub fn new(base: ForestParams, grid: ParamGrid, folds: usize) -> Self {
        Self {
            base,
            grid,
            folds,
            best: None,
            pipeline: None,
        }
    }

    /// The winning parameters and their mean cross-validation score, once fitted
    pub fn best(&self) -> Option<&(ForestParams, f64)> {
        self.best.as_ref()
    }

    /// The best pipeline refit on the full training set
    pub fn into_best_pipeline(self) -> Result<Pipeline, ModelError> {
        self.pipeline.ok_or(ModelError::NotFitted)
    }

    fn cross_validate(
        &self,
        params: &ForestParams,
        texts: &[String],
        labels: &[Vec<f64>],
        label_names: &[String],
    ) -> Result<f64, ModelError> {
        let mut total = 0.0;

        for (train, test) in k_fold(texts.len(), self.folds) {
            let pick = |indices: &[usize]| -> (Vec<String>, Vec<Vec<f64>>) {
                indices
                    .iter()
                    .map(|&index| (texts[index].clone(), labels[index].clone()))
                    .unzip()
            };

            let (train_texts, train_labels) = pick(&train);
            let (test_texts, test_labels) = pick(&test);

            let mut pipeline = Pipeline::new(params.clone());
            pipeline.fit(&train_texts, &train_labels, label_names)?;

            let predicted = pipeline.predict(&test_texts)?;
            total += exact_match_accuracy(&test_labels, &predicted);
        }

        Ok(total / self.folds as f64)
    }
}

impl Model for GridSearch {
    fn is_fitted(&self) -> bool {
        self.pipeline.is_some()
    }

    fn predict(&self, texts: &[String]) -> Result<Vec<Vec<u8>>, ModelError> {
        self.pipeline
            .as_ref()
            .ok_or(ModelError::NotFitted)?
            .predict(texts)
    }

    fn fit(
        &mut self,
        texts: &[String],
        labels: &[Vec<f64>],
        label_names: &[String],
    ) -> Result<(), ModelError> {
        if self.folds < 2 || texts.len() < self.folds {
            return Err(ModelError::Config(format!(
                "{}-fold cross-validation needs at least 2 folds and one row per fold, got {} rows",
                self.folds,
                texts.len()
            )));
        }

        let candidates = self.grid.candidates(&self.base);
        if candidates.is_empty() {
            return Err(ModelError::Config("the parameter grid is empty".to_string()));
        }

        let mut best: Option<(ForestParams, f64)> = None;

        for params in candidates {
            let score = self.cross_validate(&params, texts, labels, label_names)?;

            debug!(
                "n_estimators={} min_samples_split={}: {:.4}",
                params.n_estimators, params.min_samples_split, score
            );

            if best.as_ref().map_or(true, |(_, current)| score > *current) {
                best = Some((params, score));
            }
        }

        if let Some((params, score)) = &best {
            info!(
                "Best parameters: n_estimators={} min_samples_split={} (score {:.4})",
                params.n_estimators, params.min_samples_split, score
            );

            let mut pipeline = Pipeline::new(params.clone());
            pipeline.fit(texts, labels, label_names)?;
            self.pipeline = Some(pipeline);
        }

        self.best = best;

        Ok(())
    }

    fn label_names(&self) -> &[String] {
        match &self.pipeline {
            Some(pipeline) => pipeline.label_names(),
            None => &[],
        }
    }
}
