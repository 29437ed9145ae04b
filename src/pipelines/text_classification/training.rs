use log::info;

use super::{config::Training, search::GridSearch, Model, ModelError, Pipeline};

/// An unfitted estimator: either the base pipeline or a search over its hyper-parameters
#[derive(Debug, Clone)]
pub enum Estimator {
    /// Fit the base pipeline as configured
    Pipeline(Pipeline),

    /// Cross-validate every grid point and refit the best one
    Search(GridSearch),
}

impl Estimator {
    /// The fitted pipeline, either directly or the search's refit winner
    pub fn into_pipeline(self) -> Result<Pipeline, ModelError> {
        match self {
            Estimator::Pipeline(pipeline) if pipeline.is_fitted() => Ok(pipeline),
            Estimator::Pipeline(_) => Err(ModelError::NotFitted),
            Estimator::Search(search) => search.into_best_pipeline(),
        }
    }

    fn model(&self) -> &dyn Model {
        match self {
            Estimator::Pipeline(pipeline) => pipeline,
            Estimator::Search(search) => search,
        }
    }

    fn model_mut(&mut self) -> &mut dyn Model {
        match self {
            Estimator::Pipeline(pipeline) => pipeline,
            Estimator::Search(search) => search,
        }
    }
}

impl Model for Estimator {
    fn is_fitted(&self) -> bool {
        self.model().is_fitted()
    }

    fn predict(&self, texts: &[String]) -> Result<Vec<Vec<u8>>, ModelError> {
        self.model().predict(texts)
    }

    fn fit(
        &mut self,
        texts: &[String],
        labels: &[Vec<f64>],
        label_names: &[String],
    ) -> Result<(), ModelError> {
        self.model_mut().fit(texts, labels, label_names)
    }

    fn label_names(&self) -> &[String] {
        self.model().label_names()
    }
}

/// Build the untrained estimator described by the config
pub fn build_model(config: &Training) -> Estimator {
    let params = config.forest_params();

    if config.search_enabled {
        info!(
            "Searching {} parameter combinations with {}-fold cross-validation",
            config.grid.candidates(&params).len(),
            config.cv_folds
        );

        Estimator::Search(GridSearch::new(params, config.grid.clone(), config.cv_folds))
    } else {
        Estimator::Pipeline(Pipeline::new(params))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::pipelines::text_classification::search::ParamGrid;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn the_default_model_is_an_untrained_pipeline() {
        let estimator = build_model(&Training::default());

        assert!(matches!(&estimator, Estimator::Pipeline(_)));
        assert!(!estimator.is_fitted());
        assert!(matches!(estimator.into_pipeline(), Err(ModelError::NotFitted)));
    }

    #[test]
    fn enabling_search_builds_a_grid_search() {
        let estimator = build_model(&Training::new().with_search_enabled(true));

        assert!(matches!(estimator, Estimator::Search(_)));
    }

    #[test]
    fn a_search_refits_the_best_candidate() {
        let distinct = strings(&["need water", "water please", "road blocked", "blocked bridge"]);
        let targets = [vec![1.0], vec![1.0], vec![0.0], vec![0.0]];

        let texts: Vec<String> = distinct.iter().cycle().take(24).cloned().collect();
        let labels: Vec<Vec<f64>> = targets.iter().cycle().take(24).cloned().collect();
        let names = strings(&["water"]);

        let config = Training::new()
            .with_seed(Some(11))
            .with_search_enabled(true)
            .with_cv_folds(3)
            .with_grid(ParamGrid {
                n_estimators: vec![5, 10],
                min_samples_split: vec![2],
            });

        let mut estimator = build_model(&config);
        estimator.fit(&texts, &labels, &names).unwrap();

        assert!(estimator.is_fitted());
        assert_eq!(estimator.label_names(), names.as_slice());

        let pipeline = estimator.into_pipeline().unwrap();
        assert_eq!(
            pipeline.predict(&distinct).unwrap(),
            vec![vec![1], vec![1], vec![0], vec![0]]
        );
    }
}
