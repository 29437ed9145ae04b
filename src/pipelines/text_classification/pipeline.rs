use log::debug;

use super::{
    forest::{ForestParams, RandomForest},
    vectorizer::{CountVectorizer, SparseVector, TfidfTransformer},
    Model, ModelError,
};

/// Text Classification Pipeline: token counts, then TF-IDF weighting, then a random forest
#[derive(Debug, Clone, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct Pipeline {
    /// Text to term counts
    vectorizer: CountVectorizer,

    /// Term counts to TF-IDF weights
    tfidf: TfidfTransformer,

    /// Multi-output classifier
    classifier: RandomForest,

    /// The label columns the classifier was fitted on
    label_names: Vec<String>,
}

impl Pipeline {
    /// Creates an unfitted pipeline
    pub fn new(params: ForestParams) -> Self {
        Self {
            vectorizer: CountVectorizer::new(),
            tfidf: TfidfTransformer::new(),
            classifier: RandomForest::new(params),
            label_names: Vec::new(),
        }
    }

    /// The classifier's hyper-parameters
    pub fn params(&self) -> &ForestParams {
        self.classifier.params()
    }

    /// Check the invariants `predict` relies on, for pipelines that were decoded rather than fitted
    pub fn validate(&self) -> Result<(), ModelError> {
        self.vectorizer.validate(self.tfidf.n_features())?;
        self.classifier.validate()?;

        if self.label_names.len() != self.classifier.n_outputs() {
            return Err(ModelError::CorruptArtifact(format!(
                "{} label names but the classifier has {} outputs",
                self.label_names.len(),
                self.classifier.n_outputs()
            )));
        }

        Ok(())
    }

    /// Run the texts through the vectorizer and the TF-IDF stage
    fn features(&self, texts: &[String]) -> Result<Vec<SparseVector>, ModelError> {
        self.tfidf.transform(self.vectorizer.transform(texts)?)
    }
}

impl Model for Pipeline {
    fn is_fitted(&self) -> bool {
        self.vectorizer.is_fitted() && self.tfidf.is_fitted() && self.classifier.is_fitted()
    }

    fn predict(&self, texts: &[String]) -> Result<Vec<Vec<u8>>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }

        self.classifier.predict(&self.features(texts)?)
    }

    fn fit(
        &mut self,
        texts: &[String],
        labels: &[Vec<f64>],
        label_names: &[String],
    ) -> Result<(), ModelError> {
        if texts.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        if texts.len() != labels.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} texts but {} label rows",
                texts.len(),
                labels.len()
            )));
        }

        if let Some(row) = labels.iter().find(|row| row.len() != label_names.len()) {
            return Err(ModelError::ShapeMismatch(format!(
                "a label row has {} values but there are {} label names",
                row.len(),
                label_names.len()
            )));
        }

        let counts = self.vectorizer.fit_transform(texts)?;
        let n_features = self.vectorizer.vocabulary_size();

        debug!("Vocabulary has {} tokens", n_features);

        self.tfidf.fit(&counts, n_features);
        let features = self.tfidf.transform(counts)?;

        self.classifier.fit(&features, n_features, labels)?;
        self.label_names = label_names.to_vec();

        Ok(())
    }

    fn label_names(&self) -> &[String] {
        &self.label_names
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::pipelines::text_classification::inference::load_model;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn a_new_pipeline_is_unfitted() {
        let pipeline = Pipeline::new(ForestParams::default());

        assert!(!pipeline.is_fitted());
        assert!(matches!(
            pipeline.predict(&strings(&["water"])),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn fits_and_predicts_every_label() {
        let distinct = strings(&[
            "we need water",
            "clean water needed",
            "the road is blocked",
            "blocked road near the bridge",
        ]);
        let targets = [
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ];

        // Repeat the examples so every bootstrap sample sees each of them
        let texts: Vec<String> = distinct.iter().cycle().take(20).cloned().collect();
        let labels: Vec<Vec<f64>> = targets.iter().cycle().take(20).cloned().collect();
        let names = strings(&["water", "infrastructure"]);

        let mut pipeline = Pipeline::new(ForestParams::new().with_n_estimators(10).with_seed(Some(3)));
        pipeline.fit(&texts, &labels, &names).unwrap();

        assert!(pipeline.is_fitted());
        assert_eq!(pipeline.label_names(), names.as_slice());
        assert_eq!(
            pipeline.predict(&distinct).unwrap(),
            vec![vec![1, 0], vec![1, 0], vec![0, 1], vec![0, 1]]
        );
    }

    #[test]
    fn a_decoded_pipeline_with_extra_label_names_fails_to_load() {
        let texts: Vec<String> = strings(&["need water", "road blocked"])
            .into_iter()
            .cycle()
            .take(10)
            .collect();
        let labels: Vec<Vec<f64>> = [vec![1.0], vec![0.0]].into_iter().cycle().take(10).collect();

        let mut pipeline = Pipeline::new(ForestParams::new().with_n_estimators(3).with_seed(Some(1)));
        pipeline.fit(&texts, &labels, &strings(&["water"])).unwrap();
        assert!(pipeline.validate().is_ok());

        pipeline.label_names.push("fire".to_string());

        let dir = tempdir().unwrap();
        let path = dir.path().join("classifier.bin");
        fs::write(&path, bitcode::encode(&pipeline)).unwrap();

        assert!(matches!(
            load_model(&path),
            Err(ModelError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn a_vocabulary_without_weights_is_corrupt() {
        let mut pipeline = Pipeline::new(ForestParams::default());
        pipeline.vectorizer.fit(&strings(&["water"])).unwrap();

        assert!(matches!(
            pipeline.validate(),
            Err(ModelError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn rejects_labels_that_do_not_match_the_names() {
        let mut pipeline = Pipeline::new(ForestParams::default());

        let result = pipeline.fit(
            &strings(&["water"]),
            &[vec![1.0, 0.0]],
            &strings(&["water"]),
        );

        assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));
    }
}
