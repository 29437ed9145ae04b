use super::ModelError;

/// A trait for models that can be used for multi-label Text Classification
pub trait Model {
    /// Returns true once the model has been fitted
    fn is_fitted(&self) -> bool;

    /// Predict a 0/1 value for every label of every text
    fn predict(&self, texts: &[String]) -> Result<Vec<Vec<u8>>, ModelError>;

    /// Fit the model to texts and their label rows
    fn fit(
        &mut self,
        texts: &[String],
        labels: &[Vec<f64>],
        label_names: &[String],
    ) -> Result<(), ModelError>;

    /// The label names, in the column order used by `fit` and `predict`
    fn label_names(&self) -> &[String];
}
