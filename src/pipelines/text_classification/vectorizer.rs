use std::collections::{BTreeMap, BTreeSet};

use super::{tokenizer::tokenize, ModelError};

/// A sparse row of feature values, sorted by feature index
#[derive(Debug, Clone, Default, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct SparseVector {
    /// Feature indices with a non-zero value, ascending
    indices: Vec<u32>,

    /// The value of each listed feature
    values: Vec<f64>,
}

impl SparseVector {
    /// Build a vector from (index, value) pairs in ascending index order
    pub fn from_sorted(entries: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let (indices, values) = entries.into_iter().unzip();

        Self { indices, values }
    }

    /// The value of a feature, zero if absent
    pub fn get(&self, index: u32) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|position| self.values[position])
            .unwrap_or(0.0)
    }

    /// Indices of the non-zero features
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Iterate over (index, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

/// Converts texts into sparse term counts over a vocabulary learned from the training texts
#[derive(Debug, Clone, Default, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct CountVectorizer {
    /// Token to feature index; tokens are numbered in sorted order
    vocabulary: Option<BTreeMap<String, u32>>,
}

impl CountVectorizer {
    /// Creates an unfitted vectorizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a vocabulary has been learned
    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// The number of distinct tokens in the vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, BTreeMap::len)
    }

    /// The feature index of a token, if it is in the vocabulary
    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.vocabulary.as_ref()?.get(token).copied()
    }

    /// Check that every feature index is below `n_features`
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        let vocabulary = match &self.vocabulary {
            Some(vocabulary) => vocabulary,
            None => return Ok(()),
        };

        match vocabulary
            .iter()
            .find(|(_, index)| **index as usize >= n_features)
        {
            Some((token, index)) => Err(ModelError::CorruptArtifact(format!(
                "token {:?} has feature index {} but there are {} features",
                token, index, n_features
            ))),
            None => Ok(()),
        }
    }

    /// Learn the vocabulary of the training texts
    pub fn fit(&mut self, texts: &[String]) -> Result<(), ModelError> {
        let tokens: BTreeSet<String> = texts.iter().flat_map(|text| tokenize(text)).collect();

        if tokens.is_empty() {
            return Err(ModelError::EmptyVocabulary);
        }

        let vocabulary = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| (token, index as u32))
            .collect();

        self.vocabulary = Some(vocabulary);

        Ok(())
    }

    /// Count vocabulary tokens in each text; unknown tokens are ignored
    pub fn transform(&self, texts: &[String]) -> Result<Vec<SparseVector>, ModelError> {
        let vocabulary = self.vocabulary.as_ref().ok_or(ModelError::NotFitted)?;

        Ok(texts
            .iter()
            .map(|text| {
                let mut counts: BTreeMap<u32, f64> = BTreeMap::new();

                for token in tokenize(text) {
                    if let Some(index) = vocabulary.get(&token) {
                        *counts.entry(*index).or_insert(0.0) += 1.0;
                    }
                }

                SparseVector::from_sorted(counts)
            })
            .collect())
    }

    /// Learn the vocabulary, then count tokens in the same texts
    pub fn fit_transform(&mut self, texts: &[String]) -> Result<Vec<SparseVector>, ModelError> {
        self.fit(texts)?;
        self.transform(texts)
    }
}

/// Reweights term counts by smoothed inverse document frequency and L2-normalizes each row
#[derive(Debug, Clone, Default, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct TfidfTransformer {
    /// `ln((1 + n) / (1 + df)) + 1` for each feature
    idf: Option<Vec<f64>>,
}

impl TfidfTransformer {
    /// Creates an unfitted transformer
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once document frequencies have been learned
    pub fn is_fitted(&self) -> bool {
        self.idf.is_some()
    }

    /// The number of weighted features, zero until fitted
    pub fn n_features(&self) -> usize {
        self.idf.as_ref().map_or(0, Vec::len)
    }

    /// Learn inverse document frequencies from term counts
    pub fn fit(&mut self, counts: &[SparseVector], n_features: usize) {
        let mut document_frequency = vec![0usize; n_features];

        for row in counts {
            for &index in row.indices() {
                document_frequency[index as usize] += 1;
            }
        }

        let n_documents = counts.len() as f64;

        let idf = document_frequency
            .into_iter()
            .map(|df| ((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        self.idf = Some(idf);
    }

    /// Apply the learned weights to term counts
    pub fn transform(&self, counts: Vec<SparseVector>) -> Result<Vec<SparseVector>, ModelError> {
        let idf = self.idf.as_ref().ok_or(ModelError::NotFitted)?;

        Ok(counts
            .into_iter()
            .map(|row| {
                let weighted: Vec<(u32, f64)> = row
                    .iter()
                    .map(|(index, count)| (index, count * idf[index as usize]))
                    .collect();

                let norm = weighted
                    .iter()
                    .map(|(_, value)| value * value)
                    .sum::<f64>()
                    .sqrt();

                if norm > 0.0 {
                    SparseVector::from_sorted(
                        weighted
                            .into_iter()
                            .map(|(index, value)| (index, value / norm)),
                    )
                } else {
                    SparseVector::from_sorted(weighted)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn vocabulary_is_sorted_and_lowercase() {
        let mut vectorizer = CountVectorizer::new();
        vectorizer
            .fit(&texts(&["Water please", "water and FOOD"]))
            .unwrap();

        assert_eq!(vectorizer.vocabulary_size(), 4);
        assert_eq!(vectorizer.index_of("and"), Some(0));
        assert_eq!(vectorizer.index_of("food"), Some(1));
        assert_eq!(vectorizer.index_of("please"), Some(2));
        assert_eq!(vectorizer.index_of("water"), Some(3));
    }

    #[test]
    fn counts_ignore_unknown_tokens() {
        let mut vectorizer = CountVectorizer::new();
        vectorizer.fit(&texts(&["water water food"])).unwrap();

        let counts = vectorizer.transform(&texts(&["water shelter water"])).unwrap();

        assert_eq!(counts[0], SparseVector::from_sorted([(1, 2.0)]));
    }

    #[test]
    fn fitting_without_tokens_fails() {
        let mut vectorizer = CountVectorizer::new();

        assert!(matches!(
            vectorizer.fit(&texts(&["", "  "])),
            Err(ModelError::EmptyVocabulary)
        ));
    }

    #[test]
    fn indices_past_the_weights_are_invalid() {
        let mut vectorizer = CountVectorizer::new();
        vectorizer.fit(&texts(&["water food shelter"])).unwrap();

        assert!(vectorizer.validate(3).is_ok());
        assert!(matches!(
            vectorizer.validate(2),
            Err(ModelError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn transform_requires_fit() {
        assert!(matches!(
            CountVectorizer::new().transform(&texts(&["water"])),
            Err(ModelError::NotFitted)
        ));
        assert!(matches!(
            TfidfTransformer::new().transform(Vec::new()),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn tfidf_rows_have_unit_length() {
        let mut vectorizer = CountVectorizer::new();
        let counts = vectorizer
            .fit_transform(&texts(&["water food", "water", "food food shelter"]))
            .unwrap();

        let mut tfidf = TfidfTransformer::new();
        tfidf.fit(&counts, vectorizer.vocabulary_size());
        let weighted = tfidf.transform(counts).unwrap();

        for row in &weighted {
            let norm: f64 = row.iter().map(|(_, value)| value * value).sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rare_terms_outweigh_common_ones() {
        let mut vectorizer = CountVectorizer::new();
        let counts = vectorizer
            .fit_transform(&texts(&["water shelter", "water", "water"]))
            .unwrap();

        let mut tfidf = TfidfTransformer::new();
        tfidf.fit(&counts, vectorizer.vocabulary_size());
        let weighted = tfidf.transform(counts).unwrap();

        let shelter = vectorizer.index_of("shelter").unwrap();
        let water = vectorizer.index_of("water").unwrap();
        assert!(weighted[0].get(shelter) > weighted[0].get(water));
    }
}
