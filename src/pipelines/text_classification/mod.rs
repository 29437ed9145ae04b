/// Text Classification errors
pub mod error;

/// Common model trait for text classification
pub mod model;

/// Lemmatizer lexicon and rules
pub mod lemmatizer;

/// Word tokenization
pub mod tokenizer;

/// Term counts and TF-IDF weighting
pub mod vectorizer;

/// Multi-output random forest
pub mod forest;

/// The vectorizer, TF-IDF and forest combined
pub mod pipeline;

/// Hyper-parameter grid search
pub mod search;

/// Training configuration
pub mod config;

/// Loading and splitting the training data
pub mod data;

/// Building the estimator
pub mod training;

/// Classification reports
pub mod evaluation;

/// Model artifacts
pub mod inference;

pub use config::Training as TrainingConfig;
pub use data::TrainingData;
pub use error::ModelError;
pub use evaluation::{evaluate_model, Report};
pub use inference::{load_model, save_model};
pub use lemmatizer::init_lexicon;
pub use model::Model;
pub use pipeline::Pipeline;
pub use tokenizer::tokenize;
pub use training::{build_model, Estimator};
