use crate::storage::StorageError;

/// Text Classification Error
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// The model must be fitted before it can predict or be saved
    #[error("the model has not been fitted")]
    NotFitted,

    /// Fitting requires at least one example
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    /// None of the training texts produced a token
    #[error("empty vocabulary; the training texts contain no tokens")]
    EmptyVocabulary,

    /// Inputs whose lengths or widths disagree
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An invalid training configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A column required for training is missing from the stored table
    #[error("missing column {0:?}")]
    MissingColumn(String),

    /// A label cell that cannot be read as a number
    #[error("label {column:?} in row {row} is not numeric")]
    InvalidLabel {
        /// The label column
        column: String,

        /// Zero-based row index
        row: usize,
    },

    /// The stored table could not be read
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A model artifact that cannot be decoded
    #[error("unable to decode model artifact: {0}")]
    Decode(#[from] bitcode::Error),

    /// A decoded model artifact whose trees or vocabulary are inconsistent
    #[error("corrupt model artifact: {0}")]
    CorruptArtifact(String),

    /// Reading or writing a model artifact or config file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A config file that is not valid JSON
    #[error("unable to parse config: {0}")]
    Json(#[from] serde_json::Error),
}
