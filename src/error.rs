//! Defines the errors raised while building, training and running an autoencoder.

use std::io;

use thiserror::Error;

/// A result whose error is an autoencoder [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// An error in the construction-time configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Neither an explicit encoder/decoder pair nor `nInputs`/`nHidden` were given.
    #[error("insufficient parameters to build an autoencoder")]
    InsufficientParameters,
    /// An activation name that is not in the activation library.
    #[error("unknown activation function `{0}`")]
    UnknownActivation(String),
    /// An optimization method name that is not in the optimizer library.
    #[error("unknown optimization method `{0}`")]
    UnknownMethod(String),
    /// A layer was declared with zero outputs.
    #[error("layer {index} has an output size of zero")]
    EmptyLayer {
        /// Position of the offending layer within its stack.
        index: usize,
    },
}

/// An error type for all operations on an autoencoder.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration could not be turned into a model.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// `encode`, `decode` or `predict` was called before `fit`.
    #[error("scaler not fitted")]
    NotFitted,
    /// An operation that needs at least one row got none.
    #[error("dataset is empty")]
    EmptyDataset,
    /// A row does not have the width the operation expects.
    #[error("row {row} has {actual} features, expected {expected}")]
    ShapeMismatch {
        /// Index of the offending row.
        row: usize,
        /// The expected row width.
        expected: usize,
        /// The width that was found.
        actual: usize,
    },
    /// Reading a dataset from disk failed.
    #[error("failed to read dataset: {0}")]
    Io(#[from] io::Error),
    /// A dataset field is not a number.
    #[error("line {line}: cannot parse `{field}` as a number")]
    Parse {
        /// One-based line number within the source.
        line: usize,
        /// The offending field.
        field: String,
    },
}

impl Error {
    /// Returns true if the error comes from an invalid configuration.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
