//! Parse errors for the string forms of shared enums.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown verification kind: {0}")]
    UnknownKind(String),

    #[error("unknown polling algorithm: {0}")]
    UnknownAlgorithm(String),
}
