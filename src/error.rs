use crate::routing::RouteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Failed to load OpenAPI document: {0}")]
    DocumentLoadError(String),

    #[error("Unsupported OpenAPI version: {0}. Only 3.0.x and 3.1.x are supported.")]
    UnsupportedVersion(String),

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Invalid schema at {location}: {message}")]
    InvalidSchema { location: String, message: String },

    #[error("Operation not declared: {0}")]
    UnknownOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GuardError>;
