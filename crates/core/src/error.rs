use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Environment reference error: {0}")]
    Env(String),

    #[error("Invalid config:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

impl ConfigError {
    /// Validation failures carried by this error, empty for IO/parse errors.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ConfigError::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
