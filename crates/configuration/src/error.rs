use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file, environment or TOML text could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// The settings parsed but break an invariant of the analysis.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
