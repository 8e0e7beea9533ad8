use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to perform the HTTP request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("The provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("The provider reported an error for '{symbol}': {code}: {description}")]
    Provider {
        symbol: String,
        code: String,
        description: String,
    },

    #[error("No price data found for symbol '{0}'")]
    NotFound(String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl From<core_types::CoreError> for ApiError {
    fn from(error: core_types::CoreError) -> Self {
        ApiError::InvalidData(error.to_string())
    }
}
