//! Error types for Chirpcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChirpcastError>;

#[derive(Error, Debug)]
pub enum ChirpcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ChirpcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ChirpcastError::InvalidInput(_) => 3,
            ChirpcastError::Platform(PlatformError::Authentication(_)) => 2,
            ChirpcastError::Platform(_) => 1,
            ChirpcastError::Generation(_) => 1,
            ChirpcastError::Config(_) => 1,
        }
    }

    /// Short name of the error kind, used when logging diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ChirpcastError::Config(_) => "ConfigError",
            ChirpcastError::Generation(e) => e.kind(),
            ChirpcastError::Platform(e) => e.kind(),
            ChirpcastError::InvalidInput(_) => "InvalidInput",
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    /// The model output did not match the `{ "text": <non-empty string> }` contract
    #[error("Generated content failed validation: {0}")]
    Validation(String),

    #[error("Model provider error: {0}")]
    Provider(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Validation(_) => "GenerationValidationError",
            GenerationError::Provider(_) => "ProviderError",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Error payload returned by the platform in an otherwise delivered response
    #[error("Twitter API error ({code}): {message}")]
    Api { code: i64, message: String },

    /// A response with no error payload but without the expected result record
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Note Tweet failed: {0}")]
    LongForm(String),

    /// Unexpected step in the login flow or an unusable response shape
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl PlatformError {
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformError::Authentication(_) => "AuthenticationError",
            PlatformError::Api { .. } => "PlatformAPIError",
            PlatformError::MalformedResponse(_) => "MalformedResponseError",
            PlatformError::Network(_) => "NetworkError",
            PlatformError::LongForm(_) => "LongFormError",
            PlatformError::Protocol(_) => "ProtocolError",
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            PlatformError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            PlatformError::Network(format!("Connection error: {}", error))
        } else if error.is_decode() {
            PlatformError::Protocol(format!("Failed to decode response: {}", error))
        } else {
            PlatformError::Network(format!("HTTP error: {}", error))
        }
    }
}
