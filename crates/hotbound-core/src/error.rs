use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

/// Terminal failure of a single backend request. Exactly one of these (or a
/// success value) is produced per API client call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty response body")]
    EmptyBody,

    #[error("invalid response format: {0}")]
    InvalidResponseFormat(String),

    #[error("failed to encode request: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a call session is already active")]
    AlreadyActive,

    #[error("call session adapter is not initialized")]
    AdapterUninitialized,

    #[error("no call session is active")]
    NotActive,

    #[error("voice SDK error: {0}")]
    Sdk(String),
}
