use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YardError {
    #[error("Configuration file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Mount transport error (status {code})")]
    MountTransport { code: i32 },

    #[error("Endpoint not found: {name}")]
    EndpointNotFound { name: String },

    #[error("'{name}' cannot be used as an endpoint name; it must be a plain file name")]
    InvalidName { name: String },

    #[error("An endpoint named '{name}' already exists")]
    DuplicateEndpoint { name: String },

    #[error("Platform not supported: {platform}")]
    PlatformNotSupported { platform: String },

    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("Mount service is no longer running")]
    ServiceStopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, YardError>;
