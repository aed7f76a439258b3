use thiserror::Error;

#[derive(Error, Debug)]
pub enum HueError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("no entertainment configurations exist")]
    NoConfigurations,
    #[error("unable to find entertainment configuration matching {0}")]
    ConfigurationNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
