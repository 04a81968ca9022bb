use thiserror::Error;

pub type WxcResult<T> = Result<T, WxcError>;

#[derive(Error, Debug)]
pub enum WxcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Library error: {0}")]
    Library(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}
