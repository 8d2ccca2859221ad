use thiserror::Error;

#[derive(Debug, Error)]
pub enum DroneClearError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<DroneClearError> for String {
    fn from(err: DroneClearError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, DroneClearError>;
