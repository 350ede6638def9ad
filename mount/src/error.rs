use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("invalid mount location: {0}")]
    InvalidLocation(String),

    #[error("no mount found for {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
