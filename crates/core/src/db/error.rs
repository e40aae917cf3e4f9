use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("db error: {0}")]
    Internal(String),
}
