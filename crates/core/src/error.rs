use crate::{config::ConfigError, db::DbError, record::DecodeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("database error")]
    Db(#[from] DbError),

    #[error("{0}")]
    Decode(#[from] DecodeError),
}
