// src/storage/errors.rs
use thiserror::Error;

use crate::core::identity::types::IdentityId;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data format in {source_name}: {reason}")]
    InvalidFormat { source_name: String, reason: String },

    #[error("Invalid embedding for identity {id}: {reason}")]
    Embedding { id: IdentityId, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
