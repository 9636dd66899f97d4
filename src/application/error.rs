use thiserror::Error;

use crate::domain::{DateError, SplitError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MissingFields(String),

    #[error(transparent)]
    InvalidDate(#[from] DateError),

    #[error("Invalid split method: {0}")]
    InvalidMethod(String),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("Incorrect user_id: {0}")]
    InvalidUserId(String),

    #[error("Incorrect participant ID: {0}")]
    InvalidParticipant(String),

    #[error("Invalid ID format")]
    InvalidIdFormat(String),

    #[error("Incorrect Email")]
    InvalidEmail(String),

    #[error("Incorrect Mobile Number")]
    InvalidMobileNumber(String),

    #[error("Either email or id is required")]
    MissingLookupKey,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors caused by the caller's input, as opposed to lookups that
    /// found nothing, conflicts, or store failures.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            AppError::UserNotFound(_) | AppError::UserAlreadyExists(_) | AppError::Database(_)
        )
    }
}
