use crate::domain::aggregate::PopularityError;
use crate::storage::docs::StoreError;
use thiserror::Error;

/// Why a service operation did not apply.
///
/// Every precondition that used to fall through silently maps to one of
/// these. A failed cascade surfaces as `Store` after its transaction has
/// rolled back, so nothing is left half-applied.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("user rating {user_rating} is outside 1..={upperbound}")]
    InvalidRange { user_rating: i64, upperbound: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("movie {movie_id} has no ratings")]
    NoRatings { movie_id: String },

    #[error("corrupt document: {0}")]
    CorruptDocument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            key: key.into(),
        }
    }
}

impl From<PopularityError> for ServiceError {
    fn from(err: PopularityError) -> Self {
        ServiceError::CorruptDocument(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
