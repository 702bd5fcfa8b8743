//! The consistency and aggregation layer.
//!
//! Each public operation runs in one store transaction. Before touching
//! data it takes advisory locks on the aggregate keys involved; lock keys
//! are prefixed so that, sorted, they always come out as
//! `actor:* < flag:* < movie:* < title:*`.

pub mod error;
pub mod movie_service;
pub mod rating_service;
pub mod tag_service;

pub use error::{ServiceError, ServiceResult};
pub use movie_service::{
    ActorPatch, FlagChange, MovieDetailsPatch, MovieRemoval, MovieService, NewActor, NewMovie,
    NewReview, ReviewPatch,
};
pub use rating_service::{CategoryRename, NewRating, RatingService};
pub use tag_service::{NewTag, TagService};

use crate::domain::model::{fields, Movie};
use crate::storage::docs::{find_entity, Filter, StoreTx};

pub(crate) fn actor_key(id: &str) -> String {
    format!("actor:{}", id)
}

pub(crate) fn flag_key(name: &str) -> String {
    format!("flag:{}", name)
}

pub(crate) fn movie_key(id: &str) -> String {
    format!("movie:{}", id)
}

pub(crate) fn title_key(title: &str) -> String {
    format!("title:{}", title)
}

pub(crate) async fn require_movie(tx: &mut dyn StoreTx, movie_id: &str) -> ServiceResult<Movie> {
    find_entity::<Movie>(tx, &Filter::eq(fields::ID, movie_id))
        .await?
        .ok_or_else(|| ServiceError::not_found("movie", movie_id))
}

/// Callers pass the title they believe the movie has; a stale title would
/// otherwise be written into a dependent collection.
pub(crate) fn ensure_title(movie: &Movie, movie_title: &str) -> ServiceResult<()> {
    if movie.title == movie_title {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(format!(
            "movie {} is titled {:?}, not {:?}",
            movie.id, movie.title, movie_title
        )))
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        Err(ServiceError::InvalidInput(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}
