//! Rating creation rules and the per-movie popularity summary.

use super::error::{ServiceError, ServiceResult};
use super::{movie_key, require_movie, require_non_empty, title_key};
use crate::domain::aggregate::{most_popular, PopularRating};
use crate::domain::model::{fields, Collection, Rating};
use crate::storage::docs::{
    find_entities, find_entity, insert_entity, lock_keys, DocumentStore, Filter, Update,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Scores arrive as numeric strings and are stored in canonical form.
#[derive(Debug, Clone, Default)]
pub struct NewRating {
    pub rating_name: String,
    pub user_rating: String,
    pub upperbound: String,
    pub user_name: String,
    pub movie_id: String,
    pub privacy: String,
}

/// Documents rewritten by `rename_rating_category`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryRename {
    pub ratings_updated: u64,
    pub copies_updated: u64,
}

pub struct RatingService {
    store: Arc<dyn DocumentStore>,
}

impl RatingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Records a rating and registers its category name on the movie.
    ///
    /// Checks, in order: scale (`1 <= userRating <= upperbound`), the
    /// `(userName, ratingName, upperbound, movieId)` uniqueness tuple, and
    /// the movie's existence.
    pub async fn create_rating(&self, new: NewRating) -> ServiceResult<Rating> {
        require_non_empty("ratingName", &new.rating_name)?;
        require_non_empty("userName", &new.user_name)?;
        let upperbound = parse_upperbound(&new.upperbound)?;
        let user_rating = parse_score(fields::USER_RATING, &new.user_rating)?;
        check_range(user_rating, upperbound)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(&new.movie_id)]).await?;

        let same_tuple = Filter::eq(fields::USER_NAME, new.user_name.as_str())
            .and(fields::RATING_NAME, new.rating_name.as_str())
            .and(fields::UPPERBOUND, upperbound.to_string())
            .and(fields::MOVIE_ID, new.movie_id.as_str());
        if find_entity::<Rating>(tx.as_mut(), &same_tuple).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} already rated movie {} for {:?} out of {}",
                new.user_name, new.movie_id, new.rating_name, upperbound
            )));
        }
        let movie = require_movie(tx.as_mut(), &new.movie_id).await?;

        let rating = Rating {
            id: Uuid::new_v4().to_string(),
            user_name: new.user_name,
            rating_name: new.rating_name,
            user_rating: user_rating.to_string(),
            upperbound: upperbound.to_string(),
            movie_title: movie.title,
            movie_id: new.movie_id,
            date_time_created: Utc::now(),
            privacy: new.privacy,
        };
        insert_entity(tx.as_mut(), &rating).await?;
        tx.update_one(
            Collection::Movies,
            &Filter::by_id(&rating.movie_id),
            &Update::add_to_set(fields::RATING_CATEGORY_NAMES, rating.rating_name.as_str()),
        )
        .await?;
        tx.commit().await?;

        info!(
            rating_id = %rating.id,
            movie_id = %rating.movie_id,
            rating_name = %rating.rating_name,
            user = %rating.user_name,
            "rating created"
        );
        Ok(rating)
    }

    /// The most used rating name and scale for the movie, with the mean
    /// score over ratings using both.
    pub async fn most_popular_for_movie(&self, movie_id: &str) -> ServiceResult<PopularRating> {
        let ratings = self.ratings_with_movie_id(movie_id).await?;
        let popular = most_popular(&ratings)?.ok_or_else(|| ServiceError::NoRatings {
            movie_id: movie_id.to_string(),
        })?;
        debug!(
            movie_id,
            rating_name = %popular.rating_name,
            upperbound = %popular.upperbound,
            sample_size = popular.sample_size,
            "popularity computed"
        );
        Ok(popular)
    }

    pub async fn ratings_with_same_name_and_upperbound(
        &self,
        rating_name: &str,
        upperbound: &str,
    ) -> ServiceResult<Vec<Rating>> {
        let upperbound = parse_upperbound(upperbound)?;
        let filter = Filter::eq(fields::RATING_NAME, rating_name)
            .and(fields::UPPERBOUND, upperbound.to_string());
        self.find(&filter).await
    }

    pub async fn ratings_with_same_name(&self, rating_name: &str) -> ServiceResult<Vec<Rating>> {
        self.find(&Filter::eq(fields::RATING_NAME, rating_name)).await
    }

    pub async fn ratings_with_movie_id(&self, movie_id: &str) -> ServiceResult<Vec<Rating>> {
        self.find(&Filter::eq(fields::MOVIE_ID, movie_id)).await
    }

    /// Changes the score of the user's rating for a movie, keeping the
    /// user-associated copy in step. The new score is checked against the
    /// stored upperbound.
    pub async fn update_user_rating(
        &self,
        user_name: &str,
        rating_name: &str,
        movie_title: &str,
        user_rating: &str,
    ) -> ServiceResult<Rating> {
        let score = parse_score(fields::USER_RATING, user_rating)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[title_key(movie_title)]).await?;

        let filter = Filter::eq(fields::USER_NAME, user_name)
            .and(fields::RATING_NAME, rating_name)
            .and(fields::MOVIE_TITLE, movie_title);
        let mut rating = find_entity::<Rating>(tx.as_mut(), &filter)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found("rating", format!("{user_name}/{rating_name}/{movie_title}"))
            })?;
        let upperbound = rating.upperbound.trim().parse::<i64>().map_err(|_| {
            ServiceError::CorruptDocument(format!(
                "rating {} has a non-numeric upperbound {:?}",
                rating.id, rating.upperbound
            ))
        })?;
        check_range(score, upperbound)?;

        rating.user_rating = score.to_string();
        let set_score = Update::set(fields::USER_RATING, rating.user_rating.as_str());
        tx.update_one(Collection::Ratings, &Filter::by_id(&rating.id), &set_score)
            .await?;
        let copies = tx
            .update_many(
                Collection::UserAssociatedRatings,
                &filter.and(fields::UPPERBOUND, rating.upperbound.as_str()),
                &set_score,
            )
            .await?;
        tx.commit().await?;

        debug!(rating_id = %rating.id, copies, "user-associated ratings updated");
        info!(rating_id = %rating.id, user_name, rating_name, movie_title, "rating score updated");
        Ok(rating)
    }

    /// Renames a rating category on one movie: every rating and
    /// user-associated copy under `old_name` moves to `new_name`, and the
    /// movie's category list swaps the name in place.
    ///
    /// Fails with `Conflict` if a user already has a `new_name` rating on the
    /// same scale for this movie, since the rename would duplicate it.
    pub async fn rename_rating_category(
        &self,
        movie_id: &str,
        old_name: &str,
        new_name: &str,
    ) -> ServiceResult<CategoryRename> {
        require_non_empty("ratingName", new_name)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(movie_id)]).await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;
        lock_keys(tx.as_mut(), &[title_key(&movie.title)]).await?;

        let in_category = Filter::eq(fields::MOVIE_ID, movie_id).and(fields::RATING_NAME, old_name);
        let renamed: Vec<Rating> = find_entities(tx.as_mut(), &in_category).await?;
        if renamed.is_empty() {
            return Err(ServiceError::not_found(
                "rating category",
                format!("{movie_id}/{old_name}"),
            ));
        }
        if old_name == new_name {
            return Ok(CategoryRename::default());
        }

        for rating in &renamed {
            let clash = Filter::eq(fields::USER_NAME, rating.user_name.as_str())
                .and(fields::RATING_NAME, new_name)
                .and(fields::UPPERBOUND, rating.upperbound.as_str())
                .and(fields::MOVIE_ID, movie_id);
            if find_entity::<Rating>(tx.as_mut(), &clash).await?.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "{} already rated movie {} for {:?} out of {}",
                    rating.user_name, movie_id, new_name, rating.upperbound
                )));
            }
        }

        let set_name = Update::set(fields::RATING_NAME, new_name);
        tx.update_one(
            Collection::Movies,
            &Filter::by_id(movie_id),
            &Update::replace_element(fields::RATING_CATEGORY_NAMES, old_name, new_name),
        )
        .await?;
        let ratings_updated = tx
            .update_many(Collection::Ratings, &in_category, &set_name)
            .await?;
        let copies_updated = tx
            .update_many(
                Collection::UserAssociatedRatings,
                &Filter::eq(fields::MOVIE_TITLE, movie.title.as_str())
                    .and(fields::RATING_NAME, old_name),
                &set_name,
            )
            .await?;
        tx.commit().await?;

        debug!(movie_id, ratings_updated, copies_updated, "rating category cascade applied");
        info!(movie_id, old_name, new_name, "rating category renamed");
        Ok(CategoryRename {
            ratings_updated,
            copies_updated,
        })
    }

    async fn find(&self, filter: &Filter) -> ServiceResult<Vec<Rating>> {
        let mut tx = self.store.begin().await?;
        Ok(find_entities(tx.as_mut(), filter).await?)
    }
}

fn parse_score(field: &str, raw: &str) -> ServiceResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::InvalidInput(format!("{field} must be an integer, got {raw:?}")))
}

fn parse_upperbound(raw: &str) -> ServiceResult<i64> {
    let upperbound = parse_score(fields::UPPERBOUND, raw)?;
    if upperbound < 1 {
        return Err(ServiceError::InvalidInput(format!(
            "upperbound must be at least 1, got {upperbound}"
        )));
    }
    Ok(upperbound)
}

fn check_range(user_rating: i64, upperbound: i64) -> ServiceResult<()> {
    if (1..=upperbound).contains(&user_rating) {
        Ok(())
    } else {
        Err(ServiceError::InvalidRange {
            user_rating,
            upperbound,
        })
    }
}
