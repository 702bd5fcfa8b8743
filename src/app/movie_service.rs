//! Movie data service rules.
//!
//! A movie's title is copied into actors, flags, reviews, ratings,
//! user-associated ratings and tags. Every operation here that changes or
//! retires a title rewrites those copies inside the same transaction.

use super::error::{ServiceError, ServiceResult};
use super::{actor_key, ensure_title, flag_key, movie_key, require_movie, require_non_empty, title_key};
use crate::domain::model::{fields, Actor, Collection, Flag, Movie, Review};
use crate::storage::docs::{
    find_entities, find_entity, insert_entity, lock_keys, DocumentStore, Filter, Update,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct NewMovie {
    pub id: String,
    pub title: String,
    pub director: String,
    pub release_date: String,
    pub runtime: String,
    pub plot_summary: String,
    pub principal_cast: Vec<String>,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct MovieDetailsPatch {
    pub director: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<String>,
    pub plot_summary: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewActor {
    pub id: String,
    pub name: String,
    pub dob: String,
    pub movie_title: String,
    pub movie_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct ActorPatch {
    pub name: Option<String>,
    pub dob: Option<String>,
    /// Replaces the whole list when present.
    pub movies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewReview {
    pub movie_title: String,
    pub movie_id: String,
    pub review_title: String,
    pub review_description: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub review_title: Option<String>,
    pub review_description: Option<String>,
}

/// What `create_flag` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    /// A new flag document was created for the movie.
    Created,
    /// The movie was added to an existing flag.
    Attached,
    /// The flag already listed the movie.
    AlreadyFlagged,
}

impl FlagChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagChange::Created => "created",
            FlagChange::Attached => "attached",
            FlagChange::AlreadyFlagged => "alreadyFlagged",
        }
    }
}

/// Cascade counts reported by `delete_movie`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovieRemoval {
    pub actors_updated: u64,
    pub flags_updated: u64,
    pub reviews_deleted: u64,
}

pub struct MovieService {
    store: Arc<dyn DocumentStore>,
}

impl MovieService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ---- movies ----

    pub async fn create_movie(&self, new: NewMovie) -> ServiceResult<Movie> {
        require_non_empty("id", &new.id)?;
        require_non_empty("title", &new.title)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(&new.id), title_key(&new.title)]).await?;

        if find_entity::<Movie>(tx.as_mut(), &Filter::by_id(&new.id))
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!("movie {} already exists", new.id)));
        }
        if let Some(other) =
            find_entity::<Movie>(tx.as_mut(), &Filter::eq(fields::TITLE, new.title.as_str())).await?
        {
            return Err(ServiceError::Conflict(format!(
                "title {:?} already belongs to movie {}",
                new.title, other.id
            )));
        }

        let movie = Movie {
            id: new.id,
            title: new.title,
            director: new.director,
            release_date: new.release_date,
            runtime: new.runtime,
            plot_summary: new.plot_summary,
            principal_cast: distinct(new.principal_cast),
            flag_names: Vec::new(),
            rating_category_names: Vec::new(),
            tag_names: Vec::new(),
        };
        insert_entity(tx.as_mut(), &movie).await?;
        tx.commit().await?;

        info!(movie_id = %movie.id, title = %movie.title, "movie created");
        Ok(movie)
    }

    pub async fn get_movie(&self, movie_id: &str) -> ServiceResult<Movie> {
        let mut tx = self.store.begin().await?;
        require_movie(tx.as_mut(), movie_id).await
    }

    pub async fn list_movies(&self) -> ServiceResult<Vec<Movie>> {
        let mut tx = self.store.begin().await?;
        Ok(find_entities(tx.as_mut(), &Filter::all()).await?)
    }

    pub async fn update_movie_details(
        &self,
        movie_id: &str,
        patch: MovieDetailsPatch,
    ) -> ServiceResult<Movie> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(movie_id)]).await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;

        let mut updates = Vec::new();
        if let Some(director) = patch.director {
            updates.push(Update::set(fields::DIRECTOR, director));
        }
        if let Some(release_date) = patch.release_date {
            updates.push(Update::set(fields::RELEASE_DATE, release_date));
        }
        if let Some(runtime) = patch.runtime {
            updates.push(Update::set(fields::RUNTIME, runtime));
        }
        if let Some(plot_summary) = patch.plot_summary {
            updates.push(Update::set(fields::PLOT_SUMMARY, plot_summary));
        }
        if updates.is_empty() {
            return Ok(movie);
        }

        tx.update_one(Collection::Movies, &Filter::by_id(movie_id), &Update::Many(updates))
            .await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;
        tx.commit().await?;

        info!(movie_id, "movie details updated");
        Ok(movie)
    }

    /// Retitles a movie and every denormalized copy of its title.
    ///
    /// Renaming to the current title changes nothing, so repeating a rename
    /// is harmless.
    pub async fn rename_movie(&self, movie_id: &str, new_title: &str) -> ServiceResult<Movie> {
        require_non_empty("title", new_title)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(movie_id)]).await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;
        if movie.title == new_title {
            return Ok(movie);
        }
        let old_title = movie.title.clone();
        lock_keys(tx.as_mut(), &[title_key(&old_title), title_key(new_title)]).await?;

        if let Some(other) =
            find_entity::<Movie>(tx.as_mut(), &Filter::eq(fields::TITLE, new_title)).await?
        {
            return Err(ServiceError::Conflict(format!(
                "title {:?} already belongs to movie {}",
                new_title, other.id
            )));
        }

        tx.update_one(
            Collection::Movies,
            &Filter::by_id(movie_id),
            &Update::set(fields::TITLE, new_title),
        )
        .await?;

        let flags = tx
            .update_many(
                Collection::Flags,
                &Filter::eq(fields::MOVIE_TITLES, old_title.as_str()),
                &Update::replace_element(fields::MOVIE_TITLES, old_title.as_str(), new_title),
            )
            .await?;
        let actors = tx
            .update_many(
                Collection::Actors,
                &Filter::eq(fields::MOVIES, old_title.as_str()),
                &Update::replace_element(fields::MOVIES, old_title.as_str(), new_title),
            )
            .await?;

        let by_old_title = Filter::eq(fields::MOVIE_TITLE, old_title.as_str());
        let retitle = Update::set(fields::MOVIE_TITLE, new_title);
        let mut copies = 0;
        for collection in [
            Collection::Ratings,
            Collection::UserAssociatedRatings,
            Collection::Reviews,
            Collection::Tags,
        ] {
            copies += tx.update_many(collection, &by_old_title, &retitle).await?;
        }

        tx.commit().await?;

        debug!(movie_id, flags, actors, copies, "rename cascade applied");
        info!(movie_id, old_title = %old_title, new_title, "movie renamed");
        Ok(Movie {
            title: new_title.to_string(),
            ..movie
        })
    }

    /// Deletes a movie, strips its title from actors and flags, and deletes
    /// its reviews. Ratings and tags are left to the rating service.
    pub async fn delete_movie(&self, movie_title: &str, movie_id: &str) -> ServiceResult<MovieRemoval> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(movie_id), title_key(movie_title)]).await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;
        ensure_title(&movie, movie_title)?;

        tx.delete_one(Collection::Movies, &Filter::by_id(movie_id)).await?;
        let actors_updated = tx
            .update_many(
                Collection::Actors,
                &Filter::eq(fields::MOVIES, movie_title),
                &Update::pull(fields::MOVIES, movie_title),
            )
            .await?;
        let flags_updated = tx
            .update_many(
                Collection::Flags,
                &Filter::eq(fields::MOVIE_TITLES, movie_title),
                &Update::pull(fields::MOVIE_TITLES, movie_title),
            )
            .await?;
        let reviews_deleted = tx
            .delete_many(Collection::Reviews, &Filter::eq(fields::MOVIE_TITLE, movie_title))
            .await?;
        tx.commit().await?;

        let removal = MovieRemoval {
            actors_updated,
            flags_updated,
            reviews_deleted,
        };
        debug!(movie_id, ?removal, "delete cascade applied");
        info!(movie_id, movie_title, "movie deleted");
        Ok(removal)
    }

    // ---- actors ----

    /// Inserts the actor with the given movie as its only credit and adds
    /// the actor's name to that movie's principal cast.
    pub async fn create_actor(&self, new: NewActor) -> ServiceResult<Actor> {
        require_non_empty("id", &new.id)?;
        require_non_empty("name", &new.name)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[actor_key(&new.id), movie_key(&new.movie_id)]).await?;

        if find_entity::<Actor>(tx.as_mut(), &Filter::by_id(&new.id))
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!("actor {} already exists", new.id)));
        }
        let movie = require_movie(tx.as_mut(), &new.movie_id).await?;
        ensure_title(&movie, &new.movie_title)?;

        let actor = Actor {
            id: new.id,
            name: new.name,
            dob: new.dob,
            movies: vec![new.movie_title],
        };
        insert_entity(tx.as_mut(), &actor).await?;
        tx.update_one(
            Collection::Movies,
            &Filter::by_id(&movie.id),
            &Update::add_to_set(fields::PRINCIPAL_CAST, actor.name.as_str()),
        )
        .await?;
        tx.commit().await?;

        info!(actor_id = %actor.id, movie_id = %movie.id, "actor created");
        Ok(actor)
    }

    pub async fn get_actor(&self, actor_id: &str) -> ServiceResult<Actor> {
        let mut tx = self.store.begin().await?;
        find_entity::<Actor>(tx.as_mut(), &Filter::by_id(actor_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("actor", actor_id))
    }

    /// Replaces the actor's movie list. Repeated titles are kept once, in
    /// first-seen order.
    pub async fn update_actor_movie_list(
        &self,
        actor_id: &str,
        movie_titles: Vec<String>,
    ) -> ServiceResult<Actor> {
        self.update_actor(
            actor_id,
            ActorPatch {
                movies: Some(movie_titles),
                ..ActorPatch::default()
            },
        )
        .await
    }

    pub async fn update_actor(&self, actor_id: &str, patch: ActorPatch) -> ServiceResult<Actor> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[actor_key(actor_id)]).await?;
        let mut actor = find_entity::<Actor>(tx.as_mut(), &Filter::by_id(actor_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("actor", actor_id))?;

        let mut updates = Vec::new();
        if let Some(name) = patch.name {
            updates.push(Update::set(fields::NAME, name.as_str()));
            actor.name = name;
        }
        if let Some(dob) = patch.dob {
            updates.push(Update::set(fields::DOB, dob.as_str()));
            actor.dob = dob;
        }
        if let Some(movies) = patch.movies {
            let movies = distinct(movies);
            updates.push(Update::unset(fields::MOVIES));
            updates.push(Update::push_all(fields::MOVIES, movies.iter().map(String::as_str)));
            actor.movies = movies;
        }
        if updates.is_empty() {
            return Ok(actor);
        }

        tx.update_one(Collection::Actors, &Filter::by_id(actor_id), &Update::Many(updates))
            .await?;
        tx.commit().await?;

        info!(actor_id, movies = actor.movies.len(), "actor updated");
        Ok(actor)
    }

    pub async fn delete_actor(&self, actor_id: &str) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[actor_key(actor_id)]).await?;
        let deleted = tx
            .delete_one(Collection::Actors, &Filter::by_id(actor_id))
            .await?;
        if deleted == 0 {
            return Err(ServiceError::not_found("actor", actor_id));
        }
        tx.commit().await?;

        info!(actor_id, "actor deleted");
        Ok(())
    }

    // ---- flags ----

    /// Associates a flag with a movie, creating the flag on first use.
    pub async fn create_flag(
        &self,
        flag_name: &str,
        movie_title: &str,
        movie_id: &str,
    ) -> ServiceResult<FlagChange> {
        require_non_empty("flagName", flag_name)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[flag_key(flag_name), movie_key(movie_id)]).await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;
        ensure_title(&movie, movie_title)?;

        let existing =
            find_entity::<Flag>(tx.as_mut(), &Filter::eq(fields::FLAG_NAME, flag_name)).await?;

        // Movie row before the flag row, as in rename and delete_flags.
        // Also repairs a movie that lost the name while the flag kept the title.
        tx.update_one(
            Collection::Movies,
            &Filter::by_id(movie_id),
            &Update::add_to_set(fields::FLAG_NAMES, flag_name),
        )
        .await?;

        let change = match existing {
            Some(flag) if flag.movie_titles.iter().any(|t| t == movie_title) => {
                FlagChange::AlreadyFlagged
            }
            Some(flag) => {
                tx.update_one(
                    Collection::Flags,
                    &Filter::by_id(&flag.id),
                    &Update::add_to_set(fields::MOVIE_TITLES, movie_title),
                )
                .await?;
                FlagChange::Attached
            }
            None => {
                insert_entity(tx.as_mut(), &Flag::new(flag_name, movie_title)).await?;
                FlagChange::Created
            }
        };
        tx.commit().await?;

        info!(flag_name, movie_id, change = change.as_str(), "flag applied");
        Ok(change)
    }

    pub async fn get_flag(&self, flag_name: &str) -> ServiceResult<Flag> {
        let mut tx = self.store.begin().await?;
        find_entity::<Flag>(tx.as_mut(), &Filter::eq(fields::FLAG_NAME, flag_name))
            .await?
            .ok_or_else(|| ServiceError::not_found("flag", flag_name))
    }

    /// Detaches one flag from one movie. The flag document stays, even when
    /// its list becomes empty.
    pub async fn delete_flag(
        &self,
        flag_name: &str,
        movie_id: &str,
        movie_title: &str,
    ) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[flag_key(flag_name), movie_key(movie_id)]).await?;
        let movie = require_movie(tx.as_mut(), movie_id).await?;
        ensure_title(&movie, movie_title)?;
        let flag = find_entity::<Flag>(tx.as_mut(), &Filter::eq(fields::FLAG_NAME, flag_name))
            .await?
            .ok_or_else(|| ServiceError::not_found("flag", flag_name))?;

        tx.update_one(
            Collection::Movies,
            &Filter::by_id(movie_id),
            &Update::pull(fields::FLAG_NAMES, flag_name),
        )
        .await?;
        tx.update_one(
            Collection::Flags,
            &Filter::by_id(&flag.id),
            &Update::pull(fields::MOVIE_TITLES, movie_title),
        )
        .await?;
        tx.commit().await?;

        info!(flag_name, movie_id, "flag removed from movie");
        Ok(())
    }

    /// Removes the flag from every movie and empties its list. Returns the
    /// number of movies that carried it.
    pub async fn delete_flags(&self, flag_name: &str) -> ServiceResult<u64> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[flag_key(flag_name)]).await?;
        let flag = find_entity::<Flag>(tx.as_mut(), &Filter::eq(fields::FLAG_NAME, flag_name))
            .await?
            .ok_or_else(|| ServiceError::not_found("flag", flag_name))?;

        // Movies first: rename touches movie rows before flag rows.
        let movies = tx
            .update_many(
                Collection::Movies,
                &Filter::eq(fields::FLAG_NAMES, flag_name),
                &Update::pull(fields::FLAG_NAMES, flag_name),
            )
            .await?;
        tx.update_one(
            Collection::Flags,
            &Filter::by_id(&flag.id),
            &Update::set(fields::MOVIE_TITLES, Vec::<String>::new()),
        )
        .await?;
        tx.commit().await?;

        info!(flag_name, movies, "flag cleared from all movies");
        Ok(movies)
    }

    // ---- reviews ----

    pub async fn create_review(&self, new: NewReview) -> ServiceResult<Review> {
        require_non_empty("userName", &new.user_name)?;

        let mut tx = self.store.begin().await?;
        lock_keys(
            tx.as_mut(),
            &[movie_key(&new.movie_id), title_key(&new.movie_title)],
        )
        .await?;
        let movie = require_movie(tx.as_mut(), &new.movie_id).await?;
        ensure_title(&movie, &new.movie_title)?;

        let review = Review {
            id: Uuid::new_v4().to_string(),
            movie_title: new.movie_title,
            movie_id: new.movie_id,
            review_title: new.review_title,
            review_description: new.review_description,
            user_name: new.user_name,
        };
        insert_entity(tx.as_mut(), &review).await?;
        tx.commit().await?;

        info!(review_id = %review.id, movie_id = %review.movie_id, user = %review.user_name, "review created");
        Ok(review)
    }

    pub async fn reviews_for_movie(&self, movie_title: &str) -> ServiceResult<Vec<Review>> {
        let mut tx = self.store.begin().await?;
        Ok(find_entities(tx.as_mut(), &Filter::eq(fields::MOVIE_TITLE, movie_title)).await?)
    }

    /// Edits the first review the user wrote for the movie.
    pub async fn update_review(
        &self,
        movie_title: &str,
        user_name: &str,
        patch: ReviewPatch,
    ) -> ServiceResult<Review> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[title_key(movie_title)]).await?;
        let filter = Filter::eq(fields::MOVIE_TITLE, movie_title).and(fields::USER_NAME, user_name);
        let mut review = find_entity::<Review>(tx.as_mut(), &filter)
            .await?
            .ok_or_else(|| ServiceError::not_found("review", format!("{movie_title}/{user_name}")))?;

        let mut updates = Vec::new();
        if let Some(title) = patch.review_title {
            updates.push(Update::set(fields::REVIEW_TITLE, title.as_str()));
            review.review_title = title;
        }
        if let Some(description) = patch.review_description {
            updates.push(Update::set(fields::REVIEW_DESCRIPTION, description.as_str()));
            review.review_description = description;
        }
        if updates.is_empty() {
            return Ok(review);
        }

        tx.update_one(Collection::Reviews, &Filter::by_id(&review.id), &Update::Many(updates))
            .await?;
        tx.commit().await?;

        info!(review_id = %review.id, movie_title, user_name, "review updated");
        Ok(review)
    }

    /// Deletes every review the user wrote for the movie.
    pub async fn delete_review(&self, movie_title: &str, user_name: &str) -> ServiceResult<u64> {
        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[title_key(movie_title)]).await?;
        let deleted = tx
            .delete_many(
                Collection::Reviews,
                &Filter::eq(fields::MOVIE_TITLE, movie_title).and(fields::USER_NAME, user_name),
            )
            .await?;
        if deleted == 0 {
            return Err(ServiceError::not_found("review", format!("{movie_title}/{user_name}")));
        }
        tx.commit().await?;

        info!(movie_title, user_name, deleted, "reviews deleted");
        Ok(deleted)
    }
}

fn distinct(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
