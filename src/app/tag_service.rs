use super::error::{ServiceError, ServiceResult};
use super::{movie_key, require_movie, require_non_empty};
use crate::domain::model::{fields, Collection, Tag};
use crate::storage::docs::{
    find_entities, find_entity, insert_entity, lock_keys, DocumentStore, Filter, Update,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct NewTag {
    pub tag_name: String,
    pub movie_id: String,
    pub user_name: String,
    pub privacy: String,
}

pub struct TagService {
    store: Arc<dyn DocumentStore>,
}

impl TagService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// A user tags a movie at most once per tag name. The tag name is
    /// registered on the movie the same way rating categories are.
    pub async fn create_tag(&self, new: NewTag) -> ServiceResult<Tag> {
        require_non_empty("tagName", &new.tag_name)?;
        require_non_empty("userName", &new.user_name)?;

        let mut tx = self.store.begin().await?;
        lock_keys(tx.as_mut(), &[movie_key(&new.movie_id)]).await?;
        let movie = require_movie(tx.as_mut(), &new.movie_id).await?;

        let same_triple = Filter::eq(fields::MOVIE_TITLE, movie.title.as_str())
            .and(fields::USER_NAME, new.user_name.as_str())
            .and(fields::TAG_NAME, new.tag_name.as_str());
        if find_entity::<Tag>(tx.as_mut(), &same_triple).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} already tagged {:?} with {:?}",
                new.user_name, movie.title, new.tag_name
            )));
        }

        let tag = Tag {
            id: Uuid::new_v4().to_string(),
            user_name: new.user_name,
            tag_name: new.tag_name,
            movie_title: movie.title,
            movie_id: new.movie_id,
            date_time_created: Utc::now(),
            privacy: new.privacy,
        };
        insert_entity(tx.as_mut(), &tag).await?;
        tx.update_one(
            Collection::Movies,
            &Filter::by_id(&tag.movie_id),
            &Update::add_to_set(fields::TAG_NAMES, tag.tag_name.as_str()),
        )
        .await?;
        tx.commit().await?;

        info!(tag_id = %tag.id, movie_id = %tag.movie_id, tag_name = %tag.tag_name, "tag created");
        Ok(tag)
    }

    pub async fn tags_with_movie_id(&self, movie_id: &str) -> ServiceResult<Vec<Tag>> {
        let mut tx = self.store.begin().await?;
        Ok(find_entities(tx.as_mut(), &Filter::eq(fields::MOVIE_ID, movie_id)).await?)
    }
}
