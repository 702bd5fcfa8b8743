use super::{Collection, Entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's score for a movie in a named category on a `1..=upperbound` scale.
///
/// `user_rating` and `upperbound` stay numeric strings on the wire and in
/// storage, matching the documents the rating service has always written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub user_name: String,
    pub rating_name: String,
    pub user_rating: String,
    pub upperbound: String,
    pub movie_title: String,
    pub movie_id: String,
    pub date_time_created: DateTime<Utc>,
    #[serde(default)]
    pub privacy: String,
}

impl Entity for Rating {
    const COLLECTION: Collection = Collection::Ratings;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub user_name: String,
    pub tag_name: String,
    pub movie_title: String,
    pub movie_id: String,
    pub date_time_created: DateTime<Utc>,
    #[serde(default)]
    pub privacy: String,
}

impl Entity for Tag {
    const COLLECTION: Collection = Collection::Tags;
}
