use super::{Collection, Entity};
use serde::{Deserialize, Serialize};

/// The aggregate root. Its title is copied into actors, flags, reviews,
/// ratings and tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub plot_summary: String,
    #[serde(default)]
    pub principal_cast: Vec<String>,
    #[serde(default)]
    pub flag_names: Vec<String>,
    #[serde(default)]
    pub rating_category_names: Vec<String>,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

impl Entity for Movie {
    const COLLECTION: Collection = Collection::Movies;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dob: String,
    /// Titles of the movies the actor appears in.
    #[serde(default)]
    pub movies: Vec<String>,
}

impl Entity for Actor {
    const COLLECTION: Collection = Collection::Actors;
}

/// A content flag shared by every movie carrying it. Keyed by `flag_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub id: String,
    pub flag_name: String,
    #[serde(default)]
    pub movie_titles: Vec<String>,
}

impl Flag {
    pub fn new(flag_name: impl Into<String>, movie_title: impl Into<String>) -> Self {
        let flag_name = flag_name.into();
        Self {
            id: flag_name.clone(),
            flag_name,
            movie_titles: vec![movie_title.into()],
        }
    }
}

impl Entity for Flag {
    const COLLECTION: Collection = Collection::Flags;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub movie_title: String,
    /// Only recorded at creation; renames propagate through `movie_title`.
    #[serde(default)]
    pub movie_id: String,
    pub review_title: String,
    #[serde(default)]
    pub review_description: String,
    pub user_name: String,
}

impl Entity for Review {
    const COLLECTION: Collection = Collection::Reviews;
}
