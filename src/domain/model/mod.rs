//! Typed documents stored by the movie and rating data services.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

pub mod catalog;
pub mod rating;

pub use catalog::{Actor, Flag, Movie, Review};
pub use rating::{Rating, Tag};

/// The logical collections shared by both services.
///
/// Movie titles are denormalized into every collection except `Movies` itself,
/// so a rename or delete of a movie has to touch all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Movies,
    Actors,
    Flags,
    Ratings,
    UserAssociatedRatings,
    Reviews,
    Tags,
}

impl Collection {
    /// Name used as the `collection` column in storage.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Movies => "movies",
            Collection::Actors => "actors",
            Collection::Flags => "flags",
            Collection::Ratings => "ratings",
            Collection::UserAssociatedRatings => "userAssociatedRatings",
            Collection::Reviews => "reviews",
            Collection::Tags => "tags",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type persisted as a document in one collection.
///
/// Every document carries a string `id` field; the store uses it as the
/// per-collection primary key.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

/// Field names shared by the consistency rules and the store filters.
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DIRECTOR: &str = "director";
    pub const RELEASE_DATE: &str = "releaseDate";
    pub const RUNTIME: &str = "runtime";
    pub const PLOT_SUMMARY: &str = "plotSummary";
    pub const PRINCIPAL_CAST: &str = "principalCast";
    pub const FLAG_NAMES: &str = "flagNames";
    pub const RATING_CATEGORY_NAMES: &str = "ratingCategoryNames";
    pub const TAG_NAMES: &str = "tagNames";

    pub const NAME: &str = "name";
    pub const DOB: &str = "dob";
    pub const MOVIES: &str = "movies";

    pub const FLAG_NAME: &str = "flagName";
    pub const MOVIE_TITLES: &str = "movieTitles";

    pub const MOVIE_TITLE: &str = "movieTitle";
    pub const MOVIE_ID: &str = "movieId";
    pub const USER_NAME: &str = "userName";
    pub const REVIEW_TITLE: &str = "reviewTitle";
    pub const REVIEW_DESCRIPTION: &str = "reviewDescription";

    pub const RATING_NAME: &str = "ratingName";
    pub const USER_RATING: &str = "userRating";
    pub const UPPERBOUND: &str = "upperbound";
    pub const TAG_NAME: &str = "tagName";
}
