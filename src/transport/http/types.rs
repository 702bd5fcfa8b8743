use crate::app::{MovieService, RatingService, TagService};
use crate::domain::aggregate::PopularRating;
use crate::domain::model::{Rating, Review, Tag};
use crate::storage::docs::DocumentStore;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub movies: Arc<MovieService>,
    pub ratings: Arc<RatingService>,
    pub tags: Arc<TagService>,
}

impl AppState {
    /// Wires every service to the same store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            movies: Arc::new(MovieService::new(store.clone())),
            ratings: Arc::new(RatingService::new(store.clone())),
            tags: Arc::new(TagService::new(store.clone())),
            store,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---- movie data service requests ----

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
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
}

/// Omitted fields keep their stored value.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
    pub director: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<String>,
    pub plot_summary: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RenameMovieRequest {
    pub title: String,
}

/// The title the caller expects the movie to have.
#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleQuery {
    pub title: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActorRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dob: String,
    pub movie_title: String,
    pub movie_id: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateActorRequest {
    pub name: Option<String>,
    pub dob: Option<String>,
    /// Replaces the actor's whole movie list.
    pub movies: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ActorMoviesRequest {
    pub movies: Vec<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlagRequest {
    pub flag_name: String,
    pub movie_title: String,
    pub movie_id: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub movie_title: String,
    pub movie_id: String,
    pub review_title: String,
    #[serde(default)]
    pub review_description: String,
    pub user_name: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewsQuery {
    pub movie_title: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewKeyQuery {
    pub movie_title: String,
    pub user_name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    pub movie_title: String,
    pub user_name: String,
    pub review_title: Option<String>,
    pub review_description: Option<String>,
}

/// Reviews as the movie pages show them; the author and movie id stay
/// server side.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub movie_title: String,
    pub review_title: String,
    pub review_description: String,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            movie_title: review.movie_title,
            review_title: review.review_title,
            review_description: review.review_description,
        }
    }
}

// ---- rating data service requests ----

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub rating_name: String,
    /// Integer in `1..=upperbound`, sent as a string.
    pub user_rating: String,
    /// Integer >= 1, sent as a string.
    pub upperbound: String,
    pub user_name: String,
    pub movie_id: String,
    #[serde(default)]
    pub privacy: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RatingsQuery {
    pub rating_name: String,
    /// Narrows the result to one scale.
    pub upperbound: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRatingRequest {
    pub user_name: String,
    pub rating_name: String,
    pub movie_title: String,
    pub user_rating: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameRatingCategoryRequest {
    pub rating_name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub tag_name: String,
    pub movie_id: String,
    pub user_name: String,
    #[serde(default)]
    pub privacy: String,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingDto {
    pub id: String,
    pub user_name: String,
    pub rating_name: String,
    pub user_rating: String,
    pub upperbound: String,
    pub movie_title: String,
    pub movie_id: String,
    /// RFC 3339.
    pub date_time_created: String,
    pub privacy: String,
}

impl From<Rating> for RatingDto {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            user_name: rating.user_name,
            rating_name: rating.rating_name,
            user_rating: rating.user_rating,
            upperbound: rating.upperbound,
            movie_title: rating.movie_title,
            movie_id: rating.movie_id,
            date_time_created: rating.date_time_created.to_rfc3339(),
            privacy: rating.privacy,
        }
    }
}

/// Rating-shaped summary: the winning name and scale, with the mean score
/// in `userRating` (e.g. `"5.0"`).
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PopularRatingDto {
    pub movie_id: String,
    pub rating_name: String,
    pub upperbound: String,
    pub user_rating: String,
    pub average: f64,
    pub sample_size: usize,
}

impl PopularRatingDto {
    pub fn new(movie_id: &str, popular: PopularRating) -> Self {
        Self {
            movie_id: movie_id.to_string(),
            user_rating: format!("{:?}", popular.average),
            rating_name: popular.rating_name,
            upperbound: popular.upperbound,
            average: popular.average,
            sample_size: popular.sample_size,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub id: String,
    pub user_name: String,
    pub tag_name: String,
    pub movie_title: String,
    pub movie_id: String,
    pub date_time_created: String,
    pub privacy: String,
}

impl From<Tag> for TagDto {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            user_name: tag.user_name,
            tag_name: tag.tag_name,
            movie_title: tag.movie_title,
            movie_id: tag.movie_id,
            date_time_created: tag.date_time_created.to_rfc3339(),
            privacy: tag.privacy,
        }
    }
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid JSON body: {} (expected: {})", err, expected)),
        }),
    )
}

pub fn query_400(err: QueryRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid query string: {} (expected: {})", err, expected)),
        }),
    )
}
