use crate::app::NewRating;
use crate::transport::http::handlers::common::reply;
use crate::transport::http::types::{
    json_422, query_400, ApiResponse, AppState, CreateRatingRequest, PopularRatingDto, RatingDto,
    RatingsQuery, RenameRatingCategoryRequest, UpdateRatingRequest,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

fn to_dtos(ratings: Vec<crate::domain::model::Rating>) -> Vec<RatingDto> {
    ratings.into_iter().map(RatingDto::from).collect()
}

#[utoipa::path(
    post,
    path = "/ratings",
    request_body = CreateRatingRequest,
    responses(
        (status = 201, description = "Rating created", body = RatingDto),
        (status = 400, description = "Score outside 1..=upperbound or not numeric", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 409, description = "User already rated this movie on this scale", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_rating_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateRatingRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"ratingName\", \"userRating\", \"upperbound\", \"userName\", \"movieId\", \"privacy\"?}",
            )
            .into_response()
        }
    };
    let result = state
        .ratings
        .create_rating(NewRating {
            rating_name: request.rating_name,
            user_rating: request.user_rating,
            upperbound: request.upperbound,
            user_name: request.user_name,
            movie_id: request.movie_id,
            privacy: request.privacy,
        })
        .await
        .map(RatingDto::from);
    reply("create_rating", StatusCode::CREATED, result)
}

/// Ratings sharing a category name, optionally on one scale only.
#[utoipa::path(
    get,
    path = "/ratings",
    params(RatingsQuery),
    responses(
        (status = 200, description = "Matching ratings", body = [RatingDto]),
        (status = 400, description = "Missing ratingName or bad upperbound", body = ApiResponse)
    )
)]
pub async fn list_ratings_handler(
    State(state): State<AppState>,
    query: Result<Query<RatingsQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e, "?ratingName=...[&upperbound=...]").into_response(),
    };
    let result = match query.upperbound.as_deref() {
        Some(upperbound) => {
            state
                .ratings
                .ratings_with_same_name_and_upperbound(&query.rating_name, upperbound)
                .await
        }
        None => state.ratings.ratings_with_same_name(&query.rating_name).await,
    };
    reply("list_ratings", StatusCode::OK, result.map(to_dtos))
}

#[utoipa::path(
    patch,
    path = "/ratings",
    request_body = UpdateRatingRequest,
    responses(
        (status = 200, description = "Updated rating", body = RatingDto),
        (status = 400, description = "Score outside the stored scale", body = ApiResponse),
        (status = 404, description = "No such rating", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_rating_handler(
    State(state): State<AppState>,
    request: Result<Json<UpdateRatingRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"userName\", \"ratingName\", \"movieTitle\", \"userRating\"}",
            )
            .into_response()
        }
    };
    let result = state
        .ratings
        .update_user_rating(
            &request.user_name,
            &request.rating_name,
            &request.movie_title,
            &request.user_rating,
        )
        .await
        .map(RatingDto::from);
    reply("update_user_rating", StatusCode::OK, result)
}

#[utoipa::path(
    get,
    path = "/movies/{id}/ratings",
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, description = "Ratings of the movie", body = [RatingDto]))
)]
pub async fn movie_ratings_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let result = state.ratings.ratings_with_movie_id(&id).await;
    reply("ratings_with_movie_id", StatusCode::OK, result.map(to_dtos))
}

#[utoipa::path(
    get,
    path = "/movies/{id}/ratings/popular",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Most popular rating summary", body = PopularRatingDto),
        (status = 404, description = "The movie has no ratings", body = ApiResponse)
    )
)]
pub async fn popular_rating_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let result = state
        .ratings
        .most_popular_for_movie(&id)
        .await
        .map(|popular| PopularRatingDto::new(&id, popular));
    reply("most_popular_for_movie", StatusCode::OK, result)
}

/// Renames a rating category on one movie, carrying the new name into every
/// rating and user-associated copy.
#[utoipa::path(
    put,
    path = "/movies/{id}/ratings/categories/{name}",
    params(
        ("id" = String, Path, description = "Movie id"),
        ("name" = String, Path, description = "Current category name")
    ),
    request_body = RenameRatingCategoryRequest,
    responses(
        (status = 200, description = "Category renamed with cascade counts", body = ApiResponse),
        (status = 400, description = "Empty new name", body = ApiResponse),
        (status = 404, description = "Unknown movie or category", body = ApiResponse),
        (status = 409, description = "A user already has a rating under the new name", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn rename_rating_category_handler(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
    request: Result<Json<RenameRatingCategoryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"ratingName\": \"...\"}").into_response(),
    };
    let result = state
        .ratings
        .rename_rating_category(&id, &name, &request.rating_name)
        .await
        .map(|renamed| {
            json!({
                "movieId": id,
                "ratingName": request.rating_name,
                "ratingsUpdated": renamed.ratings_updated,
                "copiesUpdated": renamed.copies_updated,
            })
        });
    reply("rename_rating_category", StatusCode::OK, result)
}
