use crate::app::{NewReview, ReviewPatch};
use crate::transport::http::handlers::common::reply;
use crate::transport::http::types::{
    json_422, query_400, ApiResponse, AppState, CreateReviewRequest, ReviewDto, ReviewKeyQuery,
    ReviewsQuery, UpdateReviewRequest,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse),
        (status = 400, description = "Title does not match the movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_review_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"movieTitle\", \"movieId\", \"reviewTitle\", \"reviewDescription\"?, \"userName\"}",
            )
            .into_response()
        }
    };
    let result = state
        .movies
        .create_review(NewReview {
            movie_title: request.movie_title,
            movie_id: request.movie_id,
            review_title: request.review_title,
            review_description: request.review_description,
            user_name: request.user_name,
        })
        .await;
    reply("create_review", StatusCode::CREATED, result)
}

#[utoipa::path(
    get,
    path = "/reviews",
    params(ReviewsQuery),
    responses(
        (status = 200, description = "Reviews of the movie", body = [ReviewDto]),
        (status = 400, description = "Missing movieTitle", body = ApiResponse)
    )
)]
pub async fn list_reviews_handler(
    State(state): State<AppState>,
    query: Result<Query<ReviewsQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e, "?movieTitle=...").into_response(),
    };
    let result = state
        .movies
        .reviews_for_movie(&query.movie_title)
        .await
        .map(|reviews| reviews.into_iter().map(ReviewDto::from).collect::<Vec<_>>());
    reply("reviews_for_movie", StatusCode::OK, result)
}

#[utoipa::path(
    patch,
    path = "/reviews",
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated review", body = ApiResponse),
        (status = 404, description = "No review by that user for the movie", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_review_handler(
    State(state): State<AppState>,
    request: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"movieTitle\", \"userName\", \"reviewTitle\"?, \"reviewDescription\"?}",
            )
            .into_response()
        }
    };
    let patch = ReviewPatch {
        review_title: request.review_title,
        review_description: request.review_description,
    };
    reply(
        "update_review",
        StatusCode::OK,
        state
            .movies
            .update_review(&request.movie_title, &request.user_name, patch)
            .await,
    )
}

#[utoipa::path(
    delete,
    path = "/reviews",
    params(ReviewKeyQuery),
    responses(
        (status = 200, description = "Reviews deleted", body = ApiResponse),
        (status = 400, description = "Missing movieTitle or userName", body = ApiResponse),
        (status = 404, description = "No review by that user for the movie", body = ApiResponse)
    )
)]
pub async fn delete_review_handler(
    State(state): State<AppState>,
    query: Result<Query<ReviewKeyQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e, "?movieTitle=...&userName=...").into_response(),
    };
    let result = state
        .movies
        .delete_review(&query.movie_title, &query.user_name)
        .await
        .map(|deleted| json!({ "deleted": deleted }));
    reply("delete_review", StatusCode::OK, result)
}
