use crate::app::{MovieDetailsPatch, NewMovie};
use crate::transport::http::handlers::common::reply;
use crate::transport::http::types::{
    json_422, query_400, ApiResponse, AppState, CreateMovieRequest, RenameMovieRequest, TitleQuery,
    UpdateMovieRequest,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/movies",
    request_body = CreateMovieRequest,
    responses(
        (status = 201, description = "Movie created", body = ApiResponse),
        (status = 400, description = "Missing id or title", body = ApiResponse),
        (status = 409, description = "Id or title already in use", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_movie_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"id\": \"...\", \"title\": \"...\"}").into_response(),
    };
    let result = state
        .movies
        .create_movie(NewMovie {
            id: request.id,
            title: request.title,
            director: request.director,
            release_date: request.release_date,
            runtime: request.runtime,
            plot_summary: request.plot_summary,
            principal_cast: request.principal_cast,
        })
        .await;
    reply("create_movie", StatusCode::CREATED, result)
}

#[utoipa::path(
    get,
    path = "/movies",
    responses((status = 200, description = "Every movie", body = ApiResponse))
)]
pub async fn list_movies_handler(State(state): State<AppState>) -> impl IntoResponse {
    reply("list_movies", StatusCode::OK, state.movies.list_movies().await)
}

#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "The movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse)
    )
)]
pub async fn get_movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    reply("get_movie", StatusCode::OK, state.movies.get_movie(&id).await)
}

#[utoipa::path(
    patch,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    request_body = UpdateMovieRequest,
    responses(
        (status = 200, description = "Updated movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"director\"?, \"releaseDate\"?, \"runtime\"?, \"plotSummary\"?}").into_response(),
    };
    let patch = MovieDetailsPatch {
        director: request.director,
        release_date: request.release_date,
        runtime: request.runtime,
        plot_summary: request.plot_summary,
    };
    reply(
        "update_movie_details",
        StatusCode::OK,
        state.movies.update_movie_details(&id, patch).await,
    )
}

/// Retitles the movie everywhere its title is copied.
#[utoipa::path(
    put,
    path = "/movies/{id}/title",
    params(("id" = String, Path, description = "Movie id")),
    request_body = RenameMovieRequest,
    responses(
        (status = 200, description = "Renamed movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 409, description = "Another movie has that title", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn rename_movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<RenameMovieRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"title\": \"...\"}").into_response(),
    };
    reply(
        "rename_movie",
        StatusCode::OK,
        state.movies.rename_movie(&id, &request.title).await,
    )
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id"), TitleQuery),
    responses(
        (status = 200, description = "Movie deleted with cascade counts", body = ApiResponse),
        (status = 400, description = "Missing title or title does not match the movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse)
    )
)]
pub async fn delete_movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<TitleQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e, "?title=...").into_response(),
    };
    let result = state
        .movies
        .delete_movie(&query.title, &id)
        .await
        .map(|removal| {
            json!({
                "movieId": id,
                "actorsUpdated": removal.actors_updated,
                "flagsUpdated": removal.flags_updated,
                "reviewsDeleted": removal.reviews_deleted,
            })
        });
    reply("delete_movie", StatusCode::OK, result)
}
