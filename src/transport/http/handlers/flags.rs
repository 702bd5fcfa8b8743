use crate::transport::http::handlers::common::reply;
use crate::transport::http::types::{
    json_422, query_400, ApiResponse, AppState, CreateFlagRequest, TitleQuery,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Flags a movie. `change` is `created`, `attached` or `alreadyFlagged`.
#[utoipa::path(
    post,
    path = "/flags",
    request_body = CreateFlagRequest,
    responses(
        (status = 200, description = "Flag applied", body = ApiResponse),
        (status = 400, description = "Title does not match the movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_flag_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateFlagRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"flagName\", \"movieTitle\", \"movieId\"}").into_response()
        }
    };
    let result = state
        .movies
        .create_flag(&request.flag_name, &request.movie_title, &request.movie_id)
        .await
        .map(|change| {
            json!({
                "flagName": request.flag_name,
                "movieId": request.movie_id,
                "change": change.as_str(),
            })
        });
    reply("create_flag", StatusCode::OK, result)
}

#[utoipa::path(
    get,
    path = "/flags/{name}",
    params(("name" = String, Path, description = "Flag name")),
    responses(
        (status = 200, description = "The flag with the titles carrying it", body = ApiResponse),
        (status = 404, description = "Unknown flag", body = ApiResponse)
    )
)]
pub async fn get_flag_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    reply("get_flag", StatusCode::OK, state.movies.get_flag(&name).await)
}

/// Removes the flag from every movie. The flag itself stays, unattached.
#[utoipa::path(
    delete,
    path = "/flags/{name}",
    params(("name" = String, Path, description = "Flag name")),
    responses(
        (status = 200, description = "Flag cleared from all movies", body = ApiResponse),
        (status = 404, description = "Unknown flag", body = ApiResponse)
    )
)]
pub async fn delete_flags_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let result = state
        .movies
        .delete_flags(&name)
        .await
        .map(|movies| json!({ "flagName": name, "moviesUpdated": movies }));
    reply("delete_flags", StatusCode::OK, result)
}

#[utoipa::path(
    delete,
    path = "/movies/{id}/flags/{name}",
    params(
        ("id" = String, Path, description = "Movie id"),
        ("name" = String, Path, description = "Flag name"),
        TitleQuery
    ),
    responses(
        (status = 200, description = "Flag removed from the movie", body = ApiResponse),
        (status = 400, description = "Missing title or title does not match the movie", body = ApiResponse),
        (status = 404, description = "Unknown movie or flag", body = ApiResponse)
    )
)]
pub async fn delete_flag_handler(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
    query: Result<Query<TitleQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(v) => v,
        Err(e) => return query_400(e, "?title=...").into_response(),
    };
    let result = state
        .movies
        .delete_flag(&name, &id, &query.title)
        .await
        .map(|()| json!({ "flagName": name, "movieId": id }));
    reply("delete_flag", StatusCode::OK, result)
}
