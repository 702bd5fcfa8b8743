use crate::app::NewTag;
use crate::transport::http::handlers::common::reply;
use crate::transport::http::types::{json_422, ApiResponse, AppState, CreateTagRequest, TagDto};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagDto),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 409, description = "User already used this tag on the movie", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_tag_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateTagRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"tagName\", \"movieId\", \"userName\", \"privacy\"?}")
                .into_response()
        }
    };
    let result = state
        .tags
        .create_tag(NewTag {
            tag_name: request.tag_name,
            movie_id: request.movie_id,
            user_name: request.user_name,
            privacy: request.privacy,
        })
        .await
        .map(TagDto::from);
    reply("create_tag", StatusCode::CREATED, result)
}

#[utoipa::path(
    get,
    path = "/movies/{id}/tags",
    params(("id" = String, Path, description = "Movie id")),
    responses((status = 200, description = "Tags on the movie", body = [TagDto]))
)]
pub async fn movie_tags_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let result = state
        .tags
        .tags_with_movie_id(&id)
        .await
        .map(|tags| tags.into_iter().map(TagDto::from).collect::<Vec<_>>());
    reply("tags_with_movie_id", StatusCode::OK, result)
}
