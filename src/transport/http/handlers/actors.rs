use crate::app::{ActorPatch, NewActor};
use crate::transport::http::handlers::common::reply;
use crate::transport::http::types::{
    json_422, ActorMoviesRequest, ApiResponse, AppState, CreateActorRequest, UpdateActorRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Creates an actor credited on one movie and adds them to its cast.
#[utoipa::path(
    post,
    path = "/actors",
    request_body = CreateActorRequest,
    responses(
        (status = 201, description = "Actor created", body = ApiResponse),
        (status = 400, description = "Title does not match the movie", body = ApiResponse),
        (status = 404, description = "Unknown movie", body = ApiResponse),
        (status = 409, description = "Actor id already in use", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn create_actor_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateActorRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"id\", \"name\", \"dob\"?, \"movieTitle\", \"movieId\"}",
            )
            .into_response()
        }
    };
    let result = state
        .movies
        .create_actor(NewActor {
            id: request.id,
            name: request.name,
            dob: request.dob,
            movie_title: request.movie_title,
            movie_id: request.movie_id,
        })
        .await;
    reply("create_actor", StatusCode::CREATED, result)
}

#[utoipa::path(
    get,
    path = "/actors/{id}",
    params(("id" = String, Path, description = "Actor id")),
    responses(
        (status = 200, description = "The actor", body = ApiResponse),
        (status = 404, description = "Unknown actor", body = ApiResponse)
    )
)]
pub async fn get_actor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    reply("get_actor", StatusCode::OK, state.movies.get_actor(&id).await)
}

#[utoipa::path(
    patch,
    path = "/actors/{id}",
    params(("id" = String, Path, description = "Actor id")),
    request_body = UpdateActorRequest,
    responses(
        (status = 200, description = "Updated actor", body = ApiResponse),
        (status = 404, description = "Unknown actor", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_actor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<UpdateActorRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"name\"?, \"dob\"?, \"movies\"?}").into_response(),
    };
    let patch = ActorPatch {
        name: request.name,
        dob: request.dob,
        movies: request.movies,
    };
    reply("update_actor", StatusCode::OK, state.movies.update_actor(&id, patch).await)
}

/// Replaces the actor's movie list outright.
#[utoipa::path(
    put,
    path = "/actors/{id}/movies",
    params(("id" = String, Path, description = "Actor id")),
    request_body = ActorMoviesRequest,
    responses(
        (status = 200, description = "Updated actor", body = ApiResponse),
        (status = 404, description = "Unknown actor", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn replace_actor_movies_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<ActorMoviesRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"movies\": [\"...\"]}").into_response(),
    };
    reply(
        "update_actor_movie_list",
        StatusCode::OK,
        state.movies.update_actor_movie_list(&id, request.movies).await,
    )
}

#[utoipa::path(
    delete,
    path = "/actors/{id}",
    params(("id" = String, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Actor deleted", body = ApiResponse),
        (status = 404, description = "Unknown actor", body = ApiResponse)
    )
)]
pub async fn delete_actor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let result = state
        .movies
        .delete_actor(&id)
        .await
        .map(|()| json!({ "actorId": id }));
    reply("delete_actor", StatusCode::OK, result)
}
