use crate::transport::http::handlers::{actors, flags, health, movies, ratings, reviews, tags};
use crate::transport::http::types::{
    ActorMoviesRequest, ApiResponse, AppState, CreateActorRequest, CreateFlagRequest,
    CreateMovieRequest, CreateRatingRequest, CreateReviewRequest, CreateTagRequest,
    PopularRatingDto, RatingDto, RenameMovieRequest, RenameRatingCategoryRequest, ReviewDto,
    TagDto, UpdateActorRequest, UpdateMovieRequest, UpdateRatingRequest, UpdateReviewRequest,
};
use axum::routing::{delete, get, post, put};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        movies::create_movie_handler,
        movies::list_movies_handler,
        movies::get_movie_handler,
        movies::update_movie_handler,
        movies::rename_movie_handler,
        movies::delete_movie_handler,
        actors::create_actor_handler,
        actors::get_actor_handler,
        actors::update_actor_handler,
        actors::replace_actor_movies_handler,
        actors::delete_actor_handler,
        flags::create_flag_handler,
        flags::get_flag_handler,
        flags::delete_flags_handler,
        flags::delete_flag_handler,
        reviews::create_review_handler,
        reviews::list_reviews_handler,
        reviews::update_review_handler,
        reviews::delete_review_handler,
        ratings::create_rating_handler,
        ratings::list_ratings_handler,
        ratings::update_rating_handler,
        ratings::movie_ratings_handler,
        ratings::popular_rating_handler,
        ratings::rename_rating_category_handler,
        tags::create_tag_handler,
        tags::movie_tags_handler
    ),
    components(schemas(
        ApiResponse,
        CreateMovieRequest,
        UpdateMovieRequest,
        RenameMovieRequest,
        CreateActorRequest,
        UpdateActorRequest,
        ActorMoviesRequest,
        CreateFlagRequest,
        CreateReviewRequest,
        UpdateReviewRequest,
        ReviewDto,
        CreateRatingRequest,
        UpdateRatingRequest,
        RatingDto,
        PopularRatingDto,
        RenameRatingCategoryRequest,
        CreateTagRequest,
        TagDto
    )),
    tags(
        (name = "reel-rating", description = "Movie and rating data services")
    )
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        // movie data service
        .route(
            "/movies",
            post(movies::create_movie_handler).get(movies::list_movies_handler),
        )
        .route(
            "/movies/:id",
            get(movies::get_movie_handler)
                .patch(movies::update_movie_handler)
                .delete(movies::delete_movie_handler),
        )
        .route("/movies/:id/title", put(movies::rename_movie_handler))
        .route("/movies/:id/flags/:name", delete(flags::delete_flag_handler))
        .route("/actors", post(actors::create_actor_handler))
        .route(
            "/actors/:id",
            get(actors::get_actor_handler)
                .patch(actors::update_actor_handler)
                .delete(actors::delete_actor_handler),
        )
        .route("/actors/:id/movies", put(actors::replace_actor_movies_handler))
        .route("/flags", post(flags::create_flag_handler))
        .route(
            "/flags/:name",
            get(flags::get_flag_handler).delete(flags::delete_flags_handler),
        )
        .route(
            "/reviews",
            post(reviews::create_review_handler)
                .get(reviews::list_reviews_handler)
                .patch(reviews::update_review_handler)
                .delete(reviews::delete_review_handler),
        )
        // rating data service
        .route(
            "/ratings",
            post(ratings::create_rating_handler)
                .get(ratings::list_ratings_handler)
                .patch(ratings::update_rating_handler),
        )
        .route("/movies/:id/ratings", get(ratings::movie_ratings_handler))
        .route("/movies/:id/ratings/popular", get(ratings::popular_rating_handler))
        .route(
            "/movies/:id/ratings/categories/:name",
            put(ratings::rename_rating_category_handler),
        )
        .route("/tags", post(tags::create_tag_handler))
        .route("/movies/:id/tags", get(tags::movie_tags_handler))
        .with_state(app_state)
}
