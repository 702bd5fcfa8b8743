//! Rating creation rules, popularity summary and score updates against the
//! in-memory store.

use reel_rating::app::{MovieService, NewMovie, NewRating, RatingService, ServiceError};
use reel_rating::domain::model::Collection;
use reel_rating::storage::docs::{to_document, DocumentStore, InMemoryDocumentStore};
use serde_json::json;
use std::sync::Arc;

struct Fixture {
    store: InMemoryDocumentStore,
    movies: MovieService,
    ratings: RatingService,
}

async fn fixture() -> Fixture {
    let store = InMemoryDocumentStore::new();
    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let movies = MovieService::new(shared.clone());
    let ratings = RatingService::new(shared);
    movies
        .create_movie(NewMovie {
            id: "m1".into(),
            title: "Up".into(),
            ..NewMovie::default()
        })
        .await
        .unwrap();
    Fixture {
        store,
        movies,
        ratings,
    }
}

fn rating(name: &str, score: &str, upperbound: &str, user: &str) -> NewRating {
    NewRating {
        rating_name: name.into(),
        user_rating: score.into(),
        upperbound: upperbound.into(),
        user_name: user.into(),
        movie_id: "m1".into(),
        privacy: "public".into(),
    }
}

#[tokio::test]
async fn identical_rating_is_created_once() {
    let f = fixture().await;

    let created = f
        .ratings
        .create_rating(rating("Whimsy", "8", "10", "alice"))
        .await
        .unwrap();
    assert_eq!(created.movie_title, "Up");
    assert_eq!(created.user_rating, "8");

    assert!(matches!(
        f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await,
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(f.store.documents(Collection::Ratings).await.len(), 1);

    let movie = f.movies.get_movie("m1").await.unwrap();
    assert_eq!(movie.rating_category_names, vec!["Whimsy".to_string()]);
}

#[tokio::test]
async fn uniqueness_is_per_user_name_scale_and_movie() {
    let f = fixture().await;
    f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await.unwrap();

    // each differs from the first in one tuple component
    f.ratings.create_rating(rating("Whimsy", "8", "10", "bob")).await.unwrap();
    f.ratings.create_rating(rating("Gore", "8", "10", "alice")).await.unwrap();
    f.ratings.create_rating(rating("Whimsy", "4", "5", "alice")).await.unwrap();

    // a different score does not make it a new rating
    assert!(matches!(
        f.ratings.create_rating(rating("Whimsy", "3", "10", "alice")).await,
        Err(ServiceError::Conflict(_))
    ));
    // padded numbers are the same scale
    assert!(matches!(
        f.ratings.create_rating(rating("Whimsy", "3", " 10", "alice")).await,
        Err(ServiceError::Conflict(_))
    ));

    let movie = f.movies.get_movie("m1").await.unwrap();
    assert_eq!(
        movie.rating_category_names,
        vec!["Whimsy".to_string(), "Gore".to_string()]
    );
}

#[tokio::test]
async fn score_must_lie_within_the_scale() {
    let f = fixture().await;

    for (score, upperbound) in [("0", "10"), ("11", "10"), ("-1", "5")] {
        assert!(matches!(
            f.ratings.create_rating(rating("Whimsy", score, upperbound, "alice")).await,
            Err(ServiceError::InvalidRange { .. })
        ));
    }
    assert!(matches!(
        f.ratings.create_rating(rating("Whimsy", "eight", "10", "alice")).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        f.ratings.create_rating(rating("Whimsy", "1", "0", "alice")).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(f.store.documents(Collection::Ratings).await.is_empty());

    f.ratings.create_rating(rating("Whimsy", "1", "1", "alice")).await.unwrap();
    f.ratings.create_rating(rating("Whimsy", "100", "100", "alice")).await.unwrap();
}

#[tokio::test]
async fn rating_an_unknown_movie_is_not_found() {
    let f = fixture().await;
    let mut new = rating("Whimsy", "8", "10", "alice");
    new.movie_id = "m404".into();

    assert!(matches!(
        f.ratings.create_rating(new).await,
        Err(ServiceError::NotFound { entity: "movie", .. })
    ));
    assert!(f.store.documents(Collection::Ratings).await.is_empty());
}

#[tokio::test]
async fn interrupted_creation_leaves_no_rating() {
    let f = fixture().await;

    // insert succeeds, registering the category on the movie fails
    f.store.fail_writes_after(1);
    assert!(matches!(
        f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await,
        Err(ServiceError::Store(_))
    ));
    f.store.clear_faults();

    assert!(f.store.documents(Collection::Ratings).await.is_empty());
    assert!(f.movies.get_movie("m1").await.unwrap().rating_category_names.is_empty());
}

#[tokio::test]
async fn most_popular_picks_mode_name_then_mode_scale() {
    let f = fixture().await;
    for (name, score, user) in [("A", "5", "u1"), ("A", "7", "u2"), ("A", "3", "u3"), ("B", "8", "u4")] {
        f.ratings.create_rating(rating(name, score, "10", user)).await.unwrap();
    }

    let popular = f.ratings.most_popular_for_movie("m1").await.unwrap();
    assert_eq!(popular.rating_name, "A");
    assert_eq!(popular.upperbound, "10");
    assert_eq!(popular.average, 5.0);
    assert_eq!(popular.sample_size, 3);
}

#[tokio::test]
async fn most_popular_without_ratings_is_explicit() {
    let f = fixture().await;
    assert!(matches!(
        f.ratings.most_popular_for_movie("m1").await,
        Err(ServiceError::NoRatings { movie_id }) if movie_id == "m1"
    ));
}

#[tokio::test]
async fn read_projections_filter_by_name_scale_and_movie() {
    let f = fixture().await;
    f.movies
        .create_movie(NewMovie {
            id: "m2".into(),
            title: "Heat".into(),
            ..NewMovie::default()
        })
        .await
        .unwrap();
    f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await.unwrap();
    f.ratings.create_rating(rating("Whimsy", "4", "5", "bob")).await.unwrap();
    let mut on_heat = rating("Whimsy", "2", "10", "carol");
    on_heat.movie_id = "m2".into();
    f.ratings.create_rating(on_heat).await.unwrap();

    assert_eq!(f.ratings.ratings_with_same_name("Whimsy").await.unwrap().len(), 3);
    let out_of_ten = f
        .ratings
        .ratings_with_same_name_and_upperbound("Whimsy", "10")
        .await
        .unwrap();
    let users: Vec<_> = out_of_ten.iter().map(|r| r.user_name.as_str()).collect();
    assert_eq!(users, vec!["alice", "carol"]);
    assert_eq!(f.ratings.ratings_with_movie_id("m2").await.unwrap().len(), 1);
    assert!(f.ratings.ratings_with_same_name("Gore").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_user_rating_revalidates_and_syncs_the_user_copy() {
    let f = fixture().await;
    let created = f
        .ratings
        .create_rating(rating("Whimsy", "8", "10", "alice"))
        .await
        .unwrap();

    // the user-facing copy is written by another service; seed it directly
    let mut tx = f.store.begin().await.unwrap();
    tx.insert_one(
        Collection::UserAssociatedRatings,
        to_document(&created).unwrap(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert!(matches!(
        f.ratings.update_user_rating("alice", "Whimsy", "Up", "11").await,
        Err(ServiceError::InvalidRange { user_rating: 11, upperbound: 10 })
    ));
    assert!(matches!(
        f.ratings.update_user_rating("bob", "Whimsy", "Up", "3").await,
        Err(ServiceError::NotFound { .. })
    ));

    let updated = f
        .ratings
        .update_user_rating("alice", "Whimsy", "Up", "3")
        .await
        .unwrap();
    assert_eq!(updated.user_rating, "3");
    assert_eq!(updated.id, created.id);

    for collection in [Collection::Ratings, Collection::UserAssociatedRatings] {
        let docs = f.store.documents(collection).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["userRating"], json!("3"));
    }
}

#[tokio::test]
async fn renamed_movie_ratings_follow_the_new_title() {
    let f = fixture().await;
    f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await.unwrap();
    f.movies.rename_movie("m1", "Up!").await.unwrap();

    let ratings = f.ratings.ratings_with_movie_id("m1").await.unwrap();
    assert_eq!(ratings[0].movie_title, "Up!");
    f.ratings
        .update_user_rating("alice", "Whimsy", "Up!", "9")
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_identical_ratings_store_one_document() {
    let f = fixture().await;

    let (first, second) = tokio::join!(
        f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")),
        f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::Conflict(_))))
            .count(),
        1
    );
    assert_eq!(f.store.documents(Collection::Ratings).await.len(), 1);
}

#[tokio::test]
async fn huge_scales_still_summarize() {
    let f = fixture().await;
    let max = i64::MAX.to_string();
    for user in ["alice", "bob"] {
        f.ratings.create_rating(rating("Whimsy", &max, &max, user)).await.unwrap();
    }

    let popular = f.ratings.most_popular_for_movie("m1").await.unwrap();
    assert_eq!(popular.average, 9.223372036854776e18);
    assert_eq!(popular.upperbound, max);
}

#[tokio::test]
async fn renaming_a_category_carries_into_ratings_copies_and_movie() {
    let f = fixture().await;
    let kept = f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await.unwrap();
    f.ratings.create_rating(rating("Whimsy", "4", "5", "bob")).await.unwrap();
    f.ratings.create_rating(rating("Gore", "2", "10", "alice")).await.unwrap();

    let mut tx = f.store.begin().await.unwrap();
    tx.insert_one(Collection::UserAssociatedRatings, to_document(&kept).unwrap())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let renamed = f
        .ratings
        .rename_rating_category("m1", "Whimsy", "Charm")
        .await
        .unwrap();
    assert_eq!(renamed.ratings_updated, 2);
    assert_eq!(renamed.copies_updated, 1);

    assert!(f.ratings.ratings_with_same_name("Whimsy").await.unwrap().is_empty());
    assert_eq!(f.ratings.ratings_with_same_name("Charm").await.unwrap().len(), 2);
    assert_eq!(
        f.store.documents(Collection::UserAssociatedRatings).await[0]["ratingName"],
        json!("Charm")
    );
    assert_eq!(
        f.movies.get_movie("m1").await.unwrap().rating_category_names,
        vec!["Charm".to_string(), "Gore".to_string()]
    );
    assert_eq!(
        f.ratings.most_popular_for_movie("m1").await.unwrap().rating_name,
        "Charm"
    );
}

#[tokio::test]
async fn renaming_a_category_onto_an_existing_rating_conflicts() {
    let f = fixture().await;
    f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await.unwrap();
    f.ratings.create_rating(rating("Charm", "6", "10", "alice")).await.unwrap();
    // bob's rating could move, but alice's would duplicate her Charm rating
    f.ratings.create_rating(rating("Whimsy", "3", "10", "bob")).await.unwrap();

    assert!(matches!(
        f.ratings.rename_rating_category("m1", "Whimsy", "Charm").await,
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(f.ratings.ratings_with_same_name("Whimsy").await.unwrap().len(), 2);
    assert_eq!(
        f.movies.get_movie("m1").await.unwrap().rating_category_names,
        vec!["Whimsy".to_string(), "Charm".to_string()]
    );

    // the same user on another scale is a different tuple
    f.ratings.create_rating(rating("Gore", "4", "5", "alice")).await.unwrap();
    f.ratings.rename_rating_category("m1", "Gore", "Charm").await.unwrap();
    assert_eq!(
        f.movies.get_movie("m1").await.unwrap().rating_category_names,
        vec!["Whimsy".to_string(), "Charm".to_string()]
    );
}

#[tokio::test]
async fn renaming_an_unknown_category_is_not_found() {
    let f = fixture().await;
    f.ratings.create_rating(rating("Whimsy", "8", "10", "alice")).await.unwrap();

    assert!(matches!(
        f.ratings.rename_rating_category("m1", "Gore", "Charm").await,
        Err(ServiceError::NotFound { entity: "rating category", .. })
    ));
    assert!(matches!(
        f.ratings.rename_rating_category("m404", "Whimsy", "Charm").await,
        Err(ServiceError::NotFound { entity: "movie", .. })
    ));
    assert!(matches!(
        f.ratings.rename_rating_category("m1", "Whimsy", " ").await,
        Err(ServiceError::InvalidInput(_))
    ));
    let unchanged = f
        .ratings
        .rename_rating_category("m1", "Whimsy", "Whimsy")
        .await
        .unwrap();
    assert_eq!(unchanged.ratings_updated, 0);
}
