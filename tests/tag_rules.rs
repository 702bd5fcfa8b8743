use reel_rating::app::{MovieService, NewMovie, NewTag, ServiceError, TagService};
use reel_rating::domain::model::Collection;
use reel_rating::storage::docs::{DocumentStore, InMemoryDocumentStore};
use std::sync::Arc;

async fn setup() -> (InMemoryDocumentStore, MovieService, TagService) {
    let store = InMemoryDocumentStore::new();
    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let movies = MovieService::new(shared.clone());
    let tags = TagService::new(shared);
    movies
        .create_movie(NewMovie {
            id: "m1".into(),
            title: "Up".into(),
            ..NewMovie::default()
        })
        .await
        .unwrap();
    (store, movies, tags)
}

fn tag(name: &str, user: &str, movie_id: &str) -> NewTag {
    NewTag {
        tag_name: name.into(),
        movie_id: movie_id.into(),
        user_name: user.into(),
        privacy: "private".into(),
    }
}

#[tokio::test]
async fn tag_triple_is_created_once() {
    let (store, movies, tags) = setup().await;

    let created = tags.create_tag(tag("cozy", "alice", "m1")).await.unwrap();
    assert_eq!(created.movie_title, "Up");
    assert_eq!(created.privacy, "private");

    assert!(matches!(
        tags.create_tag(tag("cozy", "alice", "m1")).await,
        Err(ServiceError::Conflict(_))
    ));
    tags.create_tag(tag("cozy", "bob", "m1")).await.unwrap();
    tags.create_tag(tag("tearjerker", "alice", "m1")).await.unwrap();

    assert_eq!(store.documents(Collection::Tags).await.len(), 3);
    assert_eq!(
        movies.get_movie("m1").await.unwrap().tag_names,
        vec!["cozy".to_string(), "tearjerker".to_string()]
    );
}

#[tokio::test]
async fn tagging_an_unknown_movie_is_not_found() {
    let (store, _movies, tags) = setup().await;
    assert!(matches!(
        tags.create_tag(tag("cozy", "alice", "m404")).await,
        Err(ServiceError::NotFound { entity: "movie", .. })
    ));
    assert!(matches!(
        tags.create_tag(tag(" ", "alice", "m1")).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(store.documents(Collection::Tags).await.is_empty());
}

#[tokio::test]
async fn uniqueness_follows_the_movie_through_a_rename() {
    let (_store, movies, tags) = setup().await;
    tags.create_tag(tag("cozy", "alice", "m1")).await.unwrap();
    movies.rename_movie("m1", "Up (2009)").await.unwrap();

    assert!(matches!(
        tags.create_tag(tag("cozy", "alice", "m1")).await,
        Err(ServiceError::Conflict(_))
    ));
    let listed = tags.tags_with_movie_id("m1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].movie_title, "Up (2009)");
}

#[tokio::test]
async fn concurrent_identical_tags_store_one_document() {
    let (store, movies, tags) = setup().await;

    let (first, second) = tokio::join!(
        tags.create_tag(tag("cozy", "alice", "m1")),
        tags.create_tag(tag("cozy", "alice", "m1")),
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
    assert_eq!(store.documents(Collection::Tags).await.len(), 1);
    assert_eq!(movies.get_movie("m1").await.unwrap().tag_names, vec!["cozy".to_string()]);
}
