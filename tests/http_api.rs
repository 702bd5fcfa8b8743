//! Drives the router over real HTTP on an ephemeral port, backed by the
//! in-memory store.

use reel_rating::storage::docs::InMemoryDocumentStore;
use reel_rating::transport;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

async fn spawn_app() -> Result<String, Box<dyn std::error::Error>> {
    let app_state = transport::http::AppState::new(Arc::new(InMemoryDocumentStore::new()));
    let router = transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts if an API server is already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

async fn body(resp: reqwest::Response) -> JsonValue {
    resp.json::<JsonValue>().await.unwrap()
}

#[tokio::test]
async fn health_reports_ok() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app().await?;
    let resp = reqwest::get(format!("{}/health", base_url)).await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(body(resp).await["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn movie_rating_and_tag_flow() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/movies", base_url))
        .json(&json!({"id": "m1", "title": "Up", "director": "Pete Docter"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let created = body(resp).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["title"], "Up");
    assert_eq!(created["data"]["flagNames"], json!([]));

    // scenario: the same rating twice
    let rating = json!({
        "ratingName": "Whimsy",
        "userRating": "8",
        "upperbound": "10",
        "userName": "alice",
        "movieId": "m1",
        "privacy": "public"
    });
    let resp = client.post(format!("{}/ratings", base_url)).json(&rating).send().await?;
    assert_eq!(resp.status(), 201);
    assert_eq!(body(resp).await["data"]["movieTitle"], "Up");
    let resp = client.post(format!("{}/ratings", base_url)).json(&rating).send().await?;
    assert_eq!(resp.status(), 409);
    let rejected = body(resp).await;
    assert_eq!(rejected["success"], false);
    assert!(rejected["error"].as_str().unwrap_or_default().contains("alice"));

    let resp = client
        .post(format!("{}/ratings", base_url))
        .json(&json!({
            "ratingName": "Whimsy",
            "userRating": "11",
            "upperbound": "10",
            "userName": "bob",
            "movieId": "m1"
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{}/movies/m1/ratings/popular", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let popular = body(resp).await;
    assert_eq!(popular["data"]["ratingName"], "Whimsy");
    assert_eq!(popular["data"]["userRating"], "8.0");

    let resp = client
        .get(format!("{}/ratings?ratingName=Whimsy&upperbound=10", base_url))
        .send()
        .await?;
    assert_eq!(body(resp).await["data"].as_array().map(Vec::len), Some(1));

    let resp = client
        .post(format!("{}/tags", base_url))
        .json(&json!({"tagName": "cozy", "movieId": "m1", "userName": "alice"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let resp = client.get(format!("{}/movies/m1/tags", base_url)).send().await?;
    assert_eq!(body(resp).await["data"][0]["tagName"], "cozy");

    let resp = client.get(format!("{}/movies/m1", base_url)).send().await?;
    let movie = body(resp).await;
    assert_eq!(movie["data"]["ratingCategoryNames"], json!(["Whimsy"]));
    assert_eq!(movie["data"]["tagNames"], json!(["cozy"]));
    Ok(())
}

#[tokio::test]
async fn rename_and_delete_cascade_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app().await?;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/movies", base_url))
        .json(&json!({"id": "m1", "title": "Up"}))
        .send()
        .await?;
    let resp = client
        .post(format!("{}/actors", base_url))
        .json(&json!({"id": "a1", "name": "Ed Asner", "movieTitle": "Up", "movieId": "m1"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let resp = client
        .post(format!("{}/flags", base_url))
        .json(&json!({"flagName": "family", "movieTitle": "Up", "movieId": "m1"}))
        .send()
        .await?;
    assert_eq!(body(resp).await["data"]["change"], "created");
    client
        .post(format!("{}/reviews", base_url))
        .json(&json!({
            "movieTitle": "Up",
            "movieId": "m1",
            "reviewTitle": "Balloons",
            "reviewDescription": "Lovely",
            "userName": "alice"
        }))
        .send()
        .await?;

    let resp = client
        .put(format!("{}/movies/m1/title", base_url))
        .json(&json!({"title": "Up 2"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let resp = client.get(format!("{}/actors/a1", base_url)).send().await?;
    assert_eq!(body(resp).await["data"]["movies"], json!(["Up 2"]));
    let resp = client.get(format!("{}/flags/family", base_url)).send().await?;
    assert_eq!(body(resp).await["data"]["movieTitles"], json!(["Up 2"]));
    let resp = client
        .get(format!("{}/reviews?movieTitle=Up%202", base_url))
        .send()
        .await?;
    let reviews = body(resp).await;
    assert_eq!(
        reviews["data"],
        json!([{"movieTitle": "Up 2", "reviewTitle": "Balloons", "reviewDescription": "Lovely"}])
    );

    // stale title is refused
    let resp = client
        .delete(format!("{}/movies/m1?title=Up", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    let resp = client
        .delete(format!("{}/movies/m1?title=Up%202", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(body(resp).await["data"]["reviewsDeleted"], 1);

    let resp = client.get(format!("{}/movies/m1", base_url)).send().await?;
    assert_eq!(resp.status(), 404);
    let resp = client.get(format!("{}/actors/a1", base_url)).send().await?;
    assert_eq!(body(resp).await["data"]["movies"], json!([]));
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_unprocessable() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/ratings", base_url))
        .header("content-type", "application/json")
        .body("{\"ratingName\": ")
        .send()
        .await?;
    assert_eq!(resp.status(), 422);
    let rejected = body(resp).await;
    assert_eq!(rejected["success"], false);
    assert!(rejected["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid JSON body"));

    let resp = client
        .get(format!("{}/movies/unknown/ratings/popular", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn rating_category_rename_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app().await?;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/movies", base_url))
        .json(&json!({"id": "m1", "title": "Up"}))
        .send()
        .await?;
    client
        .post(format!("{}/ratings", base_url))
        .json(&json!({
            "ratingName": "Whimsy",
            "userRating": "8",
            "upperbound": "10",
            "userName": "alice",
            "movieId": "m1"
        }))
        .send()
        .await?;

    let resp = client
        .put(format!("{}/movies/m1/ratings/categories/Whimsy", base_url))
        .json(&json!({"ratingName": "Charm"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(body(resp).await["data"]["ratingsUpdated"], 1);

    let resp = client.get(format!("{}/movies/m1", base_url)).send().await?;
    assert_eq!(body(resp).await["data"]["ratingCategoryNames"], json!(["Charm"]));

    let resp = client
        .put(format!("{}/movies/m1/ratings/categories/Whimsy", base_url))
        .json(&json!({"ratingName": "Charm"}))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn missing_query_parameters_answer_in_the_envelope() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = spawn_app().await?;
    let client = reqwest::Client::new();

    for url in [
        format!("{}/movies/m1", base_url),
        format!("{}/movies/m1/flags/family", base_url),
        format!("{}/reviews?movieTitle=Up", base_url),
    ] {
        let resp = client.delete(&url).send().await?;
        assert_eq!(resp.status(), 400, "{url}");
        let rejected = body(resp).await;
        assert_eq!(rejected["success"], false);
        assert!(rejected["error"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Invalid query string"));
    }

    let resp = client.get(format!("{}/ratings", base_url)).send().await?;
    assert_eq!(resp.status(), 400);
    assert_eq!(body(resp).await["success"], false);
    Ok(())
}
