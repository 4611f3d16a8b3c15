//! End-to-end router tests against SQLite files in a temporary directory.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use snakes_api::{AppState, build_router};
use snakes_common::config::{ConnectionMode, DatabaseConfig};
use snakes_db::{Database, Param};
use tempfile::TempDir;
use tower::ServiceExt;

fn sqlite_config(url: String) -> DatabaseConfig {
    DatabaseConfig {
        url: Some(url),
        driver: "sqlite".into(),
        host: None,
        port: None,
        user: None,
        password: None,
        name: None,
        mode: ConnectionMode::Pool,
        fail_fast: Some(true),
        max_connections: 5,
        min_connections: 0,
        connect_timeout_secs: 5,
        acquire_timeout_secs: 5,
        ssl: false,
        reprobe_on_failure: true,
    }
}

fn app(db: Database) -> Router {
    build_router(AppState {
        db,
        environment: "test".into(),
        database_url_set: true,
        reprobe_on_failure: true,
    })
}

/// A pooled database with a seeded `snakes` table. Keep the `TempDir` alive.
async fn seeded() -> (TempDir, Database, Vec<Value>) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("zoo.db").display());
    let db = Database::connect(&sqlite_config(url)).await.unwrap();

    db.execute(
        "CREATE TABLE snakes (id INTEGER PRIMARY KEY, name TEXT NOT NULL, venomous INTEGER, length_m REAL)",
        &[],
    )
    .await
    .unwrap();

    let rows = vec![
        json!({ "id": 1, "name": "Ball python", "venomous": 0, "length_m": 1.2 }),
        json!({ "id": 3, "name": "King cobra", "venomous": 1, "length_m": 5.5 }),
        json!({ "id": 5, "name": "Green mamba", "venomous": 1, "length_m": 2.0 }),
        json!({ "id": 8, "name": "Corn snake", "venomous": 0, "length_m": null }),
    ];
    for row in &rows {
        let length = match row["length_m"].as_f64() {
            Some(v) => format!("{v}"),
            None => "NULL".into(),
        };
        db.execute(
            &format!("INSERT INTO snakes (id, name, venomous, length_m) VALUES (?, ?, ?, {length})"),
            &[
                Param::Int(row["id"].as_i64().unwrap()),
                Param::Text(row["name"].as_str().unwrap().into()),
                Param::Int(row["venomous"].as_i64().unwrap()),
            ],
        )
        .await
        .unwrap();
    }

    (dir, db, rows)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri).await
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn list_returns_exactly_the_inserted_rows() {
    let (_dir, db, rows) = seeded().await;
    let app = app(db);

    let (status, body) = get(&app, "/api/snakes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(rows));
}

#[tokio::test]
async fn get_by_id_returns_the_row() {
    let (_dir, db, rows) = seeded().await;
    let app = app(db);

    let (status, body) = get(&app, "/api/snakes/5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, rows[2]);
}

#[tokio::test]
async fn get_by_missing_id_is_404() {
    let (_dir, db, _) = seeded().await;
    let app = app(db);

    let (status, body) = get(&app, "/api/snakes/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Snake not found" }));

    let (status, body) = get(&app, "/api/snakes/cobra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Snake not found" }));
}

#[tokio::test]
async fn unreachable_store_is_500_without_crashing() {
    for db in [
        Database::disconnected("no DATABASE_URL"),
        Database::connect(&DatabaseConfig {
            fail_fast: Some(false),
            acquire_timeout_secs: 1,
            ..sqlite_config("sqlite:///nonexistent-directory/zoo.db".into())
        })
        .await
        .unwrap(),
    ] {
        let app = app(db);

        for uri in ["/api/snakes", "/api/snakes/5"] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(body["error"], "Database query failed");
            assert!(body["message"].is_string());
        }

        // Still serving afterwards.
        let (status, _) = get(&app, "/api/test").await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn pool_wait_timeout_is_500_naming_the_timeout() {
    // Nothing listens on port 1, so every connect attempt is refused and the
    // pool keeps retrying until its wait bound runs out.
    let db = Database::connect(&DatabaseConfig {
        driver: "mysql".into(),
        fail_fast: Some(false),
        acquire_timeout_secs: 1,
        ..sqlite_config("mysql://snakes@127.0.0.1:1/zoo".into())
    })
    .await
    .unwrap();
    let app = app(db);

    let (status, body) = get(&app, "/api/snakes").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database query failed");
    assert!(
        body["message"].as_str().unwrap().contains("timed out"),
        "{body}"
    );

    let (status, body) = get(&app, "/api/db-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disconnected");
}

#[tokio::test]
async fn query_failure_reports_driver_message() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("empty.db").display());
    let app = app(Database::connect(&sqlite_config(url)).await.unwrap());

    let (status, body) = get(&app, "/api/snakes").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database query failed");
    assert!(body["message"].as_str().unwrap().contains("snakes"));
}

#[tokio::test]
async fn test_endpoint_ignores_database_state() {
    let app = app(Database::disconnected("down"));

    let (status, body) = get(&app, "/api/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["environment"], "test");
    assert!(body["message"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn db_status_reports_connectivity() {
    let (_dir, db, _) = seeded().await;
    let (status, body) = get(&app(db), "/api/db-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["database_url_set"], true);
    assert!(body["timestamp"].is_string());

    let (status, body) = get(&app(Database::disconnected("down")), "/api/db-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disconnected");
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = app(Database::disconnected("down"));

    for uri in ["/api/unknown", "/", "/api/snakes/5/venom"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn unsupported_methods_are_404() {
    let app = app(Database::disconnected("down"));

    for (method, uri) in [
        (Method::POST, "/api/snakes"),
        (Method::DELETE, "/api/snakes/5"),
        (Method::PUT, "/api/test"),
        (Method::PATCH, "/api/db-status"),
    ] {
        let (status, body) = send(&app, method.clone(), uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body, json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn undecodable_id_segment_is_json_400() {
    let app = app(Database::disconnected("down"));

    let (status, body) = get(&app, "/api/snakes/%FF").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad request");
    assert!(body["message"].as_str().unwrap().contains("UTF-8"), "{body}");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = app(Database::disconnected("down"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test")
                .header(header::ORIGIN, "http://zoo.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lists_are_independent() {
    let (_dir, db, rows) = seeded().await;
    let app = app(db);
    let expected = Value::Array(rows);

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(&app, "/api/snakes").await })
        })
        .collect();

    for handle in handles {
        let (status, body) = handle.await.expect("request task panicked");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, expected);
    }
}
