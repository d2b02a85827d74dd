// tests/api_tests.rs

use quiz_results::{config::Config, db::AttemptStore, routes, state::AppState};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use std::path::PathBuf;

const TEACHER_KEY: &str = "open-sesame";

struct TestApp {
    address: String,
    key_path: PathBuf,
}

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app() -> TestApp {
    // 1. In-memory database, one connection so every request sees the same data
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    let store = AttemptStore::from_pool(pool);
    store.initialize().await.expect("Failed to migrate database");

    // 2. Teacher key file with surrounding whitespace, as editors leave it
    let key_path = std::env::temp_dir().join(format!("teacher_key_{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&key_path, format!("{}\n", TEACHER_KEY)).expect("Failed to write key file");

    // 3. Test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        teacher_key_path: key_path.clone(),
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
        port: 0,
        allowed_origins: vec!["http://localhost:3000".to_string()],
        rust_log: "error".to_string(),
    };

    let app = routes::create_router(AppState { store, config });

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        key_path,
    }
}

fn submission(first: &str, level: &str, score: i64, total: usize) -> Value {
    let answers: Vec<Value> = (0..total)
        .map(|i| {
            json!({
                "question": i + 1,
                "userAnswer": "a",
                "correctAnswer": if (i as i64) < score { "a" } else { "b" },
                "isCorrect": (i as i64) < score
            })
        })
        .collect();

    json!({
        "firstName": first,
        "lastName": "Petrova",
        "className": "10B",
        "city": "Kazan",
        "school": "Lyceum 2",
        "answers": answers,
        "testLevel": level,
        "score": score,
        "time": 300
    })
}

async fn submit(client: &reqwest::Client, app: &TestApp, body: &Value) -> reqwest::Response {
    client
        .post(format!("{}/api/submit-test", app.address))
        .json(body)
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn quiz_pages_are_served() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let index = client.get(&app.address).send().await.unwrap();
    assert_eq!(index.status().as_u16(), 200);

    let page = client
        .get(format!("{}/test/middle-school-student/hard", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status().as_u16(), 200);
    assert!(page.text().await.unwrap().contains("data-level=\"hard\""));

    // Legacy page name
    let legacy = client
        .get(format!("{}/test/high-school-student/first", app.address))
        .send()
        .await
        .unwrap();
    assert!(legacy.text().await.unwrap().contains("data-level=\"easy\""));

    let unknown = client
        .get(format!("{}/test/university-student/easy", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_then_check_and_fetch() {
    // Arrange
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let check_body = json!({
        "firstName": "Maria",
        "lastName": "Petrova",
        "className": "10B",
        "testLevel": "medium"
    });

    // 1. Nothing on record yet
    let before: Value = client
        .post(format!("{}/api/check-test", app.address))
        .json(&check_body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(before["status"], "ok");

    // 2. Submit
    let response = submit(&client, &app, &submission("Maria", "medium", 3, 4)).await;
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["status"], "success");
    let test_id = result["test_id"].as_i64().expect("test_id missing");

    // 3. Check reports the saved result
    let after: Value = client
        .post(format!("{}/api/check-test", app.address))
        .json(&check_body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["status"], "exists");
    assert_eq!(after["score"], 3);
    assert_eq!(after["max_score"], 4);

    // 4. Fetch by id, answers come back structured
    let attempt: Value = client
        .get(format!("{}/api/tests/{}", app.address, test_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["first_name"], "Maria");
    assert_eq!(attempt["answers"].as_array().unwrap().len(), 4);
    assert_eq!(attempt["answers"][3]["is_correct"], false);

    // 5. Listing contains it
    let all: Vec<Value> = client
        .get(format!("{}/api/tests", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let first = submit(&client, &app, &submission("Ivan", "easy", 2, 2)).await;
    assert_eq!(first.status().as_u16(), 200);

    let again = submit(&client, &app, &submission(" ivan ", "EASY", 2, 2)).await;
    assert_eq!(again.status().as_u16(), 409);

    let other_level = submit(&client, &app, &submission("Ivan", "hard", 1, 2)).await;
    assert_eq!(other_level.status().as_u16(), 200);
}

#[tokio::test]
async fn submit_validates_payload() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let mut missing_score = submission("Ivan", "easy", 2, 2);
    missing_score.as_object_mut().unwrap().remove("score");
    let response = submit(&client, &app, &missing_score).await;
    assert_eq!(response.status().as_u16(), 400);

    let mut blank_name = submission("Ivan", "easy", 2, 2);
    blank_name["lastName"] = json!("   ");
    let response = submit(&client, &app, &blank_name).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/submit-test", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/check-test", app.address))
        .json(&json!({
            "firstName": "   ",
            "lastName": "Petrova",
            "className": "10B",
            "testLevel": "easy"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/check-test", app.address))
        .json(&json!({ "firstName": "Ivan" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn missing_test_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/tests/12345", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn statistics_and_clear() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let empty: Value = client
        .get(format!("{}/api/statistics", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty["total_tests"], 0);
    assert_eq!(empty["average_score_percent"], 0.0);

    submit(&client, &app, &submission("Ann", "easy", 8, 10)).await;
    submit(&client, &app, &submission("Bob", "easy", 4, 10)).await;

    let stats: Value = client
        .get(format!("{}/api/statistics", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_tests"], 2);
    assert_eq!(stats["by_level"]["easy"]["average_score_percent"], 60.0);

    let cleared: Value = client
        .post(format!("{}/api/clear-database", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["deleted"], 2);

    let result: Value = submit(&client, &app, &submission("Cid", "easy", 1, 1))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(result["test_id"], 1);
}

#[tokio::test]
async fn verify_key_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/verify-key", app.address);

    submit(&client, &app, &submission("Ann", "easy", 1, 2)).await;

    // Missing key
    let response = client.post(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Wrong key
    let response = client
        .post(&url)
        .json(&json!({ "key": "guess" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Correct key, grouped by class
    let body: Value = client
        .post(&url)
        .json(&json!({ "key": TEACHER_KEY }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["classes"]["10B"].as_array().unwrap().len(), 1);

    // City filter with no match
    let body: Value = client
        .post(&url)
        .json(&json!({ "key": TEACHER_KEY, "city": "Perm" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["classes"].as_object().unwrap().is_empty());

    // Key is read on every request
    std::fs::write(&app.key_path, "rotated").unwrap();
    let response = client
        .post(&url)
        .json(&json!({ "key": TEACHER_KEY }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Unreadable key file
    std::fs::remove_file(&app.key_path).unwrap();
    let response = client
        .post(&url)
        .json(&json!({ "key": "rotated" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
}

#[tokio::test]
async fn locations_group_schools_by_city() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    submit(&client, &app, &submission("Ann", "easy", 1, 2)).await;

    let locations: Value = client
        .get(format!("{}/api/locations", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(locations, json!({ "Kazan": ["Lyceum 2"] }));
}
