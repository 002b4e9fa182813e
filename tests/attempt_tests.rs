// tests/attempt_tests.rs

use quiz_backend::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL and a handle to the underlying pool for seeding
/// and assertions.
async fn spawn_app() -> (String, SqlitePool) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Seeds an admin user and a fully authored quiz with one question per
/// correct letter. Returns the quiz id.
async fn seed_quiz(
    address: &str,
    pool: &SqlitePool,
    letters: &[&str],
    duration_mode: &str,
    duration_seconds: i64,
) -> i64 {
    let username = format!("admin_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let hashed = hash_password("password123").unwrap();
    sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, 'admin')")
        .bind(&username)
        .bind(&hashed)
        .execute(pool)
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap();

    let created = client
        .post(format!("{}/api/admin/quizzes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "title": "State Machine Quiz",
            "num_questions": letters.len(),
            "duration_mode": duration_mode,
            "duration_seconds": duration_seconds
        }))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    let quiz_id = created["id"].as_i64().unwrap();

    let questions: Vec<serde_json::Value> = letters
        .iter()
        .enumerate()
        .map(|(i, l)| {
            serde_json::json!({
                "question_text": format!("Question {}", i + 1),
                "option_a": "Alpha",
                "option_b": "Beta",
                "option_c": "Gamma",
                "option_d": "Delta",
                "correct_answer": l
            })
        })
        .collect();

    let put_resp = client
        .put(format!("{}/api/admin/quizzes/{}/questions", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "questions": questions }))
        .send()
        .await
        .unwrap();
    assert_eq!(put_resp.status().as_u16(), 200);

    quiz_id
}

async fn start_attempt(client: &reqwest::Client, address: &str, quiz_id: i64) -> i64 {
    let start = client
        .post(format!("{}/api/quizzes/{}/attempts", address, quiz_id))
        .json(&serde_json::json!({ "student_name": "dora" }))
        .send()
        .await
        .unwrap();
    assert_eq!(start.status().as_u16(), 201);
    start.json::<serde_json::Value>().await.unwrap()["attempt_id"]
        .as_i64()
        .unwrap()
}

async fn current_question_id(client: &reqwest::Client, address: &str, attempt_id: i64) -> i64 {
    let current = client
        .get(format!("{}/api/attempts/{}/question", address, attempt_id))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    current["question"]["id"].as_i64().unwrap()
}

async fn attempt_row(pool: &SqlitePool, attempt_id: i64) -> (i64, i64, bool) {
    sqlx::query_as::<_, (i64, i64, bool)>(
        "SELECT current_question, score, is_completed FROM attempts WHERE id = ?",
    )
    .bind(attempt_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn full_attempt_flow_scores_and_completes() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // 5 questions with correct letters B,B,A,C,C; the student answers
    // B,A,A,C,D and should score 3.
    let quiz_id = seed_quiz(&address, &pool, &["B", "B", "A", "C", "C"], "overall", 600).await;
    let attempt_id = start_attempt(&client, &address, quiz_id).await;

    let submissions = ["B", "A", "A", "C", "D"];
    let expected_correct = [true, false, true, true, false];

    for (i, selected) in submissions.iter().enumerate() {
        // The CAS and the index invariant: before submission i, the index is
        // exactly i and the score never exceeds it.
        let (index, score, completed) = attempt_row(&pool, attempt_id).await;
        assert_eq!(index, i as i64);
        assert!(score <= index);
        assert!(!completed);

        let question_id = current_question_id(&client, &address, attempt_id).await;
        let response = client
            .post(format!("{}/api/attempts/{}/answers", address, attempt_id))
            .json(&serde_json::json!({
                "question_id": question_id,
                "selected_answer": selected
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let body = response.json::<serde_json::Value>().await.unwrap();
        assert_eq!(body["is_correct"], expected_correct[i], "answer {}", i + 1);
        // Completion flips exactly on the 5th submission, not before.
        assert_eq!(body["is_completed"], i == submissions.len() - 1);
    }

    let (index, score, completed) = attempt_row(&pool, attempt_id).await;
    assert_eq!(index, 5);
    assert_eq!(score, 3);
    assert!(completed);

    // Result aggregation for the finished attempt.
    let results = client
        .get(format!("{}/api/attempts/{}/results", address, attempt_id))
        .send()
        .await
        .unwrap();
    assert_eq!(results.status().as_u16(), 200);
    let results = results.json::<serde_json::Value>().await.unwrap();
    assert_eq!(results["quiz_title"], "State Machine Quiz");
    assert_eq!(results["student_name"], "dora");
    assert_eq!(results["score"], 3);
    assert_eq!(results["total_questions"], 5);

    let questions = results["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    for (i, q) in questions.iter().enumerate() {
        assert_eq!(q["ord"], (i + 1) as i64);
        assert_eq!(q["selected_answer"], submissions[i]);
        assert_eq!(q["is_correct"], expected_correct[i]);
    }
}

#[tokio::test]
async fn completed_attempt_absorbs_further_submissions() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz_id = seed_quiz(&address, &pool, &["A", "A"], "overall", 600).await;
    let attempt_id = start_attempt(&client, &address, quiz_id).await;

    let mut last_question_id = 0;
    for _ in 0..2 {
        last_question_id = current_question_id(&client, &address, attempt_id).await;
        client
            .post(format!("{}/api/attempts/{}/answers", address, attempt_id))
            .json(&serde_json::json!({
                "question_id": last_question_id,
                "selected_answer": "A"
            }))
            .send()
            .await
            .unwrap();
    }

    let before = attempt_row(&pool, attempt_id).await;
    assert!(before.2, "attempt should be completed");

    // Terminal state is absorbing: the extra submission is rejected and
    // nothing changes.
    let response = client
        .post(format!("{}/api/attempts/{}/answers", address, attempt_id))
        .json(&serde_json::json!({
            "question_id": last_question_id,
            "selected_answer": "A"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let after = attempt_row(&pool, attempt_id).await;
    assert_eq!(before, after);

    let answers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE attempt_id = ?")
        .bind(attempt_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(answers, 2);

    // The current-question view signals completion instead of a question.
    let current = client
        .get(format!("{}/api/attempts/{}/question", address, attempt_id))
        .send()
        .await
        .unwrap()
        .json::<serde_json::Value>()
        .await
        .unwrap();
    assert_eq!(current["is_completed"], true);
    assert!(current["question"].is_null());
}

#[tokio::test]
async fn out_of_sequence_submission_is_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz_id = seed_quiz(&address, &pool, &["A", "B", "C"], "overall", 600).await;
    let attempt_id = start_attempt(&client, &address, quiz_id).await;

    // Try to answer question 2 while the attempt is at question 1.
    let second_question_id: i64 =
        sqlx::query_scalar("SELECT id FROM questions WHERE quiz_id = ? AND ord = 2")
            .bind(quiz_id)
            .fetch_one(&pool)
            .await
            .unwrap();

    let response = client
        .post(format!("{}/api/attempts/{}/answers", address, attempt_id))
        .json(&serde_json::json!({
            "question_id": second_question_id,
            "selected_answer": "B"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let (index, score, completed) = attempt_row(&pool, attempt_id).await;
    assert_eq!((index, score, completed), (0, 0, false));

    let answers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE attempt_id = ?")
        .bind(attempt_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(answers, 0);
}

#[tokio::test]
async fn unknown_question_fails_without_state_change() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz_id = seed_quiz(&address, &pool, &["A"], "overall", 600).await;
    let attempt_id = start_attempt(&client, &address, quiz_id).await;

    let response = client
        .post(format!("{}/api/attempts/{}/answers", address, attempt_id))
        .json(&serde_json::json!({
            "question_id": 999_999,
            "selected_answer": "A"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let (index, score, completed) = attempt_row(&pool, attempt_id).await;
    assert_eq!((index, score, completed), (0, 0, false));
}

#[tokio::test]
async fn results_require_a_completed_attempt() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let quiz_id = seed_quiz(&address, &pool, &["A", "B"], "overall", 600).await;
    let attempt_id = start_attempt(&client, &address, quiz_id).await;

    let response = client
        .get(format!("{}/api/attempts/{}/results", address, attempt_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = client
        .get(format!("{}/api/attempts/999999/results", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submissions_past_the_deadline_are_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // 1 second overall budget.
    let quiz_id = seed_quiz(&address, &pool, &["A"], "overall", 1).await;
    let attempt_id = start_attempt(&client, &address, quiz_id).await;
    let question_id = current_question_id(&client, &address, attempt_id).await;

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let response = client
        .post(format!("{}/api/attempts/{}/answers", address, attempt_id))
        .json(&serde_json::json!({
            "question_id": question_id,
            "selected_answer": "A"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let (index, _, completed) = attempt_row(&pool, attempt_id).await;
    assert_eq!(index, 0);
    assert!(!completed);
}

#[tokio::test]
async fn attempts_cannot_start_on_partially_authored_quizzes() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Quiz shell declares 5 questions but none are persisted yet.
    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, num_questions, duration_mode, duration_seconds)
        VALUES ('Unfinished', 5, 'overall', 300)
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let response = client
        .post(format!("{}/api/quizzes/{}/attempts", address, quiz_id))
        .json(&serde_json::json!({ "student_name": "dora" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Unknown quiz id is a plain not-found.
    let response = client
        .post(format!("{}/api/quizzes/999999/attempts", address))
        .json(&serde_json::json!({ "student_name": "dora" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
