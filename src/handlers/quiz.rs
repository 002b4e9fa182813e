// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{AnsweredQuestion, Attempt, AttemptResultResponse, StartAttemptRequest, SubmitAnswerRequest},
        question::{PublicQuestion, Question},
        quiz::Quiz,
    },
};

/// Lists all quizzes, newest first.
pub async fn list_quizzes(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, num_questions, duration_mode, duration_seconds, created_at
        FROM quizzes
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(quizzes))
}

/// Retrieves a single quiz by ID (metadata only, no questions).
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_quiz(&pool, id).await?;
    Ok(Json(quiz))
}

/// Starts a new attempt for a quiz.
///
/// Creates the attempt at question index 0 with a zero score and the start
/// time stamped server-side. The returned attempt id is the opaque token the
/// client passes back for every subsequent call; there is no ambient session
/// state.
pub async fn start_attempt(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = fetch_quiz(&pool, quiz_id).await?;

    // A quiz whose question set does not match its declared count is still
    // being authored; students must never see a partial set.
    let persisted: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = ?")
            .bind(quiz_id)
            .fetch_one(&pool)
            .await?;
    if persisted != quiz.num_questions {
        return Err(AppError::Conflict(
            "Quiz is not fully authored yet".to_string(),
        ));
    }

    let attempt_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO attempts (quiz_id, student_name, start_time)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(&payload.student_name)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "attempt_id": attempt_id,
            "quiz_id": quiz.id,
            "num_questions": quiz.num_questions,
            "duration_mode": quiz.duration_mode,
            "duration_seconds": quiz.duration_seconds,
            "time_budget_seconds": quiz.time_budget_seconds(),
        })),
    ))
}

/// Returns the question at the attempt's current index, without the correct
/// answer. Once the attempt is completed, `question` is null and the client
/// should move on to the results view.
pub async fn current_question(
    State(pool): State<SqlitePool>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = fetch_attempt(&pool, attempt_id).await?;

    if attempt.is_completed {
        return Ok(Json(serde_json::json!({
            "is_completed": true,
            "question": null,
        })));
    }

    let quiz = fetch_quiz(&pool, attempt.quiz_id).await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, option_a, option_b, option_c, option_d,
               correct_answer, ord
        FROM questions
        WHERE quiz_id = ? AND ord = ?
        "#,
    )
    .bind(attempt.quiz_id)
    .bind(attempt.current_question + 1)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let public = PublicQuestion {
        id: question.id,
        question_text: question.question_text,
        option_a: question.option_a,
        option_b: question.option_b,
        option_c: question.option_c,
        option_d: question.option_d,
        position: question.ord,
        total_questions: quiz.num_questions,
    };

    Ok(Json(serde_json::json!({
        "is_completed": false,
        "question": public,
    })))
}

/// Records one answer and advances the attempt state machine.
///
/// * Rejects completed attempts (terminal state is absorbing).
/// * Rejects submissions past the server-side deadline.
/// * Enforces index-ordered submission: the answered question must be the
///   one at the attempt's current index, so questions can be neither
///   skipped nor replayed.
/// * Atomically: inserts the answer with its correctness as evaluated now,
///   advances the index by exactly one, bumps the score if correct, and
///   completes the attempt when the last question is answered. The index
///   advance is a compare-and-set, so a concurrent duplicate submission
///   (double-click, retry) loses and mutates nothing.
///
/// The response discloses only this answer's correctness, never the running
/// score.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let attempt = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, quiz_id, student_name, start_time, end_time,
               current_question, score, is_completed
        FROM attempts
        WHERE id = ?
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.is_completed {
        return Err(AppError::Conflict("Attempt already completed".to_string()));
    }

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, num_questions, duration_mode, duration_seconds, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(attempt.quiz_id)
    .fetch_one(&mut *tx)
    .await?;

    let deadline = attempt.start_time + Duration::seconds(quiz.time_budget_seconds());
    if Utc::now() > deadline {
        return Err(AppError::Conflict("Attempt deadline has passed".to_string()));
    }

    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, option_a, option_b, option_c, option_d,
               correct_answer, ord
        FROM questions
        WHERE id = ?
        "#,
    )
    .bind(payload.question_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if question.quiz_id != attempt.quiz_id || question.ord != attempt.current_question + 1 {
        return Err(AppError::Conflict("Answer out of sequence".to_string()));
    }

    let is_correct = payload.selected_answer == question.correct_answer;

    sqlx::query(
        r#"
        INSERT INTO answers (attempt_id, question_id, selected_answer, is_correct, answered_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(attempt.id)
    .bind(question.id)
    .bind(payload.selected_answer)
    .bind(is_correct)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    let new_index = attempt.current_question + 1;
    let completed = new_index >= quiz.num_questions;
    let score_delta: i64 = if is_correct { 1 } else { 0 };

    // Compare-and-set on the index: the update only applies if nobody else
    // advanced this attempt since we read it.
    let updated = if completed {
        sqlx::query(
            r#"
            UPDATE attempts
            SET current_question = ?, score = score + ?, is_completed = 1, end_time = ?
            WHERE id = ? AND is_completed = 0 AND current_question = ?
            "#,
        )
        .bind(new_index)
        .bind(score_delta)
        .bind(Utc::now())
        .bind(attempt.id)
        .bind(attempt.current_question)
        .execute(&mut *tx)
        .await?
    } else {
        sqlx::query(
            r#"
            UPDATE attempts
            SET current_question = ?, score = score + ?
            WHERE id = ? AND is_completed = 0 AND current_question = ?
            "#,
        )
        .bind(new_index)
        .bind(score_delta)
        .bind(attempt.id)
        .bind(attempt.current_question)
        .execute(&mut *tx)
        .await?
    };

    if updated.rows_affected() != 1 {
        // The transaction is dropped without commit, so the inserted answer
        // rolls back with it.
        return Err(AppError::Conflict(
            "Attempt was modified concurrently".to_string(),
        ));
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "is_correct": is_correct,
        "is_completed": completed,
    })))
}

/// Aggregated results for a completed attempt: the quiz title, every
/// question in order with the recorded answer and its correctness as stored
/// at submission time, and the final score.
pub async fn attempt_results(
    State(pool): State<SqlitePool>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = fetch_attempt(&pool, attempt_id).await?;

    if !attempt.is_completed {
        return Err(AppError::Conflict("Attempt not finished".to_string()));
    }

    let quiz = fetch_quiz(&pool, attempt.quiz_id).await?;

    let questions = sqlx::query_as::<_, AnsweredQuestion>(
        r#"
        SELECT q.id AS question_id, q.question_text,
               q.option_a, q.option_b, q.option_c, q.option_d,
               q.correct_answer, a.selected_answer, a.is_correct, q.ord
        FROM questions q
        JOIN answers a ON a.question_id = q.id AND a.attempt_id = ?
        WHERE q.quiz_id = ?
        ORDER BY q.ord
        "#,
    )
    .bind(attempt.id)
    .bind(quiz.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempt results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(AttemptResultResponse {
        quiz_title: quiz.title,
        student_name: attempt.student_name,
        score: attempt.score,
        total_questions: quiz.num_questions,
        questions,
    }))
}

async fn fetch_quiz(pool: &SqlitePool, id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, num_questions, duration_mode, duration_seconds, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

async fn fetch_attempt(pool: &SqlitePool, id: i64) -> Result<Attempt, AppError> {
    sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, quiz_id, student_name, start_time, end_time,
               current_question, score, is_completed
        FROM attempts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Attempt not found".to_string()))
}
