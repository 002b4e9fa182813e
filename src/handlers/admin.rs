// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    generator::{
        GeneratedQuestion, GeneratorOutcome, QuestionGenerator, remote::RemoteGenerator,
        template::TemplateGenerator,
    },
    models::{
        attempt::QuizResultEntry,
        question::ReplaceQuestionsRequest,
        quiz::{CreateQuizRequest, DurationMode, Quiz},
    },
    utils::html::clean_html,
};

/// Creates a new quiz shell. Questions are added afterwards with
/// `replace_questions`.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, num_questions, duration_mode, duration_seconds)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(clean_html(&payload.title))
    .bind(payload.num_questions)
    .bind(payload.duration_mode)
    .bind(payload.duration_seconds)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Replaces a quiz's entire question set in one transaction.
///
/// Delete-then-insert: readers never observe a partially replaced set, and
/// a failure anywhere rolls the whole batch back. Orders are assigned 1..N
/// in submission order. The quiz's declared question count is synced to the
/// batch size, so it always equals the number of persisted questions.
/// Admin only.
pub async fn replace_questions(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<ReplaceQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.questions.is_empty() {
        return Err(AppError::BadRequest(
            "A quiz needs at least one question".to_string(),
        ));
    }

    let _quiz = sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    for (i, entry) in payload.questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO questions
                (quiz_id, question_text, option_a, option_b, option_c, option_d,
                 correct_answer, ord)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz_id)
        .bind(clean_html(&entry.question_text))
        .bind(clean_html(&entry.option_a))
        .bind(clean_html(&entry.option_b))
        .bind(clean_html(&entry.option_c))
        .bind(clean_html(&entry.option_d))
        .bind(entry.correct_answer)
        .bind(i as i64 + 1)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE quizzes SET num_questions = ? WHERE id = ?")
        .bind(payload.questions.len() as i64)
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to replace questions for quiz {}: {:?}", quiz_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "quiz_id": quiz_id,
        "num_questions": payload.questions.len(),
    })))
}

/// Deletes a quiz and everything it owns.
///
/// Dependents are removed child-first inside one transaction (answers,
/// attempts, questions, then the quiz), rather than leaning on the
/// schema's cascade rules alone.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let _quiz = sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM answers WHERE attempt_id IN (SELECT id FROM attempts WHERE quiz_id = ?)",
    )
    .bind(quiz_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM attempts WHERE quiz_id = ?")
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete quiz {}: {:?}", quiz_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({ "deleted": quiz_id })))
}

/// Lists the completed attempts for one quiz, newest first.
/// Admin only.
pub async fn quiz_results(
    State(pool): State<SqlitePool>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, title, num_questions, duration_mode, duration_seconds, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let results = sqlx::query_as::<_, QuizResultEntry>(
        r#"
        SELECT id AS attempt_id, student_name, score, start_time, end_time
        FROM attempts
        WHERE quiz_id = ? AND is_completed = 1
        ORDER BY end_time DESC
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "quiz_title": quiz.title,
        "num_questions": quiz.num_questions,
        "results": results,
    })))
}

fn default_num_questions() -> i64 {
    10
}

fn default_difficulty() -> String {
    "medium".to_string()
}

fn default_duration_mode() -> DurationMode {
    DurationMode::PerQuestion
}

fn default_duration_seconds() -> i64 {
    30
}

/// DTO for generating a quiz (or a question preview) from a topic.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Topic must not be empty."))]
    pub topic: String,
    #[serde(default = "default_num_questions")]
    #[validate(range(min = 1, max = 100))]
    pub num_questions: i64,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    /// Quiz title; defaults to "AI Quiz: {topic}".
    pub title: Option<String>,
    #[serde(default = "default_duration_mode")]
    pub duration_mode: DurationMode,
    #[serde(default = "default_duration_seconds")]
    #[validate(range(min = 1))]
    pub duration_seconds: i64,
}

/// Runs the remote generator and substitutes the template generator when it
/// is unavailable or comes back empty. Returns the questions plus the name
/// of the generator that actually produced them, so handlers can tell the
/// operator a fallback happened.
async fn generate_with_fallback(
    topic: &str,
    count: usize,
    difficulty: &str,
) -> Result<(Vec<GeneratedQuestion>, &'static str), AppError> {
    match RemoteGenerator.generate(topic, count, difficulty).await? {
        GeneratorOutcome::Questions(questions) if !questions.is_empty() => {
            return Ok((questions, "remote"));
        }
        GeneratorOutcome::Questions(_) => {
            tracing::warn!(topic, "remote generator produced no questions, falling back");
        }
        GeneratorOutcome::Unavailable => {
            tracing::warn!(topic, "remote generator unavailable, falling back to templates");
        }
    }

    match TemplateGenerator.generate(topic, count, difficulty).await? {
        GeneratorOutcome::Questions(questions) if !questions.is_empty() => {
            Ok((questions, "template"))
        }
        _ => Err(AppError::InternalServerError(
            "Question generation produced no questions".to_string(),
        )),
    }
}

/// Creates a complete quiz from generated questions in one transaction.
///
/// The response carries the name of the generator that produced the content;
/// "template" means the remote provider was unavailable and canned questions
/// were substituted, which the operator should treat as a warning.
/// Admin only.
pub async fn generate_quiz(
    State(pool): State<SqlitePool>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (questions, generator) = generate_with_fallback(
        &payload.topic,
        payload.num_questions as usize,
        &payload.difficulty,
    )
    .await?;

    let title = payload
        .title
        .clone()
        .unwrap_or_else(|| format!("AI Quiz: {}", payload.topic));

    let mut tx = pool.begin().await?;

    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, num_questions, duration_mode, duration_seconds)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(clean_html(&title))
    .bind(questions.len() as i64)
    .bind(payload.duration_mode)
    .bind(payload.duration_seconds)
    .fetch_one(&mut *tx)
    .await?;

    for (i, q) in questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO questions
                (quiz_id, question_text, option_a, option_b, option_c, option_d,
                 correct_answer, ord)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz_id)
        .bind(&q.question_text)
        .bind(&q.option_a)
        .bind(&q.option_b)
        .bind(&q.option_c)
        .bind(&q.option_d)
        .bind(q.correct_answer)
        .bind(i as i64 + 1)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to persist generated quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": quiz_id,
            "title": title,
            "num_questions": questions.len(),
            "generator": generator,
        })),
    ))
}

/// Generates questions for inspection without persisting anything.
/// Admin only.
pub async fn preview_questions(
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (questions, generator) = generate_with_fallback(
        &payload.topic,
        payload.num_questions as usize,
        &payload.difficulty,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "questions": questions,
        "generator": generator,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_substitutes_template_generator() {
        // The remote generator is a stub that always reports Unavailable,
        // so every generation goes through the template fallback.
        let (questions, generator) = generate_with_fallback("Ancient Rome", 10, "medium")
            .await
            .unwrap();
        assert_eq!(generator, "template");
        assert_eq!(questions.len(), 10);
    }
}
