// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::question::Letter;

/// Represents the 'attempts' table in the database.
/// One student's run through one quiz.
///
/// Invariants maintained by the submit-answer transaction:
/// * `0 <= current_question <= quiz.num_questions`
/// * `score <= current_question`
/// * `is_completed` is true iff `current_question == quiz.num_questions`
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub student_name: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 0-based index of the next question to answer.
    pub current_question: i64,
    /// Running count of correct answers.
    pub score: i64,
    pub is_completed: bool,
}

/// DTO for starting a new attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(length(min = 1, max = 100, message = "Student name must not be empty."))]
    pub student_name: String,
}

/// DTO for submitting one answer.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    pub selected_answer: Letter,
}

/// One question plus the student's recorded answer, for the results view.
#[derive(Debug, Serialize, FromRow)]
pub struct AnsweredQuestion {
    pub question_id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: Letter,
    pub selected_answer: Letter,
    pub is_correct: bool,
    pub ord: i64,
}

/// Aggregated result summary for a completed attempt.
#[derive(Debug, Serialize)]
pub struct AttemptResultResponse {
    pub quiz_title: String,
    pub student_name: String,
    pub score: i64,
    pub total_questions: i64,
    pub questions: Vec<AnsweredQuestion>,
}

/// Row for the admin per-quiz results listing.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizResultEntry {
    pub attempt_id: i64,
    pub student_name: String,
    pub score: i64,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}
