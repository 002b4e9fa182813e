// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// One of the four fixed answer options.
///
/// Modelled as an enum (rather than a free-form string) so that malformed
/// payloads are rejected during deserialization, before they reach the
/// attempt state machine or the question store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Letter {
    A,
    B,
    C,
    D,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub question_text: String,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// The designated right answer among the four options.
    pub correct_answer: Letter,

    /// 1-based position within the quiz. Unique and contiguous per quiz.
    pub ord: i64,
}

/// DTO for sending a question to a student (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// 1-based position of this question.
    pub position: i64,
    /// Total number of questions in the quiz.
    pub total_questions: i64,
}

/// One authored question in a batch submission.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionEntry {
    #[validate(length(min = 1, max = 2000, message = "Question text must not be empty."))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500, message = "Option A must not be empty."))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500, message = "Option B must not be empty."))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500, message = "Option C must not be empty."))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500, message = "Option D must not be empty."))]
    pub option_d: String,
    pub correct_answer: Letter,
}

/// DTO for replacing a quiz's entire question set in one shot.
#[derive(Debug, Deserialize, Validate)]
pub struct ReplaceQuestionsRequest {
    #[validate(nested)]
    pub questions: Vec<QuestionEntry>,
}
