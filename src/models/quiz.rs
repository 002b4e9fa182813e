// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// How `duration_seconds` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DurationMode {
    /// `duration_seconds` is the budget for each question.
    PerQuestion,
    /// `duration_seconds` is the budget for the whole quiz.
    Overall,
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    /// Declared question count. Equals the number of persisted questions
    /// once authoring is complete.
    pub num_questions: i64,

    pub duration_mode: DurationMode,

    pub duration_seconds: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Quiz {
    /// Total time budget for one attempt, in seconds.
    ///
    /// The server enforces this as a deadline on answer submission; the
    /// client is additionally expected to run its own countdown.
    pub fn time_budget_seconds(&self) -> i64 {
        match self.duration_mode {
            DurationMode::Overall => self.duration_seconds,
            DurationMode::PerQuestion => self.duration_seconds * self.num_questions,
        }
    }
}

/// DTO for creating a new quiz shell (questions are added separately).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 1, max = 200))]
    pub num_questions: i64,
    pub duration_mode: DurationMode,
    #[validate(range(min = 1))]
    pub duration_seconds: i64,
}
