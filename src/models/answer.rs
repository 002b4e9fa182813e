// src/models/answer.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::models::question::Letter;

/// Represents the 'answers' table in the database.
/// One row per (attempt, question) pair under correct client usage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_answer: Letter,
    /// Correctness as evaluated at submission time. Never recomputed later,
    /// even if the question is edited afterwards.
    pub is_correct: bool,
    pub answered_at: chrono::DateTime<chrono::Utc>,
}
