// src/generator/mod.rs

pub mod remote;
pub mod template;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::question::Letter};

/// A question produced by a generator, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: Letter,
}

/// Result of a generation request.
///
/// `Unavailable` is distinct from an empty `Questions` list: the first means
/// the backing provider could not be reached (callers should fall back to
/// another generator), the second means the provider ran but produced
/// nothing.
#[derive(Debug, Clone)]
pub enum GeneratorOutcome {
    Questions(Vec<GeneratedQuestion>),
    Unavailable,
}

/// A source of multiple-choice questions for a topic.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produces `count` questions about `topic`.
    ///
    /// `difficulty` is advisory; generators may ignore it.
    async fn generate(
        &self,
        topic: &str,
        count: usize,
        difficulty: &str,
    ) -> Result<GeneratorOutcome, AppError>;
}
