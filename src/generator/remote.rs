// src/generator/remote.rs

use async_trait::async_trait;

use super::{GeneratorOutcome, QuestionGenerator};
use crate::error::AppError;

/// Generator backed by an external AI provider.
///
/// The provider integration is not wired up: no request is ever issued and
/// every call reports `GeneratorOutcome::Unavailable`. Callers are expected
/// to fall back to the `TemplateGenerator` and log the condition, never to
/// surface an empty quiz to the admin.
pub struct RemoteGenerator;

#[async_trait]
impl QuestionGenerator for RemoteGenerator {
    async fn generate(
        &self,
        topic: &str,
        count: usize,
        difficulty: &str,
    ) -> Result<GeneratorOutcome, AppError> {
        tracing::debug!(
            topic,
            count,
            difficulty,
            "remote question generator is not configured"
        );
        Ok(GeneratorOutcome::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_reports_unavailable() {
        let outcome = RemoteGenerator
            .generate("Python", 5, "hard")
            .await
            .unwrap();
        assert!(matches!(outcome, GeneratorOutcome::Unavailable));
    }
}
