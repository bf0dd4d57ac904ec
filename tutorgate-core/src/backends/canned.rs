//! Degraded-mode adapter backed by the canned response engine.

use super::TutorBackend;
use crate::canned::CannedEngine;
use crate::error::{Error, Result};
use crate::types::{BackendReply, ConversationMessage, Mode, Role};
use async_trait::async_trait;
use std::sync::Arc;

const NAME: &str = "canned";

/// Answers from the keyword engine. Never talks to the network.
pub struct CannedBackend {
    engine: Arc<CannedEngine>,
}

impl CannedBackend {
    pub fn new(engine: Arc<CannedEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl TutorBackend for CannedBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn call(
        &self,
        conversation: &[ConversationMessage],
        _mode: Mode,
        _frustration_level: f32,
    ) -> Result<BackendReply> {
        let last = conversation
            .last()
            .filter(|m| m.role == Role::User)
            .ok_or_else(|| Error::Validation("Last message must be from the user.".to_string()))?;
        Ok(BackendReply::text(self.engine.respond(&last.content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canned::MATH_RESPONSES;

    #[tokio::test]
    async fn test_answers_from_category_list() {
        let backend = CannedBackend::new(Arc::new(CannedEngine::seeded(3)));
        let conv = vec![ConversationMessage::user("solve for x: 2x = 4")];
        let reply = backend.call(&conv, Mode::Socratic, 0.0).await.unwrap();
        assert!(MATH_RESPONSES.contains(&reply.message.content.as_str()));
        assert!(reply.usage.is_none());
    }

    #[tokio::test]
    async fn test_rejects_trailing_assistant_message() {
        let backend = CannedBackend::new(Arc::new(CannedEngine::seeded(3)));
        let conv = vec![ConversationMessage::assistant("hello")];
        let err = backend.call(&conv, Mode::Direct, 0.0).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
