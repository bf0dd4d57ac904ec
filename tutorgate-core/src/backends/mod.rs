//! Backend adapters
//!
//! Each adapter translates the normalized conversation into one provider's
//! request shape and the provider's response back into an assistant
//! message. Adapters never retry; the router owns retry and fallback.
//!
//! ## Built-in Adapters
//!
//! - [`openai`]: chat completions, flat role/content list
//! - [`gemini`]: `generateContent`, single transcript prompt
//! - [`canned`]: the keyword engine, for use as a degraded-mode list entry
//!
//! Custom adapters implement [`TutorBackend`] and are handed to
//! [`TutorRouter::new`](crate::router::TutorRouter::new).

pub mod canned;
pub mod gemini;
pub mod openai;

use crate::config::{Config, GenerationConfig};
use crate::error::{Error, Result};
use crate::types::{BackendKind, BackendReply, ConversationMessage, Mode, Role};
use async_trait::async_trait;
use std::sync::Arc;

pub use canned::CannedBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

/// One LLM provider behind a uniform call shape.
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Stable name used in logs and route outcomes.
    fn name(&self) -> &str;

    /// Produce the next assistant message for `conversation`.
    ///
    /// The last element of `conversation` is the user turn being answered.
    async fn call(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration_level: f32,
    ) -> Result<BackendReply>;
}

/// Split a conversation into an optional caller-supplied system message and the rest.
pub(crate) fn split_system(
    conversation: &[ConversationMessage],
) -> (Option<&ConversationMessage>, &[ConversationMessage]) {
    match conversation.split_first() {
        Some((first, rest)) if first.role == Role::System => (Some(first), rest),
        _ => (None, conversation),
    }
}

/// Instantiate the built-in adapter for `kind`.
///
/// Returns `Ok(None)` when the provider has no configuration section, so an
/// unconfigured provider simply drops out of the priority list.
pub fn build_backend(
    kind: BackendKind,
    config: &Config,
    engine: Arc<crate::canned::CannedEngine>,
) -> Result<Option<Arc<dyn TutorBackend>>> {
    let generation: GenerationConfig = config.generation;
    let backend: Arc<dyn TutorBackend> = match kind {
        BackendKind::OpenAI => match &config.openai {
            Some(provider) => Arc::new(OpenAiBackend::new(provider, generation)?),
            None => return Ok(None),
        },
        BackendKind::Gemini => match &config.gemini {
            Some(provider) => Arc::new(GeminiBackend::new(provider, generation)?),
            None => return Ok(None),
        },
        BackendKind::Canned => Arc::new(CannedBackend::new(engine)),
    };
    Ok(Some(backend))
}

/// Build the priority list for `mode` from configuration.
pub fn build_priority_list(
    config: &Config,
    mode: Mode,
    engine: Arc<crate::canned::CannedEngine>,
) -> Result<Vec<Arc<dyn TutorBackend>>> {
    let mut list = Vec::new();
    for kind in config.routing.backends_for(mode) {
        match build_backend(*kind, config, engine.clone())? {
            Some(backend) => list.push(backend),
            None => tracing::debug!(
                backend = kind.as_str(),
                mode = %mode,
                "Backend not configured, skipping"
            ),
        }
    }
    Ok(list)
}

/// Provider error text, trimmed for logs.
pub(crate) fn provider_error(backend: &str, status: u16, body: &str) -> Error {
    const MAX_BODY: usize = 500;
    let body = body.trim();
    let detail = if body.len() > MAX_BODY {
        let mut end = MAX_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    };
    Error::backend(backend, format!("returned {}: {}", status, detail))
}
