//! Tutor router
//!
//! Orchestrates backend adapters for one turn:
//!
//! ```text
//! validate ─► frustration ─► backend[0] ──ok──► reply
//!                              │ fail/timeout/empty
//!                              ▼
//!                            backend[1] ──ok──► reply
//!                              │ ...
//!                              ▼
//!                         terminal reply (never fails)
//! ```
//!
//! Attempts are strictly sequential. The priority list is fixed per mode;
//! nothing about a previous turn changes which backend is tried first.

use crate::backends::{build_priority_list, TutorBackend};
use crate::canned::{self, CannedEngine};
use crate::config::{Config, TerminalFallback};
use crate::error::{Error, Result};
use crate::frustration::{EscalationStrategy, FrustrationState};
use crate::types::{ConversationMessage, FailedAttempt, Mode, Role, RouteOutcome};
use std::sync::Arc;
use std::time::Duration;

/// Backend name reported when every adapter failed.
pub const TERMINAL_BACKEND: &str = "terminal";

const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(15);

/// Routes a conversation through a mode's ordered backend list.
pub struct TutorRouter {
    socratic: Vec<Arc<dyn TutorBackend>>,
    direct: Vec<Arc<dyn TutorBackend>>,
    engine: Arc<CannedEngine>,
    escalation: EscalationStrategy,
    terminal: TerminalFallback,
    adapter_timeout: Duration,
}

impl TutorRouter {
    /// Create a router from explicit priority lists.
    pub fn new(
        socratic: Vec<Arc<dyn TutorBackend>>,
        direct: Vec<Arc<dyn TutorBackend>>,
        engine: Arc<CannedEngine>,
    ) -> Self {
        Self {
            socratic,
            direct,
            engine,
            escalation: EscalationStrategy::default(),
            terminal: TerminalFallback::default(),
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    /// Build the configured priority lists with an entropy-seeded engine.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_engine(config, Arc::new(CannedEngine::new()))
    }

    /// Build the configured priority lists around a supplied engine.
    pub fn from_config_with_engine(config: &Config, engine: Arc<CannedEngine>) -> Result<Self> {
        config.routing.validate()?;
        let socratic = build_priority_list(config, Mode::Socratic, engine.clone())?;
        let direct = build_priority_list(config, Mode::Direct, engine.clone())?;

        Ok(Self::new(socratic, direct, engine)
            .with_escalation(config.routing.escalation)
            .with_terminal(config.routing.terminal)
            .with_adapter_timeout(Duration::from_secs(config.routing.adapter_timeout_secs)))
    }

    pub fn with_escalation(mut self, escalation: EscalationStrategy) -> Self {
        self.escalation = escalation;
        self
    }

    pub fn with_terminal(mut self, terminal: TerminalFallback) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Escalation strategy new sessions should use.
    pub fn escalation(&self) -> EscalationStrategy {
        self.escalation
    }

    /// The shared canned engine.
    pub fn engine(&self) -> &Arc<CannedEngine> {
        &self.engine
    }

    /// Priority list for `mode`.
    pub fn backends(&self, mode: Mode) -> &[Arc<dyn TutorBackend>] {
        match mode {
            Mode::Socratic => &self.socratic,
            Mode::Direct => &self.direct,
        }
    }

    /// Names in the priority list for `mode`.
    pub fn backend_names(&self, mode: Mode) -> Vec<&str> {
        self.backends(mode).iter().map(|b| b.name()).collect()
    }

    /// Route a stateless conversation.
    ///
    /// Frustration is derived from the conversation's user turns using the
    /// router's escalation strategy.
    pub async fn route(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
    ) -> Result<RouteOutcome> {
        validate(conversation)?;
        let frustration = self.frustration_for(conversation);
        self.route_validated(conversation, mode, &frustration).await
    }

    /// Route with frustration already computed for this turn (session use).
    pub async fn route_with_frustration(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration: &FrustrationState,
    ) -> Result<RouteOutcome> {
        validate(conversation)?;
        self.route_validated(conversation, mode, frustration).await
    }

    /// Replay every user turn through a fresh state.
    pub fn frustration_for(&self, conversation: &[ConversationMessage]) -> FrustrationState {
        let mut state = FrustrationState::new(self.escalation);
        for msg in conversation.iter().filter(|m| m.role == Role::User) {
            state.observe(&msg.content);
        }
        state
    }

    async fn route_validated(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration: &FrustrationState,
    ) -> Result<RouteOutcome> {
        let level = frustration.level();
        let mut attempts = Vec::new();

        for backend in self.backends(mode) {
            let name = backend.name().to_string();
            tracing::debug!(backend = %name, mode = %mode, level, "Trying backend");

            let failure = match tokio::time::timeout(
                self.adapter_timeout,
                backend.call(conversation, mode, level),
            )
            .await
            {
                Ok(Ok(reply)) if reply.is_usable() => {
                    tracing::debug!(backend = %name, failed = attempts.len(), "Backend answered");
                    let mut message = reply.message;
                    message.role = Role::Assistant;
                    message.mode = Some(mode);
                    return Ok(RouteOutcome {
                        message,
                        usage: reply.usage,
                        backend: name,
                        attempts,
                    });
                }
                Ok(Ok(_)) => Error::backend(&name, "response had no usable content"),
                Ok(Err(e)) => e,
                Err(_) => Error::Timeout {
                    backend: name.clone(),
                    timeout: self.adapter_timeout,
                },
            };

            if failure.is_backend_failure() {
                tracing::warn!(backend = %name, error = %failure, "Backend failed, trying next");
            } else {
                tracing::error!(backend = %name, error = %failure, "Backend failed unexpectedly, trying next");
            }
            attempts.push(FailedAttempt {
                backend: name,
                error: failure.to_string(),
            });
        }

        tracing::info!(
            mode = %mode,
            attempts = attempts.len(),
            "All backends failed, using terminal reply"
        );
        Ok(RouteOutcome {
            message: ConversationMessage::assistant(self.terminal_reply(conversation, mode, frustration))
                .with_mode(mode),
            usage: None,
            backend: TERMINAL_BACKEND.to_string(),
            attempts,
        })
    }

    fn terminal_reply(
        &self,
        conversation: &[ConversationMessage],
        mode: Mode,
        frustration: &FrustrationState,
    ) -> &'static str {
        match self.terminal {
            TerminalFallback::Engine => {
                let last = conversation.last().map(|m| m.content.as_str()).unwrap_or("");
                self.engine.respond(last)
            }
            TerminalFallback::Static => canned::static_apology(mode, frustration.is_frustrated()),
        }
    }
}

/// Reject conversations the router cannot answer.
pub fn validate(conversation: &[ConversationMessage]) -> Result<()> {
    let last = conversation
        .last()
        .ok_or_else(|| Error::Validation("Messages array is required.".to_string()))?;
    if last.role != Role::User {
        return Err(Error::Validation(
            "Last message must be from the user.".to_string(),
        ));
    }
    if last.content.trim().is_empty() {
        return Err(Error::Validation(
            "Last message must not be empty.".to_string(),
        ));
    }
    Ok(())
}
