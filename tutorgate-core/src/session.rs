//! Chat sessions
//!
//! A [`TutorSession`] owns the visible transcript of one chat, its mode and
//! its frustration state. Each turn hands the router only the messages that
//! belong to the current mode, so a Buddy answer never leaks into the
//! Socratic context and vice versa.
//!
//! [`SessionRegistry`] is the multi-session host used by the HTTP service.
//! A turn holds the session's lock for its whole duration; a second turn on
//! the same session while one is in flight is rejected with
//! [`Error::SessionBusy`]. Sessions idle for longer than the registry's TTL
//! are dropped the next time a session is created.

use crate::error::{Error, Result};
use crate::frustration::{EscalationStrategy, FrustrationState};
use crate::router::TutorRouter;
use crate::types::{ConversationMessage, Mode, Role, Usage};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use uuid::Uuid;

/// Idle time after which a registry session may be evicted.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

pub const TUTOR_WELCOME: &str = "Hello! I'm your AI tutor. I'm here to help you learn through guided questions rather than giving direct answers. What topic or problem would you like to explore today?";
pub const TUTOR_SWITCH_GREETING: &str = "I'm your Socratic Tutor now. I'll guide your learning through questions to help you discover answers for yourself. What would you like to explore?";
pub const BUDDY_GREETING: &str = "Hi there! I'm Buddy, your direct-answer assistant. I'll give you straightforward explanations without the Socratic method. How can I help you today?";

/// Greeting shown when a session opens in `mode`.
pub fn welcome(mode: Mode) -> &'static str {
    match mode {
        Mode::Socratic => TUTOR_WELCOME,
        Mode::Direct => BUDDY_GREETING,
    }
}

/// Greeting appended when a session switches into `mode`.
pub fn switch_greeting(mode: Mode) -> &'static str {
    match mode {
        Mode::Socratic => TUTOR_SWITCH_GREETING,
        Mode::Direct => BUDDY_GREETING,
    }
}

/// Result of one completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub message: ConversationMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub backend: String,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mode: Mode,
    pub frustration_level: f32,
    pub messages: Vec<ConversationMessage>,
}

/// One chat session.
#[derive(Debug, Clone)]
pub struct TutorSession {
    id: Uuid,
    mode: Mode,
    messages: Vec<ConversationMessage>,
    frustration: FrustrationState,
}

impl TutorSession {
    /// Open a session with the mode's welcome message.
    pub fn new(mode: Mode, escalation: EscalationStrategy) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            messages: vec![ConversationMessage::assistant(welcome(mode)).with_mode(mode)],
            frustration: FrustrationState::new(escalation),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn frustration(&self) -> &FrustrationState {
        &self.frustration
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            mode: self.mode,
            frustration_level: self.frustration.level(),
            messages: self.messages.clone(),
        }
    }

    /// Messages sent to the router: user turns plus this mode's replies.
    pub fn context(&self) -> Vec<ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| match m.role {
                Role::User => true,
                Role::Assistant => m.mode == Some(self.mode),
                Role::System => false,
            })
            .cloned()
            .collect()
    }

    /// Run one turn: record the user's message, route, record the reply.
    pub async fn submit(&mut self, router: &TutorRouter, text: &str) -> Result<TurnReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("Message must not be empty.".to_string()));
        }

        self.messages.push(ConversationMessage::user(text));
        self.frustration.observe(text);
        tracing::debug!(
            session = %self.id,
            mode = %self.mode,
            level = self.frustration.level(),
            "Submitting turn"
        );

        let outcome = router
            .route_with_frustration(&self.context(), self.mode, &self.frustration)
            .await?;
        self.messages.push(outcome.message.clone());

        Ok(TurnReply {
            message: outcome.message,
            usage: outcome.usage,
            backend: outcome.backend,
        })
    }

    /// Switch persona. Returns the greeting, or `None` if already in `mode`.
    pub fn switch_mode(&mut self, mode: Mode) -> Option<ConversationMessage> {
        if mode == self.mode {
            return None;
        }
        self.mode = mode;
        self.frustration.reset();

        let greeting = ConversationMessage::assistant(switch_greeting(mode)).with_mode(mode);
        self.messages.push(greeting.clone());
        tracing::info!(session = %self.id, mode = %mode, "Switched mode");
        Some(greeting)
    }
}

struct RegistryEntry {
    session: Arc<Mutex<TutorSession>>,
    last_active: Instant,
}

/// In-memory set of live sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, RegistryEntry>>,
    escalation: EscalationStrategy,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(escalation: EscalationStrategy) -> Self {
        Self::with_ttl(escalation, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(escalation: EscalationStrategy, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            escalation,
            ttl,
        }
    }

    /// Open a new session and return its initial snapshot.
    ///
    /// Idle sessions are evicted first.
    pub fn create(&self, mode: Mode) -> SessionSnapshot {
        self.evict_idle();

        let session = TutorSession::new(mode, self.escalation);
        let snapshot = session.snapshot();
        self.sessions.write().unwrap().insert(
            session.id(),
            RegistryEntry {
                session: Arc::new(Mutex::new(session)),
                last_active: Instant::now(),
            },
        );
        snapshot
    }

    /// Drop sessions untouched for longer than the TTL. A session with a
    /// turn in flight is never dropped. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.duration_since(entry.last_active) <= self.ttl || entry.session.try_lock().is_err()
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Remove a session. A turn already in flight still completes.
    pub fn remove(&self, id: &str) -> Result<()> {
        let uuid = parse_id(id)?;
        self.sessions
            .write()
            .unwrap()
            .remove(&uuid)
            .map(|_| ())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Look up a session and mark it active.
    fn get(&self, id: &str) -> Result<Arc<Mutex<TutorSession>>> {
        let uuid = parse_id(id)?;
        let mut sessions = self.sessions.write().unwrap();
        let entry = sessions
            .get_mut(&uuid)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        entry.last_active = Instant::now();
        Ok(entry.session.clone())
    }

    /// Take exclusive ownership of a session for one turn.
    pub fn acquire(&self, id: &str) -> Result<OwnedMutexGuard<TutorSession>> {
        self.get(id)?
            .try_lock_owned()
            .map_err(|_| Error::SessionBusy(id.to_string()))
    }

    /// Snapshot a session, waiting for any in-flight turn to finish.
    pub async fn snapshot(&self, id: &str) -> Result<SessionSnapshot> {
        let session = self.get(id)?;
        let guard = session.lock().await;
        Ok(guard.snapshot())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::SessionNotFound(id.to_string()))
}
