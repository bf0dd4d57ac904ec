//! Core conversation types for tutorgate
//!
//! These types are the normalized shape every backend adapter consumes and
//! produces. Provider-specific payloads never leave the adapter modules.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Mode** | Conversational policy: Socratic tutor or direct-answer buddy |
//! | **Backend** | One adapter in a mode's priority list (OpenAI, Gemini, canned) |
//! | **Turn** | One user message plus the assistant reply the router produced |
//! | **Terminal reply** | The canned answer used when every backend failed |

use serde::{Deserialize, Serialize};

// ============================================
// Roles and modes
// ============================================

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Conversational policy for a session.
///
/// The UI calls these "tutor" and "buddy"; both spellings are accepted when
/// deserializing or parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Guided questions, direct answers only as frustration rises
    #[default]
    #[serde(alias = "tutor")]
    Socratic,
    /// Short, direct answers
    #[serde(alias = "buddy")]
    Direct,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Socratic => "socratic",
            Mode::Direct => "direct",
        }
    }

    /// Name shown to students
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Socratic => "Socratic Tutor",
            Mode::Direct => "Buddy",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "socratic" | "tutor" => Ok(Mode::Socratic),
            "direct" | "buddy" => Ok(Mode::Direct),
            _ => Err(format!("unknown mode: {}", s)),
        }
    }
}

// ============================================
// Messages
// ============================================

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    /// Mode that produced an assistant message (absent for user turns)
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "assistant")]
    pub mode: Option<Mode>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            mode: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            mode: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            mode: None,
        }
    }

    /// Tag this message with the mode that produced it.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Provider token accounting, when the provider reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

/// What a backend adapter returns on success.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub message: ConversationMessage,
    pub usage: Option<Usage>,
}

impl BackendReply {
    /// Plain assistant reply without usage data.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: ConversationMessage::assistant(content),
            usage: None,
        }
    }

    /// True if the reply carries text a student could read.
    pub fn is_usable(&self) -> bool {
        !self.message.content.trim().is_empty()
    }
}

// ============================================
// Backends
// ============================================

/// Built-in backend adapters, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAI,
    Gemini,
    Canned,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAI => "openai",
            BackendKind::Gemini => "gemini",
            BackendKind::Canned => "canned",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(BackendKind::OpenAI),
            "gemini" | "google" => Ok(BackendKind::Gemini),
            "canned" | "fallback" => Ok(BackendKind::Canned),
            _ => Err(format!("unknown backend: {}", s)),
        }
    }
}

/// One failed adapter attempt within a turn.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAttempt {
    pub backend: String,
    pub error: String,
}

/// Result of routing one turn.
#[derive(Debug, Clone, Serialize)]
pub struct RouteOutcome {
    pub message: ConversationMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Adapter that produced the reply, or `terminal`
    pub backend: String,
    /// Adapters that failed before the reply was produced
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<FailedAttempt>,
}

impl RouteOutcome {
    /// True when every adapter failed and the terminal reply was used.
    pub fn is_terminal(&self) -> bool {
        self.backend == crate::router::TERMINAL_BACKEND
    }
}
