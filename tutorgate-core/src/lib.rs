//! # tutorgate-core
//!
//! Core library for tutorgate - a routing and fallback layer for
//! AI tutoring chats.
//!
//! This library provides:
//! - Frustration classification and escalation state
//! - Backend adapters for OpenAI-style and Gemini providers
//! - The tutor router with ordered fallback and a canned terminal reply
//! - Chat sessions with mode switching
//! - An axum HTTP API
//! - A knowledge base of topics and documents over a collection store
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! One turn flows in one direction:
//!
//! ```text
//! session ─► router ─► frustration level
//!               │
//!               ├─► backend[0] ─► backend[1] ─► ... (first success wins)
//!               │
//!               └─► canned engine (every backend failed)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use tutorgate_core::{Config, ConversationMessage, Mode, TutorRouter};
//!
//! # async fn run() -> tutorgate_core::Result<()> {
//! let config = Config::load()?;
//! let router = TutorRouter::from_config(&config)?;
//!
//! let conversation = vec![ConversationMessage::user("How do I solve this quadratic equation?")];
//! let outcome = router.route(&conversation, Mode::Socratic).await?;
//! println!("[{}] {}", outcome.backend, outcome.message.content);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use backends::TutorBackend;
pub use canned::CannedEngine;
pub use config::Config;
pub use error::{Error, Result};
pub use frustration::{EscalationStrategy, FrustrationState};
pub use kb::KnowledgeBase;
pub use router::TutorRouter;
pub use session::{SessionRegistry, TutorSession};
pub use store::{CollectionStore, MemoryStore, SqliteStore};
pub use types::*;

// Public modules
pub mod api;
pub mod backends;
pub mod canned;
pub mod config;
pub mod error;
pub mod frustration;
pub mod kb;
pub mod logging;
pub mod prompts;
pub mod router;
pub mod session;
pub mod store;
pub mod types;
