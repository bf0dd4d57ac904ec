//! Canned response engine
//!
//! The deterministic safety net behind every live backend. A query is
//! bucketed by keyword into a topic category and one of that category's
//! pre-authored responses is picked with an injected random source. The
//! engine never fabricates text and never fails.

use crate::frustration;
use crate::types::Mode;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use regex::Regex;
use std::sync::{Mutex, OnceLock};

/// Topic bucket for a student query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Frustrated,
    Math,
    Science,
    History,
    Literature,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Frustrated => "frustrated",
            Category::Math => "math",
            Category::Science => "science",
            Category::History => "history",
            Category::Literature => "literature",
            Category::General => "general",
        }
    }

    /// The pre-authored responses for this category.
    pub fn responses(&self) -> &'static [&'static str] {
        match self {
            Category::Frustrated => FRUSTRATED_RESPONSES,
            Category::Math => MATH_RESPONSES,
            Category::Science => SCIENCE_RESPONSES,
            Category::History => HISTORY_RESPONSES,
            Category::Literature => LITERATURE_RESPONSES,
            Category::General => GENERAL_RESPONSES,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frustrated" => Ok(Category::Frustrated),
            "math" => Ok(Category::Math),
            "science" => Ok(Category::Science),
            "history" => Ok(Category::History),
            "literature" => Ok(Category::Literature),
            "general" => Ok(Category::General),
            _ => Err(format!("unknown category: {}", s)),
        }
    }
}

pub const MATH_RESPONSES: &[&str] = &[
    "Let's think about this math problem step by step. What information do we know, and what are we trying to find?",
    "Can you identify any formulas or principles that might be relevant to this math problem?",
    "What happens if we try a simpler version of this problem first?",
    "How would you approach this if the numbers were smaller or easier to work with?",
    "What mathematical patterns do you notice in this problem?",
];

pub const SCIENCE_RESPONSES: &[&str] = &[
    "What scientific principles might apply in this situation?",
    "How could we design an experiment to test this scientific hypothesis?",
    "Can you predict what might happen if we change one variable in this scientific scenario?",
    "How does this relate to other scientific phenomena we've observed?",
    "What evidence would support or refute this scientific claim?",
];

pub const HISTORY_RESPONSES: &[&str] = &[
    "What historical context is important to understand this event?",
    "How might different historical perspectives view this event differently?",
    "What were the causes and effects of this historical event?",
    "How might history have unfolded differently if this event hadn't occurred?",
    "What primary sources could help us better understand this historical period?",
];

pub const LITERATURE_RESPONSES: &[&str] = &[
    "What themes do you notice in this text?",
    "How does the author use literary devices to convey meaning?",
    "How would you compare this work to others we've discussed?",
    "What might the author be trying to say about human nature or society?",
    "How do the characters develop throughout the story?",
];

pub const GENERAL_RESPONSES: &[&str] = &[
    "Can you explain what you already know about this topic?",
    "What part of this problem is giving you the most difficulty?",
    "What approaches have you considered so far?",
    "How would you explain this concept to someone else?",
    "What would happen if we approached this from a different angle?",
];

pub const FRUSTRATED_RESPONSES: &[&str] = &[
    "I understand you'd like a direct answer. Based on your question, the key concept here is understanding the process rather than just the answer. Let me explain it clearly: start by identifying what you know, then apply the relevant principles step by step.",
    "I can see you want a straightforward explanation. The answer to your question involves several principles working together. The most important thing to understand is how these elements connect, which is...",
    "I'll give you a direct answer: this topic requires understanding both the fundamental concepts and their applications. The main point is to recognize the patterns and relationships between the different elements.",
    "Here's the direct information you're looking for: when approaching this type of problem, start with the basic principles, then systematically work through each step while checking your assumptions.",
    "Let me answer your question directly: the key to understanding this topic is recognizing how the core concepts build upon each other. The most important aspect is...",
];

/// Static replies used when the router is configured for a static terminal fallback.
pub const TUTOR_FRUSTRATED_APOLOGY: &str = "I understand your frustration. To answer your question directly: you should focus on understanding the core principles first, then apply them to your specific problem. Let's break it down step by step in a more straightforward way.";
pub const TUTOR_APOLOGY: &str = "I'll help you work through this. What specific part of the problem are you struggling with? Let's approach it methodically.";
pub const BUDDY_APOLOGY: &str = "Based on your question, here's what you need to know: The key concepts involved are interrelated and build on fundamental principles. I'd need more specific details to give you a complete answer, but I hope this helps you get started.";

/// Mode-appropriate static apology.
pub fn static_apology(mode: Mode, frustrated: bool) -> &'static str {
    match (mode, frustrated) {
        (Mode::Socratic, true) => TUTOR_FRUSTRATED_APOLOGY,
        (Mode::Socratic, false) => TUTOR_APOLOGY,
        (Mode::Direct, _) => BUDDY_APOLOGY,
    }
}

struct SubjectPatterns {
    ordered: Vec<(Category, Regex)>,
}

fn subject_patterns() -> &'static SubjectPatterns {
    static PATTERNS: OnceLock<SubjectPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table = [
            (
                Category::Math,
                r"(\bmath\b|equation|formula|calculate|solve for|algebra|geometry|calculus|trigonometry|number)",
            ),
            (
                Category::Science,
                r"(\bscience\b|physics|chemistry|biology|experiment|hypothesis|theory|molecule|atom|cell|organism|energy)",
            ),
            (
                Category::History,
                r"(\bhistory\b|century|war|revolution|ancient|medieval|civilization|empire|king|queen|president|nation)",
            ),
            (
                Category::Literature,
                r"(\bliterature\b|novel|poem|character|author|story|theme|symbolism|metaphor|book|read|writing)",
            ),
        ];
        SubjectPatterns {
            ordered: table
                .into_iter()
                .filter_map(|(category, pattern)| match Regex::new(pattern) {
                    Ok(re) => Some((category, re)),
                    Err(e) => {
                        tracing::error!(category = category.as_str(), error = %e, "Invalid subject pattern");
                        None
                    }
                })
                .collect(),
        }
    })
}

/// Resolve the category of a query. Frustration wins over subject keywords.
pub fn categorize(query: &str) -> Category {
    if frustration::is_frustrated(query) {
        return Category::Frustrated;
    }

    let lower = query.to_lowercase();
    subject_patterns()
        .ordered
        .iter()
        .find(|(_, re)| re.is_match(&lower))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// Canned response engine with an injected random source.
pub struct CannedEngine {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl CannedEngine {
    /// Engine backed by OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Engine with a reproducible sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Engine with a caller-supplied random source.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Categorize `last_user_message` and pick one of the category's responses.
    pub fn respond(&self, last_user_message: &str) -> &'static str {
        self.respond_in(categorize(last_user_message))
    }

    /// Pick one of `category`'s responses.
    pub fn respond_in(&self, category: Category) -> &'static str {
        let responses = match category.responses() {
            [] => GENERAL_RESPONSES,
            list => list,
        };
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        responses
            .choose(&mut *rng)
            .copied()
            .unwrap_or(GENERAL_RESPONSES[0])
    }
}

impl Default for CannedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CannedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CannedEngine").finish_non_exhaustive()
    }
}
