//! Context relevance gate.
//!
//! After a reply has been generated, the topic words it contains become the
//! session's context keywords. The next message must share at least one of
//! them or it is treated as topic drift and answered with a clarification
//! instead of a backend call. With no keywords on record every message passes.

use std::collections::BTreeSet;

use crate::session::ContextMemory;

/// Fixed vocabulary of topic words recognised in replies.
pub const TOPIC_VOCABULARY: &[&str] = &[
    "ai",
    "app",
    "application",
    "applications",
    "apps",
    "automation",
    "business",
    "chatbot",
    "chatbots",
    "cloud",
    "consultation",
    "consulting",
    "cost",
    "deployment",
    "design",
    "develop",
    "development",
    "erp",
    "flutter",
    "integration",
    "inventory",
    "location",
    "maintenance",
    "management",
    "mobile",
    "office",
    "price",
    "pricing",
    "process",
    "product",
    "products",
    "project",
    "projects",
    "python",
    "quote",
    "react",
    "service",
    "services",
    "software",
    "solution",
    "solutions",
    "support",
    "system",
    "systems",
    "technologies",
    "technology",
    "testing",
    "web",
    "website",
    "websites",
];

/// Lower-cased whitespace tokens with surrounding punctuation removed.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}

/// Topic words from the vocabulary that occur in `text`.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    tokens(text)
        .filter(|t| TOPIC_VOCABULARY.binary_search(&t.as_str()).is_ok())
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextRelevanceGate;

impl ContextRelevanceGate {
    pub fn is_relevant(&self, memory: &ContextMemory, text: &str) -> bool {
        if !memory.has_context() {
            return true;
        }
        tokens(text).any(|t| memory.context_keywords.contains(&t))
    }

    /// Record a generated reply as the session's context.
    pub fn remember(&self, memory: &mut ContextMemory, reply: &str) {
        memory.context_keywords = extract_keywords(reply);
        memory.previous_context = Some(reply.to_string());
    }
}
