//! Canned replies and post-processing of generated text.

use leadline_core::KnowledgeBase;

/// Fixed reply texts for one assistant persona.
#[derive(Debug, Clone)]
pub struct CannedReplies {
    assistant_name: String,
    company_name: String,
}

pub const APOLOGY: &str =
    "I apologize, but I'm having trouble generating a response right now. Please try again in a moment.";

pub const TOO_BUSY: &str =
    "We're receiving a lot of questions right now. Please wait a moment and try again.";

impl CannedReplies {
    pub fn new(assistant_name: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            company_name: company_name.into(),
        }
    }

    pub fn greeting(&self) -> String {
        format!(
            "Hello! I'm {name}, {company}'s AI assistant. We specialize in custom software solutions for businesses.\n\n\
             How may I help you today? I can:\n\
             1. Discuss our software products and services\n\
             2. Share information about our development expertise\n\
             3. Help schedule a consultation with our team",
            name = self.assistant_name,
            company = self.company_name,
        )
    }

    pub fn greeting_again(&self) -> String {
        "Hello again! What would you like to know about our services?".to_string()
    }

    pub fn ai_capabilities(&self) -> String {
        format!(
            "{company} builds practical AI solutions, including:\n\
             - Customer support chatbots trained on your own documentation\n\
             - Intelligent assistants that automate routine business processes\n\
             - Integration of AI features into existing software and mobile apps\n\
             Would you like to discuss an AI project?",
            company = self.company_name,
        )
    }

    pub fn location(&self, kb: &KnowledgeBase) -> String {
        format!(
            "Our office is located at {}. We'd be glad to meet and discuss your project.",
            kb.company.location
        )
    }

    pub fn off_topic(&self) -> String {
        format!(
            "I'm not sure how that relates to what we were discussing. I can help with {}'s software services, \
             products and projects. Could you tell me more about what you need?",
            self.company_name
        )
    }

    pub fn clarify(&self) -> String {
        "I didn't catch that. Could you tell me what you'd like to know?".to_string()
    }

    pub fn too_long(&self, max: usize) -> String {
        format!("That message is a bit long for me. Could you shorten it to under {max} characters?")
    }
}

/// Trim generated text and, when it exceeds `max_chars`, keep only the
/// leading whole sentences that fit. The first sentence is always kept.
/// A `max_chars` of zero disables truncation.
pub fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut total = 0usize;
    for sentence in text.split(". ") {
        let len = sentence.chars().count();
        if kept.is_empty() || total + len <= max_chars {
            kept.push(sentence);
            total += len + 2;
        } else {
            break;
        }
    }

    let mut out = kept.join(". ");
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replies() -> CannedReplies {
        CannedReplies::new("Ava", "Brightlogic Systems")
    }

    #[test]
    fn test_greeting_introduces_assistant() {
        let text = replies().greeting();
        assert!(text.starts_with("Hello! I'm Ava, Brightlogic Systems's AI assistant."));
        assert!(text.contains("3. Help schedule a consultation"));
    }

    #[test]
    fn test_location_uses_knowledge_base() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(replies().location(&kb).contains("Toronto"));
    }

    // ---- shorten ----

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(shorten("  We build apps.  ", 150), "We build apps.");
    }

    #[test]
    fn test_zero_disables() {
        let long = "a".repeat(500);
        assert_eq!(shorten(&long, 0), long);
    }

    #[test]
    fn test_cuts_on_sentence_boundary() {
        let text = "We build mobile apps. We also build websites. Our team is based in Toronto and works worldwide.";
        let out = shorten(text, 50);
        assert_eq!(out, "We build mobile apps. We also build websites.");
    }

    #[test]
    fn test_adds_final_period() {
        let text = "First part is here. Second part that is long enough to overflow the limit";
        assert_eq!(shorten(text, 30), "First part is here.");
    }

    #[test]
    fn test_first_sentence_kept_even_if_long() {
        let text = format!("{}. tail", "x".repeat(40));
        assert_eq!(shorten(&text, 10), format!("{}.", "x".repeat(40)));
    }

    #[test]
    fn test_question_mark_not_doubled() {
        let text = "Would you like us to prepare a detailed quote for your project?";
        assert_eq!(shorten(text, 20), text);
    }
}
