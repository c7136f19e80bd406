//! Plain-text conversation summaries for follow-up by the sales team.

use std::collections::BTreeSet;

use leadline_core::types::{ChatMessage, Sender};

const TOPIC_KEYWORDS: &[&str] = &["mobile", "web", "app", "website", "software"];
const NEED_INDICATORS: &[&str] = &["need", "want", "looking for", "interested in"];
const LEAD_CONFIRMATION: &str = "our team will contact you";

#[derive(Debug, Default, Clone, Copy)]
pub struct ConversationSummarizer;

impl ConversationSummarizer {
    pub fn summarize(&self, messages: &[ChatMessage]) -> String {
        let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
            return "No conversation to summarize".to_string();
        };

        let minutes = (last.timestamp - first.timestamp).num_minutes().max(0);
        let topics = Self::topics(messages);
        let needs = Self::needs(messages);
        let actions = Self::action_items(messages, !needs.is_empty());

        [
            "Conversation Summary:".to_string(),
            format!("Duration: {minutes} minutes"),
            format!("Topics Discussed: {}", join_or_none(topics.into_iter())),
            format!("User Needs: {}", join_or_none(needs.into_iter())),
            format!("Action Items: {}", join_or_none(actions.into_iter())),
        ]
        .join("\n")
    }

    fn user_messages(messages: &[ChatMessage]) -> impl Iterator<Item = &ChatMessage> {
        messages.iter().filter(|m| m.sender == Sender::User)
    }

    fn topics(messages: &[ChatMessage]) -> BTreeSet<String> {
        Self::user_messages(messages)
            .flat_map(|m| m.content.split_whitespace())
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| TOPIC_KEYWORDS.contains(&w.as_str()))
            .collect()
    }

    fn needs(messages: &[ChatMessage]) -> Vec<String> {
        Self::user_messages(messages)
            .filter(|m| {
                let lower = m.content.to_lowercase();
                NEED_INDICATORS.iter().any(|ind| lower.contains(ind))
            })
            .map(|m| m.content.trim().to_string())
            .collect()
    }

    fn action_items(messages: &[ChatMessage], has_needs: bool) -> Vec<String> {
        let lead_captured = messages
            .iter()
            .any(|m| m.sender == Sender::Bot && m.content.to_lowercase().contains(LEAD_CONFIRMATION));

        let mut items = Vec::new();
        if lead_captured {
            items.push("Follow up with the captured lead".to_string());
        } else if has_needs {
            items.push("Collect contact details on the next visit".to_string());
        }
        items
    }
}

fn join_or_none(items: impl Iterator<Item = String>) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}
