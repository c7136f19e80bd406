use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Author of a logged chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    /// Parse the stored representation. Unknown values are treated as bot
    /// output so legacy rows still render.
    pub fn parse(s: &str) -> Self {
        match s {
            "user" => Sender::User,
            _ => Sender::Bot,
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category tag attached to every knowledge fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentCategory {
    CompanyInfo,
    Product,
}

impl FragmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentCategory::CompanyInfo => "company_info",
            FragmentCategory::Product => "product",
        }
    }
}

/// Review status of a submitted contact form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    #[default]
    New,
    Contacted,
    Closed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Contacted => "contacted",
            ContactStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "contacted" => ContactStatus::Contacted,
            "closed" => ContactStatus::Closed,
            _ => ContactStatus::New,
        }
    }
}

// =============================================================================
// Structs
// =============================================================================

/// Plain text fragment fed to the similarity index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFragment {
    pub text: String,
    pub category: FragmentCategory,
}

/// One append-only entry in a session's message log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub session_id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Captured lead handed to the persistence gateway once all three contact
/// fields have validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub project_type: Option<String>,
    pub session_id: String,
}

/// Result of a persistence write. Failures carry a human readable detail
/// instead of an error so callers can log and move on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub ok: bool,
    pub detail: String,
}

impl SaveOutcome {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_round_trip_strings() {
        assert_eq!(Sender::parse(Sender::User.as_str()), Sender::User);
        assert_eq!(Sender::parse(Sender::Bot.as_str()), Sender::Bot);
        assert_eq!(Sender::parse("assistant"), Sender::Bot);
        assert_eq!(Sender::User.to_string(), "user");
    }

    #[test]
    fn test_sender_serializes_snake_case() {
        let json = serde_json::to_string(&Sender::User).unwrap();
        assert_eq!(json, "\"user\"");
    }

    #[test]
    fn test_fragment_category_tags() {
        assert_eq!(FragmentCategory::CompanyInfo.as_str(), "company_info");
        let json = serde_json::to_string(&FragmentCategory::Product).unwrap();
        assert_eq!(json, "\"product\"");
    }

    #[test]
    fn test_contact_status_defaults_to_new() {
        assert_eq!(ContactStatus::default(), ContactStatus::New);
        assert_eq!(ContactStatus::parse("bogus"), ContactStatus::New);
        assert_eq!(ContactStatus::parse("closed"), ContactStatus::Closed);
    }

    #[test]
    fn test_save_outcome_constructors() {
        let ok = SaveOutcome::ok("stored");
        assert!(ok.ok);
        assert_eq!(ok.detail, "stored");
        assert!(!SaveOutcome::failed("disk full").ok);
    }
}
