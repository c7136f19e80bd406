//! Lead collection state machine.
//!
//! Stages run in a fixed order and the first unset contact field decides
//! the current stage:
//!
//! AwaitName -> AwaitEmail -> AwaitPhone -> Complete
//!
//! Email and phone checks are shape-only: an address needs `local@domain.tld`
//! made of word characters, dots and dashes, and a phone number must start
//! with at least ten characters from digits, `+`, `-`, `(`, `)` and space.
//! Nothing verifies that either is reachable.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::ChatError;
use crate::session::ConversationState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.\-]+@[\w.\-]+\.\w+$").expect("Invalid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d+\-() ]{10,}").expect("Invalid phone regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStage {
    AwaitName,
    AwaitEmail,
    AwaitPhone,
    Complete,
}

impl LeadStage {
    /// Stage implied by which fields are already set.
    pub fn of(state: &ConversationState) -> Self {
        if state.name.is_none() {
            LeadStage::AwaitName
        } else if state.email.is_none() {
            LeadStage::AwaitEmail
        } else if state.phone.is_none() {
            LeadStage::AwaitPhone
        } else {
            LeadStage::Complete
        }
    }
}

/// Outcome of feeding one message to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadStep {
    /// Field accepted; the text asks for the next one.
    Accepted(String),
    /// Field rejected; state unchanged and the text asks again.
    Rejected { field: &'static str, prompt: String },
    /// Last field accepted. Fires once per lead.
    Completed(String),
    /// Nothing left to collect.
    Idle,
}

impl LeadStep {
    pub fn text(&self) -> Option<&str> {
        match self {
            LeadStep::Accepted(t) | LeadStep::Completed(t) => Some(t),
            LeadStep::Rejected { prompt, .. } => Some(prompt),
            LeadStep::Idle => None,
        }
    }
}

pub fn validate_email(text: &str) -> Result<(), ChatError> {
    if EMAIL_RE.is_match(text) {
        Ok(())
    } else {
        Err(ChatError::Validation {
            field: "email",
            value: text.to_string(),
        })
    }
}

pub fn validate_phone(text: &str) -> Result<(), ChatError> {
    if PHONE_RE.is_match(text) {
        Ok(())
    } else {
        Err(ChatError::Validation {
            field: "phone",
            value: text.to_string(),
        })
    }
}

/// Drives name, email and phone capture over successive messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadCollector;

impl LeadCollector {
    /// Prompt shown when collection starts.
    pub fn opening_prompt(project_type: Option<&str>) -> String {
        let project = match project_type {
            Some(p) => format!("your {p} project"),
            None => "your project".to_string(),
        };
        format!(
            "I'd be happy to help with {project}! So our team can follow up, I'll need your name, \
             email address and phone number. First, could you please share your name?"
        )
    }

    /// Start collecting for a detected project type.
    pub fn begin(&self, state: &mut ConversationState, project_type: Option<String>) -> String {
        state.collecting = true;
        state.project_type = project_type;
        Self::opening_prompt(state.project_type.as_deref())
    }

    /// Consume one message for the current stage.
    pub fn advance(&self, state: &mut ConversationState, text: &str) -> LeadStep {
        let value = text.trim();
        match LeadStage::of(state) {
            LeadStage::AwaitName => {
                if value.is_empty() {
                    return LeadStep::Rejected {
                        field: "name",
                        prompt: "Could you please share your name?".to_string(),
                    };
                }
                state.name = Some(value.to_string());
                LeadStep::Accepted(format!(
                    "Great, thanks {value}! Could you please provide your email address?"
                ))
            }
            LeadStage::AwaitEmail => match validate_email(value) {
                Ok(()) => {
                    state.email = Some(value.to_string());
                    LeadStep::Accepted(
                        "Perfect! What's the best phone number to reach you at?".to_string(),
                    )
                }
                Err(e) => {
                    debug!(error = %e, "Rejected email during lead capture");
                    LeadStep::Rejected {
                        field: "email",
                        prompt: "That doesn't look like a valid email address. Please provide a valid email address."
                            .to_string(),
                    }
                }
            },
            LeadStage::AwaitPhone => match validate_phone(value) {
                Ok(()) => {
                    state.phone = Some(value.to_string());
                    state.collecting = false;
                    let project = state
                        .project_type
                        .as_deref()
                        .map(|p| format!("your {p} project"))
                        .unwrap_or_else(|| "your project".to_string());
                    LeadStep::Completed(format!(
                        "Thank you! Our team will contact you soon about {project}. \
                         Is there anything else you'd like to know about our services?"
                    ))
                }
                Err(e) => {
                    debug!(error = %e, "Rejected phone during lead capture");
                    LeadStep::Rejected {
                        field: "phone",
                        prompt: "Please provide a valid phone number (at least 10 digits).".to_string(),
                    }
                }
            },
            LeadStage::Complete => {
                state.collecting = false;
                LeadStep::Idle
            }
        }
    }
}
