//! Prompt templates and chat message types.

use serde::{Deserialize, Serialize};

use crate::backend::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Identity used to fill the templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub assistant_name: String,
    pub company_name: String,
}

impl Persona {
    pub fn new(assistant_name: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            company_name: company_name.into(),
        }
    }

    /// System instruction for the direct-completion backend.
    pub fn system_instruction(&self) -> String {
        format!(
            "I am {name}, a professional assistant from {company}. My primary goals are:\n\
             1. Introduce myself to new users\n\
             2. Collect customer information (name, email, service interest)\n\
             3. Provide accurate information about {company} products and services\n\
             4. Stay focused on company-related topics\n\
             5. Help schedule consultations\n\n\
             Keep responses concise and professional. Always ask for contact details if the user shows interest in our services.",
            name = self.assistant_name,
            company = self.company_name,
        )
    }

    /// Fill the retrieval-augmented template.
    ///
    /// `history` is rendered as alternating `Human:` / `Assistant:` lines.
    pub fn retrieval_prompt(&self, history: &[Turn], context: &str, input: &str) -> String {
        let mut rendered_history = String::new();
        for turn in history {
            rendered_history.push_str(&format!(
                "Human: {}\nAssistant: {}\n",
                turn.user, turn.assistant
            ));
        }

        format!(
            "You are {name}, {company}'s professional sales assistant. Your primary goals are:\n\
             1. Introduce yourself as {company}'s AI assistant\n\
             2. Ask about visitor's business needs\n\
             3. Share relevant {company} products/services based on their needs\n\
             4. Always try to collect visitor information (name, email, phone) for follow-up\n\
             5. Keep responses focused on {company} offerings only\n\n\
             Rules:\n\
             - Keep responses under 3 sentences\n\
             - Always mention specific {company} products when relevant\n\
             - If user shows interest, ask for their contact details\n\
             - Don't discuss topics unrelated to {company} services\n\n\
             Current conversation:\n{history}\n\
             Context:\n{context}\n\n\
             Human: {input}\n\
             Assistant: ",
            name = self.assistant_name,
            company = self.company_name,
            history = rendered_history,
            context = context,
            input = input,
        )
    }
}

/// Context message for the direct-completion request.
pub fn context_message(context: Option<&str>) -> PromptMessage {
    match context {
        Some(ctx) if !ctx.trim().is_empty() => PromptMessage::system(format!("Context: {ctx}")),
        _ => PromptMessage::system("No specific context available."),
    }
}
