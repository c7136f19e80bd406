//! Keyword intent table.
//!
//! Rows are evaluated top to bottom and the first row with a matching
//! pattern wins. Anything that matches no row goes to the response backends.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Greeting,
    Services,
    AiCapabilities,
    Process,
    Location,
    ProjectInterest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Services,
    AiCapabilities,
    Process,
    Location,
    /// Carries the first project keyword found, in singular form.
    ProjectInterest { project_type: String },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Greeting => IntentKind::Greeting,
            Intent::Services => IntentKind::Services,
            Intent::AiCapabilities => IntentKind::AiCapabilities,
            Intent::Process => IntentKind::Process,
            Intent::Location => IntentKind::Location,
            Intent::ProjectInterest { .. } => IntentKind::ProjectInterest,
        }
    }
}

struct IntentRow {
    kind: IntentKind,
    patterns: Vec<Regex>,
}

static INTENT_TABLE: LazyLock<Vec<IntentRow>> = LazyLock::new(|| {
    let row = |kind: IntentKind, pats: &[&str]| IntentRow {
        kind,
        patterns: pats
            .iter()
            .map(|p| Regex::new(p).expect("Invalid intent regex"))
            .collect(),
    };

    vec![
        row(
            IntentKind::Greeting,
            &[
                r"(?i)^\s*(hi|hello|hey|hiya|greetings)\b",
                r"(?i)^\s*good\s+(morning|afternoon|evening)\b",
            ],
        ),
        row(
            IntentKind::Services,
            &[
                r"(?i)\bservices?\b",
                r"(?i)\bautomat(e|ion|ing)\b",
                r"(?i)\bconsult(ing|ancy|ant)?\b",
                r"(?i)\bwhat\s+do\s+you\s+(do|offer)\b",
            ],
        ),
        row(
            IntentKind::AiCapabilities,
            &[
                r"(?i)\bai\b",
                r"(?i)\bchat\s?bots?\b",
                r"(?i)\bartificial\s+intelligence\b",
                r"(?i)\bmachine\s+learning\b",
            ],
        ),
        row(
            IntentKind::Process,
            &[
                r"(?i)\bprocess\b",
                r"(?i)\bmethodolog(y|ies)\b",
                r"(?i)\bhow\s+do\s+you\s+work\b",
                r"(?i)\bworkflow\b",
                r"(?i)\bagile\b",
            ],
        ),
        row(
            IntentKind::Location,
            &[
                r"(?i)\blocation\b",
                r"(?i)\blocated\b",
                r"(?i)\bwhere\s+are\s+you\b",
                r"(?i)\baddress\b",
                r"(?i)\boffices?\b",
            ],
        ),
        row(IntentKind::ProjectInterest, &[PROJECT_PATTERN]),
    ]
});

const PROJECT_PATTERN: &str =
    r"(?i)\b(apps?|applications?|mobile|websites?|software|systems?)\b";

static PROJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROJECT_PATTERN).expect("Invalid project regex"));

/// First project keyword in `text`, singular and lower-cased.
pub fn project_type(text: &str) -> Option<String> {
    let m = PROJECT_RE.find(text)?;
    let word = m.as_str().to_lowercase();
    let singular = match word.as_str() {
        "software" => word,
        w => w.strip_suffix('s').unwrap_or(w).to_string(),
    };
    Some(singular)
}

/// Classify an utterance, or `None` when it should go to the backends.
pub fn classify(text: &str) -> Option<Intent> {
    let row = INTENT_TABLE
        .iter()
        .find(|row| row.patterns.iter().any(|p| p.is_match(text)))?;

    Some(match row.kind {
        IntentKind::Greeting => Intent::Greeting,
        IntentKind::Services => Intent::Services,
        IntentKind::AiCapabilities => Intent::AiCapabilities,
        IntentKind::Process => Intent::Process,
        IntentKind::Location => Intent::Location,
        IntentKind::ProjectInterest => Intent::ProjectInterest {
            project_type: project_type(text)?,
        },
    })
}
