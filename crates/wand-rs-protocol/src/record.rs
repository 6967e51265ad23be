use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speaker role for a transcript record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Assistant-authored turn.
    #[default]
    Assistant,
    /// User-authored turn.
    User,
    /// Tool output turn.
    Tool,
}

impl Role {
    /// Every role, in the order the editor offers them.
    pub const ALL: [Role; 3] = [Role::Assistant, Role::User, Role::Tool];

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Returned when a string names a role outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0:?} (expected assistant, user, or tool)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "assistant" => Ok(Role::Assistant),
            "user" => Ok(Role::User),
            "tool" => Ok(Role::Tool),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A single labeled turn of a transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Role that produced the turn.
    pub role: Role,
    /// Turn content.
    pub content: String,
}

impl Record {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Empty assistant turn, used for freshly inserted rows.
    pub fn blank() -> Self {
        Self::default()
    }
}

/// A record the model proposed to amend, paired with the amendment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrectionResult {
    /// Index of the source record in the snapshot the run was given.
    pub position: usize,
    /// Role of the source record.
    pub role: Role,
    /// Original content, shown struck through.
    pub content: String,
    /// Model-proposed replacement text.
    #[serde(rename = "amendedText")]
    pub amended_text: String,
}
