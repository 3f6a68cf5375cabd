use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One committed entry of the transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    text: String,
    speaker: Speaker,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: Speaker::User,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker: Speaker::Assistant,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }
}
