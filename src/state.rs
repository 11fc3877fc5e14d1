//! Transcript data types
//!
//! A `Message` never changes after it is created; the session only ever
//! appends new ones.

use serde::{Deserialize, Serialize};

/// First entry of every transcript
pub const GREETING: &str = "Hello! Ask me anything.";

/// Shown when the endpoint answered with an empty body
pub const NO_RESPONSE: &str = "No response from server";

/// Shown when the request failed for any reason
pub const CONNECTION_ERROR: &str = "Error connecting to server.";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

impl Origin {
    pub fn label(&self) -> &'static str {
        match self {
            Origin::User => "You",
            Origin::Assistant => "Bot",
        }
    }
}

/// One entry of the visible conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    origin: Origin,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            text: text.into(),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
