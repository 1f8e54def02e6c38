use std::fmt;

use serde::{Deserialize, Serialize};

/// Events pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    FileAvailable { name: String },
}

impl NotificationEvent {
    pub fn file_available(name: impl Into<String>) -> Self {
        NotificationEvent::FileAvailable { name: name.into() }
    }

    /// Text frame payload as the browser client expects it.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationEvent::FileAvailable { name } => write!(f, "File available: {}", name),
        }
    }
}
