//! Per-conversation session state
//!
//! Holds the rolling transcript plus the state the chain threads between
//! turns: the chosen category, the interpreted intent and the collected
//! field map for the open topic.

use crate::category::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const GREETING: &str =
    "Hello! Welcome. I'm your secure AI banking assistant. How can I help you today?";

/// Role of a transcript entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single entry in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    transcript: Vec<Turn>,
    category: Option<Category>,
    interpreted_intent: Option<String>,
    collected_data: Map<String, Value>,
    /// Number of topics that reached the resolved state
    topics_resolved: u32,
}

impl Session {
    /// New session whose transcript opens with the assistant greeting
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(session_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            created_at: now,
            updated_at: now,
            transcript: vec![Turn::new(MessageRole::Assistant, GREETING)],
            category: None,
            interpreted_intent: None,
            collected_data: Map::new(),
            topics_resolved: 0,
        }
    }

    // =============================
    // Transcript
    // =============================

    pub fn push_turn(&mut self, role: MessageRole, text: impl Into<String>) {
        self.transcript.push(Turn::new(role, text));
        self.updated_at = Utc::now();
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.transcript.last()
    }

    /// Transcript rendered for a terminal, one block per turn
    pub fn formatted_transcript(&self) -> String {
        let mut out = String::new();

        for turn in &self.transcript {
            let role = match turn.role {
                MessageRole::User => "You",
                MessageRole::Assistant => "Assistant",
            };
            out.push_str(&format!(
                "[{}] {}: {}\n\n",
                turn.timestamp.format("%H:%M:%S"),
                role,
                turn.text
            ));
        }

        out
    }

    // =============================
    // Topic state
    // =============================

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn interpreted_intent(&self) -> Option<&str> {
        self.interpreted_intent.as_deref()
    }

    pub fn collected_data(&self) -> &Map<String, Value> {
        &self.collected_data
    }

    pub fn topics_resolved(&self) -> u32 {
        self.topics_resolved
    }

    /// Open a topic. Starts a fresh collected-data map.
    pub fn open_topic(&mut self, category: Category, interpreted_intent: String) {
        self.category = Some(category);
        self.interpreted_intent = Some(interpreted_intent);
        self.collected_data = Map::new();
        self.updated_at = Utc::now();
    }

    /// Shallow union: incoming keys overwrite, other keys are kept
    pub fn merge_collected(&mut self, incoming: Map<String, Value>) {
        if incoming.is_empty() {
            return;
        }
        self.collected_data.extend(incoming);
        self.updated_at = Utc::now();
    }

    /// Mark the open topic resolved. With `reset` the next message starts a
    /// new topic; without it the category stays for the rest of the session.
    pub fn resolve_topic(&mut self, reset: bool) {
        self.topics_resolved += 1;
        if reset {
            self.category = None;
            self.interpreted_intent = None;
            self.collected_data = Map::new();
        }
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
