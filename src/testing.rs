//! Scripted model client for tests

use crate::error::ChainError;
use crate::gemini::ModelClient;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Replays queued replies in order and records every prompt it receives.
///
/// `Err(detail)` entries surface as transport failures. Running past the end
/// of the script is also a transport failure.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
        let replies: VecDeque<_> = replies
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();

        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn call_with_prompt(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text.trim().to_string()),
            Some(Err(detail)) => Err(ChainError::Transport(detail)),
            None => Err(ChainError::Transport("script exhausted".to_string())),
        }
    }
}
