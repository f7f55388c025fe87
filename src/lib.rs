//! Banking Prompt-Chain Assistant
//!
//! Routes a customer's free-text banking request through a fixed chain of
//! Gemini calls, threading a per-conversation session between them:
//! - interprets the customer's intent
//! - picks one service category (one or two calls)
//! - collects the details that category needs, turn by turn
//! - writes a closing confirmation once enough is known
//!
//! CHAIN:
//! INTERPRET → CATEGORIZE → EXTRACT ⟲ → FINALIZE → RESOLVED

pub mod api;
pub mod category;
pub mod chain;
pub mod config;
pub mod driver;
pub mod error;
pub mod extraction;
pub mod gemini;
pub mod prompts;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Result;

// Re-export common types
pub use category::Category;
pub use chain::{CategoryStrategy, PromptChainProcessor};
pub use config::AppConfig;
pub use driver::{ChainDriver, TurnOutcome, TurnReply};
pub use gemini::{GeminiClient, ModelClient};
pub use session::{MessageRole, Session};
