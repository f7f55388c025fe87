//! Prompt chain processor
//!
//! One method per stage: format the stage's template, call the model, hand
//! the text back. The processor keeps no conversation state; everything that
//! survives between turns lives in the caller's `Session`.
//!
//! INTERPRET → (SUGGEST →) SELECT → EXTRACT → FINALIZE

use crate::category::Category;
use crate::error::ChainError;
use crate::gemini::ModelClient;
use crate::prompts::{self, StageParams};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// How the category is chosen on the first turn of a topic
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStrategy {
    /// One call picks the category from the full catalog
    Direct,
    /// One call suggests candidates, a second narrows them to one
    #[default]
    SuggestThenSelect,
}

impl FromStr for CategoryStrategy {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "direct" | "single" => Ok(CategoryStrategy::Direct),
            "suggest_then_select" | "two_step" => Ok(CategoryStrategy::SuggestThenSelect),
            other => Err(ChainError::Config(format!(
                "unknown category strategy {:?} (expected direct or suggest_then_select)",
                other
            ))),
        }
    }
}

impl fmt::Display for CategoryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CategoryStrategy::Direct => "direct",
            CategoryStrategy::SuggestThenSelect => "suggest_then_select",
        };
        write!(f, "{}", s)
    }
}

pub struct PromptChainProcessor {
    model: Arc<dyn ModelClient>,
    strategy: CategoryStrategy,
}

impl PromptChainProcessor {
    pub fn new(model: Arc<dyn ModelClient>, strategy: CategoryStrategy) -> Self {
        Self { model, strategy }
    }

    pub fn strategy(&self) -> CategoryStrategy {
        self.strategy
    }

    async fn call(&self, stage: &'static str, prompt: String, params: StageParams) -> Result<String> {
        debug!(stage, "Running chain stage");
        self.model
            .call_with_prompt(&prompt, params.temperature, params.max_tokens)
            .await
    }

    /// Like `call`, but an empty answer is an error
    async fn call_required(&self, stage: &'static str, prompt: String, params: StageParams) -> Result<String> {
        let text = self.call(stage, prompt, params).await?;
        if text.trim().is_empty() {
            return Err(ChainError::EmptyReply);
        }
        Ok(text)
    }

    /// Stage 1: paraphrase the raw message into a statement of need
    pub async fn interpret_intent(&self, user_input: &str) -> Result<String> {
        self.call_required("interpret", prompts::interpret_intent(user_input), prompts::INTERPRET)
            .await
    }

    /// Stage 2a: plausible categories, as free text
    pub async fn suggest_categories(&self, interpreted: &str) -> Result<String> {
        self.call_required("suggest", prompts::suggest_categories(interpreted), prompts::SUGGEST)
            .await
    }

    /// Stage 2b: narrow suggestions to exactly one category
    pub async fn select_category(&self, interpreted: &str, suggested: &str) -> Result<Category> {
        let reply = self
            .call_required("select", prompts::select_category(interpreted, suggested), prompts::SELECT)
            .await?;
        Ok(Category::from_model_reply(&reply))
    }

    /// Stage 2 (single call): pick one category from the catalog
    pub async fn select_category_direct(&self, interpreted: &str) -> Result<Category> {
        let reply = self
            .call_required("select", prompts::select_category_direct(interpreted), prompts::SELECT)
            .await?;
        Ok(Category::from_model_reply(&reply))
    }

    /// Stage 2 under the configured strategy
    pub async fn categorize(&self, interpreted: &str) -> Result<Category> {
        let category = match self.strategy {
            CategoryStrategy::Direct => self.select_category_direct(interpreted).await?,
            CategoryStrategy::SuggestThenSelect => {
                let suggested = self.suggest_categories(interpreted).await?;
                self.select_category(interpreted, &suggested).await?
            }
        };

        info!(category = %category, strategy = %self.strategy, "Category selected");
        Ok(category)
    }

    /// Stage 3: raw extraction reply, nominally a JSON object
    pub async fn extract_details(
        &self,
        interpreted: &str,
        user_input: &str,
        category: Category,
        collected: &Map<String, Value>,
    ) -> Result<String> {
        self.call_required(
            "extract",
            prompts::extract_details(interpreted, user_input, category, collected),
            prompts::EXTRACT,
        )
        .await
    }

    /// Stage 4: closing confirmation. May be empty; the driver decides the fallback.
    pub async fn generate_final_response(
        &self,
        category: Category,
        collected: &Map<String, Value>,
    ) -> Result<String> {
        self.call("finalize", prompts::final_response(category, collected), prompts::FINALIZE)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("direct".parse::<CategoryStrategy>().unwrap(), CategoryStrategy::Direct);
        assert_eq!(
            "Suggest-Then-Select".parse::<CategoryStrategy>().unwrap(),
            CategoryStrategy::SuggestThenSelect
        );
        assert!("three_step".parse::<CategoryStrategy>().is_err());
        assert_eq!(CategoryStrategy::default().to_string(), "suggest_then_select");
    }

    #[tokio::test]
    async fn test_direct_strategy_uses_one_call() {
        let model = ScriptedModel::new(vec![Ok("Card Services")]);
        let processor = PromptChainProcessor::new(model.clone(), CategoryStrategy::Direct);

        let category = processor.categorize("Customer lost their card").await.unwrap();

        assert_eq!(category, Category::CardServices);
        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, 0.1);
        assert_eq!(calls[0].max_tokens, 50);
    }

    #[tokio::test]
    async fn test_two_step_strategy_feeds_suggestions_forward() {
        let model = ScriptedModel::new(vec![
            Ok("- Card Services\n- Account Access"),
            Ok("Account Access"),
        ]);
        let processor = PromptChainProcessor::new(model.clone(), CategoryStrategy::SuggestThenSelect);

        let category = processor.categorize("Customer cannot log in").await.unwrap();

        assert_eq!(category, Category::AccountAccess);
        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].max_tokens, 150);
        assert!(calls[1].prompt.contains("- Card Services\n- Account Access"));
        assert!(calls[1].prompt.contains("Customer cannot log in"));
    }

    #[tokio::test]
    async fn test_empty_interpretation_is_an_error() {
        let model = ScriptedModel::new(vec![Ok("   ")]);
        let processor = PromptChainProcessor::new(model, CategoryStrategy::Direct);

        let err = processor.interpret_intent("hello").await.unwrap_err();
        assert!(matches!(err, ChainError::EmptyReply));
    }

    #[tokio::test]
    async fn test_final_response_may_be_empty() {
        let model = ScriptedModel::new(vec![Ok("")]);
        let processor = PromptChainProcessor::new(model.clone(), CategoryStrategy::Direct);

        let text = processor
            .generate_final_response(Category::GeneralInformation, &Map::new())
            .await
            .unwrap();
        assert_eq!(text, "");
        assert_eq!(model.calls()[0].max_tokens, 250);
    }

    #[tokio::test]
    async fn test_stage_failure_propagates() {
        let model = ScriptedModel::new(vec![Err("connection reset")]);
        let processor = PromptChainProcessor::new(model, CategoryStrategy::SuggestThenSelect);

        let err = processor.categorize("anything").await.unwrap_err();
        assert!(err.to_string().starts_with("Error:"));
    }
}
