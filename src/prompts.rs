//! Prompt templates for each chain stage

use crate::category::Category;
use serde_json::{Map, Value};

/// Generation knobs for one stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

pub const INTERPRET: StageParams = StageParams { temperature: 0.3, max_tokens: 200 };
pub const SUGGEST: StageParams = StageParams { temperature: 0.3, max_tokens: 150 };
pub const SELECT: StageParams = StageParams { temperature: 0.1, max_tokens: 50 };
pub const EXTRACT: StageParams = StageParams { temperature: 0.2, max_tokens: 400 };
pub const FINALIZE: StageParams = StageParams { temperature: 0.3, max_tokens: 250 };

/// Collected data as pretty JSON, or a marker when nothing is known yet
pub fn render_collected(collected: &Map<String, Value>) -> String {
    if collected.is_empty() {
        return "None yet".to_string();
    }
    serde_json::to_string_pretty(collected).unwrap_or_else(|_| Value::Object(collected.clone()).to_string())
}

pub fn interpret_intent(user_input: &str) -> String {
    format!(
        r#"You are a bank assistant. Interpret the customer's intent clearly and concisely.

Customer message: {}

Describe what the customer wants or needs in one or two sentences. Be specific and professional."#,
        user_input
    )
}

pub fn suggest_categories(interpreted: &str) -> String {
    format!(
        r#"Map the request to one or more service categories that may apply.

Available categories:
{}

Interpreted customer request:
{}

List the names of the matching categories, one per line."#,
        Category::catalog(),
        interpreted
    )
}

pub fn select_category(interpreted: &str, suggested: &str) -> String {
    format!(
        r#"Select the single most appropriate category from the suggestions.

Suggested categories:
{}

Allowed category names:
{}

Interpreted customer request:
{}

Return ONLY the category name, nothing else."#,
        suggested,
        Category::catalog(),
        interpreted
    )
}

pub fn select_category_direct(interpreted: &str) -> String {
    format!(
        r#"Select the single most appropriate category.

Categories:
{}

Request: {}

Return ONLY the category name."#,
        Category::catalog(),
        interpreted
    )
}

pub fn extract_details(
    interpreted: &str,
    user_input: &str,
    category: Category,
    collected: &Map<String, Value>,
) -> String {
    format!(
        r#"You are handling a banking request. Using the category and the information collected so far, decide what is needed next.

Selected category: {}

Customer's latest message: {}

Interpreted intent: {}

Information already collected: {}

Task:
1. Extract any new details from the customer's latest message.
2. If more information is needed to process the request, ask ONE specific follow-up question.
3. If there is enough information, say so and prepare to resolve the request.

Respond with a single JSON object in exactly this format:
{{
    "status": "needs_info" or "ready",
    "extracted_data": {{"key": "value"}},
    "follow_up_question": "your question here" or null,
    "response_to_user": "friendly message to the customer"
}}"#,
        category,
        user_input,
        interpreted,
        render_collected(collected)
    )
}

pub fn final_response(category: Category, collected: &Map<String, Value>) -> String {
    format!(
        r#"You are a professional banking assistant. Write a short reply that resolves the customer's request.

Request category: {}

Collected information:
{}

The reply should:
1. Confirm the action being taken or the information being provided
2. Address the customer's need for this category
3. Be warm and reassuring
4. End by offering further help

Keep it short and natural."#,
        category,
        render_collected(collected)
    )
}
