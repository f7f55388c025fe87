//! Service category catalog
//!
//! The fixed list of banking service types a request can be routed to, and
//! the normalization of a model's free-text answer onto that list.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "Account Opening")]
    AccountOpening,
    #[serde(rename = "Billing Issue")]
    BillingIssue,
    #[serde(rename = "Account Access")]
    AccountAccess,
    #[serde(rename = "Transaction Inquiry")]
    TransactionInquiry,
    #[serde(rename = "Card Services")]
    CardServices,
    #[serde(rename = "Account Statement")]
    AccountStatement,
    #[serde(rename = "Loan Inquiry")]
    LoanInquiry,
    #[serde(rename = "General Information")]
    GeneralInformation,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::AccountOpening,
        Category::BillingIssue,
        Category::AccountAccess,
        Category::TransactionInquiry,
        Category::CardServices,
        Category::AccountStatement,
        Category::LoanInquiry,
        Category::GeneralInformation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::AccountOpening => "Account Opening",
            Category::BillingIssue => "Billing Issue",
            Category::AccountAccess => "Account Access",
            Category::TransactionInquiry => "Transaction Inquiry",
            Category::CardServices => "Card Services",
            Category::AccountStatement => "Account Statement",
            Category::LoanInquiry => "Loan Inquiry",
            Category::GeneralInformation => "General Information",
        }
    }

    /// Catalog rendered as a bullet list for prompts
    pub fn catalog() -> String {
        Self::ALL
            .iter()
            .map(|c| format!("- {}", c.label()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Exact match on the label, ignoring case, punctuation and spacing
    pub fn from_label(text: &str) -> Option<Category> {
        let wanted = normalize(text);
        Self::ALL.into_iter().find(|c| normalize(c.label()) == wanted)
    }

    /// Map a model answer onto the catalog.
    ///
    /// Tries an exact label match first, then the earliest label mentioned in
    /// the text. Anything unrecognized lands in General Information.
    pub fn from_model_reply(reply: &str) -> Category {
        if let Some(category) = Self::from_label(reply) {
            return category;
        }

        let haystack = normalize(reply);
        let mentioned = Self::ALL
            .into_iter()
            .filter_map(|c| haystack.find(&normalize(c.label())).map(|pos| (pos, c)))
            .min_by_key(|(pos, _)| *pos);

        match mentioned {
            Some((_, category)) => category,
            None => {
                warn!(reply = %reply, "Category reply not in catalog, using General Information");
                Category::GeneralInformation
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
