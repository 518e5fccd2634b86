//! Meal demand gathering from free-text chat messages.
//!
//! A demand needs a meal and a headcount. Users often send them in separate
//! messages ("hot pot", then "4 people"), so the caller keeps the pending
//! meal between turns and feeds it back in.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Outcome of reading one chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Demand {
    /// Meal and headcount are both known.
    Complete { meal: String, headcount: u32 },
    /// A meal is known but the headcount is still missing.
    NeedsHeadcount { pending_meal: String },
}

impl Demand {
    /// Combine the pending meal (if any) with a new message.
    #[must_use]
    pub fn from_message(pending_meal: Option<&str>, text: &str) -> Self {
        let headcount = parse_headcount(text);
        match (pending_meal, headcount) {
            (Some(meal), Some(headcount)) => Demand::Complete {
                meal: meal.to_string(),
                headcount,
            },
            (Some(meal), None) => Demand::NeedsHeadcount {
                pending_meal: meal.to_string(),
            },
            (None, Some(headcount)) => Demand::Complete {
                meal: text.trim().to_string(),
                headcount,
            },
            (None, None) => Demand::NeedsHeadcount {
                pending_meal: text.trim().to_string(),
            },
        }
    }
}

/// First run of digits in `text` as a positive headcount.
#[must_use]
pub fn parse_headcount(text: &str) -> Option<u32> {
    DIGITS
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&n| n > 0)
}

#[must_use]
pub fn is_cancel_request(text: &str) -> bool {
    text.to_lowercase().contains("cancel")
}
