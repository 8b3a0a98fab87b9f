// Classification verdict shared by the classifier, the cache and the API
// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// Placeholder used when the model omits its reasoning
pub const NO_REASONING: &str = "No reasoning provided";

/// Outcome of classifying one frame.
///
/// Immutable once produced; cache hits replay an identical copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the requested subject was detected.
    #[serde(rename = "DETECTED")]
    pub detected: bool,

    /// Model confidence, 0 to 100.
    pub confidence: u8,

    /// Short explanation from the model.
    pub reasoning: String,

    /// Summary of the caption history and visual context.
    #[serde(default)]
    pub summary: String,
}

impl Verdict {
    pub fn new(
        detected: bool,
        confidence: u8,
        reasoning: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            detected,
            confidence: confidence.min(100),
            reasoning: reasoning.into(),
            summary: summary.into(),
        }
    }
}
