// Vision classifier module
// Author: kelexine (https://github.com/kelexine)

mod client;
pub mod parse;

pub use client::GeminiClient;

use crate::error::Result;
use crate::models::Verdict;
use crate::vision::ImagePayload;
use async_trait::async_trait;

/// External vision model that turns a frame plus context into a verdict.
///
/// The orchestrator only talks to this trait, so tests can substitute a
/// scripted classifier for the Gemini HTTP client.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `image` against the prompt subject and caption history.
    async fn classify(&self, image: &ImagePayload, prompt: &str, captions: &str) -> Result<Verdict>;

    /// Whether credentials for the upstream model are present
    fn is_configured(&self) -> bool;
}
