//! Data models for the extension API and the Gemini API.
//!
//! This module contains the type definitions for request/response bodies used by:
//! - The inbound extension API (`api`)
//! - The upstream Google Gemini API (`gemini`)
//! - The classification result shared by both (`verdict`)

// Author: kelexine (https://github.com/kelexine)

pub mod api;
pub mod gemini;
pub mod verdict;

pub use api::{AnalyzeRequest, AnalyzeResponse};
pub use gemini::{GenerateContentRequest, GenerateContentResponse};
pub use verdict::Verdict;
