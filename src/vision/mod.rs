//! Frame validation for the vision classifier.
//!
//! This module checks that the frame sent by the extension is decodable
//! base64 within Gemini's size limit and detects its MIME type from magic
//! bytes so the upstream request is labelled correctly.
//!
//! # Submodules
//!
//! - `models`: Image formats, the validated payload type and size limits.
//! - `translation`: Decoding and validation of the inbound payload.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;
pub mod translation;

pub use models::{ImageFormat, ImagePayload};
pub use translation::prepare_image;
