//! Prompt handling for the vision classifier.
//!
//! # Submodules
//!
//! - `cleaner`: Reduces a user instruction to the visual subject.
//! - `template`: Wraps the subject and caption history into the model prompt.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod cleaner;
pub mod template;

pub use cleaner::{clean, subject};
pub use template::build_prompt;
