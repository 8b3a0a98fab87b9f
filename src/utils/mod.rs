//! Utility functions and helpers shared across the service.
//!
//! # Submodules
//!
//! - `clock`: Injectable monotonic time source for the TTL-driven stores.
//! - `logging`: Tracing initialization with credential redaction.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod clock;
pub mod logging;
