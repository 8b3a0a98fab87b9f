// framewatch - Rate-limited, caching vision classifier gateway for video frames
// Author: kelexine (https://github.com/kelexine)

pub mod analyze;
pub mod cache;
pub mod captions;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod limiter;
pub mod metrics;
pub mod models;
pub mod prompt;
pub mod server;
pub mod utils;
pub mod vision;
