//! Request orchestration for `POST /api/analyze`.
//!
//! The orchestrator owns the rate limiter, the caption session store and the
//! verdict cache, and decides when the external classifier is consulted.
//! Identical requests that arrive together share one classifier call through
//! the per-fingerprint locks in `singleflight`.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod orchestrator;
pub mod singleflight;

pub use orchestrator::{RequestOrchestrator, SweepReport};
