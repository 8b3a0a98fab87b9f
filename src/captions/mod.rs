//! Caption history handling.
//!
//! The extension sends whatever caption line is on screen when a frame is
//! captured. This module stitches those fragments into a running transcript
//! per viewer and video so the classifier sees the whole conversation.
//!
//! # Submodules
//!
//! - `merge`: Pure overlap-aware stitching of two caption strings.
//! - `session`: Concurrent store of per-(identity, video) transcripts.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod merge;
pub mod session;

pub use merge::merge;
pub use session::{CaptionSessionStore, CaptionWrite, SessionKey};
