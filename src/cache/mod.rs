// Verdict cache module
// Author: kelexine (https://github.com/kelexine)

pub mod key;
pub mod manager;
pub mod models;

pub use key::fingerprint;
pub use manager::ResultCache;
pub use models::{CacheEntry, CacheStats};
