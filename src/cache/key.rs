// Content fingerprint for the verdict cache
// Author: kelexine (https://github.com/kelexine)

use sha2::{Digest, Sha256};

/// Generate the SHA-256 cache key for a classification request.
///
/// Every field is length-prefixed before hashing, so moving bytes from one
/// field into its neighbour always yields a different key. Only byte-for-byte
/// identical `(image, prompt, captions)` triples share a key.
pub fn fingerprint(image: &str, prompt: &str, captions: &str) -> String {
    let mut hasher = Sha256::new();

    for field in [image, prompt, captions] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }

    hex::encode(hasher.finalize())
}
