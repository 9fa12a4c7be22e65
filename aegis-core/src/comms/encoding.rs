//! Content encoding for "encrypted" messages
//!
//! **This is not encryption.** [`PlaceholderCodec`] base64-encodes the
//! content and appends a tag derived from the recipient's placeholder
//! public key. It fixes the wire shape of encrypted content
//! (`encrypted_<base64>_<tag>`) and nothing more. A real deployment swaps
//! in an authenticated-encryption implementation of [`ContentCodec`]; the
//! message lifecycle does not change.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const PREFIX: &str = "encrypted_";
const TAG_LEN: usize = 8;

/// Reversible content transform keyed by a recipient key
pub trait ContentCodec: Send + Sync {
    fn encode(&self, content: &str, key: &str) -> String;

    /// Returns `None` if `encoded` was not produced for `key`
    fn decode(&self, encoded: &str, key: &str) -> Option<String>;
}

/// Non-cryptographic encode-and-tag placeholder
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCodec;

fn key_tag(key: &str) -> &str {
    match key.char_indices().nth(TAG_LEN) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}

impl ContentCodec for PlaceholderCodec {
    fn encode(&self, content: &str, key: &str) -> String {
        format!("{PREFIX}{}_{}", STANDARD.encode(content), key_tag(key))
    }

    fn decode(&self, encoded: &str, key: &str) -> Option<String> {
        let suffix = format!("_{}", key_tag(key));
        let body = encoded.strip_prefix(PREFIX)?.strip_suffix(suffix.as_str())?;
        let bytes = STANDARD.decode(body).ok()?;
        String::from_utf8(bytes).ok()
    }
}
