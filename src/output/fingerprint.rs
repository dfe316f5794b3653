use sha2::{Digest, Sha256};

/// Content fingerprint of an article body
///
/// Hex SHA-256 of the body with whitespace runs collapsed to single spaces
/// and lowercased, so re-fetched copies that differ only in layout or case
/// are treated as the same article.
pub fn fingerprint(body: &str) -> String {
    let normalized = body
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
