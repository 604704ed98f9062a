use sha2::{Digest, Sha256};

/// Digest of the exact artifact bytes, as lowercase hex. Two artifacts get
/// the same fingerprint if and only if their bytes are identical.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
