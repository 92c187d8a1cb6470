use sha2::{Digest, Sha256};

/// Computes the SHA-256 digest of `bytes`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Computes SHA-256 applied twice. The first four bytes of the double
/// digest checksum a serialized extended key.
pub fn double_sha256(bytes: &[u8]) -> [u8; 32] {
    sha256(&sha256(bytes))
}
