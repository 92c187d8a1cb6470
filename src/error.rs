use thiserror::Error;

/// Errors surfaced by seed generation, key derivation, path parsing and
/// extended-key serialization. Nothing is recovered internally; every
/// failure propagates to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("seed length must be between 128 and 512 bits")]
    InvalidSeedLen,

    #[error("cannot derive a key with more than 255 indices in its path")]
    DeriveBeyondMaxDepth,

    #[error("the provided serialized extended key length is invalid")]
    InvalidKeyLen,

    #[error("bad extended key checksum")]
    BadChecksum,

    #[error("empty derivation path")]
    EmptyPath,

    #[error("ambiguous path: use 'm/' prefix for absolute paths, or no leading '/' for relative ones")]
    AmbiguousPath,

    #[error("base path must be provided for relative path")]
    BaseRequired,

    #[error("invalid component: {0}")]
    InvalidComponent(String),

    #[error("component {0} out of allowed range [0, 4294967295]")]
    ComponentOutOfRange(String),

    /// HKDF-Expand was asked for more output than it can produce. Reachable
    /// only through a broken HKDF implementation.
    #[error("hkdf: entropy limit reached")]
    EntropyLimitReached,

    #[error("entropy source failure: {0}")]
    EntropySource(String),
}
