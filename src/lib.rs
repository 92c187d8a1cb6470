//! Hierarchical deterministic key derivation for BLS12-381, following
//! [EIP-2333](https://eips.ethereum.org/EIPS/eip-2333) for the key tree and
//! [EIP-2334](https://eips.ethereum.org/EIPS/eip-2334) for derivation paths.

pub mod common;
pub mod crypto;
pub mod error;

pub use crate::crypto::extended_key::{
    generate_seed, new_key_from_string, ExtendedKey, PublicKey, MAX_SEED_BYTES, MIN_SEED_BYTES,
    PUBLIC_KEY_BYTES_LEN, RECOMMENDED_SEED_LEN,
};
pub use crate::crypto::kdf::{derive_child_sk, derive_master_sk, CURVE_ORDER};
pub use crate::crypto::path::{derive_key, parse_derivation_path, DerivationPath, DEFAULT_PURPOSE};
pub use crate::error::Error;
