//! EIP-2333 scalar derivation.
//!
//! <https://eips.ethereum.org/EIPS/eip-2333>

use hkdf::Hkdf;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use crate::common::slice::to_padded_bytes_be;
use crate::error::Error;

/// Order of the BLS12-381 prime-order subgroup. Every derived scalar lies
/// in `[0, CURVE_ORDER)`.
pub static CURVE_ORDER: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"52435875175126190479447740508185965837690552500527637822603658699938581184513",
        10,
    )
    .expect("curve order constant")
});

/// OKM width of `hkdf_mod_r`: ceil((1.5 * ceil(log2(r))) / 8).
const HKDF_MOD_R_L: usize = 48;

const HKDF_MOD_R_SALT: &[u8] = b"BLS-SIG-KEYGEN-SALT-";

/// 32-byte chunks per half of a Lamport secret key. 255 chunks of HashLen
/// bytes saturate the HKDF-SHA256-Expand output limit exactly.
const LAMPORT_CHUNKS: usize = 255;

const SHA256_SIZE: usize = 32;

/// Expands `ikm` with the 4-byte index salt into one Lamport half:
/// 255 consecutive 32-byte secret chunks.
fn ikm_to_lamport_sk(ikm: &[u8], salt: &[u8]) -> Result<Vec<u8>, Error> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; LAMPORT_CHUNKS * SHA256_SIZE];
    hk.expand(&[], &mut okm)
        .map_err(|_| Error::EntropyLimitReached)?;
    Ok(okm)
}

/// The `parent_SK_to_lamport_PK` procedure: binds the child index into a
/// 32-byte compressed Lamport public key.
fn parent_sk_to_lamport_pk(parent_sk: &BigUint, index: u32) -> Result<[u8; 32], Error> {
    let salt = index.to_be_bytes();

    // The parent scalar enters the KDF as exactly 32 big-endian bytes.
    let ikm = to_padded_bytes_be(parent_sk, 32);
    let lamport_0 = ikm_to_lamport_sk(&ikm, &salt)?;

    // Second half keys off the bitwise complement of the parent scalar.
    let not_ikm: Vec<u8> = ikm.iter().map(|b| b ^ 0xff).collect();
    let lamport_1 = ikm_to_lamport_sk(&not_ikm, &salt)?;

    // compressed_PK = SHA-256 over the concatenation of the 510 per-chunk
    // digests, fed incrementally in chunk order.
    let mut lamport_pk = Sha256::new();
    for chunk in lamport_0
        .chunks_exact(SHA256_SIZE)
        .chain(lamport_1.chunks_exact(SHA256_SIZE))
    {
        lamport_pk.update(Sha256::digest(chunk));
    }
    Ok(lamport_pk.finalize().into())
}

/// `HKDF_mod_r`: expands `ikm` to 48 OKM bytes with the fixed keygen salt
/// and reduces the big-endian value modulo the curve order.
fn hkdf_mod_r(ikm: &[u8]) -> Result<BigUint, Error> {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_MOD_R_SALT), ikm);
    let mut okm = [0u8; HKDF_MOD_R_L];
    hk.expand(&[], &mut okm)
        .map_err(|_| Error::EntropyLimitReached)?;
    Ok(BigUint::from_bytes_be(&okm) % &*CURVE_ORDER)
}

/// Derives the master secret scalar from a seed of at least 128 bits.
pub fn derive_master_sk(seed: &[u8]) -> Result<BigUint, Error> {
    if seed.len() < 16 {
        return Err(Error::InvalidSeedLen);
    }
    hkdf_mod_r(seed)
}

/// Derives the child secret scalar of `parent_sk` at `index`. The full
/// 32-bit index space is usable; there are no hardened-bit semantics.
pub fn derive_child_sk(parent_sk: &BigUint, index: u32) -> Result<BigUint, Error> {
    let compressed_pk = parent_sk_to_lamport_pk(parent_sk, index)?;
    hkdf_mod_r(&compressed_pk)
}
