use std::fmt;
use std::str::FromStr;

use bls12_381::{G1Affine, G1Projective, Scalar};
use num_bigint::BigUint;
use once_cell::sync::OnceCell;
use rand::rngs::OsRng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use fvm_shared::address::Address;

use crate::common::hash::{double_sha256, sha256};
use crate::common::random::get_random_bytes;
use crate::crypto::kdf::{derive_child_sk, derive_master_sk};
use crate::error::Error;

/// Recommended seed length in bytes (256 bits).
pub const RECOMMENDED_SEED_LEN: usize = 32;
/// Minimum accepted seed length in bytes (128 bits).
pub const MIN_SEED_BYTES: usize = 16;
/// Maximum accepted seed length in bytes (512 bits).
pub const MAX_SEED_BYTES: usize = 64;

/// Width of a compressed G1 public key.
pub const PUBLIC_KEY_BYTES_LEN: usize = 48;

// depth (1) || parent fingerprint (4) || child num (4) || key data (32)
const SERIALIZED_KEY_LEN: usize = 1 + 4 + 4 + 32;
const CHECKSUM_LEN: usize = 4;

const ZEROED_KEY_SENTINEL: &str = "zeroed extended key";

/// Compressed G1 public key as produced by the curve backend.
pub type PublicKey = [u8; PUBLIC_KEY_BYTES_LEN];

/// A node of the hierarchical deterministic key tree: a secret scalar plus
/// the metadata needed to derive and serialize descendants.
#[derive(Clone)]
pub struct ExtendedKey {
    /// Integer form of the scalar; `None` once the key has been zeroed.
    key: Option<BigUint>,
    /// Little-endian wire form of the scalar, kept in sync with `key`.
    /// This buffer feeds the curve backend and the serialized envelope.
    private_key: [u8; 32],
    public_key: OnceCell<PublicKey>,
    depth: u8,
    parent_fp: [u8; 4],
    child_num: u32,
}

/// Computes the G1 public key for a little-endian wire scalar. The wide
/// reduction is total over any 32-byte input and agrees with canonical
/// deserialization whenever the wire value is already below the curve
/// order.
fn derive_public_key(private_key: &[u8; 32]) -> PublicKey {
    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(private_key);
    let scalar = Scalar::from_bytes_wide(&wide);
    G1Affine::from(G1Projective::generator() * scalar).to_compressed()
}

/// Little-endian wire form of a scalar. This is the big-endian integer to
/// wire crossing; [`ExtendedKey::new_extended_key`] performs the inverse.
fn scalar_to_wire(key: &BigUint) -> [u8; 32] {
    let le = key.to_bytes_le();
    let mut wire = [0u8; 32];
    wire[..le.len()].copy_from_slice(&le);
    wire
}

impl ExtendedKey {
    /// Creates the master extended key for `seed`: depth 0, zero parent
    /// fingerprint, child number 0.
    pub fn new_master(seed: &[u8]) -> Result<ExtendedKey, Error> {
        let key = derive_master_sk(seed)?;
        Ok(ExtendedKey {
            private_key: scalar_to_wire(&key),
            key: Some(key),
            public_key: OnceCell::new(),
            depth: 0,
            parent_fp: [0u8; 4],
            child_num: 0,
        })
    }

    /// Reconstructs a node from its serialized fields. `private_key` is the
    /// 32-byte little-endian wire form; the integer form is its byte
    /// reversal.
    ///
    /// Panics unless `private_key` is exactly 32 bytes; a caller violating
    /// this has broken an invariant, not supplied bad input.
    pub fn new_extended_key(
        private_key: &[u8],
        parent_fp: [u8; 4],
        depth: u8,
        child_num: u32,
    ) -> ExtendedKey {
        assert_eq!(private_key.len(), 32, "private key must be 32 bytes");
        // Wire to integer crossing: little-endian bytes read directly.
        let key = BigUint::from_bytes_le(private_key);
        let mut wire = [0u8; 32];
        wire.copy_from_slice(private_key);
        ExtendedKey {
            key: Some(key),
            private_key: wire,
            public_key: OnceCell::new(),
            depth,
            parent_fp,
            child_num,
        }
    }

    /// Derives the child key at `index`. The child's parent fingerprint is
    /// the first four bytes of SHA-256 over this key's compressed public
    /// key.
    pub fn child(&self, index: u32) -> Result<ExtendedKey, Error> {
        if self.depth == u8::MAX {
            return Err(Error::DeriveBeyondMaxDepth);
        }

        let parent_sk = self.key.as_ref().expect("extended key has been zeroed");
        let key = derive_child_sk(parent_sk, index)?;

        let public_key = self.public_key();
        let digest = sha256(&public_key);
        let mut parent_fp = [0u8; 4];
        parent_fp.copy_from_slice(&digest[..4]);

        Ok(ExtendedKey::new_extended_key(
            &scalar_to_wire(&key),
            parent_fp,
            self.depth + 1,
            index,
        ))
    }

    /// Returns the 32-byte little-endian wire form of the secret scalar.
    pub fn private_key(&self) -> [u8; 32] {
        self.private_key
    }

    /// Returns the compressed public key, computing and memoising it on
    /// first use.
    pub fn public_key(&self) -> PublicKey {
        *self
            .public_key
            .get_or_init(|| derive_public_key(&self.private_key))
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Parent fingerprint as a big-endian u32; zero for the master.
    pub fn parent_fingerprint(&self) -> u32 {
        u32::from_be_bytes(self.parent_fp)
    }

    /// Wipes all secret material in place. The scalar is dropped, the wire
    /// bytes and any memoised public key are zeroed, and the metadata is
    /// reset; the textual form becomes a fixed sentinel. Deriving from a
    /// zeroed key is undefined.
    pub fn zero(&mut self) {
        self.key = None;
        self.private_key.zeroize();
        if let Some(public_key) = self.public_key.get_mut() {
            public_key.zeroize();
        }
        self.public_key.take();
        self.parent_fp.zeroize();
        self.depth = 0;
        self.child_num = 0;
    }

    /// Returns the ledger address for this key's public key.
    pub fn address(&self) -> Address {
        let public_key = self.public_key();
        Address::new_bls(&public_key).expect("invalid public key") // should never happen
    }
}

/// Renders the extended key as a base58 string over the 45-byte envelope:
/// depth (1) || parent fingerprint (4) || child num (4) || key data (32) ||
/// checksum (4). A zeroed key renders as the sentinel.
impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_none() {
            return f.write_str(ZEROED_KEY_SENTINEL);
        }

        let mut serialized = Vec::with_capacity(SERIALIZED_KEY_LEN + CHECKSUM_LEN);
        serialized.push(self.depth);
        serialized.extend_from_slice(&self.parent_fp);
        serialized.extend_from_slice(&self.child_num.to_be_bytes());
        serialized.extend_from_slice(&self.private_key);

        let checksum = double_sha256(&serialized);
        serialized.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        f.write_str(&bs58::encode(serialized).into_string())
    }
}

impl FromStr for ExtendedKey {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Error> {
        // A string outside the base58 alphabet cannot decode to the
        // envelope at all; report it by length like any short blob.
        let decoded = bs58::decode(key)
            .into_vec()
            .map_err(|_| Error::InvalidKeyLen)?;
        if decoded.len() != SERIALIZED_KEY_LEN + CHECKSUM_LEN {
            return Err(Error::InvalidKeyLen);
        }

        let (payload, checksum) = decoded.split_at(SERIALIZED_KEY_LEN);
        let expected = double_sha256(payload);
        if checksum != &expected[..CHECKSUM_LEN] {
            return Err(Error::BadChecksum);
        }

        let depth = payload[0];
        let mut parent_fp = [0u8; 4];
        parent_fp.copy_from_slice(&payload[1..5]);
        let child_num = u32::from_be_bytes(payload[5..9].try_into().expect("4 bytes"));
        let private_key = &payload[9..41];

        Ok(ExtendedKey::new_extended_key(
            private_key,
            parent_fp,
            depth,
            child_num,
        ))
    }
}

/// Parses a base58-encoded extended key.
pub fn new_key_from_string(key: &str) -> Result<ExtendedKey, Error> {
    key.parse()
}

/// Equality covers the scalar, wire bytes and metadata; the public-key
/// memo is derived state and does not participate.
impl PartialEq for ExtendedKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.private_key == other.private_key
            && self.depth == other.depth
            && self.parent_fp == other.parent_fp
            && self.child_num == other.child_num
    }
}

impl Eq for ExtendedKey {}

/// Secret material stays out of debug output.
impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("depth", &self.depth)
            .field("parent_fp", &hex::encode(self.parent_fp))
            .field("child_num", &self.child_num)
            .finish_non_exhaustive()
    }
}

/// An extended key embeds in JSON as its base58 string form.
impl Serialize for ExtendedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExtendedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Returns `length` cryptographically random seed bytes;
/// `length` must lie in `[MIN_SEED_BYTES, MAX_SEED_BYTES]`.
pub fn generate_seed(length: u8) -> Result<Vec<u8>, Error> {
    if (length as usize) < MIN_SEED_BYTES || (length as usize) > MAX_SEED_BYTES {
        return Err(Error::InvalidSeedLen);
    }
    get_random_bytes(&mut OsRng, length as usize)
}
