use log::error;
use rand::{CryptoRng, RngCore};

use crate::error::Error;

/// Fills a fresh buffer of `length` bytes from the given cryptographically
/// secure RNG. Failures of the underlying entropy source propagate as
/// [`Error::EntropySource`].
pub fn get_random_bytes<R: CryptoRng + RngCore>(
    rng: &mut R,
    length: usize,
) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0u8; length];
    rng.try_fill_bytes(&mut buf).map_err(|e| {
        error!("get_random_bytes: entropy source failure: {}", e);
        Error::EntropySource(e.to_string())
    })?;
    Ok(buf)
}
