use num_bigint::BigUint;

/// Serialises `n` as exactly `length` big-endian bytes, left-padded with
/// zeros. Scalars smaller than 2^(8*length-8) keep their leading zero
/// bytes, so the output width never varies with magnitude.
///
/// Panics if `n` does not fit in `length` bytes; callers only pass scalars
/// already reduced below the curve order.
pub fn to_padded_bytes_be(n: &BigUint, length: usize) -> Vec<u8> {
    let bytes = n.to_bytes_be();
    assert!(
        bytes.len() <= length,
        "integer does not fit in {} bytes",
        length
    );
    let mut result = vec![0u8; length];
    result[length - bytes.len()..].copy_from_slice(&bytes);
    result
}
