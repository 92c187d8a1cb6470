//! EIP-2334 derivation paths.
//!
//! <https://eips.ethereum.org/EIPS/eip-2334>

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::crypto::extended_key::ExtendedKey;
use crate::error::Error;

/// The EIP-2334 purpose node for BLS12-381 keys.
pub const DEFAULT_PURPOSE: u32 = 12381;

/// An ordered sequence of child indices selecting a descendant of a master
/// key. The empty path denotes the master itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(pub Vec<u32>);

impl DerivationPath {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(components: Vec<u32>) -> Self {
        DerivationPath(components)
    }
}

/// Parses one path component. Accepts an optional sign and a radix prefix
/// (`0x` hex, `0o` octal, `0b` binary, decimal otherwise); returns the
/// sign and the unbounded magnitude so range checking happens after, not
/// during, the parse.
fn parse_component(component: &str) -> Option<(bool, BigUint)> {
    let (negative, magnitude) = match component.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, component.strip_prefix('+').unwrap_or(component)),
    };

    let (radix, digits) = if let Some(hex) = magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(oct) = magnitude
        .strip_prefix("0o")
        .or_else(|| magnitude.strip_prefix("0O"))
    {
        (8, oct)
    } else if let Some(bin) = magnitude
        .strip_prefix("0b")
        .or_else(|| magnitude.strip_prefix("0B"))
    {
        (2, bin)
    } else {
        (10, magnitude)
    };

    let value = BigUint::parse_bytes(digits.as_bytes(), radix)?;
    Some((negative, value))
}

/// Converts a user-specified derivation path string to the internal binary
/// representation.
///
/// Absolute paths start with the `m` prefix; relative paths (which get
/// appended to the supplied `base`) must not have a prefix in front of the
/// first component. Whitespace around any token is ignored.
pub fn parse_derivation_path(
    path: &str,
    base: Option<&DerivationPath>,
) -> Result<DerivationPath, Error> {
    let mut result: Vec<u32> = Vec::new();

    let components: Vec<&str> = path.split('/').collect();
    let head = components[0].trim();
    let components = if head.is_empty() {
        // A leading slash (or an empty input) leaves the intent unclear.
        return Err(Error::AmbiguousPath);
    } else if head == "m" {
        &components[1..]
    } else {
        match base {
            Some(base) => result.extend_from_slice(&base.0),
            None => return Err(Error::BaseRequired),
        }
        &components[..]
    };

    if components.is_empty() {
        return Err(Error::EmptyPath);
    }

    for component in components {
        let component = component.trim();
        let (negative, value) = parse_component(component)
            .ok_or_else(|| Error::InvalidComponent(component.to_string()))?;

        let negative = negative && value != BigUint::from(0u32);
        if negative || value > BigUint::from(u32::MAX) {
            let sign = if negative { "-" } else { "" };
            return Err(Error::ComponentOutOfRange(format!("{}{}", sign, value)));
        }

        result.push(value.to_u32().expect("range checked"));
    }

    Ok(DerivationPath(result))
}

/// Canonical rendering: `m` followed by one decimal component per level.
impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.0 {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// Parses an absolute derivation path.
impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self, Error> {
        parse_derivation_path(path, None)
    }
}

/// Derives the key at `path` from `master` by walking the index sequence;
/// the first failing derivation propagates. An empty path yields the
/// master itself.
pub fn derive_key(master: &ExtendedKey, path: &DerivationPath) -> Result<ExtendedKey, Error> {
    let mut key = master.clone();
    for &index in &path.0 {
        key = key.child(index)?;
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_hd_path_parsing() {
        let base = DerivationPath(vec![12381, 60, 0, 0]);
        let tests: Vec<(&str, Option<&DerivationPath>, Option<Vec<u32>>)> = vec![
            // Plain absolute derivation paths
            ("m/12381/60/0/0", None, Some(vec![12381, 60, 0, 0])),
            ("m/12381/60/0/128", None, Some(vec![12381, 60, 0, 128])),
            // Plain relative derivation paths
            ("0", Some(&base), Some(vec![12381, 60, 0, 0, 0])),
            ("128", Some(&base), Some(vec![12381, 60, 0, 0, 128])),
            // Hexadecimal absolute derivation paths
            ("m/0x305D/0x3C/0x00/0x00", None, Some(vec![12381, 60, 0, 0])),
            ("m/0x305D/0x3C/0x00/0x80", None, Some(vec![12381, 60, 0, 128])),
            // Hexadecimal relative derivation paths
            ("0x00", Some(&base), Some(vec![12381, 60, 0, 0, 0])),
            ("0x80", Some(&base), Some(vec![12381, 60, 0, 0, 128])),
            // Octal and binary prefixes
            ("m/0o30135/0b111100", None, Some(vec![12381, 60])),
            // Weird inputs just to ensure they work
            (
                "\tm  /   12381\t\t\n/\n   60\t\n\n\t   /\n0  /\t\t\t0",
                None,
                Some(vec![12381, 60, 0, 0]),
            ),
            // Invalid derivation paths
            ("", None, None),              // Empty relative derivation path
            ("m", None, None),             // Empty absolute derivation path
            ("m/", None, None),            // Missing last derivation component
            ("/12381/60/0/0", None, None), // Absolute path without m prefix
            ("m/4294967296", None, None),  // Overflows 32 bit integer
            ("m/-1", None, None),          // Cannot contain negative number
            ("m/six", None, None),         // Not a number
            ("0", None, None),             // Relative path without a base
        ];

        for (i, (input, base, expected)) in tests.iter().enumerate() {
            let parsed = parse_derivation_path(input, *base);
            match expected {
                Some(components) => {
                    let path = parsed.unwrap_or_else(|e| panic!("test {}: {}", i, e));
                    assert_eq!(&path.0, components, "test {}", i);
                }
                None => assert!(parsed.is_err(), "test {}: expected error", i),
            }
        }
    }

    #[test]
    fn test_error_kinds() {
        let base = DerivationPath(vec![0]);
        assert_eq!(
            parse_derivation_path("", None).unwrap_err(),
            Error::AmbiguousPath
        );
        assert_eq!(
            parse_derivation_path("/12381/60", None).unwrap_err(),
            Error::AmbiguousPath
        );
        assert_eq!(
            parse_derivation_path("m", None).unwrap_err(),
            Error::EmptyPath
        );
        assert_eq!(
            parse_derivation_path("m/", None).unwrap_err(),
            Error::InvalidComponent(String::new())
        );
        assert_eq!(
            parse_derivation_path("0", None).unwrap_err(),
            Error::BaseRequired
        );
        assert_eq!(
            parse_derivation_path("m/abc", Some(&base)).unwrap_err(),
            Error::InvalidComponent("abc".to_string())
        );
        assert_eq!(
            parse_derivation_path("m/4294967296", None).unwrap_err(),
            Error::ComponentOutOfRange("4294967296".to_string())
        );
        assert_eq!(
            parse_derivation_path("m/-1", None).unwrap_err(),
            Error::ComponentOutOfRange("-1".to_string())
        );
    }

    #[test]
    fn test_index_extremes() {
        let path = parse_derivation_path("m/0/4294967295", None).unwrap();
        assert_eq!(path.0, vec![0, u32::MAX]);
    }

    #[test]
    fn test_string_rendering() {
        assert_eq!(DerivationPath::default().to_string(), "m");
        assert_eq!(
            DerivationPath(vec![12381, 60, 0, 0]).to_string(),
            "m/12381/60/0/0"
        );
        assert_eq!(DerivationPath(vec![u32::MAX]).to_string(), "m/4294967295");
    }

    #[test]
    fn test_string_round_trip() {
        let paths = [
            DerivationPath(vec![]),
            DerivationPath(vec![0]),
            DerivationPath(vec![DEFAULT_PURPOSE, 60, 0, 0]),
            DerivationPath(vec![u32::MAX, 0, 1]),
        ];
        for path in &paths {
            if path.is_empty() {
                // "m" alone does not re-parse; the empty path only renders.
                continue;
            }
            let reparsed: DerivationPath = path.to_string().parse().unwrap();
            assert_eq!(&reparsed, path);
        }
    }

    #[test]
    fn test_derive_key_walks_the_path() {
        let seed = hex!("3141592653589793238462643383279502884197169399375105820974944592");
        let master = ExtendedKey::new_master(&seed).unwrap();

        let path = parse_derivation_path("m/12381/60/0/0", None).unwrap();
        let derived = derive_key(&master, &path).unwrap();
        assert_eq!(derived.depth(), 4);

        let manual = master
            .child(12381)
            .and_then(|k| k.child(60))
            .and_then(|k| k.child(0))
            .and_then(|k| k.child(0))
            .unwrap();
        assert_eq!(derived, manual);

        let empty = derive_key(&master, &DerivationPath::default()).unwrap();
        assert_eq!(empty, master);
    }

    #[test]
    fn test_derive_key_propagates_failure() {
        let seed = hex!("d4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3");
        let master = ExtendedKey::new_master(&seed).unwrap();
        let deep = ExtendedKey::new_extended_key(&master.private_key(), [0u8; 4], u8::MAX, 0);
        assert_eq!(
            derive_key(&deep, &DerivationPath(vec![1])).unwrap_err(),
            Error::DeriveBeyondMaxDepth
        );
    }
}
