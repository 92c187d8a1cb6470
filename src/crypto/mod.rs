pub mod extended_key;
pub mod kdf;
pub mod path;
