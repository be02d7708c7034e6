//! # Cryptographic Helpers
//!
//! The wallet RPC never signs anything itself; the engine does. What lives
//! here is the small set of primitives the RPC layer needs to talk about
//! transactions: a fixed-size hash type with hex encoding, and the hash
//! functions used for address checksums and identifiers.

pub mod hash;

pub use hash::{blake3_hash, sha256_array, Hash, HashParseError};
