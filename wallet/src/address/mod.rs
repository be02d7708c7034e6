//! # Addresses
//!
//! Wallet addresses are base58 strings over
//!
//! ```text
//! varint(prefix) || spend_public_key (32) || view_public_key (32) || [payment_id (8)] || checksum (4)
//! ```
//!
//! where the checksum is the first four bytes of BLAKE3 over everything
//! before it. The prefix tells the three address kinds apart (standard,
//! subaddress, integrated) and is different on every network, so an
//! address from the wrong network fails to parse.
//!
//! Integrated addresses carry an 8-byte payment id and are always built on
//! a standard address: there is no integrated subaddress form.

pub mod uri;
pub mod varint;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{
    ADDRESS_CHECKSUM_SIZE, MAINNET_ADDRESS_PREFIX, MAINNET_INTEGRATED_ADDRESS_PREFIX,
    MAINNET_SUBADDRESS_PREFIX, SHORT_PAYMENT_ID_LENGTH, TESTNET_ADDRESS_PREFIX,
    TESTNET_INTEGRATED_ADDRESS_PREFIX, TESTNET_SUBADDRESS_PREFIX,
};
use crate::crypto::blake3_hash;

const KEYS_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The network an address (and a wallet) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

/// The three address prefixes of a network.
#[derive(Debug, Clone, Copy)]
pub struct AddressPrefixes {
    pub standard: u64,
    pub integrated: u64,
    pub subaddress: u64,
}

impl Network {
    pub fn prefixes(self) -> AddressPrefixes {
        match self {
            Network::Mainnet => AddressPrefixes {
                standard: MAINNET_ADDRESS_PREFIX,
                integrated: MAINNET_INTEGRATED_ADDRESS_PREFIX,
                subaddress: MAINNET_SUBADDRESS_PREFIX,
            },
            Network::Testnet => AddressPrefixes {
                standard: TESTNET_ADDRESS_PREFIX,
                integrated: TESTNET_INTEGRATED_ADDRESS_PREFIX,
                subaddress: TESTNET_SUBADDRESS_PREFIX,
            },
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

// ---------------------------------------------------------------------------
// Keys & Addresses
// ---------------------------------------------------------------------------

/// A compressed public key.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("public key must be 32 bytes"))?;
        Ok(PublicKey(array))
    }
}

/// The public half of an account or subaddress: a spend key and a view key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAddress {
    pub spend_public_key: PublicKey,
    pub view_public_key: PublicKey,
}

/// Everything an address string says about its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressParseInfo {
    pub address: AccountAddress,
    pub is_subaddress: bool,
    /// Present only for integrated addresses.
    pub payment_id: Option<[u8; SHORT_PAYMENT_ID_LENGTH]>,
}

/// Why an address string was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Not valid base58.
    #[error("address is not valid base58")]
    InvalidEncoding,

    /// Too short to carry a prefix and checksum.
    #[error("address is too short")]
    TooShort,

    /// Checksum bytes do not match the body.
    #[error("address checksum mismatch")]
    BadChecksum,

    /// The prefix varint could not be decoded.
    #[error("address prefix is malformed")]
    BadPrefix,

    /// The prefix is not one of this network's prefixes.
    #[error("address prefix {0:#x} does not belong to this network")]
    UnknownPrefix(u64),

    /// The body length does not match the address kind.
    #[error("address body has {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },
}

impl AccountAddress {
    /// Encodes a standard address, or a subaddress when `is_subaddress`.
    pub fn encode(&self, network: Network, is_subaddress: bool) -> String {
        let prefixes = network.prefixes();
        let prefix = if is_subaddress {
            prefixes.subaddress
        } else {
            prefixes.standard
        };
        encode_raw(prefix, self, None)
    }

    /// Encodes an integrated address carrying `payment_id`.
    pub fn encode_integrated(
        &self,
        network: Network,
        payment_id: &[u8; SHORT_PAYMENT_ID_LENGTH],
    ) -> String {
        encode_raw(network.prefixes().integrated, self, Some(payment_id))
    }
}

fn encode_raw(
    prefix: u64,
    address: &AccountAddress,
    payment_id: Option<&[u8; SHORT_PAYMENT_ID_LENGTH]>,
) -> String {
    let mut data = Vec::with_capacity(10 + KEYS_LENGTH + SHORT_PAYMENT_ID_LENGTH);
    varint::write(&mut data, prefix);
    data.extend_from_slice(&address.spend_public_key.0);
    data.extend_from_slice(&address.view_public_key.0);
    if let Some(pid) = payment_id {
        data.extend_from_slice(pid);
    }
    let checksum = blake3_hash(&data);
    data.extend_from_slice(&checksum[..ADDRESS_CHECKSUM_SIZE]);
    bs58::encode(data).into_string()
}

/// Parses an address string for `network`.
pub fn parse_address(network: Network, s: &str) -> Result<AddressParseInfo, AddressError> {
    let data = bs58::decode(s)
        .into_vec()
        .map_err(|_| AddressError::InvalidEncoding)?;
    if data.len() <= ADDRESS_CHECKSUM_SIZE {
        return Err(AddressError::TooShort);
    }

    let (body, checksum) = data.split_at(data.len() - ADDRESS_CHECKSUM_SIZE);
    if blake3_hash(body)[..ADDRESS_CHECKSUM_SIZE] != *checksum {
        return Err(AddressError::BadChecksum);
    }

    let (prefix, consumed) = varint::read(body).ok_or(AddressError::BadPrefix)?;
    let rest = &body[consumed..];
    let prefixes = network.prefixes();

    let (is_subaddress, expected) = if prefix == prefixes.standard {
        (false, KEYS_LENGTH)
    } else if prefix == prefixes.subaddress {
        (true, KEYS_LENGTH)
    } else if prefix == prefixes.integrated {
        (false, KEYS_LENGTH + SHORT_PAYMENT_ID_LENGTH)
    } else {
        return Err(AddressError::UnknownPrefix(prefix));
    };

    if rest.len() != expected {
        return Err(AddressError::BadLength {
            expected,
            actual: rest.len(),
        });
    }

    let mut spend = [0u8; 32];
    let mut view = [0u8; 32];
    spend.copy_from_slice(&rest[..32]);
    view.copy_from_slice(&rest[32..64]);

    let payment_id = if rest.len() > KEYS_LENGTH {
        let mut pid = [0u8; SHORT_PAYMENT_ID_LENGTH];
        pid.copy_from_slice(&rest[KEYS_LENGTH..]);
        Some(pid)
    } else {
        None
    };

    Ok(AddressParseInfo {
        address: AccountAddress {
            spend_public_key: PublicKey(spend),
            view_public_key: PublicKey(view),
        },
        is_subaddress,
        payment_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AccountAddress {
        AccountAddress {
            spend_public_key: PublicKey([0x11; 32]),
            view_public_key: PublicKey([0x22; 32]),
        }
    }

    #[test]
    fn standard_address_parses_back() {
        let encoded = sample().encode(Network::Mainnet, false);
        let info = parse_address(Network::Mainnet, &encoded).unwrap();
        assert_eq!(info.address, sample());
        assert!(!info.is_subaddress);
        assert_eq!(info.payment_id, None);
    }

    #[test]
    fn subaddress_flag_survives_encoding() {
        let encoded = sample().encode(Network::Testnet, true);
        let info = parse_address(Network::Testnet, &encoded).unwrap();
        assert!(info.is_subaddress);
    }

    #[test]
    fn integrated_address_carries_payment_id() {
        let pid = [1, 2, 3, 4, 5, 6, 7, 8];
        let encoded = sample().encode_integrated(Network::Mainnet, &pid);
        let info = parse_address(Network::Mainnet, &encoded).unwrap();
        assert_eq!(info.payment_id, Some(pid));
        assert!(!info.is_subaddress);
        assert_eq!(info.address, sample());
    }

    #[test]
    fn wrong_network_is_rejected() {
        let encoded = sample().encode(Network::Mainnet, false);
        assert!(matches!(
            parse_address(Network::Testnet, &encoded),
            Err(AddressError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn corrupted_address_fails_checksum() {
        let mut encoded = sample().encode(Network::Mainnet, false).into_bytes();
        // Swap one base58 character for a different valid one.
        let i = encoded.len() / 2;
        encoded[i] = if encoded[i] == b'2' { b'3' } else { b'2' };
        let corrupted = String::from_utf8(encoded).unwrap();
        assert!(parse_address(Network::Mainnet, &corrupted).is_err());
    }

    #[test]
    fn non_base58_input() {
        assert_eq!(
            parse_address(Network::Mainnet, "not-an-address!"),
            Err(AddressError::InvalidEncoding)
        );
        assert_eq!(
            parse_address(Network::Mainnet, ""),
            Err(AddressError::TooShort)
        );
    }
}
