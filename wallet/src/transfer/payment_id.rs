//! # Payment IDs & Extra Data
//!
//! A payment id tags a transfer so the recipient can match it to an invoice.
//! It comes in two shapes, decided once at the parse boundary:
//!
//! | Hex length | Variant | Stored in extra as |
//! |------------|---------|--------------------|
//! | 0          | `None`  | nothing            |
//! | 16         | `Short` | encrypted nonce (`0x01 ‖ 8 bytes`) |
//! | 64         | `Long`  | plain nonce (`0x00 ‖ 32 bytes`)    |
//!
//! Anything else is rejected. The ledger keeps every id in a 32-byte slot;
//! short ids are zero-padded into it, and [`canonical_payment_id`] undoes
//! that padding for display.
//!
//! [`TxExtra`] is the append-only extension blob carried by a transaction.
//! This module only ever appends one nonce field to it.

use std::fmt;

use thiserror::Error;

use crate::config::{LONG_PAYMENT_ID_LENGTH, SHORT_PAYMENT_ID_LENGTH, TX_EXTRA_NONCE_MAX_COUNT};
use crate::crypto::Hash;

// ---------------------------------------------------------------------------
// Extra field tags
// ---------------------------------------------------------------------------

pub const TX_EXTRA_TAG_PADDING: u8 = 0x00;
pub const TX_EXTRA_TAG_PUBKEY: u8 = 0x01;
pub const TX_EXTRA_NONCE: u8 = 0x02;
pub const TX_EXTRA_TAG_ADDITIONAL_PUBKEYS: u8 = 0x04;

pub const TX_EXTRA_NONCE_PAYMENT_ID: u8 = 0x00;
pub const TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID: u8 = 0x01;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while reading or appending extra fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtraError {
    /// The blob already holds a nonce; a transaction carries at most one.
    #[error("extra already contains a nonce field")]
    NonceAlreadyPresent,

    /// The nonce does not fit in a single-byte length.
    #[error("nonce of {0} bytes exceeds the {max} byte limit", max = TX_EXTRA_NONCE_MAX_COUNT)]
    NonceTooLong(usize),

    /// The blob could not be walked field by field.
    #[error("malformed extra field at offset {0}")]
    Malformed(usize),
}

/// Failures of payment id parsing and encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentIdError {
    /// Wrong length or not hex.
    #[error("Payment id has invalid format: \"{0}\", expected 16 or 64 character string")]
    InvalidFormat(String),

    /// The id parsed but could not be written into the extra blob.
    #[error("Something went wrong with payment_id. Please check its format: {0}")]
    Extra(#[from] ExtraError),
}

// ---------------------------------------------------------------------------
// PaymentId
// ---------------------------------------------------------------------------

/// A payment id, tagged by shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentId {
    #[default]
    None,
    Short([u8; SHORT_PAYMENT_ID_LENGTH]),
    Long([u8; LONG_PAYMENT_ID_LENGTH]),
}

impl PaymentId {
    /// Parses a caller-supplied id. The empty string means "no id".
    pub fn parse(s: &str) -> Result<Self, PaymentIdError> {
        if s.is_empty() {
            return Ok(PaymentId::None);
        }
        let invalid = || PaymentIdError::InvalidFormat(s.to_string());
        match s.len() {
            16 => {
                let mut id = [0u8; SHORT_PAYMENT_ID_LENGTH];
                hex::decode_to_slice(s, &mut id).map_err(|_| invalid())?;
                Ok(PaymentId::Short(id))
            }
            64 => {
                let mut id = [0u8; LONG_PAYMENT_ID_LENGTH];
                hex::decode_to_slice(s, &mut id).map_err(|_| invalid())?;
                Ok(PaymentId::Long(id))
            }
            _ => Err(invalid()),
        }
    }

    /// Parses an id used as a ledger lookup key and returns its slot.
    /// Unlike [`PaymentId::parse`], an empty string is an error.
    pub fn parse_lookup(s: &str) -> Result<Hash, PaymentIdError> {
        match PaymentId::parse(s)? {
            PaymentId::None => Err(PaymentIdError::InvalidFormat(s.to_string())),
            id => Ok(id.to_slot()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PaymentId::None)
    }

    /// The 32-byte ledger slot for this id. Short ids are zero-padded.
    pub fn to_slot(&self) -> Hash {
        let mut slot = [0u8; 32];
        match self {
            PaymentId::None => {}
            PaymentId::Short(id) => slot[..SHORT_PAYMENT_ID_LENGTH].copy_from_slice(id),
            PaymentId::Long(id) => slot.copy_from_slice(id),
        }
        Hash(slot)
    }

    /// Appends this id to `extra` as a nonce field. `None` appends nothing.
    pub fn encode_into(&self, extra: &mut TxExtra) -> Result<(), PaymentIdError> {
        let nonce = match self {
            PaymentId::None => return Ok(()),
            PaymentId::Short(id) => {
                let mut nonce = Vec::with_capacity(1 + SHORT_PAYMENT_ID_LENGTH);
                nonce.push(TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID);
                nonce.extend_from_slice(id);
                nonce
            }
            PaymentId::Long(id) => {
                let mut nonce = Vec::with_capacity(1 + LONG_PAYMENT_ID_LENGTH);
                nonce.push(TX_EXTRA_NONCE_PAYMENT_ID);
                nonce.extend_from_slice(id);
                nonce
            }
        };
        extra.add_nonce(&nonce)?;
        Ok(())
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentId::None => Ok(()),
            PaymentId::Short(id) => f.write_str(&hex::encode(id)),
            PaymentId::Long(id) => f.write_str(&hex::encode(id)),
        }
    }
}

/// Renders a ledger slot for display: 64 hex characters, truncated to the
/// first 16 when the trailing 16 are all zero.
pub fn canonical_payment_id(slot: &Hash) -> String {
    let full = slot.to_hex();
    if full[16..].bytes().all(|c| c == b'0') {
        full[..16].to_string()
    } else {
        full
    }
}

// ---------------------------------------------------------------------------
// TxExtra
// ---------------------------------------------------------------------------

/// The transaction extension blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxExtra(Vec<u8>);

impl TxExtra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a nonce field. Fails if the blob already has one.
    pub fn add_nonce(&mut self, nonce: &[u8]) -> Result<(), ExtraError> {
        if nonce.len() > TX_EXTRA_NONCE_MAX_COUNT {
            return Err(ExtraError::NonceTooLong(nonce.len()));
        }
        if self.nonce()?.is_some() {
            return Err(ExtraError::NonceAlreadyPresent);
        }
        self.0.push(TX_EXTRA_NONCE);
        self.0.push(nonce.len() as u8);
        self.0.extend_from_slice(nonce);
        Ok(())
    }

    /// Appends a transaction public key field.
    pub fn add_tx_pubkey(&mut self, key: &[u8; 32]) {
        self.0.push(TX_EXTRA_TAG_PUBKEY);
        self.0.extend_from_slice(key);
    }

    /// The first nonce field, if any.
    pub fn nonce(&self) -> Result<Option<&[u8]>, ExtraError> {
        let data = &self.0;
        let mut pos = 0;
        while pos < data.len() {
            match data[pos] {
                TX_EXTRA_TAG_PADDING => {
                    if data[pos + 1..].iter().any(|b| *b != 0) {
                        return Err(ExtraError::Malformed(pos));
                    }
                    return Ok(None);
                }
                TX_EXTRA_TAG_PUBKEY => {
                    pos += 1 + 32;
                    if pos > data.len() {
                        return Err(ExtraError::Malformed(pos));
                    }
                }
                TX_EXTRA_NONCE => {
                    let len = *data.get(pos + 1).ok_or(ExtraError::Malformed(pos))? as usize;
                    let start = pos + 2;
                    let end = start + len;
                    if end > data.len() {
                        return Err(ExtraError::Malformed(pos));
                    }
                    return Ok(Some(&data[start..end]));
                }
                TX_EXTRA_TAG_ADDITIONAL_PUBKEYS => {
                    let (count, used) = crate::address::varint::read(&data[pos + 1..])
                        .ok_or(ExtraError::Malformed(pos))?;
                    let keys = usize::try_from(count)
                        .ok()
                        .and_then(|c| c.checked_mul(32))
                        .ok_or(ExtraError::Malformed(pos))?;
                    pos = pos
                        .checked_add(1 + used)
                        .and_then(|p| p.checked_add(keys))
                        .ok_or(ExtraError::Malformed(pos))?;
                    if pos > data.len() {
                        return Err(ExtraError::Malformed(pos));
                    }
                }
                _ => return Err(ExtraError::Malformed(pos)),
            }
        }
        Ok(None)
    }

    /// Reads the payment id back out of the nonce field.
    pub fn payment_id(&self) -> Result<PaymentId, ExtraError> {
        let Some(nonce) = self.nonce()? else {
            return Ok(PaymentId::None);
        };
        match (nonce.first(), nonce.len()) {
            (Some(&TX_EXTRA_NONCE_PAYMENT_ID), n) if n == 1 + LONG_PAYMENT_ID_LENGTH => {
                let mut id = [0u8; LONG_PAYMENT_ID_LENGTH];
                id.copy_from_slice(&nonce[1..]);
                Ok(PaymentId::Long(id))
            }
            (Some(&TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID), n) if n == 1 + SHORT_PAYMENT_ID_LENGTH => {
                let mut id = [0u8; SHORT_PAYMENT_ID_LENGTH];
                id.copy_from_slice(&nonce[1..]);
                Ok(PaymentId::Short(id))
            }
            _ => Ok(PaymentId::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_no_payment_id() {
        assert_eq!(PaymentId::parse("").unwrap(), PaymentId::None);
    }

    #[test]
    fn short_and_long_ids_parse_by_length() {
        assert!(matches!(
            PaymentId::parse("0123456789abcdef").unwrap(),
            PaymentId::Short(_)
        ));
        assert!(matches!(
            PaymentId::parse(&"ab".repeat(32)).unwrap(),
            PaymentId::Long(_)
        ));
    }

    #[test]
    fn other_lengths_are_rejected() {
        let candidates = vec![
            "0".to_string(),
            "0123456789abcde".to_string(),
            "0123456789abcdef0".to_string(),
            "a".repeat(63),
            "a".repeat(65),
        ];
        for bad in &candidates {
            assert!(
                matches!(PaymentId::parse(bad), Err(PaymentIdError::InvalidFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn non_hex_of_valid_length_is_rejected() {
        assert!(PaymentId::parse("0123456789abcdeg").is_err());
    }

    #[test]
    fn short_id_goes_into_encrypted_nonce() {
        let mut extra = TxExtra::new();
        let id = PaymentId::parse("0123456789abcdef").unwrap();
        id.encode_into(&mut extra).unwrap();
        let bytes = extra.as_bytes();
        assert_eq!(bytes[0], TX_EXTRA_NONCE);
        assert_eq!(bytes[1], 9);
        assert_eq!(bytes[2], TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID);
        assert_eq!(extra.payment_id().unwrap(), id);
    }

    #[test]
    fn long_id_goes_into_plain_nonce() {
        let mut extra = TxExtra::new();
        let id = PaymentId::parse(&"cd".repeat(32)).unwrap();
        id.encode_into(&mut extra).unwrap();
        assert_eq!(extra.as_bytes()[2], TX_EXTRA_NONCE_PAYMENT_ID);
        assert_eq!(extra.as_bytes().len(), 2 + 33);
        assert_eq!(extra.payment_id().unwrap(), id);
    }

    #[test]
    fn none_leaves_extra_untouched() {
        let mut extra = TxExtra::new();
        PaymentId::None.encode_into(&mut extra).unwrap();
        assert!(extra.is_empty());
    }

    #[test]
    fn second_nonce_is_refused() {
        let mut extra = TxExtra::new();
        PaymentId::parse("0123456789abcdef")
            .unwrap()
            .encode_into(&mut extra)
            .unwrap();
        let err = PaymentId::parse(&"00".repeat(32))
            .unwrap()
            .encode_into(&mut extra)
            .unwrap_err();
        assert_eq!(err, PaymentIdError::Extra(ExtraError::NonceAlreadyPresent));
    }

    #[test]
    fn nonce_found_after_pubkey() {
        let mut extra = TxExtra::new();
        extra.add_tx_pubkey(&[7; 32]);
        extra.add_nonce(&[TX_EXTRA_NONCE_PAYMENT_ID; 33]).unwrap();
        assert_eq!(extra.nonce().unwrap().map(|n| n.len()), Some(33));
    }

    #[test]
    fn huge_additional_key_count_is_malformed() {
        let mut bytes = vec![TX_EXTRA_TAG_ADDITIONAL_PUBKEYS];
        crate::address::varint::write(&mut bytes, (usize::MAX / 32) as u64);
        let extra = TxExtra(bytes);
        assert_eq!(extra.nonce(), Err(ExtraError::Malformed(0)));
    }

    #[test]
    fn oversized_nonce_is_refused() {
        let mut extra = TxExtra::new();
        assert_eq!(
            extra.add_nonce(&[0u8; 256]),
            Err(ExtraError::NonceTooLong(256))
        );
    }

    #[test]
    fn short_slot_displays_as_sixteen_chars() {
        let slot = PaymentId::parse("0123456789abcdef").unwrap().to_slot();
        assert_eq!(canonical_payment_id(&slot), "0123456789abcdef");
    }

    #[test]
    fn long_slot_displays_in_full() {
        let long = format!("{}{}", "0".repeat(48), "1".repeat(16));
        let slot = PaymentId::parse(&long).unwrap().to_slot();
        assert_eq!(canonical_payment_id(&slot), long);
    }

    #[test]
    fn empty_slot_displays_as_zeros() {
        assert_eq!(canonical_payment_id(&Hash::ZERO), "0".repeat(16));
    }

    #[test]
    fn lookup_requires_an_id() {
        assert!(PaymentId::parse_lookup("").is_err());
        let slot = PaymentId::parse_lookup("0123456789abcdef").unwrap();
        assert_eq!(&slot.0[..8], &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert!(slot.0[8..].iter().all(|b| *b == 0));
    }
}
