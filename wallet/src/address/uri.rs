//! # Payment URIs
//!
//! A payment request packed into one string:
//!
//! ```text
//! solace:<address>?tx_payment_id=<id>&tx_amount=<coins>&recipient_name=<name>&tx_description=<text>
//! ```
//!
//! Every parameter is optional. The amount is written in whole coins with
//! up to [`COIN_DECIMALS`] fractional digits. Values are form-urlencoded.
//! Parameters this wallet does not understand are handed back to the caller
//! untouched instead of failing the parse.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use super::{parse_address, Network};
use crate::config::{COIN_DECIMALS, URI_SCHEME};
use crate::transfer::payment_id::PaymentId;

const PARAM_PAYMENT_ID: &str = "tx_payment_id";
const PARAM_AMOUNT: &str = "tx_amount";
const PARAM_RECIPIENT_NAME: &str = "recipient_name";
const PARAM_DESCRIPTION: &str = "tx_description";

/// The fields of a payment request. Empty strings and a zero amount mean
/// "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentUri {
    pub address: String,
    pub payment_id: String,
    pub amount: u64,
    pub tx_description: String,
    pub recipient_name: String,
}

/// Result of [`parse_uri`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUri {
    pub uri: PaymentUri,
    /// Raw `key=value` arguments that were not recognized.
    pub unknown_parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("URI has wrong scheme (expected \"solace:\"): {0}")]
    WrongScheme(String),

    #[error("wrong address: {0}")]
    WrongAddress(String),

    #[error("a single payment id is allowed")]
    SinglePaymentId,

    #[error("separate payment id given with an integrated address")]
    SeparatePaymentId,

    #[error("invalid payment id: {0}")]
    InvalidPaymentId(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Builds a URI for `request`, checking the address and payment id first.
pub fn make_uri(network: Network, request: &PaymentUri) -> Result<String, UriError> {
    let info = parse_address(network, &request.address)
        .map_err(|_| UriError::WrongAddress(request.address.clone()))?;

    if !request.payment_id.is_empty() {
        if info.payment_id.is_some() {
            return Err(UriError::SinglePaymentId);
        }
        PaymentId::parse(&request.payment_id)
            .map_err(|_| UriError::InvalidPaymentId(request.payment_id.clone()))?;
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    if !request.payment_id.is_empty() {
        query.append_pair(PARAM_PAYMENT_ID, &request.payment_id);
    }
    if request.amount > 0 {
        query.append_pair(PARAM_AMOUNT, &format_amount(request.amount));
    }
    if !request.recipient_name.is_empty() {
        query.append_pair(PARAM_RECIPIENT_NAME, &request.recipient_name);
    }
    if !request.tx_description.is_empty() {
        query.append_pair(PARAM_DESCRIPTION, &request.tx_description);
    }
    let query = query.finish();

    let mut uri = format!("{URI_SCHEME}:{}", request.address);
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(&query);
    }
    Ok(uri)
}

/// Splits a URI back into its fields.
pub fn parse_uri(network: Network, uri: &str) -> Result<ParsedUri, UriError> {
    let rest = uri
        .strip_prefix(URI_SCHEME)
        .and_then(|r| r.strip_prefix(':'))
        .ok_or_else(|| UriError::WrongScheme(uri.to_string()))?;

    let (address, query) = match rest.split_once('?') {
        Some((address, query)) => (address, Some(query)),
        None => (rest, None),
    };
    let info = parse_address(network, address)
        .map_err(|_| UriError::WrongAddress(address.to_string()))?;

    let mut parsed = ParsedUri {
        uri: PaymentUri {
            address: address.to_string(),
            ..PaymentUri::default()
        },
        unknown_parameters: Vec::new(),
    };

    for arg in query.into_iter().flat_map(|q| q.split('&')) {
        if arg.matches('=').count() != 1 {
            parsed.unknown_parameters.push(arg.to_string());
            continue;
        }
        let Some((key, value)) = form_urlencoded::parse(arg.as_bytes()).next() else {
            continue;
        };
        match key.as_ref() {
            PARAM_AMOUNT => {
                parsed.uri.amount =
                    parse_amount(&value).ok_or_else(|| UriError::InvalidAmount(value.to_string()))?;
            }
            PARAM_PAYMENT_ID => {
                if info.payment_id.is_some() {
                    return Err(UriError::SeparatePaymentId);
                }
                if value.is_empty() || PaymentId::parse(&value).is_err() {
                    return Err(UriError::InvalidPaymentId(value.into_owned()));
                }
                parsed.uri.payment_id = value.into_owned();
            }
            PARAM_RECIPIENT_NAME => parsed.uri.recipient_name = value.into_owned(),
            PARAM_DESCRIPTION => parsed.uri.tx_description = value.into_owned(),
            _ => parsed.unknown_parameters.push(arg.to_string()),
        }
    }
    Ok(parsed)
}

/// Atomic units as decimal coins, always with every fractional digit.
pub fn format_amount(atomic: u64) -> String {
    let unit = 10u64.pow(COIN_DECIMALS);
    format!(
        "{}.{:0width$}",
        atomic / unit,
        atomic % unit,
        width = COIN_DECIMALS as usize
    )
}

/// Decimal coins as atomic units. `None` on anything but digits with at most
/// one point, on excess precision, or on overflow.
pub fn parse_amount(s: &str) -> Option<u64> {
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !digits(whole) || !digits(fraction) || fraction.len() > COIN_DECIMALS as usize {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        let scale = 10u64.pow(COIN_DECIMALS - fraction.len() as u32);
        fraction.parse::<u64>().ok()? * scale
    };
    whole
        .checked_mul(10u64.pow(COIN_DECIMALS))?
        .checked_add(fraction)
}
