//! Wire error taxonomy of the wallet RPC.
//!
//! Every failure a handler can produce maps onto exactly one variant, and
//! every variant onto one fixed integer code. Codes `-1..=-16` are wallet
//! errors; the `-326xx` range is reserved for JSON-RPC envelope errors.

use thiserror::Error;

use super::types::JsonRpcError;
use crate::crypto::HashParseError;
use crate::engine::EngineError;
use crate::history::OutputFilterError;
use crate::transfer::payment_id::PaymentIdError;
use crate::transfer::TransferError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletRpcError {
    /// Catch-all wrapping an unexpected failure's message.
    #[error("{0}")]
    Unknown(String),

    #[error("{0}")]
    WrongAddress(String),

    /// Transient; the caller may retry.
    #[error("{0}")]
    DaemonBusy(String),

    #[error("{0}")]
    GenericTransfer(String),

    #[error("{0}")]
    WrongPaymentId(String),

    #[error("{0}")]
    InvalidTransferTypeFilter(String),

    /// Refused in restricted mode.
    #[error("Command unavailable in restricted mode.")]
    Denied,

    #[error("{0}")]
    WrongTxid(String),

    #[error("{0}")]
    WrongSignature(String),

    #[error("{0}")]
    WrongKeyImage(String),

    #[error("{0}")]
    WrongUri(String),

    #[error("{0}")]
    WrongIndex(String),

    /// No wallet is loaded.
    #[error("No wallet file")]
    NotOpen,

    #[error("Account index is out of bound")]
    AccountIndexOutOfBound,

    #[error("Address index is out of bound")]
    AddressIndexOutOfBound,

    /// Only raised once the retry policy gave up.
    #[error("{0}")]
    TxTooBig(String),

    // -- envelope errors ---------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

impl WalletRpcError {
    /// The integer carried in the error object.
    pub fn code(&self) -> i32 {
        match self {
            WalletRpcError::Unknown(_) => -1,
            WalletRpcError::WrongAddress(_) => -2,
            WalletRpcError::DaemonBusy(_) => -3,
            WalletRpcError::GenericTransfer(_) => -4,
            WalletRpcError::WrongPaymentId(_) => -5,
            WalletRpcError::InvalidTransferTypeFilter(_) => -6,
            WalletRpcError::Denied => -7,
            WalletRpcError::WrongTxid(_) => -8,
            WalletRpcError::WrongSignature(_) => -9,
            WalletRpcError::WrongKeyImage(_) => -10,
            WalletRpcError::WrongUri(_) => -11,
            WalletRpcError::WrongIndex(_) => -12,
            WalletRpcError::NotOpen => -13,
            WalletRpcError::AccountIndexOutOfBound => -14,
            WalletRpcError::AddressIndexOutOfBound => -15,
            WalletRpcError::TxTooBig(_) => -16,
            WalletRpcError::Parse(_) => -32700,
            WalletRpcError::InvalidRequest(_) => -32600,
            WalletRpcError::MethodNotFound(_) => -32601,
            WalletRpcError::InvalidParams(_) => -32602,
        }
    }

    pub fn to_json_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

impl From<TransferError> for WalletRpcError {
    fn from(err: TransferError) -> Self {
        let message = err.to_string();
        match err {
            TransferError::WrongAddress(_) => WalletRpcError::WrongAddress(message),
            TransferError::WrongPaymentId(_) => WalletRpcError::WrongPaymentId(message),
            TransferError::DaemonBusy => WalletRpcError::DaemonBusy(message),
            TransferError::TxTooBig { .. } => WalletRpcError::TxTooBig(message),
            TransferError::Generic(_) => WalletRpcError::GenericTransfer(message),
        }
    }
}

impl From<PaymentIdError> for WalletRpcError {
    fn from(err: PaymentIdError) -> Self {
        WalletRpcError::WrongPaymentId(err.to_string())
    }
}

/// Engine failures outside a transfer, such as store or rescan.
impl From<EngineError> for WalletRpcError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DaemonBusy => WalletRpcError::DaemonBusy(err.to_string()),
            other => WalletRpcError::Unknown(other.to_string()),
        }
    }
}

impl From<OutputFilterError> for WalletRpcError {
    fn from(err: OutputFilterError) -> Self {
        WalletRpcError::InvalidTransferTypeFilter(err.to_string())
    }
}

impl From<HashParseError> for WalletRpcError {
    fn from(err: HashParseError) -> Self {
        match err {
            HashParseError::InvalidHex => {
                WalletRpcError::WrongTxid("Transaction ID has invalid format".into())
            }
            HashParseError::InvalidSize(_) => {
                WalletRpcError::WrongTxid("Transaction ID has invalid size".into())
            }
        }
    }
}
