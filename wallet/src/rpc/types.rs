//! JSON-RPC envelope and the request/response bodies of every operation.
//!
//! Request fields default when absent, so `{}` is a valid body for every
//! operation whose fields are all optional.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::uri::PaymentUri;
use crate::engine::SubaddressIndex;
use crate::history::TransferEntry;
use crate::transfer::DestinationRequest;

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Named parameters. Absent means `{}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request identifier. Echoed back in the response.
    #[serde(default)]
    pub id: Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Body of operations that return nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

// ---------------------------------------------------------------------------
// Accounts & Addresses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetBalanceRequest {
    pub account_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaddressBalanceInfo {
    pub address_index: u32,
    pub address: String,
    pub balance: u64,
    pub unlocked_balance: u64,
    pub label: String,
    pub num_unspent_outputs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBalanceResponse {
    pub balance: u64,
    pub unlocked_balance: u64,
    pub per_subaddress: Vec<SubaddressBalanceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetAddressRequest {
    pub account_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub label: String,
    pub address_index: u32,
    /// Whether any output was ever received at this address.
    pub used: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAddressResponse {
    /// Base address of the account.
    pub address: String,
    pub addresses: Vec<AddressInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateAddressRequest {
    pub account_index: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAddressResponse {
    pub address: String,
    pub address_index: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelAddressRequest {
    pub index: SubaddressIndex,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_index: u32,
    pub base_address: String,
    pub balance: u64,
    pub unlocked_balance: u64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAccountsResponse {
    pub subaddress_accounts: Vec<AccountInfo>,
    pub total_balance: u64,
    pub total_unlocked_balance: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateAccountRequest {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub account_index: u32,
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelAccountRequest {
    pub account_index: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetHeightResponse {
    pub height: u64,
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Body of `transfer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferRequest {
    pub destinations: Vec<DestinationRequest>,
    pub payment_id: String,
    pub mixin: u64,
    pub unlock_time: u64,
    pub priority: u32,
    pub account_index: u32,
    pub subaddr_indices: BTreeSet<u32>,
    pub trusted_daemon: bool,
    pub get_tx_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_key: Option<String>,
    pub fee: u64,
}

/// Body of `transfer_split`. Same fields as `transfer`, but keys are
/// requested with `get_tx_keys`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferSplitRequest {
    pub destinations: Vec<DestinationRequest>,
    pub payment_id: String,
    pub mixin: u64,
    pub unlock_time: u64,
    pub priority: u32,
    pub account_index: u32,
    pub subaddr_indices: BTreeSet<u32>,
    pub trusted_daemon: bool,
    pub get_tx_keys: bool,
}

/// Parallel lists, one element per committed transaction in engine order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferListResponse {
    pub tx_hash_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_key_list: Option<Vec<String>>,
    pub amount_list: Vec<u64>,
    pub fee_list: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SweepDustRequest {
    pub trusted_daemon: bool,
    pub get_tx_keys: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SweepAllRequest {
    pub address: String,
    pub payment_id: String,
    pub mixin: u64,
    pub unlock_time: u64,
    pub priority: u32,
    pub below_amount: u64,
    pub account_index: u32,
    pub subaddr_indices: BTreeSet<u32>,
    pub trusted_daemon: bool,
    pub get_tx_keys: bool,
}

// ---------------------------------------------------------------------------
// Payments & Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetPaymentsRequest {
    pub payment_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetBulkPaymentsRequest {
    /// Empty means payments with any id, or none.
    pub payment_ids: Vec<String>,
    /// Exclusive lower bound.
    pub min_block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_id: String,
    pub tx_hash: String,
    pub amount: u64,
    pub block_height: u64,
    pub unlock_time: u64,
    pub subaddr_index: SubaddressIndex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentsResponse {
    pub payments: Vec<PaymentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncomingTransfersRequest {
    pub transfer_type: String,
    pub account_index: u32,
    pub subaddr_indices: BTreeSet<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTransferInfo {
    pub amount: u64,
    pub spent: bool,
    pub global_index: u64,
    pub tx_hash: String,
    /// Minor index within the requested account.
    pub subaddr_index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingTransfersResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<IncomingTransferInfo>,
}

// ---------------------------------------------------------------------------
// Integrated Addresses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MakeIntegratedAddressRequest {
    /// 16 hex characters; empty picks a random id.
    pub payment_id: String,
    pub index: SubaddressIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeIntegratedAddressResponse {
    pub integrated_address: String,
    pub payment_id: String,
    pub label: String,
    pub used: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SplitIntegratedAddressRequest {
    pub integrated_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitIntegratedAddressResponse {
    pub standard_address: String,
    pub payment_id: String,
    pub is_subaddress: bool,
}

// ---------------------------------------------------------------------------
// URIs & Address Book
// ---------------------------------------------------------------------------

/// Body of `make_uri`: the fields to pack.
pub type MakeUriRequest = PaymentUri;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeUriResponse {
    pub uri: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParseUriRequest {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseUriResponse {
    pub uri: PaymentUri,
    pub unknown_parameters: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetAddressBookRequest {
    /// Row indices to return; empty returns the whole book.
    pub entries: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub index: u64,
    pub address: String,
    /// 64 hex characters; zero when the row has none.
    pub payment_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAddressBookResponse {
    pub entries: Vec<AddressBookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddAddressBookRequest {
    pub address: String,
    pub payment_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAddressBookResponse {
    pub index: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAddressBookRequest {
    pub index: u64,
}

// ---------------------------------------------------------------------------
// Notes & History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetTxNotesRequest {
    pub txids: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetTxNotesRequest {
    pub txids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTxNotesResponse {
    pub notes: Vec<String>,
}

/// Body of `get_transfers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetTransfersRequest {
    #[serde(rename = "in")]
    pub incoming: bool,
    #[serde(rename = "out")]
    pub outgoing: bool,
    pub pending: bool,
    pub failed: bool,
    pub pool: bool,
    /// When false the height bounds are ignored.
    pub filter_by_height: bool,
    pub min_height: u64,
    pub max_height: u64,
    pub account_index: u32,
    pub subaddr_indices: BTreeSet<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetTransferByTxidRequest {
    pub txid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransferByTxidResponse {
    pub transfer: TransferEntry,
}
