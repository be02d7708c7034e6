//! # Operation Table
//!
//! [`RpcMethod`] is the closed set of operations the server understands.
//! [`Dispatcher`] maps every accepted name (aliases included) to an
//! [`Operation`]: a validation step (restricted-mode check, then typed
//! parameter decoding) followed by the typed handler on [`WalletRpc`].

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::WalletRpcError;
use super::handlers::WalletRpc;
use crate::engine::WalletEngine;

/// Every operation of the wallet RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    GetBalance,
    GetAddress,
    CreateAddress,
    LabelAddress,
    GetAccounts,
    CreateAccount,
    LabelAccount,
    GetHeight,
    Transfer,
    TransferSplit,
    SweepDust,
    SweepAll,
    Store,
    GetPayments,
    GetBulkPayments,
    IncomingTransfers,
    MakeIntegratedAddress,
    SplitIntegratedAddress,
    MakeUri,
    ParseUri,
    GetAddressBook,
    AddAddressBook,
    DeleteAddressBook,
    StopWallet,
    RescanBlockchain,
    RescanSpent,
    SetTxNotes,
    GetTxNotes,
    GetTransfers,
    GetTransferByTxid,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 30] = [
        RpcMethod::GetBalance,
        RpcMethod::GetAddress,
        RpcMethod::CreateAddress,
        RpcMethod::LabelAddress,
        RpcMethod::GetAccounts,
        RpcMethod::CreateAccount,
        RpcMethod::LabelAccount,
        RpcMethod::GetHeight,
        RpcMethod::Transfer,
        RpcMethod::TransferSplit,
        RpcMethod::SweepDust,
        RpcMethod::SweepAll,
        RpcMethod::Store,
        RpcMethod::GetPayments,
        RpcMethod::GetBulkPayments,
        RpcMethod::IncomingTransfers,
        RpcMethod::MakeIntegratedAddress,
        RpcMethod::SplitIntegratedAddress,
        RpcMethod::MakeUri,
        RpcMethod::ParseUri,
        RpcMethod::GetAddressBook,
        RpcMethod::AddAddressBook,
        RpcMethod::DeleteAddressBook,
        RpcMethod::StopWallet,
        RpcMethod::RescanBlockchain,
        RpcMethod::RescanSpent,
        RpcMethod::SetTxNotes,
        RpcMethod::GetTxNotes,
        RpcMethod::GetTransfers,
        RpcMethod::GetTransferByTxid,
    ];

    /// Canonical wire name.
    pub fn name(self) -> &'static str {
        match self {
            RpcMethod::GetBalance => "getbalance",
            RpcMethod::GetAddress => "getaddress",
            RpcMethod::CreateAddress => "create_address",
            RpcMethod::LabelAddress => "label_address",
            RpcMethod::GetAccounts => "get_accounts",
            RpcMethod::CreateAccount => "create_account",
            RpcMethod::LabelAccount => "label_account",
            RpcMethod::GetHeight => "getheight",
            RpcMethod::Transfer => "transfer",
            RpcMethod::TransferSplit => "transfer_split",
            RpcMethod::SweepDust => "sweep_dust",
            RpcMethod::SweepAll => "sweep_all",
            RpcMethod::Store => "store",
            RpcMethod::GetPayments => "get_payments",
            RpcMethod::GetBulkPayments => "get_bulk_payments",
            RpcMethod::IncomingTransfers => "incoming_transfers",
            RpcMethod::MakeIntegratedAddress => "make_integrated_address",
            RpcMethod::SplitIntegratedAddress => "split_integrated_address",
            RpcMethod::MakeUri => "make_uri",
            RpcMethod::ParseUri => "parse_uri",
            RpcMethod::GetAddressBook => "get_address_book",
            RpcMethod::AddAddressBook => "add_address_book",
            RpcMethod::DeleteAddressBook => "delete_address_book",
            RpcMethod::StopWallet => "stop_wallet",
            RpcMethod::RescanBlockchain => "rescan_blockchain",
            RpcMethod::RescanSpent => "rescan_spent",
            RpcMethod::SetTxNotes => "set_tx_notes",
            RpcMethod::GetTxNotes => "get_tx_notes",
            RpcMethod::GetTransfers => "get_transfers",
            RpcMethod::GetTransferByTxid => "get_transfer_by_txid",
        }
    }

    /// Alternative wire names.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            RpcMethod::GetBalance => &["get_balance"],
            RpcMethod::GetAddress => &["get_address"],
            RpcMethod::GetHeight => &["get_height"],
            _ => &[],
        }
    }

    /// Whether the operation is refused when the server runs restricted.
    pub fn is_restricted(self) -> bool {
        matches!(
            self,
            RpcMethod::Transfer
                | RpcMethod::TransferSplit
                | RpcMethod::SweepDust
                | RpcMethod::SweepAll
                | RpcMethod::Store
                | RpcMethod::StopWallet
                | RpcMethod::RescanBlockchain
                | RpcMethod::RescanSpent
                | RpcMethod::GetTransfers
                | RpcMethod::GetTransferByTxid
                | RpcMethod::AddAddressBook
                | RpcMethod::DeleteAddressBook
        )
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// A request that passed validation, ready to run against the wallet.
pub type PreparedCall<E> = Box<dyn FnOnce(&mut WalletRpc<E>) -> Result<Value, WalletRpcError>>;

type Decoder<E> = Box<dyn Fn(Value) -> Result<PreparedCall<E>, WalletRpcError> + Send + Sync>;

/// One row of the operation table.
pub struct Operation<E> {
    pub method: RpcMethod,
    decode: Decoder<E>,
}

impl<E: WalletEngine> Operation<E> {
    /// Refuses restricted operations when `restricted` is set, then decodes
    /// `params` into the operation's typed request. Nothing here touches
    /// the wallet.
    pub fn validate(
        &self,
        restricted: bool,
        params: Value,
    ) -> Result<PreparedCall<E>, WalletRpcError> {
        if restricted && self.method.is_restricted() {
            tracing::warn!(method = %self.method, "refused in restricted mode");
            return Err(WalletRpcError::Denied);
        }
        (self.decode)(params)
    }

    /// Runs a validated request.
    pub fn execute(
        &self,
        rpc: &mut WalletRpc<E>,
        call: PreparedCall<E>,
    ) -> Result<Value, WalletRpcError> {
        tracing::trace!(method = %self.method, "executing");
        call(rpc)
    }
}

/// Wraps a typed handler into a table entry.
fn operation<E, Req, Resp>(
    method: RpcMethod,
    handler: fn(&mut WalletRpc<E>, Req) -> Result<Resp, WalletRpcError>,
) -> Operation<E>
where
    E: WalletEngine + 'static,
    Req: DeserializeOwned + 'static,
    Resp: Serialize + 'static,
{
    Operation {
        method,
        decode: Box::new(move |params: Value| {
            let request: Req = decode_params(params)?;
            let call: PreparedCall<E> = Box::new(move |rpc: &mut WalletRpc<E>| {
                let response = handler(rpc, request)?;
                serde_json::to_value(response)
                    .map_err(|e| WalletRpcError::Unknown(e.to_string()))
            });
            Ok(call)
        }),
    }
}

/// Absent or null params decode as `{}`.
fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, WalletRpcError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| WalletRpcError::InvalidParams(e.to_string()))
}

/// Name-to-operation table.
pub struct Dispatcher<E> {
    operations: Vec<Operation<E>>,
    by_name: HashMap<&'static str, usize>,
}

impl<E: WalletEngine + 'static> Dispatcher<E> {
    pub fn new() -> Self {
        let operations = vec![
            operation(RpcMethod::GetBalance, WalletRpc::get_balance),
            operation(RpcMethod::GetAddress, WalletRpc::get_address),
            operation(RpcMethod::CreateAddress, WalletRpc::create_address),
            operation(RpcMethod::LabelAddress, WalletRpc::label_address),
            operation(RpcMethod::GetAccounts, WalletRpc::get_accounts),
            operation(RpcMethod::CreateAccount, WalletRpc::create_account),
            operation(RpcMethod::LabelAccount, WalletRpc::label_account),
            operation(RpcMethod::GetHeight, WalletRpc::get_height),
            operation(RpcMethod::Transfer, WalletRpc::transfer),
            operation(RpcMethod::TransferSplit, WalletRpc::transfer_split),
            operation(RpcMethod::SweepDust, WalletRpc::sweep_dust),
            operation(RpcMethod::SweepAll, WalletRpc::sweep_all),
            operation(RpcMethod::Store, WalletRpc::store),
            operation(RpcMethod::GetPayments, WalletRpc::get_payments),
            operation(RpcMethod::GetBulkPayments, WalletRpc::get_bulk_payments),
            operation(RpcMethod::IncomingTransfers, WalletRpc::incoming_transfers),
            operation(RpcMethod::MakeIntegratedAddress, WalletRpc::make_integrated_address),
            operation(RpcMethod::SplitIntegratedAddress, WalletRpc::split_integrated_address),
            operation(RpcMethod::MakeUri, WalletRpc::make_uri),
            operation(RpcMethod::ParseUri, WalletRpc::parse_uri),
            operation(RpcMethod::GetAddressBook, WalletRpc::get_address_book),
            operation(RpcMethod::AddAddressBook, WalletRpc::add_address_book),
            operation(RpcMethod::DeleteAddressBook, WalletRpc::delete_address_book),
            operation(RpcMethod::StopWallet, WalletRpc::stop_wallet),
            operation(RpcMethod::RescanBlockchain, WalletRpc::rescan_blockchain),
            operation(RpcMethod::RescanSpent, WalletRpc::rescan_spent),
            operation(RpcMethod::SetTxNotes, WalletRpc::set_tx_notes),
            operation(RpcMethod::GetTxNotes, WalletRpc::get_tx_notes),
            operation(RpcMethod::GetTransfers, WalletRpc::get_transfers),
            operation(RpcMethod::GetTransferByTxid, WalletRpc::get_transfer_by_txid),
        ];

        let mut by_name = HashMap::new();
        for (position, op) in operations.iter().enumerate() {
            by_name.insert(op.method.name(), position);
            for alias in op.method.aliases() {
                by_name.insert(*alias, position);
            }
        }
        Self {
            operations,
            by_name,
        }
    }

    /// The operation registered under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Operation<E>> {
        self.by_name.get(name).map(|&i| &self.operations[i])
    }

    /// Validates and executes `name` against `rpc`.
    pub fn dispatch(
        &self,
        rpc: &mut WalletRpc<E>,
        name: &str,
        params: Value,
    ) -> Result<Value, WalletRpcError> {
        let op = self
            .lookup(name)
            .ok_or_else(|| WalletRpcError::MethodNotFound(name.to_string()))?;
        let call = op.validate(rpc.options().restricted, params)?;
        op.execute(rpc, call)
    }

    /// Every accepted name, aliases included.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }
}

impl<E: WalletEngine + 'static> Default for Dispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}
