//! # Wallet JSON-RPC
//!
//! Transport-independent half of the wallet RPC server:
//!
//! - [`types`]: JSON-RPC envelope and per-operation bodies.
//! - [`error`]: the wire error taxonomy with fixed codes.
//! - [`methods`]: the closed operation set and its dispatch table.
//! - [`handlers`]: [`WalletRpc`], which owns the engine and implements
//!   every operation.
//!
//! [`RpcService`] ties them together: it takes a decoded envelope and
//! returns the envelope to send back. The HTTP layer lives in the
//! `solace-wallet-rpc` binary.

pub mod error;
pub mod handlers;
pub mod methods;
pub mod types;

use std::time::Instant;

use serde_json::Value;

pub use error::WalletRpcError;
pub use handlers::WalletRpc;
pub use methods::{Dispatcher, Operation, RpcMethod};
pub use types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

use crate::config::RpcOptions;
use crate::engine::{EngineError, WalletEngine};

/// Outcome of one request, for callers that record metrics.
#[derive(Debug, Clone)]
pub struct CallReport {
    /// Canonical method name, or the requested name when unknown.
    pub method: String,
    pub error_code: Option<i32>,
    pub elapsed_secs: f64,
}

/// A [`WalletRpc`] plus its dispatch table.
pub struct RpcService<E> {
    rpc: WalletRpc<E>,
    dispatcher: Dispatcher<E>,
}

impl<E: WalletEngine + 'static> RpcService<E> {
    pub fn new(wallet: E, options: RpcOptions) -> Self {
        Self::from_rpc(WalletRpc::new(wallet, options))
    }

    pub fn from_rpc(rpc: WalletRpc<E>) -> Self {
        Self {
            rpc,
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn rpc(&self) -> &WalletRpc<E> {
        &self.rpc
    }

    pub fn rpc_mut(&mut self) -> &mut WalletRpc<E> {
        &mut self.rpc
    }

    pub fn into_rpc(self) -> WalletRpc<E> {
        self.rpc
    }

    pub fn stop_requested(&self) -> bool {
        self.rpc.stop_requested()
    }

    /// Handles one envelope.
    pub fn handle(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.handle_with_report(request).0
    }

    /// Handles one envelope and reports what happened.
    pub fn handle_with_report(&mut self, request: JsonRpcRequest) -> (JsonRpcResponse, CallReport) {
        let started = Instant::now();
        let method = self
            .dispatcher
            .lookup(&request.method)
            .map(|op| op.method.name().to_string())
            .unwrap_or_else(|| request.method.clone());

        let outcome = self.call(&request);
        let report = CallReport {
            method,
            error_code: outcome.as_ref().err().map(WalletRpcError::code),
            elapsed_secs: started.elapsed().as_secs_f64(),
        };

        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(err) => {
                tracing::warn!(
                    method = %report.method,
                    code = err.code(),
                    error = %err,
                    "rpc call failed"
                );
                JsonRpcResponse::failure(request.id, err.to_json_error())
            }
        };
        (response, report)
    }

    fn call(&mut self, request: &JsonRpcRequest) -> Result<Value, WalletRpcError> {
        if request.jsonrpc != "2.0" {
            return Err(WalletRpcError::InvalidRequest(
                "jsonrpc must be \"2.0\"".into(),
            ));
        }
        let params = request.params.clone().unwrap_or(Value::Null);
        tracing::debug!(method = %request.method, "rpc call");
        self.dispatcher.dispatch(&mut self.rpc, &request.method, params)
    }

    /// Pulls new blocks into the wallet. Without a wallet this is a no-op.
    pub fn refresh(&mut self) -> Result<(), EngineError> {
        match self.rpc.wallet_mut() {
            Some(wallet) => wallet.refresh(),
            None => Ok(()),
        }
    }

    /// Persists the wallet. Without a wallet this is a no-op.
    pub fn store(&mut self) -> Result<(), EngineError> {
        match self.rpc.wallet_mut() {
            Some(wallet) => wallet.store(),
            None => Ok(()),
        }
    }

    pub fn height(&self) -> Option<u64> {
        self.rpc.wallet().map(|w| w.height())
    }
}
