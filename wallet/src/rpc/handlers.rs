//! # Wallet RPC Handlers
//!
//! [`WalletRpc`] owns the engine and implements every operation as a typed
//! method. It is `Send` but never shared: the server hands it to a single
//! worker thread, which is what serializes access to the ledger.

use super::error::WalletRpcError;
use super::types::*;
use crate::address::{parse_address, uri};
use crate::config::RpcOptions;
use crate::crypto::Hash;
use crate::engine::{AddressBookRow, SubaddressIndex, WalletEngine};
use crate::history::{
    collect_transfers, find_transfer, owned_outputs, payments_by_id, payments_since,
    HeightRange, OutputFilter, TransferHistory, TransferScope, TransfersQuery,
};
use crate::transfer::{
    build, build_dust_sweep, build_single, build_sweep_all, commit_and_report, resolve_transfer,
    run_with_retry, CommittedTransfer, DestinationRequest, PaymentId, TransferOptions,
};

/// The wallet RPC service state.
pub struct WalletRpc<E> {
    wallet: Option<E>,
    options: RpcOptions,
    stop_requested: bool,
}

impl<E: WalletEngine> WalletRpc<E> {
    pub fn new(wallet: E, options: RpcOptions) -> Self {
        Self {
            wallet: Some(wallet),
            options,
            stop_requested: false,
        }
    }

    /// A service with no wallet loaded. Every operation fails with `NotOpen`.
    pub fn without_wallet(options: RpcOptions) -> Self {
        Self {
            wallet: None,
            options,
            stop_requested: false,
        }
    }

    pub fn options(&self) -> &RpcOptions {
        &self.options
    }

    pub fn wallet(&self) -> Option<&E> {
        self.wallet.as_ref()
    }

    pub fn wallet_mut(&mut self) -> Option<&mut E> {
        self.wallet.as_mut()
    }

    pub fn into_wallet(self) -> Option<E> {
        self.wallet
    }

    /// Set once `stop_wallet` succeeded.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    fn engine(&mut self) -> Result<&mut E, WalletRpcError> {
        self.wallet.as_mut().ok_or(WalletRpcError::NotOpen)
    }

    fn engine_ref(&self) -> Result<&E, WalletRpcError> {
        self.wallet.as_ref().ok_or(WalletRpcError::NotOpen)
    }

    // -----------------------------------------------------------------------
    // Accounts & addresses
    // -----------------------------------------------------------------------

    pub fn get_balance(
        &mut self,
        req: GetBalanceRequest,
    ) -> Result<GetBalanceResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        check_account(engine, req.account_index)?;

        let mut response = GetBalanceResponse {
            balance: 0,
            unlocked_balance: 0,
            per_subaddress: Vec::new(),
        };
        for (minor, summary) in engine.subaddress_balances(req.account_index) {
            let index = SubaddressIndex::new(req.account_index, minor);
            response.balance = response.balance.saturating_add(summary.balance);
            response.unlocked_balance = response
                .unlocked_balance
                .saturating_add(summary.unlocked_balance);
            response.per_subaddress.push(SubaddressBalanceInfo {
                address_index: minor,
                address: encode_subaddress(engine, index)?,
                balance: summary.balance,
                unlocked_balance: summary.unlocked_balance,
                label: engine.label(index).unwrap_or_default(),
                num_unspent_outputs: summary.num_unspent_outputs,
            });
        }
        Ok(response)
    }

    pub fn get_address(
        &mut self,
        req: GetAddressRequest,
    ) -> Result<GetAddressResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        check_account(engine, req.account_index)?;

        let addresses = (0..engine.num_subaddresses(req.account_index))
            .map(|minor| {
                let index = SubaddressIndex::new(req.account_index, minor);
                Ok(AddressInfo {
                    address: encode_subaddress(engine, index)?,
                    label: engine.label(index).unwrap_or_default(),
                    address_index: minor,
                    used: is_used(engine, index),
                })
            })
            .collect::<Result<Vec<_>, WalletRpcError>>()?;
        Ok(GetAddressResponse {
            address: encode_subaddress(engine, SubaddressIndex::new(req.account_index, 0))?,
            addresses,
        })
    }

    pub fn create_address(
        &mut self,
        req: CreateAddressRequest,
    ) -> Result<CreateAddressResponse, WalletRpcError> {
        let engine = self.engine()?;
        let index = engine
            .add_subaddress(req.account_index, req.label)
            .ok_or(WalletRpcError::AccountIndexOutOfBound)?;
        tracing::info!(major = index.major, minor = index.minor, "subaddress created");
        Ok(CreateAddressResponse {
            address: encode_subaddress(engine, index)?,
            address_index: index.minor,
        })
    }

    pub fn label_address(&mut self, req: LabelAddressRequest) -> Result<Empty, WalletRpcError> {
        let engine = self.engine()?;
        check_index(engine, req.index)?;
        engine.set_label(req.index, req.label);
        Ok(Empty {})
    }

    pub fn get_accounts(&mut self, _req: Empty) -> Result<GetAccountsResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        let mut response = GetAccountsResponse {
            subaddress_accounts: Vec::new(),
            total_balance: 0,
            total_unlocked_balance: 0,
        };
        for major in 0..engine.num_accounts() {
            let base = SubaddressIndex::new(major, 0);
            let (balance, unlocked_balance) = engine
                .subaddress_balances(major)
                .values()
                .fold((0u64, 0u64), |(b, u), s| {
                    (b.saturating_add(s.balance), u.saturating_add(s.unlocked_balance))
                });
            response.total_balance = response.total_balance.saturating_add(balance);
            response.total_unlocked_balance =
                response.total_unlocked_balance.saturating_add(unlocked_balance);
            response.subaddress_accounts.push(AccountInfo {
                account_index: major,
                base_address: encode_subaddress(engine, base)?,
                balance,
                unlocked_balance,
                label: engine.label(base).unwrap_or_default(),
            });
        }
        Ok(response)
    }

    pub fn create_account(
        &mut self,
        req: CreateAccountRequest,
    ) -> Result<CreateAccountResponse, WalletRpcError> {
        let engine = self.engine()?;
        let account_index = engine.add_account(req.label);
        tracing::info!(account_index, "account created");
        Ok(CreateAccountResponse {
            account_index,
            address: encode_subaddress(engine, SubaddressIndex::new(account_index, 0))?,
        })
    }

    pub fn label_account(&mut self, req: LabelAccountRequest) -> Result<Empty, WalletRpcError> {
        let engine = self.engine()?;
        check_account(engine, req.account_index)?;
        engine.set_label(SubaddressIndex::new(req.account_index, 0), req.label);
        Ok(Empty {})
    }

    pub fn get_height(&mut self, _req: Empty) -> Result<GetHeightResponse, WalletRpcError> {
        Ok(GetHeightResponse {
            height: self.engine_ref()?.height(),
        })
    }

    // -----------------------------------------------------------------------
    // Transfers
    // -----------------------------------------------------------------------

    /// Sends to every destination in a single transaction.
    pub fn transfer(&mut self, req: TransferRequest) -> Result<TransferResponse, WalletRpcError> {
        let engine = self.engine()?;
        let plan = resolve_transfer(engine.network(), &req.destinations, &req.payment_id)?;
        let request = plan.into_request(&TransferOptions {
            mixin: req.mixin,
            unlock_time: req.unlock_time,
            priority: req.priority,
            subaddr_account: req.account_index,
            subaddr_indices: req.subaddr_indices,
            trusted_daemon: req.trusted_daemon,
        });

        let tx = build_single(engine, &request)?;
        let committed = commit_and_report(engine, std::slice::from_ref(&tx), req.get_tx_key)?
            .pop()
            .ok_or_else(|| WalletRpcError::Unknown("nothing was committed".into()))?;
        Ok(TransferResponse {
            tx_hash: committed.tx_hash.to_hex(),
            tx_key: committed.tx_key.map(|k| k.to_hex()),
            fee: committed.fee,
        })
    }

    /// Sends to every destination, splitting across as many transactions as
    /// needed and shrinking the size target while the engine overshoots.
    pub fn transfer_split(
        &mut self,
        req: TransferSplitRequest,
    ) -> Result<TransferListResponse, WalletRpcError> {
        let policy = self.options.retry;
        let engine = self.engine()?;
        let plan = resolve_transfer(engine.network(), &req.destinations, &req.payment_id)?;
        let request = plan.into_request(&TransferOptions {
            mixin: req.mixin,
            unlock_time: req.unlock_time,
            priority: req.priority,
            subaddr_account: req.account_index,
            subaddr_indices: req.subaddr_indices,
            trusted_daemon: req.trusted_daemon,
        });

        let committed = run_with_retry(&policy, |factor| {
            let batch = build(engine, &request, factor)?;
            commit_and_report(engine, &batch, req.get_tx_keys)
        })?;
        Ok(list_response(committed, req.get_tx_keys))
    }

    /// Sweeps every unmixable output.
    pub fn sweep_dust(
        &mut self,
        req: SweepDustRequest,
    ) -> Result<TransferListResponse, WalletRpcError> {
        let engine = self.engine()?;
        let batch = build_dust_sweep(engine, req.trusted_daemon)?;
        let committed = commit_and_report(engine, &batch, req.get_tx_keys)?;
        Ok(list_response(committed, req.get_tx_keys))
    }

    /// Sends the unlocked balance of an account to one address.
    pub fn sweep_all(
        &mut self,
        req: SweepAllRequest,
    ) -> Result<TransferListResponse, WalletRpcError> {
        let engine = self.engine()?;
        let destination = [DestinationRequest {
            address: req.address,
            amount: 0,
        }];
        let plan = resolve_transfer(engine.network(), &destination, &req.payment_id)?;
        let request = plan.into_sweep(
            &TransferOptions {
                mixin: req.mixin,
                unlock_time: req.unlock_time,
                priority: req.priority,
                subaddr_account: req.account_index,
                subaddr_indices: req.subaddr_indices,
                trusted_daemon: req.trusted_daemon,
            },
            req.below_amount,
        )?;

        let batch = build_sweep_all(engine, &request)?;
        let committed = commit_and_report(engine, &batch, req.get_tx_keys)?;
        Ok(list_response(committed, req.get_tx_keys))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn store(&mut self, _req: Empty) -> Result<Empty, WalletRpcError> {
        self.engine()?.store()?;
        Ok(Empty {})
    }

    /// Stores the wallet and asks the server to shut down.
    pub fn stop_wallet(&mut self, _req: Empty) -> Result<Empty, WalletRpcError> {
        self.engine()?.store()?;
        self.stop_requested = true;
        tracing::info!("wallet stop requested");
        Ok(Empty {})
    }

    pub fn rescan_blockchain(&mut self, _req: Empty) -> Result<Empty, WalletRpcError> {
        self.engine()?.rescan_blockchain()?;
        Ok(Empty {})
    }

    pub fn rescan_spent(&mut self, _req: Empty) -> Result<Empty, WalletRpcError> {
        self.engine()?.rescan_spent()?;
        Ok(Empty {})
    }

    // -----------------------------------------------------------------------
    // Payments & outputs
    // -----------------------------------------------------------------------

    pub fn get_payments(
        &mut self,
        req: GetPaymentsRequest,
    ) -> Result<PaymentsResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        let slot = PaymentId::parse_lookup(&req.payment_id)?;
        let payments = payments_by_id(engine, &slot)
            .into_iter()
            .map(|p| PaymentDetails {
                payment_id: req.payment_id.clone(),
                tx_hash: p.tx_hash.to_hex(),
                amount: p.amount,
                block_height: p.block_height,
                unlock_time: p.unlock_time,
                subaddr_index: p.subaddr_index,
            })
            .collect();
        Ok(PaymentsResponse { payments })
    }

    /// Payments above `min_block_height`. One malformed id fails the whole
    /// request before anything is looked up.
    pub fn get_bulk_payments(
        &mut self,
        req: GetBulkPaymentsRequest,
    ) -> Result<PaymentsResponse, WalletRpcError> {
        let engine = self.engine_ref()?;

        if req.payment_ids.is_empty() {
            let payments = payments_since(engine, None, req.min_block_height)
                .into_iter()
                .map(|p| PaymentDetails {
                    payment_id: p.payment_id.to_hex(),
                    tx_hash: p.tx_hash.to_hex(),
                    amount: p.amount,
                    block_height: p.block_height,
                    unlock_time: p.unlock_time,
                    subaddr_index: p.subaddr_index,
                })
                .collect();
            return Ok(PaymentsResponse { payments });
        }

        let slots = req
            .payment_ids
            .iter()
            .map(|id| PaymentId::parse_lookup(id))
            .collect::<Result<Vec<Hash>, _>>()?;

        let mut payments = Vec::new();
        for (id, slot) in req.payment_ids.iter().zip(&slots) {
            for p in payments_since(engine, Some(std::slice::from_ref(slot)), req.min_block_height)
            {
                payments.push(PaymentDetails {
                    payment_id: id.clone(),
                    tx_hash: p.tx_hash.to_hex(),
                    amount: p.amount,
                    block_height: p.block_height,
                    unlock_time: p.unlock_time,
                    subaddr_index: p.subaddr_index,
                });
            }
        }
        Ok(PaymentsResponse { payments })
    }

    pub fn incoming_transfers(
        &mut self,
        req: IncomingTransfersRequest,
    ) -> Result<IncomingTransfersResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        let filter: OutputFilter = req.transfer_type.parse()?;
        let scope = TransferScope {
            account_index: req.account_index,
            subaddr_indices: req.subaddr_indices,
        };
        let transfers = owned_outputs(engine, filter, &scope)
            .into_iter()
            .map(|o| IncomingTransferInfo {
                amount: o.amount,
                spent: o.spent,
                global_index: o.global_index,
                tx_hash: o.tx_hash.to_hex(),
                subaddr_index: o.subaddr_index.minor,
            })
            .collect();
        Ok(IncomingTransfersResponse { transfers })
    }

    // -----------------------------------------------------------------------
    // Integrated addresses
    // -----------------------------------------------------------------------

    pub fn make_integrated_address(
        &mut self,
        req: MakeIntegratedAddressRequest,
    ) -> Result<MakeIntegratedAddressResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        let payment_id: [u8; 8] = if req.payment_id.is_empty() {
            rand::random()
        } else {
            match PaymentId::parse(&req.payment_id) {
                Ok(PaymentId::Short(id)) => id,
                _ => return Err(WalletRpcError::WrongPaymentId("Invalid payment ID".into())),
            }
        };

        check_index(engine, req.index)?;
        let address = engine
            .address(req.index)
            .ok_or(WalletRpcError::AddressIndexOutOfBound)?;
        Ok(MakeIntegratedAddressResponse {
            integrated_address: address.encode_integrated(engine.network(), &payment_id),
            payment_id: hex::encode(payment_id),
            label: engine.label(req.index).unwrap_or_default(),
            used: is_used(engine, req.index),
        })
    }

    pub fn split_integrated_address(
        &mut self,
        req: SplitIntegratedAddressRequest,
    ) -> Result<SplitIntegratedAddressResponse, WalletRpcError> {
        let network = self.engine_ref()?.network();
        let info = parse_address(network, &req.integrated_address)
            .map_err(|_| WalletRpcError::WrongAddress("Invalid address".into()))?;
        let payment_id = info.payment_id.ok_or_else(|| {
            WalletRpcError::WrongAddress("Address is not an integrated address".into())
        })?;
        Ok(SplitIntegratedAddressResponse {
            standard_address: info.address.encode(network, info.is_subaddress),
            payment_id: hex::encode(payment_id),
            is_subaddress: info.is_subaddress,
        })
    }

    // -----------------------------------------------------------------------
    // URIs & address book
    // -----------------------------------------------------------------------

    pub fn make_uri(&mut self, req: MakeUriRequest) -> Result<MakeUriResponse, WalletRpcError> {
        let network = self.engine_ref()?.network();
        let text = uri::make_uri(network, &req).map_err(|e| {
            WalletRpcError::WrongUri(format!("Cannot make URI from supplied parameters: {e}"))
        })?;
        Ok(MakeUriResponse { uri: text })
    }

    pub fn parse_uri(&mut self, req: ParseUriRequest) -> Result<ParseUriResponse, WalletRpcError> {
        let network = self.engine_ref()?.network();
        let parsed = uri::parse_uri(network, &req.uri)
            .map_err(|e| WalletRpcError::WrongUri(format!("Error parsing URI: {e}")))?;
        Ok(ParseUriResponse {
            uri: parsed.uri,
            unknown_parameters: parsed.unknown_parameters,
        })
    }

    pub fn get_address_book(
        &mut self,
        req: GetAddressBookRequest,
    ) -> Result<GetAddressBookResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        let network = engine.network();
        let book = engine.address_book();

        let indices: Vec<u64> = if req.entries.is_empty() {
            (0..book.len() as u64).collect()
        } else {
            req.entries
        };
        let entries = indices
            .into_iter()
            .map(|index| {
                let row = usize::try_from(index)
                    .ok()
                    .and_then(|i| book.get(i))
                    .ok_or_else(|| index_out_of_range(index))?;
                Ok(AddressBookEntry {
                    index,
                    address: row.address.encode(network, row.is_subaddress),
                    payment_id: row.payment_id.to_hex(),
                    description: row.description.clone(),
                })
            })
            .collect::<Result<Vec<_>, WalletRpcError>>()?;
        Ok(GetAddressBookResponse { entries })
    }

    pub fn add_address_book(
        &mut self,
        req: AddAddressBookRequest,
    ) -> Result<AddAddressBookResponse, WalletRpcError> {
        let engine = self.engine()?;
        // Same address and payment id rules as a one-recipient transfer.
        let request = DestinationRequest {
            address: req.address,
            amount: 0,
        };
        let mut plan = resolve_transfer(engine.network(), &[request], &req.payment_id)?;
        let Some(destination) = plan.destinations.pop() else {
            return Err(WalletRpcError::Unknown("No address resolved".into()));
        };

        engine.add_address_book_row(AddressBookRow {
            address: destination.address,
            payment_id: plan.payment_id.to_slot(),
            description: req.description,
            is_subaddress: destination.is_subaddress,
        });
        let index = engine.address_book().len().saturating_sub(1) as u64;
        tracing::debug!(index, "address book entry added");
        Ok(AddAddressBookResponse { index })
    }

    pub fn delete_address_book(
        &mut self,
        req: DeleteAddressBookRequest,
    ) -> Result<Empty, WalletRpcError> {
        let engine = self.engine()?;
        let deleted = usize::try_from(req.index)
            .map(|i| engine.delete_address_book_row(i))
            .unwrap_or(false);
        if !deleted {
            return Err(index_out_of_range(req.index));
        }
        Ok(Empty {})
    }

    // -----------------------------------------------------------------------
    // Notes & history
    // -----------------------------------------------------------------------

    pub fn set_tx_notes(&mut self, req: SetTxNotesRequest) -> Result<Empty, WalletRpcError> {
        let engine = self.engine()?;
        if req.txids.len() != req.notes.len() {
            return Err(WalletRpcError::Unknown(
                "Different amount of txids and notes".into(),
            ));
        }
        let txids = parse_txids(&req.txids)?;
        for (txid, note) in txids.into_iter().zip(req.notes) {
            engine.set_tx_note(txid, note);
        }
        Ok(Empty {})
    }

    pub fn get_tx_notes(
        &mut self,
        req: GetTxNotesRequest,
    ) -> Result<GetTxNotesResponse, WalletRpcError> {
        let engine = self.engine_ref()?;
        let notes = parse_txids(&req.txids)?
            .iter()
            .map(|txid| engine.tx_note(txid))
            .collect();
        Ok(GetTxNotesResponse { notes })
    }

    pub fn get_transfers(
        &mut self,
        req: GetTransfersRequest,
    ) -> Result<TransferHistory, WalletRpcError> {
        let engine = self.engine()?;
        let heights = if req.filter_by_height {
            HeightRange {
                min: req.min_height,
                max: req.max_height,
            }
        } else {
            HeightRange::default()
        };
        let query = TransfersQuery {
            incoming: req.incoming,
            outgoing: req.outgoing,
            pending: req.pending,
            failed: req.failed,
            pool: req.pool,
            heights,
            scope: TransferScope {
                account_index: req.account_index,
                subaddr_indices: req.subaddr_indices,
            },
        };
        Ok(collect_transfers(engine, &query)?)
    }

    pub fn get_transfer_by_txid(
        &mut self,
        req: GetTransferByTxidRequest,
    ) -> Result<GetTransferByTxidResponse, WalletRpcError> {
        let engine = self.engine()?;
        let txid: Hash = req.txid.parse()?;
        let transfer = find_transfer(engine, &txid)?
            .ok_or_else(|| WalletRpcError::WrongTxid("Transaction not found.".into()))?;
        Ok(GetTransferByTxidResponse { transfer })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_account<E: WalletEngine>(engine: &E, account: u32) -> Result<(), WalletRpcError> {
    if account >= engine.num_accounts() {
        return Err(WalletRpcError::AccountIndexOutOfBound);
    }
    Ok(())
}

fn check_index<E: WalletEngine>(engine: &E, index: SubaddressIndex) -> Result<(), WalletRpcError> {
    check_account(engine, index.major)?;
    if index.minor >= engine.num_subaddresses(index.major) {
        return Err(WalletRpcError::AddressIndexOutOfBound);
    }
    Ok(())
}

fn encode_subaddress<E: WalletEngine>(
    engine: &E,
    index: SubaddressIndex,
) -> Result<String, WalletRpcError> {
    let address = engine
        .address(index)
        .ok_or(WalletRpcError::AddressIndexOutOfBound)?;
    Ok(address.encode(engine.network(), index.minor != 0))
}

/// Whether the wallet ever received an output at `index`.
fn is_used<E: WalletEngine>(engine: &E, index: SubaddressIndex) -> bool {
    engine
        .owned_outputs()
        .iter()
        .any(|o| o.subaddr_index == index)
}

fn parse_txids(txids: &[String]) -> Result<Vec<Hash>, WalletRpcError> {
    txids
        .iter()
        .map(|s| {
            s.parse::<Hash>()
                .map_err(|_| WalletRpcError::WrongTxid("TX ID has invalid format".into()))
        })
        .collect()
}

fn index_out_of_range(index: u64) -> WalletRpcError {
    WalletRpcError::WrongIndex(format!("Index out of range: {index}"))
}

fn list_response(committed: Vec<CommittedTransfer>, include_keys: bool) -> TransferListResponse {
    let mut response = TransferListResponse {
        tx_key_list: include_keys.then(Vec::new),
        ..TransferListResponse::default()
    };
    for tx in committed {
        response.tx_hash_list.push(tx.tx_hash.to_hex());
        if let (Some(keys), Some(key)) = (response.tx_key_list.as_mut(), tx.tx_key) {
            keys.push(key.to_hex());
        }
        response.amount_list.push(tx.amount);
        response.fee_list.push(tx.fee);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::config::RetryPolicy;
    use crate::engine::{ConstructionLimits, MemoryWallet};

    const SHORT_ID: &str = "deadbeef00000001";

    fn rpc() -> WalletRpc<MemoryWallet> {
        WalletRpc::new(MemoryWallet::dev(Network::Testnet), RpcOptions::default())
    }

    fn own_address(rpc: &WalletRpc<MemoryWallet>) -> String {
        rpc.wallet()
            .unwrap()
            .address(SubaddressIndex::new(0, 0))
            .unwrap()
            .encode(Network::Testnet, false)
    }

    fn destinations(address: &str, count: usize, amount: u64) -> Vec<DestinationRequest> {
        (0..count)
            .map(|_| DestinationRequest {
                address: address.to_string(),
                amount,
            })
            .collect()
    }

    fn pending_only() -> GetTransfersRequest {
        GetTransfersRequest {
            pending: true,
            ..Default::default()
        }
    }

    // -- 1. Accounts ---------------------------------------------------------

    #[test]
    fn balance_sums_every_subaddress() {
        let mut rpc = rpc();
        let balance = rpc.get_balance(GetBalanceRequest::default()).unwrap();
        assert_eq!(balance.balance, 12 * 25_000_000_000 + 400_000);
        assert_eq!(balance.per_subaddress.len(), 3);
        assert_eq!(balance.per_subaddress[1].label, "Savings");
    }

    #[test]
    fn out_of_range_indices() {
        let mut rpc = rpc();
        let err = rpc
            .get_balance(GetBalanceRequest { account_index: 5 })
            .unwrap_err();
        assert_eq!(err, WalletRpcError::AccountIndexOutOfBound);

        let err = rpc
            .label_address(LabelAddressRequest {
                index: SubaddressIndex::new(0, 9),
                label: "x".into(),
            })
            .unwrap_err();
        assert_eq!(err.code(), -15);
    }

    #[test]
    fn new_accounts_and_addresses_are_listed() {
        let mut rpc = rpc();
        let account = rpc
            .create_account(CreateAccountRequest {
                label: "cold".into(),
            })
            .unwrap();
        assert_eq!(account.account_index, 1);

        let created = rpc
            .create_address(CreateAddressRequest {
                account_index: 1,
                label: "shop".into(),
            })
            .unwrap();
        assert_eq!(created.address_index, 1);

        let listed = rpc.get_address(GetAddressRequest { account_index: 1 }).unwrap();
        assert_eq!(listed.address, account.address);
        assert_eq!(listed.addresses[1].address, created.address);
        assert!(!listed.addresses[1].used);

        let accounts = rpc.get_accounts(Empty {}).unwrap();
        assert_eq!(accounts.subaddress_accounts.len(), 2);
        assert_eq!(accounts.subaddress_accounts[1].label, "cold");
        assert_eq!(accounts.subaddress_accounts[1].balance, 0);
    }

    // -- 2. Transfers --------------------------------------------------------

    #[test]
    fn transfer_shows_up_as_pending() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        let sent = rpc
            .transfer(TransferRequest {
                destinations: destinations(&address, 1, 1_000_000_000),
                get_tx_key: true,
                ..Default::default()
            })
            .unwrap();
        assert!(sent.fee > 0);
        assert!(sent.tx_key.is_some());

        let history = rpc.get_transfers(pending_only()).unwrap();
        assert_eq!(history.pending.len(), 1);
        let entry = &history.pending[0];
        assert_eq!(entry.txid, sent.tx_hash);
        assert_eq!(entry.amount, 1_000_000_000);
        assert_eq!(entry.fee, sent.fee);
    }

    #[test]
    fn oversized_transfer_points_to_split() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        let err = rpc
            .transfer(TransferRequest {
                destinations: destinations(&address, 300, 1_000_000),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -4);
        assert_eq!(err.to_string(), crate::transfer::TRANSFER_TOO_LARGE_MESSAGE);
        assert_eq!(rpc.wallet().unwrap().commit_count(), 0);
    }

    #[test]
    fn transfer_built_as_two_transactions_is_refused_uncommitted() {
        let mut wallet = MemoryWallet::dev(Network::Testnet);
        wallet.set_limits(ConstructionLimits {
            recipients_per_tx: Some(1),
            ..ConstructionLimits::default()
        });
        let mut rpc = WalletRpc::new(wallet, RpcOptions::default());
        let address = own_address(&rpc);

        let err = rpc
            .transfer(TransferRequest {
                destinations: destinations(&address, 2, 1_000_000_000),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -4);
        assert_eq!(err.to_string(), crate::transfer::TRANSFER_TOO_LARGE_MESSAGE);
        assert_eq!(rpc.wallet().unwrap().commit_count(), 0);
        assert!(rpc.wallet().unwrap().unconfirmed_outgoing().is_empty());
    }

    #[test]
    fn split_transfer_retries_with_a_smaller_target() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        let sent = rpc
            .transfer_split(TransferSplitRequest {
                destinations: destinations(&address, 300, 1_000_000),
                get_tx_keys: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(sent.tx_hash_list.len(), 2);
        assert_eq!(sent.tx_key_list.as_ref().map(Vec::len), Some(2));
        assert_eq!(sent.amount_list.iter().sum::<u64>(), 300 * 1_000_000);
        assert_eq!(rpc.wallet().unwrap().commit_count(), 2);
    }

    #[test]
    fn split_transfer_gives_up_when_the_policy_is_spent() {
        let mut rpc = WalletRpc::new(
            MemoryWallet::dev(Network::Testnet),
            RpcOptions {
                restricted: false,
                retry: RetryPolicy {
                    max_attempts: 1,
                    min_factor: 10,
                },
            },
        );
        let address = own_address(&rpc);
        let err = rpc
            .transfer_split(TransferSplitRequest {
                destinations: destinations(&address, 300, 1_000_000),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -16);
        assert_eq!(rpc.wallet().unwrap().commit_count(), 0);
    }

    #[test]
    fn bad_destination_address() {
        let mut rpc = rpc();
        let err = rpc
            .transfer(TransferRequest {
                destinations: destinations("not-an-address", 1, 1),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -2);
    }

    #[test]
    fn busy_daemon_is_reported_as_such() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        rpc.wallet_mut().unwrap().set_daemon_busy(true);
        let err = rpc
            .transfer(TransferRequest {
                destinations: destinations(&address, 1, 1_000),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn sweep_dust_collects_the_dust_output() {
        let mut rpc = rpc();
        let swept = rpc.sweep_dust(SweepDustRequest::default()).unwrap();
        assert_eq!(swept.tx_hash_list.len(), 1);
        assert!(swept.tx_key_list.is_none());
        assert_eq!(swept.amount_list[0] + swept.fee_list[0], 400_000);
    }

    #[test]
    fn sweep_all_below_an_amount() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        let swept = rpc
            .sweep_all(SweepAllRequest {
                address,
                subaddr_indices: [2].into_iter().collect(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(swept.tx_hash_list.len(), 1);
        assert_eq!(swept.amount_list[0] + swept.fee_list[0], 4 * 25_000_000_000);
    }

    // -- 3. Payments ---------------------------------------------------------

    #[test]
    fn payments_by_short_id() {
        let mut rpc = rpc();
        let found = rpc
            .get_payments(GetPaymentsRequest {
                payment_id: SHORT_ID.into(),
            })
            .unwrap();
        assert_eq!(found.payments.len(), 3);
        assert!(found.payments.iter().all(|p| p.payment_id == SHORT_ID));
    }

    #[test]
    fn bulk_payments_exclude_the_min_height() {
        let mut rpc = rpc();
        let found = rpc
            .get_bulk_payments(GetBulkPaymentsRequest {
                payment_ids: vec![SHORT_ID.into()],
                min_block_height: 10,
            })
            .unwrap();
        let heights: Vec<u64> = found.payments.iter().map(|p| p.block_height).collect();
        assert_eq!(heights, vec![30, 50]);
    }

    #[test]
    fn bulk_payments_fail_on_any_malformed_id() {
        let mut rpc = rpc();
        let err = rpc
            .get_bulk_payments(GetBulkPaymentsRequest {
                payment_ids: vec![SHORT_ID.into(), "zz".into()],
                min_block_height: 0,
            })
            .unwrap_err();
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn incoming_transfers_filter() {
        let mut rpc = rpc();
        let all = rpc
            .incoming_transfers(IncomingTransfersRequest {
                transfer_type: "available".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(all.transfers.len(), 13);

        let err = rpc
            .incoming_transfers(IncomingTransfersRequest {
                transfer_type: "bogus".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -6);
    }

    // -- 4. Integrated addresses --------------------------------------------

    #[test]
    fn integrated_address_round_trip() {
        let mut rpc = rpc();
        let made = rpc
            .make_integrated_address(MakeIntegratedAddressRequest {
                payment_id: "0123456789abcdef".into(),
                index: SubaddressIndex::new(0, 0),
            })
            .unwrap();
        let split = rpc
            .split_integrated_address(SplitIntegratedAddressRequest {
                integrated_address: made.integrated_address,
            })
            .unwrap();
        assert_eq!(split.standard_address, own_address(&rpc));
        assert_eq!(split.payment_id, "0123456789abcdef");
        assert!(!split.is_subaddress);
    }

    #[test]
    fn integrated_address_generates_an_id() {
        let mut rpc = rpc();
        let made = rpc
            .make_integrated_address(MakeIntegratedAddressRequest::default())
            .unwrap();
        assert_eq!(made.payment_id.len(), 16);
        assert!(made.used);
    }

    #[test]
    fn integrated_address_rejects_long_ids() {
        let mut rpc = rpc();
        let err = rpc
            .make_integrated_address(MakeIntegratedAddressRequest {
                payment_id: "ab".repeat(32),
                index: SubaddressIndex::new(0, 0),
            })
            .unwrap_err();
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn splitting_a_standard_address_fails() {
        let mut rpc = rpc();
        let err = rpc
            .split_integrated_address(SplitIntegratedAddressRequest {
                integrated_address: own_address(&rpc),
            })
            .unwrap_err();
        assert_eq!(
            err,
            WalletRpcError::WrongAddress("Address is not an integrated address".into())
        );
    }

    // -- 5. Notes & history --------------------------------------------------

    #[test]
    fn notes_round_trip() {
        let mut rpc = rpc();
        let txid = "11".repeat(32);
        rpc.set_tx_notes(SetTxNotesRequest {
            txids: vec![txid.clone()],
            notes: vec!["rent".into()],
        })
        .unwrap();
        let notes = rpc
            .get_tx_notes(GetTxNotesRequest {
                txids: vec![txid, "22".repeat(32)],
            })
            .unwrap();
        assert_eq!(notes.notes, vec!["rent".to_string(), String::new()]);
    }

    #[test]
    fn notes_need_one_per_txid() {
        let mut rpc = rpc();
        let err = rpc
            .set_tx_notes(SetTxNotesRequest {
                txids: vec!["11".repeat(32)],
                notes: vec![],
            })
            .unwrap_err();
        assert_eq!(err.code(), -1);
        assert_eq!(err.to_string(), "Different amount of txids and notes");
    }

    #[test]
    fn transfer_by_txid() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        let sent = rpc
            .transfer(TransferRequest {
                destinations: destinations(&address, 1, 5_000_000),
                ..Default::default()
            })
            .unwrap();
        let found = rpc
            .get_transfer_by_txid(GetTransferByTxidRequest {
                txid: sent.tx_hash.clone(),
            })
            .unwrap();
        assert_eq!(found.transfer.txid, sent.tx_hash);

        let err = rpc
            .get_transfer_by_txid(GetTransferByTxidRequest {
                txid: "33".repeat(32),
            })
            .unwrap_err();
        assert_eq!(err, WalletRpcError::WrongTxid("Transaction not found.".into()));

        let err = rpc
            .get_transfer_by_txid(GetTransferByTxidRequest { txid: "xyz".into() })
            .unwrap_err();
        assert_eq!(err.code(), -8);
    }

    #[test]
    fn height_filter_is_ignored_unless_enabled() {
        let mut rpc = rpc();
        let request = GetTransfersRequest {
            incoming: true,
            min_height: 1_000,
            max_height: 2_000,
            ..Default::default()
        };
        assert_eq!(rpc.get_transfers(request.clone()).unwrap().incoming.len(), 13);

        let filtered = rpc
            .get_transfers(GetTransfersRequest {
                filter_by_height: true,
                ..request
            })
            .unwrap();
        assert!(filtered.incoming.is_empty());
    }

    #[test]
    fn stop_wallet_sets_the_flag() {
        let mut rpc = rpc();
        assert!(!rpc.stop_requested());
        rpc.stop_wallet(Empty {}).unwrap();
        assert!(rpc.stop_requested());
    }

    // -- 6. URIs & address book ----------------------------------------------

    fn subaddress(rpc: &WalletRpc<MemoryWallet>, minor: u32) -> String {
        rpc.wallet()
            .unwrap()
            .address(SubaddressIndex::new(0, minor))
            .unwrap()
            .encode(Network::Testnet, minor != 0)
    }

    #[test]
    fn uri_made_by_the_wallet_parses_back() {
        let mut rpc = rpc();
        let address = own_address(&rpc);
        let made = rpc
            .make_uri(MakeUriRequest {
                address: address.clone(),
                payment_id: SHORT_ID.into(),
                amount: 3_000_000_000,
                tx_description: "invoice 42".into(),
                ..Default::default()
            })
            .unwrap();
        assert!(made.uri.starts_with(&format!("solace:{address}?")));

        let parsed = rpc
            .parse_uri(ParseUriRequest {
                uri: format!("{}&utm_source=mail", made.uri),
            })
            .unwrap();
        assert_eq!(parsed.uri.address, address);
        assert_eq!(parsed.uri.payment_id, SHORT_ID);
        assert_eq!(parsed.uri.amount, 3_000_000_000);
        assert_eq!(parsed.uri.tx_description, "invoice 42");
        assert_eq!(parsed.unknown_parameters, vec!["utm_source=mail"]);
    }

    #[test]
    fn bad_uris_are_wrong_uri() {
        let mut rpc = rpc();
        let err = rpc
            .parse_uri(ParseUriRequest {
                uri: format!("monero:{}", own_address(&rpc)),
            })
            .unwrap_err();
        assert_eq!(err.code(), -11);
        assert!(err.to_string().starts_with("Error parsing URI: "));

        let err = rpc
            .make_uri(MakeUriRequest {
                address: "not-an-address".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -11);
        assert!(err
            .to_string()
            .starts_with("Cannot make URI from supplied parameters: "));
    }

    #[test]
    fn address_book_add_list_delete() {
        let mut rpc = rpc();
        let savings = subaddress(&rpc, 1);
        let own = own_address(&rpc);

        let first = rpc
            .add_address_book(AddAddressBookRequest {
                address: savings.clone(),
                description: "savings".into(),
                ..Default::default()
            })
            .unwrap();
        let second = rpc
            .add_address_book(AddAddressBookRequest {
                address: own.clone(),
                payment_id: SHORT_ID.into(),
                description: "main".into(),
            })
            .unwrap();
        assert_eq!((first.index, second.index), (0, 1));

        let book = rpc
            .get_address_book(GetAddressBookRequest::default())
            .unwrap();
        assert_eq!(book.entries.len(), 2);
        assert_eq!(book.entries[0].address, savings);
        assert_eq!(book.entries[0].payment_id, "00".repeat(32));
        assert_eq!(book.entries[1].payment_id, format!("{SHORT_ID}{}", "00".repeat(24)));

        rpc.delete_address_book(DeleteAddressBookRequest { index: 0 })
            .unwrap();
        let book = rpc
            .get_address_book(GetAddressBookRequest { entries: vec![0] })
            .unwrap();
        assert_eq!(book.entries[0].index, 0);
        assert_eq!(book.entries[0].address, own);
        assert_eq!(book.entries[0].description, "main");
    }

    #[test]
    fn integrated_address_keeps_its_payment_id_in_the_book() {
        let mut rpc = rpc();
        let integrated = rpc
            .make_integrated_address(MakeIntegratedAddressRequest {
                payment_id: SHORT_ID.into(),
                ..Default::default()
            })
            .unwrap()
            .integrated_address;
        rpc.add_address_book(AddAddressBookRequest {
            address: integrated.clone(),
            ..Default::default()
        })
        .unwrap();
        let book = rpc
            .get_address_book(GetAddressBookRequest::default())
            .unwrap();
        assert_eq!(book.entries[0].address, own_address(&rpc));
        assert!(book.entries[0].payment_id.starts_with(SHORT_ID));

        let err = rpc
            .add_address_book(AddAddressBookRequest {
                address: integrated,
                payment_id: SHORT_ID.into(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -5);
        assert_eq!(err.to_string(), crate::transfer::SINGLE_PAYMENT_ID_MESSAGE);
    }

    #[test]
    fn address_book_rejects_bad_addresses() {
        let mut rpc = rpc();
        let err = rpc
            .add_address_book(AddAddressBookRequest {
                address: "garbage".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), -2);
        assert!(rpc
            .get_address_book(GetAddressBookRequest::default())
            .unwrap()
            .entries
            .is_empty());
    }

    #[test]
    fn address_book_indices_out_of_range_are_wrong_index() {
        let mut rpc = rpc();
        rpc.add_address_book(AddAddressBookRequest {
            address: own_address(&rpc),
            ..Default::default()
        })
        .unwrap();

        let err = rpc
            .get_address_book(GetAddressBookRequest { entries: vec![0, 3] })
            .unwrap_err();
        assert_eq!(err.code(), -12);
        assert_eq!(err.to_string(), "Index out of range: 3");

        let err = rpc
            .delete_address_book(DeleteAddressBookRequest { index: 1 })
            .unwrap_err();
        assert_eq!(err.code(), -12);
        assert_eq!(err.to_string(), "Index out of range: 1");
        assert_eq!(
            rpc.get_address_book(GetAddressBookRequest::default())
                .unwrap()
                .entries
                .len(),
            1
        );
    }
}
