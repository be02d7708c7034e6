//! # In-Memory Engine
//!
//! A deterministic [`WalletEngine`] that keeps its whole ledger in memory
//! and can snapshot itself to a JSON file. Keys are derived from a seed with
//! BLAKE3 and curve25519 so the addresses it hands out are well-formed, but
//! nothing is signed and nothing leaves the process: "broadcast" records the
//! transaction as pending and the next [`refresh`](WalletEngine::refresh)
//! mines it.
//!
//! Transaction sizes follow a simple linear model ([`ConstructionLimits`]).
//! Outputs are planned against the size target without ring overhead and the
//! finished transaction is measured with it, so an aggressive target yields
//! a transaction over the limit. That is exactly the situation the split
//! transfer retry loop exists for.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use super::{
    AddressBookRow, ConfirmedTransfer, ConstructionRequest, EngineError, OwnedOutput, PaymentRecord,
    PendingTransaction, SubaddressBalance, SubaddressIndex, SweepRequest, TxDestination,
    UnconfirmedState, UnconfirmedTransfer, WalletEngine, CHANGE_UNKNOWN,
};
use crate::address::{AccountAddress, Network, PublicKey};
use crate::config::DUST_THRESHOLD;
use crate::crypto::{blake3_hash, sha256_array, Hash};
use crate::transfer::payment_id::TxExtra;

/// Blocks an output must age before it can be spent.
const SPENDABLE_AGE: u64 = 10;

/// Seconds between blocks, used for synthetic timestamps.
const BLOCK_TARGET_SECONDS: u64 = 240;

/// Timestamp of height zero for synthetic timestamps.
const GENESIS_TIMESTAMP: u64 = 1_500_000_000;

/// Extra bytes added by the transaction public key field.
const TX_PUBKEY_FIELD_SIZE: u64 = 33;

// ---------------------------------------------------------------------------
// Size model
// ---------------------------------------------------------------------------

/// Linear transaction size and fee model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionLimits {
    /// Network limit on serialized transaction size.
    pub tx_size_limit: u64,
    pub base_size: u64,
    /// Per input, excluding ring members.
    pub input_size: u64,
    /// Per ring member of every input.
    pub ring_member_size: u64,
    pub output_size: u64,
    pub fee_per_byte: u64,
    /// Most recipients the engine puts in one transaction, whatever the
    /// size target. `None` leaves it to the size model.
    #[serde(default)]
    pub recipients_per_tx: Option<usize>,
}

impl Default for ConstructionLimits {
    fn default() -> Self {
        Self {
            tx_size_limit: 10_000,
            base_size: 100,
            input_size: 40,
            ring_member_size: 32,
            output_size: 40,
            fee_per_byte: 10,
            recipients_per_tx: None,
        }
    }
}

impl ConstructionLimits {
    /// Largest recipient count whose planned size fits `target`. Planning
    /// assumes one input and reserves one output for change.
    fn max_recipients(&self, target: u64) -> usize {
        let fixed = self.base_size + self.input_size;
        let per_output = self.output_size.max(1);
        let outputs = target.saturating_sub(fixed) / per_output;
        let planned = outputs.saturating_sub(1).max(1) as usize;
        match self.recipients_per_tx {
            Some(cap) => planned.min(cap.max(1)),
            None => planned,
        }
    }

    /// Largest input count for a sweep transaction with one output.
    fn max_sweep_inputs(&self, mixin: u64, extra_len: u64) -> usize {
        let fixed = self.base_size + self.output_size + extra_len;
        let per_input = self.per_input(mixin).max(1);
        (self.tx_size_limit.saturating_sub(fixed) / per_input).max(1) as usize
    }

    fn per_input(&self, mixin: u64) -> u64 {
        self.input_size
            .saturating_add(mixin.saturating_add(1).saturating_mul(self.ring_member_size))
    }

    fn actual_size(&self, inputs: usize, outputs: usize, mixin: u64, extra_len: u64) -> u64 {
        self.base_size
            .saturating_add((inputs as u64).saturating_mul(self.per_input(mixin)))
            .saturating_add((outputs as u64).saturating_mul(self.output_size))
            .saturating_add(extra_len)
    }

    fn fee(&self, size: u64, priority: u32) -> u64 {
        let multiplier = match priority {
            0 | 1 => 1,
            2 => 4,
            3 => 20,
            _ => 166,
        };
        size.saturating_mul(self.fee_per_byte).saturating_mul(multiplier)
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemorySubaddress {
    address: AccountAddress,
    label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryAccount {
    subaddresses: Vec<MemorySubaddress>,
}

/// The in-memory engine. See the module docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryWallet {
    network: Network,
    seed: Hash,
    height: u64,
    accounts: Vec<MemoryAccount>,
    outputs: Vec<OwnedOutput>,
    incoming: Vec<PaymentRecord>,
    outgoing: Vec<ConfirmedTransfer>,
    unconfirmed: Vec<UnconfirmedTransfer>,
    /// What the daemon's pool currently holds for this wallet.
    #[serde(default)]
    pool_feed: Vec<PaymentRecord>,
    notes: BTreeMap<Hash, String>,
    #[serde(default)]
    address_book: Vec<AddressBookRow>,
    #[serde(default)]
    limits: ConstructionLimits,
    counter: u64,
    next_global_index: u64,

    /// The wallet's view of the pool, as of the last pool update.
    #[serde(skip)]
    pool: Vec<PaymentRecord>,
    #[serde(skip)]
    daemon_busy: bool,
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(skip)]
    pool_updates: u64,
    #[serde(skip)]
    commits: u64,
}

impl MemoryWallet {
    /// Creates an empty wallet with one account, keys derived from `seed`.
    pub fn generate(network: Network, seed: &[u8]) -> Self {
        let mut wallet = Self {
            network,
            seed: Hash(blake3_hash(seed)),
            height: 1,
            accounts: Vec::new(),
            outputs: Vec::new(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
            unconfirmed: Vec::new(),
            pool_feed: Vec::new(),
            notes: BTreeMap::new(),
            address_book: Vec::new(),
            limits: ConstructionLimits::default(),
            counter: 0,
            next_global_index: 0,
            pool: Vec::new(),
            daemon_busy: false,
            path: None,
            pool_updates: 0,
            commits: 0,
        };
        wallet.add_account("Primary account".into());
        wallet
    }

    /// A populated wallet for local development: three subaddresses, a
    /// spread of unlocked outputs, one dust output and a payment waiting in
    /// the pool.
    pub fn dev(network: Network) -> Self {
        let mut wallet = Self::generate(network, b"solace-dev-wallet");
        wallet.add_subaddress(0, "Savings".into());
        wallet.add_subaddress(0, "Donations".into());
        wallet.height = 200;

        let short_id = {
            let mut slot = [0u8; 32];
            slot[..8].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x01]);
            Hash(slot)
        };
        for i in 0..12u64 {
            let minor = (i % 3) as u32;
            let pid = if i % 4 == 0 { short_id } else { Hash::ZERO };
            wallet.credit(SubaddressIndex::new(0, minor), 25_000_000_000, pid, 10 + i * 5);
        }
        wallet.credit(SubaddressIndex::new(0, 0), 400_000, Hash::ZERO, 120);
        wallet.feed_pool(SubaddressIndex::new(0, 1), 7_500_000_000, Hash::ZERO);
        wallet
    }

    /// Loads a snapshot written by [`WalletEngine::store`].
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let bytes = std::fs::read(path)
            .map_err(|e| EngineError::Storage(format!("{}: {}", path.display(), e)))?;
        let mut wallet: Self = serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::Storage(format!("{}: {}", path.display(), e)))?;
        wallet.path = Some(path.to_path_buf());
        Ok(wallet)
    }

    /// Sets the file [`WalletEngine::store`] writes to.
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn limits(&self) -> ConstructionLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ConstructionLimits) {
        self.limits = limits;
    }

    /// Simulates a daemon that refuses requests.
    pub fn set_daemon_busy(&mut self, busy: bool) {
        self.daemon_busy = busy;
    }

    /// Number of pool updates performed since load.
    pub fn pool_update_count(&self) -> u64 {
        self.pool_updates
    }

    /// Number of transactions committed since load.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Receives `amount` at `index` in a block at `block_height`.
    pub fn credit(
        &mut self,
        index: SubaddressIndex,
        amount: u64,
        payment_id: Hash,
        block_height: u64,
    ) -> Hash {
        let tx_hash = self.next_hash(b"incoming");
        self.receive(tx_hash, index, amount, payment_id, block_height);
        tx_hash
    }

    /// Puts a payment to `index` into the daemon's pool.
    pub fn feed_pool(&mut self, index: SubaddressIndex, amount: u64, payment_id: Hash) -> Hash {
        let tx_hash = self.next_hash(b"pool");
        self.pool_feed.push(PaymentRecord {
            tx_hash,
            payment_id,
            amount,
            block_height: 0,
            unlock_time: 0,
            timestamp: now(),
            subaddr_index: index,
        });
        tx_hash
    }

    /// Records a confirmed outgoing transfer directly.
    pub fn push_outgoing(&mut self, transfer: ConfirmedTransfer) {
        self.outgoing.push(transfer);
    }

    /// Records an unconfirmed outgoing transfer directly.
    pub fn push_unconfirmed(&mut self, transfer: UnconfirmedTransfer) {
        self.unconfirmed.push(transfer);
    }

    /// Advances the chain without touching the ledger.
    pub fn set_height(&mut self, height: u64) {
        self.height = height;
    }

    fn receive(
        &mut self,
        tx_hash: Hash,
        index: SubaddressIndex,
        amount: u64,
        payment_id: Hash,
        block_height: u64,
    ) {
        let global_index = self.next_global_index;
        self.next_global_index += 1;
        self.outputs.push(OwnedOutput {
            tx_hash,
            global_index,
            amount,
            block_height,
            spent: false,
            subaddr_index: index,
        });
        self.incoming.push(PaymentRecord {
            tx_hash,
            payment_id,
            amount,
            block_height,
            unlock_time: 0,
            timestamp: synthetic_timestamp(block_height),
            subaddr_index: index,
        });
    }

    fn next_hash(&mut self, domain: &[u8]) -> Hash {
        self.counter += 1;
        let mut data = Vec::with_capacity(32 + domain.len() + 8);
        data.extend_from_slice(self.seed.as_bytes());
        data.extend_from_slice(domain);
        data.extend_from_slice(&self.counter.to_le_bytes());
        Hash(blake3_hash(&data))
    }

    fn derive_address(&self, index: SubaddressIndex) -> AccountAddress {
        AccountAddress {
            spend_public_key: self.derive_key(b"spend", index),
            view_public_key: self.derive_key(b"view", index),
        }
    }

    fn derive_key(&self, domain: &[u8], index: SubaddressIndex) -> PublicKey {
        let mut data = Vec::with_capacity(32 + domain.len() + 8);
        data.extend_from_slice(self.seed.as_bytes());
        data.extend_from_slice(domain);
        data.extend_from_slice(&index.major.to_le_bytes());
        data.extend_from_slice(&index.minor.to_le_bytes());
        public_from_secret(blake3_hash(&data))
    }

    fn is_unlocked(&self, output: &OwnedOutput) -> bool {
        output.block_height.saturating_add(SPENDABLE_AGE) <= self.height
    }

    fn ensure_daemon(&self) -> Result<(), EngineError> {
        if self.daemon_busy {
            Err(EngineError::DaemonBusy)
        } else {
            Ok(())
        }
    }

    /// Indices into `outputs` that are unspent, unlocked, in scope and
    /// accepted by `keep`, largest first.
    fn spendable<F>(&self, account: u32, subaddr_indices: &BTreeSet<u32>, keep: F) -> Vec<usize>
    where
        F: Fn(&OwnedOutput) -> bool,
    {
        let mut picked: Vec<usize> = self
            .outputs
            .iter()
            .enumerate()
            .filter(|(_, o)| {
                !o.spent
                    && self.is_unlocked(o)
                    && o.subaddr_index.major == account
                    && (subaddr_indices.is_empty()
                        || subaddr_indices.contains(&o.subaddr_index.minor))
                    && keep(o)
            })
            .map(|(i, _)| i)
            .collect();
        picked.sort_by(|a, b| {
            self.outputs[*b]
                .amount
                .cmp(&self.outputs[*a].amount)
                .then(self.outputs[*a].global_index.cmp(&self.outputs[*b].global_index))
        });
        picked
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &mut self,
        inputs: &[usize],
        destinations: Vec<TxDestination>,
        fee: u64,
        size: u64,
        extra: &TxExtra,
        subaddr_account: u32,
        subaddr_indices: &BTreeSet<u32>,
    ) -> PendingTransaction {
        let amount_in = inputs
            .iter()
            .fold(0u64, |acc, &i| acc.saturating_add(self.outputs[i].amount));
        let sent = destinations
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.amount));
        let tx_hash = self.next_hash(b"tx");
        let tx_key = Hash(sha256_array(self.next_hash(b"tx-key").as_bytes()));

        let mut extra = extra.clone();
        extra.add_tx_pubkey(&public_from_secret(tx_key.0).0);

        PendingTransaction {
            tx_hash,
            tx_key,
            fee,
            size,
            destinations,
            change: amount_in.saturating_sub(sent).saturating_sub(fee),
            amount_in,
            spent_outputs: inputs.iter().map(|&i| self.outputs[i].global_index).collect(),
            extra,
            subaddr_account,
            subaddr_indices: subaddr_indices.clone(),
        }
    }
}

impl WalletEngine for MemoryWallet {
    fn network(&self) -> Network {
        self.network
    }

    fn height(&self) -> u64 {
        self.height
    }

    fn refresh(&mut self) -> Result<(), EngineError> {
        self.ensure_daemon()?;
        self.height += 1;
        let height = self.height;

        let (mined, failed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.unconfirmed)
            .into_iter()
            .partition(|u| u.state == UnconfirmedState::Pending);
        self.unconfirmed = failed;

        for tx in mined {
            if tx.change != 0 && tx.change != CHANGE_UNKNOWN {
                let global_index = self.next_global_index;
                self.next_global_index += 1;
                self.outputs.push(OwnedOutput {
                    tx_hash: tx.tx_hash,
                    global_index,
                    amount: tx.change,
                    block_height: height,
                    spent: false,
                    subaddr_index: SubaddressIndex::new(tx.subaddr_account, 0),
                });
            }
            self.outgoing.push(ConfirmedTransfer {
                tx_hash: tx.tx_hash,
                payment_id: tx.payment_id,
                amount_in: tx.amount_in,
                amount_out: tx.amount_out,
                change: tx.change,
                block_height: height,
                unlock_time: tx.unlock_time,
                timestamp: synthetic_timestamp(height),
                destinations: tx.destinations,
                subaddr_account: tx.subaddr_account,
                subaddr_indices: tx.subaddr_indices,
            });
        }

        for payment in std::mem::take(&mut self.pool_feed) {
            self.receive(
                payment.tx_hash,
                payment.subaddr_index,
                payment.amount,
                payment.payment_id,
                height,
            );
        }
        self.pool.clear();

        tracing::debug!(height, "memory wallet refreshed");
        Ok(())
    }

    fn store(&mut self) -> Result<(), EngineError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| EngineError::Storage(e.to_string()))?;
        std::fs::write(path, bytes)
            .map_err(|e| EngineError::Storage(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "memory wallet stored");
        Ok(())
    }

    fn rescan_blockchain(&mut self) -> Result<(), EngineError> {
        self.ensure_daemon()?;
        self.pool.clear();
        Ok(())
    }

    fn rescan_spent(&mut self) -> Result<(), EngineError> {
        self.ensure_daemon()
    }

    fn num_accounts(&self) -> u32 {
        self.accounts.len() as u32
    }

    fn num_subaddresses(&self, account: u32) -> u32 {
        self.accounts
            .get(account as usize)
            .map_or(0, |a| a.subaddresses.len() as u32)
    }

    fn address(&self, index: SubaddressIndex) -> Option<AccountAddress> {
        self.accounts
            .get(index.major as usize)?
            .subaddresses
            .get(index.minor as usize)
            .map(|s| s.address)
    }

    fn label(&self, index: SubaddressIndex) -> Option<String> {
        self.accounts
            .get(index.major as usize)?
            .subaddresses
            .get(index.minor as usize)
            .map(|s| s.label.clone())
    }

    fn set_label(&mut self, index: SubaddressIndex, label: String) -> bool {
        match self
            .accounts
            .get_mut(index.major as usize)
            .and_then(|a| a.subaddresses.get_mut(index.minor as usize))
        {
            Some(sub) => {
                sub.label = label;
                true
            }
            None => false,
        }
    }

    fn add_subaddress(&mut self, account: u32, label: String) -> Option<SubaddressIndex> {
        let minor = self.accounts.get(account as usize)?.subaddresses.len() as u32;
        let index = SubaddressIndex::new(account, minor);
        let address = self.derive_address(index);
        self.accounts[account as usize]
            .subaddresses
            .push(MemorySubaddress { address, label });
        Some(index)
    }

    fn add_account(&mut self, label: String) -> u32 {
        let major = self.accounts.len() as u32;
        let address = self.derive_address(SubaddressIndex::new(major, 0));
        self.accounts.push(MemoryAccount {
            subaddresses: vec![MemorySubaddress { address, label }],
        });
        major
    }

    fn subaddress_balances(&self, account: u32) -> BTreeMap<u32, SubaddressBalance> {
        let mut balances: BTreeMap<u32, SubaddressBalance> = BTreeMap::new();
        for output in self
            .outputs
            .iter()
            .filter(|o| !o.spent && o.subaddr_index.major == account)
        {
            let entry = balances.entry(output.subaddr_index.minor).or_default();
            entry.balance = entry.balance.saturating_add(output.amount);
            entry.num_unspent_outputs += 1;
            if self.is_unlocked(output) {
                entry.unlocked_balance = entry.unlocked_balance.saturating_add(output.amount);
            }
        }
        balances
    }

    fn create_transactions(
        &mut self,
        request: &ConstructionRequest,
        size_target_factor: f64,
    ) -> Result<Vec<PendingTransaction>, EngineError> {
        self.ensure_daemon()?;
        if request.destinations.is_empty() {
            return Err(EngineError::Transfer("no destinations".into()));
        }

        let limits = self.limits;
        let target = (limits.tx_size_limit as f64 * size_target_factor) as u64;
        let per_tx = limits.max_recipients(target);
        let extra_len = request.extra.as_bytes().len() as u64 + TX_PUBKEY_FIELD_SIZE;

        let candidates = self.spendable(
            request.subaddr_account,
            &request.subaddr_indices,
            |o| o.amount >= DUST_THRESHOLD,
        );
        let available = candidates
            .iter()
            .fold(0u64, |acc, &i| acc.saturating_add(self.outputs[i].amount));
        let needed = request
            .destinations
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.amount));

        let mut planned = Vec::new();
        let mut cursor = 0;
        for chunk in request.destinations.chunks(per_tx) {
            let amount = chunk.iter().fold(0u64, |acc, d| acc.saturating_add(d.amount));
            let outputs = chunk.len() + 1;
            let mut inputs = Vec::new();
            let mut input_total = 0u64;

            let (size, fee) = loop {
                let size = limits.actual_size(inputs.len().max(1), outputs, request.mixin, extra_len);
                let fee = limits.fee(size, request.priority);
                if !inputs.is_empty() && input_total >= amount.saturating_add(fee) {
                    break (size, fee);
                }
                let Some(&next) = candidates.get(cursor) else {
                    return Err(EngineError::NotEnoughMoney {
                        available,
                        needed: needed.saturating_add(fee),
                    });
                };
                cursor += 1;
                inputs.push(next);
                input_total = input_total.saturating_add(self.outputs[next].amount);
            };

            if size > limits.tx_size_limit {
                return Err(EngineError::TxTooBig {
                    size,
                    limit: limits.tx_size_limit,
                });
            }
            planned.push((inputs, chunk.to_vec(), fee, size));
        }

        Ok(planned
            .into_iter()
            .map(|(inputs, destinations, fee, size)| {
                self.assemble(
                    &inputs,
                    destinations,
                    fee,
                    size,
                    &request.extra,
                    request.subaddr_account,
                    &request.subaddr_indices,
                )
            })
            .collect())
    }

    fn create_sweep_all(
        &mut self,
        request: &SweepRequest,
    ) -> Result<Vec<PendingTransaction>, EngineError> {
        self.ensure_daemon()?;
        let below = request.below_amount;
        let candidates = self.spendable(request.subaddr_account, &request.subaddr_indices, |o| {
            o.amount >= DUST_THRESHOLD && (below == 0 || o.amount < below)
        });
        if candidates.is_empty() {
            return Err(EngineError::Transfer(
                "No unlocked balance in the specified subaddress(es)".into(),
            ));
        }

        let limits = self.limits;
        let extra_len = request.extra.as_bytes().len() as u64 + TX_PUBKEY_FIELD_SIZE;
        let per_tx = limits.max_sweep_inputs(request.mixin, extra_len);

        let mut txs = Vec::new();
        for chunk in candidates.chunks(per_tx) {
            let total = chunk
                .iter()
                .fold(0u64, |acc, &i| acc.saturating_add(self.outputs[i].amount));
            let size = limits.actual_size(chunk.len(), 1, request.mixin, extra_len);
            let fee = limits.fee(size, request.priority);
            if total <= fee {
                return Err(EngineError::NotEnoughMoney {
                    available: total,
                    needed: fee,
                });
            }
            let destination = TxDestination {
                address: request.destination,
                is_subaddress: request.is_subaddress,
                amount: total - fee,
            };
            txs.push(self.assemble(
                chunk,
                vec![destination],
                fee,
                size,
                &request.extra,
                request.subaddr_account,
                &request.subaddr_indices,
            ));
        }
        Ok(txs)
    }

    fn create_dust_sweep(
        &mut self,
        _trusted_daemon: bool,
    ) -> Result<Vec<PendingTransaction>, EngineError> {
        self.ensure_daemon()?;
        let candidates = self.spendable(0, &BTreeSet::new(), |o| o.amount < DUST_THRESHOLD);
        if candidates.is_empty() {
            return Err(EngineError::Transfer("No unmixable outputs found".into()));
        }
        let Some(destination) = self.address(SubaddressIndex::new(0, 0)) else {
            return Err(EngineError::Transfer("wallet has no primary address".into()));
        };

        let limits = self.limits;
        let per_tx = limits.max_sweep_inputs(0, TX_PUBKEY_FIELD_SIZE);
        let mut txs = Vec::new();
        for chunk in candidates.chunks(per_tx) {
            let total = chunk
                .iter()
                .fold(0u64, |acc, &i| acc.saturating_add(self.outputs[i].amount));
            let size = limits.actual_size(chunk.len(), 1, 0, TX_PUBKEY_FIELD_SIZE);
            let fee = limits.fee(size, 1);
            if total <= fee {
                return Err(EngineError::NotEnoughMoney {
                    available: total,
                    needed: fee,
                });
            }
            let out = TxDestination {
                address: destination,
                is_subaddress: false,
                amount: total - fee,
            };
            txs.push(self.assemble(
                chunk,
                vec![out],
                fee,
                size,
                &TxExtra::new(),
                0,
                &BTreeSet::new(),
            ));
        }
        Ok(txs)
    }

    fn commit(&mut self, tx: &PendingTransaction) -> Result<(), EngineError> {
        self.ensure_daemon()?;

        let mut positions = Vec::with_capacity(tx.spent_outputs.len());
        for global_index in &tx.spent_outputs {
            let position = self
                .outputs
                .iter()
                .position(|o| o.global_index == *global_index)
                .ok_or_else(|| EngineError::Transfer(format!("unknown output {global_index}")))?;
            if self.outputs[position].spent {
                return Err(EngineError::Transfer(format!(
                    "output {global_index} is already spent"
                )));
            }
            positions.push(position);
        }

        let mut spent_from = BTreeSet::new();
        for position in positions {
            self.outputs[position].spent = true;
            spent_from.insert(self.outputs[position].subaddr_index.minor);
        }

        let payment_id = tx
            .extra
            .payment_id()
            .map(|id| id.to_slot())
            .unwrap_or(Hash::ZERO);
        self.unconfirmed.push(UnconfirmedTransfer {
            tx_hash: tx.tx_hash,
            payment_id,
            amount_in: tx.amount_in,
            amount_out: tx.amount_in.saturating_sub(tx.fee),
            change: tx.change,
            unlock_time: 0,
            timestamp: now(),
            destinations: tx.destinations.clone(),
            subaddr_account: tx.subaddr_account,
            subaddr_indices: spent_from,
            state: UnconfirmedState::Pending,
        });
        self.commits += 1;
        Ok(())
    }

    fn incoming_payments(&self) -> &[PaymentRecord] {
        &self.incoming
    }

    fn confirmed_outgoing(&self) -> &[ConfirmedTransfer] {
        &self.outgoing
    }

    fn unconfirmed_outgoing(&self) -> &[UnconfirmedTransfer] {
        &self.unconfirmed
    }

    fn update_pool_state(&mut self) -> Result<(), EngineError> {
        self.ensure_daemon()?;
        self.pool = self.pool_feed.clone();
        self.pool_updates += 1;
        Ok(())
    }

    fn pool_payments(&self) -> &[PaymentRecord] {
        &self.pool
    }

    fn owned_outputs(&self) -> &[OwnedOutput] {
        &self.outputs
    }

    fn tx_note(&self, txid: &Hash) -> String {
        self.notes.get(txid).cloned().unwrap_or_default()
    }

    fn set_tx_note(&mut self, txid: Hash, note: String) {
        if note.is_empty() {
            self.notes.remove(&txid);
        } else {
            self.notes.insert(txid, note);
        }
    }

    fn address_book(&self) -> &[AddressBookRow] {
        &self.address_book
    }

    fn add_address_book_row(&mut self, row: AddressBookRow) {
        self.address_book.push(row);
    }

    fn delete_address_book_row(&mut self, index: usize) -> bool {
        if index >= self.address_book.len() {
            return false;
        }
        self.address_book.remove(index);
        true
    }
}

fn public_from_secret(secret: [u8; 32]) -> PublicKey {
    let scalar = Scalar::from_bytes_mod_order(secret);
    PublicKey((ED25519_BASEPOINT_POINT * scalar).compress().to_bytes())
}

fn synthetic_timestamp(height: u64) -> u64 {
    GENESIS_TIMESTAMP.saturating_add(height.saturating_mul(BLOCK_TARGET_SECONDS))
}

fn now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
