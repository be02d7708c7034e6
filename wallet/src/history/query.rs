//! Filters applied when listing transfers, payments and outputs.

use std::collections::BTreeSet;
use std::str::FromStr;

use thiserror::Error;

use crate::engine::SubaddressIndex;

/// Inclusive block height range. Only confirmed records are filtered by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRange {
    pub min: u64,
    pub max: u64,
}

impl Default for HeightRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: u64::MAX,
        }
    }
}

impl HeightRange {
    pub fn contains(&self, height: u64) -> bool {
        self.min <= height && height <= self.max
    }
}

/// An account, optionally narrowed to a subset of its subaddresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferScope {
    pub account_index: u32,
    /// Empty means every subaddress of the account.
    pub subaddr_indices: BTreeSet<u32>,
}

impl TransferScope {
    /// Whether a record received at `index` is in scope.
    pub fn contains(&self, index: &SubaddressIndex) -> bool {
        index.major == self.account_index
            && (self.subaddr_indices.is_empty() || self.subaddr_indices.contains(&index.minor))
    }

    /// Whether a transfer spending from `spent_from` of `account` is in scope.
    pub fn overlaps(&self, account: u32, spent_from: &BTreeSet<u32>) -> bool {
        account == self.account_index
            && (self.subaddr_indices.is_empty()
                || !self.subaddr_indices.is_disjoint(spent_from))
    }
}

/// Which categories to list and how to filter them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransfersQuery {
    pub incoming: bool,
    pub outgoing: bool,
    pub pending: bool,
    pub failed: bool,
    pub pool: bool,
    pub heights: HeightRange,
    pub scope: TransferScope,
}

/// Output states accepted by the incoming transfers listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFilter {
    All,
    Available,
    Unavailable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Transfer type must be one of: all, available, or unavailable")]
pub struct OutputFilterError;

impl FromStr for OutputFilter {
    type Err = OutputFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(OutputFilter::All),
            "available" => Ok(OutputFilter::Available),
            "unavailable" => Ok(OutputFilter::Unavailable),
            _ => Err(OutputFilterError),
        }
    }
}

impl OutputFilter {
    pub fn accepts(self, spent: bool) -> bool {
        match self {
            OutputFilter::All => true,
            OutputFilter::Available => !spent,
            OutputFilter::Unavailable => spent,
        }
    }
}
