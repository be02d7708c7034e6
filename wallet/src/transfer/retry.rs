//! # Oversize Retry Controller
//!
//! The engine aims each transaction at a fraction of the network's size
//! limit (the size target factor, starting at 1.00). When it still produces
//! a transaction over the limit, the factor is scaled by `limit / size`,
//! floored to two decimals, and construction runs again:
//!
//! ```text
//! factor' = floor(factor * limit / size * 100) / 100
//! ```
//!
//! The factor is kept in integer hundredths so that floor is exact.
//!
//! The loop is bounded: it gives up with [`TransferError::TxTooBig`] once
//! the attempt budget is spent, once the factor would fall below the
//! policy's floor, or as soon as a retry would not shrink the factor.

use std::fmt;

use super::TransferError;
use crate::config::{RetryPolicy, INITIAL_SIZE_TARGET_FACTOR};

/// Size target factor in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SizeTargetFactor(u32);

impl SizeTargetFactor {
    /// 1.00, the factor of the first attempt.
    pub const FULL: SizeTargetFactor = SizeTargetFactor(INITIAL_SIZE_TARGET_FACTOR);

    pub fn from_hundredths(hundredths: u32) -> Self {
        SizeTargetFactor(hundredths)
    }

    pub fn hundredths(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// The factor to try after a transaction of `size` bytes overshot
    /// `limit`.
    pub fn shrink(self, size: u64, limit: u64) -> Self {
        if size == 0 {
            return self;
        }
        let scaled = u128::from(self.0) * u128::from(limit) / u128::from(size);
        SizeTargetFactor(u32::try_from(scaled).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for SizeTargetFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// States of the retry loop.
#[derive(Debug)]
pub enum RetryState<T> {
    /// Running construction (and whatever follows it) at `factor`.
    Attempting {
        attempt: u32,
        factor: SizeTargetFactor,
    },
    /// The last attempt overshot; the next one uses `to`.
    Retrying {
        attempt: u32,
        from: SizeTargetFactor,
        to: SizeTargetFactor,
    },
    Committed(T),
    Failed(TransferError),
}

/// Runs `attempt` with a shrinking size target factor until it succeeds,
/// fails with anything other than an oversized transaction, or the policy
/// gives up.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut attempt: F) -> Result<T, TransferError>
where
    F: FnMut(SizeTargetFactor) -> Result<T, TransferError>,
{
    let mut state = RetryState::Attempting {
        attempt: 1,
        factor: SizeTargetFactor::FULL,
    };

    loop {
        state = match state {
            RetryState::Attempting { attempt: n, factor } => match attempt(factor) {
                Ok(value) => RetryState::Committed(value),
                Err(TransferError::TxTooBig { size, limit }) => {
                    next_after_oversize(policy, n, factor, size, limit)
                }
                Err(other) => RetryState::Failed(other),
            },
            RetryState::Retrying { attempt, from, to } => {
                tracing::debug!(attempt = attempt + 1, from = %from, to = %to, "retrying construction");
                RetryState::Attempting {
                    attempt: attempt + 1,
                    factor: to,
                }
            }
            RetryState::Committed(value) => return Ok(value),
            RetryState::Failed(err) => return Err(err),
        };
    }
}

fn next_after_oversize<T>(
    policy: &RetryPolicy,
    attempt: u32,
    factor: SizeTargetFactor,
    size: u64,
    limit: u64,
) -> RetryState<T> {
    let next = factor.shrink(size, limit);
    let exhausted = attempt >= policy.max_attempts;
    let below_floor = next.hundredths() < policy.min_factor;
    let stalled = next >= factor;

    if exhausted || below_floor || stalled {
        tracing::error!(
            size,
            limit,
            attempt,
            factor = %factor,
            next_factor = %next,
            "constructed tx too big, giving up"
        );
        return RetryState::Failed(TransferError::TxTooBig { size, limit });
    }

    tracing::error!(
        size,
        limit,
        factor = %next,
        "constructed tx too big, retrying with smaller tx_size_target_factor"
    );
    RetryState::Retrying {
        attempt,
        from: factor,
        to: next,
    }
}
