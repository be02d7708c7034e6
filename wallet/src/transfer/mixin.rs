//! Ring size bounds.

use crate::config::{MAX_MIXIN, MIN_MIXIN};

/// Clamps a requested mixin into `[MIN_MIXIN, MAX_MIXIN]`. Out-of-range
/// requests are adjusted, never refused.
pub fn enforce_mixin(requested: u64) -> u64 {
    if requested < MIN_MIXIN {
        tracing::debug!(requested, using = MIN_MIXIN, "requested mixin too low");
        MIN_MIXIN
    } else if requested > MAX_MIXIN {
        tracing::debug!(requested, using = MAX_MIXIN, "requested mixin too high");
        MAX_MIXIN
    } else {
        requested
    }
}
