//! Error types for the discovery engine.
//!
//! Three families are kept apart so callers can react differently:
//!
//! - invalid arguments (`InvalidWidth`, `TooFewSamples`, `SampleTooShort`,
//!   `EmptyWorkList`): the call was malformed and did no work;
//! - [`Unsolvable`]: the search ran and found nothing, a normal outcome of a
//!   heuristic search;
//! - `AllocationFailure` and `Cancelled`: the search could not finish.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T, E = DiscoveryError> = std::result::Result<T, E>;

/// Reasons a well-formed search came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unsolvable {
    #[error("all sample differences are zero")]
    NoDifferences,

    #[error("all samples share one length, init and xorout cannot be separated")]
    UniformLength,

    #[error("no initial value reproduces every sample")]
    InitExhausted,
}

/// Errors returned by the discovery engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("CRC width {width} outside supported range {min}..={max}")]
    InvalidWidth { width: u8, min: u8, max: u8 },

    #[error("need at least 2 samples, got {0}")]
    TooFewSamples(usize),

    #[error("sample {index} is {len} bytes, shorter than the {min}-byte checksum")]
    SampleTooShort { index: usize, len: usize, min: usize },

    #[error("work string list is empty")]
    EmptyWorkList,

    #[error("max_candidates must be at least 1")]
    NoCandidateSlots,

    #[error("unsolvable: {0}")]
    Unsolvable(#[from] Unsolvable),

    #[error("work string allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),

    #[error("search cancelled by progress callback")]
    Cancelled,
}

impl DiscoveryError {
    /// True for the "searched and found nothing" family.
    pub fn is_unsolvable(&self) -> bool {
        matches!(self, DiscoveryError::Unsolvable(_))
    }

    /// True when the arguments were rejected before any work was done.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DiscoveryError::InvalidWidth { .. }
                | DiscoveryError::TooFewSamples(_)
                | DiscoveryError::SampleTooShort { .. }
                | DiscoveryError::EmptyWorkList
                | DiscoveryError::NoCandidateSlots
        )
    }
}

/// Reject `width` unless it lies in `min..=max`.
pub(crate) fn check_width(width: u8, min: u8, max: u8) -> Result<()> {
    if width < min || width > max {
        return Err(DiscoveryError::InvalidWidth { width, min, max });
    }
    Ok(())
}
