use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::gf2::width_mask;
use crate::search::{DEFAULT_MAX_RESULTS, Normalization};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectConfig {
    /// Candidate polynomials kept per XOR-out guess. Candidates beyond this
    /// are counted but never handed to the solver.
    pub max_candidates: usize,

    /// Known output XOR. When unset both `0` and the all-ones mask are
    /// tried, in that order.
    pub xorout_hint: Option<u64>,

    /// Which half of the generator space to search.
    pub normalization: Normalization,

    /// Evaluate candidates on the rayon pool.
    pub parallel: bool,

    /// Retry with equal-length pairs only when the XOR-out guesses find
    /// nothing. Recovers non-zero init values when such pairs exist.
    pub same_length_fallback: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_RESULTS,
            xorout_hint: None,
            normalization: Normalization::Odd,
            parallel: true,
            same_length_fallback: false,
        }
    }
}

impl DetectConfig {
    /// Reject settings that would hide search results. A cap of zero keeps
    /// no candidate for the solver.
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 {
            return Err(DiscoveryError::NoCandidateSlots);
        }
        Ok(())
    }

    /// XOR-out guesses for `width`, in the order they are tried.
    pub fn xorout_guesses(&self, width: u8) -> Vec<u64> {
        match self.xorout_hint {
            Some(hint) => vec![hint & width_mask(width)],
            None => vec![0, width_mask(width)],
        }
    }
}
