//! Brute-force polynomial search over a work-string list.
//!
//! Every candidate generator of the requested width is divided into every
//! work string; a candidate survives only if all remainders are zero. The
//! candidate space is walked in ascending order in windows of
//! `max(total / 1000, 1)` candidates. The progress callback runs once per
//! window, and the candidates inside a window are tested in parallel with an
//! order-preserving collect, so results come back in ascending order no
//! matter how the work was scheduled.

use std::ops::{ControlFlow, Range};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{DiscoveryError, Result, check_width};
use crate::tracing::prelude::*;
use crate::work::WorkStrings;

/// Narrowest width any search accepts.
pub const MIN_WIDTH: u8 = 3;

/// Widest width the polynomial search accepts.
pub const MAX_SEARCH_WIDTH: u8 = 64;

/// Number of progress windows the candidate space is divided into.
pub const PROGRESS_DIVISIONS: u64 = 1000;

/// Candidate cap used by [`PolySearch::new`].
pub const DEFAULT_MAX_RESULTS: usize = 16;

/// Progress callback: `(current, total)`. Returning `Break` cancels.
pub type Progress<'a> = dyn FnMut(u64, u64) -> ControlFlow<()> + 'a;

/// Which half of the generator space is searched.
///
/// Both variants fix one bit and so halve the space. `Odd` fixes bit 0 (the
/// `x^0` term), which every catalogued CRC generator has. `TopBit` fixes bit
/// `width - 1`, the range `[2^(width-1), 2^width)`; it misses generators such
/// as `0x1021` and is kept for comparison with older results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Normalization {
    #[default]
    Odd,
    TopBit,
}

impl Normalization {
    /// Number of candidates for `width`.
    pub fn candidate_count(self, width: u8) -> u64 {
        1u64 << (width - 1)
    }

    /// The `index`-th candidate, ascending.
    pub fn candidate(self, width: u8, index: u64) -> u64 {
        match self {
            Normalization::Odd => (index << 1) | 1,
            Normalization::TopBit => (1u64 << (width - 1)) | index,
        }
    }
}

/// Polynomials that divided every work string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    /// Passing candidates in ascending order, at most `max_results`.
    pub candidates: Vec<u64>,
    /// Total number of passing candidates, including those beyond the cap.
    pub matches: u64,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.matches == 0
    }
}

/// Configured polynomial search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolySearch {
    width: u8,
    max_results: usize,
    normalization: Normalization,
    parallel: bool,
}

impl PolySearch {
    /// Search `width`-bit generators, keeping up to 16 results.
    pub fn new(width: u8) -> Result<Self> {
        check_width(width, MIN_WIDTH, MAX_SEARCH_WIDTH)?;
        Ok(Self {
            width,
            max_results: DEFAULT_MAX_RESULTS,
            normalization: Normalization::default(),
            parallel: true,
        })
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Test candidates on the rayon pool (default) or on the calling thread.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Run the search.
    pub fn run(
        &self,
        work: &WorkStrings,
        mut progress: Option<&mut Progress<'_>>,
    ) -> Result<SearchOutcome> {
        if work.is_empty() {
            return Err(DiscoveryError::EmptyWorkList);
        }

        let total = self.normalization.candidate_count(self.width);
        let step = (total / PROGRESS_DIVISIONS).max(1);
        let mut outcome = SearchOutcome::default();

        debug!(
            width = self.width,
            normalization = %self.normalization,
            total,
            work_strings = work.len(),
            "Starting polynomial search"
        );

        let mut start = 0u64;
        while start < total {
            if let Some(report) = progress.as_mut() {
                if report(start, total).is_break() {
                    debug!(current = start, total, "Polynomial search cancelled");
                    return Err(DiscoveryError::Cancelled);
                }
            }

            let end = start.saturating_add(step).min(total);
            for poly in self.scan(work, start..end) {
                trace!(poly = format!("{:#x}", poly), "Candidate divides every work string");
                if outcome.candidates.len() < self.max_results {
                    outcome.candidates.push(poly);
                }
                outcome.matches += 1;
            }
            start = end;
        }

        debug!(
            matches = outcome.matches,
            kept = outcome.candidates.len(),
            "Polynomial search finished"
        );
        Ok(outcome)
    }

    fn scan(&self, work: &WorkStrings, window: Range<u64>) -> Vec<u64> {
        let test = |index: u64| {
            let poly = self.normalization.candidate(self.width, index);
            work.divides_all(poly, self.width).then_some(poly)
        };

        if self.parallel {
            window.into_par_iter().filter_map(&test).collect()
        } else {
            window.filter_map(&test).collect()
        }
    }
}

/// Search `width`-bit generators that divide every work string.
///
/// Keeps at most `max_results` candidates but counts every match. Uses the
/// default normalization and parallel evaluation.
pub fn find_polynomials(
    work: &WorkStrings,
    width: u8,
    max_results: usize,
    progress: Option<&mut Progress<'_>>,
) -> Result<SearchOutcome> {
    PolySearch::new(width)?
        .max_results(max_results)
        .run(work, progress)
}
