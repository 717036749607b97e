//! Work strings: sample differences the true generator must divide.
//!
//! CRC is affine over GF(2). XORing two equal-length samples cancels both
//! the initial register value and the output XOR, leaving a bit string that
//! is an exact multiple of the generator. Samples of different lengths are
//! aligned on their checksums instead; that cancels the output XOR but only
//! cancels the initial value when it is zero, which is why the orchestrator
//! retries with several XOR-out guesses.

use crate::error::{Result, Unsolvable, check_width};
use crate::gf2::crc_remainder;
use crate::sample::{self, Sample, checksum_bytes};
use crate::search::{MAX_SEARCH_WIDTH, MIN_WIDTH};
use crate::tracing::prelude::*;

/// A bit string the true generator divides with remainder zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkString {
    bytes: Vec<u8>,
    bits: usize,
}

impl WorkString {
    /// Wrap `bytes`, using all of them.
    pub fn new(bytes: Vec<u8>) -> Self {
        let bits = bytes.len() * 8;
        Self { bytes, bits }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Exact number of bits fed to the divider.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Remainder under `x^width + poly`.
    pub fn remainder(&self, poly: u64, width: u8) -> u64 {
        crc_remainder(&self.bytes, self.bits, poly, width)
    }
}

/// Deduplicated list of work strings for one discovery call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkStrings {
    strings: Vec<WorkString>,
}

impl WorkStrings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkString> {
        self.strings.iter()
    }

    pub fn as_slice(&self) -> &[WorkString] {
        &self.strings
    }

    /// Append `work` unless an entry with the same bit count and bytes is
    /// already present. Returns whether it was added.
    pub fn insert(&mut self, work: WorkString) -> Result<bool> {
        if self.strings.contains(&work) {
            return Ok(false);
        }
        self.strings.try_reserve(1)?;
        self.strings.push(work);
        Ok(true)
    }

    /// True when `x^width + poly` leaves remainder zero on every entry.
    pub fn divides_all(&self, poly: u64, width: u8) -> bool {
        self.strings.iter().all(|w| w.remainder(poly, width) == 0)
    }
}

impl<'a> IntoIterator for &'a WorkStrings {
    type Item = &'a WorkString;
    type IntoIter = std::slice::Iter<'a, WorkString>;

    fn into_iter(self) -> Self::IntoIter {
        self.strings.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pairs {
    All,
    SameLength,
}

/// Build the work strings for `samples` under an assumed output XOR.
///
/// Every unordered pair contributes its difference when that difference is
/// nonzero. Fails with [`Unsolvable::NoDifferences`] when no pair does.
pub fn derive_work_strings<S: AsRef<[u8]>>(
    samples: &[S],
    width: u8,
    xorout_guess: u64,
) -> Result<WorkStrings> {
    check_width(width, MIN_WIDTH, MAX_SEARCH_WIDTH)?;
    let samples = sample::validate(samples, width)?;
    derive(&samples, width, xorout_guess, Pairs::All)
}

/// Build work strings from equal-length pairs only.
///
/// These differences cancel any initial value, so the true generator divides
/// them even when `init != 0`. Pairs of different length are skipped.
pub fn derive_same_length_work_strings<S: AsRef<[u8]>>(
    samples: &[S],
    width: u8,
) -> Result<WorkStrings> {
    check_width(width, MIN_WIDTH, MAX_SEARCH_WIDTH)?;
    let samples = sample::validate(samples, width)?;
    derive(&samples, width, 0, Pairs::SameLength)
}

fn derive(
    samples: &[Sample<'_>],
    width: u8,
    xorout_guess: u64,
    pairs: Pairs,
) -> Result<WorkStrings> {
    let crc_bytes = checksum_bytes(width);
    let mut work = WorkStrings::new();
    let mut compared = 0usize;

    for (i, first) in samples.iter().enumerate() {
        for second in &samples[i + 1..] {
            if pairs == Pairs::SameLength && first.len() != second.len() {
                continue;
            }
            compared += 1;

            let diff = pair_difference(first.bytes(), second.bytes(), crc_bytes, xorout_guess)?;
            match first_set_bit(&diff) {
                Some(first_bit) => {
                    let added = work.insert(WorkString::new(diff))?;
                    trace!(i, first_bit, added, "Pair difference");
                }
                None => trace!(i, "Pair difference is zero"),
            }
        }
    }

    debug!(
        width,
        xorout_guess = format!("{:#x}", xorout_guess),
        pairs = compared,
        work_strings = work.len(),
        "Derived work strings"
    );

    if work.is_empty() {
        return Err(Unsolvable::NoDifferences.into());
    }
    Ok(work)
}

/// Difference of two samples, laid out over the longer one.
fn pair_difference(
    first: &[u8],
    second: &[u8],
    crc_bytes: usize,
    xorout_guess: u64,
) -> Result<Vec<u8>> {
    let (a, b) = if first.len() < second.len() {
        (second, first)
    } else {
        (first, second)
    };
    let (a_len, b_len) = (a.len(), b.len());

    let mut out = Vec::new();
    out.try_reserve_exact(a_len)?;

    if a_len == b_len {
        out.extend(a.iter().zip(b).map(|(x, y)| x ^ y));
        return Ok(out);
    }

    out.extend_from_slice(a);

    // Checksums share the tail.
    for k in 0..crc_bytes.min(b_len) {
        out[a_len - crc_bytes + k] ^= b[b_len - crc_bytes + k];
    }

    // Messages are right-justified against the checksum.
    let msg_a = a_len - crc_bytes;
    let msg_b = b_len - crc_bytes;
    for k in 0..msg_b {
        out[msg_a - msg_b + k] ^= b[k];
    }

    // The guess lands on the tail and again at the shorter sample's own
    // checksum offset.
    if xorout_guess != 0 {
        for k in 0..crc_bytes {
            let byte = (xorout_guess >> ((crc_bytes - 1 - k) * 8)) as u8;
            out[a_len - crc_bytes + k] ^= byte;
            out[b_len - crc_bytes + k] ^= byte;
        }
    }

    Ok(out)
}

/// Offset of the first set bit, MSB-first, or `None` for an all-zero buffer.
fn first_set_bit(bytes: &[u8]) -> Option<usize> {
    bytes
        .iter()
        .position(|&b| b != 0)
        .map(|i| i * 8 + bytes[i].leading_zeros() as usize)
}
