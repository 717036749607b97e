//! Message and checksum samples.
//!
//! A sample is a byte buffer whose trailing `ceil(width / 8)` bytes hold the
//! checksum, big-endian, and whose leading bytes are the message the checksum
//! covers. Samples are borrowed; the engine never copies a caller's buffer
//! except while deriving work strings.

use std::fmt;

use crate::error::{DiscoveryError, Result};
use crate::gf2::width_mask;

/// Minimum number of samples any discovery step accepts.
pub const MIN_SAMPLES: usize = 2;

/// Number of trailing bytes holding a `width`-bit checksum.
#[inline]
pub const fn checksum_bytes(width: u8) -> usize {
    (width as usize).div_ceil(8)
}

/// A borrowed message-plus-checksum buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sample<'a> {
    bytes: &'a [u8],
}

impl<'a> Sample<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the checksum; zero when the buffer is shorter than it.
    fn split_at(&self, width: u8) -> usize {
        self.bytes.len().saturating_sub(checksum_bytes(width))
    }

    /// The bytes covered by the checksum. Empty when the buffer holds no
    /// more than the checksum.
    pub fn message(&self, width: u8) -> &'a [u8] {
        &self.bytes[..self.split_at(width)]
    }

    /// The trailing checksum as an integer, masked to `width` bits. A
    /// buffer shorter than the checksum is read whole.
    pub fn checksum(&self, width: u8) -> u64 {
        let tail = &self.bytes[self.split_at(width)..];
        let value = tail
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        value & width_mask(width)
    }
}

impl fmt::Debug for Sample<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sample({})", hex::encode(self.bytes))
    }
}

/// Wrap caller buffers as samples after checking they can carry a
/// `width`-bit checksum.
pub fn validate<S: AsRef<[u8]>>(samples: &[S], width: u8) -> Result<Vec<Sample<'_>>> {
    if samples.len() < MIN_SAMPLES {
        return Err(DiscoveryError::TooFewSamples(samples.len()));
    }

    let min = checksum_bytes(width);
    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let bytes = sample.as_ref();
            if bytes.len() < min {
                return Err(DiscoveryError::SampleTooShort {
                    index,
                    len: bytes.len(),
                    min,
                });
            }
            Ok(Sample::new(bytes))
        })
        .collect()
}

/// True when at least two samples differ in total length.
pub fn lengths_differ(samples: &[Sample<'_>]) -> bool {
    samples
        .split_first()
        .is_some_and(|(first, rest)| rest.iter().any(|s| s.len() != first.len()))
}

/// Parse a sample written as hex, tolerating whitespace, `:` and `-`
/// separators and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(digits)
}
