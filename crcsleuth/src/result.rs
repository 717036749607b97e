//! Discovery results and their canonical one-line rendering.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::gf2::width_mask;
use crate::preset::PresetIndex;
use crate::sample;
use crate::solve::register_crc;

/// Generator, init and xorout all verified against every sample.
pub const CONFIDENCE_VERIFIED: f64 = 100.0;

/// Generator divides every work string; init and xorout are guesses.
pub const CONFIDENCE_POLY_ONLY: f64 = 50.0;

/// Outcome of one detection call.
///
/// `found` is authoritative: when it is false the other parameter fields
/// carry no meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    pub found: bool,
    pub width: u8,
    pub poly: u64,
    pub init: u64,
    pub xorout: u64,
    pub reflected: bool,
    pub confidence: f64,
    pub preset: Option<PresetIndex>,
}

impl DiscoveryResult {
    pub fn not_found(width: u8) -> Self {
        Self {
            found: false,
            width,
            poly: 0,
            init: 0,
            xorout: 0,
            reflected: false,
            confidence: 0.0,
            preset: None,
        }
    }

    pub(crate) fn verified(width: u8, poly: u64, init: u64, xorout: u64) -> Self {
        Self {
            found: true,
            width,
            poly,
            init,
            xorout,
            reflected: false,
            confidence: CONFIDENCE_VERIFIED,
            preset: None,
        }
    }

    pub(crate) fn poly_only(width: u8, poly: u64, xorout: u64) -> Self {
        Self {
            confidence: CONFIDENCE_POLY_ONLY,
            ..Self::verified(width, poly, 0, xorout)
        }
    }

    pub fn is_verified(&self) -> bool {
        self.found && self.confidence >= CONFIDENCE_VERIFIED
    }

    /// Check the parameters against `samples`, e.g. ones held back from
    /// discovery. A not-found result verifies nothing.
    pub fn verify<S: AsRef<[u8]>>(&self, samples: &[S]) -> Result<bool> {
        if !self.found {
            return Ok(false);
        }
        let samples = sample::validate(samples, self.width)?;
        let mask = width_mask(self.width);
        Ok(samples.iter().all(|s| {
            let crc = register_crc(s.message(self.width), self.init, self.poly, self.width);
            (crc ^ self.xorout) & mask == s.checksum(self.width)
        }))
    }
}

impl fmt::Display for DiscoveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.found {
            return f.write_str("No CRC parameters found");
        }
        let digits = (self.width as usize).div_ceil(4);
        write!(
            f,
            "CRC-{}: poly=0x{:0digits$X} init=0x{:0digits$X} xorout=0x{:0digits$X} ref={} conf={:.0}%",
            self.width,
            self.poly,
            self.init,
            self.xorout,
            if self.reflected { "yes" } else { "no" },
            self.confidence,
        )
    }
}
