//! Init/XorOut recovery for a known generator.
//!
//! With the generator fixed, each candidate initial value determines the
//! output XOR from one sample; the candidate survives if that XOR reproduces
//! every other sample. The register here is the plain MSB-first shift
//! register of the direct algorithm, so it works for any width, including
//! widths below 8.

use rayon::prelude::*;

use crate::error::{Result, Unsolvable, check_width};
use crate::gf2::width_mask;
use crate::sample::{self, Sample};
use crate::search::MIN_WIDTH;
use crate::tracing::prelude::*;

/// Widest width the solver enumerates.
pub const MAX_SOLVE_WIDTH: u8 = 32;

/// Recovered initial register value and output XOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitXorOut {
    pub init: u64,
    pub xorout: u64,
}

/// CRC register after clocking `message` through `x^width + poly`, starting
/// from `init`. No output XOR is applied.
///
/// Each message bit, MSB first, is XORed with the register's top bit; the
/// register shifts left and the generator is XORed in when that feedback bit
/// is set.
pub fn register_crc(message: &[u8], init: u64, poly: u64, width: u8) -> u64 {
    debug_assert!((1..=64).contains(&width));

    let mask = width_mask(width);
    let poly = poly & mask;
    let top = width - 1;

    let mut reg = init & mask;
    for &byte in message {
        for bit in (0..8).rev() {
            let feedback = ((reg >> top) ^ u64::from(byte >> bit)) & 1;
            reg = (reg << 1) & mask;
            if feedback != 0 {
                reg ^= poly;
            }
        }
    }
    reg
}

/// Find the lowest `init` (and its `xorout`) under which `poly` reproduces
/// every sample.
///
/// Init values are tested on the rayon pool; the lowest passing value is
/// returned regardless of scheduling.
pub fn solve_init_xorout<S: AsRef<[u8]>>(
    samples: &[S],
    width: u8,
    poly: u64,
) -> Result<InitXorOut> {
    solve(samples, width, poly, true)
}

/// Like [`solve_init_xorout`] but on the calling thread.
pub fn solve_init_xorout_sequential<S: AsRef<[u8]>>(
    samples: &[S],
    width: u8,
    poly: u64,
) -> Result<InitXorOut> {
    solve(samples, width, poly, false)
}

pub(crate) fn solve<S: AsRef<[u8]>>(
    samples: &[S],
    width: u8,
    poly: u64,
    parallel: bool,
) -> Result<InitXorOut> {
    check_width(width, MIN_WIDTH, MAX_SOLVE_WIDTH)?;
    let samples = sample::validate(samples, width)?;

    // Equal lengths leave init and xorout indistinguishable: every init
    // would verify with its own xorout.
    if !sample::lengths_differ(&samples) {
        return Err(Unsolvable::UniformLength.into());
    }

    let space = 1u64 << width;
    let attempt = |init: u64| try_init(&samples, width, poly, init);
    let found = if parallel {
        (0..space).into_par_iter().find_map_first(attempt)
    } else {
        (0..space).find_map(attempt)
    };

    match found {
        Some(solution) => {
            debug!(
                poly = format!("{:#x}", poly),
                init = format!("{:#x}", solution.init),
                xorout = format!("{:#x}", solution.xorout),
                "Solved init and xorout"
            );
            Ok(solution)
        }
        None => {
            trace!(poly = format!("{:#x}", poly), "No init reproduces every sample");
            Err(Unsolvable::InitExhausted.into())
        }
    }
}

fn try_init(samples: &[Sample<'_>], width: u8, poly: u64, init: u64) -> Option<InitXorOut> {
    let (first, rest) = samples.split_first()?;
    let xorout = register_crc(first.message(width), init, poly, width) ^ first.checksum(width);

    rest.iter()
        .all(|s| register_crc(s.message(width), init, poly, width) ^ xorout == s.checksum(width))
        .then_some(InitXorOut { init, xorout })
}
