//! Recover the parameters of an unknown CRC from captured samples.
//!
//! Given a handful of buffers that each end in a big-endian checksum, the
//! engine searches for the generator polynomial, then the initial register
//! value and output XOR, and reports them with a confidence tier:
//!
//! ```no_run
//! let samples = [b"12\x20\xb5".to_vec(), b"123\x97\x52".to_vec()];
//! let result = crcsleuth::detect(&samples, 16)?;
//! println!("{result}");
//! # Ok::<(), crcsleuth::DiscoveryError>(())
//! ```
//!
//! The pipeline, leaves first:
//!
//! - [`gf2`]: bit-serial polynomial division over GF(2).
//! - [`work`]: pairwise sample differences that cancel the unknown init.
//! - [`search`]: brute-force generator search over those differences.
//! - [`solve`]: init/xorout recovery for one candidate generator.
//! - [`detect`](mod@detect): the orchestrator tying the above together.
//! - [`result`]: the outcome and its one-line rendering.
//!
//! Only non-reflected CRCs are modelled. Reflected results are never
//! reported.

pub mod config;
pub mod detect;
pub mod error;
pub mod gf2;
pub mod preset;
pub mod result;
pub mod sample;
pub mod search;
pub mod solve;
pub mod tracing;
pub mod work;

#[cfg(test)]
mod testutil;

pub use config::DetectConfig;
pub use detect::{Detector, detect};
pub use error::{DiscoveryError, Result, Unsolvable};
pub use preset::{Catalogue, NoPresets, Preset, PresetIndex, PresetMatcher};
pub use result::DiscoveryResult;
pub use search::{Normalization, SearchOutcome};

/// Crate version, for front ends that report it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
