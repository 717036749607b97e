//! Tiered-confidence detection.
//!
//! For each XOR-out guess the orchestrator derives work strings, searches
//! for generators and hands the candidates, lowest first, to the solver.
//! The first candidate the solver can complete is reported at confidence
//! 100. If a guess produced candidates but none could be solved, the lowest
//! candidate is reported at confidence 50 with `init = 0` and the guess as
//! `xorout`. A search that finds nothing on any guess is a normal outcome
//! and yields a not-found result rather than an error.

use crate::config::DetectConfig;
use crate::error::{DiscoveryError, Result, check_width};
use crate::preset::{Catalogue, NoPresets, PresetMatcher};
use crate::result::DiscoveryResult;
use crate::sample;
use crate::search::{MAX_SEARCH_WIDTH, MIN_WIDTH, PolySearch, Progress, SearchOutcome};
use crate::solve::{self, MAX_SOLVE_WIDTH};
use crate::tracing::prelude::*;
use crate::work::{WorkStrings, derive_same_length_work_strings, derive_work_strings};

/// Detection front end holding configuration and a preset matcher.
#[derive(Debug, Clone, Default)]
pub struct Detector<M = NoPresets> {
    config: DetectConfig,
    presets: M,
}

impl Detector<NoPresets> {
    pub fn new(config: DetectConfig) -> Self {
        Self {
            config,
            presets: NoPresets,
        }
    }
}

impl<M: PresetMatcher> Detector<M> {
    /// Replace the preset matcher.
    pub fn with_presets<P: PresetMatcher>(self, presets: P) -> Detector<P> {
        Detector {
            config: self.config,
            presets,
        }
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    pub fn presets(&self) -> &M {
        &self.presets
    }

    /// Recover CRC parameters from `samples`.
    ///
    /// Sample differences are taken over whole checksum bytes, so widths
    /// that are not a multiple of 8 come back not found.
    pub fn detect<S: AsRef<[u8]>>(&self, samples: &[S], width: u8) -> Result<DiscoveryResult> {
        self.run(samples, width, None)
    }

    /// Like [`Detector::detect`], reporting search progress to `progress`.
    /// Returning `Break` from the callback aborts with
    /// [`DiscoveryError::Cancelled`].
    pub fn detect_with_progress<S: AsRef<[u8]>>(
        &self,
        samples: &[S],
        width: u8,
        progress: &mut Progress<'_>,
    ) -> Result<DiscoveryResult> {
        self.run(samples, width, Some(progress))
    }

    fn run<S: AsRef<[u8]>>(
        &self,
        samples: &[S],
        width: u8,
        mut progress: Option<&mut Progress<'_>>,
    ) -> Result<DiscoveryResult> {
        self.config.validate()?;
        check_width(width, MIN_WIDTH, MAX_SEARCH_WIDTH)?;
        sample::validate(samples, width)?;

        let search = PolySearch::new(width)?
            .max_results(self.config.max_candidates)
            .normalization(self.config.normalization)
            .parallel(self.config.parallel);

        for guess in self.config.xorout_guesses(width) {
            let Some(work) = unsolvable_as_none(derive_work_strings(samples, width, guess))? else {
                debug!(xorout_guess = format!("{:#x}", guess), "No usable sample differences");
                continue;
            };

            let outcome = search.run(&work, progress.as_deref_mut())?;
            if let Some(result) = self.resolve(samples, width, &outcome, guess)? {
                return Ok(result);
            }
        }

        if self.config.same_length_fallback {
            if let Some(work) = self.equal_length_work(samples, width)? {
                debug!(work_strings = work.len(), "Retrying with equal-length pairs");
                let outcome = search.run(&work, progress.as_deref_mut())?;
                if let Some(result) = self.resolve(samples, width, &outcome, 0)? {
                    return Ok(result);
                }
            }
        }

        info!(width, "No CRC parameters found");
        Ok(DiscoveryResult::not_found(width))
    }

    fn equal_length_work<S: AsRef<[u8]>>(
        &self,
        samples: &[S],
        width: u8,
    ) -> Result<Option<WorkStrings>> {
        unsolvable_as_none(derive_same_length_work_strings(samples, width))
    }

    /// Turn a search outcome into a result, or `None` when it holds no
    /// candidates.
    fn resolve<S: AsRef<[u8]>>(
        &self,
        samples: &[S],
        width: u8,
        outcome: &SearchOutcome,
        xorout_guess: u64,
    ) -> Result<Option<DiscoveryResult>> {
        let Some(&lowest) = outcome.candidates.first() else {
            return Ok(None);
        };

        if width <= MAX_SOLVE_WIDTH {
            for &poly in &outcome.candidates {
                let solved = solve::solve(samples, width, poly, self.config.parallel);
                let Some(found) = unsolvable_as_none(solved)? else {
                    continue;
                };

                let mut result = DiscoveryResult::verified(width, poly, found.init, found.xorout);
                result.preset =
                    self.presets
                        .match_preset(width, poly, found.init, found.xorout, result.reflected);
                info!(
                    result = %result,
                    preset = ?result.preset.and_then(|i| self.presets.preset_name(i)),
                    "CRC parameters verified"
                );
                return Ok(Some(result));
            }
        }

        let result = DiscoveryResult::poly_only(width, lowest, xorout_guess);
        info!(
            result = %result,
            candidates = outcome.matches,
            "Generator found, init and xorout unverified"
        );
        Ok(Some(result))
    }
}

/// Recover CRC parameters with the default configuration and the built-in
/// preset catalogue.
///
/// Only widths that are a multiple of 8 can be found; see
/// [`Detector::detect`].
pub fn detect<S: AsRef<[u8]>>(samples: &[S], width: u8) -> Result<DiscoveryResult> {
    Detector::new(DetectConfig::default())
        .with_presets(Catalogue::new())
        .detect(samples, width)
}

/// Map the "searched and found nothing" family to `None`, keep everything
/// else.
fn unsolvable_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DiscoveryError::Unsolvable(reason)) => {
            trace!(%reason, "Unsolvable");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use super::*;
    use crate::search::Normalization;
    use crate::testutil::{frame, xmodem_samples};
    use test_case::test_case;

    fn framed(messages: &[&[u8]], width: u8, poly: u64, init: u64, xorout: u64) -> Vec<Vec<u8>> {
        messages
            .iter()
            .map(|m| frame(m, width, poly, init, xorout))
            .collect()
    }

    const MESSAGES: &[&[u8]] = &[
        b"\x01",
        b"IDAM",
        b"track 0 side 1",
        b"\xa1\xa1\xa1\xfe\x00\x00\x01\x02",
    ];

    #[test]
    fn test_xmodem_scenario() {
        let result = detect(&xmodem_samples(), 16).unwrap();
        assert_eq!(
            result.to_string(),
            "CRC-16: poly=0x1021 init=0x0000 xorout=0x0000 ref=no conf=100%"
        );
        assert!(result.found);
        assert!(!result.reflected);
    }

    #[test]
    fn test_preset_attached_after_verification() {
        let catalogue = Catalogue::new();
        let result = detect(&xmodem_samples(), 16).unwrap();
        assert_eq!(result.preset, catalogue.find("CRC-16/XMODEM"));

        let bare = Detector::new(DetectConfig::default())
            .detect(&xmodem_samples(), 16)
            .unwrap();
        assert_eq!(bare.preset, None);
        assert_eq!(bare.poly, 0x1021);
    }

    #[test_case(8, 0x07, 0x00; "crc8_smbus")]
    #[test_case(8, 0x07, 0x55; "crc8_i432_1")]
    #[test_case(8, 0x31, 0xff; "crc8_poly_31")]
    #[test_case(16, 0x8005, 0x0000; "crc16_umts")]
    #[test_case(16, 0x0589, 0x0000; "crc16_dect_x")]
    #[test_case(16, 0x3d65, 0xffff; "crc16_dnp_unreflected")]
    #[test_case(16, 0x1021, 0x1234; "arbitrary_xorout")]
    fn test_round_trip_zero_init(width: u8, poly: u64, xorout: u64) {
        let samples = framed(MESSAGES, width, poly, 0, xorout);
        let result = detect(&samples, width).unwrap();

        assert!(result.is_verified(), "{result}");
        assert_eq!((result.poly, result.init, result.xorout), (poly, 0, xorout));
    }

    #[test]
    fn test_equal_lengths_stop_at_half_confidence() {
        let samples = framed(&[b"AB", b"CD"], 16, 0x1021, 0, 0);
        let result = detect(&samples, 16).unwrap();

        assert!(result.found);
        assert_eq!(result.confidence, 50.0);
        assert_eq!(result.poly, 0x1021);
        assert_eq!((result.init, result.xorout), (0, 0));
        assert_eq!(result.preset, None);
        assert_eq!(
            result.to_string(),
            "CRC-16: poly=0x1021 init=0x0000 xorout=0x0000 ref=no conf=50%"
        );
    }

    #[test]
    fn test_identical_samples_not_found() {
        let samples = [b"same\x12\x34".to_vec(), b"same\x12\x34".to_vec()];
        let result = detect(&samples, 16).unwrap();
        assert!(!result.found);
        assert_eq!(result.to_string(), "No CRC parameters found");
    }

    #[test]
    fn test_nonzero_init_needs_fallback() {
        let messages: &[&[u8]] = &[b"IDAM", b"DAM!", b"SYNC", b"longer one"];
        let samples = framed(messages, 16, 0x1021, 0xffff, 0);

        assert!(!detect(&samples, 16).unwrap().found);

        let config = DetectConfig {
            same_length_fallback: true,
            ..Default::default()
        };
        let result = Detector::new(config).detect(&samples, 16).unwrap();
        assert!(result.is_verified(), "{result}");
        assert_eq!(result.poly, 0x1021);

        // x + 1 divides the generator, so more than one (init, xorout) pair
        // reproduces the model. Whatever was chosen must hold on new data.
        let held_back = framed(&[b"", b"a fresh sector header"], 16, 0x1021, 0xffff, 0);
        assert!(result.verify(&held_back).unwrap());
    }

    #[test]
    fn test_fallback_without_equal_lengths_is_not_found() {
        let samples = framed(&[b"a", b"bc", b"def"], 16, 0x1021, 0xffff, 0);
        let config = DetectConfig {
            same_length_fallback: true,
            ..Default::default()
        };
        assert!(!Detector::new(config).detect(&samples, 16).unwrap().found);
    }

    #[test]
    fn test_xorout_hint_limits_guesses() {
        let samples = framed(MESSAGES, 8, 0x07, 0, 0x55);

        // Aligned differences already cancel the output XOR when init is
        // zero, so a zero hint recovers any xorout through the solver.
        let zero = DetectConfig {
            xorout_hint: Some(0),
            ..Default::default()
        };
        let result = Detector::new(zero).detect(&samples, 8).unwrap();
        assert!(result.is_verified());
        assert_eq!((result.poly, result.xorout), (0x07, 0x55));

        // A nonzero guess is folded into the differences twice, which moves
        // them off multiples of the generator for these samples.
        let exact = DetectConfig {
            xorout_hint: Some(0x55),
            ..Default::default()
        };
        assert!(!Detector::new(exact).detect(&samples, 8).unwrap().found);
    }

    #[test]
    fn test_top_bit_normalization_misses_low_generators() {
        let config = DetectConfig {
            normalization: Normalization::TopBit,
            ..Default::default()
        };
        let result = Detector::new(config).detect(&xmodem_samples(), 16).unwrap();
        assert_ne!(result.poly, 0x1021);
    }

    #[test]
    fn test_deterministic() {
        let samples = framed(MESSAGES, 16, 0x8005, 0, 0xffff);
        let first = detect(&samples, 16).unwrap();
        let second = detect(&samples, 16).unwrap();
        assert_eq!(first, second);

        let config = DetectConfig {
            parallel: false,
            ..Default::default()
        };
        let sequential = Detector::new(config)
            .with_presets(Catalogue::new())
            .detect(&samples, 16)
            .unwrap();
        assert_eq!(first, sequential);
    }

    #[test]
    fn test_progress_reaches_caller_and_cancels() {
        let detector = Detector::new(DetectConfig::default());

        let mut calls = 0u64;
        let mut count = |_: u64, _: u64| {
            calls += 1;
            ControlFlow::Continue(())
        };
        detector
            .detect_with_progress(&xmodem_samples(), 16, &mut count)
            .unwrap();
        assert_eq!(calls, 1024);

        let mut cancel = |_: u64, _: u64| ControlFlow::Break(());
        assert_eq!(
            detector.detect_with_progress(&xmodem_samples(), 16, &mut cancel),
            Err(DiscoveryError::Cancelled)
        );
    }

    // The checksum is right-aligned in its bytes, so the padding bits break
    // divisibility of the aligned differences.
    #[test_case(3, 0b011; "crc3")]
    #[test_case(5, 0x09; "crc5_epc")]
    #[test_case(7, 0x09; "crc7_mmc")]
    #[test_case(12, 0x80f; "crc12_dect")]
    fn test_sub_byte_widths_not_found(width: u8, poly: u64) {
        let samples = framed(MESSAGES, width, poly, 0, 0);
        let result = detect(&samples, width).unwrap();
        assert!(!result.found, "{result}");

        // The solver alone handles these widths.
        let solved = solve::solve_init_xorout(&samples, width, poly).unwrap();
        assert_eq!((solved.init, solved.xorout), (0, 0));
    }

    #[test]
    fn test_zero_candidate_cap_is_an_error() {
        let config = DetectConfig {
            max_candidates: 0,
            ..Default::default()
        };
        assert_eq!(
            Detector::new(config).detect(&xmodem_samples(), 16),
            Err(DiscoveryError::NoCandidateSlots)
        );

        let config = DetectConfig {
            max_candidates: 1,
            ..Default::default()
        };
        let result = Detector::new(config).detect(&xmodem_samples(), 16).unwrap();
        assert!(result.is_verified());
        assert_eq!(result.poly, 0x1021);
    }

    #[test]
    fn test_invalid_arguments_propagate() {
        assert!(matches!(
            detect(&xmodem_samples(), 65),
            Err(DiscoveryError::InvalidWidth { width: 65, .. })
        ));
        assert!(matches!(
            detect(&xmodem_samples()[..1], 16),
            Err(DiscoveryError::TooFewSamples(1))
        ));
        let short: [&[u8]; 2] = [&[0x01], &[0x02, 0x03]];
        assert!(matches!(
            detect(&short, 16),
            Err(DiscoveryError::SampleTooShort { index: 0, .. })
        ));
    }
}
