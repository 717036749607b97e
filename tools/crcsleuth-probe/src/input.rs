//! Sample and settings input for the probe.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use crcsleuth::DetectConfig;
use crcsleuth::sample::parse_hex;

/// Parse sample lines: one hex buffer per line, `#` starts a comment, blank
/// lines are skipped.
pub fn parse_sample_lines(text: &str) -> Result<Vec<Vec<u8>>> {
    let mut samples = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        let bytes = parse_hex(content).with_context(|| format!("line {}", number + 1))?;
        samples.push(bytes);
    }
    Ok(samples)
}

/// Read samples from `path` in the [`parse_sample_lines`] format.
pub fn read_sample_file(path: &Path) -> Result<Vec<Vec<u8>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read samples from {}", path.display()))?;
    parse_sample_lines(&text).with_context(|| format!("bad sample in {}", path.display()))
}

/// Parse samples given on the command line.
pub fn parse_sample_args(args: &[String]) -> Result<Vec<Vec<u8>>> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| parse_hex(arg).with_context(|| format!("sample argument {}", i + 1)))
        .collect()
}

/// Load detection settings from a JSON file. Missing fields keep their
/// defaults.
pub fn load_config(path: &Path) -> Result<DetectConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Parse a hex integer with optional `0x` prefix.
pub fn parse_hex_u64(text: &str) -> Result<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        bail!("empty hex value");
    }
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid hex value {text:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_sample_lines() {
        let text = "\
# XMODEM captures
31 32 20 b5
313233 9752   # trailing comment

0x31323334d789
";
        let samples = parse_sample_lines(text).unwrap();
        assert_eq!(
            samples,
            vec![
                vec![0x31, 0x32, 0x20, 0xb5],
                vec![0x31, 0x32, 0x33, 0x97, 0x52],
                vec![0x31, 0x32, 0x33, 0x34, 0xd7, 0x89],
            ]
        );
    }

    #[test]
    fn test_bad_line_is_reported() {
        let err = parse_sample_lines("3132\nzz\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2");
    }

    #[test]
    fn test_parse_sample_args() {
        let args = vec!["3132:20b5".to_string(), "0x313233 9752".to_string()];
        let samples = parse_sample_args(&args).unwrap();
        assert_eq!(samples[0], vec![0x31, 0x32, 0x20, 0xb5]);
        assert_eq!(samples[1].len(), 5);

        let err = parse_sample_args(&["123".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "sample argument 1");
    }

    #[test_case("ffff", 0xffff)]
    #[test_case("0x55", 0x55)]
    #[test_case("0XFFFFFFFF", 0xffff_ffff)]
    fn test_parse_hex_u64(text: &str, expected: u64) {
        assert_eq!(parse_hex_u64(text).unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("0x"; "prefix_only")]
    #[test_case("xyz"; "not_hex")]
    fn test_parse_hex_u64_rejects(text: &str) {
        assert!(parse_hex_u64(text).is_err());
    }
}
