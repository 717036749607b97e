//! Sample builders shared by unit tests.

use crate::gf2::width_mask;
use crate::sample::checksum_bytes;
use crate::solve::register_crc;

/// `message` followed by its big-endian checksum under the given model.
pub(crate) fn frame(message: &[u8], width: u8, poly: u64, init: u64, xorout: u64) -> Vec<u8> {
    let crc = (register_crc(message, init, poly, width) ^ xorout) & width_mask(width);
    let n = checksum_bytes(width);
    let mut out = message.to_vec();
    out.extend_from_slice(&crc.to_be_bytes()[8 - n..]);
    out
}

/// CRC-16/XMODEM over `"12"`, `"123"` and `"1234"`.
pub(crate) fn xmodem_samples() -> Vec<Vec<u8>> {
    [&b"12"[..], b"123", b"1234"]
        .iter()
        .map(|m| frame(m, 16, 0x1021, 0, 0))
        .collect()
}

#[test]
fn test_frame_appends_check_value() {
    assert_eq!(
        frame(b"123456789", 16, 0x1021, 0xffff, 0),
        b"123456789\x29\xb1".to_vec()
    );
}
