//! GF(2) polynomial arithmetic underlying every CRC computation.
//!
//! Bit strings are read MSB-first: bit 7 of byte 0 is the highest-order
//! coefficient of the dividend. A generator of width `w` is stored as its low
//! `w` coefficients; the `x^w` term is implicit.

/// Mask selecting the low `width` bits.
#[inline]
pub const fn width_mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reverse the low `bits` bits of `value`. Higher bits are discarded;
/// `bits` above 64 reverse all 64.
#[inline]
pub const fn reflect(value: u64, bits: u8) -> u64 {
    if bits == 0 {
        return 0;
    }
    let bits = if bits > 64 { 64 } else { bits };
    value.reverse_bits() >> (64 - bits as u32)
}

/// Remainder of a bit string divided by `x^width + divisor`.
///
/// This is the bare CRC: no initial value, no output XOR. Only the first
/// `bit_count` bits of `dividend` are consumed. Total for `width` in
/// `1..=64`; the caller validates the width.
///
/// The register keeps `width` bits and carries the bit that would occupy
/// position `width` out of the top before reducing, so `width == 64` needs
/// no wider integer.
pub fn crc_remainder(dividend: &[u8], bit_count: usize, divisor: u64, width: u8) -> u64 {
    debug_assert!((1..=64).contains(&width));
    debug_assert!(bit_count <= dividend.len() * 8);

    let mask = width_mask(width);
    let top = 1u64 << (width - 1);
    let divisor = divisor & mask;

    let mut rem = 0u64;
    for i in 0..bit_count {
        let bit = u64::from((dividend[i / 8] >> (7 - i % 8)) & 1);
        let carry = rem & top != 0;
        rem = ((rem << 1) & mask) | bit;
        if carry {
            rem ^= divisor;
        }
    }

    rem
}

/// Run division backwards in the reflected domain.
///
/// Both `remainder` (over `remainder_bits`) and `generator` (over `width`) are
/// reflected to LSB-first order. Each of the `remainder_bits` steps clears bit
/// 0 by XORing `1 | (generator_rev << 1)` when it is set, then shifts right.
/// The surviving register is reflected back over `width`.
///
/// With `remainder_bits == width` and an odd generator the result equals
/// `remainder * x^width mod G`, i.e. the remainder of `remainder` followed by
/// `width` zero bits.
///
/// No search path calls this; it is kept for remainder recovery and
/// reflected-CRC work. Total for `width` in `1..64`; `remainder_bits` is
/// capped at 64.
pub fn poly_inverse_step(remainder: u64, remainder_bits: u8, generator: u64, width: u8) -> u64 {
    debug_assert!((1..64).contains(&width));
    let remainder_bits = remainder_bits.min(64);

    let generator_rev = reflect(generator, width);
    let feedback = 1 | (generator_rev << 1);

    let mut reg = reflect(remainder, remainder_bits);
    for _ in 0..remainder_bits {
        if reg & 1 != 0 {
            reg ^= feedback;
        }
        reg >>= 1;
    }

    reflect(reg, width)
}
