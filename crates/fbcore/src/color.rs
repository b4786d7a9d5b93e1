//! Reference pixel helpers.
//!
//! Every conversion goes through the reference layout: 8 bits per channel,
//! red in the highest byte, alpha in the lowest (`0xRRGGBBAA`).

use crate::Pixel;

/// Reference color treated as transparent by masked blits.
pub const MASK_KEY: Pixel = 0x00FF00FF;

pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Pixel {
    u32::from_be_bytes([r, g, b, a])
}

/// Opaque reference color.
pub const fn rgb(r: u8, g: u8, b: u8) -> Pixel {
    rgba(r, g, b, 0xFF)
}

pub const fn de_rgba(color: Pixel) -> (u8, u8, u8, u8) {
    let [r, g, b, a] = color.to_be_bytes();
    (r, g, b, a)
}

/// All-ones mask of `bits` width (`bits` may be 0..=32).
pub const fn bit_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Rescale a channel value from `from_bits` to `to_bits` of depth,
/// rounding to the nearest representable value.
///
/// An absent source channel (`from_bits == 0`) reads as the full value of
/// the target depth; an absent target channel yields 0.
pub const fn rescale(value: u32, from_bits: u32, to_bits: u32) -> u32 {
    if to_bits == 0 {
        return 0;
    }
    let to_max = bit_mask(to_bits);
    if from_bits == 0 {
        return to_max;
    }
    let from_max = bit_mask(from_bits);
    let value = value & from_max;
    if from_bits == to_bits {
        return value;
    }
    let (value, from_max, to_max) = (value as u64, from_max as u64, to_max as u64);
    ((value * to_max + from_max / 2) / from_max) as u32
}
