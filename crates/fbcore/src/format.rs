//! Packed pixel layouts.
//!
//! A [`PixelFormat`] describes where each color channel lives inside a
//! [`Pixel`] word. Conversions between layouts always go through the
//! reference layout ([`PixelFormat::RGBA32`]).

use core::fmt;

use crate::Pixel;
use crate::color::{bit_mask, rescale};

/// Identifier of a supported layout.
///
/// [`Native`](PixelFormatId::Native) is an indirection resolved by a
/// [`Registry`](crate::Registry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormatId {
    Native,
    Rgb16,
    Rgb24,
    Rgba32,
    Argb32,
    Abgr32,
}

impl PixelFormatId {
    /// Fixed layout of this id, `None` for [`Native`](PixelFormatId::Native).
    pub const fn builtin(self) -> Option<PixelFormat> {
        match self {
            Self::Native => None,
            Self::Rgb16 => Some(PixelFormat::RGB16),
            Self::Rgb24 => Some(PixelFormat::RGB24),
            Self::Rgba32 => Some(PixelFormat::RGBA32),
            Self::Argb32 => Some(PixelFormat::ARGB32),
            Self::Abgr32 => Some(PixelFormat::ABGR32),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Alpha = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Self::Red, Self::Green, Self::Blue, Self::Alpha];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
            Self::Alpha => write!(f, "alpha"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatError {
    BppTooLarge(u32),
    ChannelOutOfRange(Channel),
    ChannelOverlap(Channel, Channel),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BppTooLarge(bpp) => write!(f, "{} bits per pixel do not fit in a pixel word", bpp),
            Self::ChannelOutOfRange(c) => write!(f, "{} channel does not fit in bits per pixel", c),
            Self::ChannelOverlap(a, b) => write!(f, "{} and {} channels overlap", a, b),
        }
    }
}

impl core::error::Error for FormatError {}

/// Bit layout of a packed pixel: total size, and offset/width of each
/// channel indexed by [`Channel`]. A width of 0 marks an absent channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    bpp: u32,
    offsets: [u32; 4],
    sizes: [u32; 4],
}

impl PixelFormat {
    pub const RGB16: Self = Self::layout(16, [11, 5, 0, 0], [5, 6, 5, 0]);
    pub const RGB24: Self = Self::layout(24, [16, 8, 0, 0], [8, 8, 8, 0]);
    /// The reference layout.
    pub const RGBA32: Self = Self::layout(32, [24, 16, 8, 0], [8, 8, 8, 8]);
    pub const ARGB32: Self = Self::layout(32, [16, 8, 0, 24], [8, 8, 8, 8]);
    pub const ABGR32: Self = Self::layout(32, [0, 8, 16, 24], [8, 8, 8, 8]);

    const fn layout(bpp: u32, offsets: [u32; 4], sizes: [u32; 4]) -> Self {
        Self { bpp, offsets, sizes }
    }

    /// Build a layout from per-channel offsets and widths, in
    /// [`Channel`] order.
    ///
    /// # Errors
    ///
    /// Fails if `bpp` exceeds a pixel word, a present channel does not fit
    /// in `bpp`, or two present channels share a bit.
    pub fn new(bpp: u32, offsets: [u32; 4], sizes: [u32; 4]) -> Result<Self, FormatError> {
        if bpp > Pixel::BITS {
            return Err(FormatError::BppTooLarge(bpp));
        }
        let format = Self::layout(bpp, offsets, sizes);
        for channel in Channel::ALL {
            let end = format.offset(channel).checked_add(format.size(channel));
            if format.size(channel) > 0 && end.is_none_or(|end| end > bpp) {
                return Err(FormatError::ChannelOutOfRange(channel));
            }
        }
        for (i, &a) in Channel::ALL.iter().enumerate() {
            for &b in &Channel::ALL[i + 1..] {
                if format.bits(a) & format.bits(b) != 0 {
                    return Err(FormatError::ChannelOverlap(a, b));
                }
            }
        }
        Ok(format)
    }

    #[inline]
    pub const fn bpp(&self) -> u32 {
        self.bpp
    }

    pub const fn bytes_per_pixel(&self) -> u32 {
        self.bpp.div_ceil(8)
    }

    #[inline]
    pub const fn offset(&self, channel: Channel) -> u32 {
        self.offsets[channel as usize]
    }

    #[inline]
    pub const fn size(&self, channel: Channel) -> u32 {
        self.sizes[channel as usize]
    }

    #[inline]
    pub const fn has(&self, channel: Channel) -> bool {
        self.size(channel) > 0
    }

    /// Largest value the channel can hold (0 when absent).
    #[inline]
    pub const fn max(&self, channel: Channel) -> u32 {
        bit_mask(self.size(channel))
    }

    /// Bits occupied by the channel inside the packed word.
    pub const fn bits(&self, channel: Channel) -> Pixel {
        if !self.has(channel) {
            return 0;
        }
        self.max(channel) << self.offset(channel)
    }

    /// Channel value of a packed pixel, masked to the channel width.
    #[inline]
    pub const fn get(&self, pixel: Pixel, channel: Channel) -> u32 {
        if !self.has(channel) {
            return 0;
        }
        (pixel >> self.offset(channel)) & self.max(channel)
    }

    /// Place a channel value (masked to the channel width) at its offset.
    #[inline]
    const fn place(&self, value: u32, channel: Channel) -> Pixel {
        if !self.has(channel) {
            return 0;
        }
        (value & self.max(channel)) << self.offset(channel)
    }

    /// Convert a pixel of this layout to the reference layout.
    pub fn to_reference(&self, pixel: Pixel) -> Pixel {
        Channel::ALL.iter().fold(0, |out, &channel| {
            let value = rescale(self.get(pixel, channel), self.size(channel), 8);
            out | Self::RGBA32.place(value, channel)
        })
    }

    /// Convert a reference pixel to this layout.
    pub fn from_reference(&self, rgba: Pixel) -> Pixel {
        Channel::ALL.iter().fold(0, |out, &channel| {
            let value = rescale(Self::RGBA32.get(rgba, channel), 8, self.size(channel));
            out | self.place(value, channel)
        })
    }

    /// Convert a pixel of this layout to `target`.
    #[inline]
    pub fn convert_to(&self, target: &PixelFormat, pixel: Pixel) -> Pixel {
        if self == target {
            return pixel;
        }
        target.from_reference(self.to_reference(pixel))
    }

    /// Channel-wise sum of two pixels of this layout, each channel clamped
    /// to its maximum.
    pub fn add_saturating(&self, a: Pixel, b: Pixel) -> Pixel {
        Channel::ALL.iter().fold(0, |out, &channel| {
            let sum = self.get(a, channel).saturating_add(self.get(b, channel));
            out | self.place(sum.min(self.max(channel)), channel)
        })
    }
}
