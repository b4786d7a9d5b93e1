//! Pixel buffers.
//!
//! A [`Bitmap`] is a `width * height` row-major array of [`Pixel`]s with no
//! row padding, tagged with the layout its values are stored in. Memory is
//! either owned (allocated by the bitmap, freed when released or dropped)
//! or borrowed from the caller (never freed by the bitmap).

use alloc::vec::Vec;
use core::fmt;
use core::mem::size_of;

use log::trace;

use crate::Pixel;
use crate::format::{PixelFormat, PixelFormatId};
use crate::registry::Registry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitmapError {
    AllocFailed,
    InvalidDimensions,
    InsufficientData,
    Misaligned,
}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AllocFailed => write!(f, "cannot allocate bitmap memory"),
            Self::InvalidDimensions => write!(f, "bitmap dimensions overflow"),
            Self::InsufficientData => write!(f, "buffer is too small for the bitmap dimensions"),
            Self::Misaligned => write!(f, "buffer is not aligned for pixel access"),
        }
    }
}

impl core::error::Error for BitmapError {}

enum Storage<'a> {
    Owned(Vec<Pixel>),
    Borrowed(&'a mut [Pixel]),
    Released,
}

pub struct Bitmap<'a> {
    width: usize,
    height: usize,
    format: PixelFormatId,
    layout: PixelFormat,
    storage: Storage<'a>,
}

fn pixel_count(width: usize, height: usize) -> Result<usize, BitmapError> {
    // Blit clipping works in i64 on coordinates that fit an i32.
    let limit = i32::MAX as usize;
    if width > limit || height > limit {
        return Err(BitmapError::InvalidDimensions);
    }
    width
        .checked_mul(height)
        .ok_or(BitmapError::InvalidDimensions)
}

impl Bitmap<'static> {
    /// Allocate a zeroed bitmap in the native format.
    pub fn new(registry: &Registry, width: usize, height: usize) -> Result<Self, BitmapError> {
        Self::with_format(registry, PixelFormatId::Native, width, height)
    }

    /// Allocate a zeroed bitmap in `format`.
    pub fn with_format(
        registry: &Registry,
        format: PixelFormatId,
        width: usize,
        height: usize,
    ) -> Result<Self, BitmapError> {
        let len = pixel_count(width, height)?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| BitmapError::AllocFailed)?;
        pixels.resize(len, 0);
        trace!("allocated {}x{} {:?} bitmap", width, height, format);
        Ok(Self {
            width,
            height,
            format,
            layout: registry.descriptor(format),
            storage: Storage::Owned(pixels),
        })
    }
}

impl<'a> Bitmap<'a> {
    /// Wrap caller memory as a native-format bitmap.
    ///
    /// Only the first `width * height` pixels are used. The memory is
    /// never freed by the bitmap.
    pub fn from_slice(
        registry: &Registry,
        width: usize,
        height: usize,
        pixels: &'a mut [Pixel],
    ) -> Result<Self, BitmapError> {
        let len = pixel_count(width, height)?;
        let pixels = pixels
            .get_mut(..len)
            .ok_or(BitmapError::InsufficientData)?;
        Ok(Self {
            width,
            height,
            format: PixelFormatId::Native,
            layout: registry.native(),
            storage: Storage::Borrowed(pixels),
        })
    }

    /// Wrap a raw byte buffer, such as a mapped framebuffer.
    pub fn from_bytes(
        registry: &Registry,
        width: usize,
        height: usize,
        bytes: &'a mut [u8],
    ) -> Result<Self, BitmapError> {
        let byte_len = pixel_count(width, height)?
            .checked_mul(size_of::<Pixel>())
            .ok_or(BitmapError::InvalidDimensions)?;
        let bytes = bytes
            .get_mut(..byte_len)
            .ok_or(BitmapError::InsufficientData)?;
        let pixels = bytemuck::try_cast_slice_mut(bytes).map_err(|_| BitmapError::Misaligned)?;
        Self::from_slice(registry, width, height, pixels)
    }

    /// Free owned memory and detach borrowed memory. Safe to call more
    /// than once; the bitmap has no pixels afterwards.
    pub fn release(&mut self) {
        match core::mem::replace(&mut self.storage, Storage::Released) {
            Storage::Owned(pixels) => {
                trace!("released {}x{} bitmap", self.width, self.height);
                drop(pixels);
            }
            Storage::Borrowed(_) | Storage::Released => {}
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self.storage, Storage::Released)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormatId {
        self.format
    }

    /// Concrete layout of the stored pixels, resolved at creation.
    #[inline]
    pub fn layout(&self) -> PixelFormat {
        self.layout
    }

    pub fn pixels(&self) -> &[Pixel] {
        match &self.storage {
            Storage::Owned(pixels) => pixels.as_slice(),
            Storage::Borrowed(pixels) => &**pixels,
            Storage::Released => &[],
        }
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        match &mut self.storage {
            Storage::Owned(pixels) => pixels.as_mut_slice(),
            Storage::Borrowed(pixels) => &mut **pixels,
            Storage::Released => &mut [],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels())
    }

    pub fn row(&self, y: usize) -> &[Pixel] {
        let width = self.width;
        &self.pixels()[y * width..][..width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [Pixel] {
        let width = self.width;
        &mut self.pixels_mut()[y * width..][..width]
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        y * self.width + x
    }

    /// Stored pixel slot. Coordinates must be in bounds.
    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut Pixel {
        let index = self.index(x, y);
        &mut self.pixels_mut()[index]
    }

    /// Stored (already formatted) pixel. Coordinates must be in bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels()[self.index(x, y)]
    }

    /// Store a reference color, converting it on every call.
    pub fn put_pixel(&mut self, x: usize, y: usize, rgba: Pixel) {
        let value = self.layout.from_reference(rgba);
        *self.pixel_mut(x, y) = value;
    }

    /// Add a reference color to the stored pixel, saturating each channel
    /// at the bitmap layout's maximum.
    pub fn put_pixel_add(&mut self, x: usize, y: usize, rgba: Pixel) {
        let layout = self.layout;
        let value = layout.from_reference(rgba);
        let slot = self.pixel_mut(x, y);
        *slot = layout.add_saturating(*slot, value);
    }

    pub fn clear(&mut self, rgba: Pixel) {
        let value = self.layout.from_reference(rgba);
        self.pixels_mut().fill(value);
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Size of the pixel memory in bytes.
    pub fn mem_size(&self) -> usize {
        self.width * self.height * size_of::<Pixel>()
    }

    /// Size of one row in bytes.
    pub fn line_size(&self) -> usize {
        self.width * size_of::<Pixel>()
    }
}

impl fmt::Debug for Bitmap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match self.storage {
            Storage::Owned(_) => "owned",
            Storage::Borrowed(_) => "borrowed",
            Storage::Released => "released",
        };
        write!(
            f,
            "Bitmap({}x{}, {:?}, {})",
            self.width, self.height, self.format, storage
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;
    use crate::color::rgba;

    fn registry() -> Registry {
        Registry::new(PixelFormat::ARGB32)
    }

    #[test]
    fn new_is_zeroed_native_and_owned() {
        let bmp = Bitmap::new(&registry(), 3, 2).unwrap();
        assert_eq!(bmp.width(), 3);
        assert_eq!(bmp.height(), 2);
        assert_eq!(bmp.format(), PixelFormatId::Native);
        assert_eq!(bmp.layout(), PixelFormat::ARGB32);
        assert!(bmp.is_owned());
        assert_eq!(bmp.pixels(), &[0; 6]);
    }

    #[test]
    fn with_format_resolves_layout() {
        let bmp = Bitmap::with_format(&registry(), PixelFormatId::Rgb16, 2, 2).unwrap();
        assert_eq!(bmp.format(), PixelFormatId::Rgb16);
        assert_eq!(bmp.layout(), PixelFormat::RGB16);
    }

    #[test]
    fn empty_bitmaps_are_allowed() {
        let bmp = Bitmap::new(&registry(), 0, 7).unwrap();
        assert_eq!(bmp.pixels().len(), 0);
        assert_eq!(bmp.mem_size(), 0);
    }

    #[test]
    fn overflowing_dimensions_fail() {
        let err = Bitmap::new(&registry(), usize::MAX, 2).unwrap_err();
        assert_eq!(err, BitmapError::InvalidDimensions);
        let err = Bitmap::new(&registry(), 1 << 31, 1 << 31).unwrap_err();
        assert_eq!(err, BitmapError::InvalidDimensions);
    }

    #[test]
    fn huge_allocation_reports_failure() {
        let err = Bitmap::new(&registry(), i32::MAX as usize, i32::MAX as usize).unwrap_err();
        assert_eq!(err, BitmapError::AllocFailed);
    }

    #[test]
    fn layout_is_captured_at_creation() {
        let mut registry = registry();
        let bmp = Bitmap::new(&registry, 1, 1).unwrap();
        registry.set_native(PixelFormat::RGB16);
        assert_eq!(bmp.layout(), PixelFormat::ARGB32);
        let later = Bitmap::new(&registry, 1, 1).unwrap();
        assert_eq!(later.layout(), PixelFormat::RGB16);
    }

    #[test]
    fn mem_and_line_size() {
        let bmp = Bitmap::new(&registry(), 10, 5).unwrap();
        assert_eq!(bmp.mem_size(), 50 * size_of::<Pixel>());
        assert_eq!(bmp.line_size(), 10 * size_of::<Pixel>());
    }

    #[test]
    fn put_pixel_converts_to_layout() {
        let mut bmp = Bitmap::with_format(&registry(), PixelFormatId::Rgb16, 2, 2).unwrap();
        bmp.put_pixel(1, 0, rgba(0xFF, 0, 0, 0xFF));
        assert_eq!(bmp.pixel(1, 0), 0xF800);
        assert_eq!(bmp.pixel(0, 0), 0);
        assert_eq!(bmp.row(0), &[0, 0xF800]);
    }

    #[test]
    fn pixel_mut_writes_raw_values() {
        let mut bmp = Bitmap::new(&registry(), 2, 2).unwrap();
        *bmp.pixel_mut(0, 1) = 0xDEADBEEF;
        assert_eq!(bmp.pixel(0, 1), 0xDEADBEEF);
        assert_eq!(bmp.pixels(), &[0, 0, 0xDEADBEEF, 0]);
    }

    #[test]
    fn row_mut_addresses_one_row() {
        let mut bmp = Bitmap::new(&registry(), 3, 3).unwrap();
        bmp.row_mut(1).copy_from_slice(&[1, 2, 3]);
        assert_eq!(bmp.row_mut(1).len(), 3);
        assert_eq!(bmp.pixels(), &[0, 0, 0, 1, 2, 3, 0, 0, 0]);
        assert_eq!(bmp.row(1), &[1, 2, 3]);
    }

    #[test]
    fn put_pixel_add_saturates_in_bitmap_layout() {
        let mut bmp = Bitmap::with_format(&registry(), PixelFormatId::Rgb16, 1, 1).unwrap();
        bmp.put_pixel(0, 0, rgba(0xF0, 0x10, 0, 0xFF));
        bmp.put_pixel_add(0, 0, rgba(0x80, 0x10, 0x08, 0xFF));
        let layout = PixelFormat::RGB16;
        let p = bmp.pixel(0, 0);
        assert_eq!(layout.get(p, crate::Channel::Red), 31);
        assert_eq!(layout.get(p, crate::Channel::Green), 8);
        assert_eq!(layout.get(p, crate::Channel::Blue), 1);
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut bmp = Bitmap::new(&registry(), 4, 3).unwrap();
        bmp.clear(rgba(1, 2, 3, 4));
        assert!(bmp.pixels().iter().all(|&p| p == 0x04010203));
    }

    #[test]
    fn contains_checks_both_axes() {
        let bmp = Bitmap::new(&registry(), 4, 3).unwrap();
        assert!(bmp.contains(0, 0));
        assert!(bmp.contains(3, 2));
        assert!(!bmp.contains(4, 0));
        assert!(!bmp.contains(0, 3));
        assert!(!bmp.contains(-1, 1));
        assert!(!bmp.contains(1, -1));
    }

    #[test]
    fn release_is_idempotent() {
        let mut bmp = Bitmap::new(&registry(), 4, 4).unwrap();
        bmp.release();
        assert!(bmp.is_released());
        assert!(!bmp.is_owned());
        assert!(bmp.pixels().is_empty());
        bmp.release();
        assert!(bmp.is_released());
        assert_eq!(bmp.width(), 4);
    }

    #[test]
    fn borrowed_memory_survives_release() {
        let mut memory = vec![0u32; 6];
        {
            let mut bmp = Bitmap::from_slice(&registry(), 3, 2, &mut memory).unwrap();
            assert!(!bmp.is_owned());
            bmp.clear(rgba(0xFF, 0xFF, 0xFF, 0xFF));
            bmp.release();
            bmp.release();
        }
        assert!(memory.iter().all(|&p| p == 0xFFFFFFFF));
        memory[0] = 7;
        assert_eq!(memory[0], 7);
    }

    #[test]
    fn borrowed_slice_must_cover_dimensions() {
        let mut memory = [0u32; 5];
        let err = Bitmap::from_slice(&registry(), 3, 2, &mut memory).unwrap_err();
        assert_eq!(err, BitmapError::InsufficientData);
    }

    #[test]
    fn borrowed_slice_is_truncated() {
        let mut memory = [0u32; 10];
        let mut bmp = Bitmap::from_slice(&registry(), 2, 2, &mut memory).unwrap();
        bmp.clear(rgba(0, 0, 0, 0xFF));
        drop(bmp);
        assert_eq!(memory[..4], [0xFF000000; 4]);
        assert_eq!(memory[4..], [0; 6]);
    }

    #[test]
    fn from_bytes_wraps_framebuffer_memory() {
        let mut memory = vec![0u32; 4];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(memory.as_mut_slice());
        let mut bmp = Bitmap::from_bytes(&registry(), 2, 2, bytes).unwrap();
        bmp.put_pixel(1, 1, rgba(0xAA, 0xBB, 0xCC, 0xDD));
        assert_eq!(bmp.as_bytes().len(), 16);
        drop(bmp);
        assert_eq!(memory[3], 0xDDAABBCC);
    }

    #[test]
    fn from_bytes_rejects_short_or_misaligned_buffers() {
        let mut memory = vec![0u32; 5];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(memory.as_mut_slice());
        let err = Bitmap::from_bytes(&registry(), 2, 2, &mut bytes[..15]).unwrap_err();
        assert_eq!(err, BitmapError::InsufficientData);
        let err = Bitmap::from_bytes(&registry(), 2, 2, &mut bytes[1..]).unwrap_err();
        assert_eq!(err, BitmapError::Misaligned);
    }

    #[test]
    fn debug_and_display() {
        let bmp = Bitmap::new(&registry(), 2, 3).unwrap();
        assert_eq!(alloc::format!("{:?}", bmp), "Bitmap(2x3, Native, owned)");
        assert_eq!(
            BitmapError::AllocFailed.to_string(),
            "cannot allocate bitmap memory"
        );
    }
}
