//! Format registry and pixel conversion.
//!
//! The native framebuffer layout is not global state: it is held by a
//! [`Registry`] created at startup (usually from what the display device
//! reports) and handed to every bitmap constructor.

use log::debug;

use crate::Pixel;
use crate::format::{PixelFormat, PixelFormatId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    native: PixelFormat,
}

impl Registry {
    pub fn new(native: PixelFormat) -> Self {
        debug!("pixel registry created, native format {:?}", native);
        Self { native }
    }

    /// Replace the native layout for operations performed from now on.
    ///
    /// Bitmaps keep the layout they were created with.
    pub fn set_native(&mut self, native: PixelFormat) {
        debug!("native pixel format changed from {:?} to {:?}", self.native, native);
        self.native = native;
    }

    pub fn native(&self) -> PixelFormat {
        self.native
    }

    pub fn descriptor(&self, id: PixelFormatId) -> PixelFormat {
        id.builtin().unwrap_or(self.native)
    }

    pub fn to_reference(&self, id: PixelFormatId, pixel: Pixel) -> Pixel {
        self.descriptor(id).to_reference(pixel)
    }

    pub fn from_reference(&self, id: PixelFormatId, rgba: Pixel) -> Pixel {
        self.descriptor(id).from_reference(rgba)
    }

    /// Convert `pixel` from `src` to `dst`. Equal ids return it untouched.
    pub fn convert(&self, src: PixelFormatId, dst: PixelFormatId, pixel: Pixel) -> Pixel {
        if src == dst {
            return pixel;
        }
        self.from_reference(dst, self.to_reference(src, pixel))
    }

    /// Reference color in the native layout.
    pub fn pixel(&self, rgba: Pixel) -> Pixel {
        self.from_reference(PixelFormatId::Native, rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::rgba;

    const IDS: [PixelFormatId; 6] = [
        PixelFormatId::Native,
        PixelFormatId::Rgb16,
        PixelFormatId::Rgb24,
        PixelFormatId::Rgba32,
        PixelFormatId::Argb32,
        PixelFormatId::Abgr32,
    ];

    #[test]
    fn native_resolves_to_configured_layout() {
        let registry = Registry::new(PixelFormat::RGB16);
        assert_eq!(registry.descriptor(PixelFormatId::Native), PixelFormat::RGB16);
        assert_eq!(registry.descriptor(PixelFormatId::Rgb24), PixelFormat::RGB24);
        assert_eq!(registry.native(), PixelFormat::RGB16);
    }

    #[test]
    fn set_native_affects_later_conversions() {
        let mut registry = Registry::new(PixelFormat::ARGB32);
        let red = rgba(0xFF, 0, 0, 0xFF);
        assert_eq!(registry.pixel(red), 0xFFFF0000);
        registry.set_native(PixelFormat::RGB16);
        assert_eq!(registry.pixel(red), 0xF800);
    }

    #[test]
    fn registries_are_independent() {
        let a = Registry::new(PixelFormat::ARGB32);
        let b = Registry::new(PixelFormat::ABGR32);
        let color = rgba(1, 2, 3, 4);
        assert_eq!(a.pixel(color), 0x04010203);
        assert_eq!(b.pixel(color), 0x04030201);
    }

    #[test]
    fn convert_same_id_is_identity() {
        let registry = Registry::new(PixelFormat::RGB16);
        for id in IDS {
            for p in [0, u32::MAX, 0x12345678, 0xFFFF_0000] {
                assert_eq!(registry.convert(id, id, p), p);
            }
        }
    }

    #[test]
    fn convert_goes_through_reference() {
        let registry = Registry::new(PixelFormat::ARGB32);
        let p = registry.convert(PixelFormatId::Native, PixelFormatId::Abgr32, 0x80FF4000);
        assert_eq!(p, 0x800040FF);
        let p = registry.convert(PixelFormatId::Rgb16, PixelFormatId::Rgba32, 0xF800);
        assert_eq!(p, 0xFF0000FF);
    }

    #[test]
    fn native_and_explicit_twin_convert_alike() {
        let registry = Registry::new(PixelFormat::ARGB32);
        let p = 0x11223344;
        assert_eq!(
            registry.convert(PixelFormatId::Native, PixelFormatId::Rgb24, p),
            registry.convert(PixelFormatId::Argb32, PixelFormatId::Rgb24, p)
        );
    }

    #[test]
    fn round_trip_every_id() {
        let registry = Registry::new(PixelFormat::RGB16);
        for id in IDS {
            for p in [0, u32::MAX, 0x12345678, 0x00FF00FF, 0x7F7F7F7F] {
                let once = registry.from_reference(id, p);
                let again = registry.from_reference(id, registry.to_reference(id, once));
                assert_eq!(again, once);
            }
        }
    }
}
