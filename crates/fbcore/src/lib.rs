//! Software bitmaps over packed pixel formats.
//!
//! [`PixelFormat`]s describe packed layouts and convert single pixels
//! through the `0xRRGGBBAA` reference layout. [`Bitmap`]s hold pixels in
//! one layout, and the [`blit`] family composites them onto one another:
//! plain, scaled, region-scaled, masked, additive, flipped and rotated.
//!
//! The native framebuffer layout lives in a [`Registry`] created at
//! startup:
//!
//! ```
//! use fbcore::{Bitmap, IVec2, PixelFormat, Registry, color};
//!
//! let registry = Registry::new(PixelFormat::ARGB32);
//! let mut screen = Bitmap::new(&registry, 320, 240).unwrap();
//! let mut sprite = Bitmap::new(&registry, 16, 16).unwrap();
//! sprite.clear(color::rgb(0xFF, 0x80, 0x00));
//!
//! screen.clear(color::rgb(0, 0, 0));
//! fbcore::blit(&mut screen, &sprite, IVec2::new(10, 10));
//! assert_eq!(screen.pixel(10, 10), 0xFFFF8000);
//! ```

#![no_std]

extern crate alloc;

pub mod bitmap;
pub mod blit;
pub mod color;
pub mod format;
pub mod registry;

pub use bitmap::{Bitmap, BitmapError};
pub use blit::{
    BlitFlags, Rect, Transform, blit, blit_add, blit_ex, blit_flipped, blit_masked, blit_rotated,
    blit_scaled, blit_scaled_region,
};
pub use format::{Channel, FormatError, PixelFormat, PixelFormatId};
pub use glam::IVec2;
pub use registry::Registry;

/// A packed pixel value; its meaning depends on the layout it is stored in.
pub type Pixel = u32;
