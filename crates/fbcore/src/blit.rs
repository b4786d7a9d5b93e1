//! Bitmap compositing.
//!
//! Every blit clips to the destination (and never samples outside the
//! source), so any placement is safe: pixels that would land outside are
//! skipped. Only written pixels are converted; the rest of the destination
//! is left as is.

mod rotate;
mod scale;


use glam::IVec2;
use log::trace;

use crate::Pixel;
use crate::bitmap::Bitmap;
use crate::color::MASK_KEY;
use crate::format::PixelFormat;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BlitFlags: u32 {
        /// Skip source pixels equal to [`MASK_KEY`].
        const MASKED = 1 << 0;
        /// Add to the destination, saturating each channel.
        const ADDITIVE = 1 << 1;
        /// Read source columns right to left.
        const FLIP_X = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// The whole area of `bitmap`.
    pub fn of(bitmap: &Bitmap<'_>) -> Self {
        // Bitmap dimensions are bounded by i32::MAX.
        Self::new(0, 0, bitmap.width() as u32, bitmap.height() as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    /// Copy at the given top-left position.
    At(IVec2),
    /// Stretch the whole source into the rectangle.
    Scaled(Rect),
    /// Stretch a region of the source into the `dst` rectangle.
    ScaledRegion { src: Rect, dst: Rect },
    /// Rotate by `angle` radians (clockwise on screen) about the source
    /// midpoint, which lands on `center`.
    Rotated { center: IVec2, angle: f32 },
}

/// Per-pixel compositing shared by every transform.
struct Compositor {
    src: PixelFormat,
    dst: PixelFormat,
    key: Option<Pixel>,
    additive: bool,
}

impl Compositor {
    fn new(dst: &Bitmap<'_>, src: &Bitmap<'_>, flags: BlitFlags) -> Self {
        let key = flags
            .contains(BlitFlags::MASKED)
            .then(|| src.layout().from_reference(MASK_KEY));
        Self {
            src: src.layout(),
            dst: dst.layout(),
            key,
            additive: flags.contains(BlitFlags::ADDITIVE),
        }
    }

    #[inline]
    fn apply(&self, slot: &mut Pixel, pixel: Pixel) {
        if self.key == Some(pixel) {
            return;
        }
        let value = self.src.convert_to(&self.dst, pixel);
        *slot = if self.additive {
            self.dst.add_saturating(*slot, value)
        } else {
            value
        };
    }
}

/// Clip `len` cells placed at `pos` against an axis of `limit` cells.
///
/// Returns the first source cell, the first destination cell and the
/// number of cells that land inside.
fn clip_span(pos: i64, len: usize, limit: usize) -> (usize, usize, usize) {
    let start = pos.max(0);
    let end = (pos + len as i64).min(limit as i64);
    if end <= start {
        return (0, 0, 0);
    }
    ((start - pos) as usize, start as usize, (end - start) as usize)
}

fn blit_at(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, pos: IVec2, flags: BlitFlags) {
    let (src_x, dst_x, cols) = clip_span(pos.x.into(), src.width(), dst.width());
    let (src_y, dst_y, rows) = clip_span(pos.y.into(), src.height(), dst.height());
    if cols == 0 || rows == 0 {
        return;
    }
    trace!("blit {}x{} at {:?}, {:?}", cols, rows, pos, flags);

    let flip = flags.contains(BlitFlags::FLIP_X);
    let plain =
        !flags.intersects(BlitFlags::MASKED | BlitFlags::ADDITIVE) && src.layout() == dst.layout();
    let compositor = Compositor::new(dst, src, flags);
    let (src_w, dst_w) = (src.width(), dst.width());
    let src_pixels = src.pixels();
    let dst_pixels = dst.pixels_mut();

    for r in 0..rows {
        let src_row = &src_pixels[(src_y + r) * src_w..][..src_w];
        let dst_row = &mut dst_pixels[(dst_y + r) * dst_w + dst_x..][..cols];
        if flip {
            // Destination column c reads source column src_w - 1 - (src_x + c).
            let span = &src_row[src_w - src_x - cols..src_w - src_x];
            for (slot, &pixel) in dst_row.iter_mut().zip(span.iter().rev()) {
                if plain {
                    *slot = pixel;
                } else {
                    compositor.apply(slot, pixel);
                }
            }
        } else if plain {
            dst_row.copy_from_slice(&src_row[src_x..src_x + cols]);
        } else {
            for (slot, &pixel) in dst_row.iter_mut().zip(&src_row[src_x..src_x + cols]) {
                compositor.apply(slot, pixel);
            }
        }
    }
}

/// General form of every blit: one transform, any combination of flags.
pub fn blit_ex(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, transform: Transform, flags: BlitFlags) {
    if dst.is_released() || src.is_released() {
        return;
    }
    match transform {
        Transform::At(pos) => blit_at(dst, src, pos, flags),
        Transform::Scaled(rect) => scale::blit_region(dst, src, Rect::of(src), rect, flags),
        Transform::ScaledRegion { src: region, dst: rect } => {
            scale::blit_region(dst, src, region, rect, flags)
        }
        Transform::Rotated { center, angle } => {
            rotate::blit_rotated(dst, src, center, angle, flags)
        }
    }
}

/// Copy `src` with its top-left corner at `pos`. Rows are copied in bulk
/// when both bitmaps share a layout.
pub fn blit(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, pos: IVec2) {
    blit_ex(dst, src, Transform::At(pos), BlitFlags::empty());
}

/// Like [`blit`], skipping source pixels equal to [`MASK_KEY`].
pub fn blit_masked(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, pos: IVec2) {
    blit_ex(dst, src, Transform::At(pos), BlitFlags::MASKED);
}

/// Like [`blit`], adding source channels to the destination.
pub fn blit_add(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, pos: IVec2) {
    blit_ex(dst, src, Transform::At(pos), BlitFlags::ADDITIVE);
}

/// Like [`blit`], mirrored left to right.
pub fn blit_flipped(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, pos: IVec2) {
    blit_ex(dst, src, Transform::At(pos), BlitFlags::FLIP_X);
}

/// Stretch the whole source into `rect` (nearest neighbor).
pub fn blit_scaled(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, rect: Rect) {
    blit_ex(dst, src, Transform::Scaled(rect), BlitFlags::empty());
}

/// Stretch `region` of the source into `rect` (nearest neighbor).
pub fn blit_scaled_region(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, region: Rect, rect: Rect) {
    blit_ex(
        dst,
        src,
        Transform::ScaledRegion { src: region, dst: rect },
        BlitFlags::empty(),
    );
}

/// Rotate the source by `angle` radians about its midpoint and place that
/// midpoint on `center`.
pub fn blit_rotated(dst: &mut Bitmap<'_>, src: &Bitmap<'_>, center: IVec2, angle: f32) {
    blit_ex(
        dst,
        src,
        Transform::Rotated { center, angle },
        BlitFlags::empty(),
    );
}
