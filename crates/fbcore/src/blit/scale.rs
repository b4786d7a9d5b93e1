//! Nearest-neighbor stretching.

use log::trace;

use super::{BlitFlags, Compositor, Rect, clip_span};
use crate::bitmap::Bitmap;

/// Source cell sampled by cell `rel` of a `span` wide destination span.
///
/// `start`/`len` is the sampled source range, `limit` the source size on
/// this axis; samples falling outside the source are `None`.
fn sample(rel: usize, span: u32, start: i32, len: u32, flip: bool, limit: usize) -> Option<usize> {
    let last = i64::from(len) - 1;
    // Both factors are below 2^32 in any blit.
    let exact = rel as u64 * u64::from(len) / u64::from(span);
    let mut offset = (exact as i64).min(last);
    if flip {
        offset = last - offset;
    }
    let cell = i64::from(start) + offset;
    (0..limit as i64).contains(&cell).then_some(cell as usize)
}

/// Stretch `region` of `src` over `rect` of `dst`.
pub(super) fn blit_region(
    dst: &mut Bitmap<'_>,
    src: &Bitmap<'_>,
    region: Rect,
    rect: Rect,
    flags: BlitFlags,
) {
    if region.is_empty() || rect.is_empty() {
        return;
    }
    let (rel_x, dst_x, cols) = clip_span(rect.x.into(), rect.w as usize, dst.width());
    let (rel_y, dst_y, rows) = clip_span(rect.y.into(), rect.h as usize, dst.height());
    if cols == 0 || rows == 0 {
        return;
    }
    trace!("scaled blit {:?} -> {:?}, {:?}", region, rect, flags);

    let flip = flags.contains(BlitFlags::FLIP_X);
    let compositor = Compositor::new(dst, src, flags);
    let (src_w, src_h, dst_w) = (src.width(), src.height(), dst.width());
    let src_pixels = src.pixels();
    let dst_pixels = dst.pixels_mut();

    for r in 0..rows {
        let Some(sy) = sample(rel_y + r, rect.h, region.y, region.h, false, src_h) else {
            continue;
        };
        let src_row = &src_pixels[sy * src_w..][..src_w];
        let dst_row = &mut dst_pixels[(dst_y + r) * dst_w + dst_x..][..cols];
        for (c, slot) in dst_row.iter_mut().enumerate() {
            if let Some(sx) = sample(rel_x + c, rect.w, region.x, region.w, flip, src_w) {
                compositor.apply(slot, src_row[sx]);
            }
        }
    }
}
