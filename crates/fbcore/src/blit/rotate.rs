//! Rotation by inverse mapping.
//!
//! Destination pixels inside the rotated bounding box are mapped back into
//! the source; those that land outside it are left untouched.

use glam::{IVec2, Mat2, Vec2};
use log::trace;

use super::{BlitFlags, Compositor};
use crate::bitmap::Bitmap;

const SNAP: f32 = 1e-6;

/// Rotation by `angle`, with components within [`SNAP`] of 0 or ±1 made
/// exact, so quarter turns map pixel centers onto pixel centers.
fn rotation(angle: f32) -> Mat2 {
    let snap = |c: f32| {
        if c > -SNAP && c < SNAP {
            0.0
        } else if c > 1.0 - SNAP {
            1.0
        } else if c < SNAP - 1.0 {
            -1.0
        } else {
            c
        }
    };
    let m = Mat2::from_angle(angle);
    Mat2::from_cols(
        Vec2::new(snap(m.x_axis.x), snap(m.x_axis.y)),
        Vec2::new(snap(m.y_axis.x), snap(m.y_axis.y)),
    )
}

/// Axis-aligned box around the source rotated about `center`, as
/// `[min, max)` destination coordinates, rounded outward.
fn bounding_box(size: Vec2, center: Vec2, rotation: Mat2) -> (IVec2, IVec2) {
    // x_axis is (cos, sin) of the angle.
    let trig = rotation.x_axis.abs();
    let half = Vec2::new(
        trig.x * size.x + trig.y * size.y,
        trig.y * size.x + trig.x * size.y,
    ) * 0.5;
    (
        (center - half).floor().as_ivec2(),
        (center + half).ceil().as_ivec2(),
    )
}

pub(super) fn blit_rotated(
    dst: &mut Bitmap<'_>,
    src: &Bitmap<'_>,
    center: IVec2,
    angle: f32,
    flags: BlitFlags,
) {
    let (src_w, src_h, dst_w) = (src.width(), src.height(), dst.width());
    if src_w == 0 || src_h == 0 {
        return;
    }
    let size = Vec2::new(src_w as f32, src_h as f32);
    let origin = center.as_vec2();
    let (lo, hi) = bounding_box(size, origin, rotation(angle));

    let x0 = i64::from(lo.x).max(0);
    let y0 = i64::from(lo.y).max(0);
    let x1 = i64::from(hi.x).min(dst_w as i64);
    let y1 = i64::from(hi.y).min(dst.height() as i64);
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    trace!("rotated blit at {:?} by {}, {:?}", center, angle, flags);

    let inverse = rotation(-angle);
    let half = size * 0.5;
    let flip = flags.contains(BlitFlags::FLIP_X);
    let compositor = Compositor::new(dst, src, flags);
    let src_pixels = src.pixels();
    let dst_pixels = dst.pixels_mut();

    for dy in y0..y1 {
        let dy = dy as usize;
        let dst_row = &mut dst_pixels[dy * dst_w..][..dst_w];
        for dx in x0 as usize..x1 as usize {
            let offset = Vec2::new(dx as f32 + 0.5, dy as f32 + 0.5) - origin;
            let at = (inverse * offset + half).floor();
            if at.x < 0.0 || at.y < 0.0 || at.x >= size.x || at.y >= size.y {
                continue;
            }
            let (mut sx, sy) = (at.x as usize, at.y as usize);
            if flip {
                sx = src_w - 1 - sx;
            }
            compositor.apply(&mut dst_row[dx], src_pixels[sy * src_w + sx]);
        }
    }
}
