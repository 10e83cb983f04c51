// src/render/convert.rs
//! Pixel conversion and scaling into a BGRA window canvas.

use crate::render::backend::PixelRect;
use crate::render::frame::{FrameBuffer, PixelFormat};

pub const BYTES_PER_PIXEL: usize = 4;

/// BT.601 limited-range YUV to opaque BGRA, fixed point.
#[inline]
pub fn yuv_to_bgra(y: u8, u: u8, v: u8) -> [u8; 4] {
    let c = i32::from(y) - 16;
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;

    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;

    [clamp(b), clamp(g), clamp(r), 0xff]
}

#[inline]
fn clamp(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// BGRA value of the source pixel at (`x`, `y`).
#[inline]
fn sample(frame: &FrameBuffer, x: u32, y: u32) -> [u8; 4] {
    let width = frame.width() as usize;
    let (x, y) = (x as usize, y as usize);
    match frame.format() {
        PixelFormat::Bgra => {
            let at = (y * width + x) * BYTES_PER_PIXEL;
            let data = frame.data();
            [data[at], data[at + 1], data[at + 2], data[at + 3]]
        }
        PixelFormat::I420 => {
            let Some((luma, u, v)) = frame.i420_planes() else {
                return [0, 0, 0, 0xff];
            };
            let chroma_at = (y / 2) * frame.chroma_width() as usize + x / 2;
            yuv_to_bgra(luma[y * width + x], u[chroma_at], v[chroma_at])
        }
    }
}

/// Scales `frame` (nearest neighbour) into `rect` of a BGRA canvas that is
/// `canvas_width` pixels wide. `rect` must lie inside the canvas.
pub fn blit_scaled(frame: &FrameBuffer, canvas: &mut [u8], canvas_width: u32, rect: PixelRect) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (src_w, src_h) = (u64::from(frame.width()), u64::from(frame.height()));
    let stride = canvas_width as usize * BYTES_PER_PIXEL;

    for dy in 0..rect.height {
        let sy = (u64::from(dy) * src_h / u64::from(rect.height)) as u32;
        let row = (rect.y + dy) as usize * stride;
        for dx in 0..rect.width {
            let sx = (u64::from(dx) * src_w / u64::from(rect.width)) as u32;
            let at = row + (rect.x + dx) as usize * BYTES_PER_PIXEL;
            canvas[at..at + BYTES_PER_PIXEL].copy_from_slice(&sample(frame, sx, sy));
        }
    }
}
