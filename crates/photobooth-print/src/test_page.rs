// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generated test page for `POST /api/print/test`: a blank photo strip with a
// border and one grey box per frame, enough to check alignment and margins.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use photobooth_core::error::{PhotoboothError, Result};

/// Strip width in pixels (2 inches at 300 dpi).
pub const STRIP_WIDTH: u32 = 600;
/// Strip height in pixels (6 inches at 300 dpi).
pub const STRIP_HEIGHT: u32 = 1800;

const BORDER: u32 = 12;
const MARGIN: u32 = 40;
const FRAME_GAP: u32 = 30;

/// Most frame boxes drawn on one test page; larger requests are clamped.
pub const MAX_FRAMES: u32 = 12;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const FRAME_GREY: Rgb<u8> = Rgb([200, 200, 200]);

/// Render the test strip with `frames` frame boxes.
pub fn render(frames: u32) -> RgbImage {
    let frames = frames.clamp(1, MAX_FRAMES);
    let mut img = RgbImage::from_pixel(STRIP_WIDTH, STRIP_HEIGHT, WHITE);

    for (x, y, px) in img.enumerate_pixels_mut() {
        if x < BORDER || y < BORDER || x >= STRIP_WIDTH - BORDER || y >= STRIP_HEIGHT - BORDER {
            *px = BLACK;
        }
    }

    let inner_height = STRIP_HEIGHT - 2 * MARGIN;
    let frame_height = inner_height.saturating_sub(FRAME_GAP.saturating_mul(frames - 1)) / frames;
    for frame in 0..frames {
        let top = MARGIN.saturating_add(frame.saturating_mul(frame_height + FRAME_GAP));
        fill_rect(
            &mut img,
            MARGIN,
            top,
            STRIP_WIDTH - 2 * MARGIN,
            frame_height,
            FRAME_GREY,
        );
    }
    img
}

/// Render and encode the test strip as PNG bytes.
pub fn png_bytes(frames: u32) -> Result<Vec<u8>> {
    let img = DynamicImage::ImageRgb8(render(frames));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PhotoboothError::Filesystem(format!("test page encoding failed: {e}")))?;
    debug!(frames, len = buffer.len(), "test page rendered");
    Ok(buffer)
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, colour: Rgb<u8>) {
    for py in y..y.saturating_add(height).min(img.height()) {
        for px in x..x.saturating_add(width).min(img.width()) {
            img.put_pixel(px, py, colour);
        }
    }
}
