//! Margin compositing.

use calib_boards_core::MAX_MARGIN_RATIO;
use image::{imageops, DynamicImage, Rgb, RgbImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MarginError {
    #[error("margin ratio {0} is outside [0, {MAX_MARGIN_RATIO}]")]
    InvalidRatio(f32),
    #[error("{width}x{height} raster with margin ratio {ratio} does not fit a u32 canvas")]
    CanvasOverflow { width: u32, height: u32, ratio: f32 },
}

/// Margin in pixels per side: `(floor(width * ratio), floor(height * ratio))`.
pub fn margin_size(width: u32, height: u32, ratio: f32) -> Result<(u32, u32), MarginError> {
    if !(0.0..=MAX_MARGIN_RATIO).contains(&ratio) {
        return Err(MarginError::InvalidRatio(ratio));
    }
    Ok(((width as f32 * ratio) as u32, (height as f32 * ratio) as u32))
}

/// Canvas size `(width + 2 * margin_x, height + 2 * margin_y)`.
pub fn canvas_size(width: u32, height: u32, ratio: f32) -> Result<(u32, u32), MarginError> {
    let (mx, my) = margin_size(width, height, ratio)?;
    let grow = |dim: u32, m: u32| m.checked_mul(2).and_then(|m2| dim.checked_add(m2));
    match (grow(width, mx), grow(height, my)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(MarginError::CanvasOverflow {
            width,
            height,
            ratio,
        }),
    }
}

/// Place `src` unscaled at `(margin_x, margin_y)` on a canvas filled with `color`.
///
/// Single-channel sources are expanded to RGB by replicating the gray value;
/// RGB sources are copied unchanged. Other layouts are converted to 8-bit RGB.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src), fields(width = src.width(), height = src.height()))
)]
pub fn compose_with_margin(
    src: &DynamicImage,
    ratio: f32,
    color: [u8; 3],
) -> Result<RgbImage, MarginError> {
    let (width, height) = (src.width(), src.height());
    let (mx, my) = margin_size(width, height, ratio)?;
    let (canvas_w, canvas_h) = canvas_size(width, height, ratio)?;
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb(color));

    match src {
        DynamicImage::ImageRgb8(rgb) => imageops::replace(&mut canvas, rgb, mx.into(), my.into()),
        other => {
            let rgb = other.to_rgb8();
            imageops::replace(&mut canvas, &rgb, mx.into(), my.into());
        }
    }
    Ok(canvas)
}
