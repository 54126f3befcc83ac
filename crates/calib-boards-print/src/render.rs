//! Raw ChArUco board rasters.

use std::sync::Arc;

use calib_boards_aruco::Dictionary;
use calib_boards_core::{CharucoLayout, LayoutError, ResolvedBoardGeometry};
use image::{DynamicImage, GrayImage, Luma};
use log::debug;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// White border kept around the pattern inside the raw raster, in pixels.
pub const DEFAULT_QUIET_ZONE_PX: u32 = 10;

const BLACK: u8 = 0;
const WHITE: u8 = 255;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("resolution {width}x{height} is too small for a {quiet_zone} px quiet zone")]
    ResolutionTooSmall {
        width: u32,
        height: u32,
        quiet_zone: u32,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// A raw board raster plus the marker layout it was drawn with.
#[derive(Clone, Debug)]
pub struct RenderedBoard {
    pub image: DynamicImage,
    pub layout: Arc<CharucoLayout>,
}

/// Marker-rendering primitive: draws one board at its configured resolution.
pub trait BoardRenderer {
    fn render(&mut self, geometry: &ResolvedBoardGeometry) -> Result<RenderedBoard, RenderError>;
}

/// Built-in renderer for OpenCV-style ChArUco boards.
///
/// Marker ids continue across successive calls, so every board of a set gets
/// its own ids (same rule as [`calib_boards_core::plan_layouts`]). A board
/// whose raster cannot be drawn still reserves its ids, so later boards keep
/// the ids planned for their position.
#[derive(Clone, Debug)]
pub struct CharucoRenderer {
    dictionary: Dictionary,
    next_marker_id: u32,
    quiet_zone: u32,
    border_bits: u32,
}

impl CharucoRenderer {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            next_marker_id: 0,
            quiet_zone: DEFAULT_QUIET_ZONE_PX,
            border_bits: 1,
        }
    }

    pub fn with_quiet_zone(mut self, px: u32) -> Self {
        self.quiet_zone = px;
        self
    }

    /// First marker id the next board will use.
    #[inline]
    pub fn next_marker_id(&self) -> u32 {
        self.next_marker_id
    }

    /// Draw `layout` into a `width × height` gray raster.
    ///
    /// The pattern keeps its aspect ratio, is scaled to the largest size that
    /// fits inside the quiet zone and is centered.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, layout)))]
    pub fn draw(
        &self,
        layout: &CharucoLayout,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, RenderError> {
        let quiet_zone = self.quiet_zone;
        let too_small = || RenderError::ResolutionTooSmall {
            width,
            height,
            quiet_zone,
        };
        let avail_w = width.checked_sub(2 * quiet_zone).ok_or_else(too_small)?;
        let avail_h = height.checked_sub(2 * quiet_zone).ok_or_else(too_small)?;

        let square = layout.square_size();
        let board_w = f64::from(layout.cols()) * square;
        let board_h = f64::from(layout.rows()) * square;
        // Pixels per board unit.
        let scale = (f64::from(avail_w) / board_w).min(f64::from(avail_h) / board_h);
        if scale * square < 1.0 {
            return Err(too_small());
        }

        let origin_x = (f64::from(width) - board_w * scale) / 2.0;
        let origin_y = (f64::from(height) - board_h * scale) / 2.0;
        let marker = layout.marker_size();
        let marker_inset = (square - marker) / 2.0;
        let dict = layout.dictionary();
        let grid = dict.marker_size as u32 + 2 * self.border_bits;

        let img = GrayImage::from_fn(width, height, |px, py| {
            // Sample at the pixel center, in board units.
            let u = (f64::from(px) + 0.5 - origin_x) / scale;
            let v = (f64::from(py) + 0.5 - origin_y) / scale;
            if u < 0.0 || v < 0.0 || u >= board_w || v >= board_h {
                return Luma([WHITE]);
            }
            let sx = ((u / square) as u32).min(layout.cols() - 1);
            let sy = ((v / square) as u32).min(layout.rows() - 1);
            let Some(id) = layout.marker_at(sx, sy) else {
                // Black squares; empty white squares do not occur in this layout.
                return Luma([BLACK]);
            };

            let mu = u - f64::from(sx) * square - marker_inset;
            let mv = v - f64::from(sy) * square - marker_inset;
            if mu < 0.0 || mv < 0.0 || mu >= marker || mv >= marker {
                return Luma([WHITE]);
            }
            let cx = ((mu / marker * f64::from(grid)) as u32).min(grid - 1);
            let cy = ((mv / marker * f64::from(grid)) as u32).min(grid - 1);
            let inner = self.border_bits..grid - self.border_bits;
            if !inner.contains(&cx) || !inner.contains(&cy) {
                return Luma([BLACK]);
            }
            let row = (cy - self.border_bits) as usize;
            let col = (cx - self.border_bits) as usize;
            match dict.is_white(id, row, col) {
                Some(true) => Luma([WHITE]),
                _ => Luma([BLACK]),
            }
        });
        Ok(img)
    }
}

impl BoardRenderer for CharucoRenderer {
    fn render(&mut self, geometry: &ResolvedBoardGeometry) -> Result<RenderedBoard, RenderError> {
        let layout = CharucoLayout::new(geometry, self.dictionary, self.next_marker_id)?;
        self.next_marker_id = layout.marker_ids().end;
        let image = self.draw(&layout, geometry.resolution_x, geometry.resolution_y)?;
        debug!(
            "rendered {}x{} board with markers {:?}",
            layout.cols(),
            layout.rows(),
            layout.marker_ids()
        );
        Ok(RenderedBoard {
            image: DynamicImage::ImageLuma8(image),
            layout: Arc::new(layout),
        })
    }
}
