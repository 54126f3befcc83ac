//! Marker layout handle shared by the renderer and the calibration boards.

use std::ops::Range;

use calib_boards_aruco::Dictionary;
use nalgebra::Point3;
use serde::Serialize;

use crate::ResolvedBoardGeometry;

/// Layout validation errors.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("rows and cols must be >= 2")]
    InvalidSize,
    #[error("marker size must be in (0, square size)")]
    InvalidMarkerSize,
    #[error("boards need {needed} markers, dictionary {dictionary} has {available}")]
    DictionaryExhausted {
        dictionary: &'static str,
        needed: usize,
        available: usize,
    },
}

/// OpenCV-style ChArUco layout of one board.
///
/// - the top-left square is black, markers sit on white squares only,
/// - marker ids are assigned row-major over those squares, starting at
///   `first_marker_id` so that boards of one set never share a marker.
#[derive(Clone, Debug, Serialize)]
pub struct CharucoLayout {
    cols: u32,
    rows: u32,
    square_size: f64,
    marker_size: f64,
    dictionary: Dictionary,
    first_marker_id: u32,
    marker_cells: Vec<[u32; 2]>,
}

impl CharucoLayout {
    /// Validate and create a layout whose marker ids start at `first_marker_id`.
    pub fn new(
        geometry: &ResolvedBoardGeometry,
        dictionary: Dictionary,
        first_marker_id: u32,
    ) -> Result<Self, LayoutError> {
        if geometry.cols < 2 || geometry.rows < 2 {
            return Err(LayoutError::InvalidSize);
        }
        if !(geometry.marker_size > 0.0 && geometry.marker_size < geometry.square_size) {
            return Err(LayoutError::InvalidMarkerSize);
        }

        let marker_cells = white_square_cells(geometry.rows, geometry.cols);
        let needed = first_marker_id as usize + marker_cells.len();
        if needed > dictionary.len() {
            return Err(LayoutError::DictionaryExhausted {
                dictionary: dictionary.name,
                needed,
                available: dictionary.len(),
            });
        }

        Ok(Self {
            cols: geometry.cols,
            rows: geometry.rows,
            square_size: geometry.square_size,
            marker_size: geometry.marker_size,
            dictionary,
            first_marker_id,
            marker_cells,
        })
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn square_size(&self) -> f64 {
        self.square_size
    }

    #[inline]
    pub fn marker_size(&self) -> f64 {
        self.marker_size
    }

    /// Marker side relative to the square side.
    #[inline]
    pub fn marker_size_rel(&self) -> f64 {
        self.marker_size / self.square_size
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    #[inline]
    pub fn marker_count(&self) -> usize {
        self.marker_cells.len()
    }

    /// Dictionary ids drawn on this board.
    pub fn marker_ids(&self) -> Range<u32> {
        self.first_marker_id..self.first_marker_id + self.marker_cells.len() as u32
    }

    /// Square cell `(sx, sy)` holding marker `id`.
    pub fn marker_cell(&self, id: u32) -> Option<(u32, u32)> {
        let local = id.checked_sub(self.first_marker_id)? as usize;
        self.marker_cells.get(local).map(|&[sx, sy]| (sx, sy))
    }

    /// Marker id drawn in square `(sx, sy)`, if that square carries one.
    pub fn marker_at(&self, sx: u32, sy: u32) -> Option<u32> {
        if sx >= self.cols || sy >= self.rows || (sx + sy) % 2 == 0 {
            return None;
        }
        // White squares of earlier rows plus those left of `sx` in this row.
        let before_row: u32 = (0..sy).map(|j| white_squares_in_row(self.cols, j)).sum();
        let before_col = (0..sx).filter(|i| (i + sy) % 2 == 1).count() as u32;
        Some(self.first_marker_id + before_row + before_col)
    }

    /// Row-major id of interior corner `(i, j)`, both 0-based.
    ///
    /// This is the index of the corner in [`crate::board_points`].
    pub fn corner_id(&self, i: u32, j: u32) -> Option<usize> {
        let inner_cols = self.cols - 1;
        if i >= inner_cols || j >= self.rows - 1 {
            return None;
        }
        Some(j as usize * inner_cols as usize + i as usize)
    }

    /// Board-plane position of an interior corner id.
    pub fn corner_point(&self, id: usize) -> Option<Point3<f64>> {
        let inner_cols = (self.cols - 1) as usize;
        if id >= inner_cols * (self.rows - 1) as usize {
            return None;
        }
        let x = (id % inner_cols) as f64 * self.square_size;
        let y = (id / inner_cols) as f64 * self.square_size;
        Some(Point3::new(x, y, 0.0))
    }
}

/// Lay out every board of a set with consecutive, non-overlapping marker ids.
pub fn plan_layouts(
    geometries: &[ResolvedBoardGeometry],
    dictionary: Dictionary,
) -> Result<Vec<CharucoLayout>, LayoutError> {
    let mut next_id = 0u32;
    let mut layouts = Vec::with_capacity(geometries.len());
    for geometry in geometries {
        let layout = CharucoLayout::new(geometry, dictionary, next_id)?;
        next_id = layout.marker_ids().end;
        layouts.push(layout);
    }
    Ok(layouts)
}

fn white_squares_in_row(cols: u32, row: u32) -> u32 {
    (0..cols).filter(|i| (i + row) % 2 == 1).count() as u32
}

fn white_square_cells(rows: u32, cols: u32) -> Vec<[u32; 2]> {
    let mut out = Vec::new();
    for j in 0..rows {
        for i in 0..cols {
            if (i + j) % 2 == 1 {
                out.push([i, j]);
            }
        }
    }
    out
}
