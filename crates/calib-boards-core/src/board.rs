//! Calibration board entity: point model plus associations to observations and frames.
//!
//! A board keeps two keyspaces that must not be confused:
//! - [`ObservationLog`]: dense keys `0..n`, one per inserted observation, in insertion order;
//! - [`FrameIndex`]: sparse keys chosen by the caller (the frame index), last write wins.

use std::collections::btree_map::{self, BTreeMap};
use std::slice;
use std::sync::Arc;

use log::debug;
use nalgebra::Point3;

use crate::{BoardColor, BoardColorizer, CharucoLayout, ResolvedBoardGeometry};

/// Anything that knows the frame index it belongs to.
pub trait IndexedFrame {
    fn frame_index(&self) -> usize;
}

/// Append-only observation store keyed by insertion count.
#[derive(Clone, Debug)]
pub struct ObservationLog<O> {
    entries: Vec<Arc<O>>,
}

impl<O> ObservationLog<O> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an observation and return its key (the number of earlier insertions).
    pub fn push(&mut self, observation: Arc<O>) -> usize {
        self.entries.push(observation);
        self.entries.len() - 1
    }

    pub fn get(&self, key: usize) -> Option<&Arc<O>> {
        self.entries.get(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, observation)` pairs in key order.
    pub fn iter(&self) -> std::iter::Enumerate<slice::Iter<'_, Arc<O>>> {
        self.entries.iter().enumerate()
    }
}

impl<O> Default for ObservationLog<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame store keyed by the caller-supplied frame index.
#[derive(Clone, Debug)]
pub struct FrameIndex<F> {
    entries: BTreeMap<usize, Arc<F>>,
}

impl<F: IndexedFrame> FrameIndex<F> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Store `frame` under its own frame index.
    ///
    /// An existing entry with the same index is replaced and returned.
    pub fn insert(&mut self, frame: Arc<F>) -> Option<Arc<F>> {
        self.entries.insert(frame.frame_index(), frame)
    }

    pub fn get(&self, frame_index: usize) -> Option<&Arc<F>> {
        self.entries.get(&frame_index)
    }

    pub fn contains(&self, frame_index: usize) -> bool {
        self.entries.contains_key(&frame_index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(frame_index, frame)` pairs in ascending frame index.
    pub fn iter(&self) -> btree_map::Iter<'_, usize, Arc<F>> {
        self.entries.iter()
    }
}

impl<F: IndexedFrame> Default for FrameIndex<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Interior corners of a `cols × rows` board, row-major.
///
/// Outer loop over `y in 0..rows-1`, inner loop over `x in 0..cols-1`;
/// point `(x * square_size, y * square_size, 0)`. The order matches the
/// ChArUco corner ids used by marker detection.
pub fn board_points(cols: u32, rows: u32, square_size: f64) -> Vec<Point3<f64>> {
    let inner_cols = cols.saturating_sub(1);
    let inner_rows = rows.saturating_sub(1);
    let mut pts = Vec::with_capacity(inner_cols as usize * inner_rows as usize);
    for y in 0..inner_rows {
        for x in 0..inner_cols {
            pts.push(Point3::new(
                f64::from(x) * square_size,
                f64::from(y) * square_size,
                0.0,
            ));
        }
    }
    pts
}

/// One physical ChArUco board taking part in a calibration session.
///
/// `O` is the per-image board observation type and `F` the frame type of the
/// calibration pipeline; the board only holds shared references to them.
#[derive(Clone, Debug)]
pub struct CalibrationBoard<O, F: IndexedFrame> {
    board_id: usize,
    cols: u32,
    rows: u32,
    square_size: f64,
    points_3d: Vec<Point3<f64>>,
    layout: Arc<CharucoLayout>,
    display_color: BoardColor,
    observations: ObservationLog<O>,
    frames: FrameIndex<F>,
}

impl<O, F: IndexedFrame> CalibrationBoard<O, F> {
    /// Build board `board_id` from its resolved geometry.
    ///
    /// `layout` is the marker layout the board was drawn with; it is shared,
    /// not owned.
    pub fn new(
        board_id: usize,
        geometry: &ResolvedBoardGeometry,
        layout: Arc<CharucoLayout>,
        colorizer: &mut dyn BoardColorizer,
    ) -> Self {
        let points_3d = board_points(geometry.cols, geometry.rows, geometry.square_size);
        debug!(
            "board {board_id}: {} interior points, markers {:?}",
            points_3d.len(),
            layout.marker_ids()
        );
        Self {
            board_id,
            cols: geometry.cols,
            rows: geometry.rows,
            square_size: geometry.square_size,
            points_3d,
            layout,
            display_color: colorizer.next_color(),
            observations: ObservationLog::new(),
            frames: FrameIndex::new(),
        }
    }

    #[inline]
    pub fn board_id(&self) -> usize {
        self.board_id
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

    /// `(cols - 1) * (rows - 1)`.
    #[inline]
    pub fn interior_point_count(&self) -> usize {
        self.points_3d.len()
    }

    #[inline]
    pub fn points_3d(&self) -> &[Point3<f64>] {
        &self.points_3d
    }

    /// 3D point of interior corner `id`.
    #[inline]
    pub fn corner_point(&self, id: usize) -> Option<&Point3<f64>> {
        self.points_3d.get(id)
    }

    #[inline]
    pub fn layout(&self) -> &Arc<CharucoLayout> {
        &self.layout
    }

    #[inline]
    pub fn display_color(&self) -> BoardColor {
        self.display_color
    }

    #[inline]
    pub fn observations(&self) -> &ObservationLog<O> {
        &self.observations
    }

    #[inline]
    pub fn frames(&self) -> &FrameIndex<F> {
        &self.frames
    }

    #[inline]
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Record a new observation of this board; returns its dense key.
    pub fn insert_new_board(&mut self, observation: Arc<O>) -> usize {
        self.observations.push(observation)
    }

    /// Associate a frame under its own frame index.
    ///
    /// Re-inserting a frame index replaces the earlier frame, which is returned.
    pub fn insert_new_frame(&mut self, frame: Arc<F>) -> Option<Arc<F>> {
        let replaced = self.frames.insert(frame);
        if let Some(old) = replaced.as_ref() {
            debug!(
                "board {}: frame {} replaced",
                self.board_id,
                old.frame_index()
            );
        }
        replaced
    }

    pub fn observation(&self, key: usize) -> Option<&Arc<O>> {
        self.observations.get(key)
    }

    pub fn frame(&self, frame_index: usize) -> Option<&Arc<F>> {
        self.frames.get(frame_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedColorizer, RandomColorizer};
    use calib_boards_aruco::builtins::DICT_4X4_100;

    #[derive(Debug, PartialEq)]
    struct Obs(&'static str);

    #[derive(Debug, PartialEq)]
    struct Frame {
        index: usize,
        tag: &'static str,
    }

    impl IndexedFrame for Frame {
        fn frame_index(&self) -> usize {
            self.index
        }
    }

    fn geometry(cols: u32, rows: u32, square_size: f64) -> ResolvedBoardGeometry {
        ResolvedBoardGeometry {
            cols,
            rows,
            square_size,
            marker_size: square_size * 0.75,
            resolution_x: 500,
            resolution_y: 600,
        }
    }

    fn board(cols: u32, rows: u32, square_size: f64) -> CalibrationBoard<Obs, Frame> {
        let g = geometry(cols, rows, square_size);
        let layout = Arc::new(CharucoLayout::new(&g, DICT_4X4_100, 0).expect("layout"));
        CalibrationBoard::new(3, &g, layout, &mut FixedColorizer([9, 9, 9]))
    }

    #[test]
    fn points_form_row_major_grid() {
        for (cols, rows) in [(2, 2), (3, 5), (5, 7), (10, 4)] {
            let b = board(cols, rows, 0.5);
            let expected = ((cols - 1) * (rows - 1)) as usize;
            assert_eq!(b.interior_point_count(), expected);
            assert_eq!(b.points_3d().len(), expected);
            for (k, p) in b.points_3d().iter().enumerate() {
                let x = (k % (cols as usize - 1)) as f64 * 0.5;
                let y = (k / (cols as usize - 1)) as f64 * 0.5;
                assert_eq!((p.x, p.y, p.z), (x, y, 0.0));
            }
        }
    }

    #[test]
    fn points_match_layout_corner_ids() {
        let b = board(5, 7, 0.04);
        for j in 0..6 {
            for i in 0..4 {
                let id = b.layout().corner_id(i, j).expect("id");
                let expected = b.layout().corner_point(id).expect("point");
                assert_eq!(b.corner_point(id), Some(&expected));
            }
        }
    }

    #[test]
    fn board_id_is_the_construction_index() {
        let b = board(5, 7, 0.04);
        assert_eq!(b.board_id(), 3);
        assert_eq!((b.cols(), b.rows()), (5, 7));
        assert_eq!(b.display_color(), [9, 9, 9]);
    }

    #[test]
    fn observations_get_dense_sequential_keys() {
        let mut b = board(3, 3, 1.0);
        let names = ["a", "b", "c", "d"];
        for (k, name) in names.iter().enumerate() {
            assert_eq!(b.insert_new_board(Arc::new(Obs(name))), k);
        }
        assert_eq!(b.observation_count(), 4);
        for (k, obs) in b.observations().iter() {
            assert_eq!(obs.0, names[k]);
        }
        assert_eq!(b.observation(0).map(|o| o.0), Some("a"));
        assert!(b.observation(4).is_none());
    }

    #[test]
    fn frames_are_keyed_by_frame_index_last_write_wins() {
        let mut b = board(3, 3, 1.0);
        assert!(b
            .insert_new_frame(Arc::new(Frame { index: 42, tag: "A" }))
            .is_none());
        assert!(b
            .insert_new_frame(Arc::new(Frame { index: 7, tag: "X" }))
            .is_none());
        let replaced = b.insert_new_frame(Arc::new(Frame { index: 42, tag: "B" }));
        assert_eq!(replaced.map(|f| f.tag), Some("A"));

        assert_eq!(b.frame_count(), 2);
        assert_eq!(b.frame(42).map(|f| f.tag), Some("B"));
        assert!(b.frames().contains(7));
        assert!(!b.frames().contains(0));
        let keys: Vec<usize> = b.frames().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![7, 42]);
    }

    #[test]
    fn seeded_colorizer_makes_boards_reproducible() {
        let g = geometry(5, 7, 0.04);
        let layout = Arc::new(CharucoLayout::new(&g, DICT_4X4_100, 0).expect("layout"));
        let mut c1 = RandomColorizer::seeded(11);
        let mut c2 = RandomColorizer::seeded(11);
        let a: CalibrationBoard<Obs, Frame> =
            CalibrationBoard::new(0, &g, Arc::clone(&layout), &mut c1);
        let b: CalibrationBoard<Obs, Frame> = CalibrationBoard::new(0, &g, layout, &mut c2);
        assert_eq!(a.display_color(), b.display_color());
        assert_eq!(a.points_3d(), b.points_3d());
    }
}
