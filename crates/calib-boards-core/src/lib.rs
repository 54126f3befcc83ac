//! Core types for ChArUco board sets.
//!
//! This crate turns a board-set configuration document into one concrete
//! geometry per board, and builds the per-board point model consumed by a
//! calibration pipeline. It does *not* draw images; see `calib-boards-print`.
//!
//! ## Quickstart
//!
//! ```
//! use calib_boards_core::{BoardSetConfig, BoardSetResolver};
//!
//! let config = BoardSetConfig::from_yaml_str(
//!     "number_board: 2\n\
//!      number_x_square: 5\n\
//!      number_y_square: 7\n\
//!      length_square: 0.04\n\
//!      length_marker: 0.03\n\
//!      resolution_x: 500\n\
//!      resolution_y: 600\n",
//! )?;
//! let resolver = BoardSetResolver::new(&config)?;
//! let geometry = resolver.resolve(1).expect("two boards");
//! assert_eq!(geometry.interior_point_count(), 24);
//! # Ok::<(), calib_boards_core::ConfigError>(())
//! ```

mod board;
mod color;
mod config;
mod error;
mod layout;
mod logger;
mod resolver;

pub use board::{board_points, CalibrationBoard, FrameIndex, IndexedFrame, ObservationLog};
pub use color::{BoardColor, BoardColorizer, FixedColorizer, RandomColorizer};
pub use config::{
    BoardSetConfig, MarginSettings, CONFIG_EXTENSION, DEFAULT_MARGIN_COLOR, DEFAULT_MARGIN_RATIO,
    MAX_MARGIN_RATIO,
};
pub use error::ConfigError;
pub use layout::{plan_layouts, CharucoLayout, LayoutError};
pub use resolver::{resolve_board, BoardSetResolver, ResolveMode, ResolvedBoardGeometry};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{default_directives, init_with_level, level_from_verbosity};
