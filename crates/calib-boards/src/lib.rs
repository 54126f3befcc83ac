//! High-level facade crate for the `calib-boards-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates
//! - [`generate_from_path`], the end-to-end board image generation used by the
//!   `create-charuco-boards` binary.
//!
//! ## Quickstart
//!
//! ```no_run
//! use calib_boards::{generate_from_path, GenerateOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = generate_from_path("calib_param.yml", &GenerateOptions::default())?;
//! println!("{} board(s) written", report.written_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `calib_boards::aruco`: built-in ArUco dictionaries.
//! - `calib_boards::core`: config loading, geometry resolution, board point models.
//! - `calib_boards::print`: board rasters, margins and image files.

pub use calib_boards_aruco as aruco;
pub use calib_boards_core as core;
pub use calib_boards_print as print;

pub use calib_boards_core::{
    BoardSetConfig, BoardSetResolver, CalibrationBoard, ResolvedBoardGeometry,
};
pub use calib_boards_print::{BoardImageSynthesizer, SynthesisReport};

mod generate;

pub use generate::{generate_from_path, GenerateError, GenerateOptions};
