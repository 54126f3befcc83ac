//! Printable ChArUco board images.
//!
//! Pipeline per board: [`BoardRenderer`] draws a raw raster at the board's
//! resolution, [`compose_with_margin`] pads it with a uniform colored border,
//! and [`BoardImageSynthesizer`] writes it as `charuco_board_NNN.<ext>`.
//! A failing board is reported and skipped; the others are still written.

mod generate;
mod margin;
mod render;
mod synth;

pub use generate::generate_board_images;
pub use margin::{canvas_size, compose_with_margin, margin_size, MarginError};
pub use render::{
    BoardRenderer, CharucoRenderer, RenderError, RenderedBoard, DEFAULT_QUIET_ZONE_PX,
};
pub use synth::{
    board_file_stem, BoardImageRecord, BoardImageSynthesizer, BoardOutcome, OutputFormat,
    ReportError, SynthesisError, SynthesisReport, DEFAULT_OUTPUT_DIR,
};
