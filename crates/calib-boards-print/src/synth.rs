//! Writing margined board images and the per-run report.

use std::fs;
use std::path::{Path, PathBuf};

use calib_boards_core::{MarginSettings, ResolvedBoardGeometry};
use image::{DynamicImage, ImageFormat};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{compose_with_margin, MarginError};

/// Output directory used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "charuco_boards";

const FILE_PREFIX: &str = "charuco_board_";

#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Margin(#[from] MarginError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: image::ImageError,
        /// Files of the same board already on disk.
        written: Vec<PathBuf>,
    },
}

impl SynthesisError {
    /// Files written before the failure; they are left in place.
    pub fn written_files(&self) -> &[PathBuf] {
        match self {
            SynthesisError::Write { written, .. } => written,
            _ => &[],
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Lossless raster formats a board can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Png,
    /// Uncompressed bitmap, kept for legacy print workflows.
    Bmp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

/// File stem of board `index`: `charuco_board_007`.
pub fn board_file_stem(index: usize) -> String {
    format!("{FILE_PREFIX}{index:03}")
}

/// One successfully written board.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoardImageRecord {
    pub index: usize,
    /// Raw raster size `[width, height]`.
    pub source_size: [u32; 2],
    /// Margin in pixels per side `[x, y]`.
    pub margin: [u32; 2],
    pub output_size: [u32; 2],
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub geometry: Option<ResolvedBoardGeometry>,
    /// Marker ids drawn on the board, `[first, end)`.
    #[serde(default)]
    pub marker_ids: Option<[u32; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BoardOutcome {
    Written(BoardImageRecord),
    Failed {
        index: usize,
        error: String,
        /// Partial output left on disk by the failed board.
        #[serde(default)]
        files: Vec<PathBuf>,
    },
}

impl BoardOutcome {
    pub fn index(&self) -> usize {
        match self {
            BoardOutcome::Written(record) => record.index,
            BoardOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, BoardOutcome::Written(_))
    }
}

/// Why a board failed, plus any of its files already written.
#[derive(Debug)]
pub(crate) struct BoardFailure {
    pub(crate) error: String,
    pub(crate) files: Vec<PathBuf>,
}

impl From<SynthesisError> for BoardFailure {
    fn from(err: SynthesisError) -> Self {
        Self {
            files: err.written_files().to_vec(),
            error: err.to_string(),
        }
    }
}

/// Per-board results of one synthesis run, in board order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub output_dir: PathBuf,
    pub margin: MarginSettings,
    pub formats: Vec<OutputFormat>,
    pub boards: Vec<BoardOutcome>,
}

impl SynthesisReport {
    pub fn written_count(&self) -> usize {
        self.boards.iter().filter(|b| b.is_written()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.boards.len() - self.written_count()
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Pads raw board rasters with a margin and writes them to an output directory.
#[derive(Clone, Debug)]
pub struct BoardImageSynthesizer {
    output_dir: PathBuf,
    margin: MarginSettings,
    formats: Vec<OutputFormat>,
}

impl BoardImageSynthesizer {
    /// PNG output into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, margin: MarginSettings) -> Self {
        Self {
            output_dir: output_dir.into(),
            margin,
            formats: vec![OutputFormat::Png],
        }
    }

    /// Also write an uncompressed `.bmp` copy of every board.
    pub fn with_legacy_bmp(mut self, enabled: bool) -> Self {
        self.formats.retain(|f| *f != OutputFormat::Bmp);
        if enabled {
            self.formats.push(OutputFormat::Bmp);
        }
        self
    }

    /// Replace the list of formats; an empty list falls back to PNG.
    pub fn with_formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.formats = if formats.is_empty() {
            vec![OutputFormat::Png]
        } else {
            formats
        };
        self
    }

    #[inline]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[inline]
    pub fn margin(&self) -> MarginSettings {
        self.margin
    }

    #[inline]
    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    /// Path of board `index` in `format`.
    pub fn board_path(&self, index: usize, format: OutputFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", board_file_stem(index), format.extension()))
    }

    /// Create the output directory if needed. Safe to call repeatedly.
    pub fn ensure_output_dir(&self) -> Result<(), SynthesisError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| SynthesisError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Compose and write board `index`. Files written before a failure are kept.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, raster),
            fields(width = raster.width(), height = raster.height())
        )
    )]
    pub fn synthesize(
        &self,
        index: usize,
        raster: &DynamicImage,
    ) -> Result<BoardImageRecord, SynthesisError> {
        self.ensure_output_dir()?;

        let (width, height) = (raster.width(), raster.height());
        debug!(
            "board {index}: source {width}x{height}, {} channel(s)",
            raster.color().channel_count()
        );
        let canvas = compose_with_margin(raster, self.margin.ratio, self.margin.color)?;
        let margin = [(canvas.width() - width) / 2, (canvas.height() - height) / 2];
        debug!(
            "board {index}: output {}x{}, margin {}x{}",
            canvas.width(),
            canvas.height(),
            margin[0],
            margin[1]
        );

        let mut files = Vec::with_capacity(self.formats.len());
        for &format in &self.formats {
            let path = self.board_path(index, format);
            canvas
                .save_with_format(&path, format.image_format())
                .map_err(|source| SynthesisError::Write {
                    path: path.clone(),
                    source,
                    written: files.clone(),
                })?;
            info!("saved {}", path.display());
            files.push(path);
        }

        Ok(BoardImageRecord {
            index,
            source_size: [width, height],
            margin,
            output_size: [canvas.width(), canvas.height()],
            files,
            geometry: None,
            marker_ids: None,
        })
    }

    /// Synthesize every raster in order; failures are recorded, not propagated.
    pub fn synthesize_all<I>(&self, rasters: I) -> SynthesisReport
    where
        I: IntoIterator<Item = DynamicImage>,
    {
        let mut report = self.empty_report();
        for (index, raster) in rasters.into_iter().enumerate() {
            let result = self
                .synthesize(index, &raster)
                .map_err(BoardFailure::from);
            report.boards.push(self.outcome(index, result));
        }
        report
    }

    pub(crate) fn empty_report(&self) -> SynthesisReport {
        SynthesisReport {
            output_dir: self.output_dir.clone(),
            margin: self.margin,
            formats: self.formats.clone(),
            boards: Vec::new(),
        }
    }

    pub(crate) fn outcome(
        &self,
        index: usize,
        result: Result<BoardImageRecord, BoardFailure>,
    ) -> BoardOutcome {
        match result {
            Ok(record) => BoardOutcome::Written(record),
            Err(BoardFailure { error, files }) => {
                error!("board {index}: {error}");
                for path in &files {
                    debug!("board {index}: partial output {}", path.display());
                }
                BoardOutcome::Failed {
                    index,
                    error,
                    files,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tempfile::tempdir;

    fn gray(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(w, h, Luma([0])))
    }

    #[test]
    fn file_stems_are_zero_padded() {
        assert_eq!(board_file_stem(0), "charuco_board_000");
        assert_eq!(board_file_stem(42), "charuco_board_042");
        assert_eq!(board_file_stem(1234), "charuco_board_1234");
    }

    #[test]
    fn writes_margined_png_into_created_directory() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("nested").join("charuco_boards");
        let synth = BoardImageSynthesizer::new(&out, MarginSettings::default());

        let record = synth.synthesize(3, &gray(200, 100)).expect("synthesize");
        assert_eq!(record.output_size, [220, 110]);
        assert_eq!(record.margin, [10, 5]);
        assert_eq!(record.files, vec![out.join("charuco_board_003.png")]);

        let written = image::open(&record.files[0]).expect("decode").to_rgb8();
        assert_eq!(written.dimensions(), (220, 110));
        assert_eq!(written.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(written.get_pixel(10, 5), &Rgb([0, 0, 0]));
        assert_eq!(written.get_pixel(209, 104), &Rgb([0, 0, 0]));
        assert_eq!(written.get_pixel(210, 105), &Rgb([255, 255, 255]));
    }

    #[test]
    fn legacy_mode_adds_bitmap_copy() {
        let dir = tempdir().expect("tempdir");
        let margin = MarginSettings::new(0.1, [0, 128, 255]).expect("margin");
        let synth = BoardImageSynthesizer::new(dir.path(), margin).with_legacy_bmp(true);
        assert_eq!(synth.formats(), &[OutputFormat::Png, OutputFormat::Bmp]);
        let png_only = synth.clone().with_formats(Vec::new());
        assert_eq!(png_only.formats(), &[OutputFormat::Png]);

        let src = RgbImage::from_pixel(50, 40, Rgb([10, 20, 30]));
        let record = synth
            .synthesize(0, &DynamicImage::ImageRgb8(src))
            .expect("synthesize");
        assert_eq!(record.files.len(), 2);
        let png = image::open(&record.files[0]).expect("png").to_rgb8();
        let bmp = image::open(&record.files[1]).expect("bmp").to_rgb8();
        assert_eq!(png, bmp);
        assert_eq!(png.get_pixel(0, 0), &Rgb([0, 128, 255]));
        assert_eq!(png.get_pixel(5, 4), &Rgb([10, 20, 30]));
    }

    #[test]
    fn failures_are_recorded_and_processing_continues() {
        let dir = tempdir().expect("tempdir");
        // A regular file where the output directory should be.
        let blocker = dir.path().join("charuco_boards");
        fs::write(&blocker, b"not a directory").expect("write");
        let synth = BoardImageSynthesizer::new(&blocker, MarginSettings::default());

        let report = synth.synthesize_all(vec![gray(10, 10), gray(20, 20), gray(30, 30)]);
        assert_eq!(report.boards.len(), 3);
        assert_eq!(report.failed_count(), 3);
        let indices: Vec<usize> = report.boards.iter().map(BoardOutcome::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn failed_bitmap_keeps_png_in_the_record() {
        let dir = tempdir().expect("tempdir");
        let synth = BoardImageSynthesizer::new(dir.path(), MarginSettings::default())
            .with_legacy_bmp(true);
        // A directory on the bitmap path makes only that write fail.
        fs::create_dir(synth.board_path(0, OutputFormat::Bmp)).expect("mkdir");

        let report = synth.synthesize_all(vec![gray(20, 20), gray(20, 20)]);
        let png = dir.path().join("charuco_board_000.png");
        assert!(png.is_file());
        match &report.boards[0] {
            BoardOutcome::Failed {
                index,
                error,
                files,
            } => {
                assert_eq!(*index, 0);
                assert!(error.contains("charuco_board_000.bmp"));
                assert_eq!(files, &vec![png]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(report.boards[1].is_written());
    }

    #[test]
    fn oversized_margin_fails_the_board_without_panicking() {
        let dir = tempdir().expect("tempdir");
        // Bypasses `MarginSettings::new`, which would reject the ratio.
        let margin = MarginSettings {
            ratio: 3.0e9,
            color: [255, 255, 255],
        };
        let synth = BoardImageSynthesizer::new(dir.path(), margin);
        let err = synth.synthesize(0, &gray(1, 1)).expect_err("invalid ratio");
        assert!(matches!(
            err,
            SynthesisError::Margin(MarginError::InvalidRatio(_))
        ));
        assert!(err.written_files().is_empty());
        assert!(!dir.path().join("charuco_board_000.png").exists());
    }

    #[test]
    fn report_round_trips_through_json() {
        let dir = tempdir().expect("tempdir");
        let synth = BoardImageSynthesizer::new(dir.path().join("out"), MarginSettings::default());
        let report = synth.synthesize_all(vec![gray(40, 40), gray(60, 20)]);
        assert_eq!(report.written_count(), 2);

        let path = dir.path().join("report.json");
        report.write_json(&path).expect("write");
        let loaded = SynthesisReport::load_json(&path).expect("load");
        assert_eq!(loaded.boards.len(), 2);
        assert_eq!(loaded.formats, vec![OutputFormat::Png]);
        match &loaded.boards[1] {
            BoardOutcome::Written(record) => assert_eq!(record.output_size, [66, 22]),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
