//! Board-set resolution: one concrete geometry per board index.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{BoardSetConfig, ConfigError};

/// Concrete geometry of one physical board.
///
/// `cols`/`rows` are **square counts**, not inner corner counts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBoardGeometry {
    pub cols: u32,
    pub rows: u32,
    /// Physical side of one square.
    pub square_size: f64,
    /// Physical side of one marker, always smaller than `square_size`.
    pub marker_size: f64,
    /// Raster size used when drawing the board.
    pub resolution_x: u32,
    pub resolution_y: u32,
}

impl ResolvedBoardGeometry {
    /// Number of interior chessboard corners, `(cols - 1) * (rows - 1)`.
    #[inline]
    pub fn interior_point_count(&self) -> usize {
        (self.cols as usize - 1) * (self.rows as usize - 1)
    }

    /// Marker side relative to the square side.
    #[inline]
    pub fn marker_size_rel(&self) -> f64 {
        self.marker_size / self.square_size
    }
}

/// How the configuration describes its boards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Every board shares the scalar geometry.
    Uniform,
    /// Each board reads its own entry from the per-board arrays.
    Heterogeneous,
}

/// Validated geometry for every board of a set.
///
/// Construction resolves and validates all boards at once, so a resolver
/// either exists with a complete set or not at all.
#[derive(Clone, Debug)]
pub struct BoardSetResolver {
    mode: ResolveMode,
    geometries: Vec<ResolvedBoardGeometry>,
}

impl BoardSetResolver {
    /// Load the document at `path` and resolve it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = BoardSetConfig::load_yaml(path)?;
        Self::new(&config)
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(config)))]
    pub fn new(config: &BoardSetConfig) -> Result<Self, ConfigError> {
        let count = config.board_count()?;
        let (mode, geometries) = if config.is_heterogeneous() {
            (
                ResolveMode::Heterogeneous,
                heterogeneous_geometries(config, count)?,
            )
        } else {
            if !config.boards_index.is_empty() {
                debug!("boards_index ignored: no per-board geometry arrays");
            }
            (ResolveMode::Uniform, vec![uniform_geometry(config)?; count])
        };

        info!("resolved {count} board(s) in {mode:?} mode");
        for (idx, g) in geometries.iter().enumerate() {
            debug!(
                "board {idx}: {}x{} squares, square {} marker {}, {}x{} px",
                g.cols, g.rows, g.square_size, g.marker_size, g.resolution_x, g.resolution_y
            );
        }

        Ok(Self { mode, geometries })
    }

    #[inline]
    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    #[inline]
    pub fn board_count(&self) -> usize {
        self.geometries.len()
    }

    /// Geometry of board `board_index`, `None` past the end of the set.
    #[inline]
    pub fn resolve(&self, board_index: usize) -> Option<&ResolvedBoardGeometry> {
        self.geometries.get(board_index)
    }

    /// All geometries in board order.
    #[inline]
    pub fn geometries(&self) -> &[ResolvedBoardGeometry] {
        &self.geometries
    }
}

/// Resolve a single board straight from a configuration.
pub fn resolve_board(
    config: &BoardSetConfig,
    board_index: usize,
) -> Result<ResolvedBoardGeometry, ConfigError> {
    let resolver = BoardSetResolver::new(config)?;
    resolver
        .resolve(board_index)
        .copied()
        .ok_or(ConfigError::NoSuchBoard {
            index: board_index,
            count: resolver.board_count(),
        })
}

fn uniform_geometry(config: &BoardSetConfig) -> Result<ResolvedBoardGeometry, ConfigError> {
    let cols = required(config.number_x_square, "number_x_square")?;
    let rows = required(config.number_y_square, "number_y_square")?;
    let (length_square, marker_rel) = marker_ratio(config)?;
    let square_size = match config.square_size {
        Some(size) => positive("square_size", size)?,
        None => length_square,
    };
    let geometry = ResolvedBoardGeometry {
        cols: square_count("number_x_square", cols)?,
        rows: square_count("number_y_square", rows)?,
        square_size,
        marker_size: square_size * marker_rel,
        resolution_x: resolution("resolution_x", required(config.resolution_x, "resolution_x")?)?,
        resolution_y: resolution("resolution_y", required(config.resolution_y, "resolution_y")?)?,
    };
    Ok(geometry)
}

fn heterogeneous_geometries(
    config: &BoardSetConfig,
    count: usize,
) -> Result<Vec<ResolvedBoardGeometry>, ConfigError> {
    expect_len("square_size_per_board", config.square_size_per_board.len(), count)?;
    expect_len(
        "number_x_square_per_board",
        config.number_x_square_per_board.len(),
        count,
    )?;
    expect_len(
        "number_y_square_per_board",
        config.number_y_square_per_board.len(),
        count,
    )?;
    optional_len("resolution_x_per_board", &config.resolution_x_per_board, count)?;
    optional_len("resolution_y_per_board", &config.resolution_y_per_board, count)?;

    let boards_index = boards_index(&config.boards_index, count)?;
    let (_, marker_rel) = marker_ratio(config)?;

    boards_index
        .into_iter()
        .map(|entry| {
            let square_size =
                positive("square_size_per_board", config.square_size_per_board[entry])?;
            let res_x = per_board_or_scalar(
                &config.resolution_x_per_board,
                entry,
                config.resolution_x,
                "resolution_x",
            )?;
            let res_y = per_board_or_scalar(
                &config.resolution_y_per_board,
                entry,
                config.resolution_y,
                "resolution_y",
            )?;
            Ok(ResolvedBoardGeometry {
                cols: square_count(
                    "number_x_square_per_board",
                    config.number_x_square_per_board[entry],
                )?,
                rows: square_count(
                    "number_y_square_per_board",
                    config.number_y_square_per_board[entry],
                )?,
                square_size,
                marker_size: square_size * marker_rel,
                resolution_x: resolution("resolution_x", res_x)?,
                resolution_y: resolution("resolution_y", res_y)?,
            })
        })
        .collect()
}

/// Identity when absent, otherwise a validated table lookup per board.
fn boards_index(raw: &[usize], count: usize) -> Result<Vec<usize>, ConfigError> {
    if raw.is_empty() {
        return Ok((0..count).collect());
    }
    expect_len("boards_index", raw.len(), count)?;
    for (board, &index) in raw.iter().enumerate() {
        if index >= count {
            return Err(ConfigError::BoardIndexOutOfRange {
                board,
                index,
                count,
            });
        }
    }
    Ok(raw.to_vec())
}

/// `(length_square, length_marker / length_square)`.
fn marker_ratio(config: &BoardSetConfig) -> Result<(f64, f64), ConfigError> {
    let square = positive(
        "length_square",
        required(config.length_square, "length_square")?,
    )?;
    let marker = positive(
        "length_marker",
        required(config.length_marker, "length_marker")?,
    )?;
    if marker >= square {
        return Err(ConfigError::invalid(
            "length_marker",
            format!("{marker} must be smaller than length_square {square}"),
        ));
    }
    Ok((square, marker / square))
}

fn per_board_or_scalar(
    values: &[u32],
    entry: usize,
    scalar: Option<u32>,
    scalar_field: &'static str,
) -> Result<u32, ConfigError> {
    match values.get(entry) {
        Some(&v) => Ok(v),
        None => required(scalar, scalar_field),
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::MissingField(field))
}

fn expect_len(field: &'static str, got: usize, expected: usize) -> Result<(), ConfigError> {
    if got != expected {
        return Err(ConfigError::ArrayLength {
            field,
            expected,
            got,
        });
    }
    Ok(())
}

fn optional_len<T>(field: &'static str, values: &[T], expected: usize) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Ok(());
    }
    expect_len(field, values.len(), expected)
}

fn square_count(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value < 2 {
        return Err(ConfigError::invalid(field, format!("{value} squares, need >= 2")));
    }
    Ok(value)
}

fn resolution(field: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be > 0"));
    }
    Ok(value)
}

fn positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(field, format!("{value} must be > 0")));
    }
    Ok(value)
}
