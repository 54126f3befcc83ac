//! YAML board-set configuration.
//!
//! Keys follow the calibration config files used by multi-camera rigs, so a
//! single document can drive both the calibration runtime and the board
//! generator. Unknown keys are ignored.

use std::fs;
use std::path::Path;

use calib_boards_aruco::{builtin_dictionary, Dictionary, DEFAULT_DICTIONARY};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Required extension of configuration documents.
pub const CONFIG_EXTENSION: &str = "yml";

pub const DEFAULT_MARGIN_RATIO: f32 = 0.05;

/// Largest accepted margin per side, as a fraction of the raster size.
pub const MAX_MARGIN_RATIO: f32 = 1.0;

/// Opaque white.
pub const DEFAULT_MARGIN_COLOR: [u8; 3] = [255, 255, 255];

/// Raw board-set configuration as written in the document.
///
/// Scalar geometry keys describe every board when `square_size_per_board` is
/// empty. A non-empty `square_size_per_board` switches to per-board arrays.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoardSetConfig {
    pub number_board: Option<u32>,
    pub number_x_square: Option<u32>,
    pub number_y_square: Option<u32>,
    /// Square side used for drawing; also the physical size unless `square_size` is set.
    pub length_square: Option<f64>,
    pub length_marker: Option<f64>,
    /// Physical square side for the 3D point model.
    #[serde(default)]
    pub square_size: Option<f64>,
    pub resolution_x: Option<u32>,
    pub resolution_y: Option<u32>,

    #[serde(default)]
    pub square_size_per_board: Vec<f64>,
    #[serde(default)]
    pub number_x_square_per_board: Vec<u32>,
    #[serde(default)]
    pub number_y_square_per_board: Vec<u32>,
    #[serde(default)]
    pub resolution_x_per_board: Vec<u32>,
    #[serde(default)]
    pub resolution_y_per_board: Vec<u32>,
    #[serde(default)]
    pub boards_index: Vec<usize>,

    #[serde(default)]
    pub margin_ratio: Option<f32>,
    #[serde(default)]
    pub margin_color_r: Option<i64>,
    #[serde(default)]
    pub margin_color_g: Option<i64>,
    #[serde(default)]
    pub margin_color_b: Option<i64>,

    /// Also write an uncompressed `.bmp` copy of every board image.
    #[serde(default)]
    pub save_bmp: bool,
    /// Built-in ArUco dictionary used to draw markers.
    #[serde(default)]
    pub dictionary: Option<String>,
}

impl BoardSetConfig {
    /// Load a YAML config from disk.
    ///
    /// The path must exist, name a regular file and carry the `.yml` extension.
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        check_config_path(path)?;
        let raw = fs::read_to_string(path)?;
        debug!("loaded config {} ({} bytes)", path.display(), raw.len());
        Self::from_yaml_str(&raw)
    }

    /// Parse a config document.
    ///
    /// A leading `%YAML:1.0` directive, as written by OpenCV `FileStorage`, is dropped.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let body = strip_opencv_directive(raw);
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(body)?)
    }

    /// Number of boards in the set.
    pub fn board_count(&self) -> Result<usize, ConfigError> {
        match self.number_board {
            None => Err(ConfigError::MissingField("number_board")),
            Some(0) => Err(ConfigError::NoBoards),
            Some(n) => Ok(n as usize),
        }
    }

    /// True when per-board geometry arrays are in effect.
    pub fn is_heterogeneous(&self) -> bool {
        !self.square_size_per_board.is_empty()
    }

    /// Margin ratio and color, with defaults applied.
    pub fn margin(&self) -> Result<MarginSettings, ConfigError> {
        let ratio = self.margin_ratio.unwrap_or(DEFAULT_MARGIN_RATIO);
        let color = match (self.margin_color_r, self.margin_color_g, self.margin_color_b) {
            (Some(r), Some(g), Some(b)) => [
                color_channel("margin_color_r", r)?,
                color_channel("margin_color_g", g)?,
                color_channel("margin_color_b", b)?,
            ],
            (None, None, None) => DEFAULT_MARGIN_COLOR,
            _ => {
                warn!("margin color needs margin_color_r, _g and _b; using white");
                DEFAULT_MARGIN_COLOR
            }
        };
        MarginSettings::new(ratio, color)
    }

    /// Marker dictionary named by the config, or the default one.
    pub fn dictionary(&self) -> Result<Dictionary, ConfigError> {
        let name = self.dictionary.as_deref().unwrap_or(DEFAULT_DICTIONARY);
        builtin_dictionary(name).ok_or_else(|| ConfigError::UnknownDictionary(name.to_owned()))
    }
}

/// Uniform border added around every printed board.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarginSettings {
    /// Margin per side as a fraction of the raster size along that axis.
    pub ratio: f32,
    /// RGB fill color.
    pub color: [u8; 3],
}

impl MarginSettings {
    pub fn new(ratio: f32, color: [u8; 3]) -> Result<Self, ConfigError> {
        if !(0.0..=MAX_MARGIN_RATIO).contains(&ratio) {
            return Err(ConfigError::invalid(
                "margin_ratio",
                format!("{ratio} is outside [0, {MAX_MARGIN_RATIO}]"),
            ));
        }
        Ok(Self { ratio, color })
    }

    /// Same color, different ratio.
    pub fn with_ratio(self, ratio: f32) -> Result<Self, ConfigError> {
        Self::new(ratio, self.color)
    }
}

impl Default for MarginSettings {
    fn default() -> Self {
        Self {
            ratio: DEFAULT_MARGIN_RATIO,
            color: DEFAULT_MARGIN_COLOR,
        }
    }
}

fn check_config_path(path: &Path) -> Result<(), ConfigError> {
    if !path.is_file() || path.file_name().is_none() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some(CONFIG_EXTENSION) {
        return Err(ConfigError::WrongExtension {
            path: path.to_path_buf(),
            expected: CONFIG_EXTENSION,
        });
    }
    Ok(())
}

fn strip_opencv_directive(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    if trimmed.starts_with("%YAML") {
        return trimmed.split_once('\n').map_or("", |(_, rest)| rest);
    }
    raw
}

fn color_channel(field: &'static str, value: i64) -> Result<u8, ConfigError> {
    u8::try_from(value)
        .map_err(|_| ConfigError::invalid(field, format!("{value} is outside 0..=255")))
}
