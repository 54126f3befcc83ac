use std::path::{Path, PathBuf};

use calib_boards_core::{plan_layouts, BoardSetConfig, BoardSetResolver, ConfigError};
use calib_boards_print::{
    generate_board_images, BoardImageSynthesizer, CharucoRenderer, ReportError, SynthesisReport,
    DEFAULT_OUTPUT_DIR,
};
use log::info;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write report {}: {source}", path.display())]
    Report { path: PathBuf, source: ReportError },
}

/// Knobs on top of what the config document says.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub output_dir: PathBuf,
    /// Write `.bmp` copies even if the document does not ask for them.
    pub legacy_bmp: bool,
    /// Overrides the document's `margin_ratio`.
    pub margin_ratio: Option<f32>,
    /// Where to write the JSON run report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            legacy_bmp: false,
            margin_ratio: None,
            report_path: None,
        }
    }
}

/// Load the board-set document at `path` and write one image per board.
///
/// Errors in the document (including running out of dictionary markers) are
/// fatal and nothing is written. Per-board failures are only recorded in the
/// returned report.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))
)]
pub fn generate_from_path(
    path: impl AsRef<Path>,
    options: &GenerateOptions,
) -> Result<SynthesisReport, GenerateError> {
    let config = BoardSetConfig::load_yaml(path)?;
    let resolver = BoardSetResolver::new(&config)?;

    let mut margin = config.margin()?;
    if let Some(ratio) = options.margin_ratio {
        margin = margin.with_ratio(ratio)?;
    }
    let dictionary = config.dictionary()?;
    plan_layouts(resolver.geometries(), dictionary).map_err(ConfigError::from)?;
    info!(
        "{} board(s), dictionary {}, margin ratio {}",
        resolver.board_count(),
        dictionary.name,
        margin.ratio
    );

    let synth = BoardImageSynthesizer::new(&options.output_dir, margin)
        .with_legacy_bmp(options.legacy_bmp || config.save_bmp);
    let mut renderer = CharucoRenderer::new(dictionary);
    let report = generate_board_images(resolver.geometries(), &mut renderer, &synth);

    if let Some(report_path) = options.report_path.as_ref() {
        report
            .write_json(report_path)
            .map_err(|source| GenerateError::Report {
                path: report_path.clone(),
                source,
            })?;
        info!("report written to {}", report_path.display());
    }
    Ok(report)
}
