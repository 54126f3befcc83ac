use calib_boards_core::ResolvedBoardGeometry;
use log::{info, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::synth::BoardFailure;
use crate::{BoardImageSynthesizer, BoardOutcome, BoardRenderer, RenderError, SynthesisReport};

impl From<RenderError> for BoardFailure {
    fn from(err: RenderError) -> Self {
        Self {
            error: err.to_string(),
            files: Vec::new(),
        }
    }
}

/// Render and write every board of a resolved set, in board order.
///
/// A board that fails to render or write is logged and recorded as
/// [`BoardOutcome::Failed`]; the remaining boards are still processed and
/// keep the marker ids of their position in the set.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(boards = geometries.len()))
)]
pub fn generate_board_images<R: BoardRenderer + ?Sized>(
    geometries: &[ResolvedBoardGeometry],
    renderer: &mut R,
    synth: &BoardImageSynthesizer,
) -> SynthesisReport {
    info!(
        "generating {} board(s) into {}",
        geometries.len(),
        synth.output_dir().display()
    );
    let mut report = synth.empty_report();
    for (index, geometry) in geometries.iter().enumerate() {
        let result = renderer
            .render(geometry)
            .map_err(BoardFailure::from)
            .and_then(|rendered| {
                let mut record = synth.synthesize(index, &rendered.image)?;
                let ids = rendered.layout.marker_ids();
                record.geometry = Some(*geometry);
                record.marker_ids = Some([ids.start, ids.end]);
                Ok(record)
            });
        report.boards.push(synth.outcome(index, result));
    }

    let failed = report.failed_count();
    if failed > 0 {
        warn!("{failed} of {} board(s) failed", geometries.len());
    }
    report
}
