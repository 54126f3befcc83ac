use std::error::Error;
use std::path::PathBuf;

use calib_boards::{generate_from_path, GenerateOptions};
use calib_boards_print::DEFAULT_OUTPUT_DIR;
use clap::error::ErrorKind;
use clap::Parser;
use log::warn;

/// Render printable ChArUco boards described by a board-set config file.
#[derive(Debug, Parser)]
#[command(author, version, about = "Create printable ChArUco calibration boards")]
struct Cli {
    /// Board-set config file (`.yml`).
    config: Option<PathBuf>,

    /// Directory the board images are written to.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Also write an uncompressed `.bmp` copy of every board.
    #[arg(long)]
    legacy_bmp: bool,

    /// Margin size as a fraction of the raster size; overrides the config.
    #[arg(long)]
    margin_ratio: Option<f32>,

    /// Write a JSON report of the run to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Debug output.
    #[arg(short, long)]
    verbose: bool,

    /// Warnings and errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

const FAILURE: i32 = -1;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(FAILURE);
            }
        },
    };
    init_logging(&cli);

    if let Err(err) = try_main(cli) {
        eprintln!("error: {err}");
        std::process::exit(FAILURE);
    }
}

fn try_main(cli: Cli) -> Result<(), Box<dyn Error>> {
    let Some(config) = cli.config else {
        return Err("missing config path; usage: create-charuco-boards <config.yml>".into());
    };
    let options = GenerateOptions {
        output_dir: cli.output_dir,
        legacy_bmp: cli.legacy_bmp,
        margin_ratio: cli.margin_ratio,
        report_path: cli.report,
    };

    let report = generate_from_path(&config, &options)?;
    if report.failed_count() > 0 {
        warn!(
            "{} board(s) written, {} failed",
            report.written_count(),
            report.failed_count()
        );
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    let level = calib_boards_core::level_from_verbosity(cli.verbose, cli.quiet);
    calib_boards_core::init_tracing(level, false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    let level = calib_boards_core::level_from_verbosity(cli.verbose, cli.quiet);
    if let Err(err) = calib_boards_core::init_with_level(level) {
        eprintln!("logger already installed: {err}");
    }
}
