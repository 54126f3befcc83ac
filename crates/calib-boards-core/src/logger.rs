//! Stderr logging for the board tools.
//!
//! Records from this workspace are shown down to the chosen level; records
//! from dependencies (image codecs and the like) only from `warn` up. Lines
//! read `[elapsed LEVEL crate] message`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Crate-name prefixes of log targets that belong to this workspace.
const WORKSPACE_TARGETS: [&str; 2] = ["calib_boards", "create_charuco_boards"];

/// Ceiling for records coming from other crates.
const DEPENDENCY_LEVEL: LevelFilter = LevelFilter::Warn;

fn crate_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

fn is_workspace_target(target: &str) -> bool {
    WORKSPACE_TARGETS
        .iter()
        .any(|prefix| crate_of(target).starts_with(prefix))
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn ceiling(&self, target: &str) -> LevelFilter {
        if is_workspace_target(target) {
            self.level
        } else {
            self.level.min(DEPENDENCY_LEVEL)
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.ceiling(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{:7.3}s {:>5} {}] {}\n",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            crate_of(record.target()),
            record.args()
        );
        // One write per record keeps lines whole across threads.
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger; workspace records are shown down to `level`.
///
/// Only the first call installs anything, later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut installed = false;
    let logger = LOGGER.get_or_init(|| {
        installed = true;
        StderrLogger {
            level,
            started: Instant::now(),
        }
    });
    if installed {
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Map CLI verbosity flags to a level: quiet wins over verbose.
pub fn level_from_verbosity(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (_, true) => LevelFilter::Warn,
        (true, false) => LevelFilter::Debug,
        (false, false) => LevelFilter::Info,
    }
}

/// `EnvFilter` directives matching the stderr logger's policy for `level`.
pub fn default_directives(level: LevelFilter) -> String {
    let workspace = level.to_string().to_lowercase();
    let deps = level.min(DEPENDENCY_LEVEL).to_string().to_lowercase();
    let mut directives = vec![deps];
    directives.extend(WORKSPACE_TARGETS.iter().map(|t| format!("{t}={workspace}")));
    directives.join(",")
}

/// Install a `tracing` subscriber; `RUST_LOG` overrides the level policy.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn meta(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_from_verbosity(false, false), LevelFilter::Info);
        assert_eq!(level_from_verbosity(true, false), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(true, true), LevelFilter::Warn);
    }

    #[test]
    fn dependencies_are_capped_at_warn() {
        let logger = StderrLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        assert!(logger.enabled(&meta(Level::Debug, "calib_boards_core::resolver")));
        assert!(logger.enabled(&meta(Level::Debug, "create_charuco_boards")));
        assert!(!logger.enabled(&meta(Level::Trace, "calib_boards_print")));
        assert!(!logger.enabled(&meta(Level::Info, "png::decoder")));
        assert!(logger.enabled(&meta(Level::Warn, "png::decoder")));

        let quiet = StderrLogger {
            level: LevelFilter::Error,
            started: Instant::now(),
        };
        assert!(!quiet.enabled(&meta(Level::Warn, "png")));
        assert!(!quiet.enabled(&meta(Level::Warn, "calib_boards")));
    }

    #[test]
    fn directives_follow_the_same_policy() {
        assert_eq!(
            default_directives(LevelFilter::Debug),
            "warn,calib_boards=debug,create_charuco_boards=debug"
        );
        assert_eq!(
            default_directives(LevelFilter::Error),
            "error,calib_boards=error,create_charuco_boards=error"
        );
    }

    #[test]
    fn repeated_init_is_a_noop() {
        assert!(init_with_level(LevelFilter::Warn).is_ok());
        assert!(init_with_level(LevelFilter::Debug).is_ok());
    }
}
