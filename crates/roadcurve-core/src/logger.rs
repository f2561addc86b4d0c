//! Stderr logging for the CLI and for library users without a logger.
//!
//! `init_with_level` installs a `log` backend printing lines such as
//! `[    1.500s INFO  search::pipeline] frame 640x480: best straight`.
//! With the `tracing` feature, `init_tracing` installs a `tracing-subscriber`
//! that also reports span timings. Both write to stderr so that stdout stays
//! free for per-frame results.

use std::fmt::{Display, Write as _};
use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// `RUST_LOG` fallback for `init_tracing`: the roadcurve crates at info,
/// everything else at warn.
#[cfg(feature = "tracing")]
pub const DEFAULT_TRACING_FILTER: &str =
    "warn,roadcurve=info,roadcurve_core=info,roadcurve_search=info";

/// Drop the crate prefix of our own targets; foreign targets stay whole.
fn short_target(target: &str) -> &str {
    match target.split_once("::") {
        Some((krate, rest)) if krate.starts_with("roadcurve") => rest,
        _ => target,
    }
}

fn format_line(elapsed: Duration, level: Level, target: &str, message: impl Display) -> String {
    let mut line = String::with_capacity(96);
    let _ = write!(
        line,
        "[{:9.3}s {:<5} {}] {}",
        elapsed.as_secs_f64(),
        level,
        short_target(target),
        message
    );
    line
}

struct RunLogger {
    level: LevelFilter,
    origin: Instant,
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.origin.elapsed(),
            record.level(),
            record.target(),
            record.args(),
        );
        // One write per line so parallel candidate workers never interleave.
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<RunLogger> = OnceLock::new();

/// Install the stderr logger at `level`. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| RunLogger {
        level,
        origin: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber on stderr, as JSON lines when `json` is set.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt::{self, format::FmtSpan};
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACING_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_targets_lose_the_crate_prefix() {
        assert_eq!(short_target("roadcurve_search::search::pipeline"), "search::pipeline");
        assert_eq!(short_target("roadcurve::stream"), "stream");
        assert_eq!(short_target("roadcurve_core"), "roadcurve_core");
        assert_eq!(short_target("image::codecs::png"), "image::codecs::png");
    }

    #[test]
    fn line_has_elapsed_level_and_target() {
        let line = format_line(
            Duration::from_millis(1500),
            Level::Info,
            "roadcurve_search::search::pipeline",
            "best straight",
        );
        assert_eq!(line, "[    1.500s INFO  search::pipeline] best straight");

        let warn = format_line(Duration::ZERO, Level::Warn, "roadcurve::stream", 3);
        assert_eq!(warn, "[    0.000s WARN  stream] 3");
    }
}
