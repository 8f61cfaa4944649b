use super::{Args, LogArgs};

use clap::Parser;
use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::Layer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn get_log_level(args: LogArgs) -> LevelFilter {
    if args.quiet {
        return LevelFilter::ERROR;
    }

    if let Ok(rust_log) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if let Ok(level) = LevelFilter::from_str(&rust_log) {
            return level;
        }
    }

    verbosity_level(args.verbosity)
}

fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber, returning the guard flushing the log writer and
/// whether ANSI colours are in use.
pub fn init_global_subscriber(args: LogArgs) -> (WorkerGuard, bool) {
    let log_level = get_log_level(args);

    let env_filter = EnvFilter::from_default_env().add_directive(log_level.into());

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    let ansi = std::io::stderr().is_terminal();
    let fmt = if ansi {
        fmt::layer()
            .without_time()
            .with_writer(non_blocking)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(non_blocking)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt)
        .with(env_filter)
        .with(ErrorLayer::default())
        .init();

    if log_level == LevelFilter::TRACE {
        tracing::trace!(args = ?redacted_args(std::env::args()), "command line");
        let _ = Args::parse();
    }

    (guard, ansi)
}

const TOKEN_FLAG: &str = "--token";
const REDACTED: &str = "<redacted>";

/// The command line with the value given to `--token` masked.
fn redacted_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut secret_follows = false;
    args.into_iter()
        .map(|arg| {
            if std::mem::take(&mut secret_follows) {
                return REDACTED.to_owned();
            }
            if arg == TOKEN_FLAG {
                secret_follows = true;
                arg
            } else if arg.starts_with("--token=") {
                format!("{TOKEN_FLAG}={REDACTED}")
            } else {
                arg
            }
        })
        .collect()
}

type ProgressRange = std::ops::RangeInclusive<prodash::progress::key::Level>;
/// Per collection progress items sit two levels below the root.
const STANDARD_RANGE: ProgressRange = 2..=2;

/// A progress tree rendered to stderr for as long as it is alive.
pub(super) struct Progress {
    pub root: Arc<prodash::tree::Root>,
    handle: Option<prodash::render::line::JoinHandle>,
}

impl Progress {
    /// Start rendering a new progress tree, unless `quiet` is set.
    pub fn start(quiet: bool) -> Self {
        let root = prodash::tree::Root::new();
        let handle = (!quiet).then(|| setup_line_renderer(&root));
        Progress { root, handle }
    }

    /// Stop rendering, clearing the progress lines.
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown_and_wait();
        }
    }
}

fn setup_line_renderer(progress: &Arc<prodash::tree::Root>) -> prodash::render::line::JoinHandle {
    prodash::render::line(
        std::io::stderr(),
        Arc::downgrade(progress),
        prodash::render::line::Options {
            level_filter: Some(STANDARD_RANGE),
            initial_delay: Some(std::time::Duration::from_millis(500)),
            throughput: true,
            ..prodash::render::line::Options::default()
        }
        .auto_configure(prodash::render::line::StreamKind::Stderr),
    )
}
