//! Badge simulator binary.
//!
//! Boots the badge runtime in a terminal.

use std::{
    error::Error,
    io::{self, BufReader},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use badge_kernel::{KernelConfig, Shutdown, StartReason};
use badge_sim::{
    Journal, JournalLayer, KeySource, Script, SimOptions,
    journal::DEFAULT_MAX_ENTRIES,
    runtime::{held_keys, load_config},
};
use clap::{Parser, ValueEnum};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "badge-sim")]
#[command(about = "Run the badge runtime in a terminal")]
#[command(version)]
struct Args {
    /// Why the badge starts
    #[arg(long, value_enum, default_value = "normal")]
    reason: Reason,

    /// Kernel configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Settings file; settings are kept in memory when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Key script; commands are read from stdin when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    /// Keys held at boot, e.g. `console.b` for the self-test
    #[arg(long, value_delimiter = ',')]
    hold: Vec<String>,

    /// Real time per frame in milliseconds
    #[arg(long, default_value_t = 0)]
    frame_ms: u64,

    /// Journal file for warnings and errors
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Entries kept in the journal
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    journal_entries: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Reason {
    Normal,
    WifiSetup,
    BackendSetup,
    NameSetup,
    Registration,
    Special,
    Sleep,
}

impl From<Reason> for StartReason {
    fn from(reason: Reason) -> Self {
        match reason {
            Reason::Normal => Self::Normal,
            Reason::WifiSetup => Self::WifiSetup,
            Reason::BackendSetup => Self::BackendSetup,
            Reason::NameSetup => Self::NameSetup,
            Reason::Registration => Self::Registration,
            Reason::Special => Self::Special,
            Reason::Sleep => Self::Sleep,
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let journal = args
        .journal
        .as_ref()
        .map(|path| JournalLayer::new(Journal::open(path, args.journal_entries), Level::WARN));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .with(journal)
        .init();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => KernelConfig::default(),
    };
    let keys = match &args.script {
        Some(path) => KeySource::scripted(Script::load(path)?),
        None => KeySource::interactive(Box::new(BufReader::new(io::stdin()))),
    };
    for code in held_keys(&args.hold)? {
        keys.hold(code);
    }

    let options = SimOptions {
        reason: args.reason.into(),
        config,
        settings: args.settings,
        keys,
        frame: Duration::from_millis(args.frame_ms),
    };
    let shutdown = badge_sim::run(options, io::stdout());
    tracing::info!(?shutdown, "badge stopped");

    Ok(match shutdown {
        Shutdown::Fatal => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
