use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;

use thermobind::backend::Backend;
use thermobind::backend::statefile::StateFile;
use thermobind::backend::stdio::{StdioBackend, StdioEndpoint};
use thermobind::config;
use thermobind::device::ThermostatDevice;
use thermobind::error::BindResult;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

/*
 * Formatter function to output in syslog format. This makes sense when running
 * as a service (where output might go to a log file, or the system journal)
 */
#[allow(clippy::match_same_arms)]
fn syslog_format(
    buf: &mut pretty_env_logger::env_logger::fmt::Formatter,
    record: &log::Record,
) -> std::io::Result<()> {
    writeln!(
        buf,
        "<{}>{}: {}",
        match record.level() {
            log::Level::Error => 3,
            log::Level::Warn => 4,
            log::Level::Info => 6,
            log::Level::Debug => 7,
            log::Level::Trace => 7,
        },
        record.target(),
        record.args()
    )
}

fn init_logging() -> BindResult<()> {
    /* Try to provide reasonable default filters, when RUST_LOG is not specified */
    const DEFAULT_LOG_FILTERS: &[&str] = &["info", "thermobind=debug"];

    let log_filters = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTERS.join(","));

    /* Detect if we need syslog or human-readable formatting */
    if std::env::var("SYSTEMD_EXEC_PID").is_ok_and(|pid| pid == std::process::id().to_string()) {
        Ok(pretty_env_logger::env_logger::builder()
            .format(syslog_format)
            .parse_filters(&log_filters)
            .try_init()?)
    } else {
        Ok(pretty_env_logger::formatted_timed_builder()
            .parse_filters(&log_filters)
            .try_init()?)
    }
}

async fn run() -> BindResult<()> {
    init_logging()?;

    let args = Args::parse();

    let conf = config::parse(&Utf8PathBuf::from(args.config))?;
    log::debug!("Configuration loaded successfully");

    let store = Arc::new(StateFile::load(&conf.thermobind.state_file)?);
    let (endpoint, outbound) = StdioEndpoint::new();

    let device = ThermostatDevice::init(&conf, store, endpoint.clone()).await;

    let backend = StdioBackend::new(
        device,
        endpoint,
        outbound,
        tokio::io::stdin(),
        tokio::io::stdout(),
    );

    tokio::select! {
        res = backend.run_forever() => res?,
        res = tokio::signal::ctrl_c() => {
            res?;
            log::warn!("Ctrl-C pressed, exiting..");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            log::error!("Thermobind error: {err}");
            log::error!("Fatal error encountered, cannot continue.");
            1
        }
    };

    /* a blocked stdin read would otherwise hold up runtime shutdown */
    std::process::exit(code);
}
