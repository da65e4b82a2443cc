//! buddymond - buddyinfo to InfluxDB daemon.
//!
//! Reads `/proc/buddyinfo` on a fixed interval and writes one point per
//! (node, zone) line to an InfluxDB database.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use buddymon_core::collector::{BuddyinfoCollector, RealFs};
use buddymon_core::config::{
    ConfigError, FileConfig, Overrides, Settings, default_search_dirs, find_config_file,
    local_hostname, parse_tag,
};
use buddymon_core::dispatch::Dispatcher;
use buddymon_core::point::FieldEncoding;
use buddymon_core::writer::InfluxWriter;

/// Buddyinfo to InfluxDB daemon.
#[derive(Parser, Debug)]
#[command(name = "buddymond", about = "Buddyinfo to InfluxDB daemon", version = buddymon_core::VERSION)]
struct Args {
    /// Config file path (default searches ./, $HOME/.buddymon/, /etc/buddymon/ for buddymon.toml).
    #[arg(short, long, value_name = "PATH", env = "BUDDYMON_CONFIG")]
    config: Option<PathBuf>,

    /// InfluxDB server URL [default: http://localhost:8086].
    #[arg(short = 'U', long)]
    url: Option<String>,

    /// InfluxDB database name [default: buddyinfo].
    #[arg(short, long)]
    database: Option<String>,

    /// InfluxDB username for writing.
    #[arg(short, long)]
    user: Option<String>,

    /// InfluxDB password for user authentication.
    #[arg(short, long, env = "BUDDYMON_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Measurement name to write [default: buddyinfo].
    #[arg(short, long)]
    measurement: Option<String>,

    /// Hostname for the 'host' tag [default: local hostname, lower-cased]. Long form only, -h is help.
    #[arg(long)]
    hostname: Option<String>,

    /// Do not add a 'host' tag.
    #[arg(short = 'H', long)]
    no_hostname: bool,

    /// Tags to add, e.g. dc=ams (repeat -t or separate with commas).
    #[arg(short, long = "tags", value_name = "KEY=VALUE", value_delimiter = ',', value_parser = parse_tag)]
    tags: Vec<(String, String)>,

    /// Collection interval in seconds [default: 10].
    #[arg(short, long)]
    interval: Option<u64>,

    /// HTTP request timeout in seconds [default: 5].
    #[arg(long)]
    timeout: Option<u64>,

    /// Buddyinfo file to read [default: /proc/buddyinfo].
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Field value encoding: 'text' (kernel tokens as strings) or 'integer' [default: text].
    #[arg(long, value_name = "ENCODING")]
    field_encoding: Option<FieldEncoding>,

    /// Run a single cycle and exit; the exit status reports whether it succeeded.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            database: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            measurement: self.measurement.clone(),
            hostname: self.hostname.clone(),
            no_hostname: self.no_hostname,
            tags: self.tags.clone(),
            interval_secs: self.interval,
            timeout_secs: self.timeout,
            source: self.source.clone(),
            field_encoding: self.field_encoding,
        }
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["buddymond", "buddymon_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides.
fn load_settings(args: &Args) -> Result<Settings, ConfigError> {
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(&default_search_dirs()),
    };

    let file = match config_path {
        Some(path) => {
            info!("Using config file {}", path.display());
            FileConfig::load(&path)?
        }
        None => {
            debug!("No config file found, using flags and defaults");
            FileConfig::default()
        }
    };

    Settings::resolve(file, args.overrides(), &local_hostname())
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("buddymond {} starting", buddymon_core::VERSION);

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    info!(
        "Config: source={}, interval={:?}, url={}, database={}, measurement={}",
        settings.source.display(),
        settings.interval,
        settings.influx.url,
        settings.influx.database,
        settings.measurement
    );
    info!("Global tags: {:?}", settings.tags);
    debug!("{:#?}", settings);

    let writer = match InfluxWriter::new(&settings.influx, settings.field_encoding) {
        Ok(writer) => writer,
        Err(e) => {
            error!("Failed to create InfluxDB writer: {}", e);
            process::exit(1);
        }
    };

    let collector = BuddyinfoCollector::new(RealFs::new(), &settings.source);
    let mut dispatcher = Dispatcher::new(collector, writer, settings);

    if args.once {
        let ok = dispatcher.tick();
        process::exit(if ok { 0 } else { 1 });
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    dispatcher.run(&running);

    info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_map_to_overrides() {
        let args = Args::try_parse_from([
            "buddymond",
            "-U",
            "https://influx:8086",
            "-d",
            "mem",
            "-u",
            "buddy",
            "-t",
            "dc=ams,rack=r1",
            "-t",
            "role=db",
            "-i",
            "30",
            "--field-encoding",
            "integer",
            "--no-hostname",
        ])
        .unwrap();

        let overrides = args.overrides();
        assert_eq!(overrides.url.as_deref(), Some("https://influx:8086"));
        assert_eq!(overrides.database.as_deref(), Some("mem"));
        assert_eq!(overrides.user.as_deref(), Some("buddy"));
        assert_eq!(
            overrides.tags,
            vec![
                ("dc".to_string(), "ams".to_string()),
                ("rack".to_string(), "r1".to_string()),
                ("role".to_string(), "db".to_string()),
            ]
        );
        assert_eq!(overrides.interval_secs, Some(30));
        assert_eq!(overrides.field_encoding, Some(FieldEncoding::Integer));
        assert!(overrides.no_hostname);
        assert_eq!(overrides.measurement, None);
    }

    #[test]
    fn malformed_tag_is_rejected() {
        assert!(Args::try_parse_from(["buddymond", "-t", "novalue"]).is_err());
    }

    #[test]
    fn unknown_field_encoding_is_rejected() {
        assert!(Args::try_parse_from(["buddymond", "--field-encoding", "float"]).is_err());
    }

    #[test]
    fn short_h_is_help_not_hostname() {
        let err = Args::try_parse_from(["buddymond", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn empty_tag_value_is_rejected() {
        assert!(Args::try_parse_from(["buddymond", "-t", "rack="]).is_err());
    }

    #[test]
    fn overrides_resolve_with_defaults() {
        let args = Args::try_parse_from(["buddymond", "--hostname", "web1"]).unwrap();
        let settings =
            Settings::resolve(FileConfig::default(), args.overrides(), "ignored").unwrap();

        assert_eq!(settings.influx.url, "http://localhost:8086");
        assert_eq!(settings.tags.get("host").map(String::as_str), Some("web1"));
    }
}
