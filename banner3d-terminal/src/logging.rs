//! Logger setup for the terminal front-end
//!
//! The banner owns the screen while it runs, so log lines go to a file when
//! one is given and are otherwise limited to warnings.
use std::fs::File;
use std::path::PathBuf;
use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "banner3d_core=debug").
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub log_file: Option<PathBuf>,
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        if let Some(path) = &config.log_file {
            match File::create(path) {
                Ok(file) => {
                    builder
                        .target(env_logger::Target::Pipe(Box::new(file)))
                        .write_style(env_logger::WriteStyle::Never);
                }
                Err(err) => eprintln!("cannot open log file {}: {err}", path.display()),
            }
        }

        builder.init();

        log::debug!("logging initialized");
    });
}
