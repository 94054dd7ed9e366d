//! Utilities: logging setup (tracing subscriber on stderr, level from
//! -v/-q unless RUST_LOG says otherwise).
//!
//! Key items:
//!   init_logging / derive_level

/// Logging helpers.
pub mod logging {
    use tracing_subscriber::EnvFilter;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        /// Directive understood by `EnvFilter`.
        pub fn as_filter(&self) -> &'static str {
            match self {
                LogLevel::Error => "error",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
                LogLevel::Trace => "trace",
            }
        }
    }

    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Install the global subscriber. Logs go to stderr so stdout stays
    /// clean for command output and `--json`. A second call is a no-op.
    pub fn init_logging(level: LogLevel) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

}

pub use logging::{derive_level, init_logging};
