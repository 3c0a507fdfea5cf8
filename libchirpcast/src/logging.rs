//! Log output for the post pipeline
//!
//! Everything goes to stderr so stdout stays free for the posted URL or the
//! JSON result. Format and level come from `CHIRPCAST_LOG_FORMAT` and
//! `CHIRPCAST_LOG_LEVEL`; `RUST_LOG` overrides the level filter when set.
//!
//! ```no_run
//! use libchirpcast::logging::{LogFormat, LoggingConfig};
//!
//! // Explicit settings
//! LoggingConfig::new(LogFormat::Json, "info".to_string(), false).init();
//!
//! // Or resolved from the environment, quiet unless asked otherwise
//! libchirpcast::logging::init_from_env("warn", false);
//! ```

use std::str::FromStr;

/// Selects the output format
pub const LOG_FORMAT_ENV: &str = "CHIRPCAST_LOG_FORMAT";
/// Selects the minimum level
pub const LOG_LEVEL_ENV: &str = "CHIRPCAST_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain lines without target or color, suitable for piping
    Text,
    /// One JSON object per event, with the run span attached
    Json,
    /// Multi-line colored output
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    /// Forces `debug` unless `RUST_LOG` says otherwise
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Resolve format and level through `lookup`
    ///
    /// An unset or unrecognized format falls back to text; an unset or
    /// blank level falls back to `default_level`.
    pub fn from_lookup<F>(lookup: F, default_level: &str, verbose: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = lookup(LOG_FORMAT_ENV)
            .and_then(|value| value.parse().ok())
            .unwrap_or(LogFormat::Text);
        let level = lookup(LOG_LEVEL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_level.to_string());

        Self::new(format, level, verbose)
    }

    /// Level directive used when `RUST_LOG` is absent
    pub fn effective_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber
    ///
    /// Uses `try_init`, so only the first call in a process has any effect.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.effective_level()));

        let _ = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init(),
        };
    }
}

/// Install the subscriber with settings read from the process environment
pub fn init_from_env(default_level: &str, verbose: bool) {
    LoggingConfig::from_lookup(|key| std::env::var(key).ok(), default_level, verbose).init();
}

/// Make `text` safe to put on a single log line
///
/// Newlines and tabs become spaces, other control characters become `?`, and
/// anything beyond `max_chars` characters is cut with a marker.
pub fn sanitize_for_logging(text: &str, max_chars: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    let total = sanitized.chars().count();
    if total > max_chars {
        let head: String = sanitized.chars().take(max_chars).collect();
        format!("{}... [truncated, {} total chars]", head, total)
    } else {
        sanitized
    }
}
