//! Tracing subscriber setup shared by the service and the simulator.

use std::env;

use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging knobs read from the environment.
///
/// - `RUST_LOG`: full filter directive, wins over everything else
/// - `APP_LOG_LEVEL`: one of `trace|debug|info|warn|error`
/// - `APP_SPAN_EVENTS`: `full`, `enter_exit`, otherwise span close only
/// - `FORCE_COLOR`: `1|true|yes` or `0|false|no`, otherwise TTY detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub directive: String,
    pub span_events: SpanEvents,
    pub color: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEvents {
    Close,
    EnterExit,
    Full,
}

impl SpanEvents {
    fn as_fmt_span(self) -> FmtSpan {
        match self {
            SpanEvents::Close => FmtSpan::CLOSE,
            SpanEvents::EnterExit => FmtSpan::ENTER | FmtSpan::EXIT,
            SpanEvents::Full => FmtSpan::FULL,
        }
    }
}

impl LogSettings {
    pub fn from_env(default_level: &str) -> Self {
        Self::from_lookup(default_level, |key| env::var(key).ok())
    }

    /// `default_level` applies when neither `RUST_LOG` nor a valid
    /// `APP_LOG_LEVEL` is set. sqlx query logging is held at `warn` unless
    /// `RUST_LOG` says otherwise.
    pub fn from_lookup<F>(default_level: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // ---
        let directive = match lookup("RUST_LOG").filter(|v| !v.trim().is_empty()) {
            Some(rust_log) => rust_log,
            None => {
                let level = lookup("APP_LOG_LEVEL")
                    .map(|v| v.trim().to_ascii_lowercase())
                    .filter(|v| LEVELS.contains(&v.as_str()))
                    .unwrap_or_else(|| default_level.to_string());
                format!("{level},sqlx::query=warn")
            }
        };

        let span_events = match lookup("APP_SPAN_EVENTS").as_deref() {
            Some("full") => SpanEvents::Full,
            Some("enter_exit") => SpanEvents::EnterExit,
            _ => SpanEvents::Close,
        };

        let color = match lookup("FORCE_COLOR").as_deref() {
            Some("1" | "true" | "yes") => Some(true),
            Some("0" | "false" | "no") => Some(false),
            _ => None,
        };

        Self {
            directive,
            span_events,
            color,
        }
    }
}

/// Install the global subscriber. Call once, before any logging.
pub fn init(settings: &LogSettings) {
    // ---
    let use_color = settings
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(settings.span_events.as_fmt_span())
        .with_env_filter(EnvFilter::new(&settings.directive))
        .with_ansi(use_color)
        .compact()
        .init();
}
