//! Tracing setup for the library and the streaming binary.
//!
//! `RUST_LOG` always wins over the configured directives. Installation is
//! guarded by a `Once`, so tests and the binary may both call [`init_tracing`].

use std::sync::Once;
use std::time::Instant;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const CORE_TARGETS: [&str; 3] = [
    "vasteria_core::generation",
    "vasteria_core::streaming",
    "vasteria_core::hotreload",
];

/// Output layout of the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for every target without its own directive
    pub level: LevelFilter,
    /// Per-target overrides, `(target, level)`
    pub directives: Vec<(String, LevelFilter)>,
    pub format: LogFormat,
    pub file_lines: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let mut directives: Vec<(String, LevelFilter)> = CORE_TARGETS
            .iter()
            .map(|target| (target.to_string(), LevelFilter::INFO))
            .collect();
        // schedule executor noise
        directives.push(("bevy_ecs".to_string(), LevelFilter::WARN));
        Self {
            level: LevelFilter::INFO,
            directives,
            format: LogFormat::Compact,
            file_lines: false,
        }
    }
}

impl TracingConfig {
    /// Chunk-level detail: generation and streaming targets at `debug`
    pub fn verbose(self) -> Self {
        CORE_TARGETS
            .iter()
            .fold(self, |config, target| config.with_directive(target, LevelFilter::DEBUG))
    }

    /// Set the level of one target, replacing an existing directive for it
    pub fn with_directive(mut self, target: &str, level: LevelFilter) -> Self {
        match self.directives.iter_mut().find(|(t, _)| t == target) {
            Some((_, existing)) => *existing = level,
            None => self.directives.push((target.to_string(), level)),
        }
        self
    }

    /// `EnvFilter` syntax, e.g. `info,vasteria_core::streaming=debug`
    pub fn filter_string(&self) -> String {
        std::iter::once(level_name(self.level))
            .chain(
                self.directives
                    .iter()
                    .map(|(target, level)| format!("{target}={}", level_name(*level))),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(self.level.into())
                .parse_lossy(self.filter_string())
        })
    }
}

fn level_name(level: LevelFilter) -> String {
    level.to_string().to_ascii_lowercase()
}

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber. Returns `false` if this or another call
/// already installed one.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_file(config.file_lines)
            .with_line_number(config.file_lines);
        installed = match config.format {
            LogFormat::Compact => builder.compact().try_init().is_ok(),
            LogFormat::Full => builder.try_init().is_ok(),
        };
    });
    installed
}

/// Span around one operation that logs its wall time at `debug` when dropped
pub struct TimingSpan {
    name: &'static str,
    started: Instant,
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            started: Instant::now(),
            _span: tracing::info_span!("timed", op = name).entered(),
        }
    }
}

impl Drop for TimingSpan {
    fn drop(&mut self) {
        let elapsed_us = self.started.elapsed().as_micros() as u64;
        tracing::debug!(op = self.name, elapsed_us, "Operation finished");
    }
}
