//! crates/logging/src/tracing_bridge.rs
//! Bridge between the tracing crate and the `-v` category levels.
//!
//! [`ScpLayer`] is a tracing-subscriber layer that maps each event's target to
//! a [`LogFlag`], consults the [`VerbosityConfig`] and writes the events that
//! pass as single `oc-scp: ...` lines. Warnings and errors are prefixed with
//! `warning:` / `error:`.
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! init_tracing(VerbosityConfig::from_verbose_level(1))?;
//! tracing::debug!(target: "scp::name", path = "dir/file", "file");
//! ```

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use super::config::VerbosityConfig;
use super::levels::LogFlag;

/// Prefix of every line written by [`ScpLayer`].
pub const DIAGNOSTIC_PREFIX: &str = "oc-scp";

/// Environment variable holding developer tracing directives.
pub const LOG_ENV: &str = "OC_SCP_LOG";

/// A tracing layer that renders enabled events as diagnostics.
pub struct ScpLayer {
    config: VerbosityConfig,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ScpLayer {
    /// Creates a layer writing to standard error.
    #[must_use]
    pub fn new(config: VerbosityConfig) -> Self {
        Self::with_writer(config, io::stderr())
    }

    /// Creates a layer writing to `writer`.
    pub fn with_writer<W>(config: VerbosityConfig, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            config,
            writer: Mutex::new(Box::new(writer)),
        }
    }

    const fn level_to_verbosity_level(level: &Level) -> u8 {
        match *level {
            Level::ERROR | Level::WARN | Level::INFO => 1,
            Level::DEBUG => 2,
            Level::TRACE => 3,
        }
    }

    fn should_emit(&self, target: &str, level: &Level) -> bool {
        if self.config.quiet && *level > Level::WARN {
            return false;
        }
        match LogFlag::from_target(target) {
            Some(flag) => self
                .config
                .enabled(flag, Self::level_to_verbosity_level(level)),
            None => *level <= Level::WARN,
        }
    }

    fn render(level: &Level, visitor: &MessageVisitor) -> String {
        let mut line = format!("{DIAGNOSTIC_PREFIX}: ");
        match *level {
            Level::ERROR => line.push_str("error: "),
            Level::WARN => line.push_str("warning: "),
            _ => {}
        }
        line.push_str(visitor.message.as_deref().unwrap_or_default());
        for (name, value) in &visitor.fields {
            let _ = write!(line, " {name}={value}");
        }
        line.push('\n');
        line
    }
}

impl<S> Layer<S> for ScpLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.should_emit(metadata.target(), metadata.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let line = Self::render(metadata.level(), &visitor);

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.write_all(line.as_bytes());
            let _ = writer.flush();
        }
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push((field.name(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push((field.name(), value.to_owned()));
        }
    }
}

/// Installs [`ScpLayer`] on standard error as the global subscriber.
///
/// When `OC_SCP_LOG` holds valid filter directives, a `fmt` layer filtered by
/// them is stacked on top for developer tracing.
///
/// # Errors
///
/// Fails when a global subscriber has already been installed.
pub fn init_tracing(config: VerbosityConfig) -> Result<(), TryInitError> {
    let developer = EnvFilter::try_from_env(LOG_ENV).ok().map(|filter| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(ScpLayer::new(config))
        .with(developer)
        .try_init()
}
