//! Logging facade for storage backends.
//!
//! Stores receive a [`Logger`] at construction and report every operation
//! through it. [`NoopLogger`] is substituted when none is configured and
//! [`TracingLogger`] forwards to the `tracing` ecosystem.

use std::fmt;
use std::sync::Arc;

/// Target used for events emitted by [`TracingLogger`].
pub const LOG_TARGET: &str = "oauth2_store";

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the upper-case level name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured key-value attribute attached to a log message.
pub type Attr<'a> = (&'a str, &'a dyn fmt::Display);

/// Sink for store log messages.
pub trait Logger: Send + Sync {
    /// Log a message with structured attributes.
    fn log(&self, level: LogLevel, message: &str, attrs: &[Attr<'_>]);
}

/// Shared, thread-safe logger handle.
pub type SharedLogger = Arc<dyn Logger>;

/// Logger that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str, _attrs: &[Attr<'_>]) {}
}

/// Logger that emits `tracing` events under [`LOG_TARGET`].
///
/// Attributes are rendered into a single `attrs` field as `key=value` pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, attrs: &[Attr<'_>]) {
        let attrs = AttrList(attrs);
        match level {
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, attrs = %attrs, "{message}"),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, attrs = %attrs, "{message}"),
            LogLevel::Warn => tracing::warn!(target: LOG_TARGET, attrs = %attrs, "{message}"),
            LogLevel::Error => tracing::error!(target: LOG_TARGET, attrs = %attrs, "{message}"),
        }
    }
}

/// Space-separated `key=value` rendering of an attribute slice.
pub struct AttrList<'a>(pub &'a [Attr<'a>]);

impl fmt::Display for AttrList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for Recorder {
        fn log(&self, level: LogLevel, message: &str, attrs: &[Attr<'_>]) {
            self.lines
                .lock()
                .unwrap()
                .push(format!("{level} {message} {}", AttrList(attrs)));
        }
    }

    #[test]
    fn test_level_names() {
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::Info.to_string(), "INFO");
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn test_attr_list_rendering() {
        let id = "app-1";
        let rows = 3u64;
        let attrs: [Attr<'_>; 2] = [("id", &id), ("rows", &rows)];

        assert_eq!(AttrList(&attrs).to_string(), "id=app-1 rows=3");
        assert_eq!(AttrList(&[]).to_string(), "");
    }

    #[test]
    fn test_shared_logger_dispatch() {
        let recorder = Arc::new(Recorder::default());
        let logger: SharedLogger = recorder.clone();

        logger.log(LogLevel::Warn, "no code was provided", &[]);
        logger.log(LogLevel::Debug, "client found", &[("id", &"app-1")]);

        let lines = recorder.lines.lock().unwrap();
        assert_eq!(lines[0], "WARN no code was provided ");
        assert_eq!(lines[1], "DEBUG client found id=app-1");
    }

    #[test]
    fn test_noop_and_tracing_loggers_accept_messages() {
        NoopLogger.log(LogLevel::Error, "ignored", &[("k", &1)]);
        TracingLogger.log(LogLevel::Info, "token removed", &[("rows", &1)]);
    }
}
