//! Level-filtered logger handed to plugins.
//!
//! Messages are forwarded to `tracing`; the library never installs a
//! subscriber.

use tracing::{debug, error, info, warn};

use crate::request::LogLevel;

#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    plugin: String,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            plugin: String::new(),
        }
    }

    /// A logger tagging events with `plugin`.
    pub fn for_plugin(&self, plugin: &str) -> Self {
        Self {
            level: self.level,
            plugin: plugin.to_string(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && self.level != LogLevel::None && level >= self.level
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let plugin = self.plugin.as_str();
        match level {
            LogLevel::Verbose => debug!(plugin, "{message}"),
            LogLevel::Info => info!(plugin, "{message}"),
            LogLevel::Warning => warn!(plugin, "{message}"),
            LogLevel::Error => error!(plugin, "{message}"),
            LogLevel::None => {}
        }
    }

    pub fn verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filtering() {
        let logger = Logger::new(LogLevel::Warning);
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warning));
        assert!(logger.enabled(LogLevel::Error));

        let silent = Logger::new(LogLevel::None);
        assert!(!silent.enabled(LogLevel::Error));

        let verbose = Logger::new(LogLevel::Verbose).for_plugin("model");
        assert!(verbose.enabled(LogLevel::Verbose));
        assert_eq!(verbose.level(), LogLevel::Verbose);
    }
}
