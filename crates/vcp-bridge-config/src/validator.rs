//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Collapse into the first error, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_connection(config, &mut result);
        Self::validate_reconnect(config, &mut result);
        Self::validate_observer(config, &mut result);
        Self::validate_browser(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if let Some(url) = &config.server.url {
            let lower = url.trim().to_ascii_lowercase();
            if !lower.starts_with("ws://") && !lower.starts_with("wss://") {
                result.add_error(ValidationError::new(
                    "server.url",
                    "Server URL must start with ws:// or wss://",
                ));
            }
        }

        if config.server.key.as_deref().is_some_and(|k| k.is_empty()) {
            result.add_warning(ValidationWarning::new(
                "server.key",
                "Empty key, the server will most likely reject the connection",
            ));
        }
    }

    fn validate_connection(config: &Config, result: &mut ValidationResult) {
        if config.connection.heartbeat_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "connection.heartbeat_interval_secs",
                "heartbeat_interval_secs must be greater than 0",
            ));
        }

        if config.connection.send_buffer == 0 {
            result.add_error(ValidationError::new(
                "connection.send_buffer",
                "send_buffer must be greater than 0",
            ));
        }
    }

    fn validate_reconnect(config: &Config, result: &mut ValidationResult) {
        let reconnect = &config.reconnect;
        if !reconnect.enabled {
            return;
        }

        if reconnect.initial_delay_ms == 0 {
            result.add_error(ValidationError::new(
                "reconnect.initial_delay_ms",
                "initial_delay_ms must be greater than 0",
            ));
        }

        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            result.add_error(ValidationError::new(
                "reconnect.max_delay_ms",
                "max_delay_ms must not be smaller than initial_delay_ms",
            ));
        }
    }

    fn validate_observer(config: &Config, result: &mut ValidationResult) {
        let observer = &config.observer;

        if observer.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "observer.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }

        if observer.debounce_ms >= observer.poll_interval_ms && observer.poll_interval_ms > 0 {
            result.add_warning(ValidationWarning::new(
                "observer.debounce_ms",
                "debounce_ms is not shorter than poll_interval_ms, mutation-driven updates will rarely fire",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let endpoint = config.browser.cdp_endpoint.trim();
        if endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "browser.cdp_endpoint",
                "cdp_endpoint cannot be empty",
            ));
        } else if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            result.add_error(ValidationError::new(
                "browser.cdp_endpoint",
                "cdp_endpoint must be an http:// or https:// URL",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
