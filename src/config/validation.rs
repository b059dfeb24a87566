use crate::config::types::{BackoffKind, ClientConfig, Config, DomainRetryEntry, RetryConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Host;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_retry_config("retry", &config.retry)?;
    validate_domain_entries(&config.domains, &config.retry)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates one retry section; `scope` names it in error messages
fn validate_retry_config(scope: &str, config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "{}: max_attempts must be >= 1, got {}",
            scope, config.max_attempts
        )));
    }

    if config.backoff != BackoffKind::Fixed && config.max_delay_ms < config.retry_delay_ms {
        return Err(ConfigError::Validation(format!(
            "{}: max_delay_ms ({}) must be >= retry_delay_ms ({})",
            scope, config.max_delay_ms, config.retry_delay_ms
        )));
    }

    if config.deadline_secs == Some(0) {
        return Err(ConfigError::Validation(format!(
            "{}: deadline_secs must be >= 1",
            scope
        )));
    }

    Ok(())
}

/// Validates per-domain entries against the defaults they inherit from
fn validate_domain_entries(
    entries: &[DomainRetryEntry],
    defaults: &RetryConfig,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in entries {
        let host = normalize_domain(&entry.domain)?;

        if !seen.insert(host) {
            return Err(ConfigError::Validation(format!(
                "Domain '{}' is configured more than once",
                entry.domain
            )));
        }

        validate_retry_config(&entry.domain, &entry.resolve(defaults))?;
    }

    Ok(())
}

/// Validates a hostname used as a domain key and returns it in the form
/// URL hosts take: lowercase, punycode for internationalized names, and
/// brackets around IPv6 addresses
pub(crate) fn normalize_domain(domain: &str) -> Result<String, ConfigError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Domain keys are exact hostnames
    if domain.contains('*') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must be an exact hostname, wildcards are not supported",
            domain
        )));
    }

    let host = Host::parse(domain).map_err(|e| {
        ConfigError::InvalidPattern(format!("Domain '{}' is not a valid host: {}", domain, e))
    })?;

    // IP addresses are already canonical
    if let Host::Domain(name) = &host {
        validate_domain_name(domain, name)?;
    }

    Ok(host.to_string())
}

/// Checks an ASCII domain name; `original` is the configured spelling
fn validate_domain_name(original: &str, name: &str) -> Result<(), ConfigError> {
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            original
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if name.starts_with('.') || name.ends_with('.') || name.starts_with('-') || name.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            original
        )));
    }

    // Check for consecutive dots
    if name.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            original
        )));
    }

    Ok(())
}
