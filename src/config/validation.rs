use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth, max_urls and max_bytes use 0 for "unlimited", so any value is fine

    if config.url_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "url_timeout must be >= 1 second, got {}",
            config.url_timeout
        )));
    }

    if config.commit_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "commit_interval must be >= 1, got {}",
            config.commit_interval
        )));
    }

    if config.max_content_size < 1 {
        return Err(ConfigError::Validation(
            "max_content_size must be >= 1 byte".to_string(),
        ));
    }

    for host in &config.hosts {
        validate_host_entry(host)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates an allow-host entry (a host name suffix)
pub fn validate_host_entry(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation(
            "host entries cannot be empty".to_string(),
        ));
    }

    if host.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "host entry '{}' contains whitespace",
            host
        )));
    }

    if host.contains('/') {
        return Err(ConfigError::Validation(format!(
            "host entry '{}' must be a host name, not a URL",
            host
        )));
    }

    Ok(())
}
