use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use depspider::config::load_config;
///
/// let config = load_config(Path::new("depspider.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the file when one is given, otherwise returns the defaults
pub fn load_config_or_default(path: Option<&Path>) -> ConfigResult<Config> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-depth = 3
max-urls = 100
max-bytes = 5000000
url-timeout = 10
hosts = ["cdn.example.com", "static.example.net"]
commit-interval = 5

[user-agent]
agent = "TestSpider/1.0"

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_urls, 100);
        assert_eq!(config.crawler.max_bytes, 5_000_000);
        assert_eq!(config.crawler.url_timeout, 10);
        assert_eq!(config.crawler.hosts.len(), 2);
        assert_eq!(config.crawler.commit_interval, 5);
        assert_eq!(config.user_agent.agent, "TestSpider/1.0");
        assert_eq!(config.output.database_path, "./test.db");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("[crawler]\nmax-urls = 7\n").unwrap();

        assert_eq!(config.crawler.max_urls, 7);
        assert_eq!(config.crawler.max_depth, 30);
        assert_eq!(config.crawler.url_timeout, 5);
        assert_eq!(config.crawler.commit_interval, 20);
        assert_eq!(config.output.database_path, "crawl.sqlite3");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawler.max_depth, 30);
        assert!(config.crawler.hosts.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/depspider.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\nurl-timeout = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_no_path_gives_defaults() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.crawler.url_timeout, 5);
    }
}
