use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
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
/// use page_analyzer::config::load_config;
///
/// let config = load_config(Path::new("analyzer.toml")).unwrap();
/// println!("Request timeout: {}s", config.client.request_timeout_secs);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
///
/// # Returns
///
/// * `Ok(Config)` - Valid configuration; missing keys take their defaults
/// * `Err(ConfigError)` - The text is not valid TOML or fails validation
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 digest of configuration text
///
/// Logged at startup so a report can be matched to the configuration that
/// produced it.
pub fn hash_config(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration and returns it with the hash of the text it was parsed from
///
/// The file is read once, so the hash always describes the loaded configuration.
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_config(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
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
[analyzer]
analysis-workers = 4
probe-concurrency = 16
queue-capacity = 8

[client]
user-agent = "TestAnalyzer/1.0"
request-timeout-secs = 10
connect-timeout-secs = 2
max-redirects = 5

[output]
format = "markdown"
report-path = "./report.md"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.analyzer.analysis_workers, Some(4));
        assert_eq!(config.analyzer.probe_concurrency, 16);
        assert_eq!(config.analyzer.queue_capacity, Some(8));
        assert_eq!(config.client.user_agent, "TestAnalyzer/1.0");
        assert_eq!(config.client.max_redirects, 5);
        assert_eq!(config.output.format, OutputFormat::Markdown);
        assert_eq!(
            config.output.report_path.as_deref(),
            Some(Path::new("./report.md"))
        );
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.analyzer.probe_concurrency, 10);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        let result = parse_config("[output]\nformat = \"yaml\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[analyzer]
probe-concurrency = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_hash_config() {
        assert_eq!(hash_config("test content"), hash_config("test content"));
        assert_eq!(hash_config("test content").len(), 64);
        assert_eq!(
            hash_config(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_loaded_hash_matches_file_content() {
        let content = "[analyzer]\nprobe-concurrency = 4\n";
        let file = create_temp_config(content);

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.analyzer.probe_concurrency, 4);
        assert_eq!(hash, hash_config(content));
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("[client]\nmax-redirects = 1\n");
        let file2 = create_temp_config("[client]\nmax-redirects = 2\n");

        let (config1, hash1) = load_config_with_hash(file1.path()).unwrap();
        let (config2, hash2) = load_config_with_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
        assert_ne!(config1.client.max_redirects, config2.client.max_redirects);
    }
}
