//! Configuration management for downmark.
//!
//! Parses `downmark.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - every value of `[attributes]`
//! - `output.extension`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "downmark.toml";

/// A document attribute change requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOverride {
    /// Set the attribute, replacing any configured value.
    Set(String, String),
    /// Remove a configured attribute.
    Unset(String),
}

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Attribute changes, applied in order after the `[attributes]` table.
    pub attributes: Vec<AttributeOverride>,
    /// Override the output file extension.
    pub extension: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seed attributes passed to every conversion.
    pub attributes: BTreeMap<String, String>,
    /// Output file settings.
    pub output: OutputConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Output file settings.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Extension of the output file derived from the input path.
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: "md".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`attributes.url-repo`").
        field: String,
        /// Error message (e.g., "${`REPO_URL`} not set").
        message: String,
    },
}

/// Check whether `name` can be used as a document attribute name.
///
/// Names are non-empty and made of ASCII letters, digits, `-` and `_`.
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `downmark.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, so they take precedence over
    /// config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        for change in &settings.attributes {
            match change {
                AttributeOverride::Set(name, value) => {
                    self.attributes.insert(name.clone(), value.clone());
                }
                AttributeOverride::Unset(name) => {
                    self.attributes.remove(name);
                }
            }
        }
        if let Some(extension) = &settings.extension {
            self.output.extension.clone_from(extension);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        discover_config_from(&cwd)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        tracing::debug!(path = %path.display(), attributes = config.attributes.len(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_attributes()?;
        self.validate_output()?;
        Ok(())
    }

    fn validate_attributes(&self) -> Result<(), ConfigError> {
        if let Some(name) = self
            .attributes
            .keys()
            .find(|name| !is_valid_attribute_name(name))
        {
            return Err(ConfigError::Validation(format!(
                "invalid attribute name '{name}': use letters, digits, '-' and '_'"
            )));
        }
        Ok(())
    }

    fn validate_output(&self) -> Result<(), ConfigError> {
        let extension = &self.output.extension;
        if extension.is_empty() {
            return Err(ConfigError::Validation(
                "output.extension cannot be empty".to_owned(),
            ));
        }
        if extension.starts_with('.') || extension.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "output.extension must be a bare extension, got '{extension}'"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        for (name, value) in &mut self.attributes {
            *value = expand::expand_env(value, &format!("attributes.{name}"))?;
        }
        self.output.extension = expand::expand_env(&self.output.extension, "output.extension")?;
        Ok(())
    }
}

/// Search for `downmark.toml` in `start` and its parents.
#[must_use]
pub fn discover_config_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.attributes.is_empty());
        assert_eq!(config.output.extension, "md");
        assert_eq!(config.config_path, None);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.attributes.is_empty());
        assert_eq!(config.output.extension, "md");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[attributes]
env-github = ""
url-repo = "https://example.org/repo"

[output]
extension = "markdown"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.attributes,
            BTreeMap::from([
                ("env-github".to_owned(), String::new()),
                ("url-repo".to_owned(), "https://example.org/repo".to_owned()),
            ])
        );
        assert_eq!(config.output.extension, "markdown");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<Config, _> = toml::from_str("[server]\nport = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config
            .attributes
            .insert("product".to_owned(), "ACME".to_owned());
        config
            .attributes
            .insert("env-github".to_owned(), String::new());

        let settings = CliSettings {
            attributes: vec![
                AttributeOverride::Set("product".to_owned(), "Widget".to_owned()),
                AttributeOverride::Unset("env-github".to_owned()),
                AttributeOverride::Set("toc".to_owned(), String::new()),
            ],
            extension: Some("txt".to_owned()),
        };
        config.apply_cli_settings(&settings);

        assert_eq!(
            config.attributes,
            BTreeMap::from([
                ("product".to_owned(), "Widget".to_owned()),
                ("toc".to_owned(), String::new()),
            ])
        );
        assert_eq!(config.output.extension, "txt");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert!(config.attributes.is_empty());
        assert_eq!(config.output.extension, "md");
    }

    #[test]
    fn test_valid_attribute_names() {
        assert!(is_valid_attribute_name("url-repo"));
        assert!(is_valid_attribute_name("env_github"));
        assert!(is_valid_attribute_name("v2"));
        assert!(!is_valid_attribute_name(""));
        assert!(!is_valid_attribute_name("has space"));
        assert!(!is_valid_attribute_name("na:me"));
    }

    #[test]
    fn test_validate_invalid_attribute_name() {
        let mut config = Config::default();
        config
            .attributes
            .insert("bad name".to_owned(), "x".to_owned());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bad name"));
    }

    #[test]
    fn test_validate_extension() {
        let mut config = Config::default();
        config.output.extension = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.output.extension = ".md".to_owned();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.output.extension = "mdx".to_owned();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expand_env_vars_attributes() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::set_var("DOWNMARK_CFG_PRODUCT", "ACME");
        }
        let mut config: Config = toml::from_str(
            "[attributes]\nproduct = \"${DOWNMARK_CFG_PRODUCT}\"\nurl = \"${DOWNMARK_CFG_URL_UNSET:-https://example.org}\"\n",
        )
        .unwrap();
        config.expand_env_vars().unwrap();
        unsafe {
            std::env::remove_var("DOWNMARK_CFG_PRODUCT");
        }

        assert_eq!(config.attributes["product"], "ACME");
        assert_eq!(config.attributes["url"], "https://example.org");
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        let mut config: Config =
            toml::from_str("[attributes]\ntoken = \"${DOWNMARK_CFG_MISSING}\"\n").unwrap();
        let err = config.expand_env_vars().unwrap_err();
        match err {
            ConfigError::EnvVar { field, .. } => assert_eq!(field, "attributes.token"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[attributes]\nproduct = \"ACME\"\n").unwrap();

        let settings = CliSettings {
            attributes: vec![AttributeOverride::Set(
                "edition".to_owned(),
                "2".to_owned(),
            )],
            extension: None,
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.attributes["product"], "ACME");
        assert_eq!(config.attributes["edition"], "2");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_expands_attribute_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downmark.toml");
        fs::write(
            &path,
            "[attributes]\nurl-repo = \"${DOWNMARK_LOAD_REPO_UNSET:-https://example.org/repo}\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.attributes["url-repo"], "https://example.org/repo");
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downmark.toml");
        fs::write(&path, "[attributes\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_rejects_invalid_cli_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downmark.toml");
        fs::write(&path, "").unwrap();
        let settings = CliSettings {
            attributes: vec![AttributeOverride::Set("a b".to_owned(), String::new())],
            extension: None,
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs").join("guides");
        fs::create_dir_all(&nested).unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "").unwrap();

        assert_eq!(discover_config_from(&nested), Some(path.clone()));
        assert_eq!(discover_config_from(dir.path()), Some(path));
    }

    #[test]
    fn test_discover_ignores_directory_named_like_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(CONFIG_FILENAME)).unwrap();
        let found = discover_config_from(dir.path());
        assert_ne!(found, Some(dir.path().join(CONFIG_FILENAME)));
    }
}
