use std::path::{Path, PathBuf};

use interro::{EscapeRule, ParseOptions, Syntax};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {}: {source}", config_path.display())]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {}: {source}", config_path.display())]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read global prompt at {}: {source}", prompt_path.display())]
    GlobalPromptReadError {
        prompt_path: PathBuf,
        source: std::io::Error,
    },
}

/// Settings for the agent that exposes the document tools.
///
/// ```toml
/// name = "root_agent"
/// model = "gemini-2.0-flash"
/// global_prompt = "global_prompt.md"
/// syntax = "query"
/// escape = "counting"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub instruction: String,
    /// File whose text is sent ahead of every instruction. Relative paths
    /// resolve against the config file's directory.
    pub global_prompt: Option<PathBuf>,
    /// Marker dialect; detected per document when unset.
    pub syntax: Option<Syntax>,
    pub escape: EscapeRule,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            name: "root_agent".to_string(),
            model: "gemini-2.0-flash".to_string(),
            instruction: "You are a helpful AI assistant designed to provide accurate and useful information.".to_string(),
            global_prompt: None,
            syntax: None,
            escape: EscapeRule::default(),
        }
    }
}

impl AgentConfig {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: AgentConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if let (Some(prompt), Some(dir)) = (&config.global_prompt, config_path.parent()) {
            if prompt.is_relative() {
                config.global_prompt = Some(dir.join(prompt));
            }
        }

        log::debug!("loaded agent config from {}", config_path.display());
        Ok(config)
    }

    /// Options for parsing `text` under this config.
    pub fn parse_options(&self, text: &str) -> ParseOptions {
        ParseOptions {
            syntax: self.syntax.unwrap_or_else(|| Syntax::detect(text)),
            escape_rule: self.escape,
        }
    }

    pub fn read_global_prompt(&self) -> Result<Option<String>, ConfigError> {
        let Some(path) = &self.global_prompt else {
            return Ok(None);
        };
        std::fs::read_to_string(path)
            .map(Some)
            .map_err(|source| ConfigError::GlobalPromptReadError {
                prompt_path: path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_keys_take_defaults() {
        let config: AgentConfig = toml::from_str("model = \"local\"").unwrap();
        assert_eq!(config.model, "local");
        assert_eq!(config.name, "root_agent");
        assert_eq!(config.syntax, None);
        assert_eq!(config.escape, EscapeRule::Counting);
    }

    #[test]
    fn dialect_and_escape_rule_from_toml() {
        let config: AgentConfig =
            toml::from_str("syntax = \"query\"\nescape = \"two-state\"").unwrap();
        let options = config.parse_options("!interro a ro \"p\" !end a");
        assert_eq!(options.syntax, Syntax::Query);
        assert_eq!(options.escape_rule, EscapeRule::TwoState);
    }

    #[test]
    fn unset_syntax_is_detected_per_document() {
        let config = AgentConfig::default();
        assert_eq!(config.parse_options("?! a ro \"p\" ?! a end").syntax, Syntax::Query);
        assert_eq!(config.parse_options("plain").syntax, Syntax::Bang);
    }

    #[test]
    fn global_prompt_resolves_next_to_the_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("global_prompt.md"), "Be kind.").unwrap();
        let config_path = dir.path().join("agent.toml");
        std::fs::write(&config_path, "global_prompt = \"global_prompt.md\"").unwrap();

        let config = AgentConfig::load_from_path(&config_path).unwrap();
        assert_eq!(
            config.global_prompt.as_deref(),
            Some(dir.path().join("global_prompt.md").as_path())
        );
        assert_eq!(config.read_global_prompt().unwrap().as_deref(), Some("Be kind."));
    }

    #[test]
    fn unreadable_and_invalid_configs() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            AgentConfig::load_from_path(&missing),
            Err(ConfigError::ConfigReadError { .. })
        ));

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "syntax = \"curly\"").unwrap();
        assert!(matches!(
            AgentConfig::load_from_path(&invalid),
            Err(ConfigError::ConfigParseError { .. })
        ));
    }
}
