use std::path::{Path, PathBuf};

use mantran_engine::{GroffCodePolicy, Options};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for option {option}: {value:?}")]
    InvalidValue { option: &'static str, value: String },
}

/// The on-disk option set. Macro lists are comma separated, matching
/// the option syntax of the command line.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub verbose: bool,
    /// `fail`, `verbatim` or `translate`.
    pub groff_code: Option<String>,
    pub untranslated: Option<String>,
    pub noarg: Option<String>,
    pub translate_joined: Option<String>,
    pub translate_each: Option<String>,
    pub inline: Option<String>,
    /// Comma list of `begin:end` macro pairs.
    pub no_wrap: Option<String>,
    /// Comma list of debug streams: `splitargs`, `pretrans`,
    /// `postrans`, `fonts`.
    pub debug: Option<String>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/mantran");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Convert into the engine's option set.
    pub fn to_options(&self) -> Result<Options, ConfigError> {
        let groff_code = match &self.groff_code {
            None => GroffCodePolicy::default(),
            Some(value) => {
                GroffCodePolicy::parse(value).ok_or_else(|| ConfigError::InvalidValue {
                    option: "groff_code",
                    value: value.clone(),
                })?
            }
        };
        let list = |value: &Option<String>| {
            value
                .as_deref()
                .map(Options::split_list)
                .unwrap_or_default()
        };
        Ok(Options {
            verbose: self.verbose,
            groff_code,
            untranslated: list(&self.untranslated),
            noarg: list(&self.noarg),
            translate_joined: list(&self.translate_joined),
            translate_each: list(&self.translate_each),
            inline: list(&self.inline),
            no_wrap: self
                .no_wrap
                .as_deref()
                .map(Options::parse_no_wrap)
                .unwrap_or_default(),
        })
    }

    /// Tracing filter directives for the selected debug streams, ready
    /// for an `EnvFilter`.
    pub fn tracing_directives(&self) -> String {
        let mut directives: Vec<String> = self
            .debug
            .as_deref()
            .map(Options::split_list)
            .unwrap_or_default()
            .iter()
            .map(|stream| format!("mantran::{stream}=debug"))
            .collect();
        if self.verbose {
            directives.push("info".to_string());
        } else {
            directives.push("warn".to_string());
        }
        directives.join(",")
    }
}
