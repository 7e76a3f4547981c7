use thiserror::Error;

pub const COLOR_ENV: &str = "FORGE_DOT_COLOR";
pub const JSON_PRETTY_ENV: &str = "FORGE_DOT_JSON_PRETTY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid boolean for {var}: '{value}' (expected 1/0, true/false, yes/no or on/off)")]
    InvalidBool { var: &'static str, value: String },
}

/// Settings that can come from the environment or a `.env` file. Command-line
/// flags are layered on top by the subcommands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    pub colorize: bool,
    pub json_pretty: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            colorize: false,
            json_pretty: true,
        }
    }
}

impl CliConfig {
    /// Loads `.env` from the working directory (if present) and then reads the
    /// process environment. Variables already set win over `.env` entries.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(error) if error.not_found() => {}
            Err(error) => tracing::warn!(%error, "ignoring unreadable .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(COLOR_ENV) {
            config.colorize = parse_bool(COLOR_ENV, &value)?;
        }
        if let Some(value) = lookup(JSON_PRETTY_ENV) {
            config.json_pretty = parse_bool(JSON_PRETTY_ENV, &value)?;
        }
        Ok(config)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
