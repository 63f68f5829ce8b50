use std::io::IsTerminal;

use serde::Deserialize;

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Level directive variable consulted by [`LoggerConfig::with_env`].
pub const LEVEL_ENV: &str = "RUST_LOG";
/// Output format variable consulted by [`LoggerConfig::with_env`].
pub const FORMAT_ENV: &str = "FANOUT_LOG_FORMAT";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `fanout_core=debug,info`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Apply `RUST_LOG` and `FANOUT_LOG_FORMAT` on top of the loaded values.
    pub fn with_env(self) -> Result<Self, LoggerError> {
        self.with_overrides(
            std::env::var(LEVEL_ENV).ok(),
            std::env::var(FORMAT_ENV).ok(),
        )
    }

    fn with_overrides(
        mut self,
        level: Option<String>,
        format: Option<String>,
    ) -> Result<Self, LoggerError> {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = format {
            self.format = format.parse()?;
        }
        if self.format != LoggerFormat::Text {
            self.use_color = false;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_config() {
        let cfg: LoggerConfig =
            serde_json::from_str(r#"{"format":"json","level":"debug"}"#).unwrap();
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.level, "debug");
        assert!(cfg.with_targets);
    }

    #[test]
    fn overrides_replace_loaded_values() {
        let cfg = LoggerConfig::default()
            .with_overrides(Some("fanout_core=trace".into()), Some("json".into()))
            .unwrap();
        assert_eq!(cfg.level, "fanout_core=trace");
        assert_eq!(cfg.format, LoggerFormat::Json);
        assert!(!cfg.use_color);

        let kept = LoggerConfig::default()
            .with_overrides(Some("  ".into()), None)
            .unwrap();
        assert_eq!(kept.level, "info");

        assert!(LoggerConfig::default()
            .with_overrides(None, Some("xml".into()))
            .is_err());
    }
}
