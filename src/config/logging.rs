//! Logging settings

use serde::{Deserialize, Serialize};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set
    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub const DEFAULT_FILTER: &'static str = "hrserve=info,tower_http=debug";

    pub fn filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(Self::DEFAULT_FILTER)
    }
}
