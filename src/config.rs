use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::decode::XmlStrategy;
use crate::errors::{Error, Result};

pub const DEFAULT_URL: &str = "https://overpass-api.de/api/interpreter";

/// Settings of the [`Overpass`](crate::overpass::Overpass) client.
///
/// Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverpassConfig {
    pub url: String,
    /// Additional attempts after the first one failed. 0 disables retrying.
    pub max_retry_count: u32,
    /// Pause between two attempts, in seconds.
    pub retry_timeout_secs: f64,
    /// Upper bound for a whole request/response exchange, in seconds.
    pub timeout_secs: f64,
    pub xml_parser: XmlStrategy,
    pub log_level: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        OverpassConfig {
            url: DEFAULT_URL.to_string(),
            max_retry_count: 0,
            retry_timeout_secs: 1.0,
            timeout_secs: 180.0,
            xml_parser: XmlStrategy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl OverpassConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidArgument("url must not be empty".into()));
        }
        for (name, value) in [
            ("retry_timeout_secs", self.retry_timeout_secs),
            ("timeout_secs", self.timeout_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<OverpassConfig> {
    let file = File::open(path)?;
    let config: OverpassConfig = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    Ok(config)
}
