use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::BrowserSettings;
use crate::source::{SourcePage, DEFAULT_HIGH_OFO_URL, DEFAULT_LOW_OFO_URL};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub high_ofo_url: String,
    pub low_ofo_url: String,
    pub output_dir: PathBuf,
    pub browser_path: Option<PathBuf>,
    pub headless: bool,
    pub browser_sandbox: bool,
    pub initial_wait_secs: u64,
    pub render_wait_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            high_ofo_url: DEFAULT_HIGH_OFO_URL.to_string(),
            low_ofo_url: DEFAULT_LOW_OFO_URL.to_string(),
            output_dir: PathBuf::from("."),
            browser_path: None,
            headless: true,
            browser_sandbox: true,
            initial_wait_secs: 2,
            render_wait_secs: 5,
        }
    }
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Config {
            high_ofo_url: env::var("OFO_HIGH_URL").unwrap_or(defaults.high_ofo_url),
            low_ofo_url: env::var("OFO_LOW_URL").unwrap_or(defaults.low_ofo_url),
            output_dir: env::var("OFO_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            browser_path: env::var("OFO_BROWSER_PATH").ok().map(PathBuf::from),
            headless: match env::var("OFO_HEADLESS") {
                Ok(value) => parse_bool("OFO_HEADLESS", value)?,
                Err(_) => defaults.headless,
            },
            browser_sandbox: match env::var("OFO_BROWSER_SANDBOX") {
                Ok(value) => parse_bool("OFO_BROWSER_SANDBOX", value)?,
                Err(_) => defaults.browser_sandbox,
            },
            initial_wait_secs: env::var("OFO_INITIAL_WAIT_SECS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            render_wait_secs: env::var("OFO_RENDER_WAIT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }

    /// Source pages in processing order: high, then low
    pub fn sources(&self) -> Vec<SourcePage> {
        vec![
            SourcePage::new(self.high_ofo_url.clone()),
            SourcePage::new(self.low_ofo_url.clone()),
        ]
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            executable_path: self.browser_path.clone(),
            headless: self.headless,
            sandbox: self.browser_sandbox,
            initial_wait: Duration::from_secs(self.initial_wait_secs),
            render_wait: Duration::from_secs(self.render_wait_secs),
        }
    }
}
