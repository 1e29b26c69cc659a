use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HIGH_OFO_URL: &str =
    "https://scgenvoy.sempra.com/#nav=/Public/ViewExternalOFO.getOFO";
pub const DEFAULT_LOW_OFO_URL: &str =
    "https://scgenvoy.sempra.com/#nav=/Public/ViewExternalLowOFO.getLowOFO";

/// Which OFO history a page publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfoCategory {
    High,
    Low,
}

impl OfoCategory {
    /// Envoy serves the low OFO/EFO history from a URL containing "Low";
    /// everything else is treated as the high OFO history.
    pub fn from_url(url: &str) -> Self {
        if url.contains("Low") {
            OfoCategory::Low
        } else {
            OfoCategory::High
        }
    }

    /// Partial text of the link that reveals the event history ledger
    pub fn link_text(&self) -> &'static str {
        match self {
            OfoCategory::High => "High OFO Event History",
            OfoCategory::Low => "Low OFO/EFO Event History",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            OfoCategory::High => "highofo",
            OfoCategory::Low => "lowofo",
        }
    }
}

impl fmt::Display for OfoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfoCategory::High => write!(f, "high"),
            OfoCategory::Low => write!(f, "low"),
        }
    }
}

impl FromStr for OfoCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(OfoCategory::High),
            "low" => Ok(OfoCategory::Low),
            other => Err(format!("unknown OFO category '{other}' (expected 'high' or 'low')")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    pub url: String,
    pub category: OfoCategory,
}

impl SourcePage {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let category = OfoCategory::from_url(&url);
        Self { url, category }
    }

    pub fn link_text(&self) -> &'static str {
        self.category.link_text()
    }

    pub fn file_prefix(&self) -> &'static str {
        self.category.file_prefix()
    }
}
