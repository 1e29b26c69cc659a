#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Browser navigation failed: {0}")]
    Navigation(String),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Failed to parse ledger table: {0}")]
    Parse(String),
    #[error("Malformed ledger row {row}: '{value}' has {fields} comma-separated fields, expected 3")]
    MalformedRow {
        row: usize,
        value: String,
        fields: usize,
    },
    #[error("Failed to write CSV: {0}")]
    Write(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Short category name used in log output and the final error message
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Navigation(_) => "navigation",
            ScrapeError::ElementNotFound(_) => "element-not-found",
            ScrapeError::Parse(_) => "parse",
            ScrapeError::MalformedRow { .. } => "malformed-row",
            ScrapeError::Write(_) | ScrapeError::Io(_) => "write",
        }
    }
}

impl From<csv::Error> for ScrapeError {
    fn from(e: csv::Error) -> Self {
        ScrapeError::Write(e.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Navigation(e.to_string())
    }
}
