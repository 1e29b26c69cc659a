use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::browser::PageRenderer;
use crate::csv_export;
use crate::ledger::LedgerTable;
use crate::records;
use crate::scrape_error::ScrapeError;
use crate::source::{OfoCategory, SourcePage};

/// Outcome of exporting one history page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub category: OfoCategory,
    pub year: String,
    pub record_count: usize,
    pub path: PathBuf,
}

pub struct ExportService<R> {
    renderer: R,
    output_dir: PathBuf,
}

impl<R: PageRenderer> ExportService<R> {
    pub fn new(renderer: R, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_dir: output_dir.into(),
        }
    }

    /// Give the renderer back, e.g. to close the browser session
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Export every source in order, stopping at the first failure.
    /// Files already written for earlier sources are left in place.
    pub async fn run(&self, sources: &[SourcePage]) -> Result<Vec<ExportSummary>, ScrapeError> {
        let mut summaries = Vec::with_capacity(sources.len());
        for source in sources {
            summaries.push(self.export_page(source).await?);
        }
        Ok(summaries)
    }

    #[instrument(skip(self, source), fields(category = %source.category, url = %source.url))]
    pub async fn export_page(&self, source: &SourcePage) -> Result<ExportSummary, ScrapeError> {
        let html = self
            .renderer
            .fetch_rendered_page(&source.url, source.link_text())
            .await?;
        export_html(&self.output_dir, source.category, &html)
    }
}

/// Extract the current year from already-rendered ledger markup and write its CSV
pub fn export_html(
    output_dir: &Path,
    category: OfoCategory,
    html: &str,
) -> Result<ExportSummary, ScrapeError> {
    let grid = LedgerTable::parse(html)?.into_grid()?;
    let column = grid.current_year_column();
    info!(
        "Extracted {} values for {} from a {}-year ledger",
        column.values.len(),
        column.year,
        grid.column_count()
    );

    let records = records::reshape(&column)?;
    let path = csv_export::write_records(output_dir, category.file_prefix(), &column.year, &records)?;

    Ok(ExportSummary {
        category,
        year: column.year,
        record_count: records.len(),
        path,
    })
}
