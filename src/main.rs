use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ofo_history_scraper::browser::ChromeRenderer;
use ofo_history_scraper::config::Config;
use ofo_history_scraper::scrape_error::ScrapeError;
use ofo_history_scraper::services::{ExportService, ExportSummary};
use ofo_history_scraper::source::{OfoCategory, SourcePage};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CategoryFilter {
    High,
    Low,
    All,
}

impl CategoryFilter {
    fn includes(self, category: OfoCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::High => category == OfoCategory::High,
            CategoryFilter::Low => category == OfoCategory::Low,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ofo-history-scraper")]
#[command(about = "Export the current year of SoCalGas OFO event history to CSV", long_about = None)]
struct Cli {
    /// Chrome/Chromium executable (autodetected when omitted)
    #[arg(long, env = "OFO_BROWSER_PATH")]
    browser_path: Option<PathBuf>,

    /// Directory to write highofo<year>.csv / lowofo<year>.csv into
    #[arg(long, env = "OFO_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Which history pages to export
    #[arg(long, value_enum, default_value = "all")]
    category: CategoryFilter,
}

/// Launch the browser, export the selected sources, and always close the browser
async fn export(config: &Config, sources: &[SourcePage]) -> Result<Vec<ExportSummary>, ScrapeError> {
    let renderer = ChromeRenderer::launch(&config.browser_settings()).await?;
    let service = ExportService::new(renderer, config.output_dir.clone());
    let result = service.run(sources).await;

    service.into_renderer().close().await;
    result
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ofo_history_scraper=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration, command-line flags take precedence
    let mut config = Config::from_env()?;
    if let Some(path) = cli.browser_path {
        config.browser_path = Some(path);
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if cli.headed {
        config.headless = false;
    }
    info!("Starting OFO history export with config: {:?}", config);

    // Select history pages, high first
    let sources: Vec<_> = config
        .sources()
        .into_iter()
        .filter(|source| cli.category.includes(source.category))
        .collect();

    // Run the export; browser launch failures are reported like any other
    match export(&config, &sources).await {
        Ok(summaries) => {
            for summary in &summaries {
                info!(
                    "{} OFO: {} records for {} written to {}",
                    summary.category,
                    summary.record_count,
                    summary.year,
                    summary.path.display()
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Export failed ({}): {}", e.kind(), e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_browser_launch_failure_reports_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            browser_path: Some(dir.path().join("no-such-chrome")),
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let err = export(&config, &config.sources()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Navigation(_)));
        assert_eq!(err.kind(), "navigation");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_category_filter() {
        assert!(CategoryFilter::All.includes(OfoCategory::High));
        assert!(CategoryFilter::All.includes(OfoCategory::Low));
        assert!(CategoryFilter::Low.includes(OfoCategory::Low));
        assert!(!CategoryFilter::Low.includes(OfoCategory::High));
    }
}
