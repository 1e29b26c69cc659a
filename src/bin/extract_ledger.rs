use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ofo_history_scraper::ledger::LedgerTable;
use ofo_history_scraper::services::export_html;
use ofo_history_scraper::source::OfoCategory;

#[derive(Parser)]
#[command(name = "extract-ledger")]
#[command(about = "Extract the current-year OFO ledger from a saved Envoy page", long_about = None)]
struct Cli {
    /// Saved HTML of the rendered event history page
    file: PathBuf,

    /// History the page belongs to: 'high' or 'low'
    #[arg(long, default_value = "high")]
    category: OfoCategory,

    /// Directory to write the CSV into
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the ledger grid instead of writing a CSV
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let html = std::fs::read_to_string(&cli.file)?;
    info!("Read {} ({} bytes)", cli.file.display(), html.len());

    if cli.dry_run {
        let grid = LedgerTable::parse(&html)?.into_grid()?;
        println!("Columns: {:?}", grid.headers);
        println!("{}", "=".repeat(60));
        for (row_idx, row) in grid.rows.iter().enumerate() {
            println!("Row {:3}: {}", row_idx, row.join(" | "));
        }
        return Ok(());
    }

    match export_html(&cli.output_dir, cli.category, &html) {
        Ok(summary) => {
            println!(
                "Wrote {} records for {} to {}",
                summary.record_count,
                summary.year,
                summary.path.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Extraction failed ({}): {}", e.kind(), e);
            Err(e.into())
        }
    }
}
