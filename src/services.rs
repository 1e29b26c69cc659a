pub mod export_service;

pub use export_service::{export_html, ExportService, ExportSummary};
