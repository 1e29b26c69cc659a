pub mod browser;
pub mod config;
pub mod csv_export;
pub mod ledger;
pub mod records;
pub mod scrape_error;
pub mod services;
pub mod source;
