use scraper::{Html, Selector};
use tracing::{debug, error, instrument, warn};

use crate::scrape_error::ScrapeError;

const NBSP: char = '\u{a0}';

/// Raw header and data cells of the Envoy `ledger_table`, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTable {
    pub headers: Vec<String>,
    pub cells: Vec<String>,
}

/// Data cells laid out as rows of one cell per year column.
///
/// The first data cell on the page is a blank placeholder and is not part of
/// the grid. Only the last row may be shorter than `headers.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One year column of the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub year: String,
    pub values: Vec<String>,
}

fn clean_cell(text: &str) -> String {
    text.trim_matches(NBSP).to_string()
}

impl LedgerTable {
    pub fn new(headers: Vec<String>, cells: Vec<String>) -> Self {
        Self { headers, cells }
    }

    #[instrument(skip(html), fields(html_size = html.len()))]
    pub fn parse(html: &str) -> Result<Self, ScrapeError> {
        debug!("Parsing ledger HTML document");
        let document = Html::parse_document(html);
        let table_selector = Selector::parse("table.ledger_table").unwrap();
        let header_selector = Selector::parse("td.header_row").unwrap();
        let data_selector = Selector::parse("td.ledger_data").unwrap();

        let table = document.select(&table_selector).next().ok_or_else(|| {
            error!("No ledger_table found in HTML");
            debug!(
                "HTML preview (first 500 chars): {}",
                &html.chars().take(500).collect::<String>()
            );
            ScrapeError::ElementNotFound("table.ledger_table".to_string())
        })?;

        let headers: Vec<String> = table
            .select(&header_selector)
            .map(|cell| clean_cell(&cell.text().collect::<String>()))
            .collect();

        let cells: Vec<String> = table
            .select(&data_selector)
            .map(|cell| clean_cell(&cell.text().collect::<String>()))
            .collect();

        debug!(
            "Found {} header cells and {} data cells",
            headers.len(),
            cells.len()
        );

        Ok(Self { headers, cells })
    }

    /// Lay the data cells out as rows of `headers.len()` columns
    pub fn into_grid(self) -> Result<LedgerGrid, ScrapeError> {
        let stride = self.headers.len();
        if stride == 0 {
            return Err(ScrapeError::Parse(
                "ledger table has no header_row cells".to_string(),
            ));
        }

        let data = self.cells.get(1..).unwrap_or_default();
        if data.len() % stride != 0 {
            warn!(
                "Ledger has {} data cells after the placeholder, not a multiple of {} columns; last row is short",
                data.len(),
                stride
            );
        }

        let rows = data.chunks(stride).map(|row| row.to_vec()).collect();

        Ok(LedgerGrid {
            headers: self.headers,
            rows,
        })
    }
}

impl LedgerGrid {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Values of column `index`, top to bottom. Short rows missing the column are skipped.
    pub fn column(&self, index: usize) -> Option<YearColumn> {
        let year = self.headers.get(index)?.clone();
        let values = self
            .rows
            .iter()
            .filter_map(|row| row.get(index).cloned())
            .collect();
        Some(YearColumn { year, values })
    }

    /// The left-most column holds the most recent year; older columns are ignored
    pub fn current_year_column(&self) -> YearColumn {
        let column = self
            .column(0)
            .unwrap_or_else(|| YearColumn {
                year: String::new(),
                values: Vec::new(),
            });
        for value in &column.values {
            debug!("{} ledger value: '{}'", column.year, value);
        }
        column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_ledger_table() {
        let html = r#"
            <html><body>
            <table class="ledger_table">
              <tr><td class="header_row">&nbsp;2021&nbsp;</td><td class="header_row">&nbsp;2020</td></tr>
              <tr><td class="ledger_data">&nbsp;</td></tr>
              <tr><td class="ledger_data">03/01,Stage1,10</td><td class="ledger_data">02/15,Stage2,50&nbsp;</td></tr>
            </table>
            </body></html>
        "#;

        let table = LedgerTable::parse(html).unwrap();
        assert_eq!(table.headers, strings(&["2021", "2020"]));
        assert_eq!(table.cells, strings(&["", "03/01,Stage1,10", "02/15,Stage2,50"]));
    }

    #[test]
    fn test_parse_ignores_cells_outside_ledger_table() {
        let html = r#"
            <table class="other"><tr><td class="header_row">1999</td></tr></table>
            <table class="ledger_table"><tr><td class="header_row">2020</td><td class="ledger_data"></td></tr></table>
        "#;

        let table = LedgerTable::parse(html).unwrap();
        assert_eq!(table.headers, strings(&["2020"]));
        assert_eq!(table.cells, strings(&[""]));
    }

    #[test]
    fn test_parse_missing_table() {
        let html = "<html><body><p>No ledger here</p></body></html>";
        let result = LedgerTable::parse(html);
        assert!(matches!(result, Err(ScrapeError::ElementNotFound(_))));
    }

    #[test]
    fn test_zero_headers_is_parse_error() {
        let table = LedgerTable::new(Vec::new(), strings(&["", "01/02,1,15"]));
        assert!(matches!(table.into_grid(), Err(ScrapeError::Parse(_))));
    }

    #[test]
    fn test_single_column_extraction_count() {
        // k = 1, n = 3: everything after the placeholder
        let table = LedgerTable::new(strings(&["2020"]), strings(&["", "01/02,1,15", "01/03,2,30"]));
        let column = table.into_grid().unwrap().current_year_column();
        assert_eq!(column.year, "2020");
        assert_eq!(column.values, strings(&["01/02,1,15", "01/03,2,30"]));
    }

    #[test]
    fn test_two_column_extraction_selects_left_column() {
        let table = LedgerTable::new(
            strings(&["2021", "2020"]),
            strings(&[
                "",
                "03/01,Stage1,10",
                "02/15,Stage2,50",
                "04/01,Stage3,5",
                "01/01,Stage4,20",
            ]),
        );
        let grid = table.into_grid().unwrap();
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.rows.len(), 2);

        let column = grid.current_year_column();
        assert_eq!(column.year, "2021");
        assert_eq!(column.values, strings(&["03/01,Stage1,10", "04/01,Stage3,5"]));

        let older = grid.column(1).unwrap();
        assert_eq!(older.year, "2020");
        assert_eq!(older.values, strings(&["02/15,Stage2,50", "01/01,Stage4,20"]));
    }

    #[test]
    fn test_ragged_grid_keeps_short_last_row() {
        // Six cells after the placeholder across four columns: positions 1 and 5
        let table = LedgerTable::new(
            strings(&["2024", "2023", "2022", "2021"]),
            strings(&["", "a", "b", "c", "d", "e", "f"]),
        );
        let grid = table.into_grid().unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[1], strings(&["e", "f"]));
        assert_eq!(grid.current_year_column().values, strings(&["a", "e"]));
        assert_eq!(grid.column(3).unwrap().values, strings(&["d"]));
    }

    #[test]
    fn test_empty_ledger_yields_empty_column() {
        let table = LedgerTable::new(strings(&["2020"]), Vec::new());
        let column = table.into_grid().unwrap().current_year_column();
        assert_eq!(column.year, "2020");
        assert!(column.values.is_empty());
    }

    #[test]
    fn test_column_out_of_range() {
        let table = LedgerTable::new(strings(&["2020"]), strings(&["", "x"]));
        assert!(table.into_grid().unwrap().column(1).is_none());
    }
}
