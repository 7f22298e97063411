//! Table pass: run the grid detector over each page's text segments and
//! shape the grids into header + rows.

use crate::config::{PageSelection, TableSettings};
use crate::error::PassError;
use crate::output::{ExtractedTable, PassKind};
use crate::pipeline::document;
use crate::pipeline::grid::{self, Grid, TextRun};
use pdfium_render::prelude::*;
use tracing::debug;

/// Detect tables on the selected pages, in page order then top to bottom.
///
/// Tables are numbered from 1 on each page.
pub fn extract_tables_blocking(
    pdfium: &Pdfium,
    bytes: &[u8],
    pages: &PageSelection,
    password: Option<&str>,
    settings: &TableSettings,
) -> Result<Vec<ExtractedTable>, PassError> {
    let document = document::open_document(pdfium, bytes, password, PassKind::Tables)?;

    let mut tables = Vec::new();
    document::for_each_selected_page(&document, pages, PassKind::Tables, |page_num, page| {
        let runs = page_runs(page).map_err(|e| PassError::PageFailed {
            pass: PassKind::Tables,
            page: page_num,
            detail: format!("{:?}", e),
        })?;

        let grids = grid::detect_grids(&runs, settings);
        debug!(
            "Page {}: {} text runs, {} table(s)",
            page_num,
            runs.len(),
            grids.len()
        );
        for (i, g) in grids.into_iter().enumerate() {
            tables.push(build_table(page_num, i + 1, g));
        }
        Ok(())
    })?;

    Ok(tables)
}

/// Text segments of a page as runs in top-down coordinates.
fn page_runs(page: &PdfPage<'_>) -> Result<Vec<TextRun>, PdfiumError> {
    let height = page.height().value;
    let text = page.text()?;

    Ok(text
        .segments()
        .iter()
        .map(|segment| {
            let bounds = segment.bounds();
            TextRun {
                text: segment.text(),
                left: bounds.left().value,
                right: bounds.right().value,
                top: height - bounds.top().value,
                bottom: height - bounds.bottom().value,
            }
        })
        .collect())
}

/// Apply the header rule to a detected grid.
///
/// When every cell of the first row has text, that row names the columns.
/// Otherwise the columns are `Column 1..n` and every row is data.
pub fn build_table(page: usize, table_number: usize, grid: Grid) -> ExtractedTable {
    let mut rows = grid.rows;
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }

    let header_detected = rows
        .first()
        .is_some_and(|first| first.iter().all(|cell| !cell.trim().is_empty()));

    let columns = if header_detected {
        rows.remove(0)
    } else {
        (1..=width).map(|i| format!("Column {}", i)).collect()
    };

    ExtractedTable {
        page,
        table_number,
        columns,
        rows,
        header_detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            top: 0.0,
            bottom: 0.0,
        }
    }

    #[test]
    fn full_first_row_becomes_header() {
        let t = build_table(2, 1, grid(&[&["Name", "Qty"], &["apple", "3"], &["pear", ""]]));
        assert!(t.header_detected);
        assert_eq!(t.columns, vec!["Name", "Qty"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.page, 2);
        assert_eq!(t.table_number, 1);
    }

    #[test]
    fn gap_in_first_row_means_generic_columns() {
        let t = build_table(1, 3, grid(&[&["", "2019"], &["Revenue", "10"]]));
        assert!(!t.header_detected);
        assert_eq!(t.columns, vec!["Column 1", "Column 2"]);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let t = build_table(1, 1, grid(&[&["a", "b", "c"], &["1", "2"]]));
        assert_eq!(t.rows[0], vec!["1", "2", ""]);
    }
}
