//! Alignment-based table detection over positioned text runs.
//!
//! PDFium reports text as segments with bounding boxes but has no notion of
//! tables. This module finds blocks of consecutive lines that split into the
//! same set of horizontally separated columns:
//!
//! ```text
//! runs ──▶ lines ──▶ cells ──▶ blocks ──▶ column spans ──▶ grid
//!      (same y)  (x gaps)  (adjacent     (merged cell    (cells assigned
//!                           multi-cell    intervals)      to best span)
//!                           lines)
//! ```
//!
//! It works on plain data so it can be tested without a PDF. Coordinates are
//! top-down: `top < bottom`, y grows towards the bottom of the page.

use crate::config::TableSettings;
use crate::pipeline::postprocess::clean_cell;

/// A piece of text with its bounding box, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextRun {
    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A detected table as a rectangular grid of cleaned cell strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<String>>,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    left: f32,
    right: f32,
}

#[derive(Debug, Clone)]
struct Row {
    top: f32,
    bottom: f32,
    cells: Vec<Cell>,
}

impl Row {
    fn height(&self) -> f32 {
        (self.bottom - self.top).max(1.0)
    }
}

/// Find every table on a page, top to bottom.
pub fn detect_grids(runs: &[TextRun], settings: &TableSettings) -> Vec<Grid> {
    let rows: Vec<Row> = group_lines(runs, settings.line_tolerance)
        .into_iter()
        .map(|line| split_cells(line, settings.min_column_gap))
        .collect();

    let mut grids = Vec::new();
    let mut block: Vec<Row> = Vec::new();

    for row in rows {
        let is_candidate = row.cells.len() >= settings.min_columns;
        let continues = block.last().is_some_and(|prev| {
            let gap = row.top - prev.bottom;
            gap <= settings.max_row_spacing * prev.height().max(row.height())
        });

        if is_candidate && (block.is_empty() || continues) {
            block.push(row);
            continue;
        }

        if let Some(grid) = close_block(std::mem::take(&mut block), settings) {
            grids.push(grid);
        }
        if is_candidate {
            block.push(row);
        }
    }
    if let Some(grid) = close_block(block, settings) {
        grids.push(grid);
    }

    grids
}

/// Group runs whose vertical centres lie within `tolerance` into lines,
/// ordered top to bottom.
fn group_lines(runs: &[TextRun], tolerance: f32) -> Vec<Vec<TextRun>> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    let mut line_center = f32::NEG_INFINITY;

    for run in sorted {
        match lines.last_mut() {
            Some(line) if (run.center_y() - line_center).abs() <= tolerance => {
                line.push(run.clone());
                line_center = line.iter().map(TextRun::center_y).sum::<f32>() / line.len() as f32;
            }
            _ => {
                line_center = run.center_y();
                lines.push(vec![run.clone()]);
            }
        }
    }

    lines
}

/// Split one line into cells wherever the horizontal gap reaches `min_gap`.
fn split_cells(mut line: Vec<TextRun>, min_gap: f32) -> Row {
    line.sort_by(|a, b| a.left.total_cmp(&b.left));

    let top = line.iter().map(|r| r.top).fold(f32::INFINITY, f32::min);
    let bottom = line.iter().map(|r| r.bottom).fold(f32::NEG_INFINITY, f32::max);

    let mut cells: Vec<Cell> = Vec::new();
    for run in line {
        match cells.last_mut() {
            Some(cell) if run.left - cell.right < min_gap => {
                let gap = run.left - cell.right;
                let glued = cell.text.ends_with(char::is_whitespace)
                    || run.text.starts_with(char::is_whitespace)
                    || gap < 1.0;
                if !glued {
                    cell.text.push(' ');
                }
                cell.text.push_str(&run.text);
                cell.right = cell.right.max(run.right);
            }
            _ => cells.push(Cell {
                text: run.text,
                left: run.left,
                right: run.right,
            }),
        }
    }

    Row { top, bottom, cells }
}

/// Turn a block of multi-cell rows into a grid, or reject it.
fn close_block(block: Vec<Row>, settings: &TableSettings) -> Option<Grid> {
    if block.len() < settings.min_rows {
        return None;
    }

    let spans = column_spans(&block);
    if spans.len() < settings.min_columns {
        return None;
    }

    let cell_count: usize = block.iter().map(|r| r.cells.len()).sum();
    let char_count: usize = block
        .iter()
        .flat_map(|r| r.cells.iter())
        .map(|c| c.text.trim().chars().count())
        .sum();
    if char_count as f32 / cell_count.max(1) as f32 > settings.max_mean_cell_chars {
        return None;
    }

    let top = block.first().map(|r| r.top).unwrap_or_default();
    let bottom = block.last().map(|r| r.bottom).unwrap_or_default();

    let rows: Vec<Vec<String>> = block
        .into_iter()
        .map(|row| assign_cells(row, &spans))
        .collect();

    let well_formed = rows
        .iter()
        .filter(|r| r.iter().filter(|c| !c.is_empty()).count() >= settings.min_columns)
        .count();
    if well_formed < settings.min_rows {
        return None;
    }

    Some(Grid { rows, top, bottom })
}

/// Merge the horizontal extents of every cell in the block into column spans.
fn column_spans(block: &[Row]) -> Vec<(f32, f32)> {
    let mut intervals: Vec<(f32, f32)> = block
        .iter()
        .flat_map(|r| r.cells.iter().map(|c| (c.left, c.right)))
        .collect();
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut spans: Vec<(f32, f32)> = Vec::new();
    for (left, right) in intervals {
        match spans.last_mut() {
            Some(span) if left <= span.1 => span.1 = span.1.max(right),
            _ => spans.push((left, right)),
        }
    }
    spans
}

/// Place each cell of `row` into the column span it overlaps most.
fn assign_cells(row: Row, spans: &[(f32, f32)]) -> Vec<String> {
    let mut out = vec![String::new(); spans.len()];
    for cell in row.cells {
        let column = best_span(cell.left, cell.right, spans);
        let text = clean_cell(&cell.text);
        if text.is_empty() {
            continue;
        }
        let slot = &mut out[column];
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(&text);
    }
    out
}

fn best_span(left: f32, right: f32, spans: &[(f32, f32)]) -> usize {
    let center = (left + right) / 2.0;
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, &(s_left, s_right)) in spans.iter().enumerate() {
        let overlap = right.min(s_right) - left.max(s_left);
        // Non-overlapping spans score by (negative) distance to the centre.
        let score = if overlap > 0.0 {
            overlap
        } else {
            -(center - (s_left + s_right) / 2.0).abs()
        };
        if score > best_score {
            best_score = score;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, left: f32, top: f32) -> TextRun {
        // 5pt per character, 10pt line height.
        TextRun {
            text: text.to_string(),
            left,
            right: left + 5.0 * text.chars().count() as f32,
            top,
            bottom: top + 10.0,
        }
    }

    fn settings() -> TableSettings {
        TableSettings::default()
    }

    fn price_table(top: f32) -> Vec<TextRun> {
        vec![
            run("Item", 50.0, top),
            run("Qty", 200.0, top),
            run("Price", 300.0, top),
            run("Apple", 50.0, top + 14.0),
            run("3", 200.0, top + 14.0),
            run("1.20", 300.0, top + 14.0),
            run("Pear", 50.0, top + 28.0),
            run("10", 200.0, top + 28.0),
            run("0.80", 300.0, top + 28.0),
        ]
    }

    #[test]
    fn detects_simple_table() {
        let grids = detect_grids(&price_table(100.0), &settings());
        assert_eq!(grids.len(), 1);
        assert_eq!(
            grids[0].rows,
            vec![
                vec!["Item", "Qty", "Price"],
                vec!["Apple", "3", "1.20"],
                vec!["Pear", "10", "0.80"],
            ]
        );
    }

    #[test]
    fn prose_has_no_tables() {
        let runs = vec![
            run("The quick brown fox jumps over the lazy dog.", 50.0, 100.0),
            run("It was the best of times, it was the worst.", 50.0, 114.0),
            run("Call me Ishmael.", 50.0, 128.0),
        ];
        assert!(detect_grids(&runs, &settings()).is_empty());
    }

    #[test]
    fn words_split_into_runs_stay_in_one_cell() {
        let mut runs = price_table(100.0);
        // "Green" + "apple" on the same line, a normal word gap apart.
        runs[3] = run("Green", 50.0, 114.0);
        runs.push(run("apple", 78.0, 114.0));
        let grids = detect_grids(&runs, &settings());
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows[1], vec!["Green apple", "3", "1.20"]);
    }

    #[test]
    fn empty_cells_are_kept_in_place() {
        let mut runs = price_table(100.0);
        // Drop the Qty of the pear row.
        runs.retain(|r| r.text != "10");
        let grids = detect_grids(&runs, &settings());
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows[2], vec!["Pear", "", "0.80"]);
    }

    #[test]
    fn separated_tables_are_distinct_and_ordered() {
        let mut runs = price_table(400.0);
        runs.extend(price_table(100.0));
        runs.push(run("Some paragraph between the two tables here.", 50.0, 250.0));
        let grids = detect_grids(&runs, &settings());
        assert_eq!(grids.len(), 2);
        assert!(grids[0].top < grids[1].top);
    }

    #[test]
    fn two_column_prose_is_rejected() {
        let left = "Lorem ipsum dolor sit amet, consectetur adipiscing";
        let right = "Sed ut perspiciatis unde omnis iste natus error sit";
        let runs: Vec<TextRun> = (0..6)
            .flat_map(|i| {
                let top = 100.0 + 14.0 * i as f32;
                vec![run(left, 40.0, top), run(right, 320.0, top)]
            })
            .collect();
        assert!(detect_grids(&runs, &settings()).is_empty());
    }

    #[test]
    fn single_row_is_not_a_table() {
        let runs = vec![run("Name", 50.0, 100.0), run("Date", 200.0, 100.0)];
        assert!(detect_grids(&runs, &settings()).is_empty());
    }

    #[test]
    fn slightly_misaligned_baselines_share_a_line() {
        let mut runs = price_table(100.0);
        runs[4].top += 1.5;
        runs[4].bottom += 1.5;
        let grids = detect_grids(&runs, &settings());
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows.len(), 3);
    }
}
