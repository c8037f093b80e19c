//! Structured-column matcher: a header row naming metric columns, one game per row below.

use chrono::{DateTime, Utc};

use crate::models::{Candidate, Metric, MetricValues};
use crate::source::{Cell, Sheet};

use super::dates::cell_timestamp;
use super::labels::{match_label, match_metric, Label};
use super::numeric::{cell_value, parse_token};

/// How far down a sheet the header row may sit.
const HEADER_SCAN_ROWS: usize = 20;

/// Column layout announced by a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header_row: usize,
    pub metrics: Vec<(usize, Metric)>,
    pub game_col: Option<usize>,
    pub time_col: Option<usize>,
}

impl Table {
    fn first_metric_col(&self) -> usize {
        self.metrics.iter().map(|(c, _)| *c).min().unwrap_or(0)
    }

    /// Row names the same metrics in the same columns as the header.
    fn repeats_header(&self, sheet: &Sheet, row: usize) -> bool {
        self.metrics.iter().all(|(col, metric)| {
            sheet.cell(row, *col).as_text().and_then(match_metric) == Some(*metric)
        })
    }

    /// Row below the header with nothing in any metric column, such as a footer
    /// note. Such rows belong to the free-form area.
    pub fn is_free_row(&self, sheet: &Sheet, row: usize) -> bool {
        row > self.header_row
            && !self.repeats_header(sheet, row)
            && self
                .metrics
                .iter()
                .all(|(col, metric)| cell_value(sheet.cell(row, *col), *metric).is_none())
    }
}

fn header_labels(row: &[Cell]) -> Vec<(usize, Label)> {
    row.iter()
        .enumerate()
        .filter_map(|(col, cell)| cell.as_text().and_then(match_label).map(|l| (col, l)))
        .collect()
}

/// First row among the top of the sheet that names at least one metric column.
pub fn find_table(sheet: &Sheet) -> Option<Table> {
    sheet
        .rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .enumerate()
        .find_map(|(idx, row)| {
            let labels = header_labels(row);
            let mut table = Table {
                header_row: idx,
                metrics: Vec::new(),
                game_col: None,
                time_col: None,
            };
            for (col, label) in labels {
                match label {
                    Label::Metric(m) if !table.metrics.iter().any(|(_, x)| *x == m) => {
                        table.metrics.push((col, m))
                    }
                    Label::Metric(_) => {}
                    Label::Game => {
                        table.game_col.get_or_insert(col);
                    }
                    Label::Time => {
                        table.time_col.get_or_insert(col);
                    }
                }
            }
            (!table.metrics.is_empty()).then_some(table)
        })
}

/// Game column content; numeric names such as `777` are kept as written.
fn game_name(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Number(v) if v.is_finite() => Some(v.to_string()),
        other => other.as_text().map(str::to_string),
    }
}

/// Nearest non-numeric, non-header text left of the metric columns.
fn row_label<'a>(sheet: &'a Sheet, row: usize, table: &Table) -> Option<&'a str> {
    (0..table.first_metric_col())
        .rev()
        .filter(|col| Some(*col) != table.time_col)
        .find_map(|col| {
            let cell = sheet.cell(row, col);
            let text = cell.as_text()?;
            let is_label = parse_token(text).is_none()
                && match_label(text).is_none()
                && cell_timestamp(cell).is_none();
            is_label.then_some(text)
        })
}

/// One candidate per data row; `None` when no row under the header holds a metric value.
///
/// Rows without a label of their own fall back to `implied_game`. Rows that repeat
/// the header layout and free rows are skipped.
pub fn match_structured(
    sheet: &Sheet,
    table: &Table,
    implied_game: &str,
    sheet_timestamp: Option<DateTime<Utc>>,
) -> Option<Vec<Candidate>> {
    let mut rows = Vec::new();

    for (idx, row) in sheet.rows.iter().enumerate().skip(table.header_row + 1) {
        if row.iter().all(Cell::is_blank)
            || table.repeats_header(sheet, idx)
            || table.is_free_row(sheet, idx)
        {
            continue;
        }

        let mut values = MetricValues::default();
        for (col, metric) in &table.metrics {
            if let Some(v) = cell_value(sheet.cell(idx, *col), *metric) {
                values.set(*metric, v);
            }
        }

        let game = table
            .game_col
            .and_then(|c| game_name(sheet.cell(idx, c)))
            .or_else(|| row_label(sheet, idx, table).map(str::to_string))
            .unwrap_or_else(|| implied_game.to_string());

        let timestamp = table
            .time_col
            .and_then(|c| cell_timestamp(sheet.cell(idx, c)))
            .or(sheet_timestamp);

        rows.push(Candidate {
            game,
            values,
            timestamp,
        });
    }

    (!rows.is_empty()).then_some(rows)
}
