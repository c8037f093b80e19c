//! Embedded-value matcher: metric keywords with their number in the same text,
//! or a bare label cell with the number in the cell to its right.

use chrono::{DateTime, Utc};

use crate::models::MetricValues;
use crate::source::Sheet;

use super::dates::cell_timestamp;
use super::labels::{match_label, match_metric};
use super::numeric::{cell_value, first_number, labelled_values};

/// Everything the free-form part of a sheet says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embedded {
    pub values: MetricValues,
    /// First date found outside the table
    pub timestamp: Option<DateTime<Utc>>,
    /// First plain text cell, a candidate game name
    pub title: Option<String>,
}

/// Scan the given rows, in ascending index order.
///
/// Later matches overwrite earlier ones for the same metric.
pub fn match_embedded(sheet: &Sheet, rows: impl IntoIterator<Item = usize>) -> Embedded {
    let mut found = Embedded::default();

    for r in rows {
        let Some(row) = sheet.rows.get(r) else {
            break;
        };
        // Column headers are never a title
        let header_like = row
            .iter()
            .any(|cell| cell.as_text().and_then(match_label).is_some());
        for (c, cell) in row.iter().enumerate() {
            if found.timestamp.is_none() {
                found.timestamp = cell_timestamp(cell);
                if found.timestamp.is_some() {
                    continue;
                }
            }

            let Some(text) = cell.as_text() else {
                continue;
            };

            let inline = labelled_values(text);
            if !inline.is_empty() {
                for (metric, value) in inline {
                    found.values.set(metric, value);
                }
                continue;
            }

            if let Some(metric) = match_metric(text) {
                // A neighbouring header ("24H" | "Week") is not a value
                let neighbour = sheet.cell(r, c + 1);
                if neighbour.as_text().map_or(true, |t| match_label(t).is_none()) {
                    if let Some(value) = cell_value(neighbour, metric) {
                        found.values.set(metric, value);
                    }
                }
                continue;
            }

            if found.title.is_none() && !header_like && first_number(text).is_none() {
                found.title = Some(text.to_string());
            }
        }
    }

    found
}
