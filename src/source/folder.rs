use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use log::debug;

use super::{Cell, Sheet, Workbook, WorkbookEntry, WorkbookSource};

/// Reads workbooks from a local folder.
///
/// Files are listed in name order. Office lock files (`~$report.xlsx`) and
/// extensions outside the configured list are ignored.
pub struct FolderSource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with("~$") {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl WorkbookSource for FolderSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list(&self) -> Result<Vec<WorkbookEntry>> {
        // A folder the sync has not created yet is just empty
        if !self.root.exists() {
            debug!("Source folder {} does not exist yet", self.root.display());
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list {}", self.root.display()))?
        {
            let path = entry?.path();
            if !path.is_file() || !self.accepts(&path) {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(WorkbookEntry {
                name,
                locator: path.to_string_lossy().into_owned(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open(&self, entry: &WorkbookEntry) -> Result<Workbook> {
        let mut book = open_workbook_auto(&entry.locator)
            .with_context(|| format!("Failed to open workbook {}", entry.name))?;

        let mut sheets = Vec::new();
        for sheet_name in book.sheet_names() {
            let range = book
                .worksheet_range(&sheet_name)
                .with_context(|| format!("Failed to read sheet '{}' of {}", sheet_name, entry.name))?;

            let rows = range
                .rows()
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();
            sheets.push(Sheet::new(sheet_name, rows));
        }

        Ok(Workbook::new(entry.name.clone(), sheets))
    }
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["xlsx".to_string(), "xls".to_string()]
    }

    #[test]
    fn test_missing_folder_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = FolderSource::new(dir.path().join("not-there"), &extensions());
        assert!(source.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.xlsx", "a.XLS", "notes.txt", "~$b.xlsx"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.xlsx")).unwrap();

        let source = FolderSource::new(dir.path(), &extensions());
        let names: Vec<String> = source.list().unwrap().into_iter().map(|e| e.name).collect();

        assert_eq!(names, vec!["a.XLS".to_string(), "b.xlsx".to_string()]);
    }

    #[test]
    fn test_corrupt_workbook_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.xlsx"), b"definitely not a zip").unwrap();

        let source = FolderSource::new(dir.path(), &extensions());
        let entries = source.list().unwrap();
        assert_eq!(entries.len(), 1);

        let err = source.open(&entries[0]).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.xlsx"));
    }

    #[test]
    fn test_real_workbook_cells_and_candidates() {
        use chrono::{NaiveDate, TimeZone, Utc};
        use rust_xlsxwriter::{ExcelDateTime, Format};

        use crate::extract::extract;
        use crate::models::{Candidate, MetricValues};

        let dir = tempfile::tempdir().unwrap();
        let mut xlsx = rust_xlsxwriter::Workbook::new();
        let sheet = xlsx.add_worksheet();
        sheet.set_name("Sheet1").unwrap();
        for (col, header) in ["Game", "24H", "Week", "Month", "RTP", "Current_time"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        sheet.write_string(1, 0, "Slot A").unwrap();
        sheet.write_number(1, 1, 12.3).unwrap();
        sheet.write_number(1, 2, 45.6).unwrap();
        sheet.write_number(1, 3, 78.9).unwrap();
        sheet.write_string(1, 4, "96,1 %").unwrap();
        let stamp = ExcelDateTime::parse_from_str("2024-05-01T12:00:00").unwrap();
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        sheet
            .write_datetime_with_format(1, 5, &stamp, &date_format)
            .unwrap();
        sheet.write_number(2, 0, 777).unwrap();
        sheet.write_number(2, 4, 95).unwrap();
        xlsx.save(dir.path().join("slots.xlsx")).unwrap();

        let source = FolderSource::new(dir.path(), &extensions());
        let entries = source.list().unwrap();
        let workbook = source.open(&entries[0]).unwrap();

        assert_eq!(workbook.name, "slots.xlsx");
        assert_eq!(workbook.sheets[0].name, "Sheet1");
        let rows = &workbook.sheets[0].rows;
        assert_eq!(rows[0][0], Cell::text("Game"));
        assert_eq!(rows[1][1], Cell::Number(12.3));
        assert_eq!(
            rows[1][5],
            Cell::DateTime(
                NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(rows[2][0], Cell::Number(777.0));

        let candidates: Vec<Candidate> = extract(&workbook).collect();
        assert_eq!(
            candidates,
            vec![
                Candidate {
                    game: "Slot A".to_string(),
                    values: MetricValues::new(Some(12.3), Some(45.6), Some(78.9), Some(96.1)),
                    timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
                },
                Candidate::new("777", MetricValues::new(None, None, None, Some(95.0))),
            ]
        );
    }

    #[test]
    fn test_error_cells_keep_their_marker() {
        let cell = convert_cell(&Data::Error(calamine::CellErrorType::NA));
        assert_eq!(cell, Cell::Error("#N/A".to_string()));
        assert_eq!(convert_cell(&Data::Int(7)), Cell::Number(7.0));
    }
}
