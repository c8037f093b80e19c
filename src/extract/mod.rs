//! Field extraction from workbook content.
//!
//! Each sheet goes through the matchers in a fixed order:
//!
//! 1. [`structured`] - a header row naming metric columns, one game per data row
//! 2. [`embedded`] - metric keywords with inline numbers (`24H: 5.2%`) or a label
//!    cell followed by its value, attributed to the sheet's implied game
//!
//! Structured values win over embedded ones for the same game and metric.

mod dates;
mod embedded;
mod labels;
mod numeric;
mod structured;

pub use dates::{naive_to_utc, to_second};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

use crate::models::Candidate;
use crate::source::{Sheet, Workbook};

use embedded::match_embedded;
use labels::is_generic_sheet_name;
use structured::{find_table, match_structured};

/// Candidates of every sheet, produced lazily one sheet at a time.
pub fn extract(workbook: &Workbook) -> impl Iterator<Item = Candidate> + '_ {
    let stem = workbook.stem();
    workbook
        .sheets
        .iter()
        .flat_map(move |sheet| extract_sheet(sheet, stem))
}

/// All candidates of one sheet, one per (game, explicit timestamp).
pub fn extract_sheet(sheet: &Sheet, workbook_stem: &str) -> Vec<Candidate> {
    let table = find_table(sheet);

    // The free-form area is whatever sits above the header, plus footer rows
    // with nothing in the metric columns
    let mut free = match &table {
        Some(t) => {
            let mut above = match_embedded(sheet, 0..t.header_row + 1);
            let footer = match_embedded(
                sheet,
                (t.header_row + 1..sheet.rows.len()).filter(|&r| t.is_free_row(sheet, r)),
            );
            above.values.overlay(&footer.values);
            above.timestamp = above.timestamp.or(footer.timestamp);
            above
        }
        None => match_embedded(sheet, 0..sheet.rows.len()),
    };
    let game = implied_game(sheet, free.title.as_deref(), workbook_stem);

    let structured = table
        .as_ref()
        .and_then(|t| match_structured(sheet, t, &game, free.timestamp));

    // A header with nothing under it was really a label/value list
    if table.is_some() && structured.is_none() {
        free = match_embedded(sheet, 0..sheet.rows.len());
    }

    let mut candidates = structured.unwrap_or_default();

    if !free.values.is_empty() {
        let mut attached = false;
        for candidate in candidates.iter_mut().filter(|c| c.game == game) {
            candidate.values.fill_missing(&free.values);
            attached = true;
        }
        if !attached {
            candidates.push(Candidate {
                game: game.clone(),
                values: free.values,
                timestamp: free.timestamp,
            });
        }
    }

    merge_repeats(candidates)
}

/// Sheet name, unless it is a tool default; then a title cell; then the file stem.
fn implied_game(sheet: &Sheet, title: Option<&str>, workbook_stem: &str) -> String {
    let name = sheet.name.trim();
    if !is_generic_sheet_name(name) {
        return name.to_string();
    }
    title.unwrap_or(workbook_stem).trim().to_string()
}

/// Folds rows naming the same game (and explicit timestamp) together in sheet
/// order; a later present value replaces an earlier one.
fn merge_repeats(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut index: FxHashMap<(String, Option<DateTime<Utc>>), usize> = FxHashMap::default();
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let key = (candidate.game.clone(), candidate.timestamp);
        match index.get(&key).copied() {
            Some(idx) => merged[idx].values.overlay(&candidate.values),
            None => {
                index.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricValues;
    use crate::source::Cell;
    use chrono::TimeZone;

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn book(sheets: Vec<Sheet>) -> Workbook {
        Workbook::new("daily_stats.xlsx", sheets)
    }

    #[test]
    fn test_structured_header_row() {
        let wb = book(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![t("Game"), t("24H"), t("Week"), t("Month"), t("RTP")],
                vec![t("Slot A"), n(12.3), n(45.6), n(78.9), n(96.1)],
            ],
        )]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(
            candidates,
            vec![Candidate::new(
                "Slot A",
                MetricValues::new(Some(12.3), Some(45.6), Some(78.9), Some(96.1))
            )]
        );
    }

    #[test]
    fn test_embedded_value_uses_sheet_name() {
        let wb = book(vec![Sheet::new("Roulette", vec![vec![t("24H: 5.2%")]])]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(
            candidates,
            vec![Candidate::new(
                "Roulette",
                MetricValues::new(Some(5.2), None, None, None)
            )]
        );
    }

    #[test]
    fn test_empty_sheet_yields_nothing() {
        let wb = book(vec![
            Sheet::new("Notes", vec![vec![t("nothing to see")]]),
            Sheet::new("Empty", vec![]),
        ]);
        assert_eq!(extract(&wb).count(), 0);
    }

    #[test]
    fn test_structured_beats_embedded_for_same_game() {
        let wb = book(vec![Sheet::new(
            "Blackjack",
            vec![
                vec![t("RTP: 90"), t("Month: 11")],
                vec![t("24H"), t("RTP")],
                vec![n(1.5), n(99.0)],
            ],
        )]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].game, "Blackjack");
        assert_eq!(
            candidates[0].values,
            MetricValues::new(Some(1.5), None, Some(11.0), Some(99.0))
        );
    }

    #[test]
    fn test_repeated_game_keeps_last_value() {
        let wb = book(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![t("Game"), t("24H"), t("Week")],
                vec![t("Slot A"), n(1.0), n(2.0)],
                vec![t("Slot B"), n(5.0), n(6.0)],
                vec![t("Slot A"), n(3.0), t("#N/A")],
            ],
        )]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].game, "Slot A");
        assert_eq!(
            candidates[0].values,
            MetricValues::new(Some(3.0), Some(2.0), None, None)
        );
        assert_eq!(candidates[1].game, "Slot B");
    }

    #[test]
    fn test_legacy_text_columns_with_time() {
        let wb = book(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![t("Text"), t("Text1"), t("Text2"), t("Text3"), t("Text4"), t("Current_time")],
                vec![
                    t("Book of Gold"),
                    t("24h 1,25"),
                    t("week 3.5"),
                    t("month 12"),
                    t("rtp 96.5"),
                    t("2024-05-01 12:00:00"),
                ],
            ],
        )]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].game, "Book of Gold");
        assert_eq!(
            candidates[0].values,
            MetricValues::new(Some(1.25), Some(3.5), Some(12.0), Some(96.5))
        );
        assert_eq!(
            candidates[0].timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_label_value_list_on_generic_sheet_uses_title() {
        let wb = book(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![t("Crazy Time")],
                vec![t("24H"), n(2.0)],
                vec![t("Week"), n(9.0)],
            ],
        )]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(
            candidates,
            vec![Candidate::new(
                "Crazy Time",
                MetricValues::new(Some(2.0), Some(9.0), None, None)
            )]
        );
    }

    #[test]
    fn test_title_row_above_table() {
        let wb = book(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![t("Weekly report")],
                vec![],
                vec![t("Game"), t("24H"), t("Week"), t("Month"), t("RTP")],
                vec![t("Slot A"), n(12.3), n(45.6), n(78.9), n(96.1)],
                vec![t("Weekend Wins"), n(1.0), n(2.0), n(3.0), n(97.0)],
            ],
        )]);

        let games: Vec<String> = extract(&wb).map(|c| c.game).collect();
        assert_eq!(games, vec!["Slot A", "Weekend Wins"]);
    }

    #[test]
    fn test_footer_value_attaches_to_implied_game() {
        let wb = book(vec![Sheet::new(
            "Roulette",
            vec![
                vec![t("Game"), t("24H")],
                vec![t("Roulette"), n(5.0)],
                vec![t("RTP: 96.5%")],
            ],
        )]);

        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(
            candidates,
            vec![Candidate::new(
                "Roulette",
                MetricValues::new(Some(5.0), None, None, Some(96.5))
            )]
        );
    }

    #[test]
    fn test_generic_sheet_without_title_uses_file_stem() {
        let wb = book(vec![Sheet::new("Sheet1", vec![vec![t("RTP 95.1")]])]);
        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(candidates[0].game, "daily_stats");
    }

    #[test]
    fn test_sheet_timestamp_applies_to_rows() {
        let wb = book(vec![Sheet::new(
            "Sheet1",
            vec![
                vec![t("Report 01.05.2024 08:00")],
                vec![t("Game"), t("RTP")],
                vec![t("Slot A"), n(96.0)],
            ],
        )]);
        let candidates: Vec<Candidate> = extract(&wb).collect();
        assert_eq!(
            candidates[0].timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
        );
    }
}
