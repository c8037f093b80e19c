//! Header label matching.
//!
//! Labels are compared after lowercasing and dropping everything that is not a
//! letter or digit, so `"24 H"`, `"24h:"` and `"24H"` all read as `24h`.

use crate::models::Metric;

/// Words allowed around a metric alias in a structured header, e.g. the `value`
/// in `"24H value"` or the `avg` in `"Avg RTP"`.
const QUALIFIERS: &[&str] = &[
    "value", "values", "pct", "percent", "avg", "average", "rate", "total", "change", "diff",
    "delta", "current", "last",
];

/// Kind of column a header cell announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Metric(Metric),
    Game,
    Time,
}

fn metric_aliases(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::Day => &["24h", "24hour", "24hours", "1d", "daily"],
        Metric::Week => &["week", "weekly", "1w", "7d"],
        Metric::Month => &["month", "monthly", "1m", "30d"],
        Metric::Rtp => &["rtp"],
    }
}

/// Legacy export column names; only exact matches count.
fn legacy_alias(metric: Metric) -> &'static str {
    match metric {
        Metric::Day => "text1",
        Metric::Week => "text2",
        Metric::Month => "text3",
        Metric::Rtp => "text4",
    }
}

const GAME_ALIASES: &[&str] = &["game", "text", "oyun", "name", "title"];

const TIME_ALIASES: &[&str] = &[
    "currenttime",
    "timestamp",
    "time",
    "datetime",
    "date",
    "tarih",
    "zaman",
];

/// Lowercase alphanumerics only.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lowercase alphanumeric runs, `"24 H value"` -> `["24", "h", "value"]`.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `alias` spelled by leading or trailing words, every other word a qualifier.
fn is_qualified(words: &[String], alias: &str) -> bool {
    let is_qualifier = |w: &String| QUALIFIERS.contains(&w.as_str());
    (1..words.len()).any(|split| {
        let (head, tail) = words.split_at(split);
        (head.concat() == alias && tail.iter().all(is_qualifier))
            || (tail.concat() == alias && head.iter().all(is_qualifier))
    })
}

/// Structured match of a metric header.
///
/// Returns `None` for cells that carry a number next to the label; those are
/// embedded values, not column headers.
pub fn match_metric(text: &str) -> Option<Metric> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }

    if let Some(metric) = Metric::ALL
        .into_iter()
        .find(|m| normalized == legacy_alias(*m))
    {
        return Some(metric);
    }

    if let Some(metric) = Metric::ALL
        .into_iter()
        .find(|m| metric_aliases(*m).contains(&normalized.as_str()))
    {
        return Some(metric);
    }

    let words = words(text);
    Metric::ALL.into_iter().find(|m| {
        metric_aliases(*m)
            .iter()
            .any(|alias| is_qualified(&words, alias))
    })
}

fn matches_any(text: &str, aliases: &[&str]) -> bool {
    let normalized = normalize(text);
    aliases.iter().any(|a| normalized == *a)
}

pub fn match_label(text: &str) -> Option<Label> {
    if let Some(metric) = match_metric(text) {
        return Some(Label::Metric(metric));
    }
    if matches_any(text, GAME_ALIASES) {
        return Some(Label::Game);
    }
    if matches_any(text, TIME_ALIASES) {
        return Some(Label::Time);
    }
    None
}

/// Default names spreadsheet tools give new sheets (`Sheet1`, `Sayfa2`, ...).
pub fn is_generic_sheet_name(name: &str) -> bool {
    const DEFAULTS: &[&str] = &[
        "sheet", "sayfa", "tabelle", "feuil", "hoja", "foglio", "planilha", "blad", "arkusz",
    ];
    let normalized = normalize(name);
    let stem = normalized.trim_end_matches(|c: char| c.is_ascii_digit());
    normalized.is_empty() || DEFAULTS.contains(&stem)
}

/// Regex alternation of every metric keyword, longest first, for embedded scans.
pub(crate) fn keyword_pattern(metric: Metric) -> String {
    let mut aliases: Vec<&str> = metric_aliases(metric).to_vec();
    aliases.push(legacy_alias(metric));
    aliases.sort_by_key(|a| std::cmp::Reverse(a.len()));
    aliases
        .iter()
        .map(|a| {
            // Let "24h" also match "24 h" and "24-h"
            let mut out = String::new();
            let mut prev_digit = None;
            for c in a.chars() {
                if let Some(was_digit) = prev_digit {
                    if was_digit != c.is_ascii_digit() {
                        out.push_str(r"[\s\-]?");
                    }
                }
                out.push(c);
                prev_digit = Some(c.is_ascii_digit());
            }
            out
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_case_insensitive_headers() {
        assert_eq!(match_metric("24H"), Some(Metric::Day));
        assert_eq!(match_metric("week"), Some(Metric::Week));
        assert_eq!(match_metric("MONTH"), Some(Metric::Month));
        assert_eq!(match_metric("RTP"), Some(Metric::Rtp));
    }

    #[test]
    fn test_punctuation_and_qualifiers() {
        assert_eq!(match_metric("24 H:"), Some(Metric::Day));
        assert_eq!(match_metric("RTP (%)"), Some(Metric::Rtp));
        assert_eq!(match_metric("Weekly"), Some(Metric::Week));
        assert_eq!(match_metric("24H value"), Some(Metric::Day));
        assert_eq!(match_metric("Avg RTP"), Some(Metric::Rtp));
    }

    #[test]
    fn test_embedded_numbers_are_not_headers() {
        assert_eq!(match_metric("24H: 5.2%"), None);
        assert_eq!(match_metric("RTP 96,1"), None);
    }

    #[test]
    fn test_legacy_text_columns_are_exact() {
        assert_eq!(match_label("Text"), Some(Label::Game));
        assert_eq!(match_label("Text1"), Some(Label::Metric(Metric::Day)));
        assert_eq!(match_label("Text4"), Some(Label::Metric(Metric::Rtp)));
        assert_eq!(match_label("Current_time"), Some(Label::Time));
        assert_eq!(match_label("Text12"), None);
    }

    #[test]
    fn test_long_qualifiers_are_rejected() {
        assert_eq!(match_metric("Month of the big promotion"), None);
        assert_eq!(match_label("Slot A"), None);
    }

    #[test]
    fn test_titles_and_game_names_are_not_headers() {
        for text in [
            "Weekly report",
            "Weekend Wins",
            "Daily Jackpot",
            "Monthly Mega",
            "Gold Rush 1M",
            "RTPlus",
        ] {
            assert_eq!(match_label(text), None, "{text}");
        }
    }

    #[test]
    fn test_qualifiers_come_from_a_fixed_list() {
        assert_eq!(match_metric("Weekly total"), Some(Metric::Week));
        assert_eq!(match_metric("RTP percent"), Some(Metric::Rtp));
        assert_eq!(match_metric("24-H change"), Some(Metric::Day));
        assert_eq!(match_metric("RTP slot"), None);
    }

    #[test]
    fn test_generic_sheet_names() {
        assert!(is_generic_sheet_name("Sheet1"));
        assert!(is_generic_sheet_name("Sayfa2"));
        assert!(is_generic_sheet_name("  "));
        assert!(!is_generic_sheet_name("Roulette"));
    }

    #[test]
    fn test_keyword_pattern_allows_spacing() {
        let pattern = keyword_pattern(Metric::Day);
        assert!(pattern.contains(r"24[\s\-]?h"));
        assert!(pattern.contains(r"text[\s\-]?1"));
    }
}
