//! Numeric token parsing.
//!
//! Workbooks come from several locales, so a token may use `.` or `,` as its
//! decimal mark and `.`, `,` or `'` for thousands. When both marks appear the last
//! one is the decimal mark. A mark that appears once is a decimal mark, a mark that
//! repeats groups thousands.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Metric;
use crate::source::Cell;

use super::labels::keyword_pattern;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]?\d+(?:[.,']\d+)*").expect("number pattern"));

/// `<keyword><separators><number>` per metric, e.g. `24H: 5.2%` or `RTP=96,1`.
static LABELLED: Lazy<Vec<(Metric, Regex)>> = Lazy::new(|| {
    Metric::ALL
        .into_iter()
        .map(|metric| {
            let pattern = format!(
                r"(?i)(?:^|[^\p{{L}}\d])(?:{})[^\p{{L}}\d+\-]{{0,6}}([+-]?\d+(?:[.,']\d+)*)",
                keyword_pattern(metric)
            );
            (metric, Regex::new(&pattern).expect("labelled metric pattern"))
        })
        .collect()
});

/// Parse one numeric token such as `-1.234,5` or `96.1`.
pub fn parse_token(token: &str) -> Option<f64> {
    let token = token.trim().trim_end_matches('%').trim();
    let (sign, digits) = match token.chars().next()? {
        '-' => ("-", &token[1..]),
        '+' => ("", &token[1..]),
        _ => ("", token),
    };
    let digits = digits.replace('\'', "");

    let dots = digits.matches('.').count();
    let commas = digits.matches(',').count();

    let normalized = match (dots, commas) {
        (0, 0) | (1, 0) => digits,
        (_, 0) => digits.replace('.', ""),
        (0, 1) => digits.replace(',', "."),
        (0, _) => digits.replace(',', ""),
        _ => {
            let last_dot = digits.rfind('.').unwrap_or(0);
            let last_comma = digits.rfind(',').unwrap_or(0);
            if last_comma > last_dot {
                digits.replace('.', "").replace(',', ".")
            } else {
                digits.replace(',', "")
            }
        }
    };

    let value: f64 = format!("{sign}{normalized}").parse().ok()?;
    value.is_finite().then_some(value)
}

/// First numeric token anywhere in `text`.
pub fn first_number(text: &str) -> Option<f64> {
    NUMBER.find(text).and_then(|m| parse_token(m.as_str()))
}

/// Every `(metric, value)` pair announced by a keyword inside `text`.
pub fn labelled_values(text: &str) -> Vec<(Metric, f64)> {
    LABELLED
        .iter()
        .filter_map(|(metric, re)| {
            re.captures_iter(text)
                .filter_map(|caps| caps.get(1).and_then(|m| parse_token(m.as_str())))
                .last()
                .map(|v| (*metric, v))
        })
        .collect()
}

/// Value of a data cell in a known metric column.
///
/// Text is read as the number after the metric keyword when there is one,
/// otherwise as its first number. Errors, booleans and dates are not metrics.
pub fn cell_value(cell: &Cell, metric: Metric) -> Option<f64> {
    match cell {
        Cell::Number(v) => v.is_finite().then_some(*v),
        Cell::Text(text) => labelled_values(text)
            .into_iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, v)| v)
            .or_else(|| first_number(text)),
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) | Cell::Error(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_signed_tokens() {
        assert_eq!(parse_token("12.3"), Some(12.3));
        assert_eq!(parse_token("-4"), Some(-4.0));
        assert_eq!(parse_token("+7.5%"), Some(7.5));
    }

    #[test]
    fn test_locale_decimal_marks() {
        assert_eq!(parse_token("96,1"), Some(96.1));
        assert_eq!(parse_token("1.234,5"), Some(1234.5));
        assert_eq!(parse_token("1,234.5"), Some(1234.5));
        assert_eq!(parse_token("1,234,567"), Some(1234567.0));
        assert_eq!(parse_token("1.234.567"), Some(1234567.0));
        assert_eq!(parse_token("1'234.5"), Some(1234.5));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(parse_token(""), None);
        assert_eq!(parse_token("abc"), None);
        assert_eq!(first_number("n/a"), None);
    }

    #[test]
    fn test_labelled_values_in_free_text() {
        assert_eq!(labelled_values("24H: 5.2%"), vec![(Metric::Day, 5.2)]);
        assert_eq!(labelled_values("RTP=96,1"), vec![(Metric::Rtp, 96.1)]);
        assert_eq!(
            labelled_values("24 h 1,5 | Week: 7 | Month (%) 30"),
            vec![(Metric::Day, 1.5), (Metric::Week, 7.0), (Metric::Month, 30.0)]
        );
    }

    #[test]
    fn test_keywords_need_a_boundary() {
        assert!(labelled_values("weekend 5").is_empty());
        assert!(labelled_values("A21m 4").is_empty());
        assert!(labelled_values("Slot 24").is_empty());
    }

    #[test]
    fn test_cell_value_skips_errors_only() {
        assert_eq!(cell_value(&Cell::Number(45.6), Metric::Week), Some(45.6));
        assert_eq!(cell_value(&Cell::text("5,2 %"), Metric::Day), Some(5.2));
        assert_eq!(cell_value(&Cell::text("24h 3.1 (prev 2.0)"), Metric::Day), Some(3.1));
        assert_eq!(cell_value(&Cell::Error("#N/A".into()), Metric::Rtp), None);
        assert_eq!(cell_value(&Cell::text("—"), Metric::Rtp), None);
        assert_eq!(cell_value(&Cell::Number(f64::NAN), Metric::Rtp), None);
    }
}
