//! Numeric answer normalization
//!
//! Model answers arrive as prose ("about $1 190.99", "1.190,00 €"). The
//! normalizer pulls out the first number and resolves locale-ambiguous
//! separators: the rightmost separator is the decimal point and every other
//! separator is a thousands separator.

use regex::Regex;
use std::sync::LazyLock;

/// First run of digits, optionally negative, with single `,` `.` or space
/// separators between digit groups
static NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"-?[0-9]*(?:[,. ]?[0-9]+)+").ok());

const SEPARATORS: [char; 3] = [' ', ',', '.'];

/// Parse the first number in `text`, for any locale
///
/// Returns `None` when the text holds no digits or the separators cannot be
/// resolved into a single number.
///
/// # Examples
///
/// ```
/// use arbor_extractor::parse_number;
///
/// assert_eq!(parse_number("$1 190.99"), Some(1190.99));
/// assert_eq!(parse_number("1.190,00 €"), Some(1190.0));
/// assert_eq!(parse_number("100.000,000"), Some(100000.0));
/// assert_eq!(parse_number("rrr ,.o"), None);
/// ```
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let span = NUMBER_PATTERN.as_ref()?.find(text)?.as_str();
    resolve_separators(span.trim())
}

/// Parse the first number in `text` and render it as a plain token
///
/// Integral values have no fractional part ("1190", not "1190.0"); other
/// values use the shortest representation that round-trips.
pub fn normalize_numeric(text: &str) -> Option<String> {
    parse_number(text).map(format_number)
}

/// Render a parsed number the way [`normalize_numeric`] does
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    format!("{}", value)
}

fn resolve_separators(span: &str) -> Option<f64> {
    let mut n = span.to_string();

    // With all three separator kinds present, drop trailing groups until only two remain
    while SEPARATORS.iter().all(|sep| n.contains(*sep)) {
        let idx = rightmost_separator(&n)?;
        n.truncate(idx);
    }
    let n = n.trim();

    let kinds: Vec<char> = SEPARATORS.iter().copied().filter(|sep| n.contains(*sep)).collect();
    let cleaned = match kinds.as_slice() {
        [] => n.to_string(),
        [' '] => n.replace(' ', ""),
        [sep] if n.matches(*sep).count() > 1 => n.replace(*sep, ""),
        [sep] => n.replace(*sep, "."),
        _ => {
            let decimal = separator_at(n, rightmost_separator(n)?)?;
            if decimal == ' ' {
                // "100.001 001": a space cannot be a decimal point, so the
                // number ends at it
                return parse_number(&n.replace(' ', "_"));
            }
            let marked = n.replace(decimal, "R");
            let thousands = separator_at(&marked, rightmost_separator(&marked)?)?;
            marked.replace(thousands, "").replace('R', ".")
        }
    };

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn rightmost_separator(s: &str) -> Option<usize> {
    s.rfind(SEPARATORS)
}

fn separator_at(s: &str, idx: usize) -> Option<char> {
    s[idx..].chars().next()
}
