// Cell-level parsing, civil-calendar arithmetic and number formatting for
// the portal extracts.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Offset between the civil (ROC) calendar year and the Gregorian year.
pub const CIVIL_YEAR_OFFSET: i32 = 1911;

const BOM: char = '\u{feff}';

/// Areas and unit prices as the portal writes them: padded, sometimes with
/// thousands separators. Text with letters, `NaN` and infinities give `None`.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whole-currency amounts. Integral text parses directly; a decimal such as
/// `"123456.0"` is rounded rather than rejected.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned = s.replace(',', "");
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(v);
    }
    parse_f64_safe(Some(&cleaned)).map(|v| v.round() as i64)
}

/// `true` when a field is absent or blank, as opposed to present but garbled.
pub fn is_blank(s: Option<&str>) -> bool {
    s.map_or(true, |v| v.trim().is_empty())
}

pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(BOM).unwrap_or(s)
}

/// Number of days in a civil-calendar month, via the Gregorian calendar.
pub fn days_in_month(civil_year: i32, month: u32) -> Option<u32> {
    let year = civil_year.checked_add(CIVIL_YEAR_OFFSET)?;
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next.pred_opt()?.day())
}

/// The portal ships a Chinese header row and then an English one. The second
/// row is recognized by being plain ASCII words: no CJK, no numbers, and at
/// least one multi-word label.
pub fn is_english_header<'a, I>(cells: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let mut saw_words = false;
    let mut saw_any = false;
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        saw_any = true;
        if !cell.is_ascii() || parse_f64_safe(Some(cell)).is_some() {
            return false;
        }
        if cell.contains(' ') {
            saw_words = true;
        }
    }
    saw_any && saw_words
}

pub fn average(v: &[f64]) -> f64 {
    // 0 for no samples.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_parsing_strips_separators_and_rejects_garbage() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_i64_safe(Some("12,500,000")), Some(12_500_000));
        assert_eq!(parse_i64_safe(Some("98765.6")), Some(98_766));
        assert_eq!(parse_i64_safe(Some("abc")), None);
        assert!(is_blank(None));
        assert!(is_blank(Some("  ")));
        assert!(!is_blank(Some("x")));
    }

    #[test]
    fn month_lengths_follow_gregorian_calendar() {
        // civil 113 == 2024, a leap year
        assert_eq!(days_in_month(113, 2), Some(29));
        assert_eq!(days_in_month(112, 2), Some(28));
        assert_eq!(days_in_month(113, 3), Some(31));
        assert_eq!(days_in_month(113, 12), Some(31));
        assert_eq!(days_in_month(113, 13), None);
    }

    #[test]
    fn english_header_row_is_detected() {
        assert!(is_english_header(["The villages and towns urban district", "transaction sign"]));
        assert!(!is_english_header(["大安區", "房地(土地+建物)"]));
        assert!(!is_english_header(["A0001", "5", "30.5"]));
        assert!(!is_english_header(["", ""]));
    }

    #[test]
    fn bom_is_removed_once() {
        assert_eq!(strip_bom("\u{feff}鄉鎮市區"), "鄉鎮市區");
        assert_eq!(strip_bom("編號"), "編號");
    }

    #[test]
    fn numbers_are_grouped() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.0, 1), "-42.0");
        assert_eq!(format_int(9855), "9,855");
    }
}
