//! Date-slot arithmetic for the booking calendar.
//!
//! All dates are ISO-8601 `YYYY-MM-DD` strings interpreted in the
//! server's local time zone — one fixed choice for the deployment,
//! never per-request. A *night* of a stay `[check_in, check_out)` is
//! every day `d` with `check_in <= d < check_out`.

use chrono::{Days, Local, NaiveDate};

/// Parses a strict `YYYY-MM-DD` date.
///
/// Rejects anything that is not exactly ten characters of
/// `digit{4}-digit{2}-digit{2}`, so values like `2030-6-1` or RFC3339
/// timestamps never slip through the wire boundary.
#[must_use]
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.len() != 10 {
        return None;
    }
    let bytes = text.as_bytes();
    let digits_at = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !(digits_at(0..4) && bytes[4] == b'-' && digits_at(5..7) && bytes[7] == b'-' && digits_at(8..10))
    {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Parses a check-in/check-out pair, requiring `check_out > check_in`.
///
/// # Errors
///
/// Returns a human-readable message for the validation response.
pub fn parse_date_range(check_in: &str, check_out: &str) -> Result<(NaiveDate, NaiveDate), String> {
    if check_in.trim().is_empty() || check_out.trim().is_empty() {
        return Err("check-in and check-out are required".to_string());
    }

    let check_in = parse_iso_date(check_in).ok_or_else(|| "invalid check-in date".to_string())?;
    let check_out =
        parse_iso_date(check_out).ok_or_else(|| "invalid check-out date".to_string())?;

    if check_out <= check_in {
        return Err("check-out must be after check-in".to_string());
    }

    Ok((check_in, check_out))
}

/// Enumerates the nights of `[check_in, check_out)` in order.
///
/// Callers must have validated `check_out > check_in`; an inverted or
/// empty range yields no nights.
#[must_use]
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = check_in;
    while day < check_out {
        days.push(day);
        day = day + Days::new(1);
    }
    days
}

/// Half-open interval overlap: `[a0, a1)` and `[b0, b1)` share a night
/// iff `a0 < b1 && b0 < a1`.
#[must_use]
pub fn ranges_overlap(a0: NaiveDate, a1: NaiveDate, b0: NaiveDate, b1: NaiveDate) -> bool {
    a0 < b1 && b0 < a1
}

/// Today in the server-local time zone.
#[must_use]
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(text: &str) -> NaiveDate {
        let Some(parsed) = parse_iso_date(text) else {
            panic!("valid date literal: {text}");
        };
        parsed
    }

    #[test]
    fn parses_strict_iso_dates_only() {
        assert!(parse_iso_date("2030-06-10").is_some());
        assert!(parse_iso_date(" 2030-06-10 ").is_some());
        assert!(parse_iso_date("2030-6-10").is_none());
        assert!(parse_iso_date("2030-06-10T00:00:00Z").is_none());
        assert!(parse_iso_date("10-06-2030").is_none());
        assert!(parse_iso_date("2030-13-01").is_none());
        assert!(parse_iso_date("2030-02-30").is_none());
        assert!(parse_iso_date("").is_none());
    }

    #[test]
    fn range_requires_checkout_after_checkin() {
        assert!(parse_date_range("2030-06-10", "2030-06-12").is_ok());
        assert!(parse_date_range("2030-06-10", "2030-06-10").is_err());
        assert!(parse_date_range("2030-06-12", "2030-06-10").is_err());
        assert!(parse_date_range("", "2030-06-10").is_err());
    }

    #[test]
    fn nights_enumerates_half_open_interval() {
        let days = nights(date("2030-06-10"), date("2030-06-12"));
        assert_eq!(days, vec![date("2030-06-10"), date("2030-06-11")]);

        let single = nights(date("2030-06-10"), date("2030-06-11"));
        assert_eq!(single, vec![date("2030-06-10")]);

        assert!(nights(date("2030-06-10"), date("2030-06-10")).is_empty());
    }

    #[test]
    fn nights_crosses_month_boundary() {
        let days = nights(date("2030-06-30"), date("2030-07-02"));
        assert_eq!(days, vec![date("2030-06-30"), date("2030-07-01")]);
    }

    #[test]
    fn overlap_is_exclusive_of_checkout_day() {
        let a0 = date("2030-06-10");
        let a1 = date("2030-06-12");

        // Adjacent stays share no night.
        assert!(!ranges_overlap(a0, a1, date("2030-06-12"), date("2030-06-14")));
        assert!(!ranges_overlap(date("2030-06-08"), a0, a0, a1));

        // One shared night is enough.
        assert!(ranges_overlap(a0, a1, date("2030-06-11"), date("2030-06-13")));
        // Containment overlaps.
        assert!(ranges_overlap(a0, a1, date("2030-06-01"), date("2030-07-01")));
    }
}
