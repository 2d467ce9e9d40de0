//! Calendar date parsing shared by config, tracker exports and reports.

use chrono::{Days, NaiveDate};

use crate::error::{Error, Result};

/// Parse `YYYY-MM-DD` or an ISO timestamp, keeping only the date part.
///
/// Anything after a `T` separator (time, offset) is ignored, so
/// `2009-07-03T09:15:00+00:00` and `2009-07-03` are the same day.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let date_part = match trimmed.split_once('T') {
        Some((date, _)) => date,
        None => trimmed,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|err| Error::InvalidInput(format!("invalid date '{value}': {err}")))
}

/// Parse an optional date, treating blank strings as absent.
pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        Some(raw) if !raw.trim().is_empty() => parse_iso_date(raw).map(Some),
        _ => Ok(None),
    }
}

/// Every calendar day in `[start, end]`, ascending. Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let mut next = Some(start);
    std::iter::from_fn(move || {
        let day = next.filter(|day| *day <= end)?;
        next = day.checked_add_days(Days::new(1));
        Some(day)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_plain_and_timestamp_forms() {
        assert_eq!(parse_iso_date("2009-07-03").unwrap(), ymd(2009, 7, 3));
        assert_eq!(
            parse_iso_date("2009-07-03T09:15:00.123+00:00").unwrap(),
            ymd(2009, 7, 3)
        );
        assert_eq!(parse_iso_date(" 2009-7-3 ").unwrap(), ymd(2009, 7, 3));
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["", "2009-13-01", "yesterday", "2009/07/03"] {
            match parse_iso_date(bad) {
                Err(Error::InvalidInput(_)) => {}
                other => panic!("expected invalid input for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn optional_blank_is_none() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(parse_optional_date(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional_date(Some("2009-07-31")).unwrap(),
            Some(ymd(2009, 7, 31))
        );
    }

    #[test]
    fn day_range_is_inclusive() {
        let days: Vec<_> = days_inclusive(ymd(2009, 6, 29), ymd(2009, 7, 2)).collect();
        assert_eq!(
            days,
            vec![ymd(2009, 6, 29), ymd(2009, 6, 30), ymd(2009, 7, 1), ymd(2009, 7, 2)]
        );
        assert_eq!(days_inclusive(ymd(2009, 7, 2), ymd(2009, 7, 1)).count(), 0);
    }
}
