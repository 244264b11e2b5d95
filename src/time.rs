//! # Calendar utilities
//!
//! All timestamps handled by the crate are Unix seconds interpreted in UTC. Goal files express
//! dates either as raw timestamps or as 8 digit daystamps (`YYYYMMDD`, with an optional single
//! separator between the fields). Gregorian conversions go through [`hifitime::Epoch`].
use std::sync::LazyLock;

use hifitime::Epoch;
use regex::Regex;

use crate::constants::{Daystamp, UnixTime, SID};

static DAYSTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\D?(\d{2})\D?(\d{2})$").expect("valid daystamp regex"));

/// Floor a timestamp to midnight UTC of the same day.
pub fn daysnap(t: UnixTime) -> UnixTime {
    (t / SID).floor() * SID
}

/// Gregorian (year, month, day) of the UTC day containing `t`.
///
/// The conversion is taken at noon so that leap second bookkeeping can never move the
/// result onto a neighbouring day.
fn ymd(t: UnixTime) -> (i32, u8, u8) {
    let (y, m, d, _, _, _, _) = Epoch::from_unix_seconds(daysnap(t) + SID / 2.0).to_gregorian_utc();
    (y, m, d)
}

/// Parse a daystamp into the timestamp of its UTC midnight.
///
/// Arguments
/// ---------
/// * `s`: a string like `20240131`, `2024-01-31` or `2024.01.31`
///
/// Return
/// ----------
/// * `Some(timestamp)` when the string is a valid calendar date, `None` otherwise
pub fn dayparse(s: &str) -> Option<UnixTime> {
    let caps = DAYSTAMP_RE.captures(s.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u8 = caps[2].parse().ok()?;
    let day: u8 = caps[3].parse().ok()?;
    let epoch = Epoch::maybe_from_gregorian_utc(year, month, day, 12, 0, 0, 0).ok()?;
    Some(((epoch.to_unix_seconds() - SID / 2.0) / SID).round() * SID)
}

/// Render a timestamp as an 8 digit daystamp, `"ERROR"` when it is negative or not a number.
pub fn dayify(t: UnixTime) -> Daystamp {
    if t.is_nan() || t < 0.0 {
        return "ERROR".to_string();
    }
    let (y, m, d) = ymd(t);
    format!("{y:04}{m:02}{d:02}")
}

/// Human readable date, `YYYY.MM.DD`.
pub fn format_date(t: UnixTime) -> String {
    if !t.is_finite() {
        return "NaN".to_string();
    }
    let (y, m, d) = ymd(t);
    format!("{y:04}.{m:02}.{d:02}")
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn test_daysnap() {
        // 2024-01-31 15:00:00 UTC
        assert_eq!(daysnap(1_706_713_200.0), 1_706_659_200.0);
        assert_eq!(daysnap(1_706_659_200.0), 1_706_659_200.0);
    }

    #[test]
    fn test_dayparse() {
        assert_eq!(dayparse("20240131"), Some(1_706_659_200.0));
        assert_eq!(dayparse("2024-01-31"), Some(1_706_659_200.0));
        assert_eq!(dayparse("2024.01.31"), Some(1_706_659_200.0));
        assert_eq!(dayparse("19700101"), Some(0.0));
        assert_eq!(dayparse("2024-13-01"), None);
        assert_eq!(dayparse("tomorrow"), None);
        assert_eq!(dayparse("1706659200"), None);
    }

    #[test]
    fn test_dayify() {
        assert_eq!(dayify(1_706_659_200.0), "20240131");
        assert_eq!(dayify(1_706_713_200.0), "20240131");
        assert_eq!(dayify(f64::NAN), "ERROR");
        assert_eq!(dayify(-1.0), "ERROR");
        let t = dayparse("20190705").unwrap();
        assert_eq!(dayify(t), "20190705");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(1_706_659_200.0), "2024.01.31");
        assert_eq!(format_date(0.0), "1970.01.01");
    }
}
