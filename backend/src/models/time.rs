use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StaraltError;

/// Julian Date of the Unix epoch (1970-01-01T00:00:00 UTC).
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Offset between Julian Date and Modified Julian Date.
pub const MJD_OFFSET: f64 = 2_400_000.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A UTC point in time.
///
/// Never carries a timezone; local time is a projection through
/// [`Site::local_time`](crate::models::Site::local_time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(DateTime<Utc>);

impl Instant {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Current wall-clock time. Only used to resolve omitted reference instants.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        self.0.timestamp() as f64 + self.0.timestamp_subsec_nanos() as f64 / 1e9
    }

    /// Create from Unix timestamp. Returns `None` outside chrono's range.
    pub fn from_unix_timestamp(timestamp: f64) -> Option<Self> {
        if !timestamp.is_finite() {
            return None;
        }
        let secs = timestamp.floor();
        let nanos = ((timestamp - secs) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos).map(Self)
    }

    /// Julian Date (UTC-based).
    pub fn julian_date(&self) -> f64 {
        self.to_unix_timestamp() / SECONDS_PER_DAY + UNIX_EPOCH_JD
    }

    /// Modified Julian Date (UTC-based).
    pub fn modified_julian_date(&self) -> f64 {
        self.julian_date() - MJD_OFFSET
    }

    pub fn from_julian_date(jd: f64) -> Option<Self> {
        Self::from_unix_timestamp((jd - UNIX_EPOCH_JD) * SECONDS_PER_DAY)
    }

    /// Shift by a fractional number of seconds (microsecond resolution).
    ///
    /// Saturates at the earliest/latest representable instant.
    pub fn offset_seconds(&self, seconds: f64) -> Self {
        let delta = TimeDelta::microseconds((seconds * 1e6).round() as i64);
        match self.0.checked_add_signed(delta) {
            Some(shifted) => Instant(shifted),
            None if seconds < 0.0 => Instant(DateTime::<Utc>::MIN_UTC),
            None => Instant(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Signed number of seconds from `earlier` to `self`.
    pub fn seconds_since(&self, earlier: Instant) -> f64 {
        let delta = self.0 - earlier.0;
        delta.num_seconds() as f64 + delta.subsec_nanos() as f64 * 1e-9
    }

    /// Naive ISO-8601 form, `YYYY-MM-DDTHH:MM:SS` with a `.ffffff` suffix only
    /// when the microsecond field is non-zero.
    pub fn isoformat(&self) -> String {
        if self.0.timestamp_subsec_micros() == 0 {
            self.0.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            self.0.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
        }
    }
}

impl From<DateTime<Utc>> for Instant {
    fn from(datetime: DateTime<Utc>) -> Self {
        Instant(datetime)
    }
}

impl Add<TimeDelta> for Instant {
    type Output = Instant;

    fn add(self, rhs: TimeDelta) -> Instant {
        Instant(self.0 + rhs)
    }
}

impl Sub<TimeDelta> for Instant {
    type Output = Instant;

    fn sub(self, rhs: TimeDelta) -> Instant {
        Instant(self.0 - rhs)
    }
}

impl Sub<Instant> for Instant {
    type Output = TimeDelta;

    fn sub(self, rhs: Instant) -> TimeDelta {
        self.0 - rhs.0
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Parses RFC 3339 (`2024-01-25T20:00:00Z`) or a naive timestamp, which is
/// taken to be UTC (`2024-01-25T20:00:00`, `2024-01-25 20:00:00.5`).
impl FromStr for Instant {
    type Err = StaraltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Instant(dt.with_timezone(&Utc)));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| Instant(naive.and_utc()))
            .ok_or_else(|| StaraltError::InvalidInstant(format!("cannot parse '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Instant {
        Instant::new(Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap())
    }

    #[test]
    fn test_julian_date_j2000() {
        // J2000.0 = 2000-01-01T12:00:00 = JD 2451545.0
        let t = instant(2000, 1, 1, 12, 0, 0);
        assert!((t.julian_date() - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn test_mjd_unix_epoch() {
        let t = instant(1970, 1, 1, 0, 0, 0);
        assert!((t.modified_julian_date() - 40_587.0).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_julian_date() {
        let t = instant(2024, 1, 25, 20, 0, 0);
        let back = Instant::from_julian_date(t.julian_date()).unwrap();
        assert!(back.seconds_since(t).abs() < 1e-3);
    }

    #[test]
    fn test_offset_and_seconds_since() {
        let t = instant(2024, 1, 25, 20, 0, 0);
        let later = t.offset_seconds(90.25);
        assert!((later.seconds_since(t) - 90.25).abs() < 1e-6);
        assert!((t.seconds_since(later) + 90.25).abs() < 1e-6);
    }

    #[test]
    fn test_offset_saturates_instead_of_overflowing() {
        let t = instant(2024, 1, 25, 20, 0, 0);
        assert_eq!(t.offset_seconds(1e18), Instant::new(DateTime::<Utc>::MAX_UTC));
        assert_eq!(t.offset_seconds(-1e18), Instant::new(DateTime::<Utc>::MIN_UTC));
    }

    #[test]
    fn test_ordering() {
        let a = instant(2024, 1, 25, 20, 0, 0);
        let b = a + TimeDelta::minutes(5);
        assert!(a < b);
        assert_eq!(b - a, TimeDelta::minutes(5));
    }

    #[test]
    fn test_isoformat_whole_seconds() {
        let t = instant(2024, 1, 25, 23, 52, 7);
        assert_eq!(t.isoformat(), "2024-01-25T23:52:07");
    }

    #[test]
    fn test_isoformat_with_micros() {
        let t = instant(2024, 1, 25, 23, 52, 7).offset_seconds(0.25);
        assert_eq!(t.isoformat(), "2024-01-25T23:52:07.250000");
    }

    #[test]
    fn test_parse_rfc3339_and_naive() {
        let a: Instant = "2024-01-25T20:00:00Z".parse().unwrap();
        let b: Instant = "2024-01-25T17:00:00-03:00".parse().unwrap();
        let c: Instant = "2024-01-25T20:00:00".parse().unwrap();
        let d: Instant = "2024-01-25 20:00:00".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
    }

    #[test]
    fn test_parse_invalid() {
        let err = "25/01/2024".parse::<Instant>().unwrap_err();
        assert!(matches!(err, StaraltError::InvalidInstant(_)));
    }

    #[test]
    fn test_serde_transparent() {
        let t = instant(2024, 1, 25, 20, 0, 0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2024-01-25T20:00:00Z\"");
        let back: Instant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
