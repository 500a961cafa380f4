use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use thiserror::Error;

pub const JD_J2000: f64 = 2451545.0;
pub const SEC_PER_DAY: f64 = 86400.0;
pub const DAYS_PER_CENTURY: f64 = 36525.0;

/// TT = TAI + 32.184 s by definition.
const TT_MINUS_TAI: f64 = 32.184;

/// Cumulative leap seconds (TAI - UTC) and the UTC second since J2000 at
/// which each value took effect.
/// https://naif.jpl.nasa.gov/pub/naif/generic_kernels/lsk/latest_leapseconds.tls
const LEAP_SECONDS: [(f64, f64); 28] = [
    (10.0, -883656000.0), // 1972-JAN-1
    (11.0, -867931200.0), // 1972-JUL-1
    (12.0, -852033600.0), // 1973-JAN-1
    (13.0, -820497600.0), // 1974-JAN-1
    (14.0, -788961600.0), // 1975-JAN-1
    (15.0, -757425600.0), // 1976-JAN-1
    (16.0, -725803200.0), // 1977-JAN-1
    (17.0, -694267200.0), // 1978-JAN-1
    (18.0, -662731200.0), // 1979-JAN-1
    (19.0, -631195200.0), // 1980-JAN-1
    (20.0, -583934400.0), // 1981-JUL-1
    (21.0, -552398400.0), // 1982-JUL-1
    (22.0, -520862400.0), // 1983-JUL-1
    (23.0, -457704000.0), // 1985-JUL-1
    (24.0, -378734400.0), // 1988-JAN-1
    (25.0, -315576000.0), // 1990-JAN-1
    (26.0, -284040000.0), // 1991-JAN-1
    (27.0, -236779200.0), // 1992-JUL-1
    (28.0, -205243200.0), // 1993-JUL-1
    (29.0, -173707200.0), // 1994-JUL-1
    (30.0, -126273600.0), // 1996-JAN-1
    (31.0, -79012800.0),  // 1997-JUL-1
    (32.0, -31579200.0),  // 1999-JAN-1
    (33.0, 189345600.0),  // 2006-JAN-1
    (34.0, 284040000.0),  // 2009-JAN-1
    (35.0, 394372800.0),  // 2012-JUL-1
    (36.0, 488980800.0),  // 2015-JUL-1
    (37.0, 536500800.0),  // 2017-JAN-1
];

#[derive(Debug, Error)]
pub enum TimeErrors {
    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("invalid time of day {hour:02}:{minute:02}:{second}")]
    InvalidTimeOfDay { hour: u32, minute: u32, second: f64 },
}

/// An instant in UTC, stored as seconds since the J2000 epoch
/// (2000-01-01T12:00:00 UTC). f64 seconds keep sub-microsecond precision
/// over the simulation spans this crate targets.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Epoch(f64);

impl Epoch {
    pub const J2000: Epoch = Epoch(0.0);

    pub fn from_seconds_j2000(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn from_jd(jd: f64) -> Self {
        Self((jd - JD_J2000) * SEC_PER_DAY)
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        let delta = datetime.signed_duration_since(j2000_datetime());
        let seconds =
            delta.num_seconds() as f64 + delta.subsec_nanos() as f64 * 1e-9;
        Self(seconds)
    }

    pub fn from_ymdhms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self, TimeErrors> {
        let whole = second.floor();
        let nanos = ((second - whole) * 1e9).round() as u32;
        let datetime = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(TimeErrors::InvalidDate { year, month, day })?
            .and_hms_nano_opt(hour, minute, whole as u32, nanos)
            .ok_or(TimeErrors::InvalidTimeOfDay { hour, minute, second })?;
        Ok(Self::from_datetime(datetime))
    }

    pub fn seconds_j2000(&self) -> f64 {
        self.0
    }

    /// Julian date on the UTC scale.
    pub fn julian_date(&self) -> f64 {
        self.0 / SEC_PER_DAY + JD_J2000
    }

    /// Julian centuries since J2000 on the UTC scale. UT1 - UTC is below a
    /// second and is ignored at this model class.
    pub fn julian_centuries(&self) -> f64 {
        self.0 / SEC_PER_DAY / DAYS_PER_CENTURY
    }

    /// Seconds since J2000 on the terrestrial time scale,
    /// TT = UTC + (TAI - UTC) + 32.184 s.
    pub fn tt_seconds_j2000(&self) -> f64 {
        self.0 + delta_at(self.0) + TT_MINUS_TAI
    }

    /// Julian centuries since J2000 on the terrestrial time scale, the
    /// argument of the analytic solar/lunar ephemeris series.
    pub fn tt_julian_centuries(&self) -> f64 {
        self.tt_seconds_j2000() / SEC_PER_DAY / DAYS_PER_CENTURY
    }

    pub fn datetime(&self) -> NaiveDateTime {
        j2000_datetime() + TimeDelta::microseconds((self.0 * 1e6).round() as i64)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} UTC", self.datetime().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

impl Add<f64> for Epoch {
    type Output = Self;
    fn add(self, rhs: f64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<f64> for Epoch {
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

impl Sub<f64> for Epoch {
    type Output = Self;
    fn sub(self, rhs: f64) -> Self::Output {
        Self(self.0 - rhs)
    }
}

impl Sub<Epoch> for Epoch {
    type Output = f64;
    fn sub(self, rhs: Epoch) -> Self::Output {
        self.0 - rhs.0
    }
}

fn j2000_datetime() -> NaiveDateTime {
    // constructed from literals, cannot fail
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// Cumulative leap seconds (TAI - UTC) in effect at a UTC instant.
fn delta_at(utc_seconds_j2000: f64) -> f64 {
    for &(leap, effective) in LEAP_SECONDS.iter().rev() {
        if utc_seconds_j2000 >= effective {
            return leap;
        }
    }
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn j2000_is_the_reference_julian_date() {
        assert_abs_diff_eq!(Epoch::J2000.julian_date(), 2451545.0);
        assert_abs_diff_eq!(Epoch::J2000.julian_centuries(), 0.0);
    }

    #[test]
    fn calendar_round_trip() {
        let epoch = Epoch::from_ymdhms(2024, 3, 15, 6, 30, 12.25).unwrap();
        let datetime = epoch.datetime();
        assert_eq!(
            datetime.format("%Y-%m-%d %H:%M:%S%.2f").to_string(),
            "2024-03-15 06:30:12.25"
        );
        let back = Epoch::from_datetime(datetime);
        assert_abs_diff_eq!(back.seconds_j2000(), epoch.seconds_j2000(), epsilon = 1e-6);
    }

    #[test]
    fn vallado_reference_julian_date() {
        // Vallado ex. 3-4: 1996-10-26 14:20:00 UTC -> JD 2450383.09722222
        let epoch = Epoch::from_ymdhms(1996, 10, 26, 14, 20, 0.0).unwrap();
        assert_abs_diff_eq!(epoch.julian_date(), 2450383.09722222, epsilon = 1e-7);
    }

    #[test]
    fn leap_seconds_after_2017() {
        let epoch = Epoch::from_ymdhms(2020, 1, 1, 0, 0, 0.0).unwrap();
        assert_abs_diff_eq!(
            epoch.tt_seconds_j2000() - epoch.seconds_j2000(),
            37.0 + 32.184
        );
    }

    #[test]
    fn leap_seconds_before_first_entry() {
        let epoch = Epoch::from_ymdhms(1970, 1, 1, 0, 0, 0.0).unwrap();
        assert_abs_diff_eq!(
            epoch.tt_seconds_j2000() - epoch.seconds_j2000(),
            10.0 + 32.184
        );
    }

    #[test]
    fn arithmetic() {
        let epoch = Epoch::J2000 + 120.0;
        assert_abs_diff_eq!(epoch - Epoch::J2000, 120.0);
        assert_abs_diff_eq!((epoch - 120.0).seconds_j2000(), 0.0);
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(Epoch::from_ymdhms(2024, 2, 30, 0, 0, 0.0).is_err());
        assert!(Epoch::from_ymdhms(2024, 1, 1, 25, 0, 0.0).is_err());
    }
}
