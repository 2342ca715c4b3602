//! Local birth moment to Julian Day (UT).

use chrono::offset::LocalResult;
use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use chrono_tz::{OffsetComponents, Tz};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ParseError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Julian Day of the Unix epoch, 1970-01-01T00:00:00Z.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Gregorian calendar date and fractional UT hour to Julian Day.
pub fn julian_day(year: i32, month: u32, day: u32, hour: f64) -> f64 {
    let (y, m) = if month <= 2 {
        (year - 1, month + 12)
    } else {
        (year, month)
    };
    let y = f64::from(y);
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    (365.25 * (y + 4716.0)).floor() + (30.6001 * f64::from(m + 1)).floor() + f64::from(day) + b
        - 1524.5
        + hour / 24.0
}

/// A point on the continuous UT day count.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AstronomicalTime(f64);

impl AstronomicalTime {
    /// Wraps an already computed Julian Day (UT).
    pub fn from_julian_day(julian_day: f64) -> Self {
        AstronomicalTime(julian_day)
    }

    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        let hour = f64::from(instant.hour())
            + f64::from(instant.minute()) / 60.0
            + f64::from(instant.second()) / 3600.0;
        AstronomicalTime(julian_day(
            instant.year(),
            instant.month(),
            instant.day(),
            hour,
        ))
    }

    pub fn julian_day(self) -> f64 {
        self.0
    }

    /// Julian centuries since J2000.0.
    pub fn centuries_since_j2000(self) -> f64 {
        (self.0 - 2_451_545.0) / 36_525.0
    }

    /// Nearest UTC instant, to the millisecond. `None` outside chrono's range.
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        let millis = ((self.0 - UNIX_EPOCH_JD) * 86_400_000.0).round();
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp_millis(millis as i64)
    }
}

impl fmt::Display for AstronomicalTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "JD {:.6} UT", self.0)
    }
}

/// A birth date and wall-clock time in a named timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthMoment {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub timezone: Tz,
}

impl BirthMoment {
    pub fn new(date: NaiveDate, time: NaiveTime, timezone: Tz) -> Self {
        BirthMoment {
            date,
            time,
            timezone,
        }
    }

    /// Parses `YYYY-MM-DD`, `HH:MM` (or `HH:MM:SS`) and an IANA zone name.
    pub fn parse(date: &str, time: &str, timezone: &str) -> Result<Self, ParseError> {
        let parsed_date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| {
            ParseError::InvalidDate {
                input: date.to_string(),
            }
        })?;
        let parsed_time = TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(time.trim(), format).ok())
            .ok_or_else(|| ParseError::InvalidTime {
                input: time.to_string(),
            })?;
        let tz: Tz = timezone
            .trim()
            .parse()
            .map_err(|_| ParseError::UnknownTimezone {
                input: timezone.to_string(),
            })?;
        Ok(BirthMoment::new(parsed_date, parsed_time, tz))
    }

    pub fn local(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Resolves the wall-clock time to UTC using the zone's rules for that date.
    ///
    /// A time repeated by a DST fall-back is read as standard time; when both
    /// readings are standard time (a change of base offset) the later UTC
    /// instant wins. A time skipped by a spring-forward transition is rejected.
    pub fn to_utc(&self) -> Result<DateTime<Utc>, ParseError> {
        let local = self.local();
        let resolved = match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(first, second) => {
                let first_standard = first.offset().dst_offset() == Duration::zero();
                let second_standard = second.offset().dst_offset() == Duration::zero();
                // with no single standard-time reading, take the later instant
                let standard = if first_standard && !second_standard {
                    first
                } else {
                    second
                };
                warn!(
                    "{} is ambiguous in {}; using standard time {}",
                    local,
                    self.timezone.name(),
                    standard.offset()
                );
                standard
            }
            LocalResult::None => {
                return Err(ParseError::NonexistentLocalTime {
                    local: local.to_string(),
                    timezone: self.timezone.name().to_string(),
                })
            }
        };
        Ok(resolved.with_timezone(&Utc))
    }

    pub fn astronomical_time(&self) -> Result<AstronomicalTime, ParseError> {
        let utc = self.to_utc()?;
        let time = AstronomicalTime::from_utc(utc);
        debug!("{} {} -> {} ({})", self.local(), self.timezone.name(), utc, time);
        Ok(time)
    }
}
