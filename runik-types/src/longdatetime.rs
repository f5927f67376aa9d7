//! OpenType timestamps.

use crate::Scalar;

/// Seconds between 1904-01-01T00:00:00 and the Unix epoch.
const MACINTOSH_EPOCH_OFFSET: i64 = 2_082_844_800;

/// A simple datetime type, in the proleptic Gregorian calendar (UTC).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// A date and time, represented as seconds since 1904-01-01T00:00:00.
///
/// This is the format used in the `head` table's `created` and `modified`
/// fields.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LongDateTime(i64);

impl LongDateTime {
    pub const fn new(secs: i64) -> Self {
        Self(secs)
    }

    /// The number of seconds since the Macintosh epoch (1904-01-01).
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Converts to a calendar timestamp.
    pub fn to_date_time(self) -> DateTime {
        let unix = self.0 - MACINTOSH_EPOCH_OFFSET;
        let days = unix.div_euclid(86_400);
        let secs_of_day = unix.rem_euclid(86_400);
        let (year, month, day) = civil_from_days(days);
        DateTime {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: (secs_of_day % 3600 / 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// Converts from a calendar timestamp.
    pub fn from_date_time(dt: DateTime) -> Self {
        let days = days_from_civil(dt.year, dt.month, dt.day);
        let unix =
            days * 86_400 + dt.hour as i64 * 3600 + dt.minute as i64 * 60 + dt.second as i64;
        Self(unix + MACINTOSH_EPOCH_OFFSET)
    }
}

impl std::fmt::Debug for LongDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let dt = self.to_date_time();
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
        )
    }
}

impl Scalar for LongDateTime {
    const RAW_BYTE_LEN: usize = 8;

    fn read(bytes: &[u8]) -> Option<Self> {
        i64::read(bytes).map(Self)
    }

    fn write(self, out: &mut Vec<u8>) {
        self.0.write(out)
    }
}

/// Days since the Unix epoch for a civil date.
///
/// Howard Hinnant's `days_from_civil`; valid over the whole i32 year range.
fn days_from_civil(year: i32, month: u8, day: u8) -> i64 {
    let year = year as i64 - (month <= 2) as i64;
    let era = if year >= 0 { year } else { year - 399 } / 400;
    let yoe = year - era * 400;
    let mp = (month as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Civil date for a count of days since the Unix epoch.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    ((year + (month <= 2) as i64) as i32, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch() {
        assert_eq!(
            LongDateTime::new(0).to_date_time(),
            DateTime {
                year: 1904,
                month: 1,
                day: 1,
                hour: 0,
                minute: 0,
                second: 0
            }
        );
    }

    #[test]
    fn unix_epoch() {
        let dt = LongDateTime::new(MACINTOSH_EPOCH_OFFSET).to_date_time();
        assert_eq!((dt.year, dt.month, dt.day), (1970, 1, 1));
    }

    #[test]
    fn calendar_round_trip() {
        let dt = DateTime {
            year: 2024,
            month: 2,
            day: 29,
            hour: 13,
            minute: 37,
            second: 59,
        };
        let stamp = LongDateTime::from_date_time(dt);
        assert_eq!(stamp.to_date_time(), dt);
    }

    #[test]
    fn known_timestamp() {
        // 2011-12-13T11:33:10, a value seen in the wild.
        let stamp = LongDateTime::new(3_406_620_790);
        let dt = stamp.to_date_time();
        assert_eq!((dt.year, dt.month, dt.day), (2011, 12, 13));
        assert_eq!((dt.hour, dt.minute, dt.second), (11, 33, 10));
        assert_eq!(LongDateTime::from_date_time(dt), stamp);
    }
}
