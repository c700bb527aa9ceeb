use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use core::fmt::{Display, Formatter};

/// Six byte on-disk time: years since 1900, month, day, hour, minute, second.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Timestamp([u8; 6]);

impl Timestamp {
    pub fn from_raw(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 6];
        raw.copy_from_slice(&bytes[..6]);

        return Self(raw);
    }

    pub fn raw(&self) -> [u8; 6] {
        return self.0;
    }

    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        let year = time.year() - 1900;
        let year = if year < 0 {
            0
        } else if year > 255 {
            255
        } else {
            year as u8
        };

        return Self([
            year,
            time.month() as u8,
            time.day() as u8,
            time.hour() as u8,
            time.minute() as u8,
            time.second() as u8,
        ]);
    }

    /// None when the stored fields do not form a valid date.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let [year, month, day, hour, minute, second] = self.0;

        let naive = NaiveDate::from_ymd_opt(1900 + year as i32, month as u32, day as u32)?
            .and_hms_opt(hour as u32, minute as u32, second as u32)?;

        return Some(Utc.from_utc_datetime(&naive));
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let [year, month, day, hour, minute, second] = self.0;

        return write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            1900 + year as u32,
            month,
            day,
            hour,
            minute,
            second
        );
    }
}
