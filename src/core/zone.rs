//! The time zone that defines "local midnight" for day buckets.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Zone used to normalize instants to calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The process-local time zone
    #[default]
    Local,
    /// A named IANA zone (e.g. `Europe/Berlin`)
    Named(Tz),
}

impl Zone {
    /// Resolve an optional IANA zone name. `None` selects the local zone.
    pub fn from_name(name: Option<&str>) -> Result<Self, ZoneError> {
        match name {
            None => Ok(Zone::Local),
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map(Zone::Named)
                .map_err(|_| ZoneError::UnknownZone(name.to_string())),
        }
    }

    /// Calendar date of an instant in this zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Local => instant.with_timezone(&Local).date_naive(),
            Zone::Named(tz) => instant.with_timezone(tz).date_naive(),
        }
    }

    /// Today's date, normalized to midnight in this zone.
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// The first instant of `date` in this zone.
    ///
    /// Normally local midnight. When a DST gap swallows midnight the day
    /// starts at the first valid local time after it. `None` only for a
    /// date the zone skipped entirely.
    pub fn midnight_utc(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        match self {
            Zone::Local => first_instant(&Local, date),
            Zone::Named(tz) => first_instant(tz, date),
        }
    }
}

/// Scan the day in quarter-hour steps; every real-world gap is a multiple
/// of 15 minutes.
fn first_instant<T: TimeZone>(tz: &T, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    (0..24 * 4).find_map(|quarter| {
        let naive = midnight + Duration::minutes(15 * quarter);
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Time zone lookup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// Not an IANA zone name known to the tz database
    UnknownZone(String),
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneError::UnknownZone(name) => write!(f, "unknown time zone '{name}'"),
        }
    }
}

impl std::error::Error for ZoneError {}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_zone_shifts_date() {
        let zone = Zone::from_name(Some("America/Los_Angeles")).unwrap();
        // 05:00 UTC is still the previous evening on the US west coast
        let instant = Utc.with_ymd_and_hms(2023, 6, 15, 5, 0, 0).unwrap();
        assert_eq!(
            zone.date_of(instant),
            NaiveDate::from_ymd_opt(2023, 6, 14).unwrap()
        );
    }

    #[test]
    fn test_unknown_zone_rejected() {
        assert_eq!(
            Zone::from_name(Some("Mars/Olympus_Mons")),
            Err(ZoneError::UnknownZone("Mars/Olympus_Mons".to_string()))
        );
        assert_eq!(Zone::from_name(None).unwrap(), Zone::Local);
    }

    #[test]
    fn test_midnight_round_trip() {
        let zone = Zone::Named(chrono_tz::Asia::Tokyo);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let midnight = zone.midnight_utc(date).unwrap();
        assert_eq!(zone.date_of(midnight), date);
        assert_eq!(
            midnight,
            Utc.with_ymd_and_hms(2024, 2, 28, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_midnight_in_dst_gap_moves_to_first_valid_instant() {
        // Chile skipped 00:00-01:00 on 2023-09-03; the day begins at 01:00 -03
        let zone = Zone::Named(chrono_tz::America::Santiago);
        let date = NaiveDate::from_ymd_opt(2023, 9, 3).unwrap();
        let start = zone.midnight_utc(date).unwrap();

        assert_eq!(start, Utc.with_ymd_and_hms(2023, 9, 3, 4, 0, 0).unwrap());
        assert_eq!(zone.date_of(start), date);
    }
}
