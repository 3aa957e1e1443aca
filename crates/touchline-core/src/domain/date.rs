use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month};

use crate::ValidationError;

/// Calendar date of a fixture, always rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchDate(Date);

impl MatchDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: input.to_owned(),
        };

        let trimmed = input.trim();
        let mut parts = trimmed.split('-');
        let (Some(year), Some(month), Some(day), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return Err(invalid());
        }

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month
            .parse::<u8>()
            .ok()
            .and_then(|value| Month::try_from(value).ok())
            .ok_or_else(invalid)?;
        let day = day.parse::<u8>().map_err(|_| invalid())?;

        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// The date `days` calendar days earlier; saturates at the earliest representable date.
    pub fn days_before(self, days: i64) -> Self {
        Self(
            self.0
                .checked_sub(time::Duration::days(days))
                .unwrap_or(Date::MIN),
        )
    }
}

impl Display for MatchDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for MatchDate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for MatchDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MatchDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Splits an upstream combined timestamp (`2024-10-01T14:00:00Z`,
/// `2024-10-01T14:00:00+00:00`) into its date and `HH:MM` kickoff.
pub fn split_timestamp(raw: &str) -> Option<(MatchDate, Option<String>)> {
    let date = MatchDate::parse(raw.get(..10)?).ok()?;
    let kickoff = raw.get(11..16).filter(|time| is_hh_mm(time)).map(str::to_owned);
    Some((date, kickoff))
}

fn is_hh_mm(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 2 || byte.is_ascii_digit())
}
