use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use chrono::{Datelike, Days, NaiveDate};
use nom::{
    IResult,
    bytes::complete::take_while_m_n,
    character::complete::one_of,
    combinator::all_consuming,
    sequence::tuple,
};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFormat {
    pub use_dashes: bool,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self { use_dashes: true }
    }
}

/// A calendar day, written `YYYY-MM-DD` or `YYYY/MM/DD`.
#[derive(Debug, Clone, Copy)]
pub struct Date {
    value: NaiveDate,
    format: DateFormat,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, DomainError> {
        if !(0..=9999).contains(&year) {
            return Err(DomainError::UnrepresentableDate);
        }
        let value =
            NaiveDate::from_ymd_opt(year, month, day).ok_or(DomainError::UnrepresentableDate)?;
        Ok(Self::from_naive(value))
    }

    pub fn from_naive(value: NaiveDate) -> Self {
        Self {
            value,
            format: DateFormat::default(),
        }
    }

    pub fn with_format(self, format: DateFormat) -> Self {
        Self { format, ..self }
    }

    pub fn naive(&self) -> NaiveDate {
        self.value
    }

    pub fn format(&self) -> DateFormat {
        self.format
    }

    pub fn year(&self) -> i32 {
        self.value.year()
    }

    pub fn month(&self) -> u32 {
        self.value.month()
    }

    pub fn day(&self) -> u32 {
        self.value.day()
    }

    /// ISO weekday, Monday is 1.
    pub fn weekday(&self) -> u32 {
        self.value.weekday().number_from_monday()
    }

    pub fn week_number(&self) -> u32 {
        self.value.iso_week().week()
    }

    pub fn quarter(&self) -> u32 {
        (self.month() - 1) / 3 + 1
    }

    pub fn plus_days(&self, days: i64) -> Option<Date> {
        let value = if days >= 0 {
            self.value.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.value.checked_sub_days(Days::new(days.unsigned_abs()))
        }?;
        Some(Self {
            value,
            format: self.format,
        })
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.format.use_dashes { '-' } else { '/' };
        write!(
            f,
            "{:04}{sep}{:02}{sep}{:02}",
            self.year(),
            self.month(),
            self.day()
        )
    }
}

fn date_parts(i: &str) -> IResult<&str, (&str, char, &str, char, &str)> {
    tuple((
        take_while_m_n(4, 4, |c: char| c.is_ascii_digit()),
        one_of("-/"),
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        one_of("-/"),
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
    ))(i)
}

impl FromStr for Date {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (year, sep1, month, sep2, day)) =
            all_consuming(date_parts)(s).map_err(|_| DomainError::MalformedDate)?;
        if sep1 != sep2 {
            return Err(DomainError::MalformedDate);
        }
        let year: i32 = year.parse().map_err(|_| DomainError::MalformedDate)?;
        let month: u32 = month.parse().map_err(|_| DomainError::MalformedDate)?;
        let day: u32 = day.parse().map_err(|_| DomainError::MalformedDate)?;
        Ok(Self::new(year, month, day)?.with_format(DateFormat {
            use_dashes: sep1 == '-',
        }))
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Date {}

impl PartialOrd for Date {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Date {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Date {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}
