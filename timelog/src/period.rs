//! Calendar periods used for filtering, e.g. `2024`, `2024-05`, `2024-Q2`
//! or `2024-W18`.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, eof, map, map_res},
    sequence::{pair, preceded},
};

use crate::core::Date;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("invalid period `{0}`, expected YYYY, YYYY-MM, YYYY-Qn or YYYY-Wnn")]
    InvalidPattern(String),
    #[error("period is outside the supported calendar range")]
    OutOfRange,
    #[error("unknown period `{0}`, expected day, week, month, quarter or year")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl FromStr for PeriodKind {
    type Err = PeriodError;

    /// Full names or their first letter, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "d" => Ok(PeriodKind::Day),
            "week" | "w" => Ok(PeriodKind::Week),
            "month" | "m" => Ok(PeriodKind::Month),
            "quarter" | "q" => Ok(PeriodKind::Quarter),
            "year" | "y" => Ok(PeriodKind::Year),
            _ => Err(PeriodError::UnknownKind(s.to_string())),
        }
    }
}

/// An inclusive span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    kind: PeriodKind,
    since: Date,
    until: Date,
}

impl Period {
    pub fn since(&self) -> Date {
        self.since
    }

    pub fn until(&self) -> Date {
        self.until
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn contains(&self, date: Date) -> bool {
        self.since <= date && date <= self.until
    }

    /// The period of the given kind that `date` falls into.
    pub fn containing(kind: PeriodKind, date: Date) -> Result<Period, PeriodError> {
        let d = date.naive();
        let (since, until) = match kind {
            PeriodKind::Day => (Some(d), Some(d)),
            PeriodKind::Week => {
                let offset = i64::from(d.weekday().num_days_from_monday());
                let since = date.plus_days(-offset).map(|d| d.naive());
                (since, since.and_then(|s| s.checked_add_days(chrono::Days::new(6))))
            }
            PeriodKind::Month => month_bounds(d.year(), d.month()),
            PeriodKind::Quarter => {
                let first = (date.quarter() - 1) * 3 + 1;
                let (since, _) = month_bounds(d.year(), first);
                let (_, until) = month_bounds(d.year(), first + 2);
                (since, until)
            }
            PeriodKind::Year => (
                NaiveDate::from_ymd_opt(d.year(), 1, 1),
                NaiveDate::from_ymd_opt(d.year(), 12, 31),
            ),
        };
        match (since, until) {
            (Some(since), Some(until)) => Ok(Period {
                kind,
                since: Date::from_naive(since),
                until: Date::from_naive(until),
            }),
            _ => Err(PeriodError::OutOfRange),
        }
    }

    /// The period of the same kind right before this one.
    pub fn previous(&self) -> Result<Period, PeriodError> {
        let day_before = self.since.plus_days(-1).ok_or(PeriodError::OutOfRange)?;
        Period::containing(self.kind, day_before)
    }

    /// The period of the same kind right after this one.
    pub fn next(&self) -> Result<Period, PeriodError> {
        let day_after = self.until.plus_days(1).ok_or(PeriodError::OutOfRange)?;
        Period::containing(self.kind, day_after)
    }
}

fn month_bounds(year: i32, month: u32) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let since = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    (since, next.and_then(|n| n.pred_opt()))
}

enum Pattern {
    Year,
    Month(u32),
    Quarter(u32),
    Week(u32),
}

fn number(min: usize, max: usize) -> impl Fn(&str) -> IResult<&str, u32> {
    move |i: &str| map_res(take_while_m_n(min, max, |c: char| c.is_ascii_digit()), str::parse)(i)
}

fn pattern(i: &str) -> IResult<&str, (u32, Pattern)> {
    all_consuming(pair(
        number(4, 4),
        alt((
            map(preceded(tag("-Q"), number(1, 1)), Pattern::Quarter),
            map(preceded(tag("-W"), number(1, 2)), Pattern::Week),
            map(preceded(char('-'), number(2, 2)), Pattern::Month),
            map(eof, |_| Pattern::Year),
        )),
    ))(i)
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodError::InvalidPattern(s.to_string());
        let (_, (year, p)) = pattern(s).map_err(|_| invalid())?;
        let year = i32::try_from(year).map_err(|_| invalid())?;
        let (kind, reference) = match p {
            Pattern::Year => (PeriodKind::Year, NaiveDate::from_ymd_opt(year, 1, 1)),
            Pattern::Month(m) => (PeriodKind::Month, NaiveDate::from_ymd_opt(year, m, 1)),
            Pattern::Quarter(q) if (1..=4).contains(&q) => (
                PeriodKind::Quarter,
                NaiveDate::from_ymd_opt(year, (q - 1) * 3 + 1, 1),
            ),
            Pattern::Quarter(_) => return Err(invalid()),
            Pattern::Week(w) => (
                PeriodKind::Week,
                NaiveDate::from_isoywd_opt(year, w, Weekday::Mon),
            ),
        };
        let reference = reference.ok_or_else(invalid)?;
        Period::containing(kind, Date::from_naive(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(text: &str) -> Date {
        text.parse().expect("valid date")
    }

    #[rstest]
    #[case("2022", "2022-01-01", "2022-12-31")]
    #[case("2024-02", "2024-02-01", "2024-02-29")]
    #[case("2022-12", "2022-12-01", "2022-12-31")]
    #[case("2022-Q2", "2022-04-01", "2022-06-30")]
    #[case("2022-Q4", "2022-10-01", "2022-12-31")]
    #[case("2022-W18", "2022-05-02", "2022-05-08")]
    #[case("2020-W53", "2020-12-28", "2021-01-03")]
    #[case("2022-W1", "2022-01-03", "2022-01-09")]
    fn parses_patterns(#[case] text: &str, #[case] since: &str, #[case] until: &str) {
        let p: Period = text.parse().expect("valid period");
        assert_eq!((p.since(), p.until()), (date(since), date(until)));
    }

    #[rstest]
    #[case("x")]
    #[case("22")]
    #[case("2022-13")]
    #[case("2022-Q5")]
    #[case("2022-Q0")]
    #[case("2022-W54")]
    #[case("2021-W53")]
    #[case("2022-05-01")]
    fn rejects_invalid_patterns(#[case] text: &str) {
        assert!(text.parse::<Period>().is_err());
    }

    #[test]
    fn steps_back_to_previous_period() {
        let week = Period::containing(PeriodKind::Week, date("2024-01-03")).expect("week");
        assert_eq!(week.since(), date("2024-01-01"));
        let last = week.previous().expect("previous");
        assert_eq!((last.since(), last.until()), (date("2023-12-25"), date("2023-12-31")));

        let quarter = Period::containing(PeriodKind::Quarter, date("2024-02-10")).expect("q");
        let last = quarter.previous().expect("previous");
        assert_eq!((last.since(), last.until()), (date("2023-10-01"), date("2023-12-31")));
        assert!(last.contains(date("2023-11-11")));
        assert!(!last.contains(date("2024-01-01")));
    }

    #[test]
    fn steps_forward_to_next_period() {
        let month = Period::containing(PeriodKind::Month, date("2024-01-31")).expect("month");
        let next = month.next().expect("next");
        assert_eq!((next.since(), next.until()), (date("2024-02-01"), date("2024-02-29")));
        assert_eq!(next.previous(), Ok(month));

        let year: Period = "2023".parse().expect("year");
        assert_eq!(year.next().map(|p| p.since()), Ok(date("2024-01-01")));
    }

    #[rstest]
    #[case("day", PeriodKind::Day)]
    #[case("W", PeriodKind::Week)]
    #[case("Month", PeriodKind::Month)]
    #[case("q", PeriodKind::Quarter)]
    #[case("YEAR", PeriodKind::Year)]
    fn parses_period_kinds(#[case] text: &str, #[case] kind: PeriodKind) {
        assert_eq!(text.parse::<PeriodKind>(), Ok(kind));
    }

    #[test]
    fn rejects_unknown_period_kinds() {
        assert_eq!(
            "fortnight".parse::<PeriodKind>(),
            Err(PeriodError::UnknownKind("fortnight".into()))
        );
    }
}
