use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use chrono::{NaiveTime, Timelike};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, opt},
    sequence::tuple,
};

use super::{DomainError, Duration};

const ONE_DAY: i64 = 24 * 60;

/// Which calendar day a time belongs to, relative to its record's date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DayShift {
    Yesterday,
    #[default]
    Today,
    Tomorrow,
}

impl DayShift {
    pub fn days(self) -> i64 {
        match self {
            DayShift::Yesterday => -1,
            DayShift::Today => 0,
            DayShift::Tomorrow => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormat {
    pub use_24_hour_clock: bool,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            use_24_hour_clock: true,
        }
    }
}

/// A wall-clock time, optionally shifted to the day before (`<23:00`) or the
/// day after (`1:30>`).
#[derive(Debug, Clone, Copy)]
pub struct Time {
    hour: u32,
    minute: u32,
    shift: DayShift,
    format: TimeFormat,
}

impl Time {
    pub fn new(hour: u32, minute: u32) -> Result<Self, DomainError> {
        Self::with_shift(hour, minute, DayShift::Today)
    }

    pub fn yesterday(hour: u32, minute: u32) -> Result<Self, DomainError> {
        Self::with_shift(hour, minute, DayShift::Yesterday)
    }

    pub fn tomorrow(hour: u32, minute: u32) -> Result<Self, DomainError> {
        Self::with_shift(hour, minute, DayShift::Tomorrow)
    }

    /// `24:00` is folded into `0:00` of the following day.
    pub fn with_shift(hour: u32, minute: u32, shift: DayShift) -> Result<Self, DomainError> {
        let (hour, shift) = match (hour, minute, shift) {
            (24, 0, DayShift::Yesterday) => (0, DayShift::Today),
            (24, 0, DayShift::Today) => (0, DayShift::Tomorrow),
            _ => (hour, shift),
        };
        if hour > 23 || minute > 59 {
            return Err(DomainError::InvalidTime);
        }
        Ok(Self {
            hour,
            minute,
            shift,
            format: TimeFormat::default(),
        })
    }

    pub fn from_naive(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            shift: DayShift::Today,
            format: TimeFormat::default(),
        }
    }

    pub fn with_format(self, format: TimeFormat) -> Self {
        Self { format, ..self }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn shift(&self) -> DayShift {
        self.shift
    }

    pub fn format(&self) -> TimeFormat {
        self.format
    }

    pub fn is_yesterday(&self) -> bool {
        self.shift == DayShift::Yesterday
    }

    pub fn is_tomorrow(&self) -> bool {
        self.shift == DayShift::Tomorrow
    }

    /// Clock time without the day shift.
    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Signed distance from midnight of the record's own day.
    pub fn midnight_offset(&self) -> Duration {
        let base = i64::from(self.hour * 60 + self.minute);
        Duration::from_minutes(base + self.shift.days() * ONE_DAY)
    }

    /// Shifts the time, carrying across midnight in either direction. Only
    /// results within yesterday, today or tomorrow are representable.
    pub fn plus(&self, d: Duration) -> Result<Time, DomainError> {
        let mins = self.midnight_offset().in_minutes() + d.in_minutes();
        if !(-ONE_DAY..2 * ONE_DAY).contains(&mins) {
            return Err(DomainError::ImpossibleTimeShift);
        }
        let (mins, shift) = if mins < 0 {
            (mins + ONE_DAY, DayShift::Yesterday)
        } else if mins >= ONE_DAY {
            (mins - ONE_DAY, DayShift::Tomorrow)
        } else {
            (mins, DayShift::Today)
        };
        Ok(Time {
            hour: (mins / 60) as u32,
            minute: (mins % 60) as u32,
            shift,
            format: self.format,
        })
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_yesterday() {
            f.write_str("<")?;
        }
        if self.format.use_24_hour_clock {
            write!(f, "{}:{:02}", self.hour, self.minute)?;
        } else {
            let suffix = if self.hour < 12 { "am" } else { "pm" };
            let hour = match self.hour % 12 {
                0 => 12,
                h => h,
            };
            write!(f, "{}:{:02}{}", hour, self.minute, suffix)?;
        }
        if self.is_tomorrow() {
            f.write_str(">")?;
        }
        Ok(())
    }
}

/* -------------------------------- Rounding -------------------------------- */

/// A divisor of one hour that times can be rounded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rounding(u32);

impl Rounding {
    pub const ALLOWED: [u32; 5] = [5, 10, 15, 30, 60];

    pub fn new(minutes: u32) -> Result<Self, DomainError> {
        if Self::ALLOWED.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(DomainError::InvalidRounding)
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl FromStr for Rounding {
    type Err = DomainError;

    /// Accepts `15`, `15m` and `1h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "1h" {
            return Self::new(60);
        }
        let minutes = s.strip_suffix('m').unwrap_or(s);
        Self::new(minutes.parse().map_err(|_| DomainError::InvalidRounding)?)
    }
}

impl Time {
    /// Rounds up or down to the nearest multiple of `r`. The latest
    /// representable time is `23:59>`, which is where rounding up stops.
    pub fn rounded(&self, r: Rounding) -> Time {
        let step = i64::from(r.minutes());
        let remainder = self.midnight_offset().in_minutes().rem_euclid(step);
        let up = if remainder >= step / 2 + step % 2 {
            step
        } else {
            0
        };
        self.plus(Duration::from_minutes(up - remainder))
            .or_else(|_| Time::tomorrow(23, 59).map(|t| t.with_format(self.format)))
            .unwrap_or(*self)
    }
}

type TimeParts<'a> = (
    Option<char>,
    &'a str,
    &'a str,
    Option<&'a str>,
    Option<char>,
);

fn time_parts(i: &str) -> IResult<&str, TimeParts<'_>> {
    let (i, (before, hour, _, minute, suffix, after)) = tuple((
        opt(char('<')),
        take_while_m_n(1, 2, |c: char| c.is_ascii_digit()),
        char(':'),
        take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
        opt(alt((tag("am"), tag("pm")))),
        opt(char('>')),
    ))(i)?;
    Ok((i, (before, hour, minute, suffix, after)))
}

impl FromStr for Time {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (before, hour, minute, suffix, after)) =
            all_consuming(time_parts)(s).map_err(|_| DomainError::MalformedTime)?;
        let shift = match (before, after) {
            (Some(_), Some(_)) => return Err(DomainError::MalformedTime),
            (Some(_), None) => DayShift::Yesterday,
            (None, Some(_)) => DayShift::Tomorrow,
            (None, None) => DayShift::Today,
        };
        let mut hour: u32 = hour.parse().map_err(|_| DomainError::MalformedTime)?;
        let minute: u32 = minute.parse().map_err(|_| DomainError::MalformedTime)?;

        let mut format = TimeFormat::default();
        if let Some(suffix) = suffix {
            format.use_24_hour_clock = false;
            if !(1..=12).contains(&hour) {
                return Err(DomainError::InvalidTime);
            }
            hour = match (suffix, hour) {
                ("am", 12) => 0,
                ("pm", h) if h < 12 => h + 12,
                (_, h) => h,
            };
        }
        Ok(Self::with_shift(hour, minute, shift)?.with_format(format))
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.midnight_offset() == other.midnight_offset()
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.midnight_offset().cmp(&other.midnight_offset())
    }
}

impl Hash for Time {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.midnight_offset().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn time(text: &str) -> Time {
        text.parse().expect("valid time")
    }

    #[rstest]
    #[case("9:00", 9, 0, DayShift::Today)]
    #[case("09:05", 9, 5, DayShift::Today)]
    #[case("<23:30", 23, 30, DayShift::Yesterday)]
    #[case("1:15>", 1, 15, DayShift::Tomorrow)]
    #[case("12:00am", 0, 0, DayShift::Today)]
    #[case("12:30pm", 12, 30, DayShift::Today)]
    #[case("3:45pm", 15, 45, DayShift::Today)]
    #[case("<11:00pm", 23, 0, DayShift::Yesterday)]
    #[case("24:00", 0, 0, DayShift::Tomorrow)]
    #[case("<24:00", 0, 0, DayShift::Today)]
    fn parses_times(
        #[case] text: &str,
        #[case] hour: u32,
        #[case] minute: u32,
        #[case] shift: DayShift,
    ) {
        let t = time(text);
        assert_eq!((t.hour(), t.minute(), t.shift()), (hour, minute, shift));
    }

    #[rstest]
    #[case("<1:00>", DomainError::MalformedTime)]
    #[case("1:0", DomainError::MalformedTime)]
    #[case("100:00", DomainError::MalformedTime)]
    #[case("9:00 am", DomainError::MalformedTime)]
    #[case("25:00", DomainError::InvalidTime)]
    #[case("9:60", DomainError::InvalidTime)]
    #[case("13:00pm", DomainError::InvalidTime)]
    #[case("0:30am", DomainError::InvalidTime)]
    #[case("24:00>", DomainError::InvalidTime)]
    fn rejects_invalid_times(#[case] text: &str, #[case] err: DomainError) {
        assert_eq!(text.parse::<Time>(), Err(err));
    }

    #[rstest]
    #[case("9:00")]
    #[case("<23:30")]
    #[case("0:15>")]
    #[case("12:00am")]
    #[case("6:05pm")]
    fn renders_in_its_own_format(#[case] text: &str) {
        assert_eq!(time(text).to_string(), text);
    }

    #[test]
    fn carries_day_shift_across_midnight() {
        let late = time("23:30").plus(Duration::new(1, 0)).expect("shift");
        assert_eq!(late.to_string(), "0:30>");
        assert!(late.is_tomorrow());

        let early = time("0:30").plus(Duration::new(-1, 0)).expect("shift");
        assert_eq!(early.to_string(), "<23:30");
        assert!(early.is_yesterday());

        let midnight = time("23:00").plus(Duration::new(1, 0)).expect("shift");
        assert_eq!(midnight.to_string(), "0:00>");
    }

    #[test]
    fn refuses_shifts_beyond_neighbouring_days() {
        assert_eq!(
            time("23:30>").plus(Duration::new(1, 0)),
            Err(DomainError::ImpossibleTimeShift)
        );
        assert_eq!(
            time("<0:30").plus(Duration::new(-1, 0)),
            Err(DomainError::ImpossibleTimeShift)
        );
    }

    #[rstest]
    #[case("8:03", "5m", "8:05")]
    #[case("8:02", "5m", "8:00")]
    #[case("15:12", "30m", "15:00")]
    #[case("15:15", "30m", "15:30")]
    #[case("8:07", "15", "8:00")]
    #[case("8:08", "15m", "8:15")]
    #[case("9:30", "1h", "10:00")]
    #[case("23:58", "10m", "0:00>")]
    #[case("<23:56", "5m", "<23:55")]
    #[case("23:58>", "5m", "23:59>")]
    #[case("1:52pm", "10m", "1:50pm")]
    fn rounds_to_nearest_multiple(#[case] text: &str, #[case] r: &str, #[case] expected: &str) {
        let r: Rounding = r.parse().expect("valid rounding");
        assert_eq!(time(text).rounded(r).to_string(), expected);
    }

    #[rstest]
    #[case("0m")]
    #[case("7m")]
    #[case("2h")]
    #[case("")]
    fn rejects_unsupported_roundings(#[case] text: &str) {
        assert_eq!(text.parse::<Rounding>(), Err(DomainError::InvalidRounding));
    }

    #[test]
    fn orders_by_midnight_offset() {
        assert!(time("<23:00") < time("0:00"));
        assert!(time("23:59") < time("0:00>"));
        assert_eq!(time("12:00pm"), time("12:00"));
        assert_eq!(time("<23:00").midnight_offset().in_minutes(), -60);
        assert_eq!(time("1:00>").midnight_offset().in_minutes(), 25 * 60);
    }
}
