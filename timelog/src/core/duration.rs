use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    iter::Sum,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use nom::{
    IResult,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map_res, opt},
    sequence::{terminated, tuple},
};

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

/// How a duration was written, so it can be rendered back identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationFormat {
    /// Render a `+` in front of positive values.
    pub force_plus: bool,
    /// Explicit sign of a zero value (`+0m`, `-0m`).
    pub zero_sign: Option<Sign>,
}

/// A signed amount of minutes.
#[derive(Debug, Clone, Copy)]
pub struct Duration {
    minutes: i64,
    format: DurationFormat,
}

impl Duration {
    pub const ZERO: Duration = Duration {
        minutes: 0,
        format: DurationFormat {
            force_plus: false,
            zero_sign: None,
        },
    };

    pub fn new(hours: i64, minutes: i64) -> Self {
        Self::from_minutes(hours * 60 + minutes)
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            minutes,
            format: DurationFormat::default(),
        }
    }

    pub fn with_format(self, format: DurationFormat) -> Self {
        Self { format, ..self }
    }

    pub fn in_minutes(&self) -> i64 {
        self.minutes
    }

    pub fn format(&self) -> DurationFormat {
        self.format
    }

    pub fn is_negative(&self) -> bool {
        self.minutes < 0
    }

    /// Like `to_string`, but positive values always carry a `+`.
    pub fn to_string_with_sign(&self) -> String {
        let text = self.to_string();
        if self.minutes > 0 && !text.starts_with('+') {
            format!("+{text}")
        } else {
            text
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            let sign = match self.format.zero_sign {
                Some(Sign::Plus) => "+",
                Some(Sign::Minus) => "-",
                None => "",
            };
            return write!(f, "{sign}0m");
        }
        let hours = (self.minutes / 60).abs();
        let minutes = (self.minutes % 60).abs();
        if self.minutes < 0 {
            f.write_str("-")?;
        } else if self.format.force_plus {
            f.write_str("+")?;
        }
        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        Ok(())
    }
}

fn number(i: &str) -> IResult<&str, i64> {
    map_res(digit1, |s: &str| s.parse::<i64>())(i)
}

fn duration_parts(i: &str) -> IResult<&str, (Option<char>, Option<i64>, Option<i64>)> {
    tuple((
        opt(one_of("+-")),
        opt(terminated(number, char('h'))),
        opt(terminated(number, char('m'))),
    ))(i)
}

impl FromStr for Duration {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (sign, hours, minutes)) =
            all_consuming(duration_parts)(s).map_err(|_| DomainError::MalformedDuration)?;
        if hours.is_none() && minutes.is_none() {
            return Err(DomainError::MalformedDuration);
        }
        let (hours, minutes) = (hours.unwrap_or(0), minutes.unwrap_or(0));
        if hours != 0 && minutes >= 60 {
            return Err(DomainError::UnrepresentableDuration);
        }
        let total = hours
            .checked_mul(60)
            .and_then(|h| h.checked_add(minutes))
            .ok_or(DomainError::UnrepresentableDuration)?;

        let mut format = DurationFormat::default();
        if sign == Some('+') {
            format.force_plus = true;
        }
        if total == 0 {
            format.zero_sign = match sign {
                Some('+') => Some(Sign::Plus),
                Some('-') => Some(Sign::Minus),
                _ => None,
            };
        }
        let minutes = if sign == Some('-') { -total } else { total };
        Ok(Self { minutes, format })
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.minutes == other.minutes
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.minutes.cmp(&other.minutes)
    }
}

impl Hash for Duration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.minutes.hash(state);
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Duration::from_minutes(self.minutes + rhs.minutes)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration::from_minutes(self.minutes - rhs.minutes)
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Self::Output {
        Duration::from_minutes(-self.minutes)
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Self {
        iter.fold(Duration::ZERO, |acc, d| acc + d)
    }
}

/* ------------------------------ Should-total ------------------------------ */

/// Target time for a record, e.g. `(8h!)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShouldTotal(Duration);

impl ShouldTotal {
    pub fn new(duration: Duration) -> Result<Self, DomainError> {
        if duration.is_negative() {
            return Err(DomainError::NegativeShouldTotal);
        }
        Ok(Self(duration))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Actual minus should; negative when the target was not reached.
    pub fn diff(&self, actual: Duration) -> Duration {
        actual - self.0
    }
}

impl fmt::Display for ShouldTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!", self.0)
    }
}

impl FromStr for ShouldTotal {
    type Err = DomainError;

    /// Accepts both `8h` and `8h!`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.strip_suffix('!').unwrap_or(s);
        Self::new(value.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1h", 60)]
    #[case("1h30m", 90)]
    #[case("45m", 45)]
    #[case("-2h15m", -135)]
    #[case("+3h", 180)]
    #[case("0m", 0)]
    #[case("-0m", 0)]
    fn parses_valid_durations(#[case] text: &str, #[case] minutes: i64) {
        let d: Duration = text.parse().expect("valid duration");
        assert_eq!(d.in_minutes(), minutes);
        assert_eq!(d.to_string(), text);
    }

    #[rstest]
    #[case("")]
    #[case("+")]
    #[case("h")]
    #[case("1h30")]
    #[case("30m1h")]
    #[case("1.5h")]
    #[case("1 h")]
    fn rejects_malformed_durations(#[case] text: &str) {
        assert_eq!(
            text.parse::<Duration>(),
            Err(DomainError::MalformedDuration)
        );
    }

    #[test]
    fn normalises_plain_minutes() {
        let d: Duration = "120m".parse().expect("valid duration");
        assert_eq!(d.in_minutes(), 120);
        assert_eq!(d.to_string(), "2h");
    }

    #[test]
    fn rejects_minutes_overflowing_an_hour_component() {
        assert_eq!(
            "1h60m".parse::<Duration>(),
            Err(DomainError::UnrepresentableDuration)
        );
    }

    #[test]
    fn renders_sign_aware() {
        assert_eq!(Duration::new(1, 30).to_string(), "1h30m");
        assert_eq!(Duration::new(1, 30).to_string_with_sign(), "+1h30m");
        assert_eq!(Duration::new(-1, -30).to_string_with_sign(), "-1h30m");
        assert_eq!(Duration::ZERO.to_string_with_sign(), "0m");
        let forced: Duration = "+2h".parse().expect("duration");
        assert_eq!(forced.to_string_with_sign(), "+2h");
    }

    #[test]
    fn arithmetic_drops_formatting() {
        let a: Duration = "+1h".parse().expect("duration");
        let b: Duration = "30m".parse().expect("duration");
        assert_eq!((a + b).to_string(), "1h30m");
        assert_eq!((b - a).to_string(), "-30m");
        assert_eq!(
            vec![a, b, -b].into_iter().sum::<Duration>(),
            Duration::new(1, 0)
        );
    }

    #[test]
    fn should_total_diff_may_be_negative() {
        let should: ShouldTotal = "8h!".parse().expect("should total");
        assert_eq!(should.to_string(), "8h!");
        assert_eq!(should.diff(Duration::new(6, 0)), Duration::new(-2, 0));
        assert_eq!(
            "-1h".parse::<ShouldTotal>(),
            Err(DomainError::NegativeShouldTotal)
        );
    }
}
