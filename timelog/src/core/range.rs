use std::fmt;

use super::{DomainError, Duration, Time};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFormat {
    pub spaces_around_dash: bool,
}

impl Default for RangeFormat {
    fn default() -> Self {
        Self {
            spaces_around_dash: true,
        }
    }
}

/// A closed time range, `9:00 - 12:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: Time,
    end: Time,
    format: RangeFormat,
}

impl Range {
    pub fn new(start: Time, end: Time) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::IllegalRange);
        }
        Ok(Self {
            start,
            end,
            format: RangeFormat::default(),
        })
    }

    pub fn with_format(self, format: RangeFormat) -> Self {
        Self { format, ..self }
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn end(&self) -> Time {
        self.end
    }

    pub fn format(&self) -> RangeFormat {
        self.format
    }

    pub fn duration(&self) -> Duration {
        self.end.midnight_offset() - self.start.midnight_offset()
    }

    pub fn is_point_in_time(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sp = if self.format.spaces_around_dash { " " } else { "" };
        write!(f, "{}{sp}-{sp}{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenRangeFormat {
    pub spaces_around_dash: bool,
    /// `?` characters beyond the first one.
    pub additional_placeholder_chars: usize,
}

impl OpenRangeFormat {
    pub fn spaced() -> Self {
        Self {
            spaces_around_dash: true,
            additional_placeholder_chars: 0,
        }
    }
}

/// A range that has been started but not ended yet, `9:00 - ?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRange {
    start: Time,
    format: OpenRangeFormat,
}

impl OpenRange {
    pub fn new(start: Time) -> Self {
        Self {
            start,
            format: OpenRangeFormat::spaced(),
        }
    }

    pub fn with_format(self, format: OpenRangeFormat) -> Self {
        Self { format, ..self }
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn format(&self) -> OpenRangeFormat {
        self.format
    }

    /// Closes the range, keeping its dash spacing.
    pub fn close(&self, end: Time) -> Result<Range, DomainError> {
        Ok(Range::new(self.start, end)?.with_format(RangeFormat {
            spaces_around_dash: self.format.spaces_around_dash,
        }))
    }
}

impl fmt::Display for OpenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sp = if self.format.spaces_around_dash { " " } else { "" };
        let placeholder = "?".repeat(1 + self.format.additional_placeholder_chars);
        write!(f, "{}{sp}-{sp}{placeholder}", self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(text: &str) -> Time {
        text.parse().expect("valid time")
    }

    #[test]
    fn duration_resolves_day_shifts() {
        let r = Range::new(time("<22:00"), time("1:30>")).expect("range");
        assert_eq!(r.duration(), Duration::new(27, 30));
        assert_eq!(r.to_string(), "<22:00 - 1:30>");
    }

    #[test]
    fn rejects_reversed_ranges_but_allows_points() {
        assert_eq!(
            Range::new(time("10:00"), time("9:00")),
            Err(DomainError::IllegalRange)
        );
        let point = Range::new(time("9:00"), time("9:00")).expect("range");
        assert!(point.is_point_in_time());
        assert_eq!(point.duration(), Duration::ZERO);
    }

    #[test]
    fn open_range_renders_placeholders_and_closes_with_spacing() {
        let open = OpenRange::new(time("8:00")).with_format(OpenRangeFormat {
            spaces_around_dash: false,
            additional_placeholder_chars: 2,
        });
        assert_eq!(open.to_string(), "8:00-???");
        let closed = open.close(time("9:15")).expect("close");
        assert_eq!(closed.to_string(), "8:00-9:15");
        assert_eq!(open.close(time("7:00")), Err(DomainError::IllegalRange));
    }
}
