//! Domain model of the timelog file format.
//!
//! Everything in here is pure: values are validated on construction, arithmetic
//! never panics, and no type knows where in a file it came from. Source
//! provenance lives next to the records in [`crate::parser::Parsed`].

mod date;
mod duration;
mod range;
mod record;
mod summary;
mod time;

pub use date::{Date, DateFormat};
pub use duration::{Duration, DurationFormat, ShouldTotal, Sign};
pub use range::{OpenRange, OpenRangeFormat, Range, RangeFormat};
pub use record::{Entry, EntryKind, EntryValue, Record};
pub use summary::{EntrySummary, RecordSummary, Tag, TagSet};
pub(crate) use summary::HASH_TAG;
pub use time::{DayShift, Rounding, Time, TimeFormat};

/* ---------------------------- Errors (domain) ---------------------------- */

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("malformed date, expected YYYY-MM-DD or YYYY/MM/DD")]
    MalformedDate,
    #[error("date is not a valid calendar day")]
    UnrepresentableDate,
    #[error("malformed time, expected H:MM or H:MMam/pm")]
    MalformedTime,
    #[error("time is out of bounds")]
    InvalidTime,
    #[error("malformed duration, expected e.g. 2h30m, 45m or -1h")]
    MalformedDuration,
    #[error("duration cannot be represented")]
    UnrepresentableDuration,
    #[error("time cannot be shifted by more than one day")]
    ImpossibleTimeShift,
    #[error("start and end time of a range must be in chronological order")]
    IllegalRange,
    #[error("a record can only contain one open range")]
    DuplicateOpenRange,
    #[error("record has no open range")]
    NoOpenRange,
    #[error("summary lines cannot be blank or start with whitespace")]
    MalformedSummary,
    #[error("invalid tag")]
    InvalidTag,
    #[error("should-total cannot be negative")]
    NegativeShouldTotal,
    #[error("rounding must be one of 5m, 10m, 15m, 30m or 60m")]
    InvalidRounding,
}
