//! Advisory checks that help spot accidental mistakes. Warnings never stop
//! evaluation.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};

use crate::core::{Date, EntryValue, Range, Record, Time};
use crate::query;

const GRACE_MINUTES: i64 = 31;
const DAY_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Checker {
    UnclosedOpenRange,
    FutureEntries,
    OverlappingRanges,
    MoreThan24h,
}

impl Checker {
    pub const ALL: [Checker; 4] = [
        Checker::UnclosedOpenRange,
        Checker::FutureEntries,
        Checker::OverlappingRanges,
        Checker::MoreThan24h,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Checker::UnclosedOpenRange => "UNCLOSED_OPEN_RANGE",
            Checker::FutureEntries => "FUTURE_ENTRIES",
            Checker::OverlappingRanges => "OVERLAPPING_RANGES",
            Checker::MoreThan24h => "MORE_THAN_24H",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Checker::UnclosedOpenRange => "Unclosed open range",
            Checker::FutureEntries => "Entry in the future",
            Checker::OverlappingRanges => "Overlapping time ranges",
            Checker::MoreThan24h => "Total time exceeds 24 hours",
        }
    }
}

impl fmt::Display for Checker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Checker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Checker::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Checker::ALL.iter().map(|c| c.name()).collect();
                format!("unknown warning `{s}`, expected one of: {}", names.join(", "))
            })
    }
}

pub type DisabledCheckers = HashSet<Checker>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Warning {
    pub date: Date,
    pub checker: Checker,
}

impl Warning {
    pub fn message(&self) -> &'static str {
        self.checker.message()
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.date, self.message())
    }
}

/// A record-relative time as an absolute point in time.
fn normalise(date: Date, time: Time) -> NaiveDateTime {
    date.naive().and_time(chrono::NaiveTime::MIN)
        + TimeDelta::minutes(time.midnight_offset().in_minutes())
}

struct State {
    now: NaiveDateTime,
    today: Date,
    seen_today: bool,
}

impl State {
    fn is_day(&self, date: Date, offset: i64) -> bool {
        self.today.plus_days(offset) == Some(date)
    }

    fn unclosed_open_range(&mut self, r: &Record) -> bool {
        if r.date() > self.today {
            return false;
        }
        if r.date() == self.today {
            self.seen_today = true;
            return false;
        }
        if !self.seen_today && self.is_day(r.date(), -1) {
            return false;
        }
        r.open_range().is_some()
    }

    fn future_entries(&self, r: &Record) -> bool {
        if r.entries().is_empty() {
            return false;
        }
        if r.date() < self.today && !self.is_day(r.date(), -1) {
            return false;
        }
        let near = self.is_day(r.date(), -1) || r.date() == self.today || self.is_day(r.date(), 1);
        if !near {
            return true;
        }
        let fuzzy_now = self.now + TimeDelta::minutes(GRACE_MINUTES);
        let is_future = |t: Time| normalise(r.date(), t) >= fuzzy_now;
        r.entries().iter().any(|e| match e.value() {
            EntryValue::Range(range) => is_future(range.start()) || is_future(range.end()),
            EntryValue::OpenRange(open) => is_future(open.start()),
            EntryValue::Duration(_) => r.date() > self.today,
        })
    }
}

fn overlapping_ranges(r: &Record) -> bool {
    let mut ranges: Vec<Range> = r
        .entries()
        .iter()
        .filter_map(|e| match e.value() {
            EntryValue::Range(range) => Some(*range),
            EntryValue::OpenRange(open) => Time::new(23, 59)
                .ok()
                .and_then(|end| open.close(end).ok()),
            EntryValue::Duration(_) => None,
        })
        .collect();
    ranges.sort_by_key(|range| range.start());
    let mut latest_end: Option<Time> = None;
    for range in ranges.iter().filter(|range| !range.is_point_in_time()) {
        if latest_end.is_some_and(|end| range.start() < end) {
            return true;
        }
        latest_end = latest_end.max(Some(range.end()));
    }
    false
}

fn more_than_24h(r: &Record) -> bool {
    r.total().in_minutes() > DAY_MINUTES
}

/// Runs every enabled checker over the records, newest first.
pub fn check(now: NaiveDateTime, records: &[Record], disabled: &DisabledCheckers) -> Vec<Warning> {
    let mut state = State {
        now,
        today: Date::from_naive(now.date()),
        seen_today: false,
    };
    let mut warnings = Vec::new();
    for r in query::sort(records, false) {
        for checker in Checker::ALL {
            let hit = match checker {
                // Stateful, so it has to see every record.
                Checker::UnclosedOpenRange => state.unclosed_open_range(&r),
                Checker::FutureEntries => state.future_entries(&r),
                Checker::OverlappingRanges => overlapping_ranges(&r),
                Checker::MoreThan24h => more_than_24h(&r),
            };
            if hit && !disabled.contains(&checker) {
                warnings.push(Warning {
                    date: r.date(),
                    checker,
                });
            }
        }
    }
    log::debug!("{} warning(s) for {} record(s)", warnings.len(), records.len());
    warnings
}
