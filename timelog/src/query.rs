//! Filtering, sorting and evaluating record sets.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::core::{Date, Duration, Entry, EntryValue, Record, Tag, Time};
use crate::period::{Period, PeriodError, PeriodKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Range,
    OpenRange,
    Duration,
    DurationPositive,
    DurationNegative,
}

impl EntryType {
    fn matches(self, e: &Entry) -> bool {
        match (self, e.value()) {
            (EntryType::Range, EntryValue::Range(_)) => true,
            (EntryType::OpenRange, EntryValue::OpenRange(_)) => true,
            (EntryType::Duration, EntryValue::Duration(_)) => true,
            // -0m is not negative.
            (EntryType::DurationPositive, EntryValue::Duration(d)) => !d.is_negative(),
            (EntryType::DurationNegative, EntryValue::Duration(d)) => d.is_negative(),
            _ => false,
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "range" => Ok(EntryType::Range),
            "open-range" => Ok(EntryType::OpenRange),
            "duration" => Ok(EntryType::Duration),
            "duration-positive" => Ok(EntryType::DurationPositive),
            "duration-negative" => Ok(EntryType::DurationNegative),
            other => Err(format!(
                "unknown entry type `{other}`, expected one of: range, open-range, \
                 duration, duration-positive, duration-negative"
            )),
        }
    }
}

/// All set clauses must hold for a record (or entry) to be kept.
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    pub at_date: Option<Date>,
    pub since: Option<Date>,
    pub until: Option<Date>,
    pub period: Option<Period>,
    pub tags: Vec<Tag>,
    pub entry_type: Option<EntryType>,
}

impl FilterQuery {
    fn matches_date(&self, date: Date) -> bool {
        self.at_date.is_none_or(|d| d == date)
            && self.since.is_none_or(|d| date >= d)
            && self.until.is_none_or(|d| date <= d)
            && self.period.is_none_or(|p| p.contains(date))
    }
}

fn with_entries(r: &Record, entries: Vec<Entry>) -> Option<Record> {
    let mut reduced = r.clone();
    reduced.set_entries(entries).ok()?;
    Some(reduced)
}

/// Keeps the whole record when its own summary carries all queried tags,
/// otherwise only the entries that do together with the record's tags.
fn reduce_to_tags(tags: &[Tag], r: &Record) -> Option<Record> {
    let record_tags = r.tags();
    if record_tags.contains_all(tags) {
        return Some(r.clone());
    }
    let matching: Vec<Entry> = r
        .entries()
        .iter()
        .filter(|e| record_tags.merge(&e.summary().tags()).contains_all(tags))
        .cloned()
        .collect();
    if matching.is_empty() {
        return None;
    }
    with_entries(r, matching)
}

fn reduce_to_type(kind: EntryType, r: &Record) -> Option<Record> {
    let matching: Vec<Entry> = r
        .entries()
        .iter()
        .filter(|e| kind.matches(e))
        .cloned()
        .collect();
    if matching.is_empty() {
        return None;
    }
    with_entries(r, matching)
}

pub fn filter(records: &[Record], query: &FilterQuery) -> Vec<Record> {
    let filtered: Vec<Record> = records
        .iter()
        .filter(|r| query.matches_date(r.date()))
        .filter_map(|r| {
            if query.tags.is_empty() {
                Some(r.clone())
            } else {
                reduce_to_tags(&query.tags, r)
            }
        })
        .filter_map(|r| match query.entry_type {
            Some(kind) => reduce_to_type(kind, &r),
            None => Some(r),
        })
        .collect();
    log::debug!("filter kept {} of {} records", filtered.len(), records.len());
    filtered
}

/// Stable: records of the same date keep their relative order.
pub fn sort(records: &[Record], ascending: bool) -> Vec<Record> {
    let mut sorted = records.to_vec();
    if ascending {
        sorted.sort_by_key(|r| r.date());
    } else {
        sorted.sort_by(|a, b| b.date().cmp(&a.date()));
    }
    sorted
}

/* ------------------------------ Evaluation ------------------------------ */

pub fn total(records: &[Record]) -> Duration {
    records.iter().map(Record::total).sum()
}

pub fn should_total_sum(records: &[Record]) -> Duration {
    records
        .iter()
        .filter_map(Record::should_total)
        .map(|s| s.duration())
        .sum()
}

/// Should-total subtracted from the actual total.
pub fn diff(should: Duration, actual: Duration) -> Duration {
    actual - should
}

/// The records with every open range of today (or of yesterday) closed at
/// `now`, and whether any was closed. Open ranges that cannot be closed at
/// `now` stay open and keep counting as zero.
pub fn close_open_ranges(now: NaiveDateTime, records: &[Record]) -> (Vec<Record>, bool) {
    let today = Date::from_naive(now.date());
    let yesterday = today.plus_days(-1);
    let end = Time::from_naive(now.time());
    let mut closed_any = false;
    let closed = records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            let end = if r.date() == today {
                Some(end)
            } else if Some(r.date()) == yesterday {
                end.plus(Duration::new(24, 0)).ok()
            } else {
                None
            };
            if let Some(end) = end.filter(|_| r.open_range().is_some()) {
                closed_any |= r.end_open_range(end).is_ok();
            }
            r
        })
        .collect();
    (closed, closed_any)
}

/// Total as if every open range of today (or of yesterday) ended at `now`.
pub fn hypothetical_total(now: NaiveDateTime, records: &[Record]) -> Duration {
    total(&close_open_ranges(now, records).0)
}

/* -------------------------------- Grouping -------------------------------- */

/// Records that fall into one calendar period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodGroup {
    pub period: Period,
    pub records: Vec<Record>,
}

/// Groups records by the period of `kind` they fall into, oldest first. With
/// `fill`, periods without records in between are included as empty groups.
pub fn group_by_period(
    records: &[Record],
    kind: PeriodKind,
    fill: bool,
) -> Result<Vec<PeriodGroup>, PeriodError> {
    let mut groups: Vec<PeriodGroup> = Vec::new();
    for r in sort(records, true) {
        match groups.last_mut() {
            Some(g) if g.period.contains(r.date()) => g.records.push(r),
            _ => {
                let period = Period::containing(kind, r.date())?;
                if fill {
                    if let Some(last) = groups.last() {
                        let mut gap = last.period.next()?;
                        while gap != period {
                            groups.push(PeriodGroup {
                                period: gap,
                                records: Vec::new(),
                            });
                            gap = gap.next()?;
                        }
                    }
                }
                groups.push(PeriodGroup {
                    period,
                    records: vec![r],
                });
            }
        }
    }
    Ok(groups)
}

/// Records of the current day and all others. The current day is today, or
/// yesterday when there is nothing at today's date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentSplit {
    pub current: Vec<Record>,
    pub others: Vec<Record>,
    pub is_yesterday: bool,
}

pub fn split_current(today: Date, records: &[Record]) -> CurrentSplit {
    let yesterday = today.plus_days(-1);
    let (todays, rest): (Vec<Record>, Vec<Record>) =
        records.iter().cloned().partition(|r| r.date() == today);
    if !todays.is_empty() {
        return CurrentSplit {
            current: todays,
            others: rest,
            is_yesterday: false,
        };
    }
    let (yesterdays, others): (Vec<Record>, Vec<Record>) =
        rest.into_iter().partition(|r| Some(r.date()) == yesterday);
    CurrentSplit {
        is_yesterday: !yesterdays.is_empty(),
        current: yesterdays,
        others,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStats {
    pub tag: Tag,
    pub total: Duration,
    /// Number of matching entries, not of occurrences in the text.
    pub count: usize,
}

/// Per distinct tag, the total of all entries carrying it (directly or via
/// their record). Sorted by name, then value.
pub fn aggregate_totals_by_tags(records: &[Record]) -> Vec<TagStats> {
    let mut stats: BTreeMap<(String, String), TagStats> = BTreeMap::new();
    for r in records {
        let record_tags = r.tags();
        for e in r.entries() {
            let all = record_tags.merge(&e.summary().tags());
            for tag in all.distinct() {
                let key = (tag.name().to_string(), tag.value().unwrap_or("").to_string());
                let entry = stats.entry(key).or_insert_with(|| TagStats {
                    tag: tag.clone(),
                    total: Duration::ZERO,
                    count: 0,
                });
                entry.total = entry.total + e.duration();
                entry.count += 1;
            }
        }
    }
    stats.into_values().collect()
}
