use std::fmt;

use super::{
    Date, DomainError, Duration, EntrySummary, OpenRange, Range, RecordSummary, ShouldTotal,
    TagSet, Time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Range,
    OpenRange,
    Duration,
}

/// The time value an entry line starts with.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Range(Range),
    OpenRange(OpenRange),
    Duration(Duration),
}

impl EntryValue {
    /// Contribution to totals. Open ranges count as zero.
    pub fn duration(&self) -> Duration {
        match self {
            EntryValue::Range(r) => r.duration(),
            EntryValue::OpenRange(_) => Duration::ZERO,
            EntryValue::Duration(d) => *d,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            EntryValue::Range(_) => EntryKind::Range,
            EntryValue::OpenRange(_) => EntryKind::OpenRange,
            EntryValue::Duration(_) => EntryKind::Duration,
        }
    }
}

impl fmt::Display for EntryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryValue::Range(r) => r.fmt(f),
            EntryValue::OpenRange(o) => o.fmt(f),
            EntryValue::Duration(d) => d.fmt(f),
        }
    }
}

impl From<Range> for EntryValue {
    fn from(r: Range) -> Self {
        EntryValue::Range(r)
    }
}

impl From<OpenRange> for EntryValue {
    fn from(o: OpenRange) -> Self {
        EntryValue::OpenRange(o)
    }
}

impl From<Duration> for EntryValue {
    fn from(d: Duration) -> Self {
        EntryValue::Duration(d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    value: EntryValue,
    summary: EntrySummary,
}

impl Entry {
    pub fn new(value: impl Into<EntryValue>, summary: EntrySummary) -> Self {
        Self {
            value: value.into(),
            summary,
        }
    }

    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    pub fn summary(&self) -> &EntrySummary {
        &self.summary
    }

    pub fn duration(&self) -> Duration {
        self.value.duration()
    }

    pub fn kind(&self) -> EntryKind {
        self.value.kind()
    }
}

/// One day in a timelog file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    date: Date,
    should_total: Option<ShouldTotal>,
    summary: RecordSummary,
    entries: Vec<Entry>,
}

impl Record {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            should_total: None,
            summary: RecordSummary::default(),
            entries: Vec::new(),
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn should_total(&self) -> Option<ShouldTotal> {
        self.should_total
    }

    pub fn set_should_total(&mut self, should_total: Option<ShouldTotal>) {
        self.should_total = should_total;
    }

    pub fn summary(&self) -> &RecordSummary {
        &self.summary
    }

    pub fn set_summary(&mut self, summary: RecordSummary) {
        self.summary = summary;
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Replaces all entries; fails if more than one of them is open.
    pub fn set_entries(&mut self, entries: Vec<Entry>) -> Result<(), DomainError> {
        let open = entries
            .iter()
            .filter(|e| e.kind() == EntryKind::OpenRange)
            .count();
        if open > 1 {
            return Err(DomainError::DuplicateOpenRange);
        }
        self.entries = entries;
        Ok(())
    }

    pub fn open_range_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.kind() == EntryKind::OpenRange)
    }

    pub fn open_range(&self) -> Option<&OpenRange> {
        self.entries.iter().find_map(|e| match e.value() {
            EntryValue::OpenRange(o) => Some(o),
            _ => None,
        })
    }

    /// Turns the open range into a closed one in place.
    pub fn end_open_range(&mut self, end: Time) -> Result<(), DomainError> {
        let idx = self.open_range_index().ok_or(DomainError::NoOpenRange)?;
        let entry = &mut self.entries[idx];
        if let EntryValue::OpenRange(open) = entry.value {
            entry.value = EntryValue::Range(open.close(end)?);
        }
        Ok(())
    }

    /// Tags of the record summary alone.
    pub fn tags(&self) -> TagSet {
        self.summary.tags()
    }

    /// Sum of all entries; open ranges count as zero.
    pub fn total(&self) -> Duration {
        self.entries.iter().map(Entry::duration).sum()
    }
}
