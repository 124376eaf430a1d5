//! Targeted edits of timelog text.
//!
//! Instead of re-serialising a modified record, the reconciler locates the
//! record's lines in the original text and changes only those. Everything
//! outside the edited lines stays byte-identical. New content is formatted
//! in the style that prevails in the file.

use std::fmt;
use std::hash::Hash;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{
    Date, DateFormat, Duration, DurationFormat, Entry, EntrySummary, EntryValue, OpenRange,
    OpenRangeFormat, Record, RecordSummary, ShouldTotal, Sign, Time, TimeFormat,
};
use crate::parser::{self, ParseErrors, Parsed};
use crate::scanner::{Block, Line};

static OPEN_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\?+(.*)$").expect("placeholder pattern is valid"));

/* --------------------------------- Style --------------------------------- */

/// A value plus whether it should adopt the file's prevailing format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Styled<T> {
    pub value: T,
    pub auto: bool,
}

impl<T> Styled<T> {
    pub fn auto(value: T) -> Self {
        Self { value, auto: true }
    }

    pub fn explicit(value: T) -> Self {
        Self { value, auto: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Prop<T> {
    value: T,
    explicit: bool,
}

impl<T> Prop<T> {
    fn implicit(value: T) -> Self {
        Self {
            value,
            explicit: false,
        }
    }

    fn set(&mut self, value: T) {
        self.value = value;
        self.explicit = true;
    }
}

/// Formatting preferences of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    line_ending: Prop<String>,
    indentation: Prop<String>,
    date_use_dashes: Prop<bool>,
    use_24_hour_clock: Prop<bool>,
    spaces_around_dash: Prop<bool>,
    placeholder_chars: Prop<usize>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            line_ending: Prop::implicit("\n".to_string()),
            indentation: Prop::implicit("    ".to_string()),
            date_use_dashes: Prop::implicit(DateFormat::default().use_dashes),
            use_24_hour_clock: Prop::implicit(TimeFormat::default().use_24_hour_clock),
            spaces_around_dash: Prop::implicit(true),
            placeholder_chars: Prop::implicit(0),
        }
    }
}

impl Style {
    /// What a single record reveals about its formatting.
    pub fn of_record(r: &Record, b: &Block) -> Style {
        let mut s = Style::default();
        s.date_use_dashes.set(r.date().format().use_dashes);
        for e in r.entries() {
            match e.value() {
                EntryValue::Range(range) => {
                    s.use_24_hour_clock
                        .set(range.start().format().use_24_hour_clock);
                    s.spaces_around_dash.set(range.format().spaces_around_dash);
                }
                EntryValue::OpenRange(open) => {
                    s.use_24_hour_clock
                        .set(open.start().format().use_24_hour_clock);
                    s.spaces_around_dash.set(open.format().spaces_around_dash);
                    s.placeholder_chars
                        .set(open.format().additional_placeholder_chars);
                }
                EntryValue::Duration(_) => {}
            }
        }
        let indentation = b.significant_lines().iter().find_map(|l| {
            let width = l.text.len() - l.text.trim_start_matches([' ', '\t']).len();
            (width > 0).then(|| l.text[..width].to_string())
        });
        if let Some(indentation) = indentation {
            s.indentation.set(indentation);
        }
        if let Some(first) = b.lines().first().filter(|l| !l.ending.is_empty()) {
            s.line_ending.set(first.ending.clone());
        }
        s
    }

    /// Fills every property `base` leaves open with the value most records
    /// agree on.
    pub fn elect(base: Style, parsed: &Parsed) -> Style {
        let styles: Vec<Style> = parsed.iter().map(|(r, b)| Style::of_record(r, b)).collect();
        Style {
            line_ending: ascertain(base.line_ending, styles.iter().map(|s| &s.line_ending)),
            indentation: ascertain(base.indentation, styles.iter().map(|s| &s.indentation)),
            date_use_dashes: ascertain(
                base.date_use_dashes,
                styles.iter().map(|s| &s.date_use_dashes),
            ),
            use_24_hour_clock: ascertain(
                base.use_24_hour_clock,
                styles.iter().map(|s| &s.use_24_hour_clock),
            ),
            spaces_around_dash: ascertain(
                base.spaces_around_dash,
                styles.iter().map(|s| &s.spaces_around_dash),
            ),
            placeholder_chars: ascertain(
                base.placeholder_chars,
                styles.iter().map(|s| &s.placeholder_chars),
            ),
        }
    }

    pub fn line_ending(&self) -> &str {
        &self.line_ending.value
    }

    pub fn indentation(&self) -> &str {
        &self.indentation.value
    }

    pub fn date_format(&self) -> DateFormat {
        DateFormat {
            use_dashes: self.date_use_dashes.value,
        }
    }

    pub fn time_format(&self) -> TimeFormat {
        TimeFormat {
            use_24_hour_clock: self.use_24_hour_clock.value,
        }
    }

    pub fn open_range_format(&self) -> OpenRangeFormat {
        OpenRangeFormat {
            spaces_around_dash: self.spaces_around_dash.value,
            additional_placeholder_chars: self.placeholder_chars.value,
        }
    }
}

/// Majority vote over explicit values; ties go to the value seen first.
fn ascertain<'a, T>(base: Prop<T>, votes: impl Iterator<Item = &'a Prop<T>>) -> Prop<T>
where
    T: Clone + Eq + Hash + 'a,
{
    if base.explicit {
        return base;
    }
    let mut tally: IndexMap<&T, usize> = IndexMap::new();
    for vote in votes.filter(|p| p.explicit) {
        *tally.entry(&vote.value).or_default() += 1;
    }
    let mut winner: Option<(&T, usize)> = None;
    for (value, count) in tally {
        if winner.is_none_or(|(_, best)| count > best) {
            winner = Some((value, count));
        }
    }
    Prop {
        value: winner.map_or(base.value, |(v, _)| v.clone()),
        explicit: true,
    }
}

/* ------------------------------ Strategies ------------------------------ */

#[derive(Debug, Clone, PartialEq)]
pub struct RecordParams {
    pub date: Styled<Date>,
    pub should_total: Option<ShouldTotal>,
    pub summary: RecordSummary,
}

impl RecordParams {
    pub fn new(date: Styled<Date>) -> Self {
        Self {
            date,
            should_total: None,
            summary: RecordSummary::default(),
        }
    }
}

/// Where an edit may be applied. Strategies are tried in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// The first record at that date.
    ExistingRecord(Date),
    /// A new record, unless one exists at that date already.
    NewRecord(RecordParams),
    /// A new record in any case.
    NewRecordRegardless(RecordParams),
}

/// Why a strategy could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    NoRecord(Date),
    RecordExists(Date),
    NoOpenRange(Date),
    OpenRangeExists(Date),
    EndBeforeStart(Date),
    OutOfReach(Date),
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligible::NoRecord(d) => write!(f, "{d}: there is no record at this date"),
            Ineligible::RecordExists(d) => write!(f, "{d}: there is already a record at this date"),
            Ineligible::NoOpenRange(d) => write!(f, "{d}: no open time range"),
            Ineligible::OpenRangeExists(d) => {
                write!(f, "{d}: there is already an open time range")
            }
            Ineligible::EndBeforeStart(d) => {
                write!(f, "{d}: start and end time must be in chronological order")
            }
            Ineligible::OutOfReach(d) => {
                write!(f, "{d}: the end time cannot be expressed relative to this record")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("No eligible record{}", reasons(.0))]
    NoEligibleRecord(Vec<Ineligible>),
    #[error("This operation wouldn't result in a valid record")]
    InvalidResult(#[source] ParseErrors),
}

fn reasons(list: &[Ineligible]) -> String {
    list.iter().map(|r| format!("\n  {r}")).collect()
}

/* --------------------------------- Edits --------------------------------- */

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Adds an entry below the last one, taken over as written.
    AppendEntry {
        value: EntryValue,
        summary: EntrySummary,
    },
    StartOpenRange {
        start: Styled<Time>,
        summary: EntrySummary,
    },
    /// `at` is a time on the calendar day `on`; on the record of the day
    /// before it becomes a `>` time.
    CloseOpenRange {
        at: Styled<Time>,
        on: Date,
        summary: EntrySummary,
    },
    /// Grows the pause below the open range by `duration`, or adds one.
    Pause {
        duration: Duration,
        summary: EntrySummary,
    },
    CreateRecord,
}

impl Edit {
    pub fn append(entry: Entry) -> Edit {
        Edit::AppendEntry {
            value: entry.value().clone(),
            summary: entry.summary().clone(),
        }
    }

    fn check(&self, r: &Record) -> Result<(), Ineligible> {
        let date = r.date();
        match self {
            Edit::AppendEntry {
                value: EntryValue::OpenRange(_),
                ..
            }
            | Edit::StartOpenRange { .. }
                if r.open_range().is_some() =>
            {
                Err(Ineligible::OpenRangeExists(date))
            }
            Edit::CloseOpenRange { at, on, .. } => {
                let open = r.open_range().ok_or(Ineligible::NoOpenRange(date))?;
                let end = relative_end(date, at.value, *on).ok_or(Ineligible::OutOfReach(date))?;
                open.close(end)
                    .map(|_| ())
                    .map_err(|_| Ineligible::EndBeforeStart(date))
            }
            Edit::Pause { .. } if r.open_range().is_none() => Err(Ineligible::NoOpenRange(date)),
            _ => Ok(()),
        }
    }
}

/// `time` on day `on`, expressed relative to a record at `date`.
fn relative_end(date: Date, time: Time, on: Date) -> Option<Time> {
    if date == on {
        Some(time)
    } else if date.plus_days(1) == Some(on) {
        time.plus(Duration::new(24, 0)).ok()
    } else {
        None
    }
}

/* ------------------------------ Reconciler ------------------------------ */

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// The edited record, as parsed back from the new text.
    pub record: Record,
    pub records: Vec<Record>,
    pub text: String,
}

struct Insert {
    text: String,
    level: usize,
}

impl Insert {
    fn new(text: impl Into<String>, level: usize) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    fn blank() -> Self {
        Self::new("", 0)
    }
}

struct Reconciler {
    record: Record,
    index: usize,
    lines: Vec<Line>,
    /// Index of the line right after the record's last significant line.
    last_line: usize,
    style: Style,
}

fn flatten(parsed: &Parsed) -> Vec<Line> {
    parsed
        .blank_lines
        .iter()
        .chain(parsed.blocks.iter().flat_map(|b| b.lines()))
        .cloned()
        .collect()
}

fn count_lines(entries: &[Entry]) -> usize {
    entries.iter().map(|e| e.summary().line_count()).sum()
}

/// The value line plus any continuation lines of an entry.
fn entry_texts(value: &str, summary: &EntrySummary) -> Vec<Insert> {
    let lines = summary.lines();
    let mut first = value.to_string();
    if let Some(head) = lines.first().filter(|l| !l.is_empty()) {
        if !first.is_empty() {
            first.push(' ');
        }
        first.push_str(head);
    }
    let mut out = vec![Insert::new(first, 1)];
    out.extend(lines.iter().skip(1).map(|l| Insert::new(l.as_str(), 2)));
    out
}

impl Reconciler {
    fn at_record(parsed: &Parsed, index: usize) -> Self {
        let base = Style::of_record(&parsed.records[index], &parsed.blocks[index]);
        Self {
            record: parsed.records[index].clone(),
            index,
            lines: flatten(parsed),
            last_line: parsed.blocks[index].last_significant_number(),
            style: Style::elect(base, parsed),
        }
    }

    fn for_new_record(parsed: &Parsed, params: &RecordParams) -> Self {
        let style = Style::elect(Style::default(), parsed);
        let date = if params.date.auto {
            params.date.value.with_format(style.date_format())
        } else {
            params.date.value
        };
        let mut record = Record::new(date);
        record.set_should_total(params.should_total);
        record.set_summary(params.summary.clone());

        let mut headline = date.to_string();
        if let Some(should) = params.should_total {
            headline.push_str(&format!(" ({should})"));
        }
        let mut text = vec![Insert::new(headline, 0)];
        text.extend(params.summary.lines().iter().map(|l| Insert::new(l.as_str(), 0)));
        let own_lines = text.len();

        let mut r = Self {
            record,
            index: 0,
            lines: flatten(parsed),
            last_line: 0,
            style,
        };
        let records = &parsed.records;
        if records.is_empty() {
            let at = r.lines.len();
            r.insert(at, text);
            r.last_line = at + own_lines;
            return r;
        }
        if date < records[0].date() {
            text.push(Insert::blank());
            r.insert(0, text);
            r.last_line = own_lines;
            return r;
        }
        let mut i = 0;
        while i + 1 < records.len() && !(date >= records[i].date() && date < records[i + 1].date())
        {
            i += 1;
        }
        let at = parsed.blocks[i].last_significant_number();
        text.insert(0, Insert::blank());
        r.insert(at, text);
        r.last_line = at + 1 + own_lines;
        r.index = i + 1;
        r
    }

    fn insert(&mut self, at: usize, texts: Vec<Insert>) {
        let ending = self.style.line_ending().to_string();
        let new_lines: Vec<Line> = texts
            .into_iter()
            .map(|t| {
                let text = format!("{}{}", self.style.indentation().repeat(t.level), t.text);
                Line::new(&text, 0, &ending)
            })
            .collect();
        if at > 0 {
            if let Some(prev) = self.lines.get_mut(at - 1).filter(|l| l.ending.is_empty()) {
                prev.ending = ending.clone();
            }
        }
        self.lines.splice(at..at, new_lines);
    }

    fn append_entry(&mut self, value: &str, summary: &EntrySummary) {
        self.insert_entry(self.last_line, value, summary);
    }

    /// Inserts an entry at line `at`, which lies within the record.
    fn insert_entry(&mut self, at: usize, value: &str, summary: &EntrySummary) {
        let texts = entry_texts(value, summary);
        let added = texts.len();
        self.insert(at, texts);
        self.last_line += added;
    }

    /// Line index of the value line of entry `i`.
    fn entry_line(&self, i: usize) -> usize {
        self.last_line - count_lines(&self.record.entries()[i..])
    }

    /// Appends summary text to entry `i`, continuing on new lines as needed.
    fn concatenate_summary(&mut self, i: usize, summary: &EntrySummary) {
        let last = self.entry_line(i) + self.record.entries()[i].summary().line_count() - 1;
        let lines = summary.lines();
        if let Some(first) = lines.first() {
            if !first.is_empty() {
                self.lines[last].text.push(' ');
            }
            self.lines[last].text.push_str(first);
        }
        if lines.len() > 1 {
            let rest = lines.iter().skip(1).map(|l| Insert::new(l.as_str(), 2)).collect();
            self.insert(last + 1, rest);
        }
    }

    fn time(&self, t: Styled<Time>) -> Time {
        if t.auto {
            t.value.with_format(self.style.time_format())
        } else {
            t.value
        }
    }

    fn apply(&mut self, edit: &Edit) {
        match edit {
            Edit::AppendEntry { value, summary } => {
                self.append_entry(&value.to_string(), summary);
            }
            Edit::StartOpenRange { start, summary } => {
                let open = OpenRange::new(self.time(*start)).with_format(self.style.open_range_format());
                self.append_entry(&open.to_string(), summary);
            }
            Edit::CloseOpenRange { at, on, summary } => {
                let Some(i) = self.record.open_range_index() else {
                    return;
                };
                let Some(end) = relative_end(self.record.date(), self.time(*at), *on) else {
                    return;
                };
                let line = self.entry_line(i);
                let end_text = end.to_string();
                let replaced = OPEN_PLACEHOLDER
                    .replace(&self.lines[line].text, |caps: &regex::Captures<'_>| {
                        format!("{}{end_text}{}", &caps[1], &caps[2])
                    })
                    .into_owned();
                self.lines[line].text = replaced;
                self.concatenate_summary(i, summary);
            }
            Edit::Pause { duration, summary } => self.pause(*duration, summary),
            Edit::CreateRecord => {}
        }
    }

    fn pause(&mut self, duration: Duration, summary: &EntrySummary) {
        let Some(open) = self.record.open_range_index() else {
            return;
        };
        let entries = self.record.entries();
        let existing = (open + 1..entries.len()).rev().find(|&i| {
            matches!(entries[i].value(), EntryValue::Duration(d) if d.in_minutes() <= 0)
                && entries[i].summary() == summary
        });
        match existing {
            Some(i) => {
                let extended = entries[i].duration() - duration;
                if extended.in_minutes() == 0 {
                    return;
                }
                let line = self.entry_line(i);
                let text = &self.lines[line].text;
                let indent = text.len() - text.trim_start_matches([' ', '\t']).len();
                let value_end = text[indent..]
                    .find([' ', '\t'])
                    .map_or(text.len(), |n| indent + n);
                self.lines[line]
                    .text
                    .replace_range(indent..value_end, &extended.to_string());
            }
            None => {
                let value = Duration::from_minutes(-duration.in_minutes()).with_format(
                    DurationFormat {
                        force_plus: false,
                        zero_sign: Some(Sign::Minus),
                    },
                );
                let below_open = self.entry_line(open) + entries[open].summary().line_count();
                self.insert_entry(below_open, &value.to_string(), summary);
            }
        }
    }

    fn finish(self) -> Result<Reconciled, ReconcileError> {
        let text: String = self.lines.iter().map(Line::original).collect();
        let reparsed = parser::parse(&text).map_err(ReconcileError::InvalidResult)?;
        let record = reparsed
            .records
            .get(self.index)
            .cloned()
            .ok_or_else(|| ReconcileError::InvalidResult(ParseErrors(Vec::new())))?;
        Ok(Reconciled {
            record,
            records: reparsed.records,
            text,
        })
    }
}

/// Applies `edit` to the first record that a strategy yields and that meets
/// the edit's precondition. The input is never modified.
pub fn reconcile(
    parsed: &Parsed,
    strategies: &[Strategy],
    edit: &Edit,
) -> Result<Reconciled, ReconcileError> {
    let mut rejected = Vec::new();
    for strategy in strategies {
        let candidate = match strategy {
            Strategy::ExistingRecord(date) => {
                match parsed.records.iter().position(|r| r.date() == *date) {
                    None => Err(Ineligible::NoRecord(*date)),
                    Some(i) => edit
                        .check(&parsed.records[i])
                        .map(|_| Reconciler::at_record(parsed, i)),
                }
            }
            Strategy::NewRecord(params)
                if parsed.records.iter().any(|r| r.date() == params.date.value) =>
            {
                Err(Ineligible::RecordExists(params.date.value))
            }
            Strategy::NewRecord(params) | Strategy::NewRecordRegardless(params) => {
                let reconciler = Reconciler::for_new_record(parsed, params);
                edit.check(&reconciler.record).map(|_| reconciler)
            }
        };
        match candidate {
            Ok(mut reconciler) => {
                log::debug!(
                    "reconciling {:?} at record {} ({})",
                    edit,
                    reconciler.index,
                    reconciler.record.date()
                );
                reconciler.apply(edit);
                return reconciler.finish();
            }
            Err(reason) => {
                log::debug!("strategy not eligible: {reason}");
                rejected.push(reason);
            }
        }
    }
    Err(ReconcileError::NoEligibleRecord(rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, parse_entry};

    fn date(text: &str) -> Date {
        text.parse().expect("valid date")
    }

    fn time(text: &str) -> Time {
        text.parse().expect("valid time")
    }

    fn summary(text: &str) -> EntrySummary {
        EntrySummary::from_line(text)
    }

    fn run(text: &str, strategies: &[Strategy], edit: Edit) -> Result<Reconciled, ReconcileError> {
        let parsed = parse(text).expect("valid input");
        reconcile(&parsed, strategies, &edit)
    }

    fn start(at: &str) -> Edit {
        Edit::StartOpenRange {
            start: Styled::auto(time(at)),
            summary: EntrySummary::default(),
        }
    }

    fn close(at: &str, on: &str, text: &str) -> Edit {
        Edit::CloseOpenRange {
            at: Styled::auto(time(at)),
            on: date(on),
            summary: summary(text),
        }
    }

    #[test]
    fn starts_open_range_with_record_indentation() {
        let out = run(
            "\n2018-01-01\n\t5h22m\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            start("8:03"),
        )
        .expect("reconciled");
        assert_eq!(out.text, "\n2018-01-01\n\t5h22m\n\t8:03 - ?\n");
        assert!(out.record.open_range().is_some());
    }

    #[test]
    fn new_values_follow_the_record_style() {
        let out = run(
            "2018-01-01\n  2:00am-3:00am",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            start("8:03"),
        )
        .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n  2:00am-3:00am\n  8:03am-?\n");
    }

    #[test]
    fn style_is_elected_from_other_records() {
        let text = "2018-01-01\n\t1:00pm - 2:00pm\n\n2018-01-02\n\t9:00am - ???\n\n2018-01-03\n\t1h\n";
        let out = run(
            text,
            &[Strategy::ExistingRecord(date("2018-01-03"))],
            Edit::Pause {
                duration: Duration::new(0, 0),
                summary: EntrySummary::default(),
            },
        );
        assert!(matches!(out, Err(ReconcileError::NoEligibleRecord(_))));

        let out = run(text, &[Strategy::ExistingRecord(date("2018-01-03"))], start("15:30"))
            .expect("reconciled");
        assert!(out.text.ends_with("2018-01-03\n\t1h\n\t3:30pm - ???\n"));
    }

    #[test]
    fn closes_open_range_and_appends_summary() {
        let out = run(
            "2018-01-01\n    9:00 - ? Work\n        on things\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            close("17:30", "2018-01-01", "done"),
        )
        .expect("reconciled");
        assert_eq!(
            out.text,
            "2018-01-01\n    9:00 - 17:30 Work\n        on things done\n"
        );
        assert_eq!(out.record.total(), Duration::new(8, 30));
    }

    #[test]
    fn closing_twice_fails_without_touching_the_text() {
        let strategies = [Strategy::ExistingRecord(date("2018-01-01"))];
        let first = run(
            "2018-01-01\n    9:00 - ?\n",
            &strategies,
            close("10:00", "2018-01-01", ""),
        )
        .expect("reconciled");
        assert_eq!(first.text, "2018-01-01\n    9:00 - 10:00\n");

        let parsed = parse(&first.text).expect("valid");
        let second = reconcile(&parsed, &strategies, &close("11:00", "2018-01-01", ""));
        match second {
            Err(ReconcileError::NoEligibleRecord(reasons)) => {
                assert_eq!(reasons, vec![Ineligible::NoOpenRange(date("2018-01-01"))]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn closing_on_the_next_day_shifts_the_end() {
        let out = run(
            "2018-01-01\n    22:00 - ?\n",
            &[
                Strategy::ExistingRecord(date("2018-01-02")),
                Strategy::ExistingRecord(date("2018-01-01")),
            ],
            close("1:30", "2018-01-02", ""),
        )
        .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    22:00 - 1:30>\n");
        assert_eq!(out.record.total(), Duration::new(3, 30));
    }

    #[test]
    fn rejects_end_before_start() {
        let err = run(
            "2018-01-01\n    9:00 - ?\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            close("8:00", "2018-01-01", ""),
        )
        .expect_err("ineligible");
        assert_eq!(
            err.to_string(),
            "No eligible record\n  2018-01-01: start and end time must be in chronological order"
        );
    }

    #[test]
    fn leaves_other_records_byte_identical() {
        let text = "2018-01-01 (5h!)\r\nSummary  \r\n\t1h   spaced  \r\n\n\n2018-01-02\n    1h";
        let entry = parse_entry("30m #more").expect("entry");
        let out = run(
            text,
            &[Strategy::ExistingRecord(date("2018-01-02"))],
            Edit::append(entry),
        )
        .expect("reconciled");
        let untouched = "2018-01-01 (5h!)\r\nSummary  \r\n\t1h   spaced  \r\n\n\n";
        assert!(out.text.starts_with(untouched));
        assert_eq!(&out.text[untouched.len()..], "2018-01-02\n    1h\n    30m #more\n");
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn appends_multiline_summaries() {
        let out = run(
            "2018-01-01\n    1h\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            Edit::AppendEntry {
                value: Duration::new(2, 0).into(),
                summary: EntrySummary::new(vec!["".into(), "first".into(), "second".into()])
                    .expect("summary"),
            },
        )
        .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    1h\n    2h\n        first\n        second\n");
    }

    fn params(d: &str) -> RecordParams {
        RecordParams::new(Styled::auto(date(d)))
    }

    #[test]
    fn inserts_new_records_in_date_order() {
        let text = "2018-01-02\n    1h\n\n2018-01-04\n    1h\n";

        let out = run(text, &[Strategy::NewRecord(params("2018-01-01"))], Edit::CreateRecord)
            .expect("reconciled");
        assert_eq!(out.text, format!("2018-01-01\n\n{text}"));
        assert_eq!(out.record.date(), date("2018-01-01"));

        let out = run(text, &[Strategy::NewRecord(params("2018-01-03"))], start("9:00"))
            .expect("reconciled");
        assert_eq!(
            out.text,
            "2018-01-02\n    1h\n\n2018-01-03\n    9:00 - ?\n\n2018-01-04\n    1h\n"
        );
        assert_eq!(out.record.date(), date("2018-01-03"));

        let mut with_extras = params("2018-01-05");
        with_extras.should_total = Some("8h".parse().expect("should total"));
        with_extras.summary = RecordSummary::new(vec!["Friday".into()]).expect("summary");
        let out = run(text, &[Strategy::NewRecord(with_extras)], start("9:00"))
            .expect("reconciled");
        assert!(out.text.ends_with("    1h\n\n2018-01-05 (8h!)\nFriday\n    9:00 - ?\n"));
        assert_eq!(out.records.len(), 3);
    }

    #[test]
    fn new_record_in_empty_file_uses_default_style() {
        let out = run("", &[Strategy::NewRecord(params("2018-01-01"))], start("9:00"))
            .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    9:00 - ?\n");
    }

    #[test]
    fn new_record_keeps_the_lines_of_a_blank_file() {
        let out = run("\n\n", &[Strategy::NewRecord(params("2018-01-01"))], Edit::CreateRecord)
            .expect("reconciled");
        assert_eq!(out.text, "\n\n2018-01-01\n");
        assert_eq!(out.record.date(), date("2018-01-01"));

        let out = run("  \r\n\t", &[Strategy::NewRecord(params("2018-01-01"))], start("9:00"))
            .expect("reconciled");
        assert_eq!(out.text, "  \r\n\t\n2018-01-01\n    9:00 - ?\n");
    }

    #[test]
    fn new_record_respects_existing_dates_unless_forced() {
        let text = "2018/01/02\n    1h\n";
        let err = run(text, &[Strategy::NewRecord(params("2018-01-02"))], Edit::CreateRecord)
            .expect_err("exists");
        assert!(matches!(
            err,
            ReconcileError::NoEligibleRecord(ref r) if r == &[Ineligible::RecordExists(date("2018-01-02"))]
        ));

        let out = run(
            text,
            &[Strategy::NewRecordRegardless(params("2018-01-02"))],
            Edit::CreateRecord,
        )
        .expect("reconciled");
        assert_eq!(out.text, "2018/01/02\n    1h\n\n2018/01/02\n");
    }

    #[test]
    fn first_eligible_strategy_wins() {
        let text = "2018-01-01\n    9:00 - ?\n";
        let out = run(
            text,
            &[
                Strategy::ExistingRecord(date("2018-01-01")),
                Strategy::NewRecord(params("2018-01-02")),
            ],
            start("10:00"),
        )
        .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    9:00 - ?\n\n2018-01-02\n    10:00 - ?\n");
    }

    fn pause(mins: i64, text: &str) -> Edit {
        Edit::Pause {
            duration: Duration::from_minutes(mins),
            summary: summary(text),
        }
    }

    #[test]
    fn pauses_are_added_then_extended() {
        let strategies = [Strategy::ExistingRecord(date("2018-01-01"))];

        let out = run("2018-01-01\n    9:00 - ?\n", &strategies, pause(15, "lunch"))
            .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    9:00 - ?\n    -15m lunch\n");

        let parsed = parse(&out.text).expect("valid");
        let out = reconcile(&parsed, &strategies, &pause(50, "lunch")).expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    9:00 - ?\n    -1h5m lunch\n");

        let parsed = parse(&out.text).expect("valid");
        let out = reconcile(&parsed, &strategies, &pause(0, "coffee")).expect("reconciled");
        assert_eq!(
            out.text,
            "2018-01-01\n    9:00 - ?\n    -0m coffee\n    -1h5m lunch\n"
        );
    }

    #[test]
    fn new_pause_goes_right_below_the_open_range() {
        let out = run(
            "2018-01-01\n    9:00 - ? Deep\n        work\n    1h\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            pause(15, ""),
        )
        .expect("reconciled");
        assert_eq!(
            out.text,
            "2018-01-01\n    9:00 - ? Deep\n        work\n    -15m\n    1h\n"
        );
        assert_eq!(out.record.total(), Duration::new(0, 45));
    }

    #[test]
    fn only_pauses_with_the_same_summary_are_extended() {
        let strategies = [Strategy::ExistingRecord(date("2018-01-01"))];
        let text = "2018-01-01\n    9:00 - ?\n    -10m lunch\n";

        let out = run(text, &strategies, pause(5, "")).expect("reconciled");
        assert_eq!(
            out.text,
            "2018-01-01\n    9:00 - ?\n    -5m\n    -10m lunch\n"
        );

        let parsed = parse(&out.text).expect("valid");
        let out = reconcile(&parsed, &strategies, &pause(5, "")).expect("reconciled");
        assert_eq!(
            out.text,
            "2018-01-01\n    9:00 - ?\n    -10m\n    -10m lunch\n"
        );

        let out = run(text, &strategies, pause(5, "lunch")).expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    9:00 - ?\n    -15m lunch\n");
    }

    #[test]
    fn positive_durations_are_never_extended() {
        let out = run(
            "2018-01-01\n    9:00 - ?\n    30m\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            pause(10, ""),
        )
        .expect("reconciled");
        assert_eq!(out.text, "2018-01-01\n    9:00 - ?\n    -10m\n    30m\n");
    }

    #[test]
    fn unparseable_results_are_rejected() {
        let err = run(
            "2018-01-01\n    1h\n",
            &[Strategy::ExistingRecord(date("2018-01-01"))],
            Edit::AppendEntry {
                value: Duration::new(1, 0).into(),
                summary: summary("text\n2018"),
            },
        )
        .expect_err("invalid");
        assert!(matches!(err, ReconcileError::InvalidResult(_)));
    }

    #[test]
    fn elects_majority_style() {
        let text = "2018/01/01\r\n  1h\r\n\r\n2018/01/02\r\n  1h\r\n\r\n2018-01-03\n\t1h\n";
        let parsed = parse(text).expect("valid");
        let style = Style::elect(Style::default(), &parsed);
        assert_eq!(style.line_ending(), "\r\n");
        assert_eq!(style.indentation(), "  ");
        assert!(!style.date_format().use_dashes);

        let own = Style::of_record(&parsed.records[2], &parsed.blocks[2]);
        let style = Style::elect(own, &parsed);
        assert_eq!(style.line_ending(), "\n");
        assert_eq!(style.indentation(), "\t");
        assert!(style.date_format().use_dashes);
    }
}
