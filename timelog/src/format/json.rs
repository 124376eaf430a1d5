//! JSON view of records or of syntax errors.
//!
//! The envelope always has all three keys: `records` is null when there are
//! errors, `errors` is null when there are records.

use std::path::Path;

use serde::Serialize;

use crate::core::{Duration, Entry, EntryValue, Record, TagSet};
use crate::parser::ParseError;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub records: Option<Vec<RecordView>>,
    pub warnings: Option<Vec<String>>,
    pub errors: Option<Vec<ErrorView>>,
}

#[derive(Debug, Serialize)]
pub struct RecordView {
    pub date: String,
    pub summary: String,
    pub total: String,
    pub total_mins: i64,
    pub should_total: String,
    pub should_total_mins: i64,
    pub diff: String,
    pub diff_mins: i64,
    pub tags: Vec<String>,
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    /// `range`, `open_range` or `duration`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub summary: String,
    pub tags: Vec<String>,
    pub total: String,
    pub total_mins: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_mins: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_mins: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorView {
    pub line: usize,
    pub column: usize,
    pub length: usize,
    pub title: String,
    pub details: String,
    pub file: String,
}

fn tag_strings(tags: &TagSet) -> Vec<String> {
    tags.unique().map(ToString::to_string).collect()
}

fn entry_view(e: &Entry) -> EntryView {
    let mut view = EntryView {
        kind: "duration",
        summary: e.summary().lines().join("\n"),
        tags: tag_strings(&e.summary().tags()),
        total: e.duration().to_string(),
        total_mins: e.duration().in_minutes(),
        start: None,
        start_mins: None,
        end: None,
        end_mins: None,
    };
    match e.value() {
        EntryValue::Range(r) => {
            view.kind = "range";
            view.start = Some(r.start().to_string());
            view.start_mins = Some(r.start().midnight_offset().in_minutes());
            view.end = Some(r.end().to_string());
            view.end_mins = Some(r.end().midnight_offset().in_minutes());
        }
        EntryValue::OpenRange(o) => {
            view.kind = "open_range";
            view.start = Some(o.start().to_string());
            view.start_mins = Some(o.start().midnight_offset().in_minutes());
        }
        EntryValue::Duration(_) => {}
    }
    view
}

pub fn record_view(r: &Record) -> RecordView {
    let total = r.total();
    let should = r.should_total().map_or(Duration::ZERO, |s| s.duration());
    let diff = total - should;
    RecordView {
        date: r.date().to_string(),
        summary: r.summary().lines().join("\n"),
        total: total.to_string(),
        total_mins: total.in_minutes(),
        should_total: r
            .should_total()
            .map_or_else(|| should.to_string(), |s| s.to_string()),
        should_total_mins: should.in_minutes(),
        diff: diff.to_string_with_sign(),
        diff_mins: diff.in_minutes(),
        tags: tag_strings(&r.tags()),
        entries: r.entries().iter().map(entry_view).collect(),
    }
}

fn encode(envelope: &Envelope, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(envelope)
    } else {
        serde_json::to_string(envelope)
    }
}

pub fn records_to_json(
    records: &[Record],
    warnings: Vec<String>,
    pretty: bool,
) -> serde_json::Result<String> {
    let envelope = Envelope {
        records: Some(records.iter().map(record_view).collect()),
        warnings: (!warnings.is_empty()).then_some(warnings),
        errors: None,
    };
    encode(&envelope, pretty)
}

pub fn errors_to_json<'a>(
    errors: impl IntoIterator<Item = (Option<&'a Path>, &'a ParseError)>,
    pretty: bool,
) -> serde_json::Result<String> {
    let views = errors
        .into_iter()
        .map(|(path, e)| ErrorView {
            line: e.line.number,
            column: e.position,
            length: e.length,
            title: e.code.title().to_string(),
            details: e.code.details().to_string(),
            file: path.map(|p| p.display().to_string()).unwrap_or_default(),
        })
        .collect();
    let envelope = Envelope {
        records: None,
        warnings: None,
        errors: Some(views),
    };
    encode(&envelope, pretty)
}
