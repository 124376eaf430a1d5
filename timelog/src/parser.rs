//! Text to records.
//!
//! Parsing is line-oriented: the scanner cuts the text into blocks, and every
//! block is parsed into one [`Record`] on its own. A malformed line yields one
//! [`ParseError`] and the parser moves on, so a single run reports every
//! problem in a file. Error positions count characters, not bytes.

use crate::core::{
    Date, Duration, Entry, EntryKind, EntrySummary, EntryValue, OpenRange, OpenRangeFormat, Range,
    RangeFormat, Record, RecordSummary, ShouldTotal, Time,
};
use crate::scanner::{self, Block, Line};

const INDENTATION_STYLES: [&str; 4] = ["    ", "   ", "  ", "\t"];

/* ------------------------------- Errors ------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidDate,
    IllegalIndentation,
    MalformedShouldTotal,
    UnrecognisedProperty,
    MalformedPropertiesSyntax,
    UnrecognisedTextInHeadline,
    MalformedSummary,
    MalformedEntry,
    DuplicateOpenRange,
    IllegalRange,
}

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::InvalidDate => "ErrorInvalidDate",
            ErrorCode::IllegalIndentation => "ErrorIllegalIndentation",
            ErrorCode::MalformedShouldTotal => "ErrorMalformedShouldTotal",
            ErrorCode::UnrecognisedProperty => "ErrorUnrecognisedProperty",
            ErrorCode::MalformedPropertiesSyntax => "ErrorMalformedPropertiesSyntax",
            ErrorCode::UnrecognisedTextInHeadline => "ErrorUnrecognisedTextInHeadline",
            ErrorCode::MalformedSummary => "ErrorMalformedSummary",
            ErrorCode::MalformedEntry => "ErrorMalformedEntry",
            ErrorCode::DuplicateOpenRange => "ErrorDuplicateOpenRange",
            ErrorCode::IllegalRange => "ErrorIllegalRange",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorCode::InvalidDate => "Invalid date",
            ErrorCode::IllegalIndentation => "Unexpected indentation",
            ErrorCode::MalformedShouldTotal | ErrorCode::MalformedPropertiesSyntax => {
                "Malformed should-total time"
            }
            ErrorCode::UnrecognisedProperty => "Unrecognised should-total value",
            ErrorCode::UnrecognisedTextInHeadline => "Malformed headline",
            ErrorCode::MalformedSummary => "Malformed summary",
            ErrorCode::MalformedEntry => "Malformed entry",
            ErrorCode::DuplicateOpenRange => "Duplicate entry",
            ErrorCode::IllegalRange => "Invalid date range",
        }
    }

    pub fn details(self) -> &'static str {
        match self {
            ErrorCode::InvalidDate => {
                "Please make sure that the date format is either YYYY-MM-DD or YYYY/MM/DD, \
                 and that its value represents a valid day in the calendar."
            }
            ErrorCode::IllegalIndentation => {
                "Please correct the indentation of this line. Indentation must be 2-4 spaces \
                 or one tab. You cannot mix different indentation styles within the same record."
            }
            ErrorCode::MalformedShouldTotal => {
                "Please review the syntax of the should-total time. \
                 Valid examples for it would be: (8h!) or (4h30m!) or (45m!)"
            }
            ErrorCode::UnrecognisedProperty => {
                "The highlighted value is not recognised. The should-total must be a time \
                 duration suffixed with an exclamation mark, e.g. 5h15m! or 8h!"
            }
            ErrorCode::MalformedPropertiesSyntax => {
                "The should-total cannot be empty and it must be surrounded by parenthesis \
                 on both sides"
            }
            ErrorCode::UnrecognisedTextInHeadline => {
                "The highlighted text in the headline is not recognised. Please make sure to \
                 surround the should-total with parentheses, e.g.: (5h!) You generally cannot \
                 put arbitrary text into the headline."
            }
            ErrorCode::MalformedSummary => {
                "Summary lines cannot start with blank characters, such as non-breaking spaces."
            }
            ErrorCode::MalformedEntry => {
                "Please review the syntax of the entry. It must start with a duration or a \
                 time range. Valid examples would be: 3h20m or 8:00-10:00 or 8:00-? \
                 or <23:00-6:00 or 18:00-0:30>"
            }
            ErrorCode::DuplicateOpenRange => {
                "Please make sure that there is only one open (unclosed) time range in this record."
            }
            ErrorCode::IllegalRange => {
                "Please make sure that both time values appear in chronological order. \
                 If you want a time to be associated with an adjacent day you can use angle \
                 brackets to shift the time by one day: <23:00-6:00 or 18:00-0:30>"
            }
        }
    }
}

/// A syntax error located in one line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", .code.title(), .code.details())]
pub struct ParseError {
    pub code: ErrorCode,
    pub line: Line,
    /// Character offset of the offending text.
    pub position: usize,
    /// Width of the offending text in characters.
    pub length: usize,
}

impl ParseError {
    fn new(code: ErrorCode, line: &Line, position: usize, length: usize) -> Self {
        Self {
            code,
            line: line.clone(),
            position,
            length,
        }
    }
}

/// All syntax errors of one text, in line order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} syntax error(s)", .0.len())]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/* ------------------------ Public entry points ------------------------ */

/// Records together with the blocks they were parsed from, index for index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub records: Vec<Record>,
    pub blocks: Vec<Block>,
    /// The lines of a text that holds no record at all. Empty otherwise.
    pub blank_lines: Vec<Line>,
}

impl Parsed {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Record, &Block)> {
        self.records.iter().zip(self.blocks.iter())
    }
}

/// Parses a whole timelog text. Either every block parses, or all errors are
/// returned together.
pub fn parse(text: &str) -> Result<Parsed, ParseErrors> {
    let blocks = scanner::scan(text);
    let mut records = Vec::with_capacity(blocks.len());
    let mut errors = Vec::new();
    for block in &blocks {
        match parse_record(block.significant_lines()) {
            Ok(record) => records.push(record),
            Err(mut errs) => errors.append(&mut errs),
        }
    }
    if !errors.is_empty() {
        log::debug!("parsing failed with {} error(s)", errors.len());
        return Err(ParseErrors(errors));
    }
    log::debug!("parsed {} record(s)", records.len());
    let blank_lines = if blocks.is_empty() {
        scanner::split_lines(text)
    } else {
        Vec::new()
    };
    Ok(Parsed {
        records,
        blocks,
        blank_lines,
    })
}

/// Parses a single entry as typed on the command line, e.g. `1h30m #work`
/// or `9:00 - 10:15 Meeting`.
pub fn parse_entry(text: &str) -> Result<Entry, ParseError> {
    let line = Line::new(text.trim(), 1, "");
    let mut cursor = Cursor::new(&line.text, 0);
    let (value, _) = parse_entry_value(&mut cursor, &line)?;
    cursor.skip_while(is_space_or_tab);
    let summary = EntrySummary::from_line(&cursor.rest());
    Ok(Entry::new(value, summary))
}

/* ------------------------------- Utils ------------------------------- */

fn is_space_or_tab(c: char) -> bool {
    c == ' ' || c == '\t'
}

struct Peeked {
    text: String,
    len: usize,
    matched: bool,
}

/// Character cursor over one line.
struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(text: &str, pos: usize) -> Self {
        Self {
            chars: text.chars().collect(),
            pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Text from the cursor up to (excluding) the first match.
    fn peek_until(&self, is_match: impl Fn(char) -> bool) -> Peeked {
        let rest = self.chars.get(self.pos..).unwrap_or_default();
        let len = rest.iter().position(|c| is_match(*c));
        let matched = len.is_some();
        let len = len.unwrap_or(rest.len());
        Peeked {
            text: rest[..len].iter().collect(),
            len,
            matched,
        }
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn skip_while(&mut self, is_match: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&is_match) {
            self.pos += 1;
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.pos)
    }

    fn rest(&self) -> String {
        self.chars.get(self.pos..).unwrap_or_default().iter().collect()
    }
}

/// The first indentation style the line starts with.
fn detect_indentation(line: &Line) -> Option<&'static str> {
    INDENTATION_STYLES
        .iter()
        .copied()
        .find(|style| line.text.starts_with(style))
}

/// A cursor positioned behind `level` indentations, if the line has them.
fn indented(line: &Line, style: &str, level: usize) -> Option<Cursor> {
    let prefix = style.repeat(level);
    line.text
        .starts_with(&prefix)
        .then(|| Cursor::new(&line.text, prefix.chars().count()))
}

/* ------------------------------ Records ------------------------------ */

fn parse_record(lines: &[Line]) -> Result<Record, Vec<ParseError>> {
    let mut errs = Vec::new();
    let Some((headline, mut rest)) = lines.split_first() else {
        return Err(errs);
    };
    let head = parse_headline(headline, &mut errs);

    // Summary lines run until the first indented line.
    let mut summary = Vec::new();
    let mut indentation = None;
    while let Some(line) = rest.first() {
        if let Some(style) = detect_indentation(line) {
            indentation = Some(style);
            break;
        }
        if RecordSummary::new(vec![line.text.clone()]).is_err() {
            errs.push(ParseError::new(
                ErrorCode::MalformedSummary,
                line,
                0,
                line.text.chars().count(),
            ));
        }
        summary.push(line.text.clone());
        rest = &rest[1..];
    }

    let mut entries: Vec<Entry> = Vec::new();
    if let Some(style) = indentation {
        while let Some(line) = rest.first() {
            let mut cursor = match indented(line, style, 1) {
                Some(c) if !c.peek().is_some_and(is_space_or_tab) => c,
                _ => {
                    errs.push(ParseError::new(
                        ErrorCode::IllegalIndentation,
                        line,
                        0,
                        line.text.chars().count(),
                    ));
                    break;
                }
            };
            rest = &rest[1..];

            let (value, start_pos) = match parse_entry_value(&mut cursor, line) {
                Ok(v) => v,
                Err(e) => {
                    errs.push(e);
                    continue;
                }
            };
            let value_width = cursor.pos - start_pos;

            let mut summary_lines = vec![String::new()];
            if cursor.peek().is_some_and(is_space_or_tab) {
                cursor.advance(1);
                summary_lines[0] = cursor.rest();
            }
            let mut summary_ok = true;
            while let Some(next) = rest.first() {
                let Some(continuation) = indented(next, style, 2) else {
                    break;
                };
                rest = &rest[1..];
                let text = continuation.rest();
                if text.trim().is_empty() {
                    errs.push(ParseError::new(
                        ErrorCode::MalformedSummary,
                        next,
                        0,
                        next.text.chars().count(),
                    ));
                    summary_ok = false;
                }
                summary_lines.push(text);
            }
            if !summary_ok {
                continue;
            }
            let summary = if summary_lines.len() == 1 && summary_lines[0].is_empty() {
                EntrySummary::default()
            } else {
                match EntrySummary::new(summary_lines) {
                    Ok(s) => s,
                    Err(_) => continue,
                }
            };

            let is_open = matches!(value, EntryValue::OpenRange(_));
            if is_open && entries.iter().any(|e| e.kind() == EntryKind::OpenRange) {
                errs.push(ParseError::new(
                    ErrorCode::DuplicateOpenRange,
                    line,
                    start_pos,
                    value_width,
                ));
                continue;
            }
            entries.push(Entry::new(value, summary));
        }
    }

    let Some((date, should_total)) = head else {
        return Err(errs);
    };
    if !errs.is_empty() {
        return Err(errs);
    }
    let mut record = Record::new(date);
    record.set_should_total(should_total);
    record.set_summary(RecordSummary::new(summary).unwrap_or_default());
    record.set_entries(entries).map_err(|_| {
        vec![ParseError::new(
            ErrorCode::DuplicateOpenRange,
            headline,
            0,
            headline.text.chars().count(),
        )]
    })?;
    Ok(record)
}

fn parse_headline(line: &Line, errs: &mut Vec<ParseError>) -> Option<(Date, Option<ShouldTotal>)> {
    let mut c = Cursor::new(&line.text, 0);
    if c.peek().is_some_and(is_space_or_tab) {
        errs.push(ParseError::new(ErrorCode::IllegalIndentation, line, 0, c.len()));
        return None;
    }

    let date_text = c.peek_until(is_space_or_tab);
    let date: Date = match date_text.text.parse() {
        Ok(d) => d,
        Err(_) => {
            errs.push(ParseError::new(ErrorCode::InvalidDate, line, c.pos, date_text.len));
            return None;
        }
    };
    c.advance(date_text.len);
    c.skip_while(is_space_or_tab);

    let mut should_total = None;
    if c.peek() == Some('(') {
        c.advance(1);
        c.skip_while(is_space_or_tab);
        let props = c.peek_until(|ch| ch == ')');
        if !props.matched {
            errs.push(ParseError::new(ErrorCode::MalformedPropertiesSyntax, line, c.len(), 1));
            return Some((date, None));
        }
        if props.len == 0 {
            errs.push(ParseError::new(ErrorCode::MalformedPropertiesSyntax, line, c.pos, 1));
            return Some((date, None));
        }
        let value = c.peek_until(|ch| ch == '!');
        if !value.matched {
            errs.push(ParseError::new(
                ErrorCode::UnrecognisedProperty,
                line,
                c.pos,
                value.len.saturating_sub(1),
            ));
            return Some((date, None));
        }
        match value.text.parse::<Duration>().map(ShouldTotal::new) {
            Ok(Ok(total)) => should_total = Some(total),
            _ => {
                errs.push(ParseError::new(
                    ErrorCode::MalformedShouldTotal,
                    line,
                    c.pos,
                    value.len,
                ));
                return Some((date, None));
            }
        }
        c.advance(value.len + 1);
        c.skip_while(is_space_or_tab);
        if c.peek() != Some(')') {
            errs.push(ParseError::new(
                ErrorCode::UnrecognisedProperty,
                line,
                c.pos,
                c.remaining().saturating_sub(1),
            ));
            return Some((date, should_total));
        }
        c.advance(1);
    }

    c.skip_while(is_space_or_tab);
    if c.remaining() > 0 {
        errs.push(ParseError::new(
            ErrorCode::UnrecognisedTextInHeadline,
            line,
            c.pos,
            c.remaining(),
        ));
    }
    Some((date, should_total))
}

/// Parses a duration, range or open range at the cursor. Returns the value
/// and the position it started at.
fn parse_entry_value(c: &mut Cursor, line: &Line) -> Result<(EntryValue, usize), ParseError> {
    let value_start = c.pos;
    let candidate = c.peek_until(is_space_or_tab);
    if let Ok(duration) = candidate.text.parse::<Duration>() {
        c.advance(candidate.len);
        return Ok((EntryValue::Duration(duration), value_start));
    }

    let start_text = c.peek_until(|ch| ch == '-' || ch == ' ');
    if start_text.len == 0 {
        return Err(ParseError::new(
            ErrorCode::MalformedEntry,
            line,
            c.pos,
            candidate.len,
        ));
    }
    let start: Time = start_text
        .text
        .parse()
        .map_err(|_| ParseError::new(ErrorCode::MalformedEntry, line, c.pos, start_text.len))?;
    c.advance(start_text.len);

    let before_dash = c.pos;
    c.skip_while(|ch| ch == ' ');
    let spaces_around_dash = c.pos != before_dash;
    if c.peek() != Some('-') {
        return Err(ParseError::new(ErrorCode::MalformedEntry, line, c.pos, 1));
    }
    c.advance(1);
    c.skip_while(|ch| ch == ' ');

    if c.peek() == Some('?') {
        c.advance(1);
        let placeholder = c.peek_until(is_space_or_tab);
        if placeholder.text.chars().any(|ch| ch != '?') {
            return Err(ParseError::new(
                ErrorCode::MalformedEntry,
                line,
                c.pos,
                placeholder.len,
            ));
        }
        c.advance(placeholder.len);
        let open = OpenRange::new(start).with_format(OpenRangeFormat {
            spaces_around_dash,
            additional_placeholder_chars: placeholder.len,
        });
        return Ok((EntryValue::OpenRange(open), value_start));
    }

    let end_text = c.peek_until(is_space_or_tab);
    if end_text.len == 0 {
        return Err(ParseError::new(ErrorCode::MalformedEntry, line, c.pos, 1));
    }
    let end: Time = end_text
        .text
        .parse()
        .map_err(|_| ParseError::new(ErrorCode::MalformedEntry, line, c.pos, end_text.len))?;
    c.advance(end_text.len);

    let range = Range::new(start, end).map_err(|_| {
        ParseError::new(
            ErrorCode::IllegalRange,
            line,
            value_start,
            c.pos - value_start,
        )
    })?;
    Ok((
        EntryValue::Range(range.with_format(RangeFormat { spaces_around_dash })),
        value_start,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Tag;
    use rstest::rstest;

    fn errors(text: &str) -> Vec<(ErrorCode, usize, usize, usize)> {
        match parse(text) {
            Ok(_) => vec![],
            Err(errs) => errs
                .iter()
                .map(|e| (e.code, e.line.number, e.position, e.length))
                .collect(),
        }
    }

    #[test]
    fn parses_a_complete_file() {
        let text = "\
2024-01-15 (8h!)
Worked on #project=alpha
Second summary line
    8:00 - 12:00 Coding
    1h30m Meeting
        with the team
    -30m
    23:30 - 0:15> Late
    13:00 - ?

2024/01/16
\t2h #support
";
        let parsed = parse(text).expect("valid file");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.blocks.len(), 2);

        let first = &parsed.records[0];
        assert_eq!(first.date().to_string(), "2024-01-15");
        assert_eq!(first.should_total().map(|s| s.to_string()), Some("8h!".into()));
        assert_eq!(first.summary().lines().len(), 2);
        assert!(first.tags().contains(&"#project".parse::<Tag>().expect("tag")));

        let kinds: Vec<EntryKind> = first.entries().iter().map(Entry::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::Range,
                EntryKind::Duration,
                EntryKind::Duration,
                EntryKind::Range,
                EntryKind::OpenRange
            ]
        );
        assert_eq!(
            first.entries()[1].summary().lines(),
            &["Meeting".to_string(), "with the team".to_string()]
        );
        assert_eq!(first.total(), Duration::new(5, 45));

        let second = &parsed.records[1];
        assert!(!second.date().format().use_dashes);
        assert_eq!(second.total(), Duration::new(2, 0));
    }

    #[rstest]
    #[case("    9:00-10:00", "9:00-10:00")]
    #[case("  9:00   -  10:00", "9:00 - 10:00")]
    #[case("   9:00-???", "9:00-???")]
    #[case("  9:00am - ?", "9:00am - ?")]
    #[case("  -0m", "-0m")]
    #[case("  +0m", "+0m")]
    #[case("  9:00 - 9:00", "9:00 - 9:00")]
    fn parses_entry_values(#[case] entry: &str, #[case] rendered: &str) {
        let parsed = parse(&format!("2024-01-01\n{entry}")).expect("valid entry");
        assert_eq!(parsed.records[0].entries()[0].value().to_string(), rendered);
    }

    #[test]
    fn empty_headline_summary_and_entry_summary() {
        let parsed = parse("2024-01-01\n  1h\n  2h\tcode").expect("valid");
        let entries = parsed.records[0].entries();
        assert!(entries[0].summary().is_empty());
        assert_eq!(entries[1].summary().lines(), &["code".to_string()]);
    }

    #[rstest]
    #[case(" 2024-01-01", ErrorCode::IllegalIndentation, 0, 11)]
    #[case("2024-13-01", ErrorCode::InvalidDate, 0, 10)]
    #[case("01.01.2024 (8h!)", ErrorCode::InvalidDate, 0, 10)]
    #[case("2024-01-01 (8h!", ErrorCode::MalformedPropertiesSyntax, 15, 1)]
    #[case("2024-01-01 ()", ErrorCode::MalformedPropertiesSyntax, 12, 1)]
    #[case("2024-01-01 (8h)", ErrorCode::UnrecognisedProperty, 12, 2)]
    #[case("2024-01-01 (8x!)", ErrorCode::MalformedShouldTotal, 12, 2)]
    #[case("2024-01-01 (8h! foo)", ErrorCode::UnrecognisedProperty, 16, 3)]
    #[case("2024-01-01 hello", ErrorCode::UnrecognisedTextInHeadline, 11, 5)]
    fn reports_headline_errors(
        #[case] headline: &str,
        #[case] code: ErrorCode,
        #[case] position: usize,
        #[case] length: usize,
    ) {
        assert_eq!(errors(headline), vec![(code, 1, position, length)]);
    }

    #[rstest]
    #[case("  foo", ErrorCode::MalformedEntry, 2, 3)]
    #[case("  -", ErrorCode::MalformedEntry, 2, 1)]
    #[case("  9:00", ErrorCode::MalformedEntry, 6, 1)]
    #[case("  9:00 -", ErrorCode::MalformedEntry, 8, 1)]
    #[case("  9:00 - x", ErrorCode::MalformedEntry, 9, 1)]
    #[case("  9:00 - ?!", ErrorCode::MalformedEntry, 10, 1)]
    #[case("  10:00 - 9:00", ErrorCode::IllegalRange, 2, 12)]
    fn reports_entry_errors(
        #[case] entry: &str,
        #[case] code: ErrorCode,
        #[case] position: usize,
        #[case] length: usize,
    ) {
        assert_eq!(
            errors(&format!("2024-01-01\n{entry}")),
            vec![(code, 2, position, length)]
        );
    }

    #[test]
    fn reports_duplicate_open_ranges() {
        assert_eq!(
            errors("2024-01-01\n  9:00 - ?\n  10:00 - ??"),
            vec![(ErrorCode::DuplicateOpenRange, 3, 2, 10)]
        );
    }

    #[test]
    fn reports_mixed_indentation_and_stops_the_record() {
        assert_eq!(
            errors("2024-01-01\n    1h\n  2h\n    3h"),
            vec![(ErrorCode::IllegalIndentation, 3, 0, 4)]
        );
    }

    #[test]
    fn reports_malformed_record_summary() {
        assert_eq!(
            errors("2024-01-01\n\u{a0}Summary"),
            vec![(ErrorCode::MalformedSummary, 2, 0, 8)]
        );
    }

    #[test]
    fn collects_errors_across_blocks() {
        let found = errors("2024-01-01\n  foo\n\n2024-01-02\n  1h\n\n2024-99-99\n");
        assert_eq!(
            found,
            vec![
                (ErrorCode::MalformedEntry, 2, 2, 3),
                (ErrorCode::InvalidDate, 7, 0, 10),
            ]
        );
    }

    #[test]
    fn positions_count_characters() {
        assert_eq!(
            errors("2024-01-01 (8h!) äöü"),
            vec![(ErrorCode::UnrecognisedTextInHeadline, 1, 17, 3)]
        );
    }

    #[test]
    fn blank_text_parses_to_nothing() {
        assert!(parse("").expect("empty").is_empty());
        assert!(parse("\n\n").expect("blank").is_empty());
    }

    #[test]
    fn parses_single_entries() {
        let entry = parse_entry("9:00 - 10:15 Meeting #work").expect("entry");
        assert_eq!(entry.kind(), EntryKind::Range);
        assert_eq!(entry.summary().lines(), &["Meeting #work".to_string()]);

        let entry = parse_entry("-45m").expect("entry");
        assert_eq!(entry.duration(), Duration::new(0, -45));
        assert!(entry.summary().is_empty());

        assert_eq!(
            parse_entry("foo").map_err(|e| e.code),
            Err(ErrorCode::MalformedEntry)
        );
    }
}
