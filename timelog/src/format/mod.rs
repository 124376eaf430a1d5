//! Records to text.
//!
//! [`serialise_records`] renders the canonical file form: four-space
//! indentation, `\n` line endings, one blank line between records. Values
//! keep their own format (date separator, clock convention, dash spacing) so
//! canonical input renders back unchanged. Terminal styling is applied per
//! token by the [`Serialiser`] and never changes the characters themselves.

pub mod json;
pub mod report;
pub mod table;

use std::path::Path;

use colored::{ColoredString, Colorize};

use crate::core::{
    Date, Duration, EntryValue, HASH_TAG, OpenRange, Range, Record, ShouldTotal, Tag, Time,
};
use crate::parser::ParseErrors;

const INDENT: &str = "    ";
const LINE_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Emit ANSI colours.
    pub colour: bool,
    /// Render durations as plain minute counts.
    pub decimal: bool,
}

/// Renders individual tokens according to [`FormatOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Serialiser {
    options: FormatOptions,
}

impl Serialiser {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// No colours, regular durations. This is what goes into files.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn options(&self) -> FormatOptions {
        self.options
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.options.colour {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn duration_text(&self, d: Duration, with_sign: bool) -> String {
        if self.options.decimal {
            d.in_minutes().to_string()
        } else if with_sign {
            d.to_string_with_sign()
        } else {
            d.to_string()
        }
    }

    pub fn date(&self, d: &Date) -> String {
        self.paint(&d.to_string(), |t| t.underline())
    }

    pub fn should_total(&self, s: &ShouldTotal) -> String {
        let text = if self.options.decimal {
            s.duration().in_minutes().to_string()
        } else {
            s.to_string()
        };
        self.paint(&text, |t| t.purple())
    }

    /// A sum of should-totals, rendered like a should-total.
    pub fn should_duration(&self, d: Duration) -> String {
        let text = if self.options.decimal {
            d.in_minutes().to_string()
        } else {
            format!("{d}!")
        };
        self.paint(&text, |t| t.purple())
    }

    /// Secondary information.
    pub fn note(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }

    /// Summary text with tags highlighted.
    pub fn summary(&self, text: &str) -> String {
        if !self.options.colour {
            return text.to_string();
        }
        let mut out = String::new();
        let mut last = 0;
        for m in HASH_TAG.find_iter(text) {
            out.push_str(&text[last..m.start()].dimmed().to_string());
            out.push_str(&m.as_str().bold().to_string());
            last = m.end();
        }
        out.push_str(&text[last..].dimmed().to_string());
        out
    }

    pub fn tag(&self, t: &Tag) -> String {
        self.paint(&t.to_string(), |s| s.bold())
    }

    pub fn range(&self, r: &Range) -> String {
        self.paint(&r.to_string(), |t| t.blue())
    }

    pub fn open_range(&self, o: &OpenRange) -> String {
        self.paint(&o.to_string(), |t| t.bright_blue())
    }

    pub fn time(&self, t: &Time) -> String {
        self.paint(&t.to_string(), |s| s.blue())
    }

    pub fn duration(&self, d: Duration) -> String {
        let text = self.duration_text(d, false);
        if d.is_negative() {
            self.paint(&text, |t| t.red())
        } else {
            self.paint(&text, |t| t.green())
        }
    }

    pub fn signed_duration(&self, d: Duration) -> String {
        let text = self.duration_text(d, true);
        if d.is_negative() {
            self.paint(&text, |t| t.red())
        } else {
            self.paint(&text, |t| t.green())
        }
    }

    pub fn entry_value(&self, v: &EntryValue) -> String {
        match v {
            EntryValue::Range(r) => self.range(r),
            EntryValue::OpenRange(o) => self.open_range(o),
            EntryValue::Duration(d) => self.duration(*d),
        }
    }

    /// `[WARNING] <date>: <message>`
    pub fn warning(&self, date: &Date, message: &str) -> String {
        format!(
            "{} {}",
            self.paint("[WARNING]", |t| t.black().on_yellow()),
            self.paint(&format!("{date}: {message}"), |t| t.yellow())
        )
    }

    /// Renders syntax errors with the offending line and a caret underline.
    pub fn parse_errors(&self, errs: &ParseErrors, origin: Option<&Path>) -> String {
        let mut out = String::new();
        for e in errs.iter() {
            out.push('\n');
            out.push_str(&self.paint("[SYNTAX ERROR]", |t| t.white().on_red()));
            let mut location = format!(" in line {}", e.line.number);
            if let Some(path) = origin {
                location.push_str(&format!(" of file {}", path.display()));
            }
            out.push_str(&self.paint(&location, |t| t.red()));
            out.push('\n');

            let text = e.line.text.replace('\t', " ");
            out.push_str(&self.paint(&format!("{INDENT}{text}"), |t| t.dimmed()));
            out.push('\n');

            let carets = format!(
                "{INDENT}{}{}",
                " ".repeat(e.position),
                "^".repeat(e.length.max(1))
            );
            out.push_str(&self.paint(&carets, |t| t.red()));
            out.push('\n');

            let message = reflow(&e.to_string(), INDENT, LINE_WIDTH);
            out.push_str(&self.paint(&message, |t| t.yellow()));
            out.push('\n');
        }
        out
    }
}

/// Word-wraps text, prefixing every line with `indent`.
pub fn reflow(text: &str, indent: &str, width: usize) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let projected = indent.len() + current.chars().count() + 1 + word.chars().count();
        if !current.is_empty() && projected > width {
            lines.push(format!("{indent}{current}"));
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(format!("{indent}{current}"));
    }
    lines.join("\n")
}

/* ------------------------------ Records ------------------------------ */

/// The lines of one record, without line endings.
pub fn serialise_record(s: &Serialiser, r: &Record) -> Vec<String> {
    let mut lines = Vec::new();

    let mut headline = s.date(&r.date());
    if let Some(should) = r.should_total() {
        headline.push_str(&format!(" ({})", s.should_total(&should)));
    }
    lines.push(headline);

    for l in r.summary().lines() {
        lines.push(s.summary(l));
    }

    for e in r.entries() {
        let mut line = format!("{INDENT}{}", s.entry_value(e.value()));
        let summary = e.summary().lines();
        if let Some(first) = summary.first().filter(|l| !l.is_empty()) {
            line.push(' ');
            line.push_str(&s.summary(first));
        }
        lines.push(line);
        for l in summary.iter().skip(1) {
            lines.push(format!("{INDENT}{INDENT}{}", s.summary(l)));
        }
    }
    lines
}

/// Canonical text of all records, separated by blank lines.
pub fn serialise_records(s: &Serialiser, records: &[Record]) -> String {
    let mut out = String::new();
    for (i, r) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in serialise_record(s, r) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const CANONICAL: &str = "\
2024-01-15 (8h!)
Worked on #project=alpha
Second line
    8:00 - 12:00 Coding
    1h30m Meeting
        with the team
    -30m
    +0m
    1h
        summary starts here
    23:30 - 0:15>
    1:00pm-2:00pm #x
    13:00 - ???

2024/01/16
    2h #support
";

    #[test]
    fn canonical_text_round_trips() {
        let parsed = parse(CANONICAL).expect("valid");
        assert_eq!(serialise_records(&Serialiser::plain(), &parsed.records), CANONICAL);
    }

    #[test]
    fn normalises_non_canonical_layout() {
        let parsed = parse("\n2024-01-01\r\n\t1h  a\r\n\n\n\n2024-01-02\n  -?\n").err();
        assert!(parsed.is_some());

        let parsed = parse("\n2024-01-01\r\n\t1h  a\r\n\n\n\n2024-01-02\n  2h\n").expect("valid");
        assert_eq!(
            serialise_records(&Serialiser::plain(), &parsed.records),
            "2024-01-01\n    1h  a\n\n2024-01-02\n    2h\n"
        );
    }

    #[test]
    fn decimal_renders_minutes() {
        let s = Serialiser::new(FormatOptions {
            colour: false,
            decimal: true,
        });
        assert_eq!(s.duration(Duration::new(1, 30)), "90");
        assert_eq!(s.signed_duration(Duration::new(-1, 0)), "-60");
        let parsed = parse("2024-01-01 (8h!)\n    1h").expect("valid");
        assert_eq!(
            serialise_records(&s, &parsed.records),
            "2024-01-01 (480)\n    60\n"
        );
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let parsed = parse(CANONICAL).expect("valid");
        let text = serialise_records(&Serialiser::plain(), &parsed.records);
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn colour_only_wraps_tokens() {
        colored::control::set_override(true);
        let s = Serialiser::new(FormatOptions {
            colour: true,
            decimal: false,
        });
        let summary = s.summary("fix #bug now");
        assert!(summary.contains('\u{1b}'));
        let stripped = strip_ansi(&summary);
        assert_eq!(stripped, "fix #bug now");
    }

    fn strip_ansi(text: &str) -> String {
        let re = regex::Regex::new("\u{1b}\\[[0-9;]*m").expect("pattern");
        re.replace_all(text, "").into_owned()
    }

    #[test]
    fn renders_syntax_errors_with_carets() {
        let errs = parse("2024-01-01\n\t9:00 - x").expect_err("invalid");
        let out = Serialiser::plain().parse_errors(&errs, None);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "[SYNTAX ERROR] in line 2");
        assert_eq!(lines[2], "     9:00 - x");
        assert_eq!(lines[3], "            ^");
        assert!(lines[4].starts_with("    Malformed entry: Please review"));
    }

    #[test]
    fn reflows_at_word_boundaries() {
        assert_eq!(reflow("aaa bbb ccc", "  ", 9), "  aaa bbb\n  ccc");
        assert_eq!(reflow("", "  ", 9), "");
    }
}
