use std::{collections::HashSet, fmt, str::FromStr};

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use super::DomainError;

pub(crate) static HASH_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"#([\p{L}\d_-]+)(=(("[^"]*")|('[^']*')|([\p{L}\d_-]*)))?"#)
        .expect("tag pattern is valid")
});

static UNQUOTED_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\d_-]+$").expect("value pattern is valid"));

/* --------------------------------- Tags --------------------------------- */

/// `#name` or `#name=value`. Names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    name: String,
    value: Option<String>,
}

impl Tag {
    pub fn new(name: &str, value: Option<&str>) -> Result<Self, DomainError> {
        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '-');
        if !valid_name {
            return Err(DomainError::InvalidTag);
        }
        Ok(Self {
            name: name.to_string(),
            value: value.filter(|v| !v.is_empty()).map(str::to_string),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The same tag without its value.
    pub fn name_only(&self) -> Tag {
        Tag {
            name: self.name.clone(),
            value: None,
        }
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Tag> {
        let name = caps.get(1)?.as_str().to_string();
        let quoted = caps.get(4).is_some() || caps.get(5).is_some();
        let value = caps
            .get(3)
            .map(|m| {
                let v = m.as_str();
                if quoted { &v[1..v.len() - 1] } else { v }
            })
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Some(Tag { name, value })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name)?;
        match &self.value {
            None => Ok(()),
            Some(v) if UNQUOTED_VALUE.is_match(v) => write!(f, "={v}"),
            Some(v) if v.contains('"') => write!(f, "='{v}'"),
            Some(v) => write!(f, "=\"{v}\""),
        }
    }
}

impl FromStr for Tag {
    type Err = DomainError;

    /// Accepts `name`, `#name`, `name=value` and `#name=value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = if s.starts_with('#') {
            s.to_string()
        } else {
            format!("#{s}")
        };
        let caps = HASH_TAG.captures(&text).ok_or(DomainError::InvalidTag)?;
        let whole = caps.get(0).ok_or(DomainError::InvalidTag)?;
        if whole.start() != 0 || whole.end() != text.len() {
            return Err(DomainError::InvalidTag);
        }
        Tag::from_captures(&caps).ok_or(DomainError::InvalidTag)
    }
}

/// Tags in the order they were written, plus a lookup that also knows every
/// tag by its bare name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    original: Vec<Tag>,
    lookup: IndexSet<Tag>,
}

impl TagSet {
    pub fn from_text(text: &str) -> Self {
        let mut set = Self::default();
        for caps in HASH_TAG.captures_iter(text) {
            if let Some(tag) = Tag::from_captures(&caps) {
                set.insert(tag);
            }
        }
        set
    }

    pub fn insert(&mut self, tag: Tag) {
        self.lookup.insert(tag.name_only());
        self.lookup.insert(tag.clone());
        self.original.push(tag);
    }

    /// `#name` matches any value of `name`; `#name=value` only that value.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.lookup.contains(tag)
    }

    pub fn contains_all<'a>(&self, tags: impl IntoIterator<Item = &'a Tag>) -> bool {
        tags.into_iter().all(|t| self.contains(t))
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Tags as written.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.original.iter()
    }

    /// Tags as written, first occurrence only.
    pub fn unique(&self) -> impl Iterator<Item = &Tag> {
        let mut seen = HashSet::new();
        self.original.iter().filter(move |t| seen.insert(*t))
    }

    /// Every distinct tag, including the bare-name form of valued tags.
    pub fn distinct(&self) -> impl Iterator<Item = &Tag> {
        self.lookup.iter()
    }

    pub fn merge(&self, other: &TagSet) -> TagSet {
        let mut merged = self.clone();
        for tag in other.iter() {
            merged.insert(tag.clone());
        }
        merged
    }
}

/* ------------------------------- Summaries ------------------------------- */

fn starts_with_whitespace(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_whitespace)
}

/// Free text below a record's headline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSummary(Vec<String>);

impl RecordSummary {
    pub fn new(lines: Vec<String>) -> Result<Self, DomainError> {
        if lines
            .iter()
            .any(|l| l.trim().is_empty() || starts_with_whitespace(l))
        {
            return Err(DomainError::MalformedSummary);
        }
        Ok(Self(lines))
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tags(&self) -> TagSet {
        TagSet::from_text(&self.0.join("\n"))
    }
}

/// Free text following an entry value. The first line may be empty when the
/// text starts on a continuation line.
#[derive(Debug, Clone, Default, Eq)]
pub struct EntrySummary(Vec<String>);

impl EntrySummary {
    pub fn new(lines: Vec<String>) -> Result<Self, DomainError> {
        if lines.iter().skip(1).any(|l| l.trim().is_empty()) {
            return Err(DomainError::MalformedSummary);
        }
        Ok(Self(lines))
    }

    pub fn from_line(line: &str) -> Self {
        if line.is_empty() {
            Self::default()
        } else {
            Self(vec![line.to_string()])
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|l| l.is_empty())
    }

    /// Lines the entry occupies in a file, value line included.
    pub fn line_count(&self) -> usize {
        self.0.len().max(1)
    }

    /// Appends text to the last line, space-separated.
    pub fn append(&mut self, text: &str) {
        match self.0.last_mut() {
            Some(last) if !last.is_empty() => {
                last.push(' ');
                last.push_str(text);
            }
            Some(last) => last.push_str(text),
            None => self.0.push(text.to_string()),
        }
    }

    pub fn tags(&self) -> TagSet {
        TagSet::from_text(&self.0.join("\n"))
    }
}

impl PartialEq for EntrySummary {
    fn eq(&self, other: &Self) -> bool {
        (self.is_empty() && other.is_empty()) || self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tag(text: &str) -> Tag {
        text.parse().expect("valid tag")
    }

    #[test]
    fn extracts_tags_in_order() {
        let set = TagSet::from_text("Meeting #work with #client=\"ACME Inc\" and #ticket=42.");
        let rendered: Vec<String> = set.iter().map(Tag::to_string).collect();
        assert_eq!(rendered, vec!["#work", "#client=\"ACME Inc\"", "#ticket=42"]);
    }

    #[rstest]
    #[case("#work", true)]
    #[case("#client", true)]
    #[case("#client=acme", true)]
    #[case("#client=other", false)]
    #[case("#Work", false)]
    #[case("#home", false)]
    fn contains_matches_by_name_or_exact_value(#[case] query: &str, #[case] expected: bool) {
        let set = TagSet::from_text("#work #client=acme");
        assert_eq!(set.contains(&tag(query)), expected);
    }

    #[test]
    fn distinct_includes_bare_names_once() {
        let set = TagSet::from_text("#a=1 #a=2 #a #b");
        let distinct: Vec<String> = set.distinct().map(Tag::to_string).collect();
        assert_eq!(distinct, vec!["#a", "#a=1", "#a=2", "#b"]);
    }

    #[test]
    fn unique_keeps_written_order_without_repeats() {
        let set = TagSet::from_text("#b #a=1 #b #a #a=1");
        let unique: Vec<String> = set.unique().map(Tag::to_string).collect();
        assert_eq!(unique, vec!["#b", "#a=1", "#a"]);
    }

    #[rstest]
    #[case("work")]
    #[case("#work=")]
    #[case("#x='it\"s'")]
    fn parses_tag_queries(#[case] text: &str) {
        assert!(text.parse::<Tag>().is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("#")]
    #[case("#a b")]
    fn rejects_bad_tag_queries(#[case] text: &str) {
        assert_eq!(text.parse::<Tag>(), Err(DomainError::InvalidTag));
    }

    #[test]
    fn record_summary_rejects_blank_or_indented_lines() {
        assert!(RecordSummary::new(vec!["Ok".into()]).is_ok());
        assert_eq!(
            RecordSummary::new(vec![" indented".into()]),
            Err(DomainError::MalformedSummary)
        );
        assert_eq!(
            RecordSummary::new(vec!["".into()]),
            Err(DomainError::MalformedSummary)
        );
    }

    #[test]
    fn entry_summary_may_start_on_a_continuation_line() {
        let mut s = EntrySummary::new(vec!["".into(), "second".into()]).expect("summary");
        assert_eq!(s.line_count(), 2);
        s.append("more");
        assert_eq!(s.lines(), &["".to_string(), "second more".to_string()]);
        assert_eq!(
            EntrySummary::new(vec!["a".into(), "  ".into()]),
            Err(DomainError::MalformedSummary)
        );
        assert_eq!(EntrySummary::from_line(""), EntrySummary::default());
    }
}
