//! Line-oriented segmentation of timelog text.
//!
//! A file is a sequence of blocks. Each block holds exactly one run of
//! significant lines together with the blank lines around it: the first block
//! owns the blank lines at the top of the file, every other block owns the
//! blank lines that follow it. Joining the original text of all blocks gives
//! back the input byte for byte.

/// One line of source text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Text without the line ending.
    pub text: String,
    /// 1-based line number within the whole file.
    pub number: usize,
    /// `"\n"`, `"\r\n"`, or empty for a final line without ending.
    pub ending: String,
}

impl Line {
    pub fn new(text: &str, number: usize, ending: &str) -> Self {
        Self {
            text: text.to_string(),
            number,
            ending: ending.to_string(),
        }
    }

    /// The line exactly as it appeared in the file.
    pub fn original(&self) -> String {
        format!("{}{}", self.text, self.ending)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Splits text into lines, keeping each line's ending.
pub fn split_lines(text: &str) -> Vec<Line> {
    text.split_inclusive('\n')
        .enumerate()
        .map(|(i, raw)| {
            let (content, ending) = if let Some(c) = raw.strip_suffix("\r\n") {
                (c, "\r\n")
            } else if let Some(c) = raw.strip_suffix('\n') {
                (c, "\n")
            } else {
                (raw, "")
            };
            Line::new(content, i + 1, ending)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    lines: Vec<Line>,
    first_significant: usize,
    end_significant: usize,
}

impl Block {
    fn from_lines(lines: Vec<Line>) -> Option<Self> {
        let first_significant = lines.iter().position(|l| !l.is_blank())?;
        let end_significant = lines[first_significant..]
            .iter()
            .position(Line::is_blank)
            .map_or(lines.len(), |n| first_significant + n);
        Some(Self {
            lines,
            first_significant,
            end_significant,
        })
    }

    /// All lines, blank ones included.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// The contiguous non-blank lines: headline, summary and entries.
    pub fn significant_lines(&self) -> &[Line] {
        &self.lines[self.first_significant..self.end_significant]
    }

    /// 1-based number of the last significant line.
    pub fn last_significant_number(&self) -> usize {
        self.significant_lines()
            .last()
            .map_or(0, |l| l.number)
    }

    pub fn original_text(&self) -> String {
        self.lines.iter().map(Line::original).collect()
    }
}

/// Groups lines into blocks. Text without any significant line has no blocks.
pub fn scan(text: &str) -> Vec<Block> {
    #[derive(PartialEq)]
    enum Mode {
        Preceding,
        Significant,
        Trailing,
    }

    let mut blocks = Vec::new();
    let mut current = Vec::new();
    let mut mode = Mode::Preceding;

    for line in split_lines(text) {
        let blank = line.is_blank();
        match mode {
            Mode::Preceding if !blank => mode = Mode::Significant,
            Mode::Significant if blank => mode = Mode::Trailing,
            Mode::Trailing if !blank => {
                blocks.extend(Block::from_lines(std::mem::take(&mut current)));
                mode = Mode::Significant;
            }
            _ => {}
        }
        current.push(line);
    }
    if mode != Mode::Preceding {
        blocks.extend(Block::from_lines(current));
    }
    log::trace!("scanned {} block(s)", blocks.len());
    blocks
}
