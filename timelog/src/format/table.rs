//! Column-aligned tables for terminal output.
//!
//! Cells are added row by row, left to right. Column widths follow the widest
//! cell; ANSI styling does not count towards the width.

use once_cell::sync::Lazy;
use regex::Regex;

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("escape pattern is valid"));

/// Number of characters a cell takes up on screen.
fn visible_width(text: &str) -> usize {
    ANSI_ESCAPE.replace_all(text, "").chars().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
enum Cell {
    Text { text: String, align: Align },
    /// Repeats a character over the whole column width.
    Fill(char),
    Empty,
}

#[derive(Debug, Clone)]
pub struct Table {
    columns: usize,
    separator: &'static str,
    cells: Vec<Cell>,
}

impl Table {
    pub fn new(columns: usize, separator: &'static str) -> Self {
        Self {
            columns: columns.max(1),
            separator,
            cells: Vec::new(),
        }
    }

    pub fn left(&mut self, text: impl Into<String>) -> &mut Self {
        self.cells.push(Cell::Text {
            text: text.into(),
            align: Align::Left,
        });
        self
    }

    pub fn right(&mut self, text: impl Into<String>) -> &mut Self {
        self.cells.push(Cell::Text {
            text: text.into(),
            align: Align::Right,
        });
        self
    }

    pub fn fill(&mut self, c: char) -> &mut Self {
        self.cells.push(Cell::Fill(c));
        self
    }

    pub fn skip(&mut self, n: usize) -> &mut Self {
        self.cells.extend(std::iter::repeat_n(Cell::Empty, n));
        self
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.columns];
        for (i, cell) in self.cells.iter().enumerate() {
            if let Cell::Text { text, .. } = cell {
                let col = i % self.columns;
                widths[col] = widths[col].max(visible_width(text));
            }
        }
        widths
    }

    /// All rows, each ending in `\n`. Trailing whitespace is cut off.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        for row in self.cells.chunks(self.columns) {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| match cell {
                    Cell::Text { text, align } => {
                        let pad = " ".repeat(width.saturating_sub(visible_width(text)));
                        match align {
                            Align::Left => format!("{text}{pad}"),
                            Align::Right => format!("{pad}{text}"),
                        }
                    }
                    Cell::Fill(c) => c.to_string().repeat(width),
                    Cell::Empty => " ".repeat(width),
                })
                .collect();
            out.push_str(line.join(self.separator).trim_end());
            out.push('\n');
        }
        out
    }
}
