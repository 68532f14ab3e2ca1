//! Source positions, attached to every [`crate::token::Token`] for diagnostics.

use serde::{Deserialize, Serialize};

/// A position in a source file, used to point diagnostics at the offending
/// character. `file` is the include stack at the time the position was
/// recorded: empty for the top-level file, otherwise the chain of
/// `\input`-like includes, innermost last.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Location {
    pub line: usize, // 1-indexed
    pub col: usize,  // 1-indexed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub file: Vec<String>,
}

impl Default for Location {
    fn default() -> Self {
        Location {
            line: 1,
            col: 1,
            file: vec![],
        }
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.file.len() == other.file.len() {
            if self.line == other.line {
                self.col.cmp(&other.col)
            } else {
                self.line.cmp(&other.line)
            }
        } else {
            self.file.len().cmp(&other.file.len())
        }
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Location {
    pub fn new(line: usize, col: usize, file: Vec<String>) -> Self {
        Location { line, col, file }
    }

    pub fn top_level(line: usize, col: usize) -> Self {
        Location::new(line, col, vec![])
    }

    /// The innermost file name, if this location is inside an include.
    pub fn current_file(&self) -> Option<&str> {
        self.file.last().map(String::as_str)
    }

    pub fn advance_col(&self, by: usize) -> Self {
        Location {
            line: self.line,
            col: self.col + by,
            file: self.file.clone(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.file.last() {
            Some(name) => write!(f, "{}:{}:{}", name, self.line, self.col),
            None => write!(f, "{}:{}", self.line, self.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_file_depth_first() {
        let top = Location::top_level(5, 1);
        let nested = Location::new(1, 1, vec!["included.tex".into()]);
        assert!(top < nested);
    }

    #[test]
    fn orders_by_line_then_col() {
        let a = Location::top_level(1, 5);
        let b = Location::top_level(2, 1);
        assert!(a < b);
        let c = Location::top_level(1, 9);
        assert!(a < c);
    }

    #[test]
    fn display_includes_filename_when_present() {
        let loc = Location::new(3, 4, vec!["chapter.tex".into()]);
        assert_eq!(loc.to_string(), "chapter.tex:3:4");
    }
}
