//! The sixteen category codes and the mutable table that maps a
//! character to its catcode. The table lives in [`crate::state::DocumentState`]
//! so that `\catcode` assignments participate in group scoping; this module
//! only defines the enum and the TeX-default seed table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum CatCode {
    Escape = 0,
    BeginGroup = 1,
    EndGroup = 2,
    MathShift = 3,
    AlignmentTab = 4,
    EndOfLine = 5,
    Parameter = 6,
    Superscript = 7,
    Subscript = 8,
    Ignored = 9,
    Space = 10,
    Letter = 11,
    Other = 12,
    Active = 13,
    Comment = 14,
    Invalid = 15,
}

impl CatCode {
    pub fn from_u8(n: u8) -> Option<CatCode> {
        use CatCode::*;
        Some(match n {
            0 => Escape,
            1 => BeginGroup,
            2 => EndGroup,
            3 => MathShift,
            4 => AlignmentTab,
            5 => EndOfLine,
            6 => Parameter,
            7 => Superscript,
            8 => Subscript,
            9 => Ignored,
            10 => Space,
            11 => Letter,
            12 => Other,
            13 => Active,
            14 => Comment,
            15 => Invalid,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A per-character catcode table. Reads default to [`CatCode::Other`] for
/// characters that were never assigned, except for the handful of
/// TeX-standard defaults seeded in [`CatCodeTable::plain`].
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CatCodeTable {
    table: HashMap<char, CatCode>,
}

impl CatCodeTable {
    /// An empty table: every character is [`CatCode::Other`] except the ones
    /// a Tokeniser cannot function without (escape, begin/end-group,
    /// end-of-line, space). Used as the innermost fallback; `plain` is the
    /// table actually installed at startup.
    pub fn bare() -> Self {
        let mut table = HashMap::new();
        table.insert('\\', CatCode::Escape);
        table.insert('{', CatCode::BeginGroup);
        table.insert('}', CatCode::EndGroup);
        table.insert('\n', CatCode::EndOfLine);
        table.insert(' ', CatCode::Space);
        CatCodeTable { table }
    }

    /// The standard "plain TeX" seed table: letters, the math/alignment/
    /// parameter/superscript/subscript specials, and `~` active.
    pub fn plain() -> Self {
        let mut t = CatCodeTable::bare();
        t.set('$', CatCode::MathShift);
        t.set('&', CatCode::AlignmentTab);
        t.set('#', CatCode::Parameter);
        t.set('^', CatCode::Superscript);
        t.set('_', CatCode::Subscript);
        t.set('\0', CatCode::Ignored);
        for c in 'a'..='z' {
            t.set(c, CatCode::Letter);
        }
        for c in 'A'..='Z' {
            t.set(c, CatCode::Letter);
        }
        t.set('~', CatCode::Active);
        t.set('%', CatCode::Comment);
        t.set('\u{7f}', CatCode::Invalid);
        t
    }

    pub fn get(&self, c: char) -> CatCode {
        self.table.get(&c).copied().unwrap_or(CatCode::Other)
    }

    pub fn set(&mut self, c: char, code: CatCode) {
        self.table.insert(c, code);
    }
}

impl Default for CatCodeTable {
    fn default() -> Self {
        CatCodeTable::plain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::backslash('\\', CatCode::Escape)]
    #[case::open_brace('{', CatCode::BeginGroup)]
    #[case::close_brace('}', CatCode::EndGroup)]
    #[case::dollar('$', CatCode::MathShift)]
    #[case::ampersand('&', CatCode::AlignmentTab)]
    #[case::hash('#', CatCode::Parameter)]
    #[case::caret('^', CatCode::Superscript)]
    #[case::underscore('_', CatCode::Subscript)]
    #[case::space(' ', CatCode::Space)]
    #[case::letter('q', CatCode::Letter)]
    #[case::digit('5', CatCode::Other)]
    #[case::tilde('~', CatCode::Active)]
    #[case::percent('%', CatCode::Comment)]
    fn plain_table_matches_tex_defaults(#[case] c: char, #[case] expected: CatCode) {
        assert_eq!(CatCodeTable::plain().get(c), expected);
    }

    #[test]
    fn unassigned_chars_default_to_other() {
        assert_eq!(CatCodeTable::plain().get('@'), CatCode::Other);
    }

    #[test]
    fn mutation_is_local_to_the_table_instance() {
        let mut t = CatCodeTable::plain();
        t.set(';', CatCode::Comment);
        assert_eq!(t.get(';'), CatCode::Comment);
        assert_eq!(CatCodeTable::plain().get(';'), CatCode::Other);
    }
}
