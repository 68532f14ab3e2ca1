//! Groups: the scoped-undo mechanism behind `{...}`/`\begingroup`. A group
//! is an ordered sequence of `(field, previous-value)` restore records
//! produced as assignments happen inside it; closing it plays the records
//! back in reverse.

use crate::boxes::Box as TexBox;
use crate::catcode::CatCode;
use crate::control::Control;
use crate::dimen::Dimen;
use crate::glue::Glue;
use crate::modes::ModeKind;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GroupFlavour {
    /// `{` / `}`.
    Ordinary,
    /// `\begingroup` / `\endgroup`.
    SemiSimple,
    /// Restores only the mode on close; every other assignment made while
    /// it is open is routed straight through to the enclosing group.
    OnlyMode,
    /// Collapses into its enclosing group on close: its restore records are
    /// appended to the parent's instead of being applied immediately.
    Ephemeral,
}

/// One field's previous value, captured before an assignment overwrote it.
#[derive(Clone, Debug)]
pub enum RestoreRecord {
    Control { name: String, previous: Option<Control> },
    Count { index: u16, previous: i64 },
    DimenReg { index: u16, previous: Dimen },
    SkipReg { index: u16, previous: Glue },
    MuskipReg { index: u16, previous: Glue },
    ToksReg { index: u16, previous: Vec<Token> },
    BoxReg { index: u16, previous: Option<TexBox> },
    CatCode { ch: char, previous: CatCode },
    CurrentFont { previous: String },
    Mode { previous: ModeKind },
    Parshape { previous: Option<Vec<Dimen>> },
}

impl RestoreRecord {
    pub fn is_mode(&self) -> bool {
        matches!(self, RestoreRecord::Mode { .. })
    }
}

#[derive(Debug)]
pub struct Group {
    pub flavour: GroupFlavour,
    pub records: Vec<RestoreRecord>,
}

impl Group {
    pub fn new(flavour: GroupFlavour) -> Self {
        Group { flavour, records: Vec::new() }
    }
}
