//! Boxes and their gismo children. A `Box` is a rectangle;
//! a [`Gismo`] is any direct child of one. `HBox`/`VBox` assembly and
//! `fit_to` live in [`crate::layout`]; this module is the data shape only.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::dimen::Dimen;
use crate::glue::Glue;
use crate::layout::FitResult;

/// Which axis a [`Gismo::Leader`] stretches along.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// Invoked when a box containing it is shipped out; shipping out is the
/// output driver's concern (out of scope), so this crate only carries the
/// callback through the tree.
pub type WhatsitCallback = Rc<dyn Fn()>;

fn noop_whatsit() -> WhatsitCallback {
    Rc::new(|| {})
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BoxKind {
    HBox,
    VBox,
    Rule,
    /// A single glyph from a font. `ligature_source` names the original
    /// character sequence a ligature substitution replaced, if any.
    CharBox { font: String, ch: char, ligature_source: Option<String> },
    /// An HBox specialised for consecutive characters from one font;
    /// applies kerning/ligature substitution as characters are appended.
    WordBox { font: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Box {
    pub kind: BoxKind,
    pub width: Dimen,
    pub height: Dimen,
    pub depth: Dimen,
    pub shift: Dimen,
    pub gismos: Vec<Gismo>,
    /// Set by [`crate::layout::fit_to`]; `None` until the box has been fit
    /// to a target size at least once.
    pub fit: Option<FitResult>,
}

impl Box {
    pub fn new(kind: BoxKind) -> Self {
        Box {
            kind,
            width: Dimen::ZERO,
            height: Dimen::ZERO,
            depth: Dimen::ZERO,
            shift: Dimen::ZERO,
            gismos: Vec::new(),
            fit: None,
        }
    }

    pub fn hbox() -> Self {
        Box::new(BoxKind::HBox)
    }

    pub fn vbox() -> Self {
        Box::new(BoxKind::VBox)
    }

    pub fn rule(width: Dimen, height: Dimen, depth: Dimen) -> Self {
        let mut b = Box::new(BoxKind::Rule);
        b.width = width;
        b.height = height;
        b.depth = depth;
        b
    }

    /// The children, excluding synthetic [`Gismo::Breakpoint`] entries.
    pub fn contents(&self) -> Vec<&Gismo> {
        self.gismos.iter().filter(|g| !matches!(g, Gismo::Breakpoint { .. })).collect()
    }

    /// The full child list, including breakpoints.
    pub fn with_breakpoints(&self) -> &[Gismo] {
        &self.gismos
    }

    pub fn is_hbox(&self) -> bool {
        matches!(self.kind, BoxKind::HBox | BoxKind::WordBox { .. })
    }

    pub fn is_vbox(&self) -> bool {
        matches!(self.kind, BoxKind::VBox)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub enum Gismo {
    Box(Box),
    Leader { glue: Glue, direction: Direction },
    Kern(Dimen),
    Penalty(i32),
    /// Three token-free text runs for a hyphenation point: `prebreak`
    /// renders before a chosen break, `postbreak` after it, `nobreak` when
    /// no break is taken here.
    Discretionary { prebreak: Vec<Gismo>, postbreak: Vec<Gismo>, nobreak: Vec<Gismo> },
    MathSwitch,
    /// Never round-trips through serialisation: like a `Token::Internal`
    /// callback, it degrades to a no-op on deserialisation.
    Whatsit(#[serde(skip, default = "noop_whatsit")] WhatsitCallback),
    /// Inserted by `HBox::append` ahead of certain items; never
    /// produced by any primitive directly.
    Breakpoint { penalty: i32 },
}

impl Gismo {
    /// Items that may not themselves be removed from the end of a line
    /// without leaving a dangling break; used when deciding where to insert
    /// a [`Gismo::Breakpoint`].
    pub fn is_discardable(&self) -> bool {
        matches!(self, Gismo::Penalty(_) | Gismo::Kern(_) | Gismo::MathSwitch)
    }

    pub fn natural_length(&self, axis: Direction) -> Dimen {
        match self {
            Gismo::Box(b) => match axis {
                Direction::Horizontal => b.width,
                Direction::Vertical => b.height + b.depth,
            },
            Gismo::Kern(len) => *len,
            Gismo::Leader { .. } | Gismo::Penalty(_) | Gismo::Discretionary { .. } => Dimen::ZERO,
            Gismo::MathSwitch | Gismo::Whatsit(_) | Gismo::Breakpoint { .. } => Dimen::ZERO,
        }
    }
}

impl std::fmt::Debug for Gismo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gismo::Box(b) => f.debug_tuple("Box").field(b).finish(),
            Gismo::Leader { glue, direction } => {
                f.debug_struct("Leader").field("glue", glue).field("direction", direction).finish()
            }
            Gismo::Kern(d) => f.debug_tuple("Kern").field(d).finish(),
            Gismo::Penalty(p) => f.debug_tuple("Penalty").field(p).finish(),
            Gismo::Discretionary { prebreak, postbreak, nobreak } => f
                .debug_struct("Discretionary")
                .field("prebreak", prebreak)
                .field("postbreak", postbreak)
                .field("nobreak", nobreak)
                .finish(),
            Gismo::MathSwitch => write!(f, "MathSwitch"),
            Gismo::Whatsit(_) => f.debug_tuple("Whatsit").field(&"..").finish(),
            Gismo::Breakpoint { penalty } => f.debug_struct("Breakpoint").field("penalty", penalty).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_excludes_breakpoints_but_with_breakpoints_keeps_them() {
        let mut b = Box::hbox();
        b.gismos.push(Gismo::Kern(Dimen::from_pt(1.0)));
        b.gismos.push(Gismo::Breakpoint { penalty: 0 });
        b.gismos.push(Gismo::Kern(Dimen::from_pt(2.0)));

        assert_eq!(b.contents().len(), 2);
        assert_eq!(b.with_breakpoints().len(), 3);
    }

    #[test]
    fn penalty_and_kern_are_discardable() {
        assert!(Gismo::Penalty(50).is_discardable());
        assert!(Gismo::Kern(Dimen::ZERO).is_discardable());
        assert!(!Gismo::Box(Box::hbox()).is_discardable());
    }
}
