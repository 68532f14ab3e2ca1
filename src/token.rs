//! Tokens, the currency the tokeniser, expander and control registry all
//! trade in. Grounded on the shape of `scanner::tokens::Token` in the
//! teacher crate (a `token_type` plus `lexeme`/`literal`/location fields),
//! reworked around the five token variants names instead of a single
//! flat struct with an enum tag.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::catcode::CatCode;
use crate::location::Location;
use crate::state::DocumentState;

/// Invoked when the expander pops an [`Token::Internal`] token. Used for
/// teardown hooks, e.g. restoring state once a deferred read completes.
pub type InternalCallback = Rc<dyn Fn(&mut DocumentState)>;

fn noop_callback() -> InternalCallback {
    Rc::new(|_state: &mut DocumentState| {})
}

#[derive(Clone, Serialize, Deserialize)]
pub enum Token {
    /// An ordinary character plus the category it was read under.
    Char { ch: char, catcode: CatCode, loc: Location },
    /// A control sequence name, e.g. `foo` for `\foo`. Its meaning is
    /// resolved by looking it up in the document state at expansion time,
    /// not at tokenisation time.
    Control { name: String, loc: Location },
    /// A category-13 (active) character; resolves like a control named by
    /// the character itself.
    Active { ch: char, loc: Location },
    /// Synthesized at paragraph breaks; never produced directly by the
    /// tokeniser, only pushed back by mode-switching logic.
    Par { loc: Location },
    /// A teardown hook. Compares unequal to everything, including another
    /// `Internal`, since callbacks have no useful notion of equality. The
    /// callback itself never round-trips through serialisation — like a
    /// Whatsit, it degrades to a no-op on deserialisation.
    Internal {
        #[serde(skip, default = "noop_callback")]
        callback: InternalCallback,
        loc: Location,
    },
}

impl Token {
    pub fn location(&self) -> &Location {
        match self {
            Token::Char { loc, .. } => loc,
            Token::Control { loc, .. } => loc,
            Token::Active { loc, .. } => loc,
            Token::Par { loc } => loc,
            Token::Internal { loc, .. } => loc,
        }
    }

    pub fn catcode(&self, state: &DocumentState) -> Option<CatCode> {
        match self {
            Token::Char { catcode, .. } => Some(*catcode),
            Token::Active { .. } => Some(CatCode::Active),
            _ => {
                let _ = state;
                None
            }
        }
    }

    pub fn is_begin_group(&self) -> bool {
        matches!(self, Token::Char { catcode: CatCode::BeginGroup, .. })
    }

    pub fn is_end_group(&self) -> bool {
        matches!(self, Token::Char { catcode: CatCode::EndGroup, .. })
    }

    pub fn is_space(&self) -> bool {
        matches!(self, Token::Char { catcode: CatCode::Space, .. })
    }

    pub fn is_control_or_active(&self) -> bool {
        matches!(self, Token::Control { .. } | Token::Active { .. })
    }

    /// The name a control registry lookup should use: the control's own
    /// name, or — for an active character — a key prefixed with a NUL byte
    /// so it can never collide with a real control sequence name (the
    /// tokeniser never produces one), keeping `~` the active character and
    /// `\~` the control sequence in separate registry slots.
    pub fn control_name(&self) -> Option<String> {
        match self {
            Token::Control { name, .. } => Some(name.clone()),
            Token::Active { ch, .. } => Some(format!("\0{ch}")),
            _ => None,
        }
    }

    /// Constructs a superscript-category character token; used by the
    /// tokeniser's caret-notation guard to avoid infinite
    /// recursion when re-pushing a doubled caret character.
    pub fn superscript(ch: char, loc: Location) -> Token {
        Token::Char { ch, catcode: CatCode::Superscript, loc }
    }

    pub fn space(loc: Location) -> Token {
        Token::Char { ch: ' ', catcode: CatCode::Space, loc }
    }

    pub fn par(loc: Location) -> Token {
        Token::Par { loc }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Char { ch: a, catcode: ca, .. }, Token::Char { ch: b, catcode: cb, .. }) => {
                a == b && ca == cb
            }
            (Token::Control { name: a, .. }, Token::Control { name: b, .. }) => a == b,
            (Token::Active { ch: a, .. }, Token::Active { ch: b, .. }) => a == b,
            (Token::Par { .. }, Token::Par { .. }) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Char { ch, catcode, loc } => {
                write!(f, "Char({ch:?}, {catcode:?} @ {loc})")
            }
            Token::Control { name, loc } => write!(f, "Control(\\{name} @ {loc})"),
            Token::Active { ch, loc } => write!(f, "Active({ch:?} @ {loc})"),
            Token::Par { loc } => write!(f, "Par(@ {loc})"),
            Token::Internal { loc, .. } => write!(f, "Internal(<callback> @ {loc})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::top_level(1, 1)
    }

    #[test]
    fn char_tokens_compare_by_char_and_catcode() {
        let a = Token::Char { ch: 'x', catcode: CatCode::Letter, loc: loc() };
        let b = Token::Char { ch: 'x', catcode: CatCode::Letter, loc: Location::top_level(9, 9) };
        assert_eq!(a, b);
        let c = Token::Char { ch: 'x', catcode: CatCode::Other, loc: loc() };
        assert_ne!(a, c);
    }

    #[test]
    fn internal_tokens_never_compare_equal() {
        let cb: InternalCallback = Rc::new(|_state| {});
        let a = Token::Internal { callback: cb.clone(), loc: loc() };
        let b = Token::Internal { callback: cb, loc: loc() };
        assert_ne!(a, b);
    }

    #[test]
    fn active_control_name_is_distinct_from_a_same_char_control() {
        let active = Token::Active { ch: '~', loc: loc() };
        let control = Token::Control { name: "~".to_string(), loc: loc() };
        assert_ne!(active.control_name(), control.control_name());
    }
}
