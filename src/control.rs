//! The "meaning" of a control name: a sealed enum rather than a class
//! hierarchy with runtime dispatch, so every kind of meaning a control can
//! have is enumerated in one place and matched exhaustively at the call site.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::registers::RegisterBlock;
use crate::token::Token;

/// Capability flags a [`Control`] exposes to the expander.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Capabilities {
    pub is_expandable: bool,
    pub takes_tokens_as_args: bool,
    pub is_outer: bool,
    pub is_long: bool,
}

/// One primitive built-in command, identified by name. The actual behaviour
/// lives in `crate::primitives`, dispatched by name through
/// [`crate::primitives::invoke`]; this variant just marks "this name is a
/// primitive" and carries its static capabilities.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PrimitiveMeaning {
    pub name: &'static str,
    pub expandable: bool,
}

/// A user-defined macro (`\def`/`\edef`/`\gdef`/`\xdef`).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct UserMacro {
    /// Tokens with parameter markers `#1..#9` interleaved with literal
    /// delimiter tokens.
    pub param_template: Vec<ParamTemplateItem>,
    /// Tokens of the body; `#k` entries are substituted with the matching
    /// captured argument at call time.
    pub replacement: Vec<ReplacementItem>,
    pub long: bool,
    pub outer: bool,
    /// True for `\edef`/`\xdef`: the replacement was expanded once, at
    /// definition time, and is stored already-expanded.
    pub expanded_at_definition: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum ParamTemplateItem {
    Literal(Token),
    Param(u8),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum ReplacementItem {
    Literal(Token),
    Param(u8),
}

/// A (block, index) pair bound by `\countdef`/`\dimendef`/`\skipdef`/
/// `\muskipdef`/`\toksdef`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RegisterRef {
    pub block: RegisterBlock,
    pub index: u16,
}

#[derive(Clone, Debug)]
pub enum Control {
    Primitive(PrimitiveMeaning),
    Macro(Rc<UserMacro>),
    /// Points at the meaning another name had at the moment of the `\let`.
    /// Stored as a fully resolved `Control` rather than a name, so that
    /// later redefining the aliased name does not retroactively change what
    /// the alias means (matches TeXbook p206's let-chaining example).
    LetAlias(Rc<Control>),
    /// `\let`-aliasing directly to a literal token (e.g. `\let\x=a`).
    LetToken(Token),
    /// `\chardef`/`\mathchardef`: resolves to a literal character / math
    /// character code.
    Chardef(u32),
    Register(RegisterRef),
    /// The special "undefined, but exists" meaning `\csname` creates.
    Relax,
    /// Bound by `\font\cs=name...`: invoking the control selects `name` as
    /// the current font.
    FontSelector(String),
}

impl Control {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Control::Primitive(p) => Capabilities { is_expandable: p.expandable, ..Default::default() },
            Control::Macro(m) => Capabilities {
                is_expandable: true,
                takes_tokens_as_args: true,
                is_outer: m.outer,
                is_long: m.long,
            },
            Control::LetAlias(inner) => inner.capabilities(),
            Control::LetToken(_) => Capabilities::default(),
            Control::Chardef(_) => Capabilities::default(),
            Control::Register(_) => Capabilities::default(),
            Control::Relax => Capabilities::default(),
            Control::FontSelector(_) => Capabilities::default(),
        }
    }

    /// Follows `LetAlias` chains to the underlying non-alias meaning, the
    /// way `\ifx` must compare meanings structurally rather than by alias
    /// identity.
    pub fn resolved(&self) -> &Control {
        match self {
            Control::LetAlias(inner) => inner.resolved(),
            other => other,
        }
    }
}

impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        match (self.resolved(), other.resolved()) {
            (Control::Primitive(a), Control::Primitive(b)) => a == b,
            (Control::Macro(a), Control::Macro(b)) => a == b,
            (Control::LetToken(a), Control::LetToken(b)) => a == b,
            (Control::Chardef(a), Control::Chardef(b)) => a == b,
            (Control::Register(a), Control::Register(b)) => a == b,
            (Control::Relax, Control::Relax) => true,
            (Control::FontSelector(a), Control::FontSelector(b)) => a == b,
            _ => false,
        }
    }
}

/// The wire shape for a [`Control`]: primitives serialise by name, a macro
/// by its full structural content (param template, replacement, flags), and
/// every other variant by the small amount of data that defines it.
/// `LetAlias` never appears here — [`Control::resolved`] strips it before
/// either direction touches this type, so an alias round-trips as whatever
/// it was pointing at, not as an alias.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind")]
enum Wire {
    Primitive { name: String },
    Macro { param_template: Vec<ParamTemplateItem>, replacement: Vec<ReplacementItem>, long: bool, outer: bool, expanded_at_definition: bool },
    Chardef { code: u32 },
    Register { block: RegisterBlock, index: u16 },
    Relax,
    LetToken { token: Token },
    FontSelector { name: String },
}

impl Serialize for Control {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.resolved() {
            Control::Primitive(p) => Wire::Primitive { name: p.name.to_string() },
            Control::Macro(m) => Wire::Macro {
                param_template: m.param_template.clone(),
                replacement: m.replacement.clone(),
                long: m.long,
                outer: m.outer,
                expanded_at_definition: m.expanded_at_definition,
            },
            Control::Chardef(c) => Wire::Chardef { code: *c },
            Control::Register(r) => Wire::Register { block: r.block, index: r.index },
            Control::Relax => Wire::Relax,
            Control::LetToken(tok) => Wire::LetToken { token: tok.clone() },
            Control::FontSelector(name) => Wire::FontSelector { name: name.clone() },
            Control::LetAlias(_) => unreachable!("resolved() strips LetAlias"),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Control {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::deserialize(deserializer)?;
        Ok(match wire {
            Wire::Primitive { name } => {
                let meaning = crate::primitives::lookup_primitive(&name)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown primitive \\{name}")))?;
                Control::Primitive(meaning)
            }
            Wire::Macro { param_template, replacement, long, outer, expanded_at_definition } => {
                Control::Macro(Rc::new(UserMacro { param_template, replacement, long, outer, expanded_at_definition }))
            }
            Wire::Chardef { code } => Control::Chardef(code),
            Wire::Register { block, index } => Control::Register(RegisterRef { block, index }),
            Wire::Relax => Control::Relax,
            Wire::LetToken { token } => Control::LetToken(token),
            Wire::FontSelector { name } => Control::FontSelector(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_alias_resolves_through_chain() {
        let base = Control::Relax;
        let once = Control::LetAlias(Rc::new(base));
        let twice = Control::LetAlias(Rc::new(once));
        assert!(matches!(twice.resolved(), Control::Relax));
    }

    #[test]
    fn equality_follows_resolved_meaning() {
        let base = Rc::new(Control::Chardef(65));
        let alias = Control::LetAlias(base.clone());
        assert_eq!(alias, Control::Chardef(65));
    }
}
