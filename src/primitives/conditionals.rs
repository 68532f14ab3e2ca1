//! The `\if*`/`\else`/`\or`/`\fi` family: evaluates a
//! condition, then either continues reading the live branch in place or
//! skips unexpanded tokens forward to find it, tracking nested
//! conditionals the way TeX's own `\fi`-matching does.

use crate::catcode::CatCode;
use crate::control::Control;
use crate::errors::{EngineError, ParseError, ParseErrorKind, ValueError, ValueErrorKind};
use crate::expander::{Expander, Level};
use crate::location::Location;
use crate::modes::ModeKind;
use crate::numeric;
use crate::state::DocumentState;
use crate::token::Token;

fn runaway(loc: &Location) -> EngineError {
    crate::macros::runaway(loc)
}

fn is_if_name(name: &str) -> bool {
    matches!(
        name,
        "iftrue"
            | "iffalse"
            | "ifnum"
            | "ifdim"
            | "ifodd"
            | "ifcat"
            | "if"
            | "ifx"
            | "ifcase"
            | "ifmmode"
            | "ifhmode"
            | "ifvmode"
            | "ifinner"
            | "ifeof"
            | "ifhbox"
            | "ifvbox"
            | "ifvoid"
    )
}

enum SkipStop {
    Else,
    Or,
    Fi,
}

/// Skips unexpanded tokens forward, tracking nested `\if*`/`\fi` depth,
/// until a `\fi` (or, when `stop_at_or`, an `\or`) at depth 0 is found, or
/// `\else` at depth 0.
fn skip_conditional_text(expander: &mut Expander, state: &mut DocumentState, loc: &Location, stop_at_or: bool) -> Result<SkipStop, EngineError> {
    let mut depth = 0usize;
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
        let Some(name) = tok.control_name() else { continue };
        if is_if_name(&name) {
            depth += 1;
        } else if name == "fi" {
            if depth == 0 {
                return Ok(SkipStop::Fi);
            }
            depth -= 1;
        } else if name == "else" && depth == 0 {
            return Ok(SkipStop::Else);
        } else if name == "or" && depth == 0 && stop_at_or {
            return Ok(SkipStop::Or);
        }
    }
}

/// Used once a branch is known to be finished (its live text has run to
/// `\else`/`\or`): discards everything up to the matching `\fi`, ignoring
/// any `\else`/`\or` separators belonging to branches that are moot now.
fn skip_to_fi(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<(), EngineError> {
    let mut depth = 0usize;
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
        let Some(name) = tok.control_name() else { continue };
        if is_if_name(&name) {
            depth += 1;
        } else if name == "fi" {
            if depth == 0 {
                return Ok(());
            }
            depth -= 1;
        }
    }
}

pub fn invoke(name: &str, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    match name {
        "fi" => {
            state.pop_conditional();
            Ok(None)
        }
        "else" | "or" => {
            skip_to_fi(expander, state, loc)?;
            state.pop_conditional();
            Ok(None)
        }
        "ifcase" => ifcase(expander, state, loc),
        _ => {
            let condition = evaluate_boolean(name, expander, state, loc)?;
            state.push_conditional(condition);
            if condition {
                Ok(None)
            } else {
                match skip_conditional_text(expander, state, loc, false)? {
                    SkipStop::Else => Ok(None),
                    SkipStop::Fi => {
                        state.pop_conditional();
                        Ok(None)
                    }
                    SkipStop::Or => unreachable!("stop_at_or=false never yields Or"),
                }
            }
        }
    }
}

fn ifcase(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let selector = numeric::read_signed_number(expander, state, loc)?;
    if selector < 0 {
        return Err(EngineError::Value(ValueError::new(ValueErrorKind::NegativeIfcaseSelector(selector), loc.clone())));
    }
    state.push_conditional(true);
    let mut remaining = selector;
    loop {
        if remaining == 0 {
            return Ok(None);
        }
        match skip_conditional_text(expander, state, loc, true)? {
            SkipStop::Or => remaining -= 1,
            SkipStop::Else => return Ok(None),
            SkipStop::Fi => {
                state.pop_conditional();
                return Ok(None);
            }
        }
    }
}

fn read_relation(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<char, EngineError> {
    loop {
        match expander.pull(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(Token::Char { ch, .. }) if ch == '<' || ch == '=' || ch == '>' => return Ok(ch),
            _ => return Err(EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber("relation <, = or >".into()), loc.clone()))),
        }
    }
}

fn compare<T: PartialOrd>(rel: char, a: T, b: T) -> bool {
    match rel {
        '<' => a < b,
        '=' => a == b,
        '>' => a > b,
        _ => unreachable!("read_relation only yields <, = or >"),
    }
}

/// The `(char_code, catcode)` signature `\if`/`\ifcat` compare:
/// a control sequence that is not a single active character has no
/// character code of its own, so both map to the same sentinel pair,
/// matching TeXbook's "control sequences are equivalent to character 256,
/// category 16" rule.
fn if_token_signature(tok: &Token) -> (i32, u8) {
    match tok {
        Token::Char { ch, catcode, .. } => (*ch as i32, catcode.as_u8()),
        Token::Active { ch, .. } => (*ch as i32, CatCode::Active.as_u8()),
        _ => (256, 16),
    }
}

fn ifx_equal(a: &Token, b: &Token, state: &DocumentState) -> bool {
    match (a.control_name(), b.control_name()) {
        (Some(na), Some(nb)) => {
            let ca = state.get_control(&na).cloned().unwrap_or(Control::Relax);
            let cb = state.get_control(&nb).cloned().unwrap_or(Control::Relax);
            ca == cb
        }
        (None, None) => a == b,
        _ => false,
    }
}

fn evaluate_boolean(name: &str, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<bool, EngineError> {
    match name {
        "iftrue" => Ok(true),
        "iffalse" => Ok(false),
        "ifnum" => {
            let a = numeric::read_signed_number(expander, state, loc)?;
            let rel = read_relation(expander, state, loc)?;
            let b = numeric::read_signed_number(expander, state, loc)?;
            Ok(compare(rel, a, b))
        }
        "ifdim" => {
            let a = numeric::read_dimen(expander, state, loc)?;
            let rel = read_relation(expander, state, loc)?;
            let b = numeric::read_dimen(expander, state, loc)?;
            Ok(compare(rel, a.sp, b.sp))
        }
        "ifodd" => {
            let n = numeric::read_signed_number(expander, state, loc)?;
            Ok(n % 2 != 0)
        }
        "if" | "ifcat" => {
            let saved = expander.level;
            expander.level = Level::Expanding;
            let a = expander.pull(state);
            let b = if a.is_ok() { expander.pull(state) } else { Ok(None) };
            expander.level = saved;
            let a = a?.ok_or_else(|| runaway(loc))?;
            let b = b?.ok_or_else(|| runaway(loc))?;
            let (ca, cca) = if_token_signature(&a);
            let (cb, ccb) = if_token_signature(&b);
            Ok(if name == "if" { ca == cb } else { cca == ccb })
        }
        "ifx" => {
            let a = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
            let b = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
            Ok(ifx_equal(&a, &b, state))
        }
        "ifvmode" => Ok(state.current_mode().kind.is_vertical()),
        "ifhmode" => Ok(state.current_mode().kind.is_horizontal()),
        "ifmmode" => Ok(state.current_mode().kind.is_math()),
        "ifinner" => Ok(matches!(state.current_mode().kind, ModeKind::InternalVertical | ModeKind::RestrictedHorizontal | ModeKind::Math)),
        // No file I/O is modelled (filesystem access is out of scope), so no
        // stream is ever open and none is ever at end-of-file.
        "ifeof" => {
            let _ = numeric::read_unsigned_number(expander, state, loc)?;
            Ok(false)
        }
        "ifhbox" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(state.get_box(idx).is_some_and(|b| b.is_hbox()))
        }
        "ifvbox" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(state.get_box(idx).is_some_and(|b| b.is_vbox()))
        }
        "ifvoid" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(state.get_box(idx).is_none())
        }
        other => unreachable!("dispatch only routes if-family names here, got {other}"),
    }
}
