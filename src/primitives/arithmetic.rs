//! `\advance`/`\multiply`/`\divide`: read a register reference,
//! an optional `by` keyword, then a value of the matching kind, combined
//! with [`crate::glue::Glue`]'s component-wise arithmetic.

use crate::control::Control;
use crate::dimen::Dimen;
use crate::errors::{ControlError, ControlErrorKind, EngineError, ParseError, ParseErrorKind, ValueError};
use crate::expander::Expander;
use crate::glue::Glue;
use crate::location::Location;
use crate::numeric;
use crate::registers::RegisterBlock;
use crate::state::DocumentState;
use crate::token::Token;

/// The register an arithmetic primitive targets: a direct `\countN` /
/// `\dimenN` / `\skipN` / `\muskipN` reference, or a `\countdef`-bound
/// alias resolving to the same.
enum Target {
    Count(u16),
    Dimen(u16),
    Skip(u16),
    Muskip(u16),
}

fn read_target(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Target, EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| crate::macros::runaway(loc))?;
    let name = tok
        .control_name()
        .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::PrefixMismatch, loc.clone())))?;

    if let Some(Control::Register(r)) = state.get_control(&name).map(|c| c.resolved().clone()) {
        return Ok(match r.block {
            RegisterBlock::Count => Target::Count(r.index),
            RegisterBlock::Dimen => Target::Dimen(r.index),
            RegisterBlock::Skip => Target::Skip(r.index),
            RegisterBlock::Muskip => Target::Muskip(r.index),
            RegisterBlock::Box | RegisterBlock::Toks => {
                return Err(EngineError::Control(ControlError::new(ControlErrorKind::TheNotFound, loc.clone())));
            }
        });
    }

    match name.as_str() {
        "count" => Ok(Target::Count(numeric::read_unsigned_number(expander, state, loc)? as u16)),
        "dimen" => Ok(Target::Dimen(numeric::read_unsigned_number(expander, state, loc)? as u16)),
        "skip" => Ok(Target::Skip(numeric::read_unsigned_number(expander, state, loc)? as u16)),
        "muskip" => Ok(Target::Muskip(numeric::read_unsigned_number(expander, state, loc)? as u16)),
        _ => Err(EngineError::Control(ControlError::new(ControlErrorKind::TheNotFound, loc.clone()))),
    }
}

/// Consumes an optional `by` keyword (with surrounding spaces), which real
/// TeX accepts but does not require.
fn skip_optional_by(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<(), EngineError> {
    loop {
        match expander.pull_raw(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(Token::Char { ch, .. }) if ch.to_ascii_lowercase() == 'b' => {
                let next = expander.pull_raw(state)?;
                match next {
                    Some(Token::Char { ch: y, .. }) if y.to_ascii_lowercase() == 'y' => return Ok(()),
                    Some(other) => {
                        expander.push_back(vec![Token::Char { ch, catcode: crate::catcode::CatCode::Letter, loc: loc.clone() }, other]);
                        return Ok(());
                    }
                    None => {
                        expander.push_back(vec![Token::Char { ch, catcode: crate::catcode::CatCode::Letter, loc: loc.clone() }]);
                        return Ok(());
                    }
                }
            }
            Some(tok) => {
                expander.push_back(vec![tok]);
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}

pub fn invoke(name: &str, global: bool, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let target = read_target(expander, state, loc)?;
    skip_optional_by(expander, state, loc)?;

    match name {
        "advance" => advance(target, global, expander, state, loc),
        "multiply" => scale(target, global, expander, state, loc, true),
        "divide" => scale(target, global, expander, state, loc, false),
        _ => unreachable!("dispatch only routes advance/multiply/divide here"),
    }
}

fn advance(target: Target, global: bool, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    match target {
        Target::Count(i) => {
            let delta = numeric::read_signed_number(expander, state, loc)?;
            let value = state.count(i) + delta;
            if global { state.set_count_global(i, value) } else { state.set_count(i, value) }
        }
        Target::Dimen(i) => {
            let delta = numeric::read_dimen(expander, state, loc)?;
            let value = state.dimen(i).checked_add(delta);
            if global { state.set_dimen_global(i, value) } else { state.set_dimen(i, value) }
        }
        Target::Skip(i) => {
            let delta = numeric::read_glue(expander, state, loc)?;
            let sum = combine(state.skip(i), delta, loc)?;
            if global { state.set_skip_global(i, sum) } else { state.set_skip(i, sum) }
        }
        Target::Muskip(i) => {
            let delta = numeric::read_glue(expander, state, loc)?;
            let sum = combine(state.muskip(i), delta, loc)?;
            if global { state.set_muskip_global(i, sum) } else { state.set_muskip(i, sum) }
        }
    }
    Ok(None)
}

fn combine(a: Glue, b: Glue, loc: &Location) -> Result<Glue, EngineError> {
    a.checked_add(b).map_err(|k| EngineError::Value(ValueError::new(k, loc.clone())))
}

fn scale(
    target: Target,
    global: bool,
    expander: &mut Expander,
    state: &mut DocumentState,
    loc: &Location,
    multiply: bool,
) -> Result<Option<Vec<Token>>, EngineError> {
    let factor = numeric::read_signed_number(expander, state, loc)?;
    if !multiply && factor == 0 {
        return Err(EngineError::Value(ValueError::new(crate::errors::ValueErrorKind::DivisionByZero, loc.clone())));
    }
    let apply_i64 = |v: i64| if multiply { v * factor } else { v / factor };
    let apply_dimen = |d: Dimen| if multiply { d.scaled_by(factor as f64) } else { Dimen::from_sp(d.sp / factor) };
    let apply_glue = |g: Glue| if multiply { g.scaled_by(factor as f64) } else { g.divided_by(factor).unwrap_or(g) };

    match target {
        Target::Count(i) => {
            let value = apply_i64(state.count(i));
            if global { state.set_count_global(i, value) } else { state.set_count(i, value) }
        }
        Target::Dimen(i) => {
            let value = apply_dimen(state.dimen(i));
            if global { state.set_dimen_global(i, value) } else { state.set_dimen(i, value) }
        }
        Target::Skip(i) => {
            let value = apply_glue(state.skip(i));
            if global { state.set_skip_global(i, value) } else { state.set_skip(i, value) }
        }
        Target::Muskip(i) => {
            let value = apply_glue(state.muskip(i));
            if global { state.set_muskip_global(i, value) } else { state.set_muskip(i, value) }
        }
    }
    Ok(None)
}
