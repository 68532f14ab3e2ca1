//! `\def` and its relatives: parameter templates, replacement
//! bodies, `\let`/`\futurelet`, the register-alias `def`s, `\the`,
//! `\expandafter`/`\noexpand`, `\csname`, `\string`, case conversion and
//! `\catcode`. Grounded on the delimiter/group-depth style already
//! established in `crate::macros`.

use std::rc::Rc;

use crate::catcode::CatCode;
use crate::control::{Control, ParamTemplateItem, ReplacementItem, RegisterRef, UserMacro};
use crate::errors::{ControlError, ControlErrorKind, EngineError, ParseError, ParseErrorKind};
use crate::expander::{Expander, Level};
use crate::location::Location;
use crate::numeric;
use crate::numeric_text::{dimen_tokens, glue_tokens, number_tokens, string_to_tokens};
use crate::registers::RegisterBlock;
use crate::state::DocumentState;
use crate::token::Token;

fn runaway(loc: &Location) -> EngineError {
    crate::macros::runaway(loc)
}

fn expect_control_name(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<String, EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    tok.control_name()
        .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::PrefixMismatch, loc.clone())))
}

/// Consumes an optional `=` (with optional surrounding spaces), the way
/// `\chardef`/`\countdef`/`\catcode`-family assignments accept but do not
/// require one.
pub(crate) fn skip_optional_equals(expander: &mut Expander, state: &mut DocumentState) -> Result<(), EngineError> {
    loop {
        match expander.pull_raw(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(Token::Char { ch: '=', .. }) => return Ok(()),
            Some(tok) => {
                expander.push_back(vec![tok]);
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}

/// Entry point for definition-family primitives invoked directly, with no
/// `\global`/`\long`/`\outer` prefix active.
pub fn invoke(name: &str, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    invoke_with_prefix(name, false, false, false, expander, state, loc)
}

/// Handles `\global`/`\long`/`\outer` themselves: each reads the next
/// control token, accumulating modifier flags, until it lands on a
/// non-prefix primitive to apply them to (real TeX's "prefixed command").
pub fn invoke_with_prefix_entry(name: &str, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let mut global = name == "global";
    let mut long = name == "long";
    let mut outer = name == "outer";
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
        let next_name = tok
            .control_name()
            .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::PrefixMismatch, loc.clone())))?;
        match next_name.as_str() {
            "global" => global = true,
            "long" => long = true,
            "outer" => outer = true,
            other => return invoke_with_prefix(other, global, long, outer, expander, state, loc),
        }
    }
}

pub fn invoke_with_prefix(
    name: &str,
    global: bool,
    long: bool,
    outer: bool,
    expander: &mut Expander,
    state: &mut DocumentState,
    loc: &Location,
) -> Result<Option<Vec<Token>>, EngineError> {
    match name {
        "def" | "edef" | "gdef" | "xdef" => {
            let global = global || name == "gdef" || name == "xdef";
            let expand = name == "edef" || name == "xdef";
            let cs_name = expect_control_name(expander, state, loc)?;
            let template = read_param_template(expander, state, loc)?;
            let param_count = template.iter().fold(0u8, |m, item| match item {
                ParamTemplateItem::Param(k) => m.max(*k),
                ParamTemplateItem::Literal(_) => m,
            });
            let replacement = read_replacement_body(expander, state, loc, expand, param_count)?;
            let mac = Control::Macro(Rc::new(UserMacro {
                param_template: template,
                replacement,
                long,
                outer,
                expanded_at_definition: expand,
            }));
            bind(state, cs_name, mac, global);
            Ok(None)
        }
        "let" => invoke_let(global, expander, state, loc),
        "futurelet" => invoke_futurelet(global, expander, state, loc),
        "chardef" | "mathchardef" => {
            let cs_name = expect_control_name(expander, state, loc)?;
            skip_optional_equals(expander, state)?;
            let code = numeric::read_unsigned_number(expander, state, loc)?;
            bind(state, cs_name, Control::Chardef(code as u32), global);
            Ok(None)
        }
        "countdef" | "dimendef" | "skipdef" | "muskipdef" | "toksdef" => {
            let block = match name {
                "countdef" => RegisterBlock::Count,
                "dimendef" => RegisterBlock::Dimen,
                "skipdef" => RegisterBlock::Skip,
                "muskipdef" => RegisterBlock::Muskip,
                "toksdef" => RegisterBlock::Toks,
                _ => unreachable!(),
            };
            let cs_name = expect_control_name(expander, state, loc)?;
            skip_optional_equals(expander, state)?;
            let index = numeric::read_unsigned_number(expander, state, loc)? as u16;
            bind(state, cs_name, Control::Register(RegisterRef { block, index }), global);
            Ok(None)
        }
        "the" => the_tokens(expander, state, loc).map(Some),
        "expandafter" => expandafter(expander, state, loc),
        "noexpand" => noexpand(expander, state, loc),
        "csname" => csname(expander, state, loc),
        "endcsname" => Err(EngineError::Control(ControlError::new(ControlErrorKind::EndcsnameWithoutCsname, loc.clone()))),
        "string" => string_primitive(expander, state, loc),
        "uppercase" | "lowercase" => case_convert(name == "uppercase", expander, state, loc),
        "catcode" => {
            let code = numeric::read_unsigned_number(expander, state, loc)? as u32;
            skip_optional_equals(expander, state)?;
            let cat_num = numeric::read_unsigned_number(expander, state, loc)?;
            let cat = CatCode::from_u8(cat_num as u8)
                .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::UnknownCategory(cat_num as u8), loc.clone())))?;
            let ch = char::from_u32(code).unwrap_or('\u{FFFD}');
            if global {
                state.set_catcode_global(ch, cat);
            } else {
                state.set_catcode(ch, cat);
            }
            Ok(None)
        }
        other => crate::primitives::dispatch_primitive_ignoring_prefix(other, global, expander, state, loc),
    }
}

fn bind(state: &mut DocumentState, name: String, control: Control, global: bool) {
    if global {
        state.set_control_global(name, control);
    } else {
        state.set_control(name, control);
    }
}

fn read_param_template(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Vec<ParamTemplateItem>, EngineError> {
    let mut items = Vec::new();
    let mut next_param = 1u8;
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
        if tok.is_begin_group() {
            return Ok(items);
        }
        if let Token::Char { ch: '#', catcode: CatCode::Parameter, .. } = &tok {
            let marker = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
            if let Token::Char { ch, .. } = &marker {
                if let Some(d) = ch.to_digit(10) {
                    let d = d as u8;
                    if d != next_param {
                        return Err(EngineError::Parse(ParseError::new(ParseErrorKind::ParameterOrder(d), loc.clone())));
                    }
                    items.push(ParamTemplateItem::Param(d));
                    next_param += 1;
                    continue;
                }
            }
            items.push(ParamTemplateItem::Literal(marker));
            continue;
        }
        items.push(ParamTemplateItem::Literal(tok));
    }
}

/// Reads a macro body already at brace-depth 1 (the opening `{` was the
/// lookahead token that ended [`read_param_template`]); stops at the
/// matching `}`, tracking nested groups exactly like
/// `crate::macros::read_delimited_arg`.
fn read_replacement_body(
    expander: &mut Expander,
    state: &mut DocumentState,
    loc: &Location,
    expand: bool,
    param_count: u8,
) -> Result<Vec<ReplacementItem>, EngineError> {
    let mut items = Vec::new();
    let mut depth = 1usize;
    let body_level = if expand { Level::Expanding } else { Level::Deep };

    loop {
        let saved = expander.level;
        expander.level = body_level;
        let tok = expander.pull(state);
        expander.level = saved;
        let Some(tok) = tok? else { return Err(runaway(loc)) };

        if tok.is_begin_group() {
            depth += 1;
            items.push(ReplacementItem::Literal(tok));
            continue;
        }
        if tok.is_end_group() {
            depth -= 1;
            if depth == 0 {
                return Ok(items);
            }
            items.push(ReplacementItem::Literal(tok));
            continue;
        }
        if let Token::Char { ch: '#', catcode: CatCode::Parameter, .. } = &tok {
            let saved = expander.level;
            expander.level = Level::Deep;
            let marker = expander.pull(state);
            expander.level = saved;
            let Some(marker) = marker? else { return Err(runaway(loc)) };
            match &marker {
                Token::Char { ch, .. } if ch.to_digit(10).is_some() => {
                    let d = ch.to_digit(10).unwrap() as u8;
                    if d == 0 || d > param_count {
                        return Err(EngineError::Parse(ParseError::new(ParseErrorKind::ParameterOrder(d), loc.clone())));
                    }
                    items.push(ReplacementItem::Param(d));
                }
                Token::Char { ch: '#', .. } => items.push(ReplacementItem::Literal(tok)),
                _ => {
                    items.push(ReplacementItem::Literal(tok));
                    items.push(ReplacementItem::Literal(marker));
                }
            }
            continue;
        }
        items.push(ReplacementItem::Literal(tok));
    }
}

fn resolve_let_rhs(tok: &Token, state: &DocumentState) -> Control {
    match tok.control_name() {
        Some(name) => state.get_control(&name).cloned().unwrap_or(Control::Relax),
        None => Control::LetToken(tok.clone()),
    }
}

/// Consumes the optional `=` and at most one space after it, per TeXbook
/// p206's `\let` grammar.
fn skip_let_equals(expander: &mut Expander, state: &mut DocumentState) -> Result<(), EngineError> {
    loop {
        match expander.pull_raw(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(Token::Char { ch: '=', .. }) => {
                if let Some(next) = expander.pull_raw(state)? {
                    if !next.is_space() {
                        expander.push_back(vec![next]);
                    }
                }
                return Ok(());
            }
            Some(tok) => {
                expander.push_back(vec![tok]);
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}

fn invoke_let(global: bool, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let cs_name = expect_control_name(expander, state, loc)?;
    skip_let_equals(expander, state)?;
    let rhs = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    let value = resolve_let_rhs(&rhs, state);
    bind(state, cs_name, value, global);
    Ok(None)
}

fn invoke_futurelet(global: bool, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let cs_name = expect_control_name(expander, state, loc)?;
    let tok1 = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    let tok2 = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    let value = resolve_let_rhs(&tok2, state);
    bind(state, cs_name, value, global);
    Ok(Some(vec![tok1, tok2]))
}

/// Resolves the "internal quantity" `\the` is pointed at: a register
/// (direct or via a `\countdef`-style alias), `\catcode`, or one of the
/// named integer parameters this crate tracks.
pub(crate) fn the_tokens(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Vec<Token>, EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    let Some(name) = tok.control_name() else {
        return Err(EngineError::Control(ControlError::new(ControlErrorKind::TheNotFound, loc.clone())));
    };

    if let Some(control) = state.get_control(&name).cloned() {
        match control.resolved() {
            Control::Register(r) => {
                return Ok(match r.block {
                    RegisterBlock::Count => number_tokens(state.count(r.index), loc),
                    RegisterBlock::Dimen => dimen_tokens(state.dimen(r.index), loc),
                    RegisterBlock::Skip | RegisterBlock::Muskip => glue_tokens(state.skip(r.index), loc),
                    RegisterBlock::Toks => state.toks(r.index).to_vec(),
                    RegisterBlock::Box => Vec::new(),
                });
            }
            Control::Chardef(c) => return Ok(number_tokens(*c as i64, loc)),
            _ => {}
        }
    }

    match name.as_str() {
        "count" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(number_tokens(state.count(idx), loc))
        }
        "dimen" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(dimen_tokens(state.dimen(idx), loc))
        }
        "skip" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(glue_tokens(state.skip(idx), loc))
        }
        "muskip" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(glue_tokens(state.muskip(idx), loc))
        }
        "toks" => {
            let idx = numeric::read_unsigned_number(expander, state, loc)? as u16;
            Ok(state.toks(idx).to_vec())
        }
        "catcode" => {
            let code = numeric::read_unsigned_number(expander, state, loc)? as u32;
            let ch = char::from_u32(code).unwrap_or('\u{FFFD}');
            Ok(number_tokens(state.catcode(ch).as_u8() as i64, loc))
        }
        "hyphenpenalty" => Ok(number_tokens(state.int_params.hyphenpenalty, loc)),
        "exhyphenpenalty" => Ok(number_tokens(state.int_params.exhyphenpenalty, loc)),
        "tolerance" => Ok(number_tokens(state.int_params.tolerance, loc)),
        "pretolerance" => Ok(number_tokens(state.int_params.pretolerance, loc)),
        _ => Err(EngineError::Control(ControlError::new(ControlErrorKind::TheNotFound, loc.clone()))),
    }
}

/// `\expandafter<a><b>`: expands `<b>` by exactly one step before
/// reinserting `<a>` ahead of the result.
fn expandafter(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let first = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    let second = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;

    let mut out = vec![first];
    if let Some(name) = second.control_name() {
        match state.get_control(&name) {
            Some(control) if control.capabilities().is_expandable => {
                let control = control.clone();
                if let Some(expansion) = crate::primitives::invoke(&control, &name, expander, state, loc)? {
                    out.extend(expansion);
                }
            }
            _ => out.push(second),
        }
    } else {
        out.push(second);
    }
    Ok(Some(out))
}

/// Real `\noexpand` suppresses exactly one future expansion of its
/// argument; this crate has no token representation for "frozen, do not
/// expand", so an expandable control degrades to its `\string` spelling
/// instead of being reinserted verbatim. Non-expandable tokens pass
/// through unchanged, which covers the common case of protecting a
/// register or `\relax`-like name inside an `\edef`.
fn noexpand(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    match tok.control_name() {
        Some(name) => {
            let expandable = state.get_control(&name).map(|c| c.capabilities().is_expandable).unwrap_or(false);
            if expandable {
                Ok(Some(string_to_tokens(&format!("\\{name}"), loc)))
            } else {
                Ok(Some(vec![tok]))
            }
        }
        None => Ok(Some(vec![tok])),
    }
}

fn csname(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    state.begin_csname();
    loop {
        let saved = expander.level;
        expander.level = Level::Expanding;
        let tok = expander.pull(state);
        expander.level = saved;
        let Some(tok) = tok? else { return Err(runaway(loc)) };
        if let Some(n) = tok.control_name() {
            if n == "endcsname" {
                break;
            }
        }
        match tok {
            Token::Char { ch, .. } => state.push_csname_char(ch),
            _ => {
                return Err(EngineError::Parse(ParseError::new(
                    ParseErrorKind::ExpectedNumber("character inside \\csname".into()),
                    loc.clone(),
                )))
            }
        }
    }
    let name = state.end_csname(loc)?;
    if state.get_control(&name).is_none() {
        state.set_control_global(name.clone(), Control::Relax);
    }
    Ok(Some(vec![Token::Control { name, loc: loc.clone() }]))
}

fn string_primitive(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    let text = match &tok {
        Token::Control { name, .. } => format!("\\{name}"),
        Token::Active { ch, .. } => ch.to_string(),
        Token::Char { ch, .. } => ch.to_string(),
        _ => String::new(),
    };
    Ok(Some(string_to_tokens(&text, loc)))
}

fn case_convert(upper: bool, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let group = crate::primitives::read_raw_group(expander, state, loc)?;
    let mapped = group
        .into_iter()
        .map(|tok| match tok {
            Token::Char { ch, catcode, loc } => {
                let mapped = if upper { ch.to_uppercase().next().unwrap_or(ch) } else { ch.to_lowercase().next().unwrap_or(ch) };
                Token::Char { ch: mapped, catcode, loc }
            }
            other => other,
        })
        .collect();
    Ok(Some(mapped))
}

/// Renders a `{…}` group's character content as plain text, for
/// `\message`/`\errmessage`; control tokens inside render via
/// their `\string` spelling.
pub fn render_raw_group_as_text(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<String, EngineError> {
    let group = crate::primitives::read_raw_group(expander, state, loc)?;
    Ok(crate::numeric_text::tokens_to_text(&group))
}
