//! User-macro invocation: parameter matching (delimited and
//! undelimited) against a [`UserMacro`]'s template, followed by replacement
//! substitution.

use std::rc::Rc;

use crate::control::{ParamTemplateItem, ReplacementItem, UserMacro};
use crate::errors::{EngineError, MacroError, MacroErrorKind, ParseError, ParseErrorKind};
use crate::expander::Expander;
use crate::location::Location;
use crate::state::DocumentState;
use crate::token::Token;

pub(crate) fn runaway(loc: &Location) -> EngineError {
    EngineError::Macro(MacroError::new(MacroErrorKind::RunawayArgument, loc.clone()))
}

/// Reads a single undelimited argument: one non-begin-group token, or one
/// balanced `{…}` group with its outer braces stripped.
fn read_undelimited_arg(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Vec<Token>, EngineError> {
    let first = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    if !first.is_begin_group() {
        return Ok(vec![first]);
    }
    let mut depth = 1usize;
    let mut out = Vec::new();
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
        if tok.is_begin_group() {
            depth += 1;
            out.push(tok);
        } else if tok.is_end_group() {
            depth -= 1;
            if depth == 0 {
                return Ok(out);
            }
            out.push(tok);
        } else {
            out.push(tok);
        }
    }
}

/// Reads tokens until `delimiter` matches exactly at brace-depth 0: the
/// argument is everything before the match.
fn read_delimited_arg(
    expander: &mut Expander,
    state: &mut DocumentState,
    delimiter: &[Token],
    loc: &Location,
) -> Result<Vec<Token>, EngineError> {
    let mut out: Vec<Token> = Vec::new();
    let mut depth = 0usize;
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
        if tok.is_begin_group() {
            depth += 1;
        } else if tok.is_end_group() && depth > 0 {
            depth -= 1;
        }
        out.push(tok);
        if depth == 0 && out.len() >= delimiter.len() {
            let tail = &out[out.len() - delimiter.len()..];
            if tail == delimiter {
                out.truncate(out.len() - delimiter.len());
                return Ok(out);
            }
        }
    }
}

/// Matches a literal prefix/delimiter token exactly against the next raw
/// input token.
fn expect_literal(expander: &mut Expander, state: &mut DocumentState, expected: &Token, loc: &Location) -> Result<(), EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| runaway(loc))?;
    if &tok != expected {
        return Err(EngineError::Parse(ParseError::new(ParseErrorKind::PrefixMismatch, loc.clone())));
    }
    Ok(())
}

/// Invokes a user macro: matches its parameter template against the call
/// site, then substitutes captured arguments into the replacement template.
/// Returns the token sequence to push back onto the
/// source; callers needing "expanded at definition" semantics (`\edef`/
/// `\xdef`) instead stored an already-expanded replacement, so this function
/// is identical for every macro flavour.
pub fn invoke(mac: &Rc<UserMacro>, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Vec<Token>, EngineError> {
    let items = &mac.param_template;
    let mut args: [Vec<Token>; 9] = Default::default();
    let mut i = 0;

    while i < items.len() {
        match &items[i] {
            ParamTemplateItem::Literal(expected) => {
                expect_literal(expander, state, expected, loc)?;
                i += 1;
            }
            ParamTemplateItem::Param(_) => break,
        }
    }

    while i < items.len() {
        let ParamTemplateItem::Param(k) = items[i] else { unreachable!("loop guarded by the match above") };
        i += 1;

        let mut delimiter = Vec::new();
        while i < items.len() {
            match &items[i] {
                ParamTemplateItem::Literal(t) => {
                    delimiter.push(t.clone());
                    i += 1;
                }
                ParamTemplateItem::Param(_) => break,
            }
        }

        let saved_no_par = expander.no_par;
        let saved_no_outer = expander.no_outer;
        if !mac.long {
            expander.no_par = true;
        }
        expander.no_outer = true;

        let arg = if delimiter.is_empty() {
            read_undelimited_arg(expander, state, loc)
        } else {
            read_delimited_arg(expander, state, &delimiter, loc)
        };

        expander.no_par = saved_no_par;
        expander.no_outer = saved_no_outer;

        args[(k - 1) as usize] = arg?;
    }

    let mut output = Vec::with_capacity(mac.replacement.len());
    for item in &mac.replacement {
        match item {
            ReplacementItem::Literal(t) => output.push(t.clone()),
            ReplacementItem::Param(k) => output.extend(args[(*k - 1) as usize].iter().cloned()),
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catcode::CatCode;
    use crate::source::Source;
    use crate::tokeniser::Tokeniser;
    use chrono::{Local, TimeZone};

    fn state() -> DocumentState {
        DocumentState::new(Local.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap())
    }

    fn ch(c: char, loc_line: usize) -> Token {
        Token::Char { ch: c, catcode: CatCode::Letter, loc: Location::top_level(loc_line, 1) }
    }

    fn other(c: char) -> Token {
        Token::Char { ch: c, catcode: CatCode::Other, loc: Location::top_level(1, 1) }
    }

    #[test]
    fn undelimited_single_token_argument() {
        let mut s = state();
        let mac = Rc::new(UserMacro {
            param_template: vec![ParamTemplateItem::Param(1)],
            replacement: vec![ReplacementItem::Param(1), ReplacementItem::Literal(ch('!', 1))],
            long: false,
            outer: false,
            expanded_at_definition: false,
        });
        let mut e = Expander::new(Tokeniser::new(Source::new("x")));
        let out = invoke(&mac, &mut e, &mut s, &Location::top_level(1, 1)).unwrap();
        assert!(matches!(&out[0], Token::Char { ch: 'x', .. }));
        assert!(matches!(&out[1], Token::Char { ch: '!', .. }));
    }

    #[test]
    fn undelimited_braced_argument_strips_braces() {
        let mut s = state();
        let mac = Rc::new(UserMacro {
            param_template: vec![ParamTemplateItem::Param(1)],
            replacement: vec![ReplacementItem::Param(1)],
            long: false,
            outer: false,
            expanded_at_definition: false,
        });
        let mut e = Expander::new(Tokeniser::new(Source::new("{ab}")));
        let out = invoke(&mac, &mut e, &mut s, &Location::top_level(1, 1)).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|t| !t.is_begin_group() && !t.is_end_group()));
    }

    #[test]
    fn delimited_argument_stops_at_delimiter() {
        let mut s = state();
        // TeXbook p200 flavour: \def\a#1,#2;{...}
        let mac = Rc::new(UserMacro {
            param_template: vec![
                ParamTemplateItem::Param(1),
                ParamTemplateItem::Literal(other(',')),
                ParamTemplateItem::Param(2),
                ParamTemplateItem::Literal(other(';')),
            ],
            replacement: vec![ReplacementItem::Param(2), ReplacementItem::Param(1)],
            long: false,
            outer: false,
            expanded_at_definition: false,
        });
        let mut e = Expander::new(Tokeniser::new(Source::new("ab,cd;")));
        let out = invoke(&mac, &mut e, &mut s, &Location::top_level(1, 1)).unwrap();
        // arg1 = "ab", arg2 = "cd"; replacement = arg2 ++ arg1 = "cdab"
        let rendered: String = out
            .iter()
            .map(|t| match t {
                Token::Char { ch, .. } => *ch,
                _ => '?',
            })
            .collect();
        assert_eq!(rendered, "cdab");
    }

    #[test]
    fn literal_prefix_mismatch_is_an_error() {
        let mut s = state();
        let mac = Rc::new(UserMacro {
            param_template: vec![ParamTemplateItem::Literal(other('x')), ParamTemplateItem::Param(1)],
            replacement: vec![ReplacementItem::Param(1)],
            long: false,
            outer: false,
            expanded_at_definition: false,
        });
        let mut e = Expander::new(Tokeniser::new(Source::new("yz")));
        assert!(invoke(&mac, &mut e, &mut s, &Location::top_level(1, 1)).is_err());
    }
}
