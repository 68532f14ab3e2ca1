//! Numeric parsing: unsigned/signed integers
//! with base prefixes, decimal dimens with a unit suffix, and glue with
//! optional `plus`/`minus` clauses. Shared by `\count`/`\dimen`/`\skip`
//! assignment, arithmetic, and conditionals.

use crate::control::Control;
use crate::dimen::{Dimen, Unit};
use crate::errors::{EngineError, ParseError, ParseErrorKind};
use crate::expander::Expander;
use crate::glue::{Glue, GlueComponent, InfinityOrder};
use crate::location::Location;
use crate::registers::RegisterBlock;
use crate::state::DocumentState;
use crate::token::Token;

fn char_digit(ch: char, base: u32) -> Option<i64> {
    ch.to_digit(base).map(|d| d as i64)
}

/// Reads zero or more space tokens (TeX numbers may be followed by exactly
/// one consumed space, which this also handles via `skip_one_trailing_space`).
fn skip_spaces(expander: &mut Expander, state: &mut DocumentState) -> Result<(), EngineError> {
    loop {
        match expander.pull(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(tok) => {
                expander.push_back(vec![tok]);
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}

fn skip_one_trailing_space(expander: &mut Expander, state: &mut DocumentState) -> Result<(), EngineError> {
    match expander.pull(state)? {
        Some(tok) if tok.is_space() => Ok(()),
        Some(tok) => {
            expander.push_back(vec![tok]);
            Ok(())
        }
        None => Ok(()),
    }
}

/// Resolves a control token to a numeric value when it names a `\count`
/// register (via `\countdef`) or a `\chardef`-bound control; used so a
/// number context may substitute "a control evaluating to a number" (spec).
fn control_numeric_value(state: &DocumentState, name: &str) -> Option<i64> {
    match state.get_control(name)?.resolved() {
        Control::Chardef(code) => Some(*code as i64),
        Control::Register(r) if r.block == RegisterBlock::Count => Some(state.count(r.index)),
        Control::Register(r) if r.block == RegisterBlock::Dimen => Some(state.dimen(r.index).sp),
        _ => None,
    }
}

/// Reads an unsigned number: backtick-prefixed literal char
/// code, `"`-prefixed hex, `'`-prefixed octal, plain decimal digits, or a
/// control evaluating to a number.
pub fn read_unsigned_number(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<i64, EngineError> {
    skip_spaces(expander, state)?;
    let first = expander
        .pull(state)?
        .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber("<eof>".into()), loc.clone())))?;

    match &first {
        Token::Char { ch: '`', .. } => {
            let tok = expander
                .pull(state)?
                .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber("character after `".into()), loc.clone())))?;
            let code = match tok {
                Token::Char { ch, .. } => ch as i64,
                Token::Control { name, .. } if name.chars().count() == 1 => name.chars().next().unwrap() as i64,
                other => {
                    return Err(EngineError::Parse(ParseError::new(
                        ParseErrorKind::ExpectedNumber(format!("{other:?}")),
                        loc.clone(),
                    )))
                }
            };
            skip_one_trailing_space(expander, state)?;
            Ok(code)
        }
        Token::Char { ch: '"', .. } => read_based_digits(expander, state, 16, loc),
        Token::Char { ch: '\'', .. } => read_based_digits(expander, state, 8, loc),
        Token::Char { ch, .. } if ch.is_ascii_digit() => {
            let mut value = char_digit(*ch, 10).unwrap();
            loop {
                match expander.pull(state)? {
                    Some(Token::Char { ch, .. }) if ch.is_ascii_digit() => {
                        value = value * 10 + char_digit(ch, 10).unwrap();
                    }
                    Some(tok) if tok.is_space() => break,
                    Some(tok) => {
                        expander.push_back(vec![tok]);
                        break;
                    }
                    None => break,
                }
            }
            Ok(value)
        }
        _ if first.control_name().is_some() => {
            let name = first.control_name().unwrap();
            control_numeric_value(state, &name)
                .ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber(name.clone()), loc.clone())))
        }
        other => Err(EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber(format!("{other:?}")), loc.clone()))),
    }
}

fn read_based_digits(expander: &mut Expander, state: &mut DocumentState, base: u32, loc: &Location) -> Result<i64, EngineError> {
    let mut value: Option<i64> = None;
    loop {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if ch.to_digit(base).is_some() => {
                value = Some(value.unwrap_or(0) * base as i64 + char_digit(ch, base).unwrap());
            }
            Some(tok) if tok.is_space() => break,
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    value.ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber("based digits".into()), loc.clone())))
}

/// Reads an optional sign run (any mix of `+`, `-`, and spaces) then an
/// unsigned number.
pub fn read_signed_number(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<i64, EngineError> {
    let mut negative = false;
    loop {
        skip_spaces(expander, state)?;
        match expander.pull(state)? {
            Some(Token::Char { ch: '+', .. }) => continue,
            Some(Token::Char { ch: '-', .. }) => {
                negative = !negative;
                continue;
            }
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    let value = read_unsigned_number(expander, state, loc)?;
    Ok(if negative { -value } else { value })
}

/// Reads a signed decimal magnitude (allowing `,` or `.` as the decimal
/// separator) followed by a unit suffix, producing a [`Dimen`].
pub fn read_dimen(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Dimen, EngineError> {
    let mut negative = false;
    loop {
        skip_spaces(expander, state)?;
        match expander.pull(state)? {
            Some(Token::Char { ch: '+', .. }) => continue,
            Some(Token::Char { ch: '-', .. }) => {
                negative = !negative;
                continue;
            }
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }

    let mut whole = String::new();
    loop {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if ch.is_ascii_digit() => whole.push(ch),
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    let mut fraction = String::new();
    match expander.pull(state)? {
        Some(Token::Char { ch, .. }) if ch == '.' || ch == ',' => loop {
            match expander.pull(state)? {
                Some(Token::Char { ch, .. }) if ch.is_ascii_digit() => fraction.push(ch),
                Some(tok) => {
                    expander.push_back(vec![tok]);
                    break;
                }
                None => break,
            }
        },
        Some(tok) => expander.push_back(vec![tok]),
        None => {}
    }

    let magnitude: f64 = format!("{}.{}", if whole.is_empty() { "0" } else { &whole }, if fraction.is_empty() { "0" } else { &fraction })
        .parse()
        .map_err(|_| EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber("dimen magnitude".into()), loc.clone())))?;

    skip_spaces(expander, state)?;
    let unit_letters = read_two_letters(expander, state)?;
    let unit = Unit::parse(&unit_letters).map_err(|k| EngineError::Parse(ParseError::new(k, loc.clone())))?;
    skip_one_trailing_space(expander, state)?;

    let (font_ex, font_em) = current_font_metrics(state);
    let magnitude = if negative { -magnitude } else { magnitude };
    Ok(unit.resolve(magnitude, font_ex, font_em))
}

fn current_font_metrics(state: &DocumentState) -> (Dimen, Dimen) {
    match state.fonts().get(state.current_font()) {
        Some(font) => (font.ex(), font.em()),
        None => (Dimen::ZERO, Dimen::ZERO),
    }
}

fn read_two_letters(expander: &mut Expander, state: &mut DocumentState, ) -> Result<String, EngineError> {
    let mut s = String::new();
    for _ in 0..2 {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if ch.is_ascii_alphabetic() => s.push(ch),
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    Ok(s)
}

/// Reads a dimen followed by optional `plus <dimen-or-fil>` and
/// `minus <dimen-or-fil>` clauses, producing a [`Glue`].
pub fn read_glue(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Glue, EngineError> {
    let natural = read_dimen(expander, state, loc)?;
    let stretch = read_optional_clause(expander, state, "plus", loc)?.unwrap_or_default();
    let shrink = read_optional_clause(expander, state, "minus", loc)?.unwrap_or_default();
    Ok(Glue::new(natural, stretch, shrink))
}

fn read_optional_clause(
    expander: &mut Expander,
    state: &mut DocumentState,
    keyword: &str,
    loc: &Location,
) -> Result<Option<GlueComponent>, EngineError> {
    skip_spaces(expander, state)?;
    let mut consumed = Vec::new();
    for want in keyword.chars() {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if ch.to_ascii_lowercase() == want => consumed.push(Token::Char {
                ch,
                catcode: crate::catcode::CatCode::Letter,
                loc: loc.clone(),
            }),
            Some(tok) => {
                consumed.push(tok);
                expander.push_back(consumed);
                return Ok(None);
            }
            None => {
                expander.push_back(consumed);
                return Ok(None);
            }
        }
    }
    let dimen = read_dimen(expander, state, loc)?;
    // a trailing `fil`/`fill`/`filll` keyword upgrades this to infinite glue
    let order = read_infinity_order(expander, state, loc)?;
    Ok(Some(GlueComponent::infinite(dimen, order)))
}

fn read_infinity_order(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<InfinityOrder, EngineError> {
    let mut consumed = Vec::new();
    for want in "fil".chars() {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if ch.to_ascii_lowercase() == want => consumed.push(ch),
            Some(tok) => {
                let mut back: Vec<Token> = consumed
                    .iter()
                    .map(|&c| Token::Char { ch: c, catcode: crate::catcode::CatCode::Letter, loc: loc.clone() })
                    .collect();
                back.push(tok);
                expander.push_back(back);
                return Ok(InfinityOrder::Finite);
            }
            None => return Ok(InfinityOrder::Finite),
        }
    }
    let mut order = InfinityOrder::Fil;
    loop {
        match expander.pull(state)? {
            Some(Token::Char { ch: 'l', .. }) => {
                order = match order {
                    InfinityOrder::Fil => InfinityOrder::Fill,
                    InfinityOrder::Fill => InfinityOrder::Filll,
                    other => other,
                };
            }
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use crate::tokeniser::Tokeniser;
    use chrono::{Local, TimeZone};

    fn state() -> DocumentState {
        DocumentState::new(Local.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap())
    }

    fn expander(input: &str) -> Expander {
        Expander::new(Tokeniser::new(Source::new(input)))
    }

    #[test]
    fn reads_plain_decimal() {
        let mut s = state();
        let mut e = expander("123 ");
        let n = read_unsigned_number(&mut e, &mut s, &Location::top_level(1, 1)).unwrap();
        assert_eq!(n, 123);
    }

    #[test]
    fn reads_hex_and_octal() {
        let mut s = state();
        let mut e = expander("\"FF ");
        assert_eq!(read_unsigned_number(&mut e, &mut s, &Location::top_level(1, 1)).unwrap(), 255);

        let mut s2 = state();
        let mut e2 = expander("'17 ");
        assert_eq!(read_unsigned_number(&mut e2, &mut s2, &Location::top_level(1, 1)).unwrap(), 15);
    }

    #[test]
    fn reads_backtick_char_code() {
        let mut s = state();
        let mut e = expander("`A");
        assert_eq!(read_unsigned_number(&mut e, &mut s, &Location::top_level(1, 1)).unwrap(), 65);
    }

    #[test]
    fn signed_number_applies_negation() {
        let mut s = state();
        let mut e = expander("- -5 ");
        assert_eq!(read_signed_number(&mut e, &mut s, &Location::top_level(1, 1)).unwrap(), 5);
    }

    #[test]
    fn reads_dimen_with_unit() {
        let mut s = state();
        let mut e = expander("10.5pt");
        let d = read_dimen(&mut e, &mut s, &Location::top_level(1, 1)).unwrap();
        assert!((d.to_pt() - 10.5).abs() < 1e-6);
    }
}
