//! Category-code-driven lexer, following the TeXbook p46
//! algorithm: a `Source` of raw characters in, a stream of [`Token`]s out,
//! state machine on line status {N, M, S}.

use crate::catcode::CatCode;
use crate::errors::{ParseError, ParseErrorKind};
use crate::location::Location;
use crate::source::{Source, SourceItem};
use crate::state::DocumentState;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LineStatus {
    /// Beginning of line.
    N,
    /// Middle of line.
    M,
    /// Skipping blanks (just emitted a space).
    S,
}

pub struct Tokeniser {
    source: Source,
    status: LineStatus,
    /// True while in "strict mode": invalid-category characters raise
    /// instead of being silently skipped.
    pub strict: bool,
}

impl Tokeniser {
    pub fn new(source: Source) -> Self {
        Tokeniser { source, status: LineStatus::N, strict: false }
    }

    pub fn location(&self) -> Location {
        self.source.location()
    }

    /// Pushes fully-formed tokens back onto the underlying source, in the
    /// order they should be read again (used by the expander to reinject a
    /// macro's expansion ahead of the rest of the input).
    pub fn push_back(&mut self, tokens: Vec<Token>) {
        self.source.push_sequence(tokens.into_iter().map(SourceItem::Token).collect());
    }

    /// Pulls the next token, consulting `state`'s catcode table for every
    /// character read (so `\catcode` assignments take effect immediately).
    pub fn next(&mut self, state: &DocumentState) -> Result<Option<Token>, ParseError> {
        loop {
            let loc = self.source.location();
            let item = match self.source.next() {
                Some(item) => item,
                None => return Ok(None),
            };

            let ch = match item {
                SourceItem::Token(tok) => return Ok(Some(tok)),
                SourceItem::Char(c) => c,
            };

            let cat = state.catcode(ch);
            match cat {
                CatCode::Escape => return self.read_control_sequence(state, loc).map(Some),
                CatCode::BeginGroup
                | CatCode::EndGroup
                | CatCode::MathShift
                | CatCode::AlignmentTab
                | CatCode::Parameter
                | CatCode::Other
                | CatCode::Letter
                | CatCode::Subscript => {
                    self.status = LineStatus::M;
                    return Ok(Some(Token::Char { ch, catcode: cat, loc }));
                }
                CatCode::Superscript => {
                    if let Some(tok) = self.try_caret_notation(state, ch, &loc)? {
                        return Ok(Some(tok));
                    }
                    self.status = LineStatus::M;
                    return Ok(Some(Token::Char { ch, catcode: cat, loc }));
                }
                CatCode::Active => {
                    self.status = LineStatus::M;
                    return Ok(Some(Token::Active { ch, loc }));
                }
                CatCode::EndOfLine => {
                    let tok = match self.status {
                        LineStatus::N => Some(Token::par(loc)),
                        LineStatus::M => Some(Token::space(loc)),
                        LineStatus::S => None,
                    };
                    self.status = LineStatus::N;
                    if let Some(tok) = tok {
                        return Ok(Some(tok));
                    }
                    continue;
                }
                CatCode::Ignored => continue,
                CatCode::Space => {
                    if self.status == LineStatus::M {
                        self.status = LineStatus::S;
                        return Ok(Some(Token::space(loc)));
                    }
                    continue;
                }
                CatCode::Comment => {
                    while let Some(c) = self.source.peek_char() {
                        self.source.advance_raw();
                        if c == '\n' {
                            break;
                        }
                    }
                    self.status = LineStatus::N;
                    continue;
                }
                CatCode::Invalid => {
                    if self.strict {
                        return Err(ParseError::new(ParseErrorKind::InvalidCharacter(ch), loc));
                    }
                    continue;
                }
            }
        }
    }

    fn read_control_sequence(&mut self, state: &DocumentState, loc: Location) -> Result<Token, ParseError> {
        let Some(first) = self.source.advance_raw() else {
            return Err(ParseError::new(ParseErrorKind::ExpectedNumber("control sequence name".into()), loc));
        };

        if state.catcode(first) != CatCode::Letter {
            self.status = LineStatus::M;
            return Ok(Token::Control { name: first.to_string(), loc });
        }

        let mut name = String::new();
        name.push(first);
        while let Some(c) = self.source.peek_char() {
            if state.catcode(c) == CatCode::Letter {
                name.push(c);
                self.source.advance_raw();
            } else {
                break;
            }
        }

        // Absorb trailing spaces after a multi-letter name (TeXbook p46).
        while let Some(c) = self.source.peek_char() {
            if state.catcode(c) == CatCode::Space {
                self.source.advance_raw();
            } else {
                break;
            }
        }
        self.status = LineStatus::M;
        Ok(Token::Control { name, loc })
    }

    /// Recognises `^^xy` (two hex digits) and `^^c` caret notation, given
    /// that the char just read was already category-7. Returns
    /// `Ok(None)` when the next char isn't the same superscript character
    /// (not caret notation after all).
    fn try_caret_notation(
        &mut self,
        state: &DocumentState,
        first: char,
        loc: &Location,
    ) -> Result<Option<Token>, ParseError> {
        let Some(second) = self.source.peek_char() else { return Ok(None) };
        if second != first {
            return Ok(None);
        }
        self.source.advance_raw(); // consume the second caret

        let hex_digits: Vec<char> = {
            let mut digits = Vec::new();
            for _ in 0..2 {
                match self.source.peek_char() {
                    Some(c) if c.is_ascii_hexdigit() && c.is_ascii_lowercase() || c.is_ascii_digit() => {
                        digits.push(c);
                    }
                    _ => break,
                }
            }
            digits
        };

        if hex_digits.len() == 2 {
            for _ in 0..2 {
                self.source.advance_raw();
            }
            let code = u8::from_str_radix(&hex_digits.iter().collect::<String>(), 16)
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidCharacter(first), loc.clone()))?;
            let ch = code as char;
            self.status = LineStatus::M;
            return Ok(Some(self.classify_caret_result(state, ch, loc.clone())));
        }

        let Some(c) = self.source.advance_raw() else {
            // Nothing follows: this was a bare doubled superscript; push the
            // second caret back as a token (not a char) to avoid the
            // tokeniser re-entering caret detection on it.
            self.source.push(SourceItem::Token(Token::superscript(first, loc.clone())));
            return Ok(None);
        };

        let code = c as u32;
        let result_code = if code < 64 { code + 64 } else { code - 64 };
        let ch = char::from_u32(result_code)
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidCharacter(c), loc.clone()))?;

        if ch == first && state.catcode(ch) == CatCode::Superscript {
            // Re-pushing `ch` would trigger caret detection again forever;
            // push it back as an already-classified token instead.
            self.source.push(SourceItem::Token(Token::superscript(ch, loc.clone())));
            return Ok(None);
        }

        self.status = LineStatus::M;
        Ok(Some(self.classify_caret_result(state, ch, loc.clone())))
    }

    fn classify_caret_result(&self, state: &DocumentState, ch: char, loc: Location) -> Token {
        match state.catcode(ch) {
            CatCode::Active => Token::Active { ch, loc },
            cat => Token::Char { ch, catcode: cat, loc },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn state() -> DocumentState {
        DocumentState::new(Local.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap())
    }

    fn tokens(input: &str) -> Vec<Token> {
        let state = state();
        let mut t = Tokeniser::new(Source::new(input));
        let mut out = Vec::new();
        while let Some(tok) = t.next(&state).unwrap() {
            out.push(tok);
        }
        out
    }

    #[test]
    fn control_word_absorbs_trailing_spaces() {
        let toks = tokens("\\foo   bar");
        assert!(matches!(&toks[0], Token::Control { name, .. } if name == "foo"));
        assert!(matches!(&toks[1], Token::Char { ch: 'b', .. }));
    }

    #[test]
    fn single_nonletter_control_does_not_absorb_spaces() {
        let toks = tokens("\\% x");
        assert!(matches!(&toks[0], Token::Control { name, .. } if name == "%"));
        assert!(matches!(&toks[1], Token::Char { ch: ' ', catcode: CatCode::Space, .. }));
    }

    #[test]
    fn end_of_line_at_line_start_emits_par() {
        let toks = tokens("\n");
        assert!(matches!(&toks[0], Token::Par { .. }));
    }

    #[test]
    fn end_of_line_mid_line_emits_space() {
        let toks = tokens("a\nb");
        assert!(matches!(&toks[1], Token::Char { ch: ' ', catcode: CatCode::Space, .. }));
    }

    #[test]
    fn comment_consumes_to_end_of_line() {
        let toks = tokens("a%comment\nb");
        assert_eq!(toks.len(), 2);
        assert!(matches!(&toks[0], Token::Char { ch: 'a', .. }));
        assert!(matches!(&toks[1], Token::Char { ch: 'b', .. })); // the \n after a comment resets to N, so b starts fresh (no space/par emitted)
    }

    #[test]
    fn caret_hex_notation_decodes_two_digits() {
        // ^^6f is hex 0x6f = 'o'
        let toks = tokens("a^^6fb");
        assert_eq!(toks.len(), 3);
        assert!(matches!(&toks[1], Token::Char { ch: 'o', .. }));
    }

    #[test]
    fn multiple_spaces_collapse_after_the_first() {
        let toks = tokens("a   b");
        assert_eq!(toks.len(), 3); // 'a', one space, 'b'
    }
}
