//! The expander: a pull iterator over a [`Tokeniser`] that drives
//! macro expansion, conditional skipping (via the controls it invokes), and
//! scoped group tracking, parametrised per-invocation by level/bounded/
//! on_eof/no_outer/no_par.

use crate::catcode::CatCode;
use crate::errors::{EngineError, MacroError, MacroErrorKind, ParseError, ParseErrorKind};
use crate::group::GroupFlavour;
use crate::location::Location;
use crate::state::DocumentState;
use crate::token::Token;
use crate::tokeniser::Tokeniser;

/// How deeply a pull should expand what it reads.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Level {
    /// No expansion at all: controls are returned as raw tokens.
    Deep,
    /// Expand, but do not execute non-expandable controls' side effects.
    Reading,
    /// Expand macros and expandable primitives; leave other primitives
    /// unexecuted (same gating as `Reading` in this implementation — the
    /// distinction drawn here is between callers that want a macro-expanded
    /// token *stream* versus one that also wants values resolved, which
    /// `Querying` covers).
    Expanding,
    /// Invoke every control encountered, expandable or not.
    Executing,
    /// Like `Reading`, used by callers retrieving a single value (`\the`,
    /// conditionals) rather than consuming a whole stream.
    Querying,
}

/// How much of the input one `pull` loop is bounded to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bounded {
    /// Read until end of input.
    None,
    /// One token, or — if the input begins with `{` — one balanced group
    /// (braces stripped).
    Single,
    /// Exactly one `{…}` group; braces stripped.
    Balanced,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OnEof {
    Exhaust,
    Raise,
    ReturnNone,
}

pub struct Expander {
    tokeniser: Tokeniser,
    pub level: Level,
    pub bounded: Bounded,
    pub on_eof: OnEof,
    pub no_outer: bool,
    pub no_par: bool,
    group_depth: usize,
    exhausted: bool,
}

impl Expander {
    pub fn new(tokeniser: Tokeniser) -> Self {
        Expander {
            tokeniser,
            level: Level::Executing,
            bounded: Bounded::None,
            on_eof: OnEof::Exhaust,
            no_outer: false,
            no_par: false,
            group_depth: 0,
            exhausted: false,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_bounded(mut self, bounded: Bounded) -> Self {
        self.bounded = bounded;
        self
    }

    pub fn with_on_eof(mut self, on_eof: OnEof) -> Self {
        self.on_eof = on_eof;
        self
    }

    pub fn location(&self) -> Location {
        self.tokeniser.location()
    }

    pub fn push_back(&mut self, tokens: Vec<Token>) {
        self.tokeniser.push_back(tokens);
    }

    /// Pulls one token without macro/primitive expansion, regardless of the
    /// expander's configured level — used by delimiter and argument
    /// matching, which compares raw tokens.
    pub fn pull_raw(&mut self, state: &mut DocumentState) -> Result<Option<Token>, EngineError> {
        let saved = self.level;
        self.level = Level::Deep;
        let result = self.pull(state);
        self.level = saved;
        result
    }

    fn should_invoke(&self, expandable: bool) -> bool {
        match self.level {
            Level::Deep => false,
            Level::Executing => true,
            Level::Reading | Level::Expanding | Level::Querying => expandable,
        }
    }

    /// Drains the expander into a `Vec`, per `bounded`/`on_eof`; convenience
    /// for callers (macro argument capture, `\edef` pre-expansion) that want
    /// the whole bounded read at once rather than token-by-token.
    pub fn collect_all(&mut self, state: &mut DocumentState) -> Result<Vec<Token>, EngineError> {
        let mut out = Vec::new();
        while let Some(tok) = self.pull(state)? {
            out.push(tok);
        }
        Ok(out)
    }

    /// Pulls the next token, applying the bounded/level/outer-brace rules
    /// below in order.
    pub fn pull(&mut self, state: &mut DocumentState) -> Result<Option<Token>, EngineError> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            let loc = self.tokeniser.location();
            let tok = match self.tokeniser.next(state)? {
                Some(t) => t,
                None => {
                    return match self.on_eof {
                        OnEof::Exhaust | OnEof::ReturnNone => Ok(None),
                        OnEof::Raise => Err(EngineError::Parse(ParseError::new(
                            ParseErrorKind::ExpectedNumber("more input".into()),
                            loc,
                        ))),
                    };
                }
            };

            // Step 1: bounded=single, depth 0, non-brace token: yield and stop.
            if self.bounded == Bounded::Single && self.group_depth == 0 && !tok.is_begin_group() {
                self.exhausted = true;
                return self.finish_token(state, tok, loc);
            }

            if tok.is_begin_group() {
                if (self.bounded == Bounded::Single || self.bounded == Bounded::Balanced) && self.group_depth == 0 {
                    self.group_depth = 1;
                    state.begin_group(GroupFlavour::Ordinary);
                    continue; // outer opening brace is stripped, not yielded
                }
                if self.bounded != Bounded::None {
                    self.group_depth += 1;
                }
                state.begin_group(GroupFlavour::Ordinary);
                return self.finish_token(state, tok, loc);
            }

            if tok.is_end_group() {
                if self.bounded != Bounded::None {
                    if self.group_depth == 0 {
                        return Err(EngineError::Parse(ParseError::new(ParseErrorKind::UnmatchedEndGroup, loc)));
                    }
                    self.group_depth -= 1;
                    state.end_group();
                    if self.group_depth == 0 {
                        self.exhausted = true;
                        return Ok(None); // outer closing brace stripped
                    }
                    return self.finish_token(state, tok, loc);
                } else {
                    state.end_group();
                    return self.finish_token(state, tok, loc);
                }
            }

            return self.finish_token(state, tok, loc);
        }
    }

    /// Steps 4-6: expand a control/active token if the current level calls
    /// for it, or yield the token as-is.
    fn finish_token(
        &mut self,
        state: &mut DocumentState,
        tok: Token,
        loc: Location,
    ) -> Result<Option<Token>, EngineError> {
        if let Token::Par { .. } = &tok {
            if self.no_par {
                return Err(EngineError::Macro(MacroError::new(MacroErrorKind::ParUnderNoPar, loc)));
            }
        }

        if let Token::Internal { callback, .. } = &tok {
            callback(state);
            return self.pull(state);
        }

        if !tok.is_control_or_active() {
            return Ok(Some(tok));
        }

        let registry_key = tok.control_name().expect("checked is_control_or_active above");
        // An active character's own binding wins; absent that, it falls
        // back to a control sequence of the same single-character name
        // before finally degrading to a literal character like any other
        // undefined single-character control would. `name` (used for
        // display and as the dispatch key below) is always the plain,
        // human-readable spelling, never the NUL-prefixed registry key.
        let fallback_name = match &tok {
            Token::Active { ch, .. } => Some(ch.to_string()),
            _ => None,
        };
        let resolved = state
            .get_control(&registry_key)
            .or_else(|| fallback_name.as_ref().and_then(|n| state.get_control(n)))
            .cloned();

        // Raw (`Deep`) reads never invoke or expand, but they still must see
        // an \outer macro coming — argument scanning obeys no_outer even
        // though it doesn't obey full expansion. An undefined name has no
        // outer-ness to check, so it passes through untouched rather than
        // being degraded or erroring now: that resolution happens for real
        // the first time the token is actually expanded.
        let Some(control) = resolved else {
            if self.level == Level::Deep {
                return Ok(Some(tok));
            }
            if let Token::Active { ch, .. } = &tok {
                return Ok(Some(Token::Char { ch: *ch, catcode: CatCode::Other, loc }));
            }
            let mut chars = registry_key.chars();
            let (Some(only), None) = (chars.next(), chars.next()) else {
                return Err(EngineError::Macro(MacroError::new(
                    MacroErrorKind::UndefinedControl(registry_key),
                    loc,
                )));
            };
            return Ok(Some(Token::Char { ch: only, catcode: CatCode::Other, loc }));
        };
        let name = fallback_name.unwrap_or(registry_key);

        let caps = control.capabilities();
        if caps.is_outer && self.no_outer {
            return Err(EngineError::Macro(MacroError::new(MacroErrorKind::ForbiddenOuter(name), loc)));
        }

        if self.level == Level::Deep || !self.should_invoke(caps.is_expandable) {
            return Ok(Some(tok));
        }

        match crate::primitives::invoke(&control, &name, self, state, &loc)? {
            Some(expansion) => {
                self.push_back(expansion);
                self.pull(state)
            }
            None => self.pull(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use chrono::{Local, TimeZone};

    fn state() -> DocumentState {
        DocumentState::new(Local.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap())
    }

    fn expand_all(input: &str, state: &mut DocumentState) -> Vec<Token> {
        let mut e = Expander::new(Tokeniser::new(Source::new(input)));
        e.collect_all(state).unwrap()
    }

    #[test]
    fn plain_characters_pass_through_unexpanded() {
        let mut s = state();
        let toks = expand_all("abc", &mut s);
        assert_eq!(toks.len(), 3);
    }

    #[test]
    fn undefined_single_char_control_becomes_other_char() {
        let mut s = state();
        let toks = expand_all("\\%", &mut s);
        assert_eq!(toks.len(), 1);
        assert!(matches!(&toks[0], Token::Char { ch: '%', catcode: CatCode::Other, .. }));
    }

    #[test]
    fn undefined_multiletter_control_is_an_error() {
        let mut s = state();
        let mut e = Expander::new(Tokeniser::new(Source::new("\\nosuchcontrol")));
        assert!(e.pull(&mut s).is_err());
    }

    #[test]
    fn balanced_bounded_strips_outer_braces() {
        let mut s = state();
        let mut e = Expander::new(Tokeniser::new(Source::new("{ab}")));
        e.bounded = Bounded::Balanced;
        let toks = e.collect_all(&mut s).unwrap();
        assert!(toks.iter().all(|t| !t.is_begin_group() && !t.is_end_group()));
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn group_is_opened_and_closed_on_document_state() {
        let mut s = state();
        s.set_catcode('~', CatCode::Letter);
        let mut e = Expander::new(Tokeniser::new(Source::new("{~}")));
        e.bounded = Bounded::Balanced;
        e.collect_all(&mut s).unwrap();
        // the group the expander opened to read the braces has since closed
        s.set_catcode('!', CatCode::Letter);
        assert_eq!(s.catcode('!'), CatCode::Letter);
    }

    #[test]
    fn no_par_raises_on_paragraph_token() {
        let mut s = state();
        let mut e = Expander::new(Tokeniser::new(Source::new("\n")));
        e.no_par = true;
        assert!(e.pull(&mut s).is_err());
    }
}
