//! Converts resolved numeric/dimen/glue values back into token sequences,
//! the way `\the` and `\string` need to reinsert a textual representation
//! into the input. The inverse direction of
//! [`crate::numeric`].

use crate::catcode::CatCode;
use crate::dimen::Dimen;
use crate::glue::Glue;
use crate::location::Location;
use crate::token::Token;

/// Renders `s` as a sequence of catcode-12 (space stays catcode-10) tokens,
/// all attributed to `loc` — the form `\the`/`\string`/`\message` output
/// takes once it re-enters the input stream.
pub fn string_to_tokens(s: &str, loc: &Location) -> Vec<Token> {
    s.chars()
        .map(|ch| Token::Char { ch, catcode: if ch == ' ' { CatCode::Space } else { CatCode::Other }, loc: loc.clone() })
        .collect()
}

pub fn number_tokens(n: i64, loc: &Location) -> Vec<Token> {
    string_to_tokens(&n.to_string(), loc)
}

/// `\the\dimenN` prints the value in scaled points with an explicit `sp`
/// unit rather than TeX's decimal-point rendering — exact, and avoids
/// re-deriving TeX's printed-decimal rounding rules for a non-goal surface.
pub fn dimen_tokens(d: Dimen, loc: &Location) -> Vec<Token> {
    string_to_tokens(&format!("{}sp", d.sp), loc)
}

pub fn glue_tokens(g: Glue, loc: &Location) -> Vec<Token> {
    let mut s = format!("{}sp", g.natural.sp);
    if g.stretch.length != Dimen::ZERO {
        s.push_str(&format!(" plus {}sp", g.stretch.length.sp));
    }
    if g.shrink.length != Dimen::ZERO {
        s.push_str(&format!(" minus {}sp", g.shrink.length.sp));
    }
    string_to_tokens(&s, loc)
}

/// The reverse of [`string_to_tokens`]: renders a token sequence back to
/// plain text for diagnostics (`\showthe`, `\message`) — control tokens
/// render via their `\string` spelling.
pub fn tokens_to_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        match tok {
            Token::Char { ch, .. } | Token::Active { ch, .. } => out.push(*ch),
            Token::Control { name, .. } => {
                out.push('\\');
                out.push_str(name);
            }
            _ => {}
        }
    }
    out
}
