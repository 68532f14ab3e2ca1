//! The primitive control registry and dispatch. [`invoke`] is
//! the single entry point the expander calls whenever a control or active
//! character needs expanding or executing; [`seed`] installs every built-in
//! name at startup the way plain TeX's initial control sequence table does.

pub mod arithmetic;
pub mod boxes;
pub mod conditionals;
pub mod definitions;

use crate::catcode::CatCode;
use crate::control::{Control, PrimitiveMeaning};
use crate::errors::EngineError;
use crate::expander::Expander;
use crate::location::Location;
use crate::registers::RegisterBlock;
use crate::state::DocumentState;
use crate::token::Token;

/// `(name, expandable)` for every built-in this crate implements. Controls not listed here are simply undefined until a
/// macro binds them.
const PRIMITIVE_NAMES: &[(&str, bool)] = &[
    ("def", false),
    ("edef", false),
    ("gdef", false),
    ("xdef", false),
    ("global", false),
    ("long", false),
    ("outer", false),
    ("let", false),
    ("futurelet", false),
    ("chardef", false),
    ("mathchardef", false),
    ("countdef", false),
    ("dimendef", false),
    ("skipdef", false),
    ("muskipdef", false),
    ("toksdef", false),
    ("the", true),
    ("expandafter", true),
    ("noexpand", true),
    ("csname", true),
    ("endcsname", true),
    ("string", true),
    ("uppercase", false),
    ("lowercase", false),
    ("catcode", false),
    ("advance", false),
    ("multiply", false),
    ("divide", false),
    ("iftrue", true),
    ("iffalse", true),
    ("ifnum", true),
    ("ifdim", true),
    ("ifodd", true),
    ("ifcat", true),
    ("if", true),
    ("ifx", true),
    ("ifcase", true),
    ("ifmmode", true),
    ("ifhmode", true),
    ("ifvmode", true),
    ("ifinner", true),
    ("ifeof", true),
    ("ifhbox", true),
    ("ifvbox", true),
    ("ifvoid", true),
    ("else", true),
    ("or", true),
    ("fi", true),
    ("par", true),
    ("hbox", false),
    ("vbox", false),
    ("char", false),
    ("penalty", false),
    ("kern", false),
    ("hskip", false),
    ("vskip", false),
    ("discretionary", false),
    ("parshape", false),
    ("font", false),
    ("message", false),
    ("errmessage", false),
    ("special", false),
    ("shipout", false),
    ("showlists", false),
    ("showbox", false),
    ("showthe", false),
    ("count", false),
    ("dimen", false),
    ("skip", false),
    ("muskip", false),
    ("toks", false),
    ("inputlineno", true),
    ("indent", false),
    ("noindent", false),
    ("begingroup", false),
    ("endgroup", false),
];

/// Installs `\relax` and every name in [`PRIMITIVE_NAMES`] into a fresh
/// [`DocumentState`]'s control table, as global (unscoped) bindings — the
/// way plain TeX's format file pre-loads its primitives before any group is
/// ever opened.
pub fn seed(state: &mut DocumentState) {
    state.set_control_global("relax", Control::Relax);
    for (name, expandable) in PRIMITIVE_NAMES {
        state.set_control_global(*name, Control::Primitive(PrimitiveMeaning { name, expandable: *expandable }));
    }
}

/// Resolves a primitive name to its `'static` spelling and expandability,
/// the way [`seed`] does at startup. Used to rebuild a [`Control::Primitive`]
/// from a deserialised name, since [`PrimitiveMeaning`] carries a `&'static
/// str` that cannot be materialised from an owned, deserialised `String`.
pub fn lookup_primitive(name: &str) -> Option<PrimitiveMeaning> {
    PRIMITIVE_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(name, expandable)| PrimitiveMeaning { name, expandable: *expandable })
}

/// Dispatches one resolved [`Control`]. Returns
/// `Some(tokens)` when the control expands into a replacement to push back
/// onto the input, `None` when it was fully executed with no token output.
pub fn invoke(
    control: &Control,
    name: &str,
    expander: &mut Expander,
    state: &mut DocumentState,
    loc: &Location,
) -> Result<Option<Vec<Token>>, EngineError> {
    match control {
        Control::Macro(mac) => {
            state.push_call(name, loc);
            // Popped only on success: an error aborts the document run, and
            // the still-open frames are exactly what the top-level error
            // report wants to show as the "while expanding" trailer.
            let result = crate::macros::invoke(mac, expander, state, loc).map(Some)?;
            state.pop_call();
            Ok(result)
        }
        Control::LetToken(tok) => Ok(Some(vec![tok.clone()])),
        Control::LetAlias(inner) => invoke(inner, name, expander, state, loc),
        Control::Chardef(code) => {
            let ch = char::from_u32(*code).unwrap_or('\u{FFFD}');
            Ok(Some(vec![Token::Char { ch, catcode: CatCode::Other, loc: loc.clone() }]))
        }
        Control::Register(r) => {
            definitions::skip_optional_equals(expander, state)?;
            set_register(r.block, r.index, false, expander, state, loc)?;
            Ok(None)
        }
        Control::Relax => Ok(None),
        Control::FontSelector(font_name) => {
            state.set_current_font(font_name.clone());
            Ok(None)
        }
        Control::Primitive(_) => {
            state.push_call(name, loc);
            let result = dispatch_primitive(name, expander, state, loc)?;
            state.pop_call();
            Ok(result)
        }
    }
}

fn dispatch_primitive(name: &str, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    match name {
        "global" | "long" | "outer" => definitions::invoke_with_prefix_entry(name, expander, state, loc),
        "def" | "edef" | "gdef" | "xdef" | "let" | "futurelet" | "chardef" | "mathchardef" | "countdef" | "dimendef" | "skipdef" | "muskipdef"
        | "toksdef" | "the" | "expandafter" | "noexpand" | "csname" | "endcsname" | "string" | "uppercase" | "lowercase" | "catcode" => {
            definitions::invoke(name, expander, state, loc)
        }
        other => dispatch_primitive_ignoring_prefix(other, false, expander, state, loc),
    }
}

/// Every primitive that is never itself a `\global`/`\long`/`\outer`
/// prefix target for this crate's purposes — arithmetic, conditionals,
/// box-building, and the small standalone commands. Also the landing spot
/// for `\global advance ...`-style prefixes: `invoke_with_prefix` consumes
/// the prefix and passes `global` through here, so a `\global` ahead of
/// `\advance`/`\multiply`/`\divide` or a register/`\catcode` assignment
/// widens the write the same way `\global\def` does.
pub(crate) fn dispatch_primitive_ignoring_prefix(
    name: &str,
    global: bool,
    expander: &mut Expander,
    state: &mut DocumentState,
    loc: &Location,
) -> Result<Option<Vec<Token>>, EngineError> {
    match name {
        "advance" | "multiply" | "divide" => arithmetic::invoke(name, global, expander, state, loc),
        "iftrue" | "iffalse" | "ifnum" | "ifdim" | "ifodd" | "ifcat" | "if" | "ifx" | "ifcase" | "ifmmode" | "ifhmode" | "ifvmode" | "ifinner"
        | "ifeof" | "ifhbox" | "ifvbox" | "ifvoid" | "else" | "or" | "fi" => conditionals::invoke(name, expander, state, loc),
        "par" => Ok(Some(vec![Token::par(loc.clone())])),
        "hbox" | "vbox" | "char" | "penalty" | "kern" | "hskip" | "vskip" | "discretionary" | "parshape" | "font" | "indent" | "noindent" => {
            boxes::invoke(name, expander, state, loc)
        }
        "begingroup" => {
            state.begin_group(crate::group::GroupFlavour::SemiSimple);
            Ok(None)
        }
        "endgroup" => {
            state.end_group();
            Ok(None)
        }
        "message" | "errmessage" => {
            let text = definitions::render_raw_group_as_text(expander, state, loc)?;
            if name == "errmessage" {
                log::error!("{text}");
            } else {
                log::info!("{text}");
            }
            Ok(None)
        }
        "showthe" => {
            let tokens = definitions::the_tokens(expander, state, loc)?;
            log::info!("> {}", crate::numeric_text::tokens_to_text(&tokens));
            Ok(None)
        }
        "showbox" => {
            let index = crate::numeric::read_unsigned_number(expander, state, loc)? as u16;
            log::info!("\n{}", boxes::show_box(state, index));
            Ok(None)
        }
        "showlists" => {
            log::info!("\n{}", boxes::show_lists(state));
            Ok(None)
        }
        "special" | "shipout" => {
            // Output-driver surfaces: shipping a page and inserting a literal
            // \special are both handoffs to an external renderer, out of
            // scope here.
            log::debug!("primitive \\{name} invoked at {loc}; rendering is out of scope");
            Ok(None)
        }
        "inputlineno" => Ok(Some(crate::numeric_text::number_tokens(loc.line as i64, loc))),
        "count" | "dimen" | "skip" | "muskip" | "toks" => {
            let block = RegisterBlock::from_name(name).expect("dispatch arm lists only real block names");
            let index = crate::numeric::read_unsigned_number(expander, state, loc)? as u16;
            definitions::skip_optional_equals(expander, state)?;
            set_register(block, index, global, expander, state, loc)?;
            Ok(None)
        }
        _ => Ok(None),
    }
}

/// Direct register assignment (`\count5=3`, or the same through a
/// `\countdef`-bound alias once its index is already known): reads the
/// value matching `block`'s semantic type and writes it. The caller is
/// responsible for having already consumed the optional `=`. `global`
/// selects the restore-record-free write, the same widening `\global\def`
/// gives a control binding.
fn set_register(
    block: RegisterBlock,
    index: u16,
    global: bool,
    expander: &mut Expander,
    state: &mut DocumentState,
    loc: &Location,
) -> Result<(), EngineError> {
    match block {
        RegisterBlock::Count => {
            let value = crate::numeric::read_signed_number(expander, state, loc)?;
            if global {
                state.set_count_global(index, value);
            } else {
                state.set_count(index, value);
            }
        }
        RegisterBlock::Dimen => {
            let value = crate::numeric::read_dimen(expander, state, loc)?;
            if global {
                state.set_dimen_global(index, value);
            } else {
                state.set_dimen(index, value);
            }
        }
        RegisterBlock::Skip => {
            let value = crate::numeric::read_glue(expander, state, loc)?;
            if global {
                state.set_skip_global(index, value);
            } else {
                state.set_skip(index, value);
            }
        }
        RegisterBlock::Muskip => {
            let value = crate::numeric::read_glue(expander, state, loc)?;
            if global {
                state.set_muskip_global(index, value);
            } else {
                state.set_muskip(index, value);
            }
        }
        RegisterBlock::Toks => {
            let value = read_raw_group(expander, state, loc)?;
            if global {
                state.set_toks_global(index, value);
            } else {
                state.set_toks(index, value);
            }
        }
        RegisterBlock::Box => {
            return Err(EngineError::Control(crate::errors::ControlError::new(
                crate::errors::ControlErrorKind::TheNotFound,
                loc.clone(),
            )));
        }
    }
    Ok(())
}

/// Reads a `{…}` group without expanding its contents, used by `\uppercase`/`\lowercase` and anywhere a primitive needs
/// the literal token sequence rather than its expansion.
pub(crate) fn read_raw_group(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Vec<Token>, EngineError> {
    let open = expander.pull_raw(state)?.ok_or_else(|| crate::macros::runaway(loc))?;
    if !open.is_begin_group() {
        return Err(EngineError::Parse(crate::errors::ParseError::new(crate::errors::ParseErrorKind::PrefixMismatch, loc.clone())));
    }
    let mut depth = 1usize;
    let mut out = Vec::new();
    loop {
        let tok = expander.pull_raw(state)?.ok_or_else(|| crate::macros::runaway(loc))?;
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
