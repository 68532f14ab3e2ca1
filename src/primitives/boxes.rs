//! `\hbox`/`\vbox`/`\char`/`\kern`/`\penalty`/`\hskip`/`\vskip`/
//! `\discretionary`/`\parshape`/`\font`/`\indent`/`\noindent`:
//! the commands that feed items and gismos into the current [`crate::modes::Mode`].

use crate::boxes::{Box as TexBox, BoxKind, Direction, Gismo};
use crate::catcode::CatCode;
use crate::control::Control;
use crate::dimen::Dimen;
use crate::errors::{EngineError, ParseError, ParseErrorKind};
use crate::expander::{Expander, Level};
use crate::font::{Font, TfmFont};
use crate::location::Location;
use crate::modes::{Handled, Item, ModeKind};
use crate::numeric;
use crate::state::DocumentState;
use crate::token::Token;

pub fn invoke(name: &str, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    match name {
        "hbox" => {
            let b = build_box(ModeKind::RestrictedHorizontal, expander, state, loc)?;
            submit_item(Item::Gismo(Gismo::Box(b)), state)?;
            Ok(None)
        }
        "vbox" => {
            let b = build_box(ModeKind::InternalVertical, expander, state, loc)?;
            submit_item(Item::Gismo(Gismo::Box(b)), state)?;
            Ok(None)
        }
        "char" => {
            let code = numeric::read_unsigned_number(expander, state, loc)?;
            let ch = char::from_u32(code as u32).unwrap_or('\u{FFFD}');
            let font = state.current_font().to_string();
            submit_item(Item::Char { ch, font, loc: loc.clone() }, state)?;
            Ok(None)
        }
        "kern" => {
            let d = numeric::read_dimen(expander, state, loc)?;
            append_gismo(Gismo::Kern(d), state);
            Ok(None)
        }
        "penalty" => {
            let n = numeric::read_signed_number(expander, state, loc)?;
            append_gismo(Gismo::Penalty(n as i32), state);
            Ok(None)
        }
        "hskip" | "vskip" => {
            let glue = numeric::read_glue(expander, state, loc)?;
            let direction = if name == "hskip" { Direction::Horizontal } else { Direction::Vertical };
            append_gismo(Gismo::Leader { glue, direction }, state);
            Ok(None)
        }
        "discretionary" => discretionary(expander, state, loc),
        "parshape" => parshape(expander, state, loc),
        "font" => font_def(expander, state, loc),
        // Real TeX inserts (or suppresses) an empty `\parindent`-wide box at
        // the start of a paragraph; nothing downstream of this crate reads
        // that box, so both are no-ops.
        "indent" | "noindent" => Ok(None),
        _ => unreachable!("dispatch only routes box-family names here"),
    }
}

fn submit_item(mut item: Item, state: &mut DocumentState) -> Result<(), EngineError> {
    let fonts = state.fonts().clone();
    let penalties = state.discretionary_penalties();
    loop {
        match state.current_mode_mut().handle(item, &fonts, penalties).map_err(EngineError::Parse)? {
            Handled::Consumed | Handled::PageBuilderShouldRun => return Ok(()),
            Handled::SwitchAndResubmit(new_kind, resubmit) => {
                state.current_mode_mut().kind = new_kind;
                item = resubmit;
            }
        }
    }
}

fn append_gismo(g: Gismo, state: &mut DocumentState) {
    let axis = state.current_mode().kind.axis();
    let penalties = state.discretionary_penalties();
    crate::modes::hbox_append(&mut state.current_mode_mut().list, g, axis, penalties);
}

enum BoxSpec {
    Natural,
    To(Dimen),
    Spread(Dimen),
}

/// Matches a case-insensitive keyword: pushes everything back
/// and reports no match if the input diverges partway through.
fn match_keyword(expander: &mut Expander, state: &mut DocumentState, keyword: &str, loc: &Location) -> Result<bool, EngineError> {
    loop {
        match expander.pull(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    let mut consumed = Vec::new();
    for want in keyword.chars() {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if ch.to_ascii_lowercase() == want => {
                consumed.push(Token::Char { ch, catcode: CatCode::Letter, loc: loc.clone() });
            }
            Some(tok) => {
                consumed.push(tok);
                expander.push_back(consumed);
                return Ok(false);
            }
            None => {
                expander.push_back(consumed);
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn read_box_spec(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<BoxSpec, EngineError> {
    if match_keyword(expander, state, "to", loc)? {
        Ok(BoxSpec::To(numeric::read_dimen(expander, state, loc)?))
    } else if match_keyword(expander, state, "spread", loc)? {
        Ok(BoxSpec::Spread(numeric::read_dimen(expander, state, loc)?))
    } else {
        Ok(BoxSpec::Natural)
    }
}

/// Sums gismos' natural extents along `axis`, leaders included — mirrors
/// `crate::layout::fit_to`'s private `split_natural` since this module has
/// no access to it.
fn natural_extent(gismos: &[Gismo], axis: Direction) -> Dimen {
    let mut total = Dimen::ZERO;
    for g in gismos {
        match g {
            Gismo::Leader { glue, direction } if *direction == axis => total = total.checked_add(glue.natural),
            Gismo::Breakpoint { .. } => {}
            other => total = total.checked_add(other.natural_length(axis)),
        }
    }
    total
}

fn hbox_metrics(gismos: &[Gismo]) -> (Dimen, Dimen, Dimen) {
    let width = natural_extent(gismos, Direction::Horizontal);
    let mut height = Dimen::ZERO;
    let mut depth = Dimen::ZERO;
    for g in gismos {
        if let Gismo::Box(b) = g {
            height = height.max(b.height);
            depth = depth.max(b.depth);
        }
    }
    (width, height, depth)
}

/// Plain TeX's `\vbox` metrics convention: height is the stack's total
/// extent minus the depth of its last box, and that last box's depth
/// becomes the vbox's own depth.
fn vbox_metrics(gismos: &[Gismo]) -> (Dimen, Dimen, Dimen) {
    let total = natural_extent(gismos, Direction::Vertical);
    let last_depth = gismos
        .iter()
        .rev()
        .find_map(|g| if let Gismo::Box(b) = g { Some(b.depth) } else { None })
        .unwrap_or(Dimen::ZERO);
    let width = gismos
        .iter()
        .filter_map(|g| if let Gismo::Box(b) = g { Some(b.width) } else { None })
        .fold(Dimen::ZERO, Dimen::max);
    (width, total.checked_sub(last_depth), last_depth)
}

/// Reads a `{…}` group, executing its contents against a freshly pushed
/// mode, and returns the resulting box with its metrics computed from its
/// gismo list. Used directly by `\discretionary`'s three branches, and
/// wrapped by [`build_box`] for `\hbox`/`\vbox`'s `to`/`spread` handling.
fn read_box_contents(kind: ModeKind, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<TexBox, EngineError> {
    let open = expander.pull_raw(state)?.ok_or_else(|| crate::macros::runaway(loc))?;
    if !open.is_begin_group() {
        return Err(EngineError::Parse(ParseError::new(ParseErrorKind::PrefixMismatch, loc.clone())));
    }
    state.push_mode(kind);

    let saved_level = expander.level;
    expander.level = Level::Executing;
    let body = run_box_body(expander, state, loc);
    expander.level = saved_level;
    body?;

    let mode = state.pop_mode().expect("read_box_contents pushed exactly one mode above");
    let box_kind = if kind.is_horizontal() { BoxKind::HBox } else { BoxKind::VBox };
    let mut tex_box = TexBox::new(box_kind);
    tex_box.gismos = mode.list;
    let (w, h, d) = if kind.is_horizontal() { hbox_metrics(&tex_box.gismos) } else { vbox_metrics(&tex_box.gismos) };
    tex_box.width = w;
    tex_box.height = h;
    tex_box.depth = d;
    Ok(tex_box)
}

fn run_box_body(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<(), EngineError> {
    let mut depth = 1usize;
    loop {
        let Some(tok) = expander.pull(state)? else { return Err(crate::macros::runaway(loc)) };
        if tok.is_begin_group() {
            depth += 1;
            continue;
        }
        if tok.is_end_group() {
            depth -= 1;
            if depth == 0 {
                return Ok(());
            }
            continue;
        }
        let Some(item) = token_to_item(tok, state) else { continue };
        submit_item(item, state)?;
    }
}

/// Drives the outermost vertical list to end of input: the top-level
/// analogue of [`run_box_body`], with no enclosing group to close and no
/// bound on how much input it consumes. Used by the top-level driver.
pub(crate) fn run_document(expander: &mut Expander, state: &mut DocumentState) -> Result<(), EngineError> {
    while let Some(tok) = expander.pull(state)? {
        if tok.is_begin_group() || tok.is_end_group() {
            // the expander already applied the corresponding group-stack
            // side effect in `pull`; nothing further to do here.
            continue;
        }
        let Some(item) = token_to_item(tok, state) else { continue };
        submit_item(item, state)?;
    }
    Ok(())
}

fn token_to_item(tok: Token, state: &DocumentState) -> Option<Item> {
    match tok {
        Token::Char { catcode: CatCode::Space, loc, .. } => Some(Item::Space { loc }),
        Token::Char { ch, loc, .. } => Some(Item::Char { ch, font: state.current_font().to_string(), loc }),
        // \par inside an explicitly built box has no enclosing paragraph to
        // end; real TeX forbids it in restricted horizontal mode and this
        // crate does not model the outer-vertical paragraph machinery, so
        // it is simply dropped.
        Token::Par { .. } => None,
        _ => None,
    }
}

fn build_box(kind: ModeKind, expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<TexBox, EngineError> {
    let spec = read_box_spec(expander, state, loc)?;
    let mut b = read_box_contents(kind, expander, state, loc)?;
    let axis = kind.axis();
    match spec {
        BoxSpec::Natural => {}
        BoxSpec::To(target) => apply_target(&mut b, kind, axis, target),
        BoxSpec::Spread(extra) => {
            let natural = natural_extent(&b.gismos, axis);
            apply_target(&mut b, kind, axis, natural.checked_add(extra));
        }
    }
    Ok(b)
}

fn apply_target(b: &mut TexBox, kind: ModeKind, axis: Direction, target: Dimen) {
    crate::layout::fit_to(b, axis, target);
    if kind.is_horizontal() {
        b.width = target;
    } else {
        b.height = target.checked_sub(b.depth);
    }
}

fn discretionary(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let prebreak = read_box_contents(ModeKind::RestrictedHorizontal, expander, state, loc)?.gismos;
    let postbreak = read_box_contents(ModeKind::RestrictedHorizontal, expander, state, loc)?.gismos;
    let nobreak = read_box_contents(ModeKind::RestrictedHorizontal, expander, state, loc)?.gismos;
    append_gismo(Gismo::Discretionary { prebreak, postbreak, nobreak }, state);
    Ok(None)
}

fn parshape(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let n = numeric::read_unsigned_number(expander, state, loc)?;
    if n <= 0 {
        state.set_parshape(None);
        return Ok(None);
    }
    let mut values = Vec::with_capacity(n as usize * 2);
    for _ in 0..n {
        values.push(numeric::read_dimen(expander, state, loc)?);
        values.push(numeric::read_dimen(expander, state, loc)?);
    }
    state.set_parshape(Some(values));
    Ok(None)
}

fn expect_control_name(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<String, EngineError> {
    let tok = expander.pull_raw(state)?.ok_or_else(|| crate::macros::runaway(loc))?;
    tok.control_name().ok_or_else(|| EngineError::Parse(ParseError::new(ParseErrorKind::PrefixMismatch, loc.clone())))
}

fn skip_optional_equals(expander: &mut Expander, state: &mut DocumentState) -> Result<(), EngineError> {
    loop {
        match expander.pull(state)? {
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

/// Reads a bare filename token run (letters/other characters up to the
/// next space or control), the way plain TeX scans `\font`'s external name
/// before its optional `at`/`scaled` clause.
fn read_file_name(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<String, EngineError> {
    loop {
        match expander.pull(state)? {
            Some(tok) if tok.is_space() => continue,
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    let mut name = String::new();
    loop {
        match expander.pull(state)? {
            Some(Token::Char { ch, .. }) if !ch.is_whitespace() => name.push(ch),
            Some(tok) => {
                expander.push_back(vec![tok]);
                break;
            }
            None => break,
        }
    }
    if name.is_empty() {
        return Err(EngineError::Parse(ParseError::new(ParseErrorKind::ExpectedNumber("font file name".into()), loc.clone())));
    }
    Ok(name)
}

/// Recursive text dump of a box's gismo tree, one line per entry indented by
/// nesting depth — the format `\showbox` names precisely and
/// `\showlists` reuses per mode.
pub(crate) fn describe_box(b: &TexBox, depth: usize) -> String {
    let pad = "  ".repeat(depth);
    let mut out = format!("{pad}\\{} (w={}, h={}, d={})\n", box_kind_name(&b.kind), b.width.sp, b.height.sp, b.depth.sp);
    for g in &b.gismos {
        out.push_str(&describe_gismo(g, depth + 1));
    }
    out
}

fn box_kind_name(kind: &BoxKind) -> &'static str {
    match kind {
        BoxKind::HBox => "hbox",
        BoxKind::VBox => "vbox",
        BoxKind::Rule => "rule",
        BoxKind::CharBox { .. } => "char",
        BoxKind::WordBox { .. } => "word",
    }
}

fn describe_gismo(g: &Gismo, depth: usize) -> String {
    let pad = "  ".repeat(depth);
    match g {
        Gismo::Box(b) => describe_box(b, depth),
        Gismo::Leader { glue, .. } => format!("{pad}glue {}sp\n", glue.natural.sp),
        Gismo::Kern(d) => format!("{pad}kern {}sp\n", d.sp),
        Gismo::Penalty(p) => format!("{pad}penalty {p}\n"),
        Gismo::Discretionary { .. } => format!("{pad}discretionary\n"),
        Gismo::MathSwitch => format!("{pad}math switch\n"),
        Gismo::Whatsit(_) => format!("{pad}whatsit\n"),
        Gismo::Breakpoint { penalty } => format!("{pad}breakpoint {penalty}\n"),
    }
}

/// `\showbox<number>`: dumps a box register's contents, or notes
/// that it is void.
pub(crate) fn show_box(state: &DocumentState, index: u16) -> String {
    match state.get_box(index) {
        Some(b) => describe_box(b, 0),
        None => format!("\\box{index}=void\n"),
    }
}

/// `\showlists`: dumps every open
/// mode's current list, outermost first.
pub(crate) fn show_lists(state: &DocumentState) -> String {
    let mut out = String::new();
    for (depth, mode) in state.modes().iter().enumerate() {
        out.push_str(&format!("### mode {depth}: {:?}\n", mode.kind));
        for g in &mode.list {
            out.push_str(&describe_gismo(g, 1));
        }
    }
    out
}

/// `\font\cs=name[ at <dimen> | scaled <number>]`: binds a
/// [`Control::FontSelector`] and registers an empty-metrics placeholder, since
/// locating and parsing the actual TFM file is a filesystem concern left to
/// external collaborators.
fn font_def(expander: &mut Expander, state: &mut DocumentState, loc: &Location) -> Result<Option<Vec<Token>>, EngineError> {
    let cs = expect_control_name(expander, state, loc)?;
    skip_optional_equals(expander, state)?;
    let filename = read_file_name(expander, state, loc)?;

    if match_keyword(expander, state, "at", loc)? {
        let _ = numeric::read_dimen(expander, state, loc)?;
    } else if match_keyword(expander, state, "scaled", loc)? {
        let _ = numeric::read_unsigned_number(expander, state, loc)?;
    }

    state.set_control(cs, Control::FontSelector(filename.clone()));
    if state.fonts().get(&filename).is_none() {
        state.fonts_mut().insert(Font::new(filename, TfmFont::empty()));
    }
    Ok(None)
}
