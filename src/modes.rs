//! Modes and the item-dispatch loop. A [`Mode`] owns a current
//! list and decides how an incoming item is folded into it.

use serde::{Deserialize, Serialize};

use crate::boxes::{Box as TexBox, BoxKind, Direction, Gismo};
use crate::dimen::Dimen;
use crate::errors::{ParseError, ParseErrorKind};
use crate::font::FontTable;
use crate::location::Location;
use crate::token::Token;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModeKind {
    Vertical,
    InternalVertical,
    Horizontal,
    RestrictedHorizontal,
    Math,
    DisplayMath,
}

impl ModeKind {
    pub fn is_vertical(self) -> bool {
        matches!(self, ModeKind::Vertical | ModeKind::InternalVertical)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, ModeKind::Horizontal | ModeKind::RestrictedHorizontal)
    }

    pub fn is_math(self) -> bool {
        matches!(self, ModeKind::Math | ModeKind::DisplayMath)
    }

    pub fn is_outer(self) -> bool {
        matches!(self, ModeKind::Vertical | ModeKind::Horizontal)
    }

    pub fn axis(self) -> Direction {
        if self.is_horizontal() { Direction::Horizontal } else { Direction::Vertical }
    }
}

/// The per-mode affinity an unexpandable control declares"): whether it may run in the current mode, or which mode
/// it switches into first.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModeAffinity {
    Forbidden,
    SwitchVertical,
    SwitchHorizontal,
    RunsHere,
}

/// An item handed to [`Mode::handle`]: either an unexpanded-to-a-box token,
/// or a fully-formed box/gismo arriving from a nested mode.
pub enum Item {
    Char { ch: char, font: String, loc: Location },
    Space { loc: Location },
    SubOrSuperscript { loc: Location },
    Gismo(Gismo),
}

pub struct Mode {
    pub kind: ModeKind,
    pub list: Vec<Gismo>,
}

/// The outcome of handing an item to a mode: either it was consumed, or the
/// mode needs to switch first and have the item resubmitted.
pub enum Handled {
    Consumed,
    SwitchAndResubmit(ModeKind, Item),
    PageBuilderShouldRun,
}

impl Mode {
    pub fn new(kind: ModeKind) -> Self {
        Mode { kind, list: Vec::new() }
    }

    pub fn handle(
        &mut self,
        item: Item,
        fonts: &FontTable,
        penalties: DiscretionaryPenalties,
    ) -> Result<Handled, ParseError> {
        match item {
            Item::Char { ch, font, loc } => {
                if self.kind.is_vertical() {
                    return Ok(Handled::SwitchAndResubmit(
                        ModeKind::Horizontal,
                        Item::Char { ch, font, loc },
                    ));
                }
                if self.kind.is_horizontal() {
                    self.append_char(ch, &font, fonts);
                    return Ok(Handled::Consumed);
                }
                // math: queued as-is, math-list assembly is out of scope.
                self.list.push(Gismo::Box(TexBox::new(BoxKind::CharBox {
                    font,
                    ch,
                    ligature_source: None,
                })));
                Ok(Handled::Consumed)
            }
            Item::Space { loc } => {
                if self.kind.is_horizontal() {
                    self.append_leader_interword();
                    Ok(Handled::Consumed)
                } else {
                    let _ = loc;
                    Ok(Handled::Consumed)
                }
            }
            Item::SubOrSuperscript { loc } => {
                if self.kind.is_math() {
                    Ok(Handled::Consumed)
                } else {
                    Err(ParseError::new(ParseErrorKind::ExpectedNumber("^ or _ outside math".into()), loc))
                }
            }
            Item::Gismo(g) => {
                crate::modes::hbox_append(&mut self.list, g, self.kind.axis(), penalties);
                if self.kind == ModeKind::Vertical {
                    Ok(Handled::PageBuilderShouldRun)
                } else {
                    Ok(Handled::Consumed)
                }
            }
        }
    }

    fn append_char(&mut self, ch: char, font: &str, fonts: &FontTable) {
        let needs_new_word = !matches!(
            self.list.last(),
            Some(Gismo::Box(TexBox { kind: BoxKind::WordBox { font: f }, .. })) if f == font
        );
        if needs_new_word {
            self.list.push(Gismo::Box(TexBox::new(BoxKind::WordBox { font: font.to_string() })));
        }
        if let Some(Gismo::Box(word)) = self.list.last_mut() {
            fonts.append_to_word(word, ch);
        }
    }

    fn append_leader_interword(&mut self) {
        use crate::glue::{Glue, GlueComponent};
        let glue = Glue::new(
            Dimen::from_pt(3.3333),
            GlueComponent::finite(Dimen::from_pt(1.66665)),
            GlueComponent::finite(Dimen::from_pt(1.11112)),
        );
        self.list.push(Gismo::Leader { glue, direction: Direction::Horizontal });
    }
}

/// Token still needed as a parameter type in some call sites; re-exported
/// here so `modes` doesn't force every caller to import `crate::token`.
pub type ModeToken = Token;

/// The two named integer parameters `HBox::append` needs to choose a
/// `Discretionary`'s breakpoint penalty: `\hyphenpenalty` when
/// its pre-break text is empty (a plain hyphenation point), `\exhyphenpenalty`
/// otherwise (a break after an explicit hyphen already in the text).
#[derive(Clone, Copy, Debug)]
pub struct DiscretionaryPenalties {
    pub hyphenpenalty: i32,
    pub exhyphenpenalty: i32,
}

impl Default for DiscretionaryPenalties {
    fn default() -> Self {
        DiscretionaryPenalties { hyphenpenalty: 50, exhyphenpenalty: 50 }
    }
}

/// Implements breakpoint-insertion rule for `HBox::append`
/// (generalised to either axis so it also backs `VBox`): before appending a
/// glue after a non-discardable item, insert a zero-penalty breakpoint;
/// before a glue after a `Kern` or math-off switch, the breakpoint goes
/// *before* that prior item instead. Penalty items become breakpoints
/// carrying their own demerit.
pub fn hbox_append(list: &mut Vec<Gismo>, item: Gismo, axis: Direction, penalties: DiscretionaryPenalties) {
    match &item {
        Gismo::Leader { direction, .. } if *direction == axis => {
            match list.last() {
                Some(Gismo::Kern(_)) | Some(Gismo::MathSwitch) => {
                    let moved = list.pop().unwrap();
                    list.push(Gismo::Breakpoint { penalty: 0 });
                    list.push(moved);
                }
                Some(last) if !last.is_discardable() => {
                    list.push(Gismo::Breakpoint { penalty: 0 });
                }
                _ => {}
            }
            list.push(item);
        }
        Gismo::Penalty(p) => {
            list.push(Gismo::Breakpoint { penalty: *p });
            list.push(item);
        }
        Gismo::Discretionary { prebreak, .. } => {
            let penalty = if prebreak.is_empty() { penalties.hyphenpenalty } else { penalties.exhyphenpenalty };
            list.push(Gismo::Breakpoint { penalty });
            list.push(item);
        }
        _ => list.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glue::{Glue, GlueComponent};

    fn glue_gismo() -> Gismo {
        Gismo::Leader {
            glue: Glue::new(Dimen::from_pt(1.0), GlueComponent::zero(), GlueComponent::zero()),
            direction: Direction::Horizontal,
        }
    }

    #[test]
    fn breakpoint_inserted_before_glue_after_non_discardable() {
        let mut list = vec![Gismo::Box(TexBox::hbox())];
        hbox_append(&mut list, glue_gismo(), Direction::Horizontal, DiscretionaryPenalties::default());
        assert!(matches!(list[1], Gismo::Breakpoint { penalty: 0 }));
    }

    #[test]
    fn breakpoint_moves_before_a_preceding_kern() {
        let mut list = vec![Gismo::Box(TexBox::hbox()), Gismo::Kern(Dimen::from_pt(2.0))];
        hbox_append(&mut list, glue_gismo(), Direction::Horizontal, DiscretionaryPenalties::default());
        assert!(matches!(list[1], Gismo::Breakpoint { penalty: 0 }));
        assert!(matches!(list[2], Gismo::Kern(_)));
    }

    #[test]
    fn penalty_becomes_a_breakpoint_with_its_demerit() {
        let mut list = vec![];
        hbox_append(&mut list, Gismo::Penalty(-100), Direction::Horizontal, DiscretionaryPenalties::default());
        assert!(matches!(list[0], Gismo::Breakpoint { penalty: -100 }));
    }
}
