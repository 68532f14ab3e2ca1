//! Document state: a central mutable store keyed on control names and
//! register names, plus a handful of private fields, with a group stack
//! providing scoped undo on every assignment made while a group is open.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::boxes::Box as TexBox;
use crate::catcode::{CatCode, CatCodeTable};
use crate::control::Control;
use crate::dimen::Dimen;
use crate::errors::{ControlError, ControlErrorKind};
use crate::font::FontTable;
use crate::glue::Glue;
use crate::group::{Group, GroupFlavour, RestoreRecord};
use crate::location::Location;
use crate::modes::{DiscretionaryPenalties, Mode, ModeKind};
use crate::registers::Registers;
use crate::token::Token;

/// `\time`/`\day`/`\month`/`\year`, fixed at the document's creation moment.
#[derive(Clone, Copy, Debug)]
pub struct TimeValues {
    pub minutes_since_midnight: i64,
    pub day: i64,
    pub month: i64,
    pub year: i64,
}

impl TimeValues {
    pub fn from_timestamp(at: DateTime<Local>) -> Self {
        TimeValues {
            minutes_since_midnight: (at.hour() * 60 + at.minute()) as i64,
            day: at.day() as i64,
            month: at.month() as i64,
            year: at.year() as i64,
        }
    }
}

/// Named integer parameters outside the 256-slot `\count` block (a small
/// subset of real TeX's ~40: the ones this crate's layout core actually
/// consults).
#[derive(Clone, Debug)]
pub struct IntParams {
    pub hyphenpenalty: i64,
    pub exhyphenpenalty: i64,
    pub tolerance: i64,
    pub pretolerance: i64,
}

impl Default for IntParams {
    fn default() -> Self {
        IntParams { hyphenpenalty: 50, exhyphenpenalty: 50, tolerance: 10_000, pretolerance: 100 }
    }
}

pub struct DocumentState {
    controls: HashMap<String, Control>,
    registers: Registers,
    catcodes: CatCodeTable,
    groups: Vec<Group>,
    current_font: String,
    mode_stack: Vec<Mode>,
    parshape: Option<Vec<Dimen>>,
    /// Depth of unmatched `\if*` constructs; each level also records whether
    /// the branch currently being read is live or being skipped.
    conditional_stack: Vec<bool>,
    pub int_params: IntParams,
    pub time: TimeValues,
    /// Set while inside `\csname...\endcsname`; accumulates the expanded
    /// character tokens that will form the resulting control name.
    csname_accumulator: Option<String>,
    /// Loaded fonts, keyed by name; populated by `\font`. Actually
    /// reading a TFM file from disk is the filesystem font search this crate
    /// leaves to an external collaborator, so entries start out with empty
    /// metrics unless a caller inserts real ones.
    fonts: FontTable,
    /// Shallow stack of `(control name, invocation location)` pairs, pushed
    /// when a macro or primitive begins expanding and popped when it
    /// finishes, purely so error messages can report "while expanding \foo
    /// called at ...".
    call_stack: Vec<(String, Location)>,
}

impl DocumentState {
    pub fn new(at: DateTime<Local>) -> Self {
        DocumentState {
            controls: HashMap::new(),
            registers: Registers::default(),
            catcodes: CatCodeTable::plain(),
            groups: Vec::new(),
            current_font: String::new(),
            mode_stack: vec![Mode::new(ModeKind::Vertical)],
            parshape: None,
            conditional_stack: Vec::new(),
            int_params: IntParams::default(),
            time: TimeValues::from_timestamp(at),
            csname_accumulator: None,
            fonts: FontTable::new(),
            call_stack: Vec::new(),
        }
    }

    /// Records that `name` (called at `loc`) is now being expanded; paired
    /// with [`DocumentState::pop_call`] around each invocation site.
    pub fn push_call(&mut self, name: &str, loc: &Location) {
        self.call_stack.push((name.to_string(), loc.clone()));
    }

    pub fn pop_call(&mut self) {
        self.call_stack.pop();
    }

    /// The current call stack, outermost first — used to build the "while
    /// expanding ..." trailer on a top-level error report.
    pub fn call_stack(&self) -> &[(String, Location)] {
        &self.call_stack
    }

    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontTable {
        &mut self.fonts
    }

    // --- groups -----------------------------------------------------

    pub fn begin_group(&mut self, flavour: GroupFlavour) {
        self.groups.push(Group::new(flavour));
    }

    /// Applies a closing group's restore records in LIFO order: an
    /// `Ephemeral` group instead appends its records onto its
    /// parent (so they are undone later, when the parent itself closes); an
    /// `OnlyMode` group only ever holds `Mode` records (non-mode assignments
    /// made while it was open were routed to an outer group by
    /// [`DocumentState::record`]), so applying "its own records" and
    /// "passing non-mode restores through" collapse into the same action.
    pub fn end_group(&mut self) {
        let Some(group) = self.groups.pop() else { return };
        match group.flavour {
            GroupFlavour::Ephemeral => {
                if let Some(parent) = self.groups.last_mut() {
                    parent.records.extend(group.records);
                } else {
                    self.apply_records(group.records);
                }
            }
            GroupFlavour::Ordinary | GroupFlavour::SemiSimple | GroupFlavour::OnlyMode => {
                self.apply_records(group.records);
            }
        }
    }

    fn apply_records(&mut self, records: Vec<RestoreRecord>) {
        for record in records.into_iter().rev() {
            self.restore(record);
        }
    }

    fn restore(&mut self, record: RestoreRecord) {
        match record {
            RestoreRecord::Control { name, previous } => match previous {
                Some(c) => {
                    self.controls.insert(name, c);
                }
                None => {
                    self.controls.remove(&name);
                }
            },
            RestoreRecord::Count { index, previous } => self.registers.count[index as usize] = previous,
            RestoreRecord::DimenReg { index, previous } => self.registers.dimen[index as usize] = previous,
            RestoreRecord::SkipReg { index, previous } => self.registers.skip[index as usize] = previous,
            RestoreRecord::MuskipReg { index, previous } => self.registers.muskip[index as usize] = previous,
            RestoreRecord::ToksReg { index, previous } => self.registers.toks[index as usize] = previous,
            RestoreRecord::BoxReg { index, previous } => self.registers.boxes[index as usize] = previous,
            RestoreRecord::CatCode { ch, previous } => self.catcodes.set(ch, previous),
            RestoreRecord::CurrentFont { previous } => self.current_font = previous,
            RestoreRecord::Mode { previous } => {
                if let Some(top) = self.mode_stack.last_mut() {
                    top.kind = previous;
                }
            }
            RestoreRecord::Parshape { previous } => self.parshape = previous,
        }
    }

    /// Records an undo entry in the correct group: walks from the top of the
    /// group stack downward, skipping `OnlyMode` groups for any non-`Mode`
    /// record, so a non-mode assignment made while only `OnlyMode` groups
    /// are open lands on the nearest enclosing group that actually owns
    /// assignments.
    fn record(&mut self, entry: RestoreRecord) {
        let target = self
            .groups
            .iter_mut()
            .rev()
            .find(|g| entry.is_mode() || g.flavour != GroupFlavour::OnlyMode);
        match target {
            Some(group) => group.records.push(entry),
            None => {} // no open group: assignment is global, nothing to undo
        }
    }

    // --- controls -----------------------------------------------------

    pub fn get_control(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    pub fn set_control(&mut self, name: impl Into<String>, value: Control) {
        let name = name.into();
        let previous = self.controls.insert(name.clone(), value);
        self.record(RestoreRecord::Control { name, previous });
    }

    /// `\global`-prefixed assignment: writes the value directly without
    /// leaving a restore record, so it survives every enclosing group close.
    pub fn set_control_global(&mut self, name: impl Into<String>, value: Control) {
        self.controls.insert(name.into(), value);
    }

    // --- registers -----------------------------------------------------

    pub fn count(&self, index: u16) -> i64 {
        self.registers.count[index as usize]
    }

    pub fn set_count(&mut self, index: u16, value: i64) {
        let previous = std::mem::replace(&mut self.registers.count[index as usize], value);
        self.record(RestoreRecord::Count { index, previous });
    }

    /// `\global`-prefixed assignment: writes the value directly without
    /// leaving a restore record, so it survives every enclosing group close.
    pub fn set_count_global(&mut self, index: u16, value: i64) {
        self.registers.count[index as usize] = value;
    }

    pub fn dimen(&self, index: u16) -> Dimen {
        self.registers.dimen[index as usize]
    }

    pub fn set_dimen(&mut self, index: u16, value: Dimen) {
        let previous = std::mem::replace(&mut self.registers.dimen[index as usize], value);
        self.record(RestoreRecord::DimenReg { index, previous });
    }

    pub fn set_dimen_global(&mut self, index: u16, value: Dimen) {
        self.registers.dimen[index as usize] = value;
    }

    pub fn skip(&self, index: u16) -> Glue {
        self.registers.skip[index as usize]
    }

    pub fn set_skip(&mut self, index: u16, value: Glue) {
        let previous = std::mem::replace(&mut self.registers.skip[index as usize], value);
        self.record(RestoreRecord::SkipReg { index, previous });
    }

    pub fn set_skip_global(&mut self, index: u16, value: Glue) {
        self.registers.skip[index as usize] = value;
    }

    pub fn muskip(&self, index: u16) -> Glue {
        self.registers.muskip[index as usize]
    }

    pub fn set_muskip(&mut self, index: u16, value: Glue) {
        let previous = std::mem::replace(&mut self.registers.muskip[index as usize], value);
        self.record(RestoreRecord::MuskipReg { index, previous });
    }

    pub fn set_muskip_global(&mut self, index: u16, value: Glue) {
        self.registers.muskip[index as usize] = value;
    }

    pub fn toks(&self, index: u16) -> &[Token] {
        &self.registers.toks[index as usize]
    }

    pub fn set_toks(&mut self, index: u16, value: Vec<Token>) {
        let previous = std::mem::replace(&mut self.registers.toks[index as usize], value);
        self.record(RestoreRecord::ToksReg { index, previous });
    }

    pub fn set_toks_global(&mut self, index: u16, value: Vec<Token>) {
        self.registers.toks[index as usize] = value;
    }

    pub fn get_box(&self, index: u16) -> Option<&TexBox> {
        self.registers.boxes[index as usize].as_ref()
    }

    /// `\setbox`: also used by `\box`/`\copy`'s void-after-use semantics at
    /// the call site, which pass `None` to empty a register out.
    pub fn set_box(&mut self, index: u16, value: Option<TexBox>) {
        let previous = std::mem::replace(&mut self.registers.boxes[index as usize], value);
        self.record(RestoreRecord::BoxReg { index, previous });
    }

    pub fn set_box_global(&mut self, index: u16, value: Option<TexBox>) {
        self.registers.boxes[index as usize] = value;
    }

    // --- catcodes -----------------------------------------------------

    pub fn catcode(&self, ch: char) -> CatCode {
        self.catcodes.get(ch)
    }

    pub fn set_catcode(&mut self, ch: char, code: CatCode) {
        let previous = self.catcodes.get(ch);
        self.catcodes.set(ch, code);
        self.record(RestoreRecord::CatCode { ch, previous });
    }

    pub fn set_catcode_global(&mut self, ch: char, code: CatCode) {
        self.catcodes.set(ch, code);
    }

    // --- font / mode / parshape -----------------------------------------

    pub fn current_font(&self) -> &str {
        &self.current_font
    }

    pub fn set_current_font(&mut self, name: impl Into<String>) {
        let previous = std::mem::replace(&mut self.current_font, name.into());
        self.record(RestoreRecord::CurrentFont { previous });
    }

    pub fn current_mode(&self) -> &Mode {
        self.mode_stack.last().expect("mode stack is never empty")
    }

    pub fn current_mode_mut(&mut self) -> &mut Mode {
        self.mode_stack.last_mut().expect("mode stack is never empty")
    }

    /// The full mode stack, outermost first; used by `\showlists`' diagnostic
    /// dump.
    pub fn modes(&self) -> &[Mode] {
        &self.mode_stack
    }

    pub fn push_mode(&mut self, kind: ModeKind) {
        self.mode_stack.push(Mode::new(kind));
    }

    pub fn pop_mode(&mut self) -> Option<Mode> {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop()
        } else {
            None
        }
    }

    pub fn set_mode(&mut self, kind: ModeKind) {
        let previous = self.current_mode().kind;
        self.current_mode_mut().kind = kind;
        self.record(RestoreRecord::Mode { previous });
    }

    pub fn parshape(&self) -> Option<&[Dimen]> {
        self.parshape.as_deref()
    }

    pub fn set_parshape(&mut self, value: Option<Vec<Dimen>>) {
        let previous = std::mem::replace(&mut self.parshape, value);
        self.record(RestoreRecord::Parshape { previous });
    }

    pub fn discretionary_penalties(&self) -> DiscretionaryPenalties {
        DiscretionaryPenalties {
            hyphenpenalty: self.int_params.hyphenpenalty as i32,
            exhyphenpenalty: self.int_params.exhyphenpenalty as i32,
        }
    }

    // --- conditional stack ------------------------------------------------

    pub fn conditional_depth(&self) -> usize {
        self.conditional_stack.len()
    }

    pub fn push_conditional(&mut self, branch_is_live: bool) {
        self.conditional_stack.push(branch_is_live);
    }

    pub fn pop_conditional(&mut self) -> Option<bool> {
        self.conditional_stack.pop()
    }

    pub fn current_conditional_live(&self) -> Option<bool> {
        self.conditional_stack.last().copied()
    }

    // --- \csname ------------------------------------------------------

    pub fn begin_csname(&mut self) {
        self.csname_accumulator = Some(String::new());
    }

    pub fn push_csname_char(&mut self, ch: char) {
        if let Some(acc) = &mut self.csname_accumulator {
            acc.push(ch);
        }
    }

    /// Closes `\csname...\endcsname`, returning the accumulated name; if it
    /// names a control with no meaning yet, the caller should bind it to
    /// `\relax`, matching plain TeX's "every csname has *some* meaning".
    pub fn end_csname(&mut self, loc: &Location) -> Result<String, ControlError> {
        self.csname_accumulator
            .take()
            .ok_or_else(|| ControlError::new(ControlErrorKind::EndcsnameWithoutCsname, loc.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state() -> DocumentState {
        let at = Local.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        DocumentState::new(at)
    }

    #[test]
    fn ordinary_group_restores_on_close() {
        let mut s = state();
        s.set_count(5, 1);
        s.begin_group(GroupFlavour::Ordinary);
        s.set_count(5, 99);
        assert_eq!(s.count(5), 99);
        s.end_group();
        assert_eq!(s.count(5), 1);
    }

    #[test]
    fn only_mode_group_routes_non_mode_assignments_to_parent() {
        let mut s = state();
        s.begin_group(GroupFlavour::Ordinary);
        s.begin_group(GroupFlavour::OnlyMode);
        s.set_count(7, 42);
        s.set_mode(ModeKind::Horizontal);
        s.end_group(); // closes OnlyMode: restores mode only
        assert_eq!(s.current_mode().kind, ModeKind::Vertical);
        assert_eq!(s.count(7), 42); // still set: record was routed to the Ordinary group
        s.end_group(); // closes Ordinary: now the count assignment unwinds
        assert_eq!(s.count(7), 0);
    }

    #[test]
    fn ephemeral_group_appends_records_to_parent_instead_of_applying() {
        let mut s = state();
        s.begin_group(GroupFlavour::Ordinary);
        s.set_count(3, 1);
        s.begin_group(GroupFlavour::Ephemeral);
        s.set_count(3, 2);
        s.end_group(); // ephemeral close: does NOT restore yet
        assert_eq!(s.count(3), 2);
        s.end_group(); // parent close: both records unwind in order
        assert_eq!(s.count(3), 0);
    }

    #[test]
    fn catcode_assignment_is_scoped() {
        let mut s = state();
        s.begin_group(GroupFlavour::Ordinary);
        s.set_catcode('~', CatCode::Letter);
        assert_eq!(s.catcode('~'), CatCode::Letter);
        s.end_group();
        assert_eq!(s.catcode('~'), CatCode::Active);
    }

    #[test]
    fn global_count_assignment_survives_group_close() {
        let mut s = state();
        s.begin_group(GroupFlavour::Ordinary);
        s.set_count_global(5, 99);
        s.end_group();
        assert_eq!(s.count(5), 99);
    }

    #[test]
    fn global_catcode_assignment_survives_group_close() {
        let mut s = state();
        s.begin_group(GroupFlavour::Ordinary);
        s.set_catcode_global('~', CatCode::Letter);
        s.end_group();
        assert_eq!(s.catcode('~'), CatCode::Letter);
    }

    #[test]
    fn time_values_are_fixed_at_construction() {
        let s = state();
        assert_eq!(s.time.year, 2026);
        assert_eq!(s.time.month, 8);
        assert_eq!(s.time.day, 1);
        assert_eq!(s.time.minutes_since_midnight, 12 * 60);
    }
}
