//! Error taxonomy: one `thiserror` enum per subsystem, unified under a
//! top-level error with `#[from]` conversions so `?` works across module
//! boundaries.

use crate::location::Location;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Macro(#[from] MacroError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Io(#[from] FontIoError),
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl EngineError {
    /// The location to point a caret at, if the underlying error carries one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            EngineError::Parse(e) => Some(&e.loc),
            EngineError::Macro(e) => Some(&e.loc),
            EngineError::Value(e) => Some(&e.loc),
            EngineError::Control(e) => Some(&e.loc),
            EngineError::Io(_) | EngineError::StdIo(_) => None,
        }
    }
}

/// Tokenisation or syntax-level issue: bad number, missing unit, malformed
/// parameter template, unmatched groups, unknown category.
#[derive(thiserror::Error, Debug)]
#[error("{kind} at {loc}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub loc: Location,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, loc: Location) -> Self {
        ParseError { kind, loc }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expected a number but found {0:?}")]
    ExpectedNumber(String),
    #[error("dimens need a unit, but none was found")]
    MissingUnit,
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    #[error("unknown category code {0}")]
    UnknownCategory(u8),
    #[error("invalid character in strict mode: {0:?}")]
    InvalidCharacter(char),
    #[error("parameter markers must appear in ascending order (1,2,3,...); got #{0} out of order")]
    ParameterOrder(u8),
    #[error("literal prefix before the first parameter did not match the input")]
    PrefixMismatch,
    #[error("group stack was not empty at end of input ({0} unmatched)")]
    UnmatchedGroups(usize),
    #[error("unexpected end of group")]
    UnmatchedEndGroup,
}

/// Semantic problem in control invocation: undefined control, outer in a
/// forbidden context, `\par` under `no_par`.
#[derive(thiserror::Error, Debug)]
#[error("{kind} at {loc}")]
pub struct MacroError {
    pub kind: MacroErrorKind,
    pub loc: Location,
}

impl MacroError {
    pub fn new(kind: MacroErrorKind, loc: Location) -> Self {
        MacroError { kind, loc }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MacroErrorKind {
    #[error("undefined control sequence \\{0}")]
    UndefinedControl(String),
    #[error("\\{0} is an outer macro and may not appear here")]
    ForbiddenOuter(String),
    #[error("\\par appeared inside the argument of a non-long macro")]
    ParUnderNoPar,
    #[error("runaway argument: no matching delimiter found before end of input")]
    RunawayArgument,
}

/// Arithmetic mismatch: different infinity orders, different unit classes,
/// dividing by zero, negative `\ifcase` selector.
#[derive(thiserror::Error, Debug)]
#[error("{kind} at {loc}")]
pub struct ValueError {
    pub kind: ValueErrorKind,
    pub loc: Location,
}

impl ValueError {
    pub fn new(kind: ValueErrorKind, loc: Location) -> Self {
        ValueError { kind, loc }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValueErrorKind {
    #[error("cannot combine glue of different infinity orders")]
    DifferentInfinityOrders,
    #[error("cannot combine values of different unit classes")]
    DifferentUnitClasses,
    #[error("division by zero")]
    DivisionByZero,
    #[error("\\ifcase selector must not be negative, got {0}")]
    NegativeIfcaseSelector(i64),
}

/// Structural use errors: `\endcsname` without `\csname`, `\the` of a
/// non-thing.
#[derive(thiserror::Error, Debug)]
#[error("{kind} at {loc}")]
pub struct ControlError {
    pub kind: ControlErrorKind,
    pub loc: Location,
}

impl ControlError {
    pub fn new(kind: ControlErrorKind, loc: Location) -> Self {
        ControlError { kind, loc }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ControlErrorKind {
    #[error("\\endcsname used without a preceding \\csname")]
    EndcsnameWithoutCsname,
    #[error("\\the cannot produce a textual value for this control")]
    TheNotFound,
    #[error("\\let's right-hand side must be a control or active character")]
    LetInvalidRhs,
}

/// Binary font-format issues: TFM length mismatch, malformed PK packet,
/// missing font file.
#[derive(thiserror::Error, Debug)]
pub enum FontIoError {
    #[error("TFM file length mismatch: header claims {claimed} words, sub-tables sum to {actual}")]
    TfmLengthMismatch { claimed: u32, actual: u32 },
    #[error("TFM coding scheme string is not valid Pascal-string data")]
    TfmBadCodingScheme,
    #[error("PK preamble has bad id byte {0}, expected 89")]
    PkBadId(u8),
    #[error("PK command byte {0} is reserved/invalid")]
    PkInvalidCommand(u8),
    #[error("PK glyph row overshoot: wrote past the declared width")]
    PkRowOvershoot,
    #[error("PK long-form character packets are not implemented")]
    PkLongFormUnimplemented,
    #[error("PK repeat count specified twice on the same line")]
    PkNestedRepeat,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
