//! A TeX-compatible tokeniser, macro expander, and box-layout core.
//!
//! This crate implements the parts of TeX that are reusable independent of
//! any particular output format: category-code tokenising, the `\def`/`\let`
//! macro and parameter-template model, the primitive registry and document
//! state (registers, fonts, group-scoped assignment), the paragraph/box/
//! glyph layout core across TeX's six modes, and readers for the two binary
//! font formats TeX itself consumes (TFM metrics, PK bitmap glyphs).
//!
//! NOTE: This crate is still in progress and nothing, including library
//! elements, should be considered stable.
//!
//! Deliberately out of scope (see `DESIGN.md`): math-mode layout beyond
//! switching into/out of it, Knuth-Plass paragraph breakpoint *selection*
//! (breakpoint insertion and badness calculation are implemented; choosing
//! among them is not), complete output-driver rendering, and the filesystem
//! font search a caller is expected to supply.

pub mod boxes;
pub mod catcode;
pub mod cli;
pub mod control;
pub mod dimen;
pub mod engine;
pub mod errors;
pub mod expander;
pub mod font;
pub mod glue;
pub mod group;
pub mod layout;
pub mod location;
pub mod macros;
pub mod modes;
pub mod numeric;
pub mod numeric_text;
pub mod primitives;
pub mod registers;
pub mod source;
pub mod state;
pub mod token;
pub mod tokeniser;
