//! Top-level driver (new): wires `Source` → `Tokeniser` → `Expander` against
//! a seeded `DocumentState`, and formats the "while expanding" error trailer
//! the CLI binary prints on failure. Everything the five core subsystems do
//! is their own concern; this module just owns the order they run in.

use chrono::Local;

use crate::errors::EngineError;
use crate::expander::Expander;
use crate::location::Location;
use crate::primitives::{self, boxes};
use crate::source::Source;
use crate::state::DocumentState;
use crate::tokeniser::Tokeniser;

/// Runs `text` (attributed to `filename`, if given) to completion, building
/// the outermost vertical list. The document state is returned alongside the
/// result rather than consumed by it: on failure it still holds the call
/// stack at the point of the error, which [`format_error`] needs for its
/// trailer.
pub fn run(text: &str, filename: Option<&str>) -> (DocumentState, Result<(), EngineError>) {
    let source = match filename {
        Some(name) => Source::with_filename(text, name),
        None => Source::new(text),
    };
    let mut state = DocumentState::new(Local::now());
    primitives::seed(&mut state);
    let mut expander = Expander::new(Tokeniser::new(source));
    let result = boxes::run_document(&mut expander, &mut state);
    (state, result)
}

/// Formats an error the way asks for: `<file>:<line>:<col>:
/// <message>` followed by the offending line and a caret under the column,
/// then — if the call stack is non-empty — a "while expanding" trailer
/// naming each still-open invocation, innermost first.
pub fn format_error(err: &EngineError, state: &DocumentState, source_text: &str) -> String {
    let mut out = match err.location() {
        Some(loc) => {
            let mut s = format!("{loc}: {}\n", message_only(err));
            if let Some(excerpt) = source_line(source_text, loc) {
                s.push_str(&excerpt);
                s.push('\n');
                s.push_str(&" ".repeat(loc.col.saturating_sub(1)));
                s.push_str("^\n");
            }
            s
        }
        None => format!("{err}\n"),
    };
    for (name, loc) in state.call_stack().iter().rev() {
        out.push_str(&format!("while expanding \\{name} called at {loc}\n"));
    }
    out
}

/// `err`'s message without the `at <loc>` suffix its `Display` impl adds —
/// the location is already in the `<file>:<line>:<col>:` prefix.
fn message_only(err: &EngineError) -> String {
    match err {
        EngineError::Parse(e) => e.kind.to_string(),
        EngineError::Macro(e) => e.kind.to_string(),
        EngineError::Value(e) => e.kind.to_string(),
        EngineError::Control(e) => e.kind.to_string(),
        EngineError::Io(_) | EngineError::StdIo(_) => err.to_string(),
    }
}

fn source_line(text: &str, loc: &Location) -> Option<String> {
    text.lines().nth(loc.line.saturating_sub(1)).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_plain_text_produces_no_error() {
        let (_state, result) = run("hello world", Some("test.tex"));
        assert!(result.is_ok());
    }

    #[test]
    fn undefined_control_surfaces_as_an_error_with_location() {
        let (_state, result) = run("\\nosuchcontrol", Some("test.tex"));
        let err = result.unwrap_err();
        assert!(err.location().is_some());
    }

    #[test]
    fn format_error_includes_the_caret_line() {
        let (state, result) = run("\\nosuchcontrol", Some("test.tex"));
        let err = result.unwrap_err();
        let rendered = format_error(&err, &state, "\\nosuchcontrol");
        assert!(rendered.contains("test.tex:1:1"));
        assert!(rendered.contains('^'));
    }
}
