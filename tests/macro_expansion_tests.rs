//! Black-box scenarios driving the whole tokeniser/expander/state pipeline
//! through `texcore::engine::run`, rather than exercising one module's
//! internals directly.

use texcore::engine;

fn run_ok(text: &str) -> texcore::state::DocumentState {
    let (state, result) = engine::run(text, Some("test.tex"));
    result.unwrap_or_else(|e| panic!("expected success, got {e}"));
    state
}

#[test]
fn simple_def_expands_its_body() {
    let state = run_ok("\\def\\greeting{hello}\\edef\\capture{\\greeting}");
    match state.get_control("capture") {
        Some(texcore::control::Control::Macro(mac)) => {
            assert!(mac.param_template.is_empty());
            assert_eq!(mac.replacement.len(), 5); // "hello"
        }
        other => panic!("expected a macro binding, got {other:?}"),
    }
}

#[test]
fn delimited_parameter_splits_on_literal_text() {
    // TeXbook p200 flavour: \def\split#1,#2;{second=#2 first=#1}
    let state = run_ok(
        "\\def\\split#1,#2;{second=#2 first=#1}\\edef\\out{\\split ab,cd;}",
    );
    let Some(texcore::control::Control::Macro(mac)) = state.get_control("out") else {
        panic!("expected \\out to be bound");
    };
    let rendered: String = mac
        .replacement
        .iter()
        .map(|item| match item {
            texcore::control::ReplacementItem::Literal(tok) => match tok {
                texcore::token::Token::Char { ch, .. } => ch.to_string(),
                _ => String::new(),
            },
            texcore::control::ReplacementItem::Param(_) => String::new(),
        })
        .collect();
    assert_eq!(rendered, "second=cd first=ab");
}

#[test]
fn outer_macro_is_forbidden_inside_a_macro_argument() {
    let (_state, result) = engine::run("\\outer\\def\\stop{!}\\def\\wrap#1{[#1]}\\wrap{\\stop}", Some("t.tex"));
    assert!(result.is_err(), "an \\outer macro used as another macro's argument must be rejected");
}

#[test]
fn let_captures_the_meaning_at_the_time_not_a_live_reference_texbook_p206() {
    // \let\a=\original \let\b=\a each capture \original's *current* meaning
    // by value, so redefining \original afterward must not retroactively
    // change \a or \b.
    let state = run_ok(
        "\\def\\original{orig}\\let\\a=\\original\\let\\b=\\a\\def\\original{changed}",
    );
    for name in ["a", "b"] {
        let Some(texcore::control::Control::Macro(mac)) = state.get_control(name) else {
            panic!("expected \\{name} to hold the captured macro meaning");
        };
        assert_eq!(mac.replacement.len(), 4, "\\{name} should still read \"orig\", not \"changed\"");
    }
}

#[test]
fn catcode_mutation_is_scoped_to_the_enclosing_group() {
    let state = run_ok("{\\catcode`\\~=11 }");
    // group closed: the mutation should have been undone
    assert_eq!(state.catcode('~'), texcore::catcode::CatCode::Active);
}

#[test]
fn catcode_mutation_survives_without_a_group() {
    let state = run_ok("\\catcode`\\~=11 ");
    assert_eq!(state.catcode('~'), texcore::catcode::CatCode::Letter);
}

#[test]
fn direct_register_assignment_then_advance_matches_the_documented_example() {
    // \count10=100\advance\count10 by 5 \the\count10 -> 105
    let state = run_ok("\\count10=100\\advance\\count10 by 5 ");
    assert_eq!(state.count(10), 105);
}

#[test]
fn direct_register_assignment_then_multiply_matches_the_documented_example() {
    // \count10=100\multiply\count10 by 5 \the\count10 -> 500
    let state = run_ok("\\count10=100\\multiply\\count10 by 5 ");
    assert_eq!(state.count(10), 500);
}

#[test]
fn countdef_alias_assigns_through_to_the_same_register() {
    let state = run_ok("\\countdef\\mycount=7 \\mycount=42 ");
    assert_eq!(state.count(7), 42);
}

#[test]
fn ifcase_cycles_through_branches_by_selector() {
    let state = run_ok("\\def\\pick#1{\\ifcase#1 zero\\or one\\or two\\else many\\fi}\\edef\\r{\\pick2}");
    let Some(texcore::control::Control::Macro(mac)) = state.get_control("r") else {
        panic!("expected \\r bound");
    };
    let rendered: String = mac
        .replacement
        .iter()
        .filter_map(|item| match item {
            texcore::control::ReplacementItem::Literal(texcore::token::Token::Char { ch, .. }) => Some(*ch),
            _ => None,
        })
        .collect();
    assert_eq!(rendered.trim(), "two");
}

#[test]
fn negative_ifcase_selector_is_an_error() {
    let (_state, result) = engine::run("\\ifcase-1 a\\fi", Some("t.tex"));
    assert!(result.is_err());
}

#[test]
fn global_count_assignment_survives_its_group() {
    let state = run_ok("\\begingroup\\global\\count5=42 \\endgroup");
    assert_eq!(state.count(5), 42);
}

#[test]
fn plain_count_assignment_is_undone_by_its_group() {
    let state = run_ok("\\begingroup\\count6=42 \\endgroup");
    assert_eq!(state.count(6), 0);
}

#[test]
fn global_advance_survives_its_group() {
    let state = run_ok("\\count7=10 \\begingroup\\global\\advance\\count7 by 5 \\endgroup");
    assert_eq!(state.count(7), 15);
}

#[test]
fn global_catcode_assignment_survives_its_group() {
    let state = run_ok("\\begingroup\\global\\catcode`\\~=11 \\endgroup");
    assert_eq!(state.catcode('~'), texcore::catcode::CatCode::Letter);
}

#[cfg(test)]
mod conditional_nesting {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::both_true("\\iftrue\\iftrue X\\fi\\fi", "X")]
    #[case::outer_false_skips_inner("\\iffalse\\iftrue X\\fi\\else Y\\fi", "Y")]
    #[case::inner_false_else_fires("\\iftrue\\iffalse X\\else Y\\fi\\fi", "Y")]
    #[case::triple_nesting("\\iftrue\\iftrue\\iftrue X\\fi\\fi\\fi", "X")]
    fn nested_conditionals_select_the_right_branch(#[case] input: &str, #[case] expected: &str) {
        let state = run_ok(&format!("\\edef\\r{{{input}}}"));
        let Some(texcore::control::Control::Macro(mac)) = state.get_control("r") else {
            panic!("expected \\r bound");
        };
        let rendered: String = mac
            .replacement
            .iter()
            .filter_map(|item| match item {
                texcore::control::ReplacementItem::Literal(texcore::token::Token::Char { ch, .. }) => Some(*ch),
                _ => None,
            })
            .collect();
        assert_eq!(rendered, expected);
    }
}
