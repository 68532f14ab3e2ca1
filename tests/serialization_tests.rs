//! Round-trips for the pieces of document state that serialise by
//! structural content: registers and user-defined control meanings. The
//! full `DocumentState` is not itself `Serialize` — its group/call stacks
//! exist purely for scoped-undo and diagnostics, not for persistence.

use texcore::control::{Control, ParamTemplateItem, ReplacementItem, UserMacro};
use texcore::location::Location;
use texcore::registers::{RegisterBlock, Registers};
use texcore::token::Token;

fn loc() -> Location {
    Location::top_level(1, 1)
}

#[test]
fn registers_round_trip_through_json() {
    let mut regs = Registers::default();
    regs.count[10] = 105;
    regs.toks[3] = vec![Token::Char { ch: 'x', catcode: texcore::catcode::CatCode::Letter, loc: loc() }];

    let json = serde_json::to_string(&regs).expect("registers should serialise");
    let back: Registers = serde_json::from_str(&json).expect("registers should deserialise");

    assert_eq!(back.count[10], 105);
    assert_eq!(back.toks[3].len(), 1);
}

#[test]
fn primitive_control_round_trips_by_name() {
    let original = Control::Primitive(texcore::primitives::lookup_primitive("advance").expect("advance is a primitive"));
    let json = serde_json::to_string(&original).expect("primitive should serialise");
    let back: Control = serde_json::from_str(&json).expect("primitive should deserialise");
    assert_eq!(original, back);
}

#[test]
fn macro_control_round_trips_its_structural_content() {
    let mac = UserMacro {
        param_template: vec![ParamTemplateItem::Param(1)],
        replacement: vec![
            ReplacementItem::Param(1),
            ReplacementItem::Literal(Token::Char { ch: '!', catcode: texcore::catcode::CatCode::Other, loc: loc() }),
        ],
        long: false,
        outer: false,
        expanded_at_definition: false,
    };
    let original = Control::Macro(std::rc::Rc::new(mac));

    let json = serde_json::to_string(&original).expect("macro should serialise");
    let Control::Macro(back) = serde_json::from_str::<Control>(&json).expect("macro should deserialise") else {
        panic!("expected a macro back");
    };

    assert_eq!(back.param_template.len(), 1);
    assert_eq!(back.replacement.len(), 2);
}

#[test]
fn register_alias_control_round_trips() {
    let original = Control::Register(texcore::control::RegisterRef { block: RegisterBlock::Count, index: 7 });
    let json = serde_json::to_string(&original).expect("register ref should serialise");
    let back: Control = serde_json::from_str(&json).expect("register ref should deserialise");
    assert_eq!(original, back);
}
