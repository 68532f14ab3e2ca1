//! A worked example lifted straight from Rokicki's 1985 PK description
//! (p120): the bitmap for a xi glyph, encoded with the extended-short
//! preamble, dyn_f = 8, with the first run white.

use texcore::font::pk;

const EXPECTED_ROWS: &[&str] = &[
    "XXXXXXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXXXXXX",
    "XX................XX",
    "XX................XX",
    "XX................XX",
    "....................",
    "....................",
    "..XX............XX..",
    "..XX............XX..",
    "..XX............XX..",
    "..XXXXXXXXXXXXXXXX..",
    "..XXXXXXXXXXXXXXXX..",
    "..XXXXXXXXXXXXXXXX..",
    "..XXXXXXXXXXXXXXXX..",
    "..XX............XX..",
    "..XX............XX..",
    "..XX............XX..",
    "....................",
    "....................",
    "....................",
    "XX................XX",
    "XX................XX",
    "XX................XX",
    "XXXXXXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXXXXXX",
    "XXXXXXXXXXXXXXXXXXXX",
];

#[test]
fn rokicki_xi_glyph_decodes_to_the_documented_bitmap() {
    let flag_byte = 0x88;
    let bytes: &[u8] = &[
        0x1A, 0x04, 0x09, 0xC7, 0x1C, 0x19, 0x14, 0x1D, 0xFE, 0x1C, 0xD9, 0xE2, 0x97, 0x2B, 0x1E,
        0x22, 0x93, 0x24, 0xE3, 0x97, 0x4E, 0x22, 0x93, 0x2C, 0x5E, 0x22, 0x97, 0xD9,
    ];

    let glyph = pk::decode_char(bytes, flag_byte).expect("should decode");

    assert_eq!(glyph.char_code, 4);
    assert_eq!(glyph.width, 20);
    assert_eq!(glyph.height, 29);
    assert_eq!(glyph.h_offset, -2);
    assert_eq!(glyph.v_offset, 28);

    let expected = EXPECTED_ROWS.join("\n");
    assert_eq!(glyph.ascii_art(), expected);
}
