//! Fonts: the glue between the TFM metrics reader, the PK glyph decoder,
//! and the layout core's `WordBox::append`.

pub mod pk;
pub mod tfm;

use std::collections::HashMap;

use crate::boxes::{Box as TexBox, BoxKind, Gismo};
use crate::dimen::Dimen;
pub use tfm::TfmFont;

/// A loaded font: its TFM metrics, and (lazily, when a page is actually
/// rendered) its PK glyph bitmaps — bitmap decoding is driven on demand by
/// the output driver, which is out of scope here, so `Font` only carries the
/// metrics needed by the layout core.
#[derive(Clone, Debug)]
pub struct Font {
    pub name: String,
    pub metrics: TfmFont,
}

impl Font {
    pub fn new(name: impl Into<String>, metrics: TfmFont) -> Self {
        Font { name: name.into(), metrics }
    }

    pub fn width_of(&self, ch: char) -> Dimen {
        self.metrics.char_width(ch).unwrap_or(Dimen::ZERO)
    }

    pub fn ex(&self) -> Dimen {
        self.metrics.param(5).unwrap_or(Dimen::ZERO)
    }

    pub fn em(&self) -> Dimen {
        self.metrics.param(6).unwrap_or(Dimen::ZERO)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FontTable {
    fonts: HashMap<String, Font>,
}

impl FontTable {
    pub fn new() -> Self {
        FontTable::default()
    }

    pub fn insert(&mut self, font: Font) {
        self.fonts.insert(font.name.clone(), font);
    }

    pub fn get(&self, name: &str) -> Option<&Font> {
        self.fonts.get(name)
    }

    /// Implements `WordBox.append(character)`: looks up the pair
    /// (previous char, new char) in the current font's kern table, then its
    /// ligature table; falls back to a plain `CharBox` when neither hits.
    pub fn append_to_word(&self, word: &mut TexBox, ch: char) {
        let font_name = match &word.kind {
            BoxKind::WordBox { font } => font.clone(),
            _ => return,
        };
        let Some(font) = self.get(&font_name) else {
            word.gismos.push(Gismo::Box(TexBox::new(BoxKind::CharBox {
                font: font_name,
                ch,
                ligature_source: None,
            })));
            return;
        };

        let prev_char = word.gismos.iter().rev().find_map(|g| match g {
            Gismo::Box(TexBox { kind: BoxKind::CharBox { ch, .. }, .. }) => Some(*ch),
            _ => None,
        });

        if let Some(prev) = prev_char {
            if let Some(kern) = font.metrics.kern(prev, ch) {
                word.gismos.push(Gismo::Kern(kern));
                word.gismos.push(Gismo::Box(TexBox::new(BoxKind::CharBox {
                    font: font_name,
                    ch,
                    ligature_source: None,
                })));
                return;
            }
            if let Some(lig) = font.metrics.ligature(prev, ch) {
                if let Some(Gismo::Box(TexBox { kind: BoxKind::CharBox { ch: prev_ch, ligature_source, .. }, .. })) =
                    word.gismos.iter_mut().rev().find(|g| {
                        matches!(g, Gismo::Box(TexBox { kind: BoxKind::CharBox { .. }, .. }))
                    })
                {
                    let source = match ligature_source {
                        Some(existing) => format!("{existing}{ch}"),
                        None => format!("{prev_ch}{ch}"),
                    };
                    *prev_ch = lig;
                    *ligature_source = Some(source);
                    return;
                }
            }
        }

        word.gismos.push(Gismo::Box(TexBox::new(BoxKind::CharBox {
            font: font_name,
            ch,
            ligature_source: None,
        })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font_with_kern_and_ligature() -> Font {
        let mut metrics = TfmFont::empty();
        metrics.set_kern('A', 'V', Dimen::from_pt(-1.0));
        metrics.set_ligature('f', 'i', 'ﬁ');
        Font::new("test10", metrics)
    }

    #[test]
    fn kern_hit_inserts_negative_kern() {
        let mut table = FontTable::new();
        table.insert(font_with_kern_and_ligature());
        let mut word = TexBox::new(BoxKind::WordBox { font: "test10".into() });
        table.append_to_word(&mut word, 'A');
        table.append_to_word(&mut word, 'V');
        assert!(matches!(word.gismos[0], Gismo::Box(_)));
        assert!(matches!(word.gismos[1], Gismo::Kern(_)));
        assert!(matches!(word.gismos[2], Gismo::Box(_)));
    }

    #[test]
    fn ligature_hit_replaces_previous_char() {
        let mut table = FontTable::new();
        table.insert(font_with_kern_and_ligature());
        let mut word = TexBox::new(BoxKind::WordBox { font: "test10".into() });
        table.append_to_word(&mut word, 'f');
        table.append_to_word(&mut word, 'i');
        assert_eq!(word.gismos.len(), 1);
        if let Gismo::Box(TexBox { kind: BoxKind::CharBox { ch, ligature_source, .. }, .. }) = &word.gismos[0] {
            assert_eq!(*ch, 'ﬁ');
            assert_eq!(ligature_source.as_deref(), Some("fi"));
        } else {
            panic!("expected a CharBox");
        }
    }

    #[test]
    fn neither_hit_appends_plain_charbox() {
        let mut table = FontTable::new();
        table.insert(font_with_kern_and_ligature());
        let mut word = TexBox::new(BoxKind::WordBox { font: "test10".into() });
        table.append_to_word(&mut word, 'x');
        table.append_to_word(&mut word, 'y');
        assert_eq!(word.gismos.len(), 2);
    }
}
