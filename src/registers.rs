//! The five register blocks plus boxes. Each block always has a value for
//! every index 0..=255, defaulted rather than absent, so reads never fail.

use serde::{Deserialize, Serialize};

use crate::boxes::Box as TexBox;
use crate::dimen::Dimen;
use crate::glue::Glue;
use crate::token::Token;

pub const REGISTER_COUNT: usize = 256;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum RegisterBlock {
    Count,
    Dimen,
    Skip,
    Muskip,
    Toks,
    Box,
}

impl RegisterBlock {
    pub fn name(self) -> &'static str {
        match self {
            RegisterBlock::Count => "count",
            RegisterBlock::Dimen => "dimen",
            RegisterBlock::Skip => "skip",
            RegisterBlock::Muskip => "muskip",
            RegisterBlock::Toks => "toks",
            RegisterBlock::Box => "box",
        }
    }

    pub fn from_name(name: &str) -> Option<RegisterBlock> {
        Some(match name {
            "count" => RegisterBlock::Count,
            "dimen" => RegisterBlock::Dimen,
            "skip" => RegisterBlock::Skip,
            "muskip" => RegisterBlock::Muskip,
            "toks" => RegisterBlock::Toks,
            "box" => RegisterBlock::Box,
            _ => return None,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Registers {
    pub count: Vec<i64>,
    pub dimen: Vec<Dimen>,
    pub skip: Vec<Glue>,
    pub muskip: Vec<Glue>,
    pub toks: Vec<Vec<Token>>,
    #[serde(skip)]
    pub boxes: Vec<Option<TexBox>>,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            count: vec![0; REGISTER_COUNT],
            dimen: vec![Dimen::ZERO; REGISTER_COUNT],
            skip: vec![Glue::default(); REGISTER_COUNT],
            muskip: vec![Glue::default(); REGISTER_COUNT],
            toks: vec![Vec::new(); REGISTER_COUNT],
            boxes: (0..REGISTER_COUNT).map(|_| None).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_has_a_default_value() {
        let regs = Registers::default();
        assert_eq!(regs.count.len(), REGISTER_COUNT);
        assert_eq!(regs.count[255], 0);
        assert_eq!(regs.dimen[0], Dimen::ZERO);
        assert!(regs.boxes[100].is_none());
    }

    #[test]
    fn block_name_round_trips() {
        for block in [
            RegisterBlock::Count,
            RegisterBlock::Dimen,
            RegisterBlock::Skip,
            RegisterBlock::Muskip,
            RegisterBlock::Toks,
            RegisterBlock::Box,
        ] {
            assert_eq!(RegisterBlock::from_name(block.name()), Some(block));
        }
    }
}
