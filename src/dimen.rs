//! Fixed-point lengths. A `Dimen` is a signed integer count of
//! `2^-16` pt ("scaled points", `sp`), TeX's native length unit. Unit
//! conversion constants below are TeX's own (see the TeXbook, ch. 10).

use serde::{Deserialize, Serialize};

use crate::errors::{ParseErrorKind, ValueErrorKind};

pub const SP_PER_PT: i64 = 1 << 16;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Dimen {
    pub sp: i64,
}

impl Dimen {
    pub const ZERO: Dimen = Dimen { sp: 0 };

    pub fn from_sp(sp: i64) -> Self {
        Dimen { sp }
    }

    pub fn from_pt(pt: f64) -> Self {
        Dimen { sp: (pt * SP_PER_PT as f64).round() as i64 }
    }

    pub fn to_pt(self) -> f64 {
        self.sp as f64 / SP_PER_PT as f64
    }

    pub fn checked_add(self, other: Dimen) -> Dimen {
        Dimen { sp: self.sp + other.sp }
    }

    pub fn checked_sub(self, other: Dimen) -> Dimen {
        Dimen { sp: self.sp - other.sp }
    }

    pub fn scaled_by(self, factor: f64) -> Dimen {
        Dimen { sp: (self.sp as f64 * factor).round() as i64 }
    }

    pub fn is_negative(self) -> bool {
        self.sp < 0
    }

    pub fn max(self, other: Dimen) -> Dimen {
        if self.sp >= other.sp { self } else { other }
    }
}

impl std::ops::Add for Dimen {
    type Output = Dimen;
    fn add(self, rhs: Dimen) -> Dimen {
        self.checked_add(rhs)
    }
}

impl std::ops::Sub for Dimen {
    type Output = Dimen;
    fn sub(self, rhs: Dimen) -> Dimen {
        self.checked_sub(rhs)
    }
}

impl std::ops::Neg for Dimen {
    type Output = Dimen;
    fn neg(self) -> Dimen {
        Dimen { sp: -self.sp }
    }
}

impl std::iter::Sum for Dimen {
    fn sum<I: Iterator<Item = Dimen>>(iter: I) -> Self {
        iter.fold(Dimen::ZERO, Dimen::checked_add)
    }
}

/// A real (finite) unit of length, distinct from the three infinite glue
/// orders (`fil`/`fill`/`filll`), which only make sense as [`crate::glue::InfinityOrder`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Unit {
    Pt,
    Pc,
    In,
    Bp,
    Cm,
    Mm,
    Dd,
    Cc,
    Sp,
    /// Font-relative: the current font's x-height.
    Ex,
    /// Font-relative: the current font's quad (`em`).
    Em,
}

impl Unit {
    pub fn from_str(s: &str) -> Option<Unit> {
        Some(match s.to_ascii_lowercase().as_str() {
            "pt" => Unit::Pt,
            "pc" => Unit::Pc,
            "in" => Unit::In,
            "bp" => Unit::Bp,
            "cm" => Unit::Cm,
            "mm" => Unit::Mm,
            "dd" => Unit::Dd,
            "cc" => Unit::Cc,
            "sp" => Unit::Sp,
            "ex" => Unit::Ex,
            "em" => Unit::Em,
            _ => return None,
        })
    }

    /// Points-per-unit for the units with a fixed, font-independent ratio.
    /// Returns `None` for `ex`/`em`, which need the current font's metrics.
    pub fn points_per_unit(self) -> Option<f64> {
        Some(match self {
            Unit::Pt => 1.0,
            Unit::Pc => 12.0,
            Unit::In => 72.27,
            Unit::Bp => 72.27 / 72.0,
            Unit::Cm => 72.27 / 2.54,
            Unit::Mm => 72.27 / 25.4,
            Unit::Dd => 1238.0 / 1157.0,
            Unit::Cc => (1238.0 / 1157.0) * 12.0,
            Unit::Sp => 1.0 / SP_PER_PT as f64,
            Unit::Ex | Unit::Em => return None,
        })
    }

    /// Resolves to a concrete `Dimen`, given the font-relative dimensions
    /// needed for `ex`/`em`.
    pub fn resolve(self, magnitude: f64, font_ex: Dimen, font_em: Dimen) -> Dimen {
        match self {
            Unit::Ex => font_ex.scaled_by(magnitude),
            Unit::Em => font_em.scaled_by(magnitude),
            other => {
                let ppu = other.points_per_unit().expect("checked above");
                Dimen::from_pt(magnitude * ppu)
            }
        }
    }

    pub fn parse(s: &str) -> Result<Unit, ParseErrorKind> {
        Unit::from_str(s).ok_or_else(|| ParseErrorKind::UnknownUnit(s.to_string()))
    }
}

pub fn checked_div(sp: i64, by: i64) -> Result<i64, ValueErrorKind> {
    if by == 0 {
        Err(ValueErrorKind::DivisionByZero)
    } else {
        Ok(sp / by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn pt_round_trips_through_sp() {
        let d = Dimen::from_pt(10.0);
        assert_eq!(d.sp, 10 * SP_PER_PT);
        assert!((d.to_pt() - 10.0).abs() < 1e-9);
    }

    #[rstest]
    #[case::pc("pc", 12.0)]
    #[case::bp("bp", 72.27 / 72.0)]
    #[case::sp("sp", 1.0 / SP_PER_PT as f64)]
    fn fixed_units_convert_to_points(#[case] unit: &str, #[case] expected_ppu: f64) {
        let u = Unit::from_str(unit).unwrap();
        assert!((u.points_per_unit().unwrap() - expected_ppu).abs() < 1e-12);
    }

    #[test]
    fn ex_and_em_need_font_metrics() {
        assert_eq!(Unit::Ex.points_per_unit(), None);
        assert_eq!(Unit::Em.points_per_unit(), None);
    }

    #[test]
    fn unknown_unit_is_an_error() {
        assert!(Unit::parse("zz").is_err());
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(checked_div(10, 0).is_err());
        assert_eq!(checked_div(10, 2), Ok(5));
    }
}
