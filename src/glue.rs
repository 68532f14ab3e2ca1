//! Stretchable/shrinkable lengths. A `Glue` is a natural length
//! plus independent stretch and shrink components, each with its own
//! [`InfinityOrder`]; higher orders absorb any amount of finite slack before
//! a lower order is touched at all.

use serde::{Deserialize, Serialize};

use crate::dimen::Dimen;
use crate::errors::ValueErrorKind;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum InfinityOrder {
    #[default]
    Finite,
    Fil,
    Fill,
    Filll,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct GlueComponent {
    pub length: Dimen,
    pub order: InfinityOrder,
}

impl GlueComponent {
    pub fn finite(length: Dimen) -> Self {
        GlueComponent { length, order: InfinityOrder::Finite }
    }

    pub fn infinite(length: Dimen, order: InfinityOrder) -> Self {
        GlueComponent { length, order }
    }

    pub fn zero() -> Self {
        GlueComponent::default()
    }

    /// Adds two components; they must share an infinity order unless one of
    /// them is exactly zero (a zero component has no meaningful order).
    pub fn checked_add(self, other: GlueComponent) -> Result<GlueComponent, ValueErrorKind> {
        if self.length == Dimen::ZERO {
            return Ok(other);
        }
        if other.length == Dimen::ZERO {
            return Ok(self);
        }
        if self.order != other.order {
            return Err(ValueErrorKind::DifferentInfinityOrders);
        }
        Ok(GlueComponent { length: self.length + other.length, order: self.order })
    }

    pub fn scaled_by(self, factor: f64) -> GlueComponent {
        GlueComponent { length: self.length.scaled_by(factor), order: self.order }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct Glue {
    pub natural: Dimen,
    pub stretch: GlueComponent,
    pub shrink: GlueComponent,
}

impl Glue {
    pub fn fixed(natural: Dimen) -> Self {
        Glue { natural, stretch: GlueComponent::zero(), shrink: GlueComponent::zero() }
    }

    pub fn new(natural: Dimen, stretch: GlueComponent, shrink: GlueComponent) -> Self {
        Glue { natural, stretch, shrink }
    }

    /// Component-wise arithmetic: advancing a glue register by another glue
    /// advances natural, stretch and shrink independently.
    pub fn checked_add(self, other: Glue) -> Result<Glue, ValueErrorKind> {
        Ok(Glue {
            natural: self.natural + other.natural,
            stretch: self.stretch.checked_add(other.stretch)?,
            shrink: self.shrink.checked_add(other.shrink)?,
        })
    }

    /// Multiplying glue by a plain integer scales natural, stretch and
    /// shrink proportionally.
    pub fn scaled_by(self, factor: f64) -> Glue {
        Glue {
            natural: self.natural.scaled_by(factor),
            stretch: self.stretch.scaled_by(factor),
            shrink: self.shrink.scaled_by(factor),
        }
    }

    pub fn divided_by(self, divisor: i64) -> Result<Glue, ValueErrorKind> {
        if divisor == 0 {
            return Err(ValueErrorKind::DivisionByZero);
        }
        Ok(self.scaled_by(1.0 / divisor as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_same_order_succeeds() {
        let a = GlueComponent::infinite(Dimen::from_pt(1.0), InfinityOrder::Fil);
        let b = GlueComponent::infinite(Dimen::from_pt(2.0), InfinityOrder::Fil);
        let sum = a.checked_add(b).unwrap();
        assert_eq!(sum.length, Dimen::from_pt(3.0));
        assert_eq!(sum.order, InfinityOrder::Fil);
    }

    #[test]
    fn adding_different_orders_is_an_error() {
        let a = GlueComponent::infinite(Dimen::from_pt(1.0), InfinityOrder::Fil);
        let b = GlueComponent::infinite(Dimen::from_pt(1.0), InfinityOrder::Fill);
        assert_eq!(a.checked_add(b), Err(ValueErrorKind::DifferentInfinityOrders));
    }

    #[test]
    fn zero_component_is_order_agnostic() {
        let a = GlueComponent::zero();
        let b = GlueComponent::infinite(Dimen::from_pt(1.0), InfinityOrder::Filll);
        assert_eq!(a.checked_add(b).unwrap(), b);
    }

    #[test]
    fn scaling_glue_scales_all_three_components() {
        let g = Glue::new(
            Dimen::from_pt(10.0),
            GlueComponent::finite(Dimen::from_pt(2.0)),
            GlueComponent::finite(Dimen::from_pt(1.0)),
        );
        let scaled = g.scaled_by(2.0);
        assert_eq!(scaled.natural, Dimen::from_pt(20.0));
        assert_eq!(scaled.stretch.length, Dimen::from_pt(4.0));
        assert_eq!(scaled.shrink.length, Dimen::from_pt(2.0));
    }
}
