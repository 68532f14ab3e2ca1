//! `fit_to` and badness. Knuth-Plass breakpoint *selection* is out of scope;
//! this module implements breakpoint insertion (see `HBox::append` in
//! [`crate::modes::hbox_append`]), badness calculation, and fit-to-width.

use serde::{Deserialize, Serialize};

use crate::boxes::{Box as TexBox, Direction, Gismo};
use crate::dimen::Dimen;
use crate::glue::InfinityOrder;

pub const OVERFULL_BADNESS: u32 = 1_000_000;
pub const MAX_BADNESS: u32 = 10_000;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct FitResult {
    /// Natural length of the box's contents before fitting.
    pub natural: Dimen,
    /// The size the box was fit to.
    pub target: Dimen,
    /// The stretch/shrink factor applied (0 if natural == target).
    pub factor: f64,
    pub badness: u32,
    pub overfull: bool,
}

/// Sums the lengths of non-leader children, and separately the natural
/// lengths of leaders, along `axis`.
fn split_natural(children: &[Gismo], axis: Direction) -> (Dimen, Dimen) {
    let mut s_box = Dimen::ZERO;
    let mut s_glue = Dimen::ZERO;
    for g in children {
        match g {
            Gismo::Leader { glue, direction } if *direction == axis => {
                s_glue = s_glue + glue.natural;
            }
            Gismo::Breakpoint { .. } => {}
            other => {
                s_box = s_box + other.natural_length(axis);
            }
        }
    }
    (s_box, s_glue)
}

/// The highest-order stretch or shrink component present among a box's
/// leaders along `axis` — higher orders absorb slack before lower ones are
/// touched at all.
fn dominant_order(children: &[Gismo], axis: Direction, stretching: bool) -> InfinityOrder {
    children
        .iter()
        .filter_map(|g| match g {
            Gismo::Leader { glue, direction } if *direction == axis => {
                Some(if stretching { glue.stretch.order } else { glue.shrink.order })
            }
            _ => None,
        })
        .max()
        .unwrap_or(InfinityOrder::Finite)
}

/// Badness/overfull are classified *after* distribution, from the resulting
/// total length against `target` — never pre-gated on the stretch/shrink
/// factor, since a box can come out exactly full even when its factor
/// exceeds 1.0 (shrink clamps at each leader's floor).
fn classify(total: Dimen, target: Dimen, factor: f64) -> (u32, bool) {
    if total.sp > target.sp {
        return (OVERFULL_BADNESS, true);
    }
    let badness = (100.0 * factor.powi(3)).round() as u32;
    (badness.min(MAX_BADNESS), false)
}

/// Distributes `size - natural` among the box's children along `axis`,
/// mutating leader glue in place, and stores the resulting [`FitResult`] on
/// the box. Stretch/shrink is always distributed to every eligible leader,
/// even when the box has more slack to absorb than it has stretchability or
/// shrinkability; badness and overfull status are derived afterward from the
/// total length that distribution actually produced.
pub fn fit_to(b: &mut TexBox, axis: Direction, size: Dimen) -> FitResult {
    let (s_box, s_glue) = split_natural(&b.gismos, axis);
    let natural = s_box + s_glue;

    if natural == size {
        let result = FitResult { natural, target: size, factor: 0.0, badness: 0, overfull: false };
        b.fit = Some(result);
        return result;
    }

    let stretching = size > natural;
    let order = dominant_order(&b.gismos, axis, stretching);

    // Total available slack at the dominant order.
    let available: Dimen = b
        .gismos
        .iter()
        .filter_map(|g| match g {
            Gismo::Leader { glue, direction } if *direction == axis => {
                let comp = if stretching { glue.stretch } else { glue.shrink };
                (comp.order == order).then_some(comp.length)
            }
            _ => None,
        })
        .fold(Dimen::ZERO, |a, b| a + b);

    let delta = if stretching { size - natural } else { natural - size };
    let factor = if available.sp > 0 { delta.sp as f64 / available.sp as f64 } else { 0.0 };

    let mut eligible_indices: Vec<usize> = b
        .gismos
        .iter()
        .enumerate()
        .filter_map(|(i, g)| match g {
            Gismo::Leader { glue, direction } if *direction == axis => {
                let comp = if stretching { glue.stretch } else { glue.shrink };
                (comp.order == order).then_some(i)
            }
            _ => None,
        })
        .collect();

    let mut glue_total = Dimen::ZERO;
    let n = eligible_indices.len();
    let mut applied = Dimen::ZERO;
    for (k, idx) in eligible_indices.drain(..).enumerate() {
        if let Gismo::Leader { glue, .. } = &mut b.gismos[idx] {
            let comp = if stretching { glue.stretch } else { glue.shrink };
            let share = if comp.length.sp == 0 {
                0
            } else {
                (comp.length.sp as f64 * factor).round() as i64
            };
            let mut add = Dimen::from_sp(share);
            applied = applied + add;
            // Accumulate rounding error into the final eligible leader.
            if k == n - 1 {
                add = add + (delta - applied);
            }
            if stretching {
                glue.natural = glue.natural + add;
            } else {
                let floor = glue.natural - glue.shrink.length;
                let shrunk = glue.natural - add;
                glue.natural = if shrunk.sp < floor.sp { floor } else { shrunk };
            }
            glue_total = glue_total + glue.natural;
        }
    }
    // Leaders not eligible at the dominant order stay at their natural
    // length; add those in alongside the ones that moved.
    for g in &b.gismos {
        if let Gismo::Leader { glue, direction } = g {
            if *direction == axis {
                let comp = if stretching { glue.stretch } else { glue.shrink };
                if comp.order != order {
                    glue_total = glue_total + glue.natural;
                }
            }
        }
    }

    let total = s_box + glue_total;
    let (badness, overfull) = classify(total, size, factor);

    let result = FitResult { natural, target: size, factor, badness, overfull };
    b.fit = Some(result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glue::{Glue, GlueComponent};

    fn leader(natural_pt: f64, stretch_pt: f64, shrink_pt: f64) -> Gismo {
        Gismo::Leader {
            glue: Glue::new(
                Dimen::from_pt(natural_pt),
                GlueComponent::finite(Dimen::from_pt(stretch_pt)),
                GlueComponent::finite(Dimen::from_pt(shrink_pt)),
            ),
            direction: Direction::Horizontal,
        }
    }

    #[test]
    fn exact_fit_has_zero_badness() {
        let mut b = TexBox::hbox();
        b.gismos.push(Gismo::Kern(Dimen::from_pt(10.0)));
        let r = fit_to(&mut b, Direction::Horizontal, Dimen::from_pt(10.0));
        assert_eq!(r.badness, 0);
        assert!(!r.overfull);
    }

    #[test]
    fn stretching_distributes_and_sums_to_target() {
        let mut b = TexBox::hbox();
        b.gismos.push(Gismo::Kern(Dimen::from_pt(10.0)));
        b.gismos.push(leader(2.0, 4.0, 1.0));
        let r = fit_to(&mut b, Direction::Horizontal, Dimen::from_pt(14.0));
        assert!(!r.overfull);
        let (s_box, s_glue) = split_natural(&b.gismos, Direction::Horizontal);
        assert_eq!(s_box + s_glue, Dimen::from_pt(14.0));
    }

    #[test]
    fn overfull_with_no_slack_is_flagged() {
        let mut b = TexBox::hbox();
        b.gismos.push(Gismo::Kern(Dimen::from_pt(10.0)));
        let r = fit_to(&mut b, Direction::Horizontal, Dimen::from_pt(5.0));
        assert!(r.overfull);
        assert_eq!(r.badness, OVERFULL_BADNESS);
    }

    #[test]
    fn shrinking_cannot_go_below_natural_minus_shrink() {
        let mut b = TexBox::hbox();
        b.gismos.push(leader(10.0, 0.0, 1.0));
        // requesting far less than natural - shrink allows: still clamps, overfull.
        let r = fit_to(&mut b, Direction::Horizontal, Dimen::from_pt(1.0));
        assert!(r.overfull);
    }
}
