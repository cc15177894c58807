//! Manual note ordering.
//!
//! Each owner's notes carry an integer `order`. Moving a note from
//! `old` to `new` is an array move-by-index: the notes in between slide one
//! slot toward the gap the moved note left behind. Stores apply a
//! [`ReorderPlan`] atomically: the shift over the other notes, then the
//! final assignment of the moved note.

use crate::defaults::{FIRST_NOTE_ORDER, MAX_NOTE_ORDER};
use crate::error::{Error, Result};

/// Range shift applied to every *other* note of the owner whose order lies
/// in `lower..=upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub lower: i64,
    pub upper: i64,
    pub delta: i64,
}

impl Shift {
    pub fn contains(&self, order: i64) -> bool {
        order >= self.lower && order <= self.upper
    }

    /// New order for a note currently at `order`.
    pub fn apply(&self, order: i64) -> i64 {
        if self.contains(order) {
            order + self.delta
        } else {
            order
        }
    }
}

/// What a store must do to move one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPlan {
    pub old_order: i64,
    pub new_order: i64,
    pub shift: Option<Shift>,
}

impl ReorderPlan {
    pub fn new(old_order: i64, new_order: i64) -> Self {
        let shift = if new_order > old_order {
            // Moving later: close the gap, intervening notes move up one slot.
            Some(Shift {
                lower: old_order + 1,
                upper: new_order,
                delta: -1,
            })
        } else if new_order < old_order {
            // Moving earlier: make room.
            Some(Shift {
                lower: new_order,
                upper: old_order - 1,
                delta: 1,
            })
        } else {
            None
        };
        Self {
            old_order,
            new_order,
            shift,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.shift.is_none()
    }

    /// Order of a note other than the moved one after the plan runs.
    pub fn shifted(&self, order: i64) -> i64 {
        match self.shift {
            Some(shift) => shift.apply(order),
            None => order,
        }
    }
}

/// Order for a newly created note given the owner's current maximum.
///
/// Fails once the owner's ordering is full.
pub fn next_order(current_max: Option<i64>) -> Result<i64> {
    let order = match current_max {
        Some(max) => max.checked_add(1).filter(|o| *o <= MAX_NOTE_ORDER),
        None => Some(FIRST_NOTE_ORDER),
    };
    order.ok_or_else(|| {
        Error::InvalidInput(format!(
            "Note order cannot exceed {}; reorder notes to free a position",
            MAX_NOTE_ORDER
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Apply a move to a list of (name, order) pairs and return the result.
    fn run(notes: &[(&'static str, i64)], moved: &str, new_order: i64) -> Vec<(&'static str, i64)> {
        let old_order = notes.iter().find(|(n, _)| *n == moved).unwrap().1;
        let plan = ReorderPlan::new(old_order, new_order);
        notes
            .iter()
            .map(|(name, order)| {
                if *name == moved {
                    (*name, plan.new_order)
                } else {
                    (*name, plan.shifted(*order))
                }
            })
            .collect()
    }

    fn sorted_orders(notes: &[(&'static str, i64)]) -> Vec<i64> {
        let mut orders: Vec<i64> = notes.iter().map(|(_, o)| *o).collect();
        orders.sort();
        orders
    }

    #[test]
    fn test_move_first_to_last() {
        let after = run(&[("n1", 0), ("n2", 1), ("n3", 2)], "n1", 2);
        assert_eq!(after, vec![("n1", 2), ("n2", 0), ("n3", 1)]);
    }

    #[test]
    fn test_move_last_to_first() {
        let after = run(&[("n1", 0), ("n2", 1), ("n3", 2)], "n3", 0);
        assert_eq!(after, vec![("n1", 1), ("n2", 2), ("n3", 0)]);
    }

    #[test]
    fn test_same_position_is_noop() {
        let plan = ReorderPlan::new(4, 4);
        assert!(plan.is_noop());
        assert_eq!(plan.shifted(4), 4);
        assert_eq!(plan.shifted(5), 5);
    }

    #[test]
    fn test_notes_outside_range_untouched() {
        let after = run(&[("a", 0), ("b", 1), ("c", 2), ("d", 3), ("e", 4)], "b", 3);
        assert_eq!(after, vec![("a", 0), ("b", 3), ("c", 1), ("d", 2), ("e", 4)]);
    }

    #[test]
    fn test_every_move_is_a_permutation_of_dense_orders() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let notes: Vec<(&'static str, i64)> =
            names.iter().enumerate().map(|(i, n)| (*n, i as i64)).collect();
        let expected = sorted_orders(&notes);

        for moved in names {
            for target in 0..names.len() as i64 {
                let after = run(&notes, moved, target);
                assert_eq!(
                    sorted_orders(&after),
                    expected,
                    "moving {} to {} broke density",
                    moved,
                    target
                );
            }
        }
    }

    #[test]
    fn test_shift_ranges() {
        let down = ReorderPlan::new(1, 4).shift.unwrap();
        assert_eq!((down.lower, down.upper, down.delta), (2, 4, -1));

        let up = ReorderPlan::new(4, 1).shift.unwrap();
        assert_eq!((up.lower, up.upper, up.delta), (1, 3, 1));
    }

    #[test]
    fn test_next_order() {
        assert_eq!(next_order(None).unwrap(), 0);
        assert_eq!(next_order(Some(0)).unwrap(), 1);
        assert_eq!(next_order(Some(41)).unwrap(), 42);
        assert_eq!(next_order(Some(MAX_NOTE_ORDER - 1)).unwrap(), MAX_NOTE_ORDER);
    }

    #[test]
    fn test_next_order_past_the_limit_is_an_error() {
        assert!(matches!(next_order(Some(MAX_NOTE_ORDER)), Err(Error::InvalidInput(_))));
        assert!(matches!(next_order(Some(i64::MAX)), Err(Error::InvalidInput(_))));
    }
}
