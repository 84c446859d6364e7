// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Divider search for the X5 generator and CPU clocks.
//!
//! Both clock types divide their parent through two cascaded integer
//! dividers: a 3-bit pre-divider (1..=8) followed by a 6-bit post-divider
//! (1..=64). The logical divider is their product, so the total lies in
//! 1..=512.
//!
//! Two searches are provided:
//!
//! + [best_divider] for a parent whose rate is fixed: the quotient is rounded
//! to the closest integer.
//! + [best_divider_for_adjustable_parent] for a clock that may change its
//! parent's rate: every divider is tried and the parent is asked what it can
//! deliver; the best rate that does not exceed the target wins.

use super::ClockSource;
use crate::ClkError;

/// Largest pre-divider value.
pub const PRE_DIV_MAX: u32 = 8;
/// Largest post-divider value.
pub const POST_DIV_MAX: u32 = 64;
/// Largest total divider, `PRE_DIV_MAX * POST_DIV_MAX`.
pub const DIV_MAX: u32 = PRE_DIV_MAX * POST_DIV_MAX;

/// A pre/post divider pair, always within 1..=8 x 1..=64.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Divider {
    pre: u32,
    post: u32,
}

impl Divider {
    /// [None] unless both dividers are in range.
    pub fn new(pre: u32, post: u32) -> Option<Self> {
        if (1..=PRE_DIV_MAX).contains(&pre) && (1..=POST_DIV_MAX).contains(&post) {
            Some(Self { pre, post })
        } else {
            None
        }
    }

    /// Build a divider from the zero-based register fields. Bits beyond the
    /// field widths are ignored.
    pub fn from_fields(pre_field: u32, post_field: u32) -> Self {
        Self {
            pre: (pre_field & (PRE_DIV_MAX - 1)) + 1,
            post: (post_field & (POST_DIV_MAX - 1)) + 1,
        }
    }

    pub fn pre(&self) -> u32 {
        self.pre
    }

    pub fn post(&self) -> u32 {
        self.post
    }

    /// Zero-based `(pre, post)` register field values.
    pub fn fields(&self) -> (u32, u32) {
        (self.pre - 1, self.post - 1)
    }

    pub fn total(&self) -> u32 {
        self.pre * self.post
    }
}

/// `n / d` rounded to the closest integer, halves rounded up.
pub fn div_round_closest(n: u64, d: u64) -> u64 {
    ((n as u128 + (d / 2) as u128) / d as u128) as u64
}

/// Closest total divider for a fixed `parent_rate`, clamped to 1..=512.
///
/// # Errors
///
/// + [Err]\([ClkError::InvalidRate]\): if `target_rate` is zero
pub fn best_divider(parent_rate: u64, target_rate: u64) -> Result<u32, ClkError> {
    if target_rate == 0 {
        return Err(ClkError::InvalidRate);
    }

    let divider = div_round_closest(parent_rate, target_rate);
    Ok(divider.clamp(1, DIV_MAX as u64) as u32)
}

/// Split a total divider into a pre/post pair.
///
/// Small ratios go entirely to the pre-divider and anything at or beyond the
/// maximum saturates at 8 x 64. In between, the first exact product is taken
/// with the pre-divider scanned upwards, so the smallest pre-divider that
/// works is used.
///
/// # Errors
///
/// + [Err]\([ClkError::NoFactorization]\): no pair in 1..=8 x 1..=64 has
/// `divider` as its product (e.g. primes above 64)
pub fn factor_divider(divider: u32) -> Result<Divider, ClkError> {
    if divider <= PRE_DIV_MAX {
        return Ok(Divider {
            pre: divider.max(1),
            post: 1,
        });
    }
    if divider >= DIV_MAX {
        return Ok(Divider {
            pre: PRE_DIV_MAX,
            post: POST_DIV_MAX,
        });
    }

    for pre in 1..=PRE_DIV_MAX {
        for post in 1..=POST_DIV_MAX {
            let product = pre * post;
            if product == divider {
                return Ok(Divider { pre, post });
            }
            if product > divider {
                break;
            }
        }
    }

    Err(ClkError::NoFactorization)
}

/// Output rate of a clock dividing `parent_rate` by `divider`.
pub fn recalc_rate(parent_rate: u64, divider: Divider) -> u64 {
    div_round_closest(parent_rate, divider.total() as u64)
}

// A candidate beats the current best only if it does not overshoot.
fn is_better(rate: u64, now: u64, best: u64) -> bool {
    now <= rate && now > best
}

/// Find the total divider and parent rate that best produce `rate` when the
/// parent may be reconfigured.
///
/// Returns `(divider, parent_rate)`. If the parent already runs at an exact
/// multiple of `rate`, that multiple is returned unchanged. When no divider
/// gives a rate at or below the target, the maximum divider is returned along
/// with the lowest rate the parent can deliver.
///
/// # Errors
///
/// + [Err]\([ClkError::InvalidRate]\): if `rate` is zero
pub fn best_divider_for_adjustable_parent(
    rate: u64,
    parent: &dyn ClockSource,
) -> Result<(u32, u64), ClkError> {
    if rate == 0 {
        return Err(ClkError::InvalidRate);
    }

    let parent_rate_saved = parent.get_rate();
    // Keep `rate * i` from overflowing
    let max_divider = (u64::MAX / rate).min(DIV_MAX as u64) as u32;

    let mut best = 0;
    let mut best_divider = 0;
    let mut best_parent_rate = 0;

    for i in 1..=max_divider {
        let wanted = rate * i as u64;
        if wanted == parent_rate_saved {
            return Ok((i, parent_rate_saved));
        }

        let parent_rate = parent.round_rate(wanted);
        let now = div_round_closest(parent_rate, i as u64);
        if is_better(rate, now, best) {
            best_divider = i;
            best = now;
            best_parent_rate = parent_rate;
        }
    }

    if best_divider == 0 {
        return Ok((DIV_MAX, parent.round_rate(1)));
    }

    Ok((best_divider, best_parent_rate))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clocks::ClockSource;
    use crate::ClkError;
    use core::cell::Cell;

    /// Parent whose deliverable rates are multiples of `step`, up to `max`.
    pub(crate) struct SteppedParent {
        pub rate: Cell<u64>,
        pub step: u64,
        pub max: u64,
        pub rounds: Cell<usize>,
    }

    impl SteppedParent {
        pub fn new(rate: u64, step: u64, max: u64) -> Self {
            Self {
                rate: Cell::new(rate),
                step,
                max,
                rounds: Cell::new(0),
            }
        }
    }

    impl ClockSource for SteppedParent {
        fn name(&self) -> &'static str {
            "stepped"
        }

        fn get_rate(&self) -> u64 {
            self.rate.get()
        }

        fn round_rate(&self, rate: u64) -> u64 {
            self.rounds.set(self.rounds.get() + 1);
            let rounded = rate.min(self.max) / self.step * self.step;
            rounded.max(self.step)
        }

        fn set_rate(&self, rate: u64) -> Result<(), ClkError> {
            self.rate.set(self.round_rate(rate));
            Ok(())
        }
    }

    #[test]
    fn round_closest() {
        assert_eq!(div_round_closest(10, 4), 3);
        assert_eq!(div_round_closest(9, 4), 2);
        assert_eq!(div_round_closest(7, 2), 4);
        assert_eq!(div_round_closest(u64::MAX, 1), u64::MAX);
        assert_eq!(div_round_closest(u64::MAX, u64::MAX), 1);
    }

    #[test]
    fn best_divider_rounds_and_clamps() {
        assert_eq!(best_divider(1_622_250_000, 200_000_000), Ok(8));
        assert_eq!(best_divider(24_000_000, 48_000_000), Ok(1));
        assert_eq!(best_divider(0, 1), Ok(1));
        assert_eq!(best_divider(24_000_000, 1), Ok(DIV_MAX));
        assert_eq!(best_divider(24_000_000, 0), Err(ClkError::InvalidRate));
    }

    #[test]
    fn factor_small_dividers_use_pre_divider() {
        for d in 1..=8 {
            assert_eq!(factor_divider(d), Ok(Divider { pre: d, post: 1 }));
        }
    }

    #[test]
    fn factor_saturates_at_maximum() {
        let max = Divider { pre: 8, post: 64 };
        assert_eq!(factor_divider(512), Ok(max));
        assert_eq!(factor_divider(1000), Ok(max));
    }

    #[test]
    fn factor_prefers_smallest_pre_divider() {
        assert_eq!(factor_divider(9), Ok(Divider { pre: 1, post: 9 }));
        assert_eq!(factor_divider(64), Ok(Divider { pre: 1, post: 64 }));
        assert_eq!(factor_divider(100), Ok(Divider { pre: 2, post: 50 }));
        assert_eq!(factor_divider(384), Ok(Divider { pre: 6, post: 64 }));
        assert_eq!(factor_divider(448), Ok(Divider { pre: 7, post: 64 }));

        for d in 9..DIV_MAX {
            let smallest = (1..=PRE_DIV_MAX).find(|pre| d % pre == 0 && d / pre <= POST_DIV_MAX);
            match (smallest, factor_divider(d)) {
                (Some(pre), Ok(divider)) => {
                    assert_eq!(divider.pre, pre, "divider {}", d);
                    assert_eq!(divider.total(), d);
                }
                (None, Err(e)) => assert_eq!(e, ClkError::NoFactorization),
                (expected, got) => panic!("divider {}: {:?} vs {:?}", d, expected, got),
            }
        }
    }

    #[test]
    fn factor_rejects_large_primes() {
        assert_eq!(factor_divider(67), Err(ClkError::NoFactorization));
        assert_eq!(factor_divider(509), Err(ClkError::NoFactorization));
    }

    #[test]
    fn recalc_matches_worked_example() {
        let divider = factor_divider(best_divider(1_622_250_000, 200_000_000).unwrap()).unwrap();
        assert_eq!(divider, Divider { pre: 8, post: 1 });
        assert_eq!(recalc_rate(1_622_250_000, divider), 202_781_250);
        // Same inputs, same answer
        assert_eq!(recalc_rate(1_622_250_000, divider), 202_781_250);
    }

    #[test]
    fn register_fields_are_zero_based() {
        let divider = Divider::from_fields(0, 0);
        assert_eq!(divider, Divider { pre: 1, post: 1 });
        let divider = Divider::from_fields(7, 63);
        assert_eq!(divider.total(), 512);
        assert_eq!(divider.fields(), (7, 63));
        assert_eq!(Divider::from_fields(8, 64), Divider { pre: 1, post: 1 });
    }

    #[test]
    fn divider_pairs_stay_in_range() {
        assert_eq!(Divider::new(0, 1), None);
        assert_eq!(Divider::new(1, 0), None);
        assert_eq!(Divider::new(9, 1), None);
        assert_eq!(Divider::new(1, 65), None);
        let divider = Divider::new(8, 64).unwrap();
        assert_eq!((divider.pre(), divider.post()), (8, 64));
        assert_eq!(divider.fields(), (7, 63));
    }

    #[test]
    fn adjustable_parent_exact_multiple_wins() {
        // 1.2GHz is 6 x 200MHz, so nothing needs to change upstream
        let parent = SteppedParent::new(1_200_000_000, 7_000_000, 2_000_000_000);
        assert_eq!(
            best_divider_for_adjustable_parent(200_000_000, &parent),
            Ok((6, 1_200_000_000))
        );
        // The exact hit returns before the parent is asked for i == 6
        assert_eq!(parent.rounds.get(), 5);
    }

    #[test]
    fn adjustable_parent_never_overshoots() {
        let parent = SteppedParent::new(0, 7_000_000, 100_000_000);
        let (divider, parent_rate) =
            best_divider_for_adjustable_parent(30_000_000, &parent).unwrap();
        // 28MHz from 28MHz / 1 is the closest rate not above 30MHz
        assert_eq!((divider, parent_rate), (1, 28_000_000));

        let parent = SteppedParent::new(0, 1_000_000, 2_000_000_000);
        for target in [3_333_333u64, 12_345_678, 99_000_001] {
            let (divider, parent_rate) =
                best_divider_for_adjustable_parent(target, &parent).unwrap();
            assert!(div_round_closest(parent_rate, divider as u64) <= target);
        }
    }

    #[test]
    fn adjustable_parent_falls_back_to_maximum_divider() {
        // The parent can not go below 10MHz, so nothing reaches 1kHz / i <= 1kHz
        let parent = SteppedParent::new(0, 10_000_000, 10_000_000);
        assert_eq!(
            best_divider_for_adjustable_parent(1_000, &parent),
            Ok((DIV_MAX, 10_000_000))
        );
    }

    #[test]
    fn adjustable_parent_rejects_zero_rate() {
        let parent = SteppedParent::new(24_000_000, 1, u64::MAX);
        assert_eq!(
            best_divider_for_adjustable_parent(0, &parent),
            Err(ClkError::InvalidRate)
        );
    }

    #[test]
    fn adjustable_parent_guards_overflow() {
        let parent = SteppedParent::new(0, 1, u64::MAX);
        let huge = u64::MAX / 2;
        // Only dividers 1 and 2 fit; the search must not wrap around
        assert_eq!(
            best_divider_for_adjustable_parent(huge, &parent),
            Ok((1, huge))
        );
        assert_eq!(parent.rounds.get(), 2);
    }
}
