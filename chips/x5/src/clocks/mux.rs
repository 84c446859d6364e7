// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Parent negotiation for muxed divider clocks.
//!
//! A clock with several parents answers a rate request by asking the divider
//! search what each parent can give and keeping the closest result. Clocks
//! that may not switch parent (no `CAN_REPARENT`, or
//! `NO_REPARENT_ON_SET_RATE`) only ever look at their current parent.

use super::divider::{self, Divider};
use super::{ClockFlags, ClockSource};
use crate::ClkError;

/// A single rate negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateRequest {
    /// Rate asked for by the consumer
    pub requested_rate: u64,
    /// Rate the chosen configuration delivers
    pub rate: u64,
    /// Index of the chosen parent
    pub best_parent: Option<usize>,
    /// Rate the chosen parent must run at
    pub best_parent_rate: u64,
}

impl RateRequest {
    pub fn new(requested_rate: u64) -> Self {
        Self {
            requested_rate,
            rate: 0,
            best_parent: None,
            best_parent_rate: 0,
        }
    }
}

/// Best `(achieved_rate, parent_rate)` for `rate` through `parent`.
///
/// With `SET_RATE_PARENT` the parent is asked to move; otherwise its current
/// rate is divided down as closely as possible.
pub fn rate_from_parent(
    parent: &dyn ClockSource,
    rate: u64,
    flags: ClockFlags,
) -> Result<(u64, u64), ClkError> {
    let (total, parent_rate) = if flags.contains(ClockFlags::SET_RATE_PARENT) {
        divider::best_divider_for_adjustable_parent(rate, parent)?
    } else {
        let parent_rate = parent.get_rate();
        (divider::best_divider(parent_rate, rate)?, parent_rate)
    };

    let divider: Divider = divider::factor_divider(total)?;
    Ok((divider::recalc_rate(parent_rate, divider), parent_rate))
}

/// Fill `req` with the parent and rate that best approximate
/// `req.requested_rate`.
///
/// # Errors
///
/// + [Err]\([ClkError::InvalidRate]\): `req.requested_rate` is zero
///
/// And only when the clock is pinned to its current parent:
///
/// + [Err]\([ClkError::NoParent]\): the current parent slot is empty
/// + any error from evaluating that parent
///
/// A reparentable clock skips parents that fail. If none is usable the
/// request comes back with a rate of 0 and no parent.
pub fn determine_rate(
    parents: &[Option<&dyn ClockSource>],
    current_parent: usize,
    flags: ClockFlags,
    req: &mut RateRequest,
) -> Result<(), ClkError> {
    let rate = req.requested_rate;
    if rate == 0 {
        return Err(ClkError::InvalidRate);
    }

    if !flags.contains(ClockFlags::CAN_REPARENT)
        || flags.contains(ClockFlags::NO_REPARENT_ON_SET_RATE)
    {
        let parent = parents
            .get(current_parent)
            .copied()
            .flatten()
            .ok_or(ClkError::NoParent)?;
        let (achieved, parent_rate) = rate_from_parent(parent, rate, flags)?;

        req.rate = achieved;
        req.best_parent = Some(current_parent);
        req.best_parent_rate = parent_rate;
        return Ok(());
    }

    let mut best_parent = None;
    let mut best_parent_rate = 0;
    let mut best_rate = 0;
    let mut best_rate_diff = 0;

    for (index, parent) in parents.iter().enumerate() {
        let parent = match parent {
            Some(parent) => *parent,
            None => continue,
        };

        let (achieved, parent_rate) = match rate_from_parent(parent, rate, flags) {
            Ok(result) => result,
            Err(_) => continue,
        };

        let rate_diff = rate.abs_diff(achieved);
        if rate_diff == 0 || best_parent.is_none() || rate_diff < best_rate_diff {
            best_parent = Some(index);
            best_parent_rate = parent_rate;
            best_rate = achieved;
            best_rate_diff = rate_diff;
        }

        if rate_diff == 0 {
            break;
        }
    }

    if best_parent.is_none() {
        debug!("no usable parent for {}Hz, reporting 0Hz", rate);
    }

    req.rate = best_rate;
    req.best_parent = best_parent;
    req.best_parent_rate = best_parent_rate;
    Ok(())
}
