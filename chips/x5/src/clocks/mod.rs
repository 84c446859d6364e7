// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! X5 clock tree.
//!
//! Every node of the tree implements [ClockSource], which is both what a
//! child uses to query its parent and what a consumer uses to ask a clock for
//! a rate. Nodes borrow their parents; the tree itself (see [Clocks]) owns
//! every node for the lifetime of the system.

pub mod clocks;
pub mod cpu;
pub mod divider;
pub mod gate;
pub mod generator;
pub mod mux;
pub mod osc;
pub mod pll;
pub mod pll_tables;

pub use crate::clocks::clocks::{Clock, Clocks};

use crate::ClkError;

use core::ops::BitOr;

/// A clock that can report and negotiate its output rate.
pub trait ClockSource {
    /// Name used in debug output.
    fn name(&self) -> &'static str;

    /// Current output rate in Hz. 0 means the clock is not running.
    fn get_rate(&self) -> u64;

    /// Rate the clock would deliver if asked for `rate`, without changing
    /// anything. 0 means the request can not be satisfied.
    fn round_rate(&self, rate: u64) -> u64;

    /// Reconfigure the clock so it runs as close to `rate` as it can.
    fn set_rate(&self, rate: u64) -> Result<(), ClkError>;
}

/// Behaviour flags of a clock node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockFlags(u32);

impl ClockFlags {
    pub const NONE: ClockFlags = ClockFlags(0);
    /// The node may switch between its parents.
    pub const CAN_REPARENT: ClockFlags = ClockFlags(1 << 0);
    /// Rate changes only adjust the current parent, never switch it.
    pub const NO_REPARENT_ON_SET_RATE: ClockFlags = ClockFlags(1 << 1);
    /// The node may ask its parent for a different rate.
    pub const SET_RATE_PARENT: ClockFlags = ClockFlags(1 << 2);
    /// The node must never be gated.
    pub const RATE_IS_CRITICAL: ClockFlags = ClockFlags(1 << 3);

    pub const fn contains(self, other: ClockFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClockFlags {
    type Output = ClockFlags;

    fn bitor(self, rhs: ClockFlags) -> ClockFlags {
        ClockFlags(self.0 | rhs.0)
    }
}
