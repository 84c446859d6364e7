// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Muxed divider clocks ("clock generators").
//!
//! A generator selects one of up to eight parents and divides it through a
//! pre/post divider pair. Its control register is laid out as follows:
//!
//! | Bits    | Field    | Meaning                     |
//! |---------|----------|-----------------------------|
//! | [5:0]   | POST_DIV | post-divider minus one      |
//! | [18:16] | PRE_DIV  | pre-divider minus one       |
//! | [26:24] | MUX      | parent index                |
//! | 28      | EN       | output enable               |
//!
//! Some generators, like the CPU clock, drive several identical copies of the
//! divider ("stripes") that must be kept in step. Divider writes go to every
//! stripe; the mux, the enable and rate read-back only use the first one.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pixel = &clocks.disp_pixel;
//! pixel.set_rate(148_500_000)?;
//! assert_eq!(pixel.get_rate(), 148_500_000);
//! ```

use core::cell::Cell;

use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::divider::{self, Divider};
use super::mux::{self, RateRequest};
use super::{ClockFlags, ClockSource};
use crate::registers::RegisterIo;
use crate::ClkError;

register_bitfields![u32,
    CLK_GEN [
        POST_DIV OFFSET(0) NUMBITS(6) [],
        PRE_DIV OFFSET(16) NUMBITS(3) [],
        MUX OFFSET(24) NUMBITS(3) [],
        EN OFFSET(28) NUMBITS(1) []
    ]
];

/// Mux width of a generator.
pub const MAX_PARENTS: usize = 8;
/// Distance between the control registers of two stripes.
pub const STRIPE_STRIDE: usize = 0x10;

type GenReg = LocalRegisterCopy<u32, CLK_GEN::Register>;

pub struct Generator<'a, R: RegisterIo> {
    name: &'static str,
    registers: &'a R,
    offset: usize,
    stripes: usize,
    flags: ClockFlags,
    parents: [Cell<Option<&'a dyn ClockSource>>; MAX_PARENTS],
    rate: Cell<u64>,
}

impl<'a, R: RegisterIo> Generator<'a, R> {
    /// Create a generator whose control register sits at `offset`.
    ///
    /// `stripes` is the number of divider copies; it is raised to 1 if 0.
    pub fn new(
        name: &'static str,
        registers: &'a R,
        offset: usize,
        stripes: usize,
        flags: ClockFlags,
    ) -> Self {
        Self {
            name,
            registers,
            offset,
            stripes: stripes.max(1),
            flags,
            parents: Default::default(),
            rate: Cell::new(0),
        }
    }

    /// Attach `parent` to mux input `index`.
    ///
    /// Indices beyond the mux width are ignored.
    pub fn set_parent_clock(&self, index: usize, parent: &'a dyn ClockSource) {
        if let Some(slot) = self.parents.get(index) {
            slot.set(Some(parent));
        }
    }

    fn parent_clock(&self, index: usize) -> Option<&'a dyn ClockSource> {
        self.parents.get(index).and_then(|slot| slot.get())
    }

    fn stripe_offset(&self, stripe: usize) -> usize {
        self.offset + stripe * STRIPE_STRIDE
    }

    fn read_control(&self) -> GenReg {
        LocalRegisterCopy::new(self.registers.read(self.offset))
    }

    fn write_control(&self, reg: GenReg) {
        self.registers.write(self.offset, reg.get());
    }

    /// Index of the parent currently selected by the mux.
    pub fn get_parent(&self) -> usize {
        self.read_control().read(CLK_GEN::MUX) as usize
    }

    /// Switch the mux to parent `index`.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClkError::NoParent]\): nothing is attached at `index`
    pub fn set_parent(&self, index: usize) -> Result<(), ClkError> {
        self.parent_clock(index).ok_or(ClkError::NoParent)?;

        let mut reg = self.read_control();
        reg.modify(CLK_GEN::MUX.val(index as u32));
        self.write_control(reg);
        Ok(())
    }

    /// Rate produced from `parent_rate` by the programmed divider.
    pub fn recalc_rate(&self, parent_rate: u64) -> u64 {
        let reg = self.read_control();
        let divider = Divider::from_fields(reg.read(CLK_GEN::PRE_DIV), reg.read(CLK_GEN::POST_DIV));
        divider::recalc_rate(parent_rate, divider)
    }

    /// Negotiate the parent and rate for `req` without touching hardware.
    pub fn determine_rate(&self, req: &mut RateRequest) -> Result<(), ClkError> {
        let parents: [Option<&dyn ClockSource>; MAX_PARENTS] =
            core::array::from_fn(|index| self.parent_clock(index));
        mux::determine_rate(&parents, self.get_parent(), self.flags, req)
    }

    /// Rate [ClockSource::set_rate] would settle on, 0 if none.
    pub fn round_rate(&self, rate: u64) -> u64 {
        let mut req = RateRequest::new(rate);
        match self.determine_rate(&mut req) {
            Ok(()) => req.rate,
            Err(_) => 0,
        }
    }

    /// Program the divider closest to `rate` for a parent at `parent_rate`.
    ///
    /// The divider is written to every stripe; the mux and enable bits are
    /// left as they are.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClkError::InvalidRate]\): `rate` is zero
    /// + [Err]\([ClkError::NoFactorization]\): the divider can not be split
    /// into pre and post dividers; nothing is written
    pub fn set_rate_with_parent(&self, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        let total = divider::best_divider(parent_rate, rate)?;
        let divider = match divider::factor_divider(total) {
            Ok(divider) => divider,
            Err(e) => {
                debug!("{}: can not split divider {} for {}Hz", self.name, total, rate);
                return Err(e);
            }
        };
        let (pre, post) = divider.fields();

        for stripe in 0..self.stripes {
            let offset = self.stripe_offset(stripe);
            let mut reg: GenReg = LocalRegisterCopy::new(self.registers.read(offset));
            reg.modify(CLK_GEN::PRE_DIV.val(pre) + CLK_GEN::POST_DIV.val(post));
            self.registers.write(offset, reg.get());
        }
        Ok(())
    }

    pub fn enable(&self) {
        let mut reg = self.read_control();
        reg.modify(CLK_GEN::EN::SET);
        self.write_control(reg);
    }

    /// # Errors
    ///
    /// + [Err]\([ClkError::Critical]\): the clock is marked critical
    pub fn disable(&self) -> Result<(), ClkError> {
        if self.flags.contains(ClockFlags::RATE_IS_CRITICAL) {
            return Err(ClkError::Critical);
        }

        let mut reg = self.read_control();
        reg.modify(CLK_GEN::EN::CLEAR);
        self.write_control(reg);
        Ok(())
    }

    /// Output rate as of the last [ClockSource::get_rate] or
    /// [ClockSource::set_rate]; 0 before either ran.
    pub fn cached_rate(&self) -> u64 {
        self.rate.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.read_control().is_set(CLK_GEN::EN)
    }
}

impl<R: RegisterIo> ClockSource for Generator<'_, R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_rate(&self) -> u64 {
        let rate = self
            .parent_clock(self.get_parent())
            .map_or(0, |parent| self.recalc_rate(parent.get_rate()));
        self.rate.set(rate);
        rate
    }

    fn round_rate(&self, rate: u64) -> u64 {
        Generator::round_rate(self, rate)
    }

    fn set_rate(&self, rate: u64) -> Result<(), ClkError> {
        let mut req = RateRequest::new(rate);
        self.determine_rate(&mut req)?;

        let index = req.best_parent.ok_or(ClkError::NoParent)?;
        let parent = self.parent_clock(index).ok_or(ClkError::NoParent)?;

        if self.flags.contains(ClockFlags::SET_RATE_PARENT)
            && parent.get_rate() != req.best_parent_rate
        {
            parent.set_rate(req.best_parent_rate)?;
        }

        let current = self.get_parent();
        if index != current {
            debug!(
                "{}: reparent {} -> {} for {}Hz",
                self.name,
                self.parent_clock(current).map_or("none", |p| p.name()),
                parent.name(),
                rate
            );
            self.set_parent(index)?;
        }

        let parent_rate = parent.get_rate();
        self.set_rate_with_parent(req.rate, parent_rate)?;
        self.rate.set(self.recalc_rate(parent_rate));
        Ok(())
    }
}
