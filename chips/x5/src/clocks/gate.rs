// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Single-bit clock gates.

use core::cell::Cell;

use super::{ClockFlags, ClockSource};
use crate::registers::RegisterIo;
use crate::ClkError;

/// Gate controlled by one enable bit. The rate is always the parent's.
pub struct Gate<'a, R: RegisterIo> {
    name: &'static str,
    registers: &'a R,
    offset: usize,
    bit: u32,
    flags: ClockFlags,
    parent: Cell<Option<&'a dyn ClockSource>>,
}

impl<'a, R: RegisterIo> Gate<'a, R> {
    pub fn new(
        name: &'static str,
        registers: &'a R,
        offset: usize,
        bit: u32,
        flags: ClockFlags,
    ) -> Self {
        Self {
            name,
            registers,
            offset,
            bit,
            flags,
            parent: Cell::new(None),
        }
    }

    pub fn set_parent_clock(&self, parent: &'a dyn ClockSource) {
        self.parent.set(Some(parent));
    }

    fn mask(&self) -> u32 {
        1 << self.bit
    }

    pub fn enable(&self) {
        let value = self.registers.read(self.offset);
        self.registers.write(self.offset, value | self.mask());
    }

    /// # Errors
    ///
    /// + [Err]\([ClkError::Critical]\): the gate is marked critical
    pub fn disable(&self) -> Result<(), ClkError> {
        if self.flags.contains(ClockFlags::RATE_IS_CRITICAL) {
            return Err(ClkError::Critical);
        }

        let value = self.registers.read(self.offset);
        self.registers.write(self.offset, value & !self.mask());
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.registers.read(self.offset) & self.mask() != 0
    }
}

impl<R: RegisterIo> ClockSource for Gate<'_, R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_rate(&self) -> u64 {
        self.parent.get().map_or(0, |parent| parent.get_rate())
    }

    fn round_rate(&self, rate: u64) -> u64 {
        match self.parent.get() {
            Some(parent) if self.flags.contains(ClockFlags::SET_RATE_PARENT) => {
                parent.round_rate(rate)
            }
            Some(parent) => parent.get_rate(),
            None => 0,
        }
    }

    /// Forwarded to the parent with `SET_RATE_PARENT`. Otherwise only the
    /// current parent rate is accepted.
    fn set_rate(&self, rate: u64) -> Result<(), ClkError> {
        let parent = self.parent.get().ok_or(ClkError::NoParent)?;
        if self.flags.contains(ClockFlags::SET_RATE_PARENT) {
            parent.set_rate(rate)
        } else if parent.get_rate() == rate {
            Ok(())
        } else {
            Err(ClkError::InvalidRate)
        }
    }
}
