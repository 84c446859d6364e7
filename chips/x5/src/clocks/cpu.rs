// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! CPU cluster clock.
//!
//! The CPU clock is a generator whose divider is replicated once per core
//! slice. All eight copies must hold the same divider.

use super::generator::Generator;
use super::ClockFlags;
use crate::registers::RegisterIo;

/// Number of divider copies of the CPU clock.
pub const CPU_STRIPES: usize = 8;

pub type CpuClock<'a, R> = Generator<'a, R>;

/// CPU clock with its control registers starting at `offset`.
pub fn new_cpu_clock<'a, R: RegisterIo>(
    name: &'static str,
    registers: &'a R,
    offset: usize,
    flags: ClockFlags,
) -> CpuClock<'a, R> {
    Generator::new(name, registers, offset, CPU_STRIPES, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::generator::STRIPE_STRIDE;
    use crate::clocks::osc::FixedClock;
    use crate::clocks::ClockSource;
    use crate::registers::fake::FakeRegisters;
    use crate::ClkError;
    use std::vec::Vec;

    const CPU: usize = 0x300;

    #[test]
    fn divider_is_written_to_every_stripe() {
        let regs = FakeRegisters::new();
        let pll = FixedClock::new("cpu_pll", 1_500_000_000);
        let cpu = new_cpu_clock("cpu", &regs, CPU, ClockFlags::RATE_IS_CRITICAL);
        cpu.set_parent_clock(0, &pll);

        assert_eq!(cpu.set_rate(750_000_000), Ok(()));

        let offsets: Vec<usize> = regs.writes().iter().map(|(offset, _)| *offset).collect();
        let expected: Vec<usize> = (0..CPU_STRIPES).map(|i| CPU + i * STRIPE_STRIDE).collect();
        assert_eq!(offsets, expected);
        for offset in expected {
            // pre-divider 2
            assert_eq!(regs.peek(offset), 1 << 16);
        }
        assert_eq!(cpu.get_rate(), 750_000_000);
    }

    #[test]
    fn mux_and_enable_use_first_stripe() {
        let regs = FakeRegisters::new();
        let cpu = new_cpu_clock("cpu", &regs, CPU, ClockFlags::NONE);
        cpu.enable();
        assert_eq!(regs.writes(), [(CPU, 1 << 28)]);

        // Read-back ignores the other stripes
        regs.poke(CPU + STRIPE_STRIDE, 7 << 16);
        assert_eq!(cpu.recalc_rate(1_000_000), 1_000_000);
    }

    #[test]
    fn cpu_clock_stays_on() {
        let regs = FakeRegisters::new();
        let cpu = new_cpu_clock("cpu", &regs, CPU, ClockFlags::RATE_IS_CRITICAL);
        assert_eq!(cpu.disable(), Err(ClkError::Critical));
    }
}
