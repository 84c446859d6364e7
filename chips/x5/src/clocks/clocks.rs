// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! X5 clock tree
//!
//! The tree handled by this crate looks like this:
//!
//! ```text
//!   OSC (24MHz) --+--> CPU PLL --+
//!                 |              +--> CPU clock (x8 stripes)
//!                 +--------------+
//!                 |
//!                 +--> SYS PLL --+
//!                 |              +--> SYS AXI generator
//!                 +--------------+
//!                 |
//!                 +--> DISP PLL -+
//!                 |              +--> display pixel generator --> pixel gate
//!                 +--------------+
//! ```
//!
//! Every generator can run straight from the oscillator (mux input 0) or from
//! its PLL (mux input 1), and may retune that PLL when asked for a rate.
//!
//! # Usage
//!
//! ```rust,ignore
//! let clocks = static_init!(Clocks<Mmio>, Clocks::new(&MMIO));
//! clocks.init();
//! clocks.clock(Clock::DispPixel).set_rate(148_500_000)?;
//! debug!("pixel clock at {}Hz", clocks.get_frequency(Clock::DispPixelGate));
//! ```

use super::cpu::{self, CpuClock};
use super::gate::Gate;
use super::generator::Generator;
use super::osc::{FixedClock, OSC_FREQUENCY_HZ};
use super::pll::{Pll, PllOutput};
use super::pll_tables::{X5_CPU_PLL_TABLE, X5_DISPLAY_PLL_TABLE, X5_SYS_PLL_TABLE};
use super::{ClockFlags, ClockSource};
use crate::registers::RegisterIo;

const CPU_PLL_BASE: usize = 0x000;
const SYS_PLL_BASE: usize = 0x100;
const DISP_PLL_BASE: usize = 0x200;
const CPU_CLK_OFFSET: usize = 0x300;
const SYS_AXI_OFFSET: usize = 0x400;
const DISP_PIXEL_OFFSET: usize = 0x404;
const GATE_OFFSET: usize = 0x500;
const DISP_PIXEL_GATE_BIT: u32 = 0;

const MUX_OSC: usize = 0;
const MUX_PLL: usize = 1;

/// Clocks of the X5 tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clock {
    Osc,
    CpuPll,
    SysPll,
    DispPll,
    Cpu,
    SysAxi,
    DispPixel,
    DispPixelGate,
}

pub struct Clocks<'a, R: RegisterIo> {
    pub osc: FixedClock,
    pub cpu_pll: Pll<'a, R>,
    pub sys_pll: Pll<'a, R>,
    pub disp_pll: Pll<'a, R>,
    pub cpu: CpuClock<'a, R>,
    pub sys_axi: Generator<'a, R>,
    pub disp_pixel: Generator<'a, R>,
    pub disp_pixel_gate: Gate<'a, R>,
}

impl<'a, R: RegisterIo> Clocks<'a, R> {
    pub fn new(registers: &'a R) -> Self {
        let tunable = ClockFlags::CAN_REPARENT | ClockFlags::SET_RATE_PARENT;

        Self {
            osc: FixedClock::new("osc", OSC_FREQUENCY_HZ),
            cpu_pll: Pll::new(
                "cpu_pll",
                registers,
                CPU_PLL_BASE,
                PllOutput::P,
                &X5_CPU_PLL_TABLE,
                ClockFlags::RATE_IS_CRITICAL,
            ),
            sys_pll: Pll::new(
                "sys_pll",
                registers,
                SYS_PLL_BASE,
                PllOutput::P,
                &X5_SYS_PLL_TABLE,
                ClockFlags::RATE_IS_CRITICAL,
            ),
            disp_pll: Pll::new(
                "disp_pll",
                registers,
                DISP_PLL_BASE,
                PllOutput::P,
                &X5_DISPLAY_PLL_TABLE,
                ClockFlags::NONE,
            ),
            cpu: cpu::new_cpu_clock(
                "cpu",
                registers,
                CPU_CLK_OFFSET,
                tunable | ClockFlags::RATE_IS_CRITICAL,
            ),
            sys_axi: Generator::new(
                "sys_axi",
                registers,
                SYS_AXI_OFFSET,
                1,
                tunable | ClockFlags::RATE_IS_CRITICAL,
            ),
            disp_pixel: Generator::new("disp_pixel", registers, DISP_PIXEL_OFFSET, 1, tunable),
            disp_pixel_gate: Gate::new(
                "disp_pixel_gate",
                registers,
                GATE_OFFSET,
                DISP_PIXEL_GATE_BIT,
                ClockFlags::SET_RATE_PARENT,
            ),
        }
    }

    /// Link every node to its parents. Must be called once, after the tree
    /// has reached its final location.
    pub fn init(&'a self) {
        self.cpu_pll.set_parent_clock(&self.osc);
        self.sys_pll.set_parent_clock(&self.osc);
        self.disp_pll.set_parent_clock(&self.osc);

        self.cpu.set_parent_clock(MUX_OSC, &self.osc);
        self.cpu.set_parent_clock(MUX_PLL, &self.cpu_pll);
        self.sys_axi.set_parent_clock(MUX_OSC, &self.osc);
        self.sys_axi.set_parent_clock(MUX_PLL, &self.sys_pll);
        self.disp_pixel.set_parent_clock(MUX_OSC, &self.osc);
        self.disp_pixel.set_parent_clock(MUX_PLL, &self.disp_pll);

        self.disp_pixel_gate.set_parent_clock(&self.disp_pixel);
    }

    pub fn clock(&self, clock: Clock) -> &dyn ClockSource {
        match clock {
            Clock::Osc => &self.osc,
            Clock::CpuPll => &self.cpu_pll,
            Clock::SysPll => &self.sys_pll,
            Clock::DispPll => &self.disp_pll,
            Clock::Cpu => &self.cpu,
            Clock::SysAxi => &self.sys_axi,
            Clock::DispPixel => &self.disp_pixel,
            Clock::DispPixelGate => &self.disp_pixel_gate,
        }
    }

    /// Current frequency of `clock` in Hz.
    pub fn get_frequency(&self, clock: Clock) -> u64 {
        self.clock(clock).get_rate()
    }
}
