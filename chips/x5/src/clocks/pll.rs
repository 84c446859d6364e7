// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Fractional PLL driver for the X5 clock controller.
//!
//! Each PLL multiplies the 24MHz reference by a fractional factor
//! `mint + mfrac / 2^16` to produce the VCO frequency, which is then divided
//! by the pre-divider, a post-divider and a power-of-two `divvco` divider.
//! Two outputs exist (P and R), each with its own post-divider and `divvco`;
//! a given PLL instance drives exactly one of them.
//!
//! Rates are never synthesized: requests are floored onto a precomputed
//! table (see [crate::clocks::pll_tables]).
//!
//! # Usage
//!
//! ```rust,ignore
//! let pll = &clocks.disp_pll;
//! pll.set_rate(148_500_000)?;
//! let rate = pll.get_rate();
//! if rate == 0 {
//!     /* PLL output gated */
//! }
//! ```
//!
//! ## Programming sequence
//!
//! A rate change relocks the loop, so the order of register writes matters:
//!
//! 1. gate the output (post-divider register cleared)
//! 2. bypass the loop
//! 3. write the fractional multiplier
//! 4. write the integer multiplier, pre-divider and VCO band
//! 5. enable the fractional modulator
//! 6. sync the bypass mux if the VCO runs at 4GHz or above
//! 7. power the loop on
//! 8. write the post-divider and ungate the output
//! 9. wait for lock, then leave bypass and re-assert the output enable
//!
//! A PLL that does not lock in time is reported through `debug!` and left
//! running; slow lock is tolerated by the hardware.

use core::cell::Cell;

use tock_registers::fields::FieldValue;
use tock_registers::{register_bitfields, LocalRegisterCopy, RegisterLongName};

use super::{ClockFlags, ClockSource};
use crate::registers::RegisterIo;
use crate::ClkError;

register_bitfields![u32,
    PLL_CFG [
        /// Integer part of the feedback multiplier
        MINT OFFSET(0) NUMBITS(12) [],
        /// Reference pre-divider
        PREDIV OFFSET(12) NUMBITS(6) [],
        /// VCO low-frequency bias
        LOWFREQ OFFSET(20) NUMBITS(1) [],
        /// VCO mode select
        VCOMODE OFFSET(21) NUMBITS(1) [],
        /// Route the reference straight to the outputs
        BYPASS OFFSET(24) NUMBITS(1) [],
        POWERON OFFSET(28) NUMBITS(1) []
    ],
    PLL_FRAC [
        /// Fractional part of the feedback multiplier, Q16
        MFRAC OFFSET(0) NUMBITS(16) []
    ],
    PLL_OUT [
        POSTDIV_P OFFSET(0) NUMBITS(3) [],
        DIVVCO_P OFFSET(4) NUMBITS(4) [],
        POSTDIV_R OFFSET(8) NUMBITS(3) [],
        DIVVCO_R OFFSET(12) NUMBITS(4) [],
        /// P output enable
        PEN OFFSET(16) NUMBITS(1) [],
        /// R output enable
        REN OFFSET(17) NUMBITS(1) []
    ],
    PLL_STATUS [
        LOCK OFFSET(0) NUMBITS(1) []
    ]
];

const PLL_CFG_OFFSET: usize = 0x0;
const PLL_FRAC_OFFSET: usize = 0x4;
const PLL_OUT_OFFSET: usize = 0x8;
const PLL_STATUS_OFFSET: usize = 0xC;
const PLL_DSM_OFFSET: usize = 0x10;
const PLL_SYNC_OFFSET: usize = 0x14;

/// Value enabling the fractional (delta-sigma) modulator
const PLL_FRAC_ENABLE: u32 = 0x3;
/// Value synchronizing the bypass mux for high VCO frequencies
const PLL_BYPASS_SYNC: u32 = 0x1;

const VCO_LOW_BAND_MAX_HZ: u64 = 3_750_000_000;
const VCO_NORMAL_BAND_MAX_HZ: u64 = 4_500_000_000;
const VCO_BYPASS_SYNC_MIN_HZ: u64 = 4_000_000_000;

// ~10ms in total
const LOCK_POLL_RETRIES: usize = 1000;
const LOCK_POLL_DELAY_US: u32 = 10;

// divvco register encoding is not linear
const DIVVCO_ENCODING: [(u16, u32); 6] = [
    (2, 0x0),
    (4, 0x8),
    (8, 0xc),
    (16, 0xd),
    (32, 0xe),
    (64, 0xf),
];

/// One precomputed PLL configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllRateEntry {
    pub rate: u64,
    pub prediv: u16,
    pub mint: u16,
    pub mfrac: u16,
    pub postdiv_p: u16,
    pub divvco_p: u16,
    pub postdiv_r: u16,
    pub divvco_r: u16,
}

impl PllRateEntry {
    /// `(postdiv, divvco)` of the given output.
    pub fn branch(&self, output: PllOutput) -> (u16, u16) {
        match output {
            PllOutput::P => (self.postdiv_p, self.divvco_p),
            PllOutput::R => (self.postdiv_r, self.divvco_r),
        }
    }
}

/// PLL output driven by an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllOutput {
    P,
    R,
}

/// VCO frequency band, selecting the analog bias of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VcoBand {
    /// Up to 3.75GHz
    Low,
    /// Above 3.75GHz, up to 4.5GHz
    Normal,
    /// Above 4.5GHz
    High,
}

impl VcoBand {
    pub fn from_vco(fvco: u64) -> Self {
        if fvco <= VCO_LOW_BAND_MAX_HZ {
            VcoBand::Low
        } else if fvco <= VCO_NORMAL_BAND_MAX_HZ {
            VcoBand::Normal
        } else {
            VcoBand::High
        }
    }

    fn field_value(self) -> FieldValue<u32, PLL_CFG::Register> {
        match self {
            VcoBand::Low => PLL_CFG::LOWFREQ::SET + PLL_CFG::VCOMODE::SET,
            VcoBand::Normal => PLL_CFG::LOWFREQ::CLEAR + PLL_CFG::VCOMODE::SET,
            VcoBand::High => PLL_CFG::LOWFREQ::SET + PLL_CFG::VCOMODE::CLEAR,
        }
    }
}

/// Register encoding of a `divvco` divider, if the divider exists.
pub fn divvco_to_reg(divvco: u16) -> Option<u32> {
    DIVVCO_ENCODING
        .iter()
        .find(|(value, _)| *value == divvco)
        .map(|(_, reg)| *reg)
}

/// `divvco` divider for a register encoding, if the encoding exists.
pub fn reg_to_divvco(reg: u32) -> Option<u16> {
    DIVVCO_ENCODING
        .iter()
        .find(|(_, encoding)| *encoding == reg)
        .map(|(value, _)| *value)
}

/// VCO frequency for a reference rate and a Q16 fractional multiplier.
///
/// The fractional contribution is truncated, as in hardware. Results beyond
/// `u64::MAX` saturate.
pub fn vco_frequency(parent_rate: u64, mint: u16, mfrac: u16) -> u64 {
    let parent_rate = parent_rate as u128;
    let fvco = parent_rate * mint as u128 + ((parent_rate * mfrac as u128) >> 16);
    fvco.min(u64::MAX as u128) as u64
}

/// Highest table row not above `rate`.
///
/// Requests below the smallest row get the smallest row. Returns [None] only
/// for an empty table.
pub fn round_rate(table: &[PllRateEntry], rate: u64) -> Option<&PllRateEntry> {
    table
        .iter()
        .find(|entry| rate >= entry.rate)
        .or_else(|| table.last())
}

fn field_bits<R: RegisterLongName>(value: FieldValue<u32, R>) -> u32 {
    let mut reg: LocalRegisterCopy<u32, R> = LocalRegisterCopy::new(0);
    reg.write(value);
    reg.get()
}

/// X5 fractional PLL.
pub struct Pll<'a, R: RegisterIo> {
    name: &'static str,
    registers: &'a R,
    base: usize,
    output: PllOutput,
    table: &'static [PllRateEntry],
    flags: ClockFlags,
    parent: Cell<Option<&'a dyn ClockSource>>,
}

impl<'a, R: RegisterIo> Pll<'a, R> {
    pub fn new(
        name: &'static str,
        registers: &'a R,
        base: usize,
        output: PllOutput,
        table: &'static [PllRateEntry],
        flags: ClockFlags,
    ) -> Self {
        Self {
            name,
            registers,
            base,
            output,
            table,
            flags,
            parent: Cell::new(None),
        }
    }

    /// Attach the reference clock.
    pub fn set_parent_clock(&self, parent: &'a dyn ClockSource) {
        self.parent.set(Some(parent));
    }

    fn parent_rate(&self) -> u64 {
        self.parent.get().map_or(0, |parent| parent.get_rate())
    }

    fn read(&self, offset: usize) -> u32 {
        self.registers.read(self.base + offset)
    }

    fn write(&self, offset: usize, value: u32) {
        self.registers.write(self.base + offset, value);
    }

    fn output_fields(&self, postdiv: u16, divvco_reg: u32) -> FieldValue<u32, PLL_OUT::Register> {
        match self.output {
            PllOutput::P => {
                PLL_OUT::POSTDIV_P.val(postdiv as u32)
                    + PLL_OUT::DIVVCO_P.val(divvco_reg)
                    + PLL_OUT::PEN::SET
            }
            PllOutput::R => {
                PLL_OUT::POSTDIV_R.val(postdiv as u32)
                    + PLL_OUT::DIVVCO_R.val(divvco_reg)
                    + PLL_OUT::REN::SET
            }
        }
    }

    fn enable_field(&self) -> FieldValue<u32, PLL_OUT::Register> {
        match self.output {
            PllOutput::P => PLL_OUT::PEN::SET,
            PllOutput::R => PLL_OUT::REN::SET,
        }
    }

    fn disable_field(&self) -> FieldValue<u32, PLL_OUT::Register> {
        match self.output {
            PllOutput::P => PLL_OUT::PEN::CLEAR,
            PllOutput::R => PLL_OUT::REN::CLEAR,
        }
    }

    fn wait_for_lock(&self) -> bool {
        for _ in 0..LOCK_POLL_RETRIES {
            let status: LocalRegisterCopy<u32, PLL_STATUS::Register> =
                LocalRegisterCopy::new(self.read(PLL_STATUS_OFFSET));
            if status.is_set(PLL_STATUS::LOCK) {
                return true;
            }
            self.registers.delay_us(LOCK_POLL_DELAY_US);
        }
        false
    }

    /// Table rate the PLL would run at for `rate`, 0 if the table is empty.
    pub fn round_rate(&self, rate: u64) -> u64 {
        round_rate(self.table, rate).map_or(0, |entry| entry.rate)
    }

    /// Rate currently programmed, computed from the registers.
    ///
    /// Returns 0 while the output is gated.
    pub fn recalc_rate(&self, parent_rate: u64) -> u64 {
        let cfg: LocalRegisterCopy<u32, PLL_CFG::Register> =
            LocalRegisterCopy::new(self.read(PLL_CFG_OFFSET));
        let frac: LocalRegisterCopy<u32, PLL_FRAC::Register> =
            LocalRegisterCopy::new(self.read(PLL_FRAC_OFFSET));
        let out: LocalRegisterCopy<u32, PLL_OUT::Register> =
            LocalRegisterCopy::new(self.read(PLL_OUT_OFFSET));

        let (enabled, postdiv, divvco_reg) = match self.output {
            PllOutput::P => (
                out.is_set(PLL_OUT::PEN),
                out.read(PLL_OUT::POSTDIV_P),
                out.read(PLL_OUT::DIVVCO_P),
            ),
            PllOutput::R => (
                out.is_set(PLL_OUT::REN),
                out.read(PLL_OUT::POSTDIV_R),
                out.read(PLL_OUT::DIVVCO_R),
            ),
        };
        if !enabled {
            return 0;
        }

        let divvco = match reg_to_divvco(divvco_reg) {
            Some(divvco) => divvco,
            None => return 0,
        };
        let fvco = vco_frequency(
            parent_rate,
            cfg.read(PLL_CFG::MINT) as u16,
            frac.read(PLL_FRAC::MFRAC) as u16,
        );

        match cfg.read(PLL_CFG::PREDIV) as u64 * postdiv as u64 * divvco as u64 {
            0 => 0,
            divider => fvco / divider,
        }
    }

    /// Program the table row for `rate` given the reference `parent_rate`.
    ///
    /// Nothing is written if the PLL already runs at `rate`.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClkError::InvalidRate]\): the table is empty or the selected
    /// row has a `divvco` the hardware can not encode
    pub fn set_rate_with_parent(&self, rate: u64, parent_rate: u64) -> Result<(), ClkError> {
        if self.recalc_rate(parent_rate) == rate {
            return Ok(());
        }

        let entry = round_rate(self.table, rate).ok_or(ClkError::InvalidRate)?;
        let (postdiv, divvco) = entry.branch(self.output);
        let divvco_reg = divvco_to_reg(divvco).ok_or(ClkError::InvalidRate)?;
        let fvco = vco_frequency(parent_rate, entry.mint, entry.mfrac);

        self.write(PLL_OUT_OFFSET, 0);

        let mut cfg: LocalRegisterCopy<u32, PLL_CFG::Register> =
            LocalRegisterCopy::new(self.read(PLL_CFG_OFFSET));
        cfg.modify(PLL_CFG::BYPASS::SET);
        self.write(PLL_CFG_OFFSET, cfg.get());

        self.write(
            PLL_FRAC_OFFSET,
            field_bits(PLL_FRAC::MFRAC.val(entry.mfrac as u32)),
        );

        cfg.modify(
            PLL_CFG::MINT.val(entry.mint as u32)
                + PLL_CFG::PREDIV.val(entry.prediv as u32)
                + VcoBand::from_vco(fvco).field_value(),
        );
        self.write(PLL_CFG_OFFSET, cfg.get());

        self.write(PLL_DSM_OFFSET, PLL_FRAC_ENABLE);
        if fvco >= VCO_BYPASS_SYNC_MIN_HZ {
            self.write(PLL_SYNC_OFFSET, PLL_BYPASS_SYNC);
        }

        cfg.modify(PLL_CFG::POWERON::SET);
        self.write(PLL_CFG_OFFSET, cfg.get());

        let out = field_bits(self.output_fields(postdiv, divvco_reg));
        self.write(PLL_OUT_OFFSET, out);

        if !self.wait_for_lock() {
            debug!(
                "{}: no lock after {} polls at {}Hz, continuing",
                self.name, LOCK_POLL_RETRIES, entry.rate
            );
        }

        cfg.modify(PLL_CFG::BYPASS::CLEAR);
        self.write(PLL_CFG_OFFSET, cfg.get());
        self.write(PLL_OUT_OFFSET, out);

        Ok(())
    }

    /// Power the loop and ungate the configured output.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClkError::LockTimeout]\): the PLL did not lock in time. The
    /// output stays enabled; call again to re-check.
    pub fn enable(&self) -> Result<(), ClkError> {
        let mut cfg: LocalRegisterCopy<u32, PLL_CFG::Register> =
            LocalRegisterCopy::new(self.read(PLL_CFG_OFFSET));
        cfg.modify(PLL_CFG::POWERON::SET);
        self.write(PLL_CFG_OFFSET, cfg.get());

        let mut out: LocalRegisterCopy<u32, PLL_OUT::Register> =
            LocalRegisterCopy::new(self.read(PLL_OUT_OFFSET));
        out.modify(self.enable_field());
        self.write(PLL_OUT_OFFSET, out.get());

        debug!("{}: enabled", self.name);

        if self.wait_for_lock() {
            Ok(())
        } else {
            Err(ClkError::LockTimeout)
        }
    }

    /// Gate the configured output.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClkError::Critical]\): the PLL feeds a critical clock
    pub fn disable(&self) -> Result<(), ClkError> {
        if self.flags.contains(ClockFlags::RATE_IS_CRITICAL) {
            return Err(ClkError::Critical);
        }

        let mut out: LocalRegisterCopy<u32, PLL_OUT::Register> =
            LocalRegisterCopy::new(self.read(PLL_OUT_OFFSET));
        out.modify(self.disable_field());
        self.write(PLL_OUT_OFFSET, out.get());
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        let out: LocalRegisterCopy<u32, PLL_OUT::Register> =
            LocalRegisterCopy::new(self.read(PLL_OUT_OFFSET));
        match self.output {
            PllOutput::P => out.is_set(PLL_OUT::PEN),
            PllOutput::R => out.is_set(PLL_OUT::REN),
        }
    }
}

impl<R: RegisterIo> ClockSource for Pll<'_, R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_rate(&self) -> u64 {
        self.recalc_rate(self.parent_rate())
    }

    fn round_rate(&self, rate: u64) -> u64 {
        Pll::round_rate(self, rate)
    }

    fn set_rate(&self, rate: u64) -> Result<(), ClkError> {
        self.set_rate_with_parent(rate, self.parent_rate())
    }
}
