// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Register access capability for the clock controller.
//!
//! The drivers never dereference MMIO directly. They are handed a
//! [RegisterIo] covering the clock controller block and address registers by
//! byte offset from its base. Field layouts are described with
//! `register_bitfields!` next to each driver and decoded through
//! [tock_registers::LocalRegisterCopy].

/// 32-bit register window of the clock controller.
pub trait RegisterIo {
    /// Read the register at byte `offset`.
    fn read(&self, offset: usize) -> u32;

    /// Write `value` to the register at byte `offset`.
    fn write(&self, offset: usize, value: u32);

    /// Busy-wait for roughly `us` microseconds.
    ///
    /// Platforms with a calibrated timer should override this.
    fn delay_us(&self, us: u32) {
        for _ in 0..us {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::RegisterIo;
    use core::cell::{Cell, RefCell};
    use std::vec::Vec;

    /// Number of 32-bit words in the fake register file.
    pub const FAKE_WORDS: usize = 0x200;

    /// In-memory register file that records every write.
    pub struct FakeRegisters {
        regs: RefCell<[u32; FAKE_WORDS]>,
        writes: RefCell<Vec<(usize, u32)>>,
        delays: Cell<usize>,
    }

    impl FakeRegisters {
        pub fn new() -> Self {
            Self {
                regs: RefCell::new([0; FAKE_WORDS]),
                writes: RefCell::new(Vec::new()),
                delays: Cell::new(0),
            }
        }

        /// Set a register without recording a write.
        pub fn poke(&self, offset: usize, value: u32) {
            self.regs.borrow_mut()[offset / 4] = value;
        }

        pub fn peek(&self, offset: usize) -> u32 {
            self.regs.borrow()[offset / 4]
        }

        pub fn writes(&self) -> Vec<(usize, u32)> {
            self.writes.borrow().clone()
        }

        pub fn clear_writes(&self) {
            self.writes.borrow_mut().clear();
        }

        pub fn delays(&self) -> usize {
            self.delays.get()
        }
    }

    impl RegisterIo for FakeRegisters {
        fn read(&self, offset: usize) -> u32 {
            self.peek(offset)
        }

        fn write(&self, offset: usize, value: u32) {
            self.poke(offset, value);
            self.writes.borrow_mut().push((offset, value));
        }

        fn delay_us(&self, _us: u32) {
            self.delays.set(self.delays.get() + 1);
        }
    }
}
