// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Clock tree drivers for the D-Robotics/Horizon X5 SoC.
//!
//! The crate covers the rate-resolution side of the X5 clock controller:
//! divider search for the generator and CPU clocks, parent negotiation for
//! muxed clocks, and table-driven programming of the fractional PLLs. All
//! register traffic goes through the [registers::RegisterIo] capability.

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
pub mod debug;

pub mod clocks;
pub mod errorcode;
pub mod registers;

pub use crate::errorcode::ClkError;
