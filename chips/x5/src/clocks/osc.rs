// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Fixed-rate root clocks.

use super::ClockSource;
use crate::ClkError;

/// Frequency of the X5 reference crystal
pub const OSC_FREQUENCY_HZ: u64 = 24_000_000;

/// A clock running at one rate it can not change, such as a crystal.
pub struct FixedClock {
    name: &'static str,
    rate: u64,
}

impl FixedClock {
    pub const fn new(name: &'static str, rate: u64) -> Self {
        Self { name, rate }
    }
}

impl ClockSource for FixedClock {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_rate(&self) -> u64 {
        self.rate
    }

    fn round_rate(&self, _rate: u64) -> u64 {
        self.rate
    }

    fn set_rate(&self, rate: u64) -> Result<(), ClkError> {
        if rate == self.rate {
            Ok(())
        } else {
            Err(ClkError::InvalidRate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_only_accepts_its_rate() {
        let osc = FixedClock::new("osc", OSC_FREQUENCY_HZ);
        assert_eq!(osc.get_rate(), 24_000_000);
        assert_eq!(osc.round_rate(100_000_000), 24_000_000);
        assert_eq!(osc.set_rate(24_000_000), Ok(()));
        assert_eq!(osc.set_rate(25_000_000), Err(ClkError::InvalidRate));
    }
}
