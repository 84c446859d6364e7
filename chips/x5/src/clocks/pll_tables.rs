// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Rate tables of the X5 fractional PLLs.
//!
//! All tables assume the 24MHz reference oscillator. Output rate is
//! `fvco / (prediv * postdiv * divvco)` with
//! `fvco = 24MHz * mint + (24MHz * mfrac) >> 16`. Rows are sorted strictly
//! descending; the last row is the floor for requests below the table.

use super::pll::PllRateEntry;

const fn entry(
    rate: u64,
    prediv: u16,
    mint: u16,
    mfrac: u16,
    postdiv_p: u16,
    divvco_p: u16,
    postdiv_r: u16,
    divvco_r: u16,
) -> PllRateEntry {
    PllRateEntry {
        rate,
        prediv,
        mint,
        mfrac,
        postdiv_p,
        divvco_p,
        postdiv_r,
        divvco_r,
    }
}

/// CPU cluster PLL.
pub const X5_CPU_PLL_TABLE: [PllRateEntry; 8] = [
    entry(1_800_000_000, 1, 150, 0, 1, 2, 1, 2),
    entry(1_500_000_000, 1, 125, 0, 1, 2, 1, 2),
    entry(1_200_000_000, 1, 200, 0, 1, 4, 2, 2),
    entry(996_000_000, 1, 166, 0, 1, 4, 2, 2),
    entry(804_000_000, 1, 134, 0, 1, 4, 2, 2),
    entry(600_000_000, 1, 200, 0, 1, 8, 2, 4),
    entry(408_000_000, 1, 136, 0, 1, 8, 2, 4),
    entry(300_000_000, 1, 200, 0, 1, 16, 2, 8),
];

/// System bus PLL.
pub const X5_SYS_PLL_TABLE: [PllRateEntry; 2] = [
    entry(1_500_000_000, 1, 125, 0, 1, 2, 1, 2),
    entry(1_200_000_000, 1, 200, 0, 1, 4, 2, 2),
];

/// Display PLL, rows chosen for common pixel clocks.
pub const X5_DISPLAY_PLL_TABLE: [PllRateEntry; 13] = [
    entry(1_800_000_000, 1, 150, 0, 1, 2, 1, 2),
    entry(1_622_250_000, 1, 135, 12288, 1, 2, 1, 2),
    entry(1_188_000_000, 1, 198, 0, 1, 4, 2, 2),
    entry(891_000_000, 1, 148, 32768, 1, 4, 2, 2),
    entry(594_000_000, 1, 198, 0, 1, 8, 2, 4),
    entry(445_500_000, 2, 148, 32768, 1, 4, 2, 2),
    entry(371_250_000, 1, 185, 40960, 3, 4, 3, 4),
    entry(324_000_000, 1, 162, 0, 3, 4, 3, 4),
    entry(251_750_000, 1, 125, 57344, 3, 4, 3, 4),
    entry(148_500_000, 1, 198, 0, 1, 32, 2, 16),
    entry(108_000_000, 1, 144, 0, 1, 32, 2, 16),
    entry(74_250_000, 1, 198, 0, 1, 64, 2, 32),
    entry(65_000_000, 1, 130, 0, 3, 16, 3, 16),
];
