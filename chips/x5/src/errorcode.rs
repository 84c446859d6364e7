// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Error codes returned by the clock drivers.

/// Reasons a clock operation can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClkError {
    /// The requested rate is zero or cannot be produced by the clock
    InvalidRate,
    /// No `(pre, post)` divider pair multiplies to the requested divider
    NoFactorization,
    /// The PLL did not report lock within the poll budget
    LockTimeout,
    /// The parent slot is empty or out of range
    NoParent,
    /// The clock is marked critical and may not be gated
    Critical,
}
