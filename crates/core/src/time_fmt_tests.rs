// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    seconds      = { 45, "45s" },
    minutes      = { 190, "3m10s" },
    hours        = { 3720, "1h02m" },
    days         = { 183600, "2d03h" },
    zero         = { 0, "0s" },
    negative     = { -5, "0s" },
)]
fn elapsed_forms(secs: i64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[test]
fn ticks_use_clk_tck() {
    assert_eq!(format_ticks(16100, 100), "2m41s");
    assert_eq!(format_ticks(50, 100), "0s");
    assert_eq!(format_ticks(100, 0), "0s");
}
