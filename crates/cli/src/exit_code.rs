// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes (§6.6). Named constants so a subcommand's exit path
//! reads as a decision, not a bare integer.

pub const SUCCESS: i32 = 0;
/// Initialization failure, including a missing driver executable.
pub const INIT_FAILURE: i32 = 1;
pub const UNRESOLVED_STEP: i32 = 2;
pub const SCENARIO_FAILURE: i32 = 3;
pub const ABORTED_BY_SIGNAL: i32 = 130;
