// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver Client (C2) and Process Supervisor (C3): the typed RPC façade over
//! one driver process, and the OS-level lifetime that backs it.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod supervisor;

pub use client::{ClientConfig, ClientError, DriverClient};
pub use supervisor::{ProcessSupervisor, StartedDriver, SupervisorConfig, SupervisorError};
