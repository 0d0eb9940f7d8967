// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feature Executor (C6) and Agent Loop (C7): the two top-level drivers of
//! work built on the Registry and Step Router. Process-wide teardown (C9)
//! lives in `runix-daemon`, which owns the process lifetime these loops run
//! inside of.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent_loop;
pub mod feature_executor;

pub use agent_loop::{AgentLoop, AgentLoopConfig, AgentLoopControl, DriverRoles};
pub use feature_executor::{FeatureExecutor, FeatureExecutorConfig};
