// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry (C4) and Step Router (C5): discovers driver manifests, starts
//! and stops drivers on demand, and routes step text to the driver that
//! declared a matching pattern.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod discover;
pub mod registry;
pub mod router;

pub use discover::{DiscoveredManifest, DiscoveryError, MANIFEST_FILENAME};
pub use registry::{Registry, RegistryError};
pub use router::{NoMatch, ResolvedStep, RouterError, StepRouter};
