// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step definitions as returned by a driver's `introspect(steps)` call (§3).
//!
//! Pattern *compilation* (the grammar of §6.3) lives in `runix-registry`,
//! which depends on this crate; `runix-core` only carries the plain data
//! shape so both the registry and the wire layer can share it without a
//! dependency cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a captured step parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Int,
    Word,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Int => write!(f, "int"),
            ParamType::Word => write!(f, "word"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// One step a driver has declared it can handle (§3).
///
/// `(driverId, pattern)` is unique within a registry snapshot; the router
/// enforces this at `registerSteps` time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,
    pub pattern: String,
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<StepParam>,
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
