// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step Router (C5): aggregates per-driver introspected step patterns into
//! a global table and matches step text to `{driverId, action, args}` (§4.5).

use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use runix_core::{DriverId, ParamType, StepDefinition};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid step pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("duplicate pattern {pattern:?} already registered for driver {driver_id}")]
    DuplicatePattern { driver_id: DriverId, pattern: String },
}

/// `resolve` outcome for a step whose text matched at least one pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStep {
    pub driver_id: DriverId,
    pub action: String,
    pub args: Vec<serde_json::Value>,
}

/// `resolve` outcome for a step whose text matched nothing, carrying
/// candidate suggestions for the Feature Executor's `StepNotFoundError`
/// (§4.5 "Failure").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatch {
    pub candidates: Vec<String>,
}

struct CompiledPattern {
    driver_id: DriverId,
    step: StepDefinition,
    regex: Regex,
    literal_chars: usize,
    capture_types: Vec<ParamType>,
    /// The first literal word in the pattern, used for suggestion overlap.
    literal_prefix: String,
}

#[derive(Default)]
struct RouterState {
    by_driver: HashMap<DriverId, Vec<CompiledPattern>>,
}

/// Aggregates every driver's declared step patterns into one routing table.
pub struct StepRouter {
    state: Mutex<RouterState>,
}

impl Default for StepRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl StepRouter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RouterState::default()),
        }
    }

    /// Register (or replace) `driverId`'s step table. Compiles every
    /// pattern up front so `resolve` never recompiles on the hot path.
    /// Rejects a (driverId, pattern) pair that collides with one already
    /// registered *for the same driver* (§3 invariant); a pattern shared
    /// across distinct drivers is not an error — the tie-break rule in
    /// `resolve` exists precisely to adjudicate that case.
    pub fn register_steps(
        &self,
        driver_id: DriverId,
        steps: Vec<StepDefinition>,
    ) -> Result<(), RouterError> {
        let mut compiled = Vec::with_capacity(steps.len());
        let mut seen_patterns = std::collections::HashSet::new();
        for step in steps {
            if !seen_patterns.insert(step.pattern.clone()) {
                return Err(RouterError::DuplicatePattern {
                    driver_id,
                    pattern: step.pattern,
                });
            }
            compiled.push(compile_pattern(driver_id, step)?);
        }

        self.state.lock().by_driver.insert(driver_id, compiled);
        Ok(())
    }

    /// Register every manifest-embedded `steps[]` entry without requiring
    /// the owning driver to be running. The concrete form `reloadFrom`
    /// takes here: the Registry is the thing that owns running clients and
    /// already calls `register_steps` once a driver's `introspect(steps)`
    /// answers, so this entry point only needs the static manifest data,
    /// which keeps this crate free of a dependency back on the registry
    /// crate that owns it.
    pub fn reload_from_manifests<'a>(
        &self,
        manifests: impl IntoIterator<Item = (DriverId, &'a runix_core::DriverManifest)>,
    ) -> Result<(), RouterError> {
        for (driver_id, manifest) in manifests {
            if manifest.steps.is_empty() {
                continue;
            }
            let steps = manifest
                .steps
                .iter()
                .map(|s| StepDefinition {
                    id: s.id.clone(),
                    pattern: s.pattern.clone(),
                    action: s.action.clone(),
                    description: s.description.clone(),
                    examples: s.examples.clone(),
                    parameters: s
                        .parameters
                        .iter()
                        .map(|p| runix_core::StepParam {
                            name: p.name.clone(),
                            ty: parse_param_type(&p.ty),
                            required: p.required,
                        })
                        .collect(),
                })
                .collect();
            self.register_steps(driver_id, steps)?;
        }
        Ok(())
    }

    /// Remove every pattern registered for `driver_id` (used when a driver
    /// is torn down and its steps should no longer be candidates).
    pub fn unregister(&self, driver_id: &DriverId) {
        self.state.lock().by_driver.remove(driver_id);
    }

    /// Match `step_text` against the combined table. Deterministic: for a
    /// fixed step table, the same text always resolves to the same
    /// `{driverId, action, args}` (§8 "determinism").
    pub fn resolve(&self, step_text: &str) -> Result<ResolvedStep, NoMatch> {
        let state = self.state.lock();

        let mut matches: Vec<(&CompiledPattern, Vec<serde_json::Value>)> = Vec::new();
        for patterns in state.by_driver.values() {
            for pattern in patterns {
                if let Some(captures) = pattern.regex.captures(step_text) {
                    let args = extract_args(&captures, &pattern.capture_types);
                    matches.push((pattern, args));
                }
            }
        }

        if matches.is_empty() {
            return Err(NoMatch {
                candidates: suggest(&state, step_text),
            });
        }

        // Rule 2 ("the driver id that appears first in the stable Registry
        // order") and rule 3 ("the lexicographically smaller driver id")
        // resolve to the same comparison: `Registry::list()` defines the
        // stable order as ids sorted lexicographically (registry.rs), not
        // live registration/discovery order, so swapping discovery order
        // never changes the winner (§8 scenario 4).
        matches.sort_by(|(a, _), (b, _)| {
            b.literal_chars
                .cmp(&a.literal_chars)
                .then_with(|| a.driver_id.as_str().cmp(b.driver_id.as_str()))
        });

        let (winner, args) = matches.remove(0);
        Ok(ResolvedStep {
            driver_id: winner.driver_id,
            action: winner.step.action.clone(),
            args,
        })
    }
}

/// Suggestions for `StepNotFoundError`: patterns whose first literal word
/// overlaps the step text's first word (§4.5 "Failure").
fn suggest(state: &RouterState, step_text: &str) -> Vec<String> {
    let first_word = step_text.split_whitespace().next().unwrap_or("");
    let mut out: Vec<String> = state
        .by_driver
        .values()
        .flatten()
        .filter(|p| {
            !p.literal_prefix.is_empty()
                && !first_word.is_empty()
                && p.literal_prefix
                    .to_lowercase()
                    .starts_with(&first_word.to_lowercase())
        })
        .map(|p| p.step.pattern.clone())
        .collect();
    out.sort();
    out.dedup();
    out
}

fn extract_args(
    captures: &regex::Captures<'_>,
    capture_types: &[ParamType],
) -> Vec<serde_json::Value> {
    let mut args = Vec::with_capacity(capture_types.len());
    for (i, ty) in capture_types.iter().enumerate() {
        let raw = captures.get(i + 1).map(|m| m.as_str()).unwrap_or("");
        let value = match ty {
            ParamType::Int => raw
                .parse::<i64>()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            ParamType::String | ParamType::Word => serde_json::Value::String(raw.to_string()),
        };
        args.push(value);
    }
    args
}

fn parse_param_type(s: &str) -> ParamType {
    match s {
        "int" => ParamType::Int,
        "word" => ParamType::Word,
        _ => ParamType::String,
    }
}

/// Compile a §6.3 pattern into a case-insensitive anchored regex, tracking
/// the count of true literal characters (used for the "more literal
/// characters wins" tie-break) separately from placeholder captures.
fn compile_pattern(
    driver_id: DriverId,
    step: StepDefinition,
) -> Result<CompiledPattern, RouterError> {
    let pattern = step.pattern.clone();
    let mut regex_str = String::from("^");
    let mut literal_chars = 0usize;
    let mut capture_types = Vec::new();
    let mut literal_prefix = String::new();

    let bytes = pattern.as_bytes();
    let mut i = 0usize;
    while i < pattern.len() {
        if pattern[i..].starts_with("{string}") {
            regex_str.push_str("\"([^\"]*)\"");
            capture_types.push(ParamType::String);
            i += "{string}".len();
        } else if pattern[i..].starts_with("{int}") {
            regex_str.push_str("(-?[0-9]+)");
            capture_types.push(ParamType::Int);
            i += "{int}".len();
        } else if pattern[i..].starts_with("{word}") {
            regex_str.push_str("(\\S+)");
            capture_types.push(ParamType::Word);
            i += "{word}".len();
        } else if bytes[i] == b'(' {
            let end = find_matching_paren(&pattern, i).ok_or_else(|| RouterError::InvalidPattern {
                pattern: pattern.clone(),
                reason: "unbalanced '(' in legacy regex group".into(),
            })?;
            regex_str.push_str(&pattern[i..=end]);
            capture_types.push(ParamType::String);
            i = end + 1;
        } else if bytes[i].is_ascii_whitespace() {
            let start = i;
            while i < pattern.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            regex_str.push_str("\\s+");
            literal_chars += i - start;
        } else {
            let Some(ch) = pattern[i..].chars().next() else {
                break;
            };
            regex_str.push_str(®ex::escape(&ch.to_string()));
            if !ch.is_whitespace() && literal_prefix.len() < 64 {
                literal_prefix.push(ch);
            }
            literal_chars += 1;
            i += ch.len_utf8();
        }
    }
    regex_str.push('$');

    let regex = RegexBuilder::new(&regex_str)
        .case_insensitive(true)
        .build()
        .map_err(|e| RouterError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

    // Use only the leading run of literal (non-placeholder) word characters
    // as the suggestion prefix.
    let literal_prefix = literal_prefix
        .chars()
        .take_while(|c| c.is_alphanumeric())
        .collect();

    Ok(CompiledPattern {
        driver_id,
        step,
        regex,
        literal_chars,
        capture_types,
        literal_prefix,
    })
}

fn find_matching_paren(pattern: &str, open: usize) -> Option<usize> {
    let bytes = pattern.as_bytes();
    let mut depth = 0i32;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
