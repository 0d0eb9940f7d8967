// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal feature/scenario model the Feature Executor walks (§4.6,
//! SPEC_FULL §3). Gherkin parsing beyond this shape is explicitly out of
//! scope (§1); labels are retained for readability but semantically ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepLabel {
    Given,
    When,
    Then,
    And,
    But,
}

impl StepLabel {
    fn from_prefix(word: &str) -> Option<Self> {
        match word {
            "Given" => Some(StepLabel::Given),
            "When" => Some(StepLabel::When),
            "Then" => Some(StepLabel::Then),
            "And" => Some(StepLabel::And),
            "But" => Some(StepLabel::But),
            _ => None,
        }
    }
}

/// One textual instruction inside a scenario (§ GLOSSARY "Step").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepText {
    pub label: Option<StepLabel>,
    pub text: String,
}

impl StepText {
    /// Parse a single line such as `When I click "submit"` into a label
    /// (ignored by the router) and the text the router actually matches
    /// against. A line with no recognized label keyword is treated as
    /// unlabeled step text verbatim.
    pub fn parse_line(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some((word, rest)) = trimmed.split_once(char::is_whitespace) {
            if let Some(label) = StepLabel::from_prefix(word) {
                return StepText {
                    label: Some(label),
                    text: rest.trim().to_string(),
                };
            }
        }
        StepText {
            label: None,
            text: trimmed.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<StepText>,
    #[serde(default)]
    pub stop_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Parse a minimal feature-shaped text file:
    ///
    /// ```text
    /// Feature: order a sandwich
    ///
    /// Scenario: happy path
    ///   Given I am on the menu page
    ///   When I click "order"
    ///   Then I see "order confirmed"
    /// ```
    ///
    /// Blank lines and lines starting with `#` are ignored. This is
    /// intentionally not a Gherkin parser (§1 Out of scope) — no
    /// backgrounds, tables, doc-strings, or tags.
    pub fn parse(text: &str) -> Result<Self, FeatureParseError> {
        let mut name: Option<String> = None;
        let mut scenarios: Vec<Scenario> = Vec::new();

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("Feature:") {
                name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("Scenario:") {
                scenarios.push(Scenario {
                    name: rest.trim().to_string(),
                    steps: Vec::new(),
                    stop_on_failure: false,
                });
            } else {
                let scenario = scenarios
                    .last_mut()
                    .ok_or(FeatureParseError::StepBeforeScenario)?;
                scenario.steps.push(StepText::parse_line(line));
            }
        }

        Ok(Feature {
            name: name.ok_or(FeatureParseError::MissingFeatureLine)?,
            scenarios,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureParseError {
    #[error("feature file has no `Feature:` line")]
    MissingFeatureLine,
    #[error("step text appears before any `Scenario:` line")]
    StepBeforeScenario,
}

#[cfg(test)]
#[path = "feature_tests.rs"]
mod tests;
