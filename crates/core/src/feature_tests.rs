// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = r#"
# a comment
Feature: order a sandwich

Scenario: happy path
  Given I am on the menu page
  When I click "order"
  Then I see "order confirmed"

Scenario: second scenario
  When I echo "hi"
"#;

#[test]
fn parses_feature_name_and_scenarios() {
    let feature = Feature::parse(SAMPLE).expect("valid feature");
    assert_eq!(feature.name, "order a sandwich");
    assert_eq!(feature.scenarios.len(), 2);
    assert_eq!(feature.scenarios[0].name, "happy path");
    assert_eq!(feature.scenarios[0].steps.len(), 3);
}

#[test]
fn step_labels_are_parsed_but_text_excludes_them() {
    let feature = Feature::parse(SAMPLE).expect("valid feature");
    let step = &feature.scenarios[0].steps[1];
    assert_eq!(step.label, Some(StepLabel::When));
    assert_eq!(step.text, "I click \"order\"");
}

#[test]
fn missing_feature_line_is_an_error() {
    let err = Feature::parse("Scenario: oops\n  When I do it\n").unwrap_err();
    assert_eq!(err, FeatureParseError::MissingFeatureLine);
}

#[test]
fn step_before_scenario_is_an_error() {
    let err = Feature::parse("Feature: x\nWhen I do it\n").unwrap_err();
    assert_eq!(err, FeatureParseError::StepBeforeScenario);
}

#[test]
fn unlabeled_step_text_is_kept_verbatim() {
    let parsed = StepText::parse_line("I echo \"hi\"");
    assert_eq!(parsed.label, None);
    assert_eq!(parsed.text, "I echo \"hi\"");
}
