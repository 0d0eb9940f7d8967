// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed action-variant union the LLM driver may return (§4.7, §9).
//!
//! An "unknown" action is not a variant of this enum by construction —
//! `serde`'s internally-tagged representation rejects any `type` it doesn't
//! recognize, which is exactly the "parse rejects, triggers repair pass"
//! behavior §4.7 step 6 and §9 require.

use serde::{Deserialize, Serialize};

/// One of the enumerated key names the `key` action accepts (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyName {
    Enter,
    Tab,
    Escape,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// The action the LLM driver decided on for the current iteration (§4.7).
/// The union is closed: any other `type` value fails to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionVariant {
    Click { x: i64, y: i64 },
    DoubleClick { x: i64, y: i64 },
    Type { text: String },
    Key { key: KeyName },
    Scroll { x: i64, y: i64, scroll_y: i64 },
    Wait { duration: u64 },
    TaskComplete {},
}

impl ActionVariant {
    /// Name used in logs and history records.
    pub fn name(&self) -> &'static str {
        match self {
            ActionVariant::Click { .. } => "click",
            ActionVariant::DoubleClick { .. } => "double_click",
            ActionVariant::Type { .. } => "type",
            ActionVariant::Key { .. } => "key",
            ActionVariant::Scroll { .. } => "scroll",
            ActionVariant::Wait { .. } => "wait",
            ActionVariant::TaskComplete {} => "task_complete",
        }
    }

    /// Clamp any pixel coordinates in this action to `[0, width) x [0, height)`,
    /// returning whether clamping changed a value (§4.7: "values outside are
    /// clamped and a warning recorded").
    pub fn clamp_to_display(&mut self, width: i64, height: i64) -> bool {
        let clamp_pair = |x: &mut i64, y: &mut i64| -> bool {
            let cx = (*x).clamp(0, width.saturating_sub(1).max(0));
            let cy = (*y).clamp(0, height.saturating_sub(1).max(0));
            let changed = cx != *x || cy != *y;
            *x = cx;
            *y = cy;
            changed
        };
        match self {
            ActionVariant::Click { x, y } | ActionVariant::DoubleClick { x, y } => {
                clamp_pair(x, y)
            }
            ActionVariant::Scroll { x, y, .. } => clamp_pair(x, y),
            _ => false,
        }
    }
}

/// The decision payload returned by the LLM driver's `analyzeScreenAndDecide`
/// action (§4.7 step 6). Any other top-level shape is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmDecision {
    pub reasoning: String,
    pub action: ActionVariant,
    #[serde(rename = "isComplete")]
    pub is_complete: bool,
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
