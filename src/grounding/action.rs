use crate::graph::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do with a grounded element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    DoubleClick,
    Type,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::DoubleClick => "double_click",
            ActionKind::Type => "type",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element classes that take keyboard input
const INPUT_CLASSES: &[&str] = &["input", "text_area"];

/// Infer the action for `intent` on `target`.
///
/// Keywords in the intent win over the target's class: "type"/"input" mean
/// typing, "double" means a double click. Otherwise input-like elements are
/// typed into and everything else is clicked. Matching is case-insensitive
/// substring search.
pub fn infer_action(intent: &str, target: &Node) -> ActionKind {
    let intent = intent.to_lowercase();
    if intent.contains("type") || intent.contains("input") {
        return ActionKind::Type;
    }
    if intent.contains("double") {
        return ActionKind::DoubleClick;
    }
    match target.class_name() {
        Some(class) if INPUT_CLASSES.contains(&class) => ActionKind::Type,
        _ => ActionKind::Click,
    }
}
