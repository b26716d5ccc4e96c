//! Predicate schema for edge conditions.
//!
//! The wire/persisted form mirrors the editor's condition builder: a single
//! check is `{"when": "...", ...}`, combinators are `{"any": [...]}`,
//! `{"all": [...]}`, and `{"not": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A boolean expression guarding an edge.
///
/// `Predicate` is a recursive tagged union. Combinators own their operands,
/// so the tree is self-contained and serializes to the exact JSON shape the
/// editor persists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    /// Logical OR over the operands, short-circuiting left to right.
    Any { any: Vec<Predicate> },
    /// Logical AND over the operands, short-circuiting left to right.
    All { all: Vec<Predicate> },
    /// Negation of exactly one predicate.
    Not { not: Box<Predicate> },
    /// A single check against the conversation context.
    Single(Check),
}

impl Predicate {
    /// OR combinator over `operands`.
    #[must_use]
    pub fn any(operands: Vec<Predicate>) -> Self {
        Predicate::Any { any: operands }
    }

    /// AND combinator over `operands`.
    #[must_use]
    pub fn all(operands: Vec<Predicate>) -> Self {
        Predicate::All { all: operands }
    }

    /// Negation of `operand`.
    #[must_use]
    pub fn negate(operand: Predicate) -> Self {
        Predicate::Not {
            not: Box::new(operand),
        }
    }

    /// Case-insensitive substring match against the last user utterance.
    #[must_use]
    pub fn user_contains(needle: impl Into<String>) -> Self {
        Predicate::Single(Check {
            when: CheckKind::UserContains,
            value: Some(Value::String(needle.into())),
            key: None,
            path: None,
        })
    }

    /// Regular-expression match against the last user utterance.
    #[must_use]
    pub fn user_regex(pattern: impl Into<String>) -> Self {
        Predicate::Single(Check {
            when: CheckKind::UserRegex,
            value: Some(Value::String(pattern.into())),
            key: None,
            path: None,
        })
    }

    /// Exact match against the last detected intent.
    #[must_use]
    pub fn intent_is(intent: impl Into<String>) -> Self {
        Predicate::Single(Check {
            when: CheckKind::IntentIs,
            value: Some(Value::String(intent.into())),
            key: None,
            path: None,
        })
    }

    /// True iff the last tool call reported `ok: true`.
    #[must_use]
    pub fn tool_ok() -> Self {
        Predicate::Single(Check {
            when: CheckKind::ToolOk,
            value: None,
            key: None,
            path: None,
        })
    }

    /// True iff `key` is present in the parameter bag (any value counts).
    #[must_use]
    pub fn parameters_has(key: impl Into<String>) -> Self {
        Predicate::Single(Check {
            when: CheckKind::ParametersHas,
            value: None,
            key: Some(key.into()),
            path: None,
        })
    }

    /// True iff `key` is present and its value equals `value`.
    #[must_use]
    pub fn parameters_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Single(Check {
            when: CheckKind::ParametersEquals,
            value: Some(value.into()),
            key: Some(key.into()),
            path: None,
        })
    }

    /// True iff the value at `path` inside the last tool result's body
    /// equals `value`.
    #[must_use]
    pub fn tool_field_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Single(Check {
            when: CheckKind::ToolFieldEquals,
            value: Some(value.into()),
            key: None,
            path: Some(path.into()),
        })
    }
}

/// A single check against the conversation context.
///
/// Invariant: a check carries only the fields its [`CheckKind`] requires
/// (`tool.field_equals` needs `path` and `value`; `tool.ok` needs none).
/// The invariant is enforced at evaluation time, not at construction, so
/// graphs persisted by older editors still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub when: CheckKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// The kinds of single checks an edge condition can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckKind {
    #[serde(rename = "user.contains")]
    UserContains,
    #[serde(rename = "user.regex")]
    UserRegex,
    #[serde(rename = "intent_is")]
    IntentIs,
    #[serde(rename = "tool.ok")]
    ToolOk,
    #[serde(rename = "parameters.has")]
    ParametersHas,
    #[serde(rename = "parameters.equals")]
    ParametersEquals,
    #[serde(rename = "tool.field_equals")]
    ToolFieldEquals,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserContains => "user.contains",
            Self::UserRegex => "user.regex",
            Self::IntentIs => "intent_is",
            Self::ToolOk => "tool.ok",
            Self::ParametersHas => "parameters.has",
            Self::ParametersEquals => "parameters.equals",
            Self::ToolFieldEquals => "tool.field_equals",
        };
        write!(f, "{name}")
    }
}
