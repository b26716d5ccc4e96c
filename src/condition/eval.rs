//! Predicate evaluation against the conversation context.

use miette::Diagnostic;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use super::predicate::{Check, CheckKind, Predicate};

/// Result of the last tool call, as the engine reported it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolResult {
    pub ok: bool,
    pub body: Value,
}

impl ToolResult {
    #[must_use]
    pub fn new(ok: bool, body: Value) -> Self {
        Self { ok, body }
    }
}

/// Everything a predicate may inspect: the last user utterance, the last
/// detected intent, the last tool result, and the current parameter bag.
///
/// Built with the fluent `with_*` methods; an empty context makes every
/// context-dependent check false, which is the correct default for a
/// conversation that has not produced that signal yet.
#[derive(Clone, Debug, Default)]
pub struct EvalContext {
    pub utterance: String,
    pub intent: Option<String>,
    pub tool_result: Option<ToolResult>,
    pub parameters: FxHashMap<String, Value>,
}

impl EvalContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_utterance(mut self, utterance: impl Into<String>) -> Self {
        self.utterance = utterance.into();
        self
    }

    #[must_use]
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    #[must_use]
    pub fn with_tool_result(mut self, result: ToolResult) -> Self {
        self.tool_result = Some(result);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// A check could not be evaluated as written.
///
/// These are recovered at the [`evaluate`] boundary: the offending predicate
/// evaluates to `false` and the error is logged, so a single bad edge never
/// halts graph evaluation.
#[derive(Debug, Error, Diagnostic)]
pub enum ConditionError {
    /// The check is missing a field its kind requires.
    #[error("check `{kind}` requires field `{field}`")]
    #[diagnostic(
        code(floweave::condition::missing_field),
        help("Fix the edge condition in the editor; until then it evaluates to false.")
    )]
    MissingField { kind: CheckKind, field: &'static str },

    /// The check's field is present but not usable as the kind requires.
    #[error("check `{kind}` field `{field}` must be {expected}")]
    #[diagnostic(code(floweave::condition::invalid_field))]
    InvalidField {
        kind: CheckKind,
        field: &'static str,
        expected: &'static str,
    },

    /// `user.regex` carried a pattern that does not compile.
    #[error("invalid regex pattern `{pattern}`")]
    #[diagnostic(code(floweave::condition::bad_regex))]
    BadRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Evaluate a predicate tree against the conversation context.
///
/// Combinators short-circuit; `any([])` is `false` and `all([])` is `true`,
/// matching the usual OR/AND identities. A malformed check evaluates to
/// `false` with a warning log.
pub fn evaluate(predicate: &Predicate, ctx: &EvalContext) -> bool {
    match predicate {
        Predicate::Any { any } => any.iter().any(|p| evaluate(p, ctx)),
        Predicate::All { all } => all.iter().all(|p| evaluate(p, ctx)),
        Predicate::Not { not } => !evaluate(not, ctx),
        Predicate::Single(check) => match run_check(check, ctx) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    kind = %check.when,
                    error = %err,
                    "edge condition failed to evaluate; treating as false"
                );
                false
            }
        },
    }
}

fn run_check(check: &Check, ctx: &EvalContext) -> Result<bool, ConditionError> {
    match check.when {
        CheckKind::UserContains => {
            let needle = required_str(check, "value")?;
            Ok(ctx
                .utterance
                .to_lowercase()
                .contains(&needle.to_lowercase()))
        }
        CheckKind::UserRegex => {
            let pattern = required_str(check, "value")?;
            let re = Regex::new(pattern).map_err(|source| ConditionError::BadRegex {
                pattern: pattern.to_string(),
                source,
            })?;
            Ok(re.is_match(&ctx.utterance))
        }
        CheckKind::IntentIs => {
            let expected = required_str(check, "value")?;
            Ok(ctx.intent.as_deref() == Some(expected))
        }
        CheckKind::ToolOk => Ok(ctx.tool_result.as_ref().is_some_and(|t| t.ok)),
        CheckKind::ParametersHas => {
            let key = required_key(check)?;
            // Presence only; the value may be anything, including null.
            Ok(ctx.parameters.contains_key(key))
        }
        CheckKind::ParametersEquals => {
            let key = required_key(check)?;
            let expected = required_value(check)?;
            Ok(ctx
                .parameters
                .get(key)
                .is_some_and(|actual| values_equal(actual, expected)))
        }
        CheckKind::ToolFieldEquals => {
            let path = check.path.as_deref().ok_or(ConditionError::MissingField {
                kind: check.when,
                field: "path",
            })?;
            let expected = required_value(check)?;
            let body = ctx.tool_result.as_ref().map(|t| &t.body);
            Ok(body
                .and_then(|b| lookup_path(b, path))
                .is_some_and(|actual| values_equal(actual, expected)))
        }
    }
}

fn required_value<'c>(check: &'c Check) -> Result<&'c Value, ConditionError> {
    check.value.as_ref().ok_or(ConditionError::MissingField {
        kind: check.when,
        field: "value",
    })
}

fn required_str<'c>(check: &'c Check, field: &'static str) -> Result<&'c str, ConditionError> {
    let value = check.value.as_ref().ok_or(ConditionError::MissingField {
        kind: check.when,
        field,
    })?;
    value.as_str().ok_or(ConditionError::InvalidField {
        kind: check.when,
        field,
        expected: "a string",
    })
}

fn required_key<'c>(check: &'c Check) -> Result<&'c str, ConditionError> {
    check.key.as_deref().ok_or(ConditionError::MissingField {
        kind: check.when,
        field: "key",
    })
}

/// Equality as the editor means it: string comparison when both sides are
/// JSON primitives (so `5` equals `"5"`), structural equality otherwise.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (primitive_text(actual), primitive_text(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolve a dot-separated path inside a JSON body. Path segments index
/// objects by key and arrays by decimal position.
fn lookup_path<'v>(body: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
