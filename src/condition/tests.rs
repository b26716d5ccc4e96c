//! Test suite for predicate schema and evaluation.

use super::*;
use proptest::prelude::*;
use serde_json::json;

/// Tests the case-insensitive substring check against a user utterance.
#[test]
fn user_contains_matches_case_insensitively() {
    let p = Predicate::user_contains("pizza");
    let hungry = EvalContext::new().with_utterance("I want PIZZA");
    let not_hungry = EvalContext::new().with_utterance("I want pasta");
    assert!(evaluate(&p, &hungry));
    assert!(!evaluate(&p, &not_hungry));
}

#[test]
fn user_regex_matches_utterance() {
    let p = Predicate::user_regex(r"order #\d+");
    let ctx = EvalContext::new().with_utterance("status of order #42 please");
    assert!(evaluate(&p, &ctx));
    assert!(!evaluate(&p, &EvalContext::new().with_utterance("no order here")));
}

/// An invalid regex is a recoverable evaluation error: false, not a panic.
#[test]
fn bad_regex_evaluates_false() {
    let p = Predicate::user_regex("([unclosed");
    let ctx = EvalContext::new().with_utterance("anything");
    assert!(!evaluate(&p, &ctx));
}

#[test]
fn intent_is_requires_exact_match() {
    let p = Predicate::intent_is("order_pizza");
    assert!(evaluate(
        &p,
        &EvalContext::new().with_intent("order_pizza")
    ));
    assert!(!evaluate(
        &p,
        &EvalContext::new().with_intent("order_pasta")
    ));
    assert!(!evaluate(&p, &EvalContext::new()));
}

/// Tests the guarded-transition scenario: tool succeeded AND email captured.
#[test]
fn tool_ok_and_parameters_has_combine() {
    let p = Predicate::all(vec![
        Predicate::tool_ok(),
        Predicate::parameters_has("email"),
    ]);
    let ready = EvalContext::new()
        .with_tool_result(ToolResult::new(true, json!({})))
        .with_parameter("email", "a@b.com");
    let tool_failed = EvalContext::new()
        .with_tool_result(ToolResult::new(false, json!({})))
        .with_parameter("email", "a@b.com");
    assert!(evaluate(&p, &ready));
    assert!(!evaluate(&p, &tool_failed));
}

/// `parameters.has` is a presence check: falsy values still count.
#[test]
fn parameters_has_counts_null_values() {
    let p = Predicate::parameters_has("flag");
    let ctx = EvalContext::new().with_parameter("flag", json!(null));
    assert!(evaluate(&p, &ctx));
    assert!(!evaluate(&p, &EvalContext::new()));
}

#[test]
fn parameters_equals_uses_primitive_text_comparison() {
    let p = Predicate::parameters_equals("count", json!("3"));
    let ctx = EvalContext::new().with_parameter("count", json!(3));
    assert!(evaluate(&p, &ctx));
}

#[test]
fn tool_field_equals_resolves_dotted_path() {
    let p = Predicate::tool_field_equals("data.status", "shipped");
    let ctx = EvalContext::new().with_tool_result(ToolResult::new(
        true,
        json!({"data": {"status": "shipped"}}),
    ));
    assert!(evaluate(&p, &ctx));

    let other = EvalContext::new()
        .with_tool_result(ToolResult::new(true, json!({"data": {"status": "pending"}})));
    assert!(!evaluate(&p, &other));
    assert!(!evaluate(&p, &EvalContext::new()));
}

/// A check missing its required field evaluates to false instead of halting.
#[test]
fn malformed_check_evaluates_false() {
    let p = Predicate::Single(Check {
        when: CheckKind::ParametersEquals,
        value: None,
        key: Some("email".into()),
        path: None,
    });
    let ctx = EvalContext::new().with_parameter("email", "a@b.com");
    assert!(!evaluate(&p, &ctx));
}

#[test]
fn predicate_wire_shapes_round_trip() {
    let p = Predicate::all(vec![
        Predicate::tool_ok(),
        Predicate::any(vec![
            Predicate::user_contains("pizza"),
            Predicate::negate(Predicate::parameters_has("declined")),
        ]),
    ]);
    let json = serde_json::to_value(&p).unwrap();
    assert!(json.get("all").is_some());
    assert_eq!(json["all"][0]["when"], "tool.ok");
    assert!(json["all"][1]["any"][1].get("not").is_some());
    let back: Predicate = serde_json::from_value(json).unwrap();
    assert_eq!(back, p);
}

#[test]
fn predicate_parses_editor_json() {
    let raw = json!({
        "all": [
            {"when": "tool.ok"},
            {"when": "parameters.has", "key": "email"}
        ]
    });
    let p: Predicate = serde_json::from_value(raw).unwrap();
    let ctx = EvalContext::new()
        .with_tool_result(ToolResult::new(true, json!({})))
        .with_parameter("email", "a@b.com");
    assert!(evaluate(&p, &ctx));
}

// Property tests for the combinator laws. Leaves are presence checks against
// a fixed context, paired with the truth value they evaluate to, so the laws
// can be checked against plain boolean algebra.

fn fixed_ctx() -> EvalContext {
    EvalContext::new().with_parameter("present", json!(1))
}

fn leaf(truth: bool) -> Predicate {
    if truth {
        Predicate::parameters_has("present")
    } else {
        Predicate::parameters_has("absent")
    }
}

fn predicate_with_truth() -> impl Strategy<Value = (Predicate, bool)> {
    let leaf_strategy = any::<bool>().prop_map(|b| (leaf(b), b));
    leaf_strategy.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|ops| {
                let truth = ops.iter().any(|(_, b)| *b);
                (
                    Predicate::any(ops.into_iter().map(|(p, _)| p).collect()),
                    truth,
                )
            }),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|ops| {
                let truth = ops.iter().all(|(_, b)| *b);
                (
                    Predicate::all(ops.into_iter().map(|(p, _)| p).collect()),
                    truth,
                )
            }),
            inner.prop_map(|(p, b)| (Predicate::negate(p), !b)),
        ]
    })
}

proptest! {
    /// `any([p1, p2])` agrees with `evaluate(p1) || evaluate(p2)`.
    #[test]
    fn any_is_logical_or((p1, _) in predicate_with_truth(), (p2, _) in predicate_with_truth()) {
        let ctx = fixed_ctx();
        let combined = Predicate::any(vec![p1.clone(), p2.clone()]);
        prop_assert_eq!(
            evaluate(&combined, &ctx),
            evaluate(&p1, &ctx) || evaluate(&p2, &ctx)
        );
    }

    /// `all([p1, p2])` agrees with `evaluate(p1) && evaluate(p2)`.
    #[test]
    fn all_is_logical_and((p1, _) in predicate_with_truth(), (p2, _) in predicate_with_truth()) {
        let ctx = fixed_ctx();
        let combined = Predicate::all(vec![p1.clone(), p2.clone()]);
        prop_assert_eq!(
            evaluate(&combined, &ctx),
            evaluate(&p1, &ctx) && evaluate(&p2, &ctx)
        );
    }

    /// `not(p)` agrees with `!evaluate(p)`.
    #[test]
    fn not_is_logical_negation((p, _) in predicate_with_truth()) {
        let ctx = fixed_ctx();
        prop_assert_eq!(
            evaluate(&Predicate::negate(p.clone()), &ctx),
            !evaluate(&p, &ctx)
        );
    }

    /// Evaluation matches the truth value tracked by construction.
    #[test]
    fn evaluation_matches_model((p, truth) in predicate_with_truth()) {
        prop_assert_eq!(evaluate(&p, &fixed_ctx()), truth);
    }
}
