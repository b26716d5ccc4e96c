//! Edge conditions: predicate trees and their evaluation.
//!
//! Every [`FlowEdge`](crate::flow::FlowEdge) may carry a [`Predicate`]
//! guarding traversal. A predicate is either a single [`Check`] against the
//! conversation context or a combinator (`any` / `all` / `not`) over other
//! predicates, so arbitrary boolean trees are expressible in the persisted
//! graph JSON.
//!
//! Evaluation is pure and total: a malformed predicate (a check missing a
//! field its kind requires, or an invalid regex) evaluates to `false` and is
//! logged, never thrown, so one bad edge cannot halt graph evaluation.
//!
//! # Examples
//!
//! ```rust
//! use floweave::condition::{evaluate, EvalContext, Predicate};
//!
//! let wants_pizza = Predicate::user_contains("pizza");
//! let ctx = EvalContext::new().with_utterance("I want pizza");
//! assert!(evaluate(&wants_pizza, &ctx));
//!
//! let guarded = Predicate::all(vec![
//!     Predicate::tool_ok(),
//!     Predicate::parameters_has("email"),
//! ]);
//! assert!(!evaluate(&guarded, &ctx));
//! ```

mod eval;
mod predicate;

pub use eval::{ConditionError, EvalContext, ToolResult, evaluate};
pub use predicate::{Check, CheckKind, Predicate};

#[cfg(test)]
mod tests;
