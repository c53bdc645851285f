//! Policy evaluation for signing intents
//!
//! Decides whether a requested key ref may sign, with deny-overrides-allow
//! precedence and a default-deny fallback.

pub mod engine;
pub mod rules;

pub use engine::{Decision, DecisionReason, PolicyDocument, PolicyEngine, SignPolicy, SignPolicyBuilder};
pub use rules::{KeyRef, PolicyRule};
