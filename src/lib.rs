//! vaultgate - Policy gate for wallet-enclave signing intents
//!
//! A decision point that determines whether a requested signing operation,
//! identified by a key ref, is permitted under a policy combining an
//! allow-list and a deny-list:
//!
//! - Deny overrides allow: an explicit revocation always wins, even if the
//!   key ref is still allow-listed.
//! - Default-deny: a key ref in neither list is blocked.
//! - Fail closed: empty key refs and malformed policies are errors, never
//!   silently permissive.
//!
//! The evaluator never touches key material and never performs the signing
//! itself; it only classifies a requested key ref as allowed or blocked and
//! reports why, so the hosting service can act and audit.
//!
//! # Example
//!
//! ```
//! use vaultgate::policy::{DecisionReason, SignPolicy};
//!
//! let policy = SignPolicy::from_lists(["xo"], ["ops"]).unwrap();
//!
//! assert!(policy.check_sign_intent("xo").unwrap().allowed);
//! let blocked = policy.check_sign_intent("ops").unwrap();
//! assert!(!blocked.allowed);
//! assert_eq!(blocked.reason, DecisionReason::DenyListed);
//! ```

pub mod api;
pub mod audit;
pub mod config;
pub mod errors;
pub mod policy;

pub use errors::{Result, VaultGateError};
pub use policy::{Decision, DecisionReason, KeyRef, PolicyEngine, SignPolicy};
