//! Policy engine
//!
//! Evaluates signing intents against an allow-list and a deny-list of key
//! refs. Evaluation order is the contract:
//!
//! 1. deny-listed -> blocked (deny is absolute, even if also allow-listed)
//! 2. allow-listed -> permitted
//! 3. otherwise -> blocked (default-deny)
//!
//! The evaluator is a pure function over its inputs: no I/O, no clock, no
//! logging. Auditing is the caller's job, using the returned reason.

use crate::errors::{Result, VaultGateError};
use crate::policy::rules::{KeyRef, PolicyRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Why a signing intent was permitted or blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Key ref is explicitly revoked
    DenyListed,
    /// Key ref is explicitly granted
    AllowListed,
    /// Key ref is in neither list; blocked by default
    NotAllowListed,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::DenyListed => "deny_listed",
            DecisionReason::AllowListed => "allow_listed",
            DecisionReason::NotAllowListed => "not_allow_listed",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a signing intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// True iff the signing operation is permitted
    pub allowed: bool,
    /// Cause of the verdict, for audit logging
    pub reason: DecisionReason,
}

impl Decision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::AllowListed,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Immutable allow/deny policy over key refs
///
/// A key ref may appear in both sets; deny wins. An empty allow set means
/// no key ref is implicitly allowed, never "allow all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignPolicy {
    allow: HashSet<KeyRef>,
    deny: HashSet<KeyRef>,
}

impl SignPolicy {
    /// The empty policy: blocks every key ref
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a policy from raw allow/deny lists, rejecting empty entries
    pub fn from_lists<A, D>(allow: A, deny: D) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut policy = Self::empty();
        for entry in allow {
            policy.allow.insert(KeyRef::new(entry.as_ref()).map_err(|_| {
                VaultGateError::InvalidPolicy("allow list contains an empty key ref".to_string())
            })?);
        }
        for entry in deny {
            policy.deny.insert(KeyRef::new(entry.as_ref()).map_err(|_| {
                VaultGateError::InvalidPolicy("deny list contains an empty key ref".to_string())
            })?);
        }
        Ok(policy)
    }

    /// Compile a rule chain into a policy
    ///
    /// Rule order is irrelevant: deny rules dominate by construction, so the
    /// precedence contract holds no matter how the chain is sorted.
    pub fn from_rules(rules: &[PolicyRule]) -> Self {
        let mut policy = Self::empty();
        for rule in rules {
            match rule {
                PolicyRule::Allow { key_ref } => {
                    policy.allow.insert(key_ref.clone());
                }
                PolicyRule::Deny { key_ref } => {
                    policy.deny.insert(key_ref.clone());
                }
            }
        }
        policy
    }

    pub fn builder() -> SignPolicyBuilder {
        SignPolicyBuilder::default()
    }

    /// Merge two policies: union of allows, union of denies
    ///
    /// Merging never weakens a deny; a key ref revoked by either side stays
    /// revoked in the combined policy.
    pub fn merge(&self, other: &SignPolicy) -> SignPolicy {
        let mut merged = self.clone();
        merged.allow.extend(other.allow.iter().cloned());
        merged.deny.extend(other.deny.iter().cloned());
        merged
    }

    /// Evaluate a signing intent for `key_ref`
    ///
    /// Blocked is a legitimate, expected return value. An error means the
    /// input was malformed (empty key ref), which fails fast rather than
    /// guessing.
    pub fn check_sign_intent(&self, key_ref: &str) -> Result<Decision> {
        let key_ref = KeyRef::new(key_ref)?;

        if self.deny.contains(&key_ref) {
            return Ok(Decision::deny(DecisionReason::DenyListed));
        }
        if self.allow.contains(&key_ref) {
            return Ok(Decision::allow());
        }
        Ok(Decision::deny(DecisionReason::NotAllowListed))
    }

    pub fn allow_count(&self) -> usize {
        self.allow.len()
    }

    pub fn deny_count(&self) -> usize {
        self.deny.len()
    }

    /// Allow-listed key refs, sorted for stable output
    pub fn allow_key_refs(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self.allow.iter().map(KeyRef::as_str).collect();
        refs.sort_unstable();
        refs
    }

    /// Deny-listed key refs, sorted for stable output
    pub fn deny_key_refs(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self.deny.iter().map(KeyRef::as_str).collect();
        refs.sort_unstable();
        refs
    }
}

/// Incremental construction of a [`SignPolicy`]
#[derive(Debug, Clone, Default)]
pub struct SignPolicyBuilder {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl SignPolicyBuilder {
    pub fn allow(mut self, key_ref: &str) -> Self {
        self.allow.push(key_ref.to_string());
        self
    }

    pub fn deny(mut self, key_ref: &str) -> Self {
        self.deny.push(key_ref.to_string());
        self
    }

    /// Validate entries and build the policy
    pub fn build(self) -> Result<SignPolicy> {
        SignPolicy::from_lists(self.allow, self.deny)
    }
}

/// Policy document file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Version
    pub version: u32,
    /// Allow-listed key refs
    #[serde(default)]
    pub allow_key_refs: Vec<String>,
    /// Deny-listed key refs
    #[serde(default)]
    pub deny_key_refs: Vec<String>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: 1,
            allow_key_refs: vec![],
            deny_key_refs: vec![],
        }
    }
}

impl PolicyDocument {
    /// Load from file
    ///
    /// A missing file yields the default (empty, default-deny) document; a
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| VaultGateError::PolicyLoadFailed(e.to_string()))
    }

    /// Compile into an evaluable policy, rejecting malformed entries
    pub fn compile(&self) -> Result<SignPolicy> {
        SignPolicy::from_lists(&self.allow_key_refs, &self.deny_key_refs)
    }
}

/// Holds the live policy for the hosting service
///
/// Evaluation snapshots the policy under a read lock, so a concurrent
/// reload can never be observed mid-evaluation.
pub struct PolicyEngine {
    policy: RwLock<SignPolicy>,
}

impl PolicyEngine {
    /// Create an engine over an already-built policy
    pub fn new(policy: SignPolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }

    /// Load and compile a policy document from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let document = PolicyDocument::load(path)?;
        let policy = document.compile()?;
        info!(
            "Loaded policy from {:?} ({} allow, {} deny)",
            path,
            policy.allow_count(),
            policy.deny_count()
        );
        Ok(Self::new(policy))
    }

    /// Immutable snapshot of the current policy
    pub fn snapshot(&self) -> SignPolicy {
        self.policy.read().unwrap().clone()
    }

    /// Swap in a new policy atomically
    pub fn replace(&self, policy: SignPolicy) {
        *self.policy.write().unwrap() = policy;
    }

    /// Evaluate a signing intent against the current policy
    pub fn check_sign_intent(&self, key_ref: &str) -> Result<Decision> {
        let decision = self.policy.read().unwrap().check_sign_intent(key_ref)?;
        if !decision.allowed {
            debug!("Blocked signing intent for {}: {}", key_ref, decision.reason);
        }
        Ok(decision)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(SignPolicy::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_listed_key_is_permitted() {
        let policy = SignPolicy::from_lists(["xo"], [] as [&str; 0]).unwrap();
        let decision = policy.check_sign_intent("xo").unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::AllowListed);
    }

    #[test]
    fn test_unlisted_key_is_blocked() {
        let policy = SignPolicy::from_lists(["xo"], [] as [&str; 0]).unwrap();
        let decision = policy.check_sign_intent("eng").unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::NotAllowListed);
    }

    #[test]
    fn test_deny_listed_key_is_blocked() {
        let policy = SignPolicy::from_lists([] as [&str; 0], ["ops"]).unwrap();
        let decision = policy.check_sign_intent("ops").unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::DenyListed);
    }

    #[test]
    fn test_deny_overrides_allow() {
        let policy = SignPolicy::from_lists(["ops"], ["ops"]).unwrap();
        let decision = policy.check_sign_intent("ops").unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::DenyListed);
    }

    #[test]
    fn test_empty_policy_blocks_everything() {
        let policy = SignPolicy::empty();
        let decision = policy.check_sign_intent("xo").unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::NotAllowListed);
    }

    #[test]
    fn test_empty_key_ref_is_an_error() {
        let policy = SignPolicy::from_lists(["xo"], [] as [&str; 0]).unwrap();
        let result = policy.check_sign_intent("");
        assert!(matches!(
            result.unwrap_err(),
            VaultGateError::InvalidKeyRef(_)
        ));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let policy = SignPolicy::from_lists(["xo", "eng"], ["ops"]).unwrap();
        for key_ref in ["xo", "eng", "ops", "sec"] {
            let first = policy.check_sign_intent(key_ref).unwrap();
            let second = policy.check_sign_intent(key_ref).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_list_order_is_irrelevant() {
        let forward = SignPolicy::from_lists(["xo", "eng", "med"], ["ops", "cou"]).unwrap();
        let backward = SignPolicy::from_lists(["med", "eng", "xo"], ["cou", "ops"]).unwrap();
        for key_ref in ["xo", "eng", "med", "ops", "cou", "sec"] {
            assert_eq!(
                forward.check_sign_intent(key_ref).unwrap(),
                backward.check_sign_intent(key_ref).unwrap()
            );
        }
    }

    #[test]
    fn test_key_refs_are_case_sensitive() {
        let policy = SignPolicy::from_lists(["xo"], [] as [&str; 0]).unwrap();
        assert!(!policy.check_sign_intent("XO").unwrap().allowed);
    }

    #[test]
    fn test_from_lists_rejects_empty_entries() {
        let result = SignPolicy::from_lists(["xo", ""], [] as [&str; 0]);
        assert!(matches!(
            result.unwrap_err(),
            VaultGateError::InvalidPolicy(_)
        ));

        let result = SignPolicy::from_lists([] as [&str; 0], [""]);
        assert!(matches!(
            result.unwrap_err(),
            VaultGateError::InvalidPolicy(_)
        ));
    }

    #[test]
    fn test_from_rules_compiles_with_deny_precedence() {
        // Allow before deny in the chain; deny still wins.
        let rules = vec![
            PolicyRule::allow("ops").unwrap(),
            PolicyRule::deny("ops").unwrap(),
            PolicyRule::allow("xo").unwrap(),
        ];
        let policy = SignPolicy::from_rules(&rules);
        assert!(!policy.check_sign_intent("ops").unwrap().allowed);
        assert!(policy.check_sign_intent("xo").unwrap().allowed);

        // Reversed chain produces the same decisions.
        let mut reversed = rules.clone();
        reversed.reverse();
        let policy2 = SignPolicy::from_rules(&reversed);
        for key_ref in ["ops", "xo", "eng"] {
            assert_eq!(
                policy.check_sign_intent(key_ref).unwrap(),
                policy2.check_sign_intent(key_ref).unwrap()
            );
        }
    }

    #[test]
    fn test_builder() {
        let policy = SignPolicy::builder()
            .allow("xo")
            .allow("eng")
            .deny("ops")
            .build()
            .unwrap();
        assert!(policy.check_sign_intent("eng").unwrap().allowed);
        assert!(!policy.check_sign_intent("ops").unwrap().allowed);

        assert!(SignPolicy::builder().allow("").build().is_err());
    }

    #[test]
    fn test_merge_unions_both_sets() {
        let base = SignPolicy::from_lists(["xo"], ["ops"]).unwrap();
        let extra = SignPolicy::from_lists(["eng"], ["xo"]).unwrap();
        let merged = base.merge(&extra);

        assert!(merged.check_sign_intent("eng").unwrap().allowed);
        // xo was allowed in base but denied by the merged-in policy.
        let decision = merged.check_sign_intent("xo").unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::DenyListed);
        assert!(!merged.check_sign_intent("ops").unwrap().allowed);
    }

    #[test]
    fn test_duplicate_entries_are_deduplicated() {
        let policy = SignPolicy::from_lists(["xo", "xo", "xo"], [] as [&str; 0]).unwrap();
        assert_eq!(policy.allow_count(), 1);
    }

    #[test]
    fn test_sorted_introspection() {
        let policy = SignPolicy::from_lists(["xo", "eng", "med"], ["sec", "cou"]).unwrap();
        assert_eq!(policy.allow_key_refs(), vec!["eng", "med", "xo"]);
        assert_eq!(policy.deny_key_refs(), vec!["cou", "sec"]);
    }

    #[test]
    fn test_document_compile() {
        let document = PolicyDocument {
            version: 1,
            allow_key_refs: vec!["xo".to_string()],
            deny_key_refs: vec!["ops".to_string()],
        };
        let policy = document.compile().unwrap();
        assert!(policy.check_sign_intent("xo").unwrap().allowed);
        assert!(!policy.check_sign_intent("ops").unwrap().allowed);
    }

    #[test]
    fn test_document_compile_rejects_empty_entries() {
        let document = PolicyDocument {
            version: 1,
            allow_key_refs: vec!["".to_string()],
            deny_key_refs: vec![],
        };
        assert!(document.compile().is_err());
    }

    #[test]
    fn test_document_load_missing_file_is_default() {
        let document = PolicyDocument::load(Path::new("/nonexistent/policies.json")).unwrap();
        assert!(document.allow_key_refs.is_empty());
        assert!(document.deny_key_refs.is_empty());
    }

    #[test]
    fn test_engine_snapshot_is_isolated_from_reload() {
        let engine = PolicyEngine::new(SignPolicy::from_lists(["xo"], [] as [&str; 0]).unwrap());
        let snapshot = engine.snapshot();

        engine.replace(SignPolicy::from_lists([] as [&str; 0], ["xo"]).unwrap());

        // The snapshot still reflects the policy it was taken from.
        assert!(snapshot.check_sign_intent("xo").unwrap().allowed);
        assert!(!engine.check_sign_intent("xo").unwrap().allowed);
    }

    #[test]
    fn test_engine_default_is_default_deny() {
        let engine = PolicyEngine::default();
        assert!(!engine.check_sign_intent("xo").unwrap().allowed);
    }
}
