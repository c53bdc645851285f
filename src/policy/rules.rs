//! Policy rules for signing intents
//!
//! A policy is expressible as a chain of typed rules:
//! - `Allow` grants a key ref
//! - `Deny` revokes a key ref, and always defeats an `Allow` for the same ref
//!
//! Rules compile into the set-backed [`SignPolicy`](crate::policy::SignPolicy),
//! so the order of a rule chain never affects the decision.

use crate::errors::{Result, VaultGateError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier for a logical signing key or crew role
///
/// Case-sensitive and non-empty; the evaluator compares key refs only for
/// equality and attaches no further meaning to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyRef(String);

impl KeyRef {
    /// Create a key ref, rejecting empty values
    pub fn new(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(VaultGateError::InvalidKeyRef(
                "key ref must not be empty".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Deserialization goes through the validating constructor so an empty key
// ref in a policy document is rejected at load time.
impl<'de> Deserialize<'de> for KeyRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        KeyRef::new(&value).map_err(serde::de::Error::custom)
    }
}

/// A single policy rule in a rule chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyRule {
    /// Grant signing with this key ref
    Allow { key_ref: KeyRef },

    /// Revoke signing with this key ref (defeats any Allow for the same ref)
    Deny { key_ref: KeyRef },
}

impl PolicyRule {
    pub fn allow(key_ref: &str) -> Result<Self> {
        Ok(PolicyRule::Allow {
            key_ref: KeyRef::new(key_ref)?,
        })
    }

    pub fn deny(key_ref: &str) -> Result<Self> {
        Ok(PolicyRule::Deny {
            key_ref: KeyRef::new(key_ref)?,
        })
    }

    /// The key ref this rule applies to
    pub fn key_ref(&self) -> &KeyRef {
        match self {
            PolicyRule::Allow { key_ref } | PolicyRule::Deny { key_ref } => key_ref,
        }
    }

    /// Get a human-readable description of the rule
    pub fn description(&self) -> String {
        match self {
            PolicyRule::Allow { key_ref } => format!("allow signing with {}", key_ref),
            PolicyRule::Deny { key_ref } => format!("deny signing with {}", key_ref),
        }
    }
}
