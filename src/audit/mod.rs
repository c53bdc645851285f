//! Audit trail for policy decisions
//!
//! The evaluator itself never logs; the hosting service records every
//! decision through an [`AuditSink`], carrying the reason code so blocked
//! intents are auditable without being treated as software errors.

use crate::errors::{Result, VaultGateError};
use crate::policy::{Decision, DecisionReason};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, warn};

/// One audited policy decision
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// When the decision was made
    pub at: DateTime<Utc>,
    /// Caller-supplied request id for correlation
    pub request_id: String,
    /// Key ref the intent named
    pub key_ref: String,
    /// Verdict
    pub allowed: bool,
    /// Cause of the verdict
    pub reason: DecisionReason,
}

impl AuditEvent {
    pub fn for_decision(request_id: &str, key_ref: &str, decision: &Decision) -> Self {
        Self {
            at: Utc::now(),
            request_id: request_id.to_string(),
            key_ref: key_ref.to_string(),
            allowed: decision.allowed,
            reason: decision.reason,
        }
    }
}

/// Sink for audit events emitted by the hosting service
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &AuditEvent) -> Result<()>;
}

/// Emits audit events as structured tracing records
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<()> {
        if event.allowed {
            info!(
                request_id = %event.request_id,
                key_ref = %event.key_ref,
                reason = %event.reason,
                "signing intent permitted"
            );
        } else {
            warn!(
                request_id = %event.request_id,
                key_ref = %event.key_ref,
                reason = %event.reason,
                "signing intent blocked"
            );
        }
        Ok(())
    }
}

/// In-memory audit sink for testing
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .expect("audit sink lock poisoned")
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .expect("audit sink lock poisoned")
            .clear();
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: &AuditEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| VaultGateError::AuditError("audit sink lock poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}
