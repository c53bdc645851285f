//! gRPC service implementation
//!
//! Hosts the policy gate defined in the proto file. A blocked intent is a
//! normal response carrying the reason code; only malformed input and auth
//! failures surface as RPC errors.

use crate::api::auth::AuthService;
use crate::audit::{AuditEvent, AuditSink};
use crate::policy::PolicyEngine;
use std::sync::Arc;
use std::time::Instant;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

// Include generated protobuf code
pub mod proto {
    tonic::include_proto!("vaultgate.policy");
}

use proto::sign_policy_server::SignPolicy as SignPolicyTrait;
pub use proto::sign_policy_server::SignPolicyServer;
use proto::{
    CheckSignIntentRequest, CheckSignIntentResponse, GetPolicyRequest, GetPolicyResponse,
    HealthRequest, HealthResponse,
};

/// Shared application state
pub struct AppState {
    pub policy_engine: Arc<PolicyEngine>,
    pub auth_service: Arc<AuthService>,
    pub audit_sink: Arc<dyn AuditSink>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        policy_engine: Arc<PolicyEngine>,
        auth_service: Arc<AuthService>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            policy_engine,
            auth_service,
            audit_sink,
            start_time: Instant::now(),
        }
    }
}

/// Policy gate gRPC service implementation
pub struct SignPolicyService {
    state: Arc<AppState>,
}

impl SignPolicyService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn validate_auth<T>(&self, request: &Request<T>) -> Result<(), Status> {
        self.state
            .auth_service
            .validate_request(request)
            .map_err(Status::from)
    }
}

#[tonic::async_trait]
impl SignPolicyTrait for SignPolicyService {
    async fn check_sign_intent(
        &self,
        request: Request<CheckSignIntentRequest>,
    ) -> Result<Response<CheckSignIntentResponse>, Status> {
        self.validate_auth(&request)?;

        let req = request.into_inner();

        info!(
            "CheckSignIntent request: key_ref={}, req={}",
            req.key_ref, req.request_id
        );

        // Snapshot so the evaluation is consistent even if the policy is
        // swapped concurrently.
        let policy = self.state.policy_engine.snapshot();
        let decision = policy
            .check_sign_intent(&req.key_ref)
            .map_err(Status::from)?;

        let event = AuditEvent::for_decision(&req.request_id, &req.key_ref, &decision);
        if let Err(e) = self.state.audit_sink.emit(&event) {
            // The decision stands; losing an audit record is an operator
            // problem, not the caller's.
            warn!("Could not emit audit event: {}", e);
        }

        Ok(Response::new(CheckSignIntentResponse {
            allowed: decision.allowed,
            reason: decision.reason.as_str().to_string(),
        }))
    }

    async fn get_policy(
        &self,
        request: Request<GetPolicyRequest>,
    ) -> Result<Response<GetPolicyResponse>, Status> {
        self.validate_auth(&request)?;

        let policy = self.state.policy_engine.snapshot();

        Ok(Response::new(GetPolicyResponse {
            allow_key_refs: policy
                .allow_key_refs()
                .into_iter()
                .map(String::from)
                .collect(),
            deny_key_refs: policy
                .deny_key_refs()
                .into_iter()
                .map(String::from)
                .collect(),
        }))
    }

    async fn health(
        &self,
        request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        self.validate_auth(&request)?;

        let policy = self.state.policy_engine.snapshot();
        let uptime = self.state.start_time.elapsed().as_secs() as i64;

        Ok(Response::new(HealthResponse {
            healthy: true,
            uptime_seconds: uptime,
            allow_rules: policy.allow_count() as u32,
            deny_rules: policy.deny_count() as u32,
        }))
    }
}
