//! API layer for vaultgate
//!
//! Provides:
//! - gRPC service implementation
//! - Authentication middleware

pub mod auth;
pub mod grpc;

pub use auth::AuthService;
pub use grpc::{AppState, SignPolicyService};
