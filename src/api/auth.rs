//! Authentication for the gRPC surface
//!
//! API token authentication via the `authorization` metadata entry.
//! Disabled by default; when enabled, every RPC must present a configured
//! token.

use crate::errors::{Result, VaultGateError};
use std::collections::HashSet;
use std::sync::RwLock;
use tonic::Request;
use tracing::debug;

/// Authentication service
pub struct AuthService {
    /// Accepted API tokens
    tokens: RwLock<HashSet<String>>,
    /// Whether auth is required
    require_auth: bool,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(require_auth: bool) -> Self {
        Self {
            tokens: RwLock::new(HashSet::new()),
            require_auth,
        }
    }

    /// Add an accepted token
    pub fn add_token(&self, token: &str) {
        let mut tokens = self.tokens.write().unwrap();
        tokens.insert(token.to_string());
    }

    /// Remove a token
    pub fn remove_token(&self, token: &str) {
        let mut tokens = self.tokens.write().unwrap();
        tokens.remove(token);
    }

    /// Validate the token carried in request metadata
    pub fn validate_request<T>(&self, request: &Request<T>) -> Result<()> {
        if !self.require_auth {
            return Ok(());
        }

        let auth_header = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok());

        let token = match auth_header {
            Some(header) if header.starts_with("Bearer ") => &header[7..],
            Some(header) if header.starts_with("ApiKey ") => &header[7..],
            Some(token) => token,
            None => {
                return Err(VaultGateError::SecurityViolation(
                    "Missing authorization header".to_string(),
                ))
            }
        };

        let tokens = self.tokens.read().unwrap();
        if tokens.contains(token) {
            debug!("Authenticated request");
            Ok(())
        } else {
            Err(VaultGateError::SecurityViolation(
                "Invalid API token".to_string(),
            ))
        }
    }

    /// Is auth required?
    pub fn is_auth_required(&self) -> bool {
        self.require_auth
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new(false)
    }
}
