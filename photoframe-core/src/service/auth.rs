use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use sha2::{Digest as _, Sha256};

use crate::config::service::ServiceConfig;
use crate::service::api::ApiRequest;

/// Decides whether a request carries an admin session.
pub trait AuthGate: Send + Sync {
    /// `true` when `request` may perform admin operations.
    fn is_admin(&self, request: &ApiRequest) -> bool;
}

/// Admin credentials checked against the `Authorization` header.
///
/// Accepts `Basic base64(id:password)` and `Bearer <token>`. Secrets are kept
/// as SHA-256 digests and compared in constant time. With neither a password
/// nor a token configured every request is denied.
#[derive(Clone)]
pub struct CredentialsGate {
    admin_id: String,
    password: Option<[u8; 32]>,
    token: Option<[u8; 32]>,
}

impl std::fmt::Debug for CredentialsGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsGate")
            .field("admin_id", &self.admin_id)
            .field("password", &self.password.is_some())
            .field("token", &self.token.is_some())
            .finish()
    }
}

fn digest(s: &[u8]) -> [u8; 32] {
    Sha256::digest(s).into()
}

fn ct_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl CredentialsGate {
    /// Gate for `admin_id` with optional password and bearer token.
    pub fn new(admin_id: impl Into<String>, password: Option<&str>, token: Option<&str>) -> Self {
        let nonempty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(|s| digest(s.as_bytes()));
        Self {
            admin_id: admin_id.into(),
            password: nonempty(password),
            token: nonempty(token),
        }
    }

    /// Gate from the admin settings of `cfg`.
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        Self::new(
            cfg.admin_id.clone(),
            cfg.admin_password.as_deref(),
            cfg.admin_token.as_deref(),
        )
    }

    /// Whether any credential is configured at all.
    pub fn is_configured(&self) -> bool {
        self.password.is_some() || self.token.is_some()
    }

    fn check_basic(&self, encoded: &str) -> bool {
        let Some(expected) = &self.password else {
            return false;
        };
        let Ok(decoded) = BASE64_STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        let Some((id, password)) = decoded.split_once(':') else {
            return false;
        };
        // Both halves are always compared.
        let id_ok = ct_eq(&digest(id.as_bytes()), &digest(self.admin_id.as_bytes()));
        let password_ok = ct_eq(&digest(password.as_bytes()), expected);
        id_ok & password_ok
    }

    fn check_bearer(&self, token: &str) -> bool {
        self.token
            .as_ref()
            .is_some_and(|expected| ct_eq(&digest(token.trim().as_bytes()), expected))
    }
}

impl AuthGate for CredentialsGate {
    fn is_admin(&self, request: &ApiRequest) -> bool {
        let Some(value) = request.header("authorization") else {
            return false;
        };
        let Some((scheme, credentials)) = value.trim().split_once(' ') else {
            return false;
        };
        if scheme.eq_ignore_ascii_case("basic") {
            self.check_basic(credentials)
        } else if scheme.eq_ignore_ascii_case("bearer") {
            self.check_bearer(credentials)
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/auth.rs"]
mod tests;
