use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::api::handler::AppState;
use crate::error::{AppError, AppResult};
use crate::ledger::models::Campaign;

/// Verified identity of the caller, established by the upstream auth service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,
    /// Unix seconds
    pub exp: i64,
}

/// Checks bearer tokens signed by the auth service.
///
/// Token format: `base64url(claims json) "." base64url(ed25519 signature over the claims segment)`
pub struct TokenVerifier {
    key: VerifyingKey,
}

impl TokenVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build from the hex-encoded 32-byte public key in config
    pub fn from_hex(public_key: &str) -> AppResult<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|_| AppError::Config("AUTH_PUBLIC_KEY is not valid hex".to_string()))?;

        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            AppError::Config("AUTH_PUBLIC_KEY must be 32 bytes".to_string())
        })?;

        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|_| AppError::Config("AUTH_PUBLIC_KEY is not a valid ed25519 key".to_string()))?;

        Ok(Self::new(key))
    }

    pub fn verify(&self, token: &str) -> AppResult<CallerIdentity> {
        let invalid = || AppError::Unauthorized("Not authorized, token failed".to_string());

        let (payload, signature) = token.split_once('.').ok_or_else(invalid)?;

        let sig_bytes = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| invalid())?;

        if let Err(e) = self.key.verify(payload.as_bytes(), &signature) {
            warn!("✗ Bearer token signature rejected: {}", e);
            return Err(invalid());
        }

        let claims_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: TokenClaims = serde_json::from_slice(&claims_bytes).map_err(|_| invalid())?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AppError::Unauthorized("Not authorized, token expired".to_string()));
        }

        Ok(CallerIdentity { user_id: claims.sub })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

        state.auth.verify(token)
    }
}

/// The one ownership predicate used by every owner-scoped operation
pub fn is_owner(campaign: &Campaign, caller: &CallerIdentity) -> bool {
    campaign.owner_id == caller.user_id
}

pub fn ensure_owner(campaign: &Campaign, caller: &CallerIdentity) -> AppResult<()> {
    if is_owner(campaign, caller) {
        Ok(())
    } else {
        warn!(
            "User {} attempted an owner-only action on campaign {}",
            caller.user_id, campaign.id
        );
        Err(AppError::Forbidden(
            "You are not authorized to perform this action on this campaign.".to_string(),
        ))
    }
}

/// Mint a token the way the auth service does. Test-only.
#[cfg(test)]
pub fn sign_token(key: &ed25519_dalek::SigningKey, claims: &TokenClaims) -> String {
    use ed25519_dalek::Signer;

    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    let signature = key.sign(payload.as_bytes());
    format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(signature.to_bytes()))
}
