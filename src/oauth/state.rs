use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pending authorization state TTL (10 minutes)
pub const STATE_TTL: Duration = Duration::from_secs(600);

/// Exchanged credentials are held this long for their one-shot pickup
pub const CREDENTIALS_TTL: Duration = Duration::from_secs(600);

/// Anti-forgery state correlating an authorization redirect with the
/// user/organization pair that initiated it. Cached under
/// `pending_auth:{org_id}:{user_id}` until the callback consumes it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PendingAuthState {
    pub state: String,
    pub user_id: String,
    pub org_id: String,
}

impl PendingAuthState {
    /// Create a pending state with a fresh random component
    pub fn new(user_id: &str, org_id: &str) -> Self {
        Self {
            state: random_token(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        }
    }

    /// Serialize to JSON and base64url-encode for transport as the
    /// `state` query parameter.
    pub fn encode(&self) -> String {
        // PendingAuthState serialization cannot fail
        let json = serde_json::to_string(self).expect("state serialization");
        URL_SAFE_NO_PAD.encode(json.as_bytes())
    }

    /// Decode the `state` parameter returned by the provider
    pub fn decode(encoded: &str) -> Result<Self, AppError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.as_bytes())
            .map_err(|_| AppError::InvalidState)?;
        serde_json::from_slice(&bytes).map_err(|_| AppError::InvalidState)
    }
}

/// 32 bytes of OS entropy, base64url-encoded
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
