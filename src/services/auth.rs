use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::ServiceError;
use crate::models::{Principal, Role};

/// Claims issued by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Broker id
    pub sub: String,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Resolves the calling broker from a bearer token
///
/// Tokens are issued elsewhere; this side only verifies them.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        match issuer {
            Some(issuer) => {
                validation.set_issuer(&[issuer]);
                validation.set_required_spec_claims(&["exp", "sub", "iss"]);
            }
            None => validation.set_required_spec_claims(&["exp", "sub"]),
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token and map its claims to a principal
    pub fn verify(&self, token: &str) -> Result<Principal, ServiceError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            ServiceError::Unauthenticated
        })?;

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| {
            tracing::debug!("Token subject is not a broker id: {:?}", data.claims.sub);
            ServiceError::Unauthenticated
        })?;

        // Unknown roles get the least privilege
        let role = match data.claims.role.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("ADMIN") => Role::Admin,
            _ => Role::Broker,
        };

        Ok(Principal { id, role })
    }

    /// Resolve an `Authorization` header value, `None` meaning no header
    pub fn principal_from_header(&self, header: Option<&str>) -> Result<Principal, ServiceError> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ServiceError::Unauthenticated)?;

        self.verify(token)
    }
}
