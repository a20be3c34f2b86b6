//! Token issuance and verification (C6), grounded on
//! `original_source/internal/core/services/auth_service.go`'s
//! `GenerateToken`/`ValidateToken` pair. HS256 only — the original never
//! negotiates an algorithm, so neither do we (fixes the "alg: none"
//! confusion class of JWT bug at the type level).

use drone_domain::{Actor, DomainError, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::Claims;
use crate::config::JwtConfig;

/// # Errors
///
/// Returns [`DomainError::unable_to_process`] if signing fails (should
/// not happen for HS256 with a non-empty secret).
pub fn issue_token(actor: &Actor, config: &JwtConfig) -> Result<String, DomainError> {
    let claims = Claims::for_actor(actor, config.expires_in);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|_| DomainError::unable_to_process())
}

/// # Errors
///
/// Returns [`DomainError::auth_token_invalid`] for a malformed/forged
/// token and [`DomainError::auth_token_expired`] once `exp` has passed.
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Actor, DomainError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|err| match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => DomainError::auth_token_expired(),
        _ => DomainError::auth_token_invalid(),
    })?;

    let claims = data.claims;
    let drone_id = match claims.utype {
        Role::Drone => Some(claims.sub),
        _ => None,
    };
    Ok(Actor {
        id: claims.sub,
        role: claims.utype,
        drone_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn round_trips_an_admin_actor() {
        let config = JwtConfig {
            secret: "test-secret".to_string(),
            ..JwtConfig::default()
        };
        let actor = Actor::admin(Uuid::new_v4());
        let token = issue_token(&actor, &config).unwrap();
        let recovered = verify_token(&token, &config).unwrap();
        assert_eq!(recovered.id, actor.id);
        assert_eq!(recovered.role, Role::Admin);
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let issuer = JwtConfig { secret: "a".to_string(), ..JwtConfig::default() };
        let verifier = JwtConfig { secret: "b".to_string(), ..JwtConfig::default() };
        let token = issue_token(&Actor::enduser(Uuid::new_v4()), &issuer).unwrap();
        assert!(verify_token(&token, &verifier).is_err());
    }
}
