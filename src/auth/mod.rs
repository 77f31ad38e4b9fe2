use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

/// Platform role carried in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    InvalidSecret,
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Forbidden: super admin access required")]
    SuperAdminRequired,
    #[error("Forbidden: tour {0} is outside this account's scope")]
    TourOutOfScope(Uuid),
    #[error("Account has no tour assigned")]
    NoTourAssigned,
    #[error("A tour must be selected")]
    TourRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub tour_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, role: Role, tour_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            role,
            // Super admins are never pinned to a tour
            tour_id: if role == Role::SuperAdmin { None } else { tour_id },
            exp,
            iat: now.timestamp(),
        }
    }
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    generate_jwt_with(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str) -> Result<Claims, AuthError> {
    decode_jwt_with(token, &config::config().security.jwt_secret)
}

pub fn decode_jwt_with(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// Request-scoped identity handed to every controller and service.
///
/// List controllers trust this scoping once resolved; row ownership is
/// enforced again by the database's row-level policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub tour_id: Option<Uuid>,
}

impl From<Claims> for SessionContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            tour_id: claims.tour_id,
        }
    }
}

impl SessionContext {
    pub fn super_admin(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: Role::SuperAdmin,
            tour_id: None,
        }
    }

    pub fn admin(user_id: Uuid, email: impl Into<String>, tour_id: Uuid) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: Role::Admin,
            tour_id: Some(tour_id),
        }
    }

    /// Decode a bearer token into a session
    pub fn from_token(token: &str) -> Result<Self, AuthError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        decode_jwt(token).map(Self::from)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn require_super_admin(&self) -> Result<(), AuthError> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(AuthError::SuperAdminRequired)
        }
    }

    /// Pick the tour a controller operates on.
    ///
    /// Admins are pinned to their assigned tour; super admins must name one.
    pub fn resolve_tour(&self, requested: Option<Uuid>) -> Result<Uuid, AuthError> {
        match self.role {
            Role::SuperAdmin => requested.ok_or(AuthError::TourRequired),
            Role::Admin => {
                let assigned = self.tour_id.ok_or(AuthError::NoTourAssigned)?;
                match requested {
                    Some(tour) if tour != assigned => Err(AuthError::TourOutOfScope(tour)),
                    _ => Ok(assigned),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_pinned_to_assigned_tour() {
        let tour = Uuid::new_v4();
        let session = SessionContext::admin(Uuid::new_v4(), "a@example.com", tour);

        assert_eq!(session.resolve_tour(None).unwrap(), tour);
        assert_eq!(session.resolve_tour(Some(tour)).unwrap(), tour);
        assert!(matches!(
            session.resolve_tour(Some(Uuid::new_v4())),
            Err(AuthError::TourOutOfScope(_))
        ));
        assert!(session.require_super_admin().is_err());
    }

    #[test]
    fn super_admin_must_choose_tour() {
        let session = SessionContext::super_admin(Uuid::new_v4(), "root@example.com");
        let tour = Uuid::new_v4();

        assert!(matches!(session.resolve_tour(None), Err(AuthError::TourRequired)));
        assert_eq!(session.resolve_tour(Some(tour)).unwrap(), tour);
    }

    #[test]
    fn token_round_trip_preserves_scope() {
        let tour = Uuid::new_v4();
        let claims = Claims::new(Uuid::new_v4(), "a@example.com".into(), Role::Admin, Some(tour));
        let token = generate_jwt_with(&claims, "test-secret").unwrap();

        let session = SessionContext::from(decode_jwt_with(&token, "test-secret").unwrap());
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.tour_id, Some(tour));

        assert!(decode_jwt_with(&token, "other-secret").is_err());
    }

    #[test]
    fn super_admin_claims_drop_tour() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "root@example.com".into(),
            Role::SuperAdmin,
            Some(Uuid::new_v4()),
        );
        assert!(claims.tour_id.is_none());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com".into(), Role::Admin, None);
        assert!(matches!(generate_jwt_with(&claims, ""), Err(AuthError::InvalidSecret)));
    }
}
