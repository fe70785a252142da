use actix_web::{dev::Payload, error, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;

use crate::models::{ErrorResponse, UserId};
use crate::routes::matches::AppState;

/// Claims carried by access tokens issued by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("authorization header must use Bearer scheme")]
    BadScheme,

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token subject is not a user id: {0}")]
    BadSubject(String),

    #[error("authentication is not configured")]
    NotConfigured,
}

impl error::ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Validates HS256 bearer tokens. Token issuance lives elsewhere.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify `token` and return the user id it was issued to
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::BadSubject(data.claims.sub.clone()))
    }

    /// Verify the `Authorization: Bearer <token>` header of a request
    pub fn verify_header(&self, header: Option<&str>) -> Result<UserId, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::BadScheme)?;
        self.verify(token.trim())
    }
}

/// The authenticated caller, extracted from the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

impl FromRequest for AuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(AuthError::NotConfigured));
        };

        let header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let result = state.verifier.verify_header(header).map(|user_id| AuthUser { user_id });
        if let Err(e) = &result {
            tracing::debug!("Rejected request to {}: {}", req.path(), e);
        }
        ready(result)
    }
}
