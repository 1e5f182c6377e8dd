// src/middleware/auth.rs

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Claims};

/// Lê o token do cabeçalho `Authorization: Bearer <token>`.
pub fn extrair_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)
}

// Tokens emitidos pelo serviço de identidade (HS256).
pub fn validar_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Token rejeitado: {}", e);
        AppError::InvalidToken
    })?;
    Ok(token_data.claims)
}

// Extrator do usuário autenticado. Depende do `tenant_guard` na rota.
#[derive(Debug, Clone)]
pub struct UsuarioAutenticado(pub Claims);

impl UsuarioAutenticado {
    pub fn id(&self) -> Uuid {
        self.0.sub
    }
}

impl<S> FromRequestParts<S> for UsuarioAutenticado
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(UsuarioAutenticado)
            .ok_or(AppError::InvalidToken)
    }
}
