// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{extrair_bearer, validar_token},
    models::auth::Claims,
};

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

pub fn ler_tenant(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(TENANT_ID_HEADER)
        .ok_or_else(|| AppError::BadRequest("O cabeçalho X-Tenant-ID é obrigatório.".into()))?;

    let value_str = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Cabeçalho X-Tenant-ID contém caracteres inválidos.".into()))?;

    Uuid::parse_str(value_str)
        .map_err(|_| AppError::BadRequest("Cabeçalho X-Tenant-ID inválido (não é um UUID).".into()))
}

/// Confere que o token lista o tenant pedido.
pub fn autorizar(claims: &Claims, tenant_id: Uuid) -> Result<(), AppError> {
    if !claims.pode_acessar(tenant_id) {
        tracing::warn!("Usuário {} sem acesso ao tenant {}", claims.sub, tenant_id);
        return Err(AppError::Forbidden("Acesso negado a este tenant.".into()));
    }
    Ok(())
}

// Autenticação + tenancy para todas as rotas de negócio.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let tenant_id = ler_tenant(request.headers())?;
    let claims = validar_token(extrair_bearer(request.headers())?, &app_state.jwt_secret)?;
    autorizar(&claims, tenant_id)?;

    request.extensions_mut().insert(TenantContext(tenant_id));
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// O tenant que o utilizador quer aceder, já validado pelo `tenant_guard`.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TenantContext>() {
            Some(ctx) => Ok(*ctx),
            None => ler_tenant(&parts.headers).map(TenantContext),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case(None)]
    #[case(Some("nao-e-uuid"))]
    fn cabecalho_ausente_ou_invalido_e_bad_request(#[case] valor: Option<&'static str>) {
        let mut headers = HeaderMap::new();
        if let Some(v) = valor {
            headers.insert(TENANT_ID_HEADER, HeaderValue::from_static(v));
        }
        assert!(matches!(ler_tenant(&headers), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn cabecalho_valido_vira_uuid() {
        let tenant = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&tenant.to_string()).unwrap());
        assert_eq!(ler_tenant(&headers).unwrap(), tenant);
    }

    #[test]
    fn tenant_fora_do_token_e_proibido() {
        let tenant = Uuid::new_v4();
        let claims = Claims { sub: Uuid::new_v4(), exp: 0, tenants: vec![tenant] };
        assert!(autorizar(&claims, tenant).is_ok());
        assert!(matches!(autorizar(&claims, Uuid::new_v4()), Err(AppError::Forbidden(_))));
    }
}
