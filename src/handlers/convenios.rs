// src/handlers/convenios.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, response::ApiResponse},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::{
        convenio::{AtualizarConvenioPayload, ConvenioComEmpresa, CriarConvenioPayload},
        prestador::BuscaQuery,
    },
};

// POST /api/convenios
#[utoipa::path(
    post,
    path = "/api/convenios",
    tag = "Convênios",
    request_body = CriarConvenioPayload,
    responses(
        (status = 201, description = "Convênio e empresa criados", body = ApiResponse<ConvenioComEmpresa>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_convenio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarConvenioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let convenio = app_state.convenio_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Convênio criado com sucesso", convenio))))
}

// GET /api/convenios
#[utoipa::path(
    get,
    path = "/api/convenios",
    tag = "Convênios",
    responses(
        (status = 200, description = "Convênios ordenados pelo nome", body = ApiResponse<Vec<ConvenioComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_convenios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let todos = app_state.convenio_service.find_all(tenant.0).await?;
    Ok(Json(ApiResponse::new("Convênios", todos)))
}

// GET /api/convenios/ativos
#[utoipa::path(
    get,
    path = "/api/convenios/ativos",
    tag = "Convênios",
    responses(
        (status = 200, description = "Convênios com empresa ativa", body = ApiResponse<Vec<ConvenioComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_convenios_ativos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let ativos = app_state.convenio_service.find_ativos(tenant.0).await?;
    Ok(Json(ApiResponse::new("Convênios ativos", ativos)))
}

// GET /api/convenios/buscar?termo=
#[utoipa::path(
    get,
    path = "/api/convenios/buscar",
    tag = "Convênios",
    responses(
        (status = 200, description = "Busca por nome, CNPJ, razão social ou nome fantasia", body = ApiResponse<Vec<ConvenioComEmpresa>>)
    ),
    params(
        BuscaQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_convenios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(busca): Query<BuscaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let encontrados = app_state.convenio_service.search(tenant.0, &busca.termo).await?;
    Ok(Json(ApiResponse::new("Convênios encontrados", encontrados)))
}

// GET /api/convenios/cnpj/{cnpj}
#[utoipa::path(
    get,
    path = "/api/convenios/cnpj/{cnpj}",
    tag = "Convênios",
    responses(
        (status = 200, description = "Convênio encontrado", body = ApiResponse<ConvenioComEmpresa>),
        (status = 404, description = "CNPJ não cadastrado")
    ),
    params(
        ("cnpj" = String, Path, description = "CNPJ da operadora"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_convenio_by_cnpj(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(cnpj): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let convenio = app_state.convenio_service.find_by_cnpj(tenant.0, &cnpj).await?;
    Ok(Json(ApiResponse::new("Convênio encontrado", convenio)))
}

// GET /api/convenios/{id}
#[utoipa::path(
    get,
    path = "/api/convenios/{id}",
    tag = "Convênios",
    responses(
        (status = 200, description = "Convênio encontrado", body = ApiResponse<ConvenioComEmpresa>),
        (status = 404, description = "Convênio não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do convênio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_convenio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let convenio = app_state.convenio_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Convênio encontrado", convenio)))
}

// PATCH /api/convenios/{id}
#[utoipa::path(
    patch,
    path = "/api/convenios/{id}",
    tag = "Convênios",
    request_body = AtualizarConvenioPayload,
    responses(
        (status = 200, description = "Convênio atualizado", body = ApiResponse<ConvenioComEmpresa>),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Convênio não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do convênio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_convenio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarConvenioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let convenio = app_state.convenio_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Convênio atualizado com sucesso", convenio)))
}

// DELETE /api/convenios/{id}
#[utoipa::path(
    delete,
    path = "/api/convenios/{id}",
    tag = "Convênios",
    responses(
        (status = 200, description = "Convênio removido; a empresa permanece"),
        (status = 404, description = "Convênio não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do convênio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_convenio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.convenio_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Convênio removido com sucesso")))
}

// PATCH /api/convenios/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/convenios/{id}/toggle-status",
    tag = "Convênios",
    responses(
        (status = 200, description = "Empresa ativada ou desativada", body = ApiResponse<ConvenioComEmpresa>),
        (status = 404, description = "Convênio não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do convênio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_convenio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let convenio = app_state.convenio_service.toggle_status(tenant.0, id).await?;
    let message = if convenio.empresa.ativo { "Convênio ativado" } else { "Convênio desativado" };
    Ok(Json(ApiResponse::new(message, convenio)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/convenios", post(create_convenio).get(list_convenios))
        .route("/convenios/ativos", get(list_convenios_ativos))
        .route("/convenios/buscar", get(search_convenios))
        .route("/convenios/cnpj/{cnpj}", get(get_convenio_by_cnpj))
        .route("/convenios/{id}", get(get_convenio).patch(update_convenio).delete(delete_convenio))
        .route("/convenios/{id}/toggle-status", patch(toggle_convenio))
}
