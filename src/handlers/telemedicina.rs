// src/handlers/telemedicina.rs

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
        prestador::BuscaQuery,
        telemedicina::{AtualizarTelemedicinaPayload, CriarTelemedicinaPayload, TelemedicinaComEmpresa},
    },
};

// POST /api/telemedicina
#[utoipa::path(
    post,
    path = "/api/telemedicina",
    tag = "Telemedicina",
    request_body = CriarTelemedicinaPayload,
    responses(
        (status = 201, description = "Telemedicina e empresa criadas", body = ApiResponse<TelemedicinaComEmpresa>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CNPJ ou código já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_telemedicina(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarTelemedicinaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let telemedicina = app_state.telemedicina_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Telemedicina criada com sucesso", telemedicina))))
}

// GET /api/telemedicina
#[utoipa::path(
    get,
    path = "/api/telemedicina",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Telemedicinas ordenadas pelo nome fantasia", body = ApiResponse<Vec<TelemedicinaComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_telemedicinas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let todas = app_state.telemedicina_service.find_all(tenant.0).await?;
    Ok(Json(ApiResponse::new("Telemedicinas", todas)))
}

// GET /api/telemedicina/ativos
#[utoipa::path(
    get,
    path = "/api/telemedicina/ativos",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Telemedicinas com empresa ativa", body = ApiResponse<Vec<TelemedicinaComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_telemedicinas_ativas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let ativas = app_state.telemedicina_service.find_ativos(tenant.0).await?;
    Ok(Json(ApiResponse::new("Telemedicinas ativas", ativas)))
}

// GET /api/telemedicina/buscar?termo=
#[utoipa::path(
    get,
    path = "/api/telemedicina/buscar",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Busca por código, CNPJ, razão social ou nome fantasia", body = ApiResponse<Vec<TelemedicinaComEmpresa>>)
    ),
    params(
        BuscaQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_telemedicinas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(busca): Query<BuscaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let encontradas = app_state.telemedicina_service.search(tenant.0, &busca.termo).await?;
    Ok(Json(ApiResponse::new("Telemedicinas encontradas", encontradas)))
}

// GET /api/telemedicina/codigo/{codigo}
#[utoipa::path(
    get,
    path = "/api/telemedicina/codigo/{codigo}",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Telemedicina encontrada", body = ApiResponse<TelemedicinaComEmpresa>),
        (status = 404, description = "Código não cadastrado")
    ),
    params(
        ("codigo" = String, Path, description = "Código da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_telemedicina_by_codigo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let telemedicina = app_state.telemedicina_service.find_by_codigo(tenant.0, &codigo).await?;
    Ok(Json(ApiResponse::new("Telemedicina encontrada", telemedicina)))
}

// GET /api/telemedicina/cnpj/{cnpj}
#[utoipa::path(
    get,
    path = "/api/telemedicina/cnpj/{cnpj}",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Telemedicina encontrada", body = ApiResponse<TelemedicinaComEmpresa>),
        (status = 404, description = "CNPJ não cadastrado")
    ),
    params(
        ("cnpj" = String, Path, description = "CNPJ da empresa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_telemedicina_by_cnpj(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(cnpj): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let telemedicina = app_state.telemedicina_service.find_by_cnpj(tenant.0, &cnpj).await?;
    Ok(Json(ApiResponse::new("Telemedicina encontrada", telemedicina)))
}

// GET /api/telemedicina/{id}
#[utoipa::path(
    get,
    path = "/api/telemedicina/{id}",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Telemedicina encontrada", body = ApiResponse<TelemedicinaComEmpresa>),
        (status = 404, description = "Telemedicina não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_telemedicina(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let telemedicina = app_state.telemedicina_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Telemedicina encontrada", telemedicina)))
}

// PATCH /api/telemedicina/{id}
#[utoipa::path(
    patch,
    path = "/api/telemedicina/{id}",
    tag = "Telemedicina",
    request_body = AtualizarTelemedicinaPayload,
    responses(
        (status = 200, description = "Integração e observações atualizadas", body = ApiResponse<TelemedicinaComEmpresa>),
        (status = 404, description = "Telemedicina não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_telemedicina(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarTelemedicinaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let telemedicina = app_state.telemedicina_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Telemedicina atualizada com sucesso", telemedicina)))
}

// DELETE /api/telemedicina/{id}
#[utoipa::path(
    delete,
    path = "/api/telemedicina/{id}",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Telemedicina removida; a empresa permanece"),
        (status = 404, description = "Telemedicina não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_telemedicina(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.telemedicina_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Telemedicina removida com sucesso")))
}

// PATCH /api/telemedicina/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/telemedicina/{id}/toggle-status",
    tag = "Telemedicina",
    responses(
        (status = 200, description = "Empresa ativada ou desativada", body = ApiResponse<TelemedicinaComEmpresa>),
        (status = 404, description = "Telemedicina não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_telemedicina(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let telemedicina = app_state.telemedicina_service.toggle_status(tenant.0, id).await?;
    let message = if telemedicina.empresa.ativo { "Telemedicina ativada" } else { "Telemedicina desativada" };
    Ok(Json(ApiResponse::new(message, telemedicina)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/telemedicina", post(create_telemedicina).get(list_telemedicinas))
        .route("/telemedicina/ativos", get(list_telemedicinas_ativas))
        .route("/telemedicina/buscar", get(search_telemedicinas))
        .route("/telemedicina/codigo/{codigo}", get(get_telemedicina_by_codigo))
        .route("/telemedicina/cnpj/{cnpj}", get(get_telemedicina_by_cnpj))
        .route(
            "/telemedicina/{id}",
            get(get_telemedicina).patch(update_telemedicina).delete(delete_telemedicina),
        )
        .route("/telemedicina/{id}/toggle-status", patch(toggle_telemedicina))
}
