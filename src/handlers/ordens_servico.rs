// src/handlers/ordens_servico.rs

use axum::{
    extract::{Path, State},
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
    middleware::{auth::UsuarioAutenticado, tenancy::TenantContext},
    models::ordem_servico::{
        AdicionarExameOsPayload, AtualizarStatusOsPayload, OrdemServicoExameResposta, RegistrarResultadoPayload,
        ResultadoExame, RevisarResultadoPayload,
    },
};

// =============================================================================
//  ÁREA 1: EXAMES DA OS
// =============================================================================

// POST /api/ordens-servico/{ordem_id}/exames
#[utoipa::path(
    post,
    path = "/api/ordens-servico/{ordem_id}/exames",
    tag = "Ordens de Serviço",
    request_body = AdicionarExameOsPayload,
    responses(
        (status = 201, description = "Exame incluído na OS", body = ApiResponse<OrdemServicoExameResposta>),
        (status = 400, description = "Dados inválidos")
    ),
    params(
        ("ordem_id" = Uuid, Path, description = "ID da ordem de serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_exame_os(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(ordem_id): Path<Uuid>,
    Json(payload): Json<AdicionarExameOsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exame = app_state.ordem_servico_service.create(tenant.0, ordem_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Exame incluído na OS", OrdemServicoExameResposta::from(exame))),
    ))
}

// GET /api/ordens-servico/{ordem_id}/exames
#[utoipa::path(
    get,
    path = "/api/ordens-servico/{ordem_id}/exames",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Exames da OS", body = ApiResponse<Vec<OrdemServicoExameResposta>>)
    ),
    params(
        ("ordem_id" = Uuid, Path, description = "ID da ordem de serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_os(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(ordem_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exames: Vec<OrdemServicoExameResposta> = app_state
        .ordem_servico_service
        .find_by_ordem(tenant.0, ordem_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ApiResponse::new("Exames da OS", exames)))
}

// GET /api/ordens-servico/exames/{id}
#[utoipa::path(
    get,
    path = "/api/ordens-servico/exames/{id}",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Exame da OS", body = ApiResponse<OrdemServicoExameResposta>),
        (status = 404, description = "Exame da OS não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame da OS"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_exame_os(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exame = app_state.ordem_servico_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Exame da OS encontrado", OrdemServicoExameResposta::from(exame))))
}

// PATCH /api/ordens-servico/exames/{id}/status
#[utoipa::path(
    patch,
    path = "/api/ordens-servico/exames/{id}/status",
    tag = "Ordens de Serviço",
    request_body = AtualizarStatusOsPayload,
    responses(
        (status = 200, description = "Status alterado", body = ApiResponse<OrdemServicoExameResposta>),
        (status = 404, description = "Exame da OS não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame da OS"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status_exame_os(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarStatusOsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exame = app_state.ordem_servico_service.update_status(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Status atualizado com sucesso", OrdemServicoExameResposta::from(exame))))
}

// =============================================================================
//  ÁREA 2: RESULTADOS
// =============================================================================

// POST /api/ordens-servico/exames/{id}/resultados
#[utoipa::path(
    post,
    path = "/api/ordens-servico/exames/{id}/resultados",
    tag = "Ordens de Serviço",
    request_body = RegistrarResultadoPayload,
    responses(
        (status = 201, description = "Resultado registrado", body = ApiResponse<ResultadoExame>),
        (status = 404, description = "Exame da OS não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame da OS"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_resultado(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegistrarResultadoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resultado = app_state.ordem_servico_service.add_resultado(tenant.0, id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Resultado registrado com sucesso", resultado))))
}

// GET /api/ordens-servico/exames/{id}/resultados
#[utoipa::path(
    get,
    path = "/api/ordens-servico/exames/{id}/resultados",
    tag = "Ordens de Serviço",
    responses(
        (status = 200, description = "Histórico de resultados", body = ApiResponse<Vec<ResultadoExame>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame da OS"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_resultados(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resultados = app_state.ordem_servico_service.list_resultados(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Resultados do exame", resultados)))
}

// POST /api/ordens-servico/resultados/{id}/revisar
#[utoipa::path(
    post,
    path = "/api/ordens-servico/resultados/{id}/revisar",
    tag = "Ordens de Serviço",
    request_body = RevisarResultadoPayload,
    responses(
        (status = 201, description = "Nova versão do resultado", body = ApiResponse<ResultadoExame>),
        (status = 404, description = "Resultado não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do resultado revisado"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn revisar_resultado(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    usuario: UsuarioAutenticado,
    Path(id): Path<Uuid>,
    Json(payload): Json<RevisarResultadoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resultado = app_state
        .ordem_servico_service
        .revisar_resultado(tenant.0, id, payload, Some(usuario.id()))
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new("Resultado revisado com sucesso", resultado))))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ordens-servico/{ordem_id}/exames", post(add_exame_os).get(list_exames_os))
        .route("/ordens-servico/exames/{id}", get(get_exame_os))
        .route("/ordens-servico/exames/{id}/status", patch(update_status_exame_os))
        .route("/ordens-servico/exames/{id}/resultados", post(add_resultado).get(list_resultados))
        .route("/ordens-servico/resultados/{id}/revisar", post(revisar_resultado))
}
