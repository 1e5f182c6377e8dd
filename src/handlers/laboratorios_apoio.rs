// src/handlers/laboratorios_apoio.rs

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
    common::{error::AppError, pagination::Paginated, response::ApiResponse},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::laboratorio_apoio::{
        AtualizarLaboratorioPayload, CriarLaboratorioPayload, LaboratorioApoio, ListarLaboratoriosQuery,
    },
};

// POST /api/laboratorios-apoio
#[utoipa::path(
    post,
    path = "/api/laboratorios-apoio",
    tag = "Laboratórios de Apoio",
    request_body = CriarLaboratorioPayload,
    responses(
        (status = 201, description = "Laboratório criado", body = ApiResponse<LaboratorioApoio>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarLaboratorioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let laboratorio = app_state.laboratorio_apoio_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Laboratório de apoio criado com sucesso", laboratorio))))
}

// GET /api/laboratorios-apoio
#[utoipa::path(
    get,
    path = "/api/laboratorios-apoio",
    tag = "Laboratórios de Apoio",
    responses(
        (status = 200, description = "Lista paginada", body = Paginated<LaboratorioApoio>)
    ),
    params(
        ListarLaboratoriosQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_laboratorios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListarLaboratoriosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagina = app_state.laboratorio_apoio_service.find_all(tenant.0, query).await?;
    Ok(Json(pagina))
}

// GET /api/laboratorios-apoio/ativos
#[utoipa::path(
    get,
    path = "/api/laboratorios-apoio/ativos",
    tag = "Laboratórios de Apoio",
    responses(
        (status = 200, description = "Laboratórios ativos", body = ApiResponse<Vec<LaboratorioApoio>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_laboratorios_ativos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let laboratorios = app_state.laboratorio_apoio_service.find_ativos(tenant.0).await?;
    Ok(Json(ApiResponse::new("Laboratórios ativos", laboratorios)))
}

// GET /api/laboratorios-apoio/codigo/{codigo}
#[utoipa::path(
    get,
    path = "/api/laboratorios-apoio/codigo/{codigo}",
    tag = "Laboratórios de Apoio",
    responses(
        (status = 200, description = "Laboratório encontrado", body = ApiResponse<LaboratorioApoio>),
        (status = 404, description = "Código não cadastrado")
    ),
    params(
        ("codigo" = String, Path, description = "Código do laboratório"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_laboratorio_by_codigo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let laboratorio = app_state.laboratorio_apoio_service.find_by_codigo(tenant.0, &codigo).await?;
    Ok(Json(ApiResponse::new("Laboratório encontrado", laboratorio)))
}

// GET /api/laboratorios-apoio/{id}
#[utoipa::path(
    get,
    path = "/api/laboratorios-apoio/{id}",
    tag = "Laboratórios de Apoio",
    responses(
        (status = 200, description = "Laboratório encontrado", body = ApiResponse<LaboratorioApoio>),
        (status = 404, description = "Laboratório não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do laboratório"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let laboratorio = app_state.laboratorio_apoio_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Laboratório encontrado", laboratorio)))
}

// PATCH /api/laboratorios-apoio/{id}
#[utoipa::path(
    patch,
    path = "/api/laboratorios-apoio/{id}",
    tag = "Laboratórios de Apoio",
    request_body = AtualizarLaboratorioPayload,
    responses(
        (status = 200, description = "Laboratório atualizado", body = ApiResponse<LaboratorioApoio>),
        (status = 404, description = "Laboratório não encontrado"),
        (status = 409, description = "Código já cadastrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do laboratório"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarLaboratorioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let laboratorio = app_state.laboratorio_apoio_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Laboratório de apoio atualizado com sucesso", laboratorio)))
}

// DELETE /api/laboratorios-apoio/{id}
#[utoipa::path(
    delete,
    path = "/api/laboratorios-apoio/{id}",
    tag = "Laboratórios de Apoio",
    responses(
        (status = 200, description = "Laboratório removido"),
        (status = 404, description = "Laboratório não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do laboratório"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.laboratorio_apoio_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Laboratório de apoio removido com sucesso")))
}

// PATCH /api/laboratorios-apoio/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/laboratorios-apoio/{id}/toggle-status",
    tag = "Laboratórios de Apoio",
    responses(
        (status = 200, description = "Status alternado entre ativo e inativo", body = ApiResponse<LaboratorioApoio>),
        (status = 404, description = "Laboratório não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do laboratório"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let laboratorio = app_state.laboratorio_apoio_service.toggle_status(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Status do laboratório alterado", laboratorio)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/laboratorios-apoio", post(create_laboratorio).get(list_laboratorios))
        .route("/laboratorios-apoio/ativos", get(list_laboratorios_ativos))
        .route("/laboratorios-apoio/codigo/{codigo}", get(get_laboratorio_by_codigo))
        .route(
            "/laboratorios-apoio/{id}",
            get(get_laboratorio).patch(update_laboratorio).delete(delete_laboratorio),
        )
        .route("/laboratorios-apoio/{id}/toggle-status", patch(toggle_laboratorio))
}
