// src/handlers/exames_laboratorios.rs

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
        AtualizarExameLaboratorioPayload, CriarExameLaboratorioPayload, CriarLotePayload, ExameLaboratorioApoio,
        ListarExameLaboratorioQuery, ResultadoLote,
    },
};

// POST /api/exames-laboratorios-apoio
#[utoipa::path(
    post,
    path = "/api/exames-laboratorios-apoio",
    tag = "Exames x Laboratórios",
    request_body = CriarExameLaboratorioPayload,
    responses(
        (status = 201, description = "Configuração criada", body = ApiResponse<ExameLaboratorioApoio>),
        (status = 409, description = "Exame já configurado para o laboratório")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_exame_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarExameLaboratorioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let config = app_state.exame_laboratorio_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Configuração criada com sucesso", config))))
}

// POST /api/exames-laboratorios-apoio/batch
// Sucesso parcial: os itens válidos entram mesmo que outros falhem.
#[utoipa::path(
    post,
    path = "/api/exames-laboratorios-apoio/batch",
    tag = "Exames x Laboratórios",
    request_body = CriarLotePayload,
    responses(
        (status = 201, description = "Itens criados e falhas por índice", body = ApiResponse<ResultadoLote>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_exame_laboratorio_batch(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarLotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let resultado = app_state
        .exame_laboratorio_service
        .create_batch(tenant.0, payload.items)
        .await?;

    let message = format!(
        "{} configuração(ões) criada(s), {} com erro",
        resultado.created.len(),
        resultado.errors.len()
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::new(message, resultado))))
}

// GET /api/exames-laboratorios-apoio
#[utoipa::path(
    get,
    path = "/api/exames-laboratorios-apoio",
    tag = "Exames x Laboratórios",
    responses(
        (status = 200, description = "Lista paginada", body = Paginated<ExameLaboratorioApoio>)
    ),
    params(
        ListarExameLaboratorioQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_laboratorios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListarExameLaboratorioQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagina = app_state.exame_laboratorio_service.find_all(tenant.0, query).await?;
    Ok(Json(pagina))
}

// GET /api/exames-laboratorios-apoio/exame/{id}
#[utoipa::path(
    get,
    path = "/api/exames-laboratorios-apoio/exame/{id}",
    tag = "Exames x Laboratórios",
    responses(
        (status = 200, description = "Laboratórios configurados para o exame", body = ApiResponse<Vec<ExameLaboratorioApoio>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_exame(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(exame_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let configs = app_state.exame_laboratorio_service.find_by_exame(tenant.0, exame_id).await?;
    Ok(Json(ApiResponse::new("Configurações do exame", configs)))
}

// GET /api/exames-laboratorios-apoio/laboratorio/{id}
#[utoipa::path(
    get,
    path = "/api/exames-laboratorios-apoio/laboratorio/{id}",
    tag = "Exames x Laboratórios",
    responses(
        (status = 200, description = "Exames configurados no laboratório", body = ApiResponse<Vec<ExameLaboratorioApoio>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do laboratório de apoio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(laboratorio_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let configs = app_state
        .exame_laboratorio_service
        .find_by_laboratorio(tenant.0, laboratorio_id)
        .await?;
    Ok(Json(ApiResponse::new("Configurações do laboratório", configs)))
}

// GET /api/exames-laboratorios-apoio/{id}
#[utoipa::path(
    get,
    path = "/api/exames-laboratorios-apoio/{id}",
    tag = "Exames x Laboratórios",
    responses(
        (status = 200, description = "Configuração encontrada", body = ApiResponse<ExameLaboratorioApoio>),
        (status = 404, description = "Configuração não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da configuração"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_exame_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let config = app_state.exame_laboratorio_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Configuração encontrada", config)))
}

// PATCH /api/exames-laboratorios-apoio/{id}
#[utoipa::path(
    patch,
    path = "/api/exames-laboratorios-apoio/{id}",
    tag = "Exames x Laboratórios",
    request_body = AtualizarExameLaboratorioPayload,
    responses(
        (status = 200, description = "Configuração atualizada", body = ApiResponse<ExameLaboratorioApoio>),
        (status = 404, description = "Configuração não encontrada"),
        (status = 409, description = "Exame já configurado para o laboratório")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da configuração"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_exame_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarExameLaboratorioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let config = app_state.exame_laboratorio_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Configuração atualizada com sucesso", config)))
}

// DELETE /api/exames-laboratorios-apoio/{id}
#[utoipa::path(
    delete,
    path = "/api/exames-laboratorios-apoio/{id}",
    tag = "Exames x Laboratórios",
    responses(
        (status = 200, description = "Configuração removida"),
        (status = 404, description = "Configuração não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da configuração"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_exame_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.exame_laboratorio_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Configuração removida com sucesso")))
}

// PATCH /api/exames-laboratorios-apoio/{id}/toggle-ativo
#[utoipa::path(
    patch,
    path = "/api/exames-laboratorios-apoio/{id}/toggle-ativo",
    tag = "Exames x Laboratórios",
    responses(
        (status = 200, description = "Flag ativo invertida", body = ApiResponse<ExameLaboratorioApoio>),
        (status = 404, description = "Configuração não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da configuração"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_exame_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let config = app_state.exame_laboratorio_service.toggle_ativo(tenant.0, id).await?;
    let message = if config.ativo { "Configuração ativada" } else { "Configuração desativada" };
    Ok(Json(ApiResponse::new(message, config)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exames-laboratorios-apoio", post(create_exame_laboratorio).get(list_exames_laboratorios))
        .route("/exames-laboratorios-apoio/batch", post(create_exame_laboratorio_batch))
        .route("/exames-laboratorios-apoio/exame/{id}", get(list_by_exame))
        .route("/exames-laboratorios-apoio/laboratorio/{id}", get(list_by_laboratorio))
        .route(
            "/exames-laboratorios-apoio/{id}",
            get(get_exame_laboratorio)
                .patch(update_exame_laboratorio)
                .delete(delete_exame_laboratorio),
        )
        .route("/exames-laboratorios-apoio/{id}/toggle-ativo", patch(toggle_exame_laboratorio))
}
