// src/handlers/formularios.rs

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
        formulario::{
            AlterarStatusFormularioPayload, AtualizarFormularioPayload, CriarFormularioPayload,
            EstatisticasFormularios, FiltroFormularios, Formulario, ResultadoValidacao,
        },
        prestador::BuscaQuery,
    },
};

// POST /api/formularios
#[utoipa::path(
    post,
    path = "/api/formularios",
    tag = "Formulários",
    request_body = CriarFormularioPayload,
    responses(
        (status = 201, description = "Formulário criado em rascunho", body = ApiResponse<Formulario>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarFormularioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let formulario = app_state.formulario_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Formulário criado com sucesso", formulario))))
}

// GET /api/formularios?tipo=&status=&unidadeSaudeId=&ativo=&busca=
#[utoipa::path(
    get,
    path = "/api/formularios",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulários filtrados, ordenados pelo nome", body = ApiResponse<Vec<Formulario>>)
    ),
    params(
        FiltroFormularios,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_formularios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(filtro): Query<FiltroFormularios>,
) -> Result<impl IntoResponse, AppError> {
    let formularios = app_state.formulario_service.find_all(tenant.0, &filtro).await?;
    Ok(Json(ApiResponse::new("Formulários", formularios)))
}

// GET /api/formularios/ativos
#[utoipa::path(
    get,
    path = "/api/formularios/ativos",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulários ativos", body = ApiResponse<Vec<Formulario>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_formularios_ativos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let ativos = app_state.formulario_service.find_ativos(tenant.0).await?;
    Ok(Json(ApiResponse::new("Formulários ativos", ativos)))
}

// GET /api/formularios/publicados
#[utoipa::path(
    get,
    path = "/api/formularios/publicados",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulários publicados e ativos", body = ApiResponse<Vec<Formulario>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_formularios_publicados(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let publicados = app_state.formulario_service.find_publicados(tenant.0).await?;
    Ok(Json(ApiResponse::new("Formulários publicados", publicados)))
}

// GET /api/formularios/buscar?termo=
#[utoipa::path(
    get,
    path = "/api/formularios/buscar",
    tag = "Formulários",
    responses(
        (status = 200, description = "Busca por código, nome ou descrição", body = ApiResponse<Vec<Formulario>>)
    ),
    params(
        BuscaQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_formularios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(busca): Query<BuscaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let encontrados = app_state.formulario_service.search(tenant.0, &busca.termo).await?;
    Ok(Json(ApiResponse::new("Formulários encontrados", encontrados)))
}

// GET /api/formularios/estatisticas
#[utoipa::path(
    get,
    path = "/api/formularios/estatisticas",
    tag = "Formulários",
    responses(
        (status = 200, description = "Totais por situação, tipo e status", body = ApiResponse<EstatisticasFormularios>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn estatisticas_formularios(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.formulario_service.estatisticas(tenant.0).await?;
    Ok(Json(ApiResponse::new("Estatísticas dos formulários", stats)))
}

// GET /api/formularios/codigo/{codigo}
#[utoipa::path(
    get,
    path = "/api/formularios/codigo/{codigo}",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulário encontrado", body = ApiResponse<Formulario>),
        (status = 404, description = "Código não cadastrado")
    ),
    params(
        ("codigo" = String, Path, description = "Código do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_formulario_by_codigo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let formulario = app_state.formulario_service.find_by_codigo(tenant.0, &codigo).await?;
    Ok(Json(ApiResponse::new("Formulário encontrado", formulario)))
}

// GET /api/formularios/{id}
#[utoipa::path(
    get,
    path = "/api/formularios/{id}",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulário encontrado", body = ApiResponse<Formulario>),
        (status = 404, description = "Formulário não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let formulario = app_state.formulario_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Formulário encontrado", formulario)))
}

// PATCH /api/formularios/{id}
#[utoipa::path(
    patch,
    path = "/api/formularios/{id}",
    tag = "Formulários",
    request_body = AtualizarFormularioPayload,
    responses(
        (status = 200, description = "Formulário atualizado", body = ApiResponse<Formulario>),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Formulário não encontrado"),
        (status = 409, description = "Código já cadastrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarFormularioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let formulario = app_state.formulario_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Formulário atualizado com sucesso", formulario)))
}

// DELETE /api/formularios/{id}
#[utoipa::path(
    delete,
    path = "/api/formularios/{id}",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulário removido"),
        (status = 400, description = "Formulário publicado"),
        (status = 404, description = "Formulário não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.formulario_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Formulário removido com sucesso")))
}

// PATCH /api/formularios/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/formularios/{id}/toggle-status",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulário ativado ou desativado", body = ApiResponse<Formulario>),
        (status = 404, description = "Formulário não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let formulario = app_state.formulario_service.toggle_status(tenant.0, id).await?;
    let message = if formulario.ativo { "Formulário ativado" } else { "Formulário desativado" };
    Ok(Json(ApiResponse::new(message, formulario)))
}

// PATCH /api/formularios/{id}/status
#[utoipa::path(
    patch,
    path = "/api/formularios/{id}/status",
    tag = "Formulários",
    request_body = AlterarStatusFormularioPayload,
    responses(
        (status = 200, description = "Status alterado", body = ApiResponse<Formulario>),
        (status = 404, description = "Formulário não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AlterarStatusFormularioPayload>,
) -> Result<impl IntoResponse, AppError> {
    let formulario = app_state.formulario_service.update_status(tenant.0, id, payload.status).await?;
    Ok(Json(ApiResponse::new("Status do formulário atualizado", formulario)))
}

// POST /api/formularios/{id}/publicar
#[utoipa::path(
    post,
    path = "/api/formularios/{id}/publicar",
    tag = "Formulários",
    responses(
        (status = 200, description = "Formulário publicado", body = ApiResponse<Formulario>),
        (status = 400, description = "Já publicado ou sem campos"),
        (status = 404, description = "Formulário não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn publicar_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let formulario = app_state.formulario_service.publicar(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Formulário publicado com sucesso", formulario)))
}

// POST /api/formularios/{id}/versoes
#[utoipa::path(
    post,
    path = "/api/formularios/{id}/versoes",
    tag = "Formulários",
    responses(
        (status = 201, description = "Nova versão criada em rascunho", body = ApiResponse<Formulario>),
        (status = 404, description = "Formulário não encontrado"),
        (status = 409, description = "Versão já existe")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário de origem"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn criar_versao_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let versao = app_state.formulario_service.criar_versao(tenant.0, id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Nova versão criada com sucesso", versao))))
}

// GET /api/formularios/{id}/validar
#[utoipa::path(
    get,
    path = "/api/formularios/{id}/validar",
    tag = "Formulários",
    responses(
        (status = 200, description = "Resultado da validação da definição", body = ApiResponse<ResultadoValidacao>),
        (status = 404, description = "Formulário não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do formulário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn validar_formulario(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state.formulario_service.validar(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Validação do formulário", resultado)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/formularios", post(create_formulario).get(list_formularios))
        .route("/formularios/ativos", get(list_formularios_ativos))
        .route("/formularios/publicados", get(list_formularios_publicados))
        .route("/formularios/buscar", get(search_formularios))
        .route("/formularios/estatisticas", get(estatisticas_formularios))
        .route("/formularios/codigo/{codigo}", get(get_formulario_by_codigo))
        .route(
            "/formularios/{id}",
            get(get_formulario).patch(update_formulario).delete(delete_formulario),
        )
        .route("/formularios/{id}/toggle-status", patch(toggle_formulario))
        .route("/formularios/{id}/status", patch(update_status_formulario))
        .route("/formularios/{id}/publicar", post(publicar_formulario))
        .route("/formularios/{id}/versoes", post(criar_versao_formulario))
        .route("/formularios/{id}/validar", get(validar_formulario))
}
