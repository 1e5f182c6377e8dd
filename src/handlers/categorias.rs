// src/handlers/categorias.rs

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
    middleware::tenancy::TenantContext,
    models::prestador::{
        AtualizarCategoriaPayload, CriarCategoriaPayload, EstatisticaTipo, EstatisticasCategoriasPrestador,
        ImportarCategoriasPayload, PrestadorDaCategoria, PrestadorServicoCategoria, TipoServicoCategoria,
    },
};

// =============================================================================
//  ÁREA 1: CATEGORIAS
// =============================================================================

// POST /api/prestadores-servico-categorias
#[utoipa::path(
    post,
    path = "/api/prestadores-servico-categorias",
    tag = "Categorias de Prestadores",
    request_body = CriarCategoriaPayload,
    responses(
        (status = 201, description = "Categoria criada", body = ApiResponse<PrestadorServicoCategoria>),
        (status = 404, description = "Prestador não encontrado"),
        (status = 409, description = "Tipo de serviço já cadastrado para o prestador")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_categoria(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarCategoriaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let categoria = app_state.categoria_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Categoria criada com sucesso", categoria))))
}

// GET /api/prestadores-servico-categorias
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Todas as categorias", body = ApiResponse<Vec<PrestadorServicoCategoria>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categorias(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let categorias = app_state.categoria_service.find_all(tenant.0).await?;
    Ok(Json(ApiResponse::new("Categorias", categorias)))
}

// GET /api/prestadores-servico-categorias/ativas
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/ativas",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categorias ativas", body = ApiResponse<Vec<PrestadorServicoCategoria>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categorias_ativas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let categorias = app_state.categoria_service.find_active(tenant.0).await?;
    Ok(Json(ApiResponse::new("Categorias ativas", categorias)))
}

// GET /api/prestadores-servico-categorias/{id}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/{id}",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categoria encontrada", body = ApiResponse<PrestadorServicoCategoria>),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_categoria(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let categoria = app_state.categoria_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Categoria encontrada", categoria)))
}

// PATCH /api/prestadores-servico-categorias/{id}
#[utoipa::path(
    patch,
    path = "/api/prestadores-servico-categorias/{id}",
    tag = "Categorias de Prestadores",
    request_body = AtualizarCategoriaPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = ApiResponse<PrestadorServicoCategoria>),
        (status = 404, description = "Categoria não encontrada"),
        (status = 409, description = "Tipo de serviço já cadastrado para o prestador")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_categoria(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarCategoriaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let categoria = app_state.categoria_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Categoria atualizada com sucesso", categoria)))
}

// DELETE /api/prestadores-servico-categorias/{id}
#[utoipa::path(
    delete,
    path = "/api/prestadores-servico-categorias/{id}",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categoria removida"),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_categoria(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.categoria_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Categoria removida com sucesso")))
}

// PATCH /api/prestadores-servico-categorias/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/prestadores-servico-categorias/{id}/toggle-status",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categoria ativada ou desativada", body = ApiResponse<PrestadorServicoCategoria>),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_categoria(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let categoria = app_state.categoria_service.toggle_status(tenant.0, id).await?;
    let message = if categoria.ativo { "Categoria ativada" } else { "Categoria desativada" };
    Ok(Json(ApiResponse::new(message, categoria)))
}

// =============================================================================
//  ÁREA 2: POR TIPO DE SERVIÇO
// =============================================================================

// GET /api/prestadores-servico-categorias/tipo/{tipo}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/tipo/{tipo}",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categorias ativas do tipo", body = ApiResponse<Vec<PrestadorServicoCategoria>>)
    ),
    params(
        ("tipo" = TipoServicoCategoria, Path, description = "Tipo de serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_tipo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(tipo): Path<TipoServicoCategoria>,
) -> Result<impl IntoResponse, AppError> {
    let categorias = app_state.categoria_service.find_by_tipo(tenant.0, tipo).await?;
    Ok(Json(ApiResponse::new("Categorias do tipo", categorias)))
}

// GET /api/prestadores-servico-categorias/tipo/{tipo}/prestadores
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/tipo/{tipo}/prestadores",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Prestadores que oferecem o serviço", body = ApiResponse<Vec<PrestadorDaCategoria>>)
    ),
    params(
        ("tipo" = TipoServicoCategoria, Path, description = "Tipo de serviço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_prestadores_do_tipo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(tipo): Path<TipoServicoCategoria>,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.categoria_service.get_prestadores_por_categoria(tenant.0, tipo).await?;
    Ok(Json(ApiResponse::new("Prestadores da categoria", prestadores)))
}

// GET /api/prestadores-servico-categorias/estatisticas
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/estatisticas",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Contagem por tipo de serviço", body = ApiResponse<Vec<EstatisticaTipo>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_estatisticas_por_tipo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let estatisticas = app_state.categoria_service.get_estatisticas_por_tipo(tenant.0).await?;
    Ok(Json(ApiResponse::new("Estatísticas por tipo de serviço", estatisticas)))
}

// =============================================================================
//  ÁREA 3: POR PRESTADOR
// =============================================================================

// GET /api/prestadores-servico-categorias/prestador/{id}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/prestador/{id}",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categorias do prestador", body = ApiResponse<Vec<PrestadorServicoCategoria>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(prestador_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let categorias = app_state.categoria_service.find_by_prestador(tenant.0, prestador_id).await?;
    Ok(Json(ApiResponse::new("Categorias do prestador", categorias)))
}

// GET /api/prestadores-servico-categorias/prestador/{id}/ativas
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/prestador/{id}/ativas",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Categorias ativas do prestador", body = ApiResponse<Vec<PrestadorServicoCategoria>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_ativas_by_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(prestador_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let categorias = app_state
        .categoria_service
        .find_active_by_prestador(tenant.0, prestador_id)
        .await?;
    Ok(Json(ApiResponse::new("Categorias ativas do prestador", categorias)))
}

// GET /api/prestadores-servico-categorias/prestador/{id}/estatisticas
#[utoipa::path(
    get,
    path = "/api/prestadores-servico-categorias/prestador/{id}/estatisticas",
    tag = "Categorias de Prestadores",
    responses(
        (status = 200, description = "Resumo e valores médios por tipo", body = ApiResponse<EstatisticasCategoriasPrestador>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_estatisticas_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(prestador_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let estatisticas = app_state
        .categoria_service
        .get_estatisticas_prestador(tenant.0, prestador_id)
        .await?;
    Ok(Json(ApiResponse::new("Estatísticas do prestador", estatisticas)))
}

// POST /api/prestadores-servico-categorias/prestador/{id}/importar
#[utoipa::path(
    post,
    path = "/api/prestadores-servico-categorias/prestador/{id}/importar",
    tag = "Categorias de Prestadores",
    request_body = ImportarCategoriasPayload,
    responses(
        (status = 201, description = "Categorias criadas ou atualizadas por tipo", body = ApiResponse<Vec<PrestadorServicoCategoria>>),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn importar_categorias(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(prestador_id): Path<Uuid>,
    Json(payload): Json<ImportarCategoriasPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let categorias = app_state
        .categoria_service
        .importar_categorias(tenant.0, prestador_id, payload.categorias)
        .await?;

    let message = format!("{} categoria(s) importada(s)", categorias.len());
    Ok((StatusCode::CREATED, Json(ApiResponse::new(message, categorias))))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prestadores-servico-categorias", post(create_categoria).get(list_categorias))
        .route("/prestadores-servico-categorias/ativas", get(list_categorias_ativas))
        .route("/prestadores-servico-categorias/estatisticas", get(get_estatisticas_por_tipo))
        .route("/prestadores-servico-categorias/tipo/{tipo}", get(list_by_tipo))
        .route("/prestadores-servico-categorias/tipo/{tipo}/prestadores", get(list_prestadores_do_tipo))
        .route("/prestadores-servico-categorias/prestador/{id}", get(list_by_prestador))
        .route("/prestadores-servico-categorias/prestador/{id}/ativas", get(list_ativas_by_prestador))
        .route(
            "/prestadores-servico-categorias/prestador/{id}/estatisticas",
            get(get_estatisticas_prestador),
        )
        .route("/prestadores-servico-categorias/prestador/{id}/importar", post(importar_categorias))
        .route(
            "/prestadores-servico-categorias/{id}",
            get(get_categoria).patch(update_categoria).delete(delete_categoria),
        )
        .route("/prestadores-servico-categorias/{id}/toggle-status", patch(toggle_categoria))
}
