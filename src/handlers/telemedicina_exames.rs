// src/handlers/telemedicina_exames.rs

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
        exame::Exame,
        prestador::BuscaQuery,
        telemedicina::{
            AtualizarTelemedicinaExamePayload, CriarTelemedicinaExamePayload, EstatisticasQuery,
            EstatisticasTelemedicinaExame, ResultadoVinculacao, TelemedicinaExame,
        },
    },
};

// =============================================================================
//  ÁREA 1: MAPEAMENTOS
// =============================================================================

// POST /api/telemedicina-exames
#[utoipa::path(
    post,
    path = "/api/telemedicina-exames",
    tag = "Telemedicina x Exames",
    request_body = CriarTelemedicinaExamePayload,
    responses(
        (status = 201, description = "Mapeamento criado", body = ApiResponse<TelemedicinaExame>),
        (status = 409, description = "Par telemedicina/exame já vinculado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_mapeamento(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarTelemedicinaExamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mapeamento = app_state.telemedicina_exame_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Vínculo criado com sucesso", mapeamento))))
}

// GET /api/telemedicina-exames
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Todos os mapeamentos", body = ApiResponse<Vec<TelemedicinaExame>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mapeamentos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mapeamentos = app_state.telemedicina_exame_service.find_all(tenant.0).await?;
    Ok(Json(ApiResponse::new("Vínculos", mapeamentos)))
}

// GET /api/telemedicina-exames/ativos
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/ativos",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Mapeamentos ativos", body = ApiResponse<Vec<TelemedicinaExame>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mapeamentos_ativos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let mapeamentos = app_state.telemedicina_exame_service.find_ativos(tenant.0).await?;
    Ok(Json(ApiResponse::new("Vínculos ativos", mapeamentos)))
}

// GET /api/telemedicina-exames/estatisticas?telemedicina_id=
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/estatisticas",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Contagens de mapeamentos", body = ApiResponse<EstatisticasTelemedicinaExame>)
    ),
    params(
        EstatisticasQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_estatisticas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<EstatisticasQuery>,
) -> Result<impl IntoResponse, AppError> {
    let estatisticas = app_state
        .telemedicina_exame_service
        .get_estatisticas(tenant.0, query.telemedicina_id)
        .await?;
    Ok(Json(ApiResponse::new("Estatísticas dos vínculos", estatisticas)))
}

// GET /api/telemedicina-exames/exame/{id}
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/exame/{id}",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Telemedicinas que atendem o exame", body = ApiResponse<Vec<TelemedicinaExame>>)
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
    let mapeamentos = app_state.telemedicina_exame_service.find_by_exame(tenant.0, exame_id).await?;
    Ok(Json(ApiResponse::new("Vínculos do exame", mapeamentos)))
}

// GET /api/telemedicina-exames/{id}
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/{id}",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Mapeamento encontrado", body = ApiResponse<TelemedicinaExame>),
        (status = 404, description = "Mapeamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do mapeamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_mapeamento(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mapeamento = app_state.telemedicina_exame_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Vínculo encontrado", mapeamento)))
}

// PATCH /api/telemedicina-exames/{id}
#[utoipa::path(
    patch,
    path = "/api/telemedicina-exames/{id}",
    tag = "Telemedicina x Exames",
    request_body = AtualizarTelemedicinaExamePayload,
    responses(
        (status = 200, description = "Mapeamento atualizado", body = ApiResponse<TelemedicinaExame>),
        (status = 404, description = "Mapeamento não encontrado"),
        (status = 409, description = "Par telemedicina/exame já vinculado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do mapeamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_mapeamento(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarTelemedicinaExamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mapeamento = app_state.telemedicina_exame_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Vínculo atualizado com sucesso", mapeamento)))
}

// DELETE /api/telemedicina-exames/{id}
#[utoipa::path(
    delete,
    path = "/api/telemedicina-exames/{id}",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Mapeamento removido"),
        (status = 404, description = "Mapeamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do mapeamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_mapeamento(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.telemedicina_exame_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Vínculo removido com sucesso")))
}

// PATCH /api/telemedicina-exames/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/telemedicina-exames/{id}/toggle-status",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Mapeamento ativado ou desativado", body = ApiResponse<TelemedicinaExame>),
        (status = 404, description = "Mapeamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do mapeamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_mapeamento(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mapeamento = app_state.telemedicina_exame_service.toggle_status(tenant.0, id).await?;
    let message = if mapeamento.ativo { "Vínculo ativado" } else { "Vínculo desativado" };
    Ok(Json(ApiResponse::new(message, mapeamento)))
}

// =============================================================================
//  ÁREA 2: POR TELEMEDICINA
// =============================================================================

// GET /api/telemedicina-exames/telemedicina/{id}
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/telemedicina/{id}",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Exames mapeados na telemedicina", body = ApiResponse<Vec<TelemedicinaExame>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_telemedicina(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(telemedicina_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mapeamentos = app_state
        .telemedicina_exame_service
        .find_by_telemedicina(tenant.0, telemedicina_id)
        .await?;
    Ok(Json(ApiResponse::new("Vínculos da telemedicina", mapeamentos)))
}

// GET /api/telemedicina-exames/telemedicina/{id}/sem-vinculo
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/telemedicina/{id}/sem-vinculo",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Exames ainda não mapeados na telemedicina", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sem_vinculo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(telemedicina_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state
        .telemedicina_exame_service
        .find_sem_vinculo(tenant.0, telemedicina_id)
        .await?;
    Ok(Json(ApiResponse::new("Exames sem vínculo", exames)))
}

// POST /api/telemedicina-exames/telemedicina/{id}/vincular-automaticamente
#[utoipa::path(
    post,
    path = "/api/telemedicina-exames/telemedicina/{id}/vincular-automaticamente",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Quantos exames sem vínculo foram mapeados", body = ApiResponse<ResultadoVinculacao>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn vincular_automaticamente(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(telemedicina_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state
        .telemedicina_exame_service
        .vincular_automaticamente(tenant.0, telemedicina_id)
        .await?;

    let message = format!("{} de {} exame(s) vinculado(s)", resultado.vinculados, resultado.total);
    Ok(Json(ApiResponse::new(message, resultado)))
}

// GET /api/telemedicina-exames/telemedicina/{id}/buscar?termo=
#[utoipa::path(
    get,
    path = "/api/telemedicina-exames/telemedicina/{id}/buscar",
    tag = "Telemedicina x Exames",
    responses(
        (status = 200, description = "Busca nos mapeamentos e nos exames", body = ApiResponse<Vec<TelemedicinaExame>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID da telemedicina"),
        BuscaQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_mapeamentos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(telemedicina_id): Path<Uuid>,
    Query(busca): Query<BuscaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mapeamentos = app_state
        .telemedicina_exame_service
        .search(tenant.0, telemedicina_id, &busca.termo)
        .await?;
    Ok(Json(ApiResponse::new("Vínculos encontrados", mapeamentos)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/telemedicina-exames", post(create_mapeamento).get(list_mapeamentos))
        .route("/telemedicina-exames/ativos", get(list_mapeamentos_ativos))
        .route("/telemedicina-exames/estatisticas", get(get_estatisticas))
        .route("/telemedicina-exames/exame/{id}", get(list_by_exame))
        .route("/telemedicina-exames/telemedicina/{id}", get(list_by_telemedicina))
        .route("/telemedicina-exames/telemedicina/{id}/sem-vinculo", get(list_sem_vinculo))
        .route(
            "/telemedicina-exames/telemedicina/{id}/vincular-automaticamente",
            post(vincular_automaticamente),
        )
        .route("/telemedicina-exames/telemedicina/{id}/buscar", get(search_mapeamentos))
        .route(
            "/telemedicina-exames/{id}",
            get(get_mapeamento).patch(update_mapeamento).delete(delete_mapeamento),
        )
        .route("/telemedicina-exames/{id}/toggle-status", patch(toggle_mapeamento))
}
