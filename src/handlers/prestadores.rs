// src/handlers/prestadores.rs

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
    models::prestador::{
        AtualizarPrestadorPayload, AtualizarStatusContratoPayload, AvaliarPayload, BuscaQuery,
        ContratosVencendoQuery, CriarPrestadorPayload, EstatisticasPrestadores, PrestadorComEmpresa,
        StatusContrato,
    },
};

const DIAS_VENCIMENTO_PADRAO: i64 = 30;

// =============================================================================
//  ÁREA 1: CADASTRO
// =============================================================================

// POST /api/prestadores-servico
#[utoipa::path(
    post,
    path = "/api/prestadores-servico",
    tag = "Prestadores de Serviço",
    request_body = CriarPrestadorPayload,
    responses(
        (status = 201, description = "Prestador e empresa criados", body = ApiResponse<PrestadorComEmpresa>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CNPJ ou código já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarPrestadorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let prestador = app_state.prestador_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Prestador de serviço criado com sucesso", prestador))))
}

// GET /api/prestadores-servico
#[utoipa::path(
    get,
    path = "/api/prestadores-servico",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestadores ordenados pelo nome fantasia", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_prestadores(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.find_all(tenant.0).await?;
    Ok(Json(ApiResponse::new("Prestadores de serviço", prestadores)))
}

// GET /api/prestadores-servico/ativos
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/ativos",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestadores com empresa ativa", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_prestadores_ativos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.find_active(tenant.0).await?;
    Ok(Json(ApiResponse::new("Prestadores ativos", prestadores)))
}

// GET /api/prestadores-servico/buscar?termo=
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/buscar",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Busca por código, CNPJ, razão social ou nome fantasia", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        BuscaQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_prestadores(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(busca): Query<BuscaQuery>,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.search(tenant.0, &busca.termo).await?;
    Ok(Json(ApiResponse::new("Prestadores encontrados", prestadores)))
}

// GET /api/prestadores-servico/codigo/{codigo}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/codigo/{codigo}",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestador encontrado", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "Código não cadastrado")
    ),
    params(
        ("codigo" = String, Path, description = "Código do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_prestador_by_codigo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state.prestador_service.find_by_codigo(tenant.0, &codigo).await?;
    Ok(Json(ApiResponse::new("Prestador encontrado", prestador)))
}

// GET /api/prestadores-servico/cnpj/{cnpj}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/cnpj/{cnpj}",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestador encontrado", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "CNPJ não cadastrado")
    ),
    params(
        ("cnpj" = String, Path, description = "CNPJ da empresa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_prestador_by_cnpj(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(cnpj): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state.prestador_service.find_by_cnpj(tenant.0, &cnpj).await?;
    Ok(Json(ApiResponse::new("Prestador encontrado", prestador)))
}

// GET /api/prestadores-servico/{id}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/{id}",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestador encontrado", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state.prestador_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Prestador encontrado", prestador)))
}

// PATCH /api/prestadores-servico/{id}
#[utoipa::path(
    patch,
    path = "/api/prestadores-servico/{id}",
    tag = "Prestadores de Serviço",
    request_body = AtualizarPrestadorPayload,
    responses(
        (status = 200, description = "Prestador atualizado", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "Prestador não encontrado"),
        (status = 409, description = "CNPJ ou código já cadastrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarPrestadorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let prestador = app_state.prestador_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Prestador de serviço atualizado com sucesso", prestador)))
}

// DELETE /api/prestadores-servico/{id}
#[utoipa::path(
    delete,
    path = "/api/prestadores-servico/{id}",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestador e empresa removidos"),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.prestador_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Prestador de serviço removido com sucesso")))
}

// =============================================================================
//  ÁREA 2: CONTRATO E AVALIAÇÃO
// =============================================================================

// PATCH /api/prestadores-servico/{id}/status
#[utoipa::path(
    patch,
    path = "/api/prestadores-servico/{id}/status",
    tag = "Prestadores de Serviço",
    request_body = AtualizarStatusContratoPayload,
    responses(
        (status = 200, description = "Status do contrato alterado", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status_contrato(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarStatusContratoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state
        .prestador_service
        .update_status(tenant.0, id, payload.status_contrato)
        .await?;
    Ok(Json(ApiResponse::new("Status do contrato atualizado", prestador)))
}

// PATCH /api/prestadores-servico/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/prestadores-servico/{id}/toggle-status",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Empresa ativada ou desativada", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state.prestador_service.toggle_status(tenant.0, id).await?;
    let message = if prestador.empresa.ativo { "Prestador ativado" } else { "Prestador desativado" };
    Ok(Json(ApiResponse::new(message, prestador)))
}

// POST /api/prestadores-servico/{id}/avaliar
#[utoipa::path(
    post,
    path = "/api/prestadores-servico/{id}/avaliar",
    tag = "Prestadores de Serviço",
    request_body = AvaliarPayload,
    responses(
        (status = 200, description = "Avaliação registrada na média", body = ApiResponse<PrestadorComEmpresa>),
        (status = 400, description = "Nota fora de 1..5"),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn avaliar_prestador(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvaliarPayload>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state.prestador_service.avaliar(tenant.0, id, payload.nota).await?;
    Ok(Json(ApiResponse::new("Avaliação registrada com sucesso", prestador)))
}

// POST /api/prestadores-servico/{id}/incrementar-servicos
#[utoipa::path(
    post,
    path = "/api/prestadores-servico/{id}/incrementar-servicos",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Contador de serviços incrementado", body = ApiResponse<PrestadorComEmpresa>),
        (status = 404, description = "Prestador não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do prestador"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn incrementar_servicos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let prestador = app_state.prestador_service.incrementar_servicos(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Serviço contabilizado", prestador)))
}

// =============================================================================
//  ÁREA 3: FILTROS E RELATÓRIOS
// =============================================================================

// GET /api/prestadores-servico/status/{status}
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/status/{status}",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestadores no status de contrato", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ("status" = StatusContrato, Path, description = "Status do contrato"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(status): Path<StatusContrato>,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.find_by_status(tenant.0, status).await?;
    Ok(Json(ApiResponse::new("Prestadores encontrados", prestadores)))
}

// GET /api/prestadores-servico/urgencia
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/urgencia",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestadores ativos que atendem urgência", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_com_urgencia(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.find_com_urgencia(tenant.0).await?;
    Ok(Json(ApiResponse::new("Prestadores com atendimento de urgência", prestadores)))
}

// GET /api/prestadores-servico/24x7
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/24x7",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Prestadores ativos com atendimento 24x7", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_com_24x7(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.find_com_24x7(tenant.0).await?;
    Ok(Json(ApiResponse::new("Prestadores com atendimento 24x7", prestadores)))
}

// GET /api/prestadores-servico/estatisticas
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/estatisticas",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Resumo e ranking por avaliação", body = ApiResponse<EstatisticasPrestadores>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_estatisticas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let estatisticas = app_state.prestador_service.get_estatisticas(tenant.0).await?;
    Ok(Json(ApiResponse::new("Estatísticas dos prestadores", estatisticas)))
}

// GET /api/prestadores-servico/contratos-vencendo?dias=30
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/contratos-vencendo",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Contratos que vencem dentro da janela", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ContratosVencendoQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contratos_vencendo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ContratosVencendoQuery>,
) -> Result<impl IntoResponse, AppError> {
    let dias = query.dias.unwrap_or(DIAS_VENCIMENTO_PADRAO);
    let prestadores = app_state.prestador_service.get_contratos_vencendo(tenant.0, dias).await?;
    Ok(Json(ApiResponse::new(format!("Contratos vencendo em {} dias", dias), prestadores)))
}

// GET /api/prestadores-servico/renovacoes-automaticas
#[utoipa::path(
    get,
    path = "/api/prestadores-servico/renovacoes-automaticas",
    tag = "Prestadores de Serviço",
    responses(
        (status = 200, description = "Contratos no prazo de aviso de renovação", body = ApiResponse<Vec<PrestadorComEmpresa>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_renovacoes_automaticas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let prestadores = app_state.prestador_service.get_renovacoes_automaticas(tenant.0).await?;
    Ok(Json(ApiResponse::new("Renovações automáticas pendentes", prestadores)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prestadores-servico", post(create_prestador).get(list_prestadores))
        .route("/prestadores-servico/ativos", get(list_prestadores_ativos))
        .route("/prestadores-servico/buscar", get(search_prestadores))
        .route("/prestadores-servico/estatisticas", get(get_estatisticas))
        .route("/prestadores-servico/contratos-vencendo", get(list_contratos_vencendo))
        .route("/prestadores-servico/renovacoes-automaticas", get(list_renovacoes_automaticas))
        .route("/prestadores-servico/urgencia", get(list_com_urgencia))
        .route("/prestadores-servico/24x7", get(list_com_24x7))
        .route("/prestadores-servico/status/{status}", get(list_by_status))
        .route("/prestadores-servico/codigo/{codigo}", get(get_prestador_by_codigo))
        .route("/prestadores-servico/cnpj/{cnpj}", get(get_prestador_by_cnpj))
        .route(
            "/prestadores-servico/{id}",
            get(get_prestador).patch(update_prestador).delete(delete_prestador),
        )
        .route("/prestadores-servico/{id}/status", patch(update_status_contrato))
        .route("/prestadores-servico/{id}/toggle-status", patch(toggle_prestador))
        .route("/prestadores-servico/{id}/avaliar", post(avaliar_prestador))
        .route("/prestadores-servico/{id}/incrementar-servicos", post(incrementar_servicos))
}
