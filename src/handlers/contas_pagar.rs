// src/handlers/contas_pagar.rs

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
    models::conta_pagar::{
        AdicionarAnexoPayload, AnexoContaPagar, AtualizarContaPagarPayload, AtualizarStatusContaPayload, ContaPagar,
        ContaPagarDetalhe, CredorTipo, CriarContaPagarPayload, Parcela, RegistrarPagamentoPayload,
        StatusContaPagar,
    },
};

// =============================================================================
//  ÁREA 1: TÍTULOS
// =============================================================================

// POST /api/contas-pagar
#[utoipa::path(
    post,
    path = "/api/contas-pagar",
    tag = "Contas a Pagar",
    request_body = CriarContaPagarPayload,
    responses(
        (status = 201, description = "Conta criada com impostos, composição e parcelas", body = ApiResponse<ContaPagarDetalhe>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código interno já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_conta(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CriarContaPagarPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let conta = app_state.conta_pagar_service.create(tenant.0, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Conta a pagar criada com sucesso", conta))))
}

// GET /api/contas-pagar
#[utoipa::path(
    get,
    path = "/api/contas-pagar",
    tag = "Contas a Pagar",
    responses(
        (status = 200, description = "Contas do tenant", body = ApiResponse<Vec<ContaPagar>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contas(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let contas = app_state.conta_pagar_service.find_all(tenant.0).await?;
    Ok(Json(ApiResponse::new("Contas a pagar", contas)))
}

// GET /api/contas-pagar/status/{status}
#[utoipa::path(
    get,
    path = "/api/contas-pagar/status/{status}",
    tag = "Contas a Pagar",
    responses(
        (status = 200, description = "Contas no status", body = ApiResponse<Vec<ContaPagar>>)
    ),
    params(
        ("status" = StatusContaPagar, Path, description = "Status da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(status): Path<StatusContaPagar>,
) -> Result<impl IntoResponse, AppError> {
    let contas = app_state.conta_pagar_service.find_by_status(tenant.0, status).await?;
    Ok(Json(ApiResponse::new("Contas encontradas", contas)))
}

// GET /api/contas-pagar/credor/{tipo}/{id}
#[utoipa::path(
    get,
    path = "/api/contas-pagar/credor/{tipo}/{id}",
    tag = "Contas a Pagar",
    responses(
        (status = 200, description = "Contas do credor", body = ApiResponse<Vec<ContaPagar>>)
    ),
    params(
        ("tipo" = CredorTipo, Path, description = "Tipo do credor"),
        ("id" = Uuid, Path, description = "ID do credor"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_by_credor(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path((tipo, credor_id)): Path<(CredorTipo, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let contas = app_state.conta_pagar_service.find_by_credor(tenant.0, tipo, credor_id).await?;
    Ok(Json(ApiResponse::new("Contas do credor", contas)))
}

// GET /api/contas-pagar/{id}
#[utoipa::path(
    get,
    path = "/api/contas-pagar/{id}",
    tag = "Contas a Pagar",
    responses(
        (status = 200, description = "Conta com filhos", body = ApiResponse<ContaPagarDetalhe>),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_conta(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let conta = app_state.conta_pagar_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Conta encontrada", conta)))
}

// PATCH /api/contas-pagar/{id}
#[utoipa::path(
    patch,
    path = "/api/contas-pagar/{id}",
    tag = "Contas a Pagar",
    request_body = AtualizarContaPagarPayload,
    responses(
        (status = 200, description = "Conta atualizada", body = ApiResponse<ContaPagar>),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_conta(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarContaPagarPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let conta = app_state.conta_pagar_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Conta a pagar atualizada com sucesso", conta)))
}

// PATCH /api/contas-pagar/{id}/status
#[utoipa::path(
    patch,
    path = "/api/contas-pagar/{id}/status",
    tag = "Contas a Pagar",
    request_body = AtualizarStatusContaPayload,
    responses(
        (status = 200, description = "Status alterado", body = ApiResponse<ContaPagar>),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status_conta(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarStatusContaPayload>,
) -> Result<impl IntoResponse, AppError> {
    let conta = app_state.conta_pagar_service.update_status(tenant.0, id, payload.status).await?;
    Ok(Json(ApiResponse::new("Status da conta atualizado", conta)))
}

// DELETE /api/contas-pagar/{id}
#[utoipa::path(
    delete,
    path = "/api/contas-pagar/{id}",
    tag = "Contas a Pagar",
    responses(
        (status = 200, description = "Conta e filhos removidos"),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_conta(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.conta_pagar_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Conta a pagar removida com sucesso")))
}

// =============================================================================
//  ÁREA 2: PAGAMENTOS E ANEXOS
// =============================================================================

// POST /api/contas-pagar/parcelas/{id}/pagamento
#[utoipa::path(
    post,
    path = "/api/contas-pagar/parcelas/{id}/pagamento",
    tag = "Contas a Pagar",
    request_body = RegistrarPagamentoPayload,
    responses(
        (status = 201, description = "Parcela marcada como paga", body = ApiResponse<Parcela>),
        (status = 404, description = "Parcela não encontrada"),
        (status = 409, description = "Parcela já paga")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da parcela"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn registrar_pagamento(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(parcela_id): Path<Uuid>,
    Json(payload): Json<RegistrarPagamentoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let parcela = app_state
        .conta_pagar_service
        .registrar_pagamento(tenant.0, parcela_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new("Pagamento registrado com sucesso", parcela))))
}

// POST /api/contas-pagar/{id}/anexos
#[utoipa::path(
    post,
    path = "/api/contas-pagar/{id}/anexos",
    tag = "Contas a Pagar",
    request_body = AdicionarAnexoPayload,
    responses(
        (status = 201, description = "Anexo registrado", body = ApiResponse<AnexoContaPagar>),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_anexo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(conta_id): Path<Uuid>,
    Json(payload): Json<AdicionarAnexoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let anexo = app_state.conta_pagar_service.add_anexo(tenant.0, conta_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new("Anexo adicionado com sucesso", anexo))))
}

// GET /api/contas-pagar/{id}/anexos
#[utoipa::path(
    get,
    path = "/api/contas-pagar/{id}/anexos",
    tag = "Contas a Pagar",
    responses(
        (status = 200, description = "Anexos da conta", body = ApiResponse<Vec<AnexoContaPagar>>),
        (status = 404, description = "Conta não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da conta"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_anexos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(conta_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let anexos = app_state.conta_pagar_service.list_anexos(tenant.0, conta_id).await?;
    Ok(Json(ApiResponse::new("Anexos da conta", anexos)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contas-pagar", post(create_conta).get(list_contas))
        .route("/contas-pagar/status/{status}", get(list_by_status))
        .route("/contas-pagar/credor/{tipo}/{id}", get(list_by_credor))
        .route("/contas-pagar/parcelas/{id}/pagamento", post(registrar_pagamento))
        .route("/contas-pagar/{id}", get(get_conta).patch(update_conta).delete(delete_conta))
        .route("/contas-pagar/{id}/status", patch(update_status_conta))
        .route("/contas-pagar/{id}/anexos", post(add_anexo).get(list_anexos))
}
