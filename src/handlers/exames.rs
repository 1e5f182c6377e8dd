// src/handlers/exames.rs

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
    middleware::{auth::UsuarioAutenticado, tenancy::TenantContext},
    models::{
        exame::{
            AtualizarExamePayload, AtualizarStatusEmLotePayload, CodigosQuery, CriarExamePayload, Exame,
            ExameDetalhe, ListarExamesQuery,
        },
        exame_unidade::{AtualizarUnidadePayload, ExameUnidade, VincularUnidadePayload},
    },
};

// =============================================================================
//  ÁREA 1: CADASTRO DE EXAMES
// =============================================================================

// POST /api/exames
#[utoipa::path(
    post,
    path = "/api/exames",
    tag = "Exames",
    request_body = CriarExamePayload,
    responses(
        (status = 201, description = "Exame criado", body = ApiResponse<Exame>),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Código interno já cadastrado")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_exame(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    usuario: UsuarioAutenticado,
    Json(payload): Json<CriarExamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exame = app_state
        .exame_service
        .create(tenant.0, payload, Some(usuario.id()))
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new("Exame criado com sucesso", exame))))
}

// GET /api/exames
#[utoipa::path(
    get,
    path = "/api/exames",
    tag = "Exames",
    responses(
        (status = 200, description = "Lista paginada de exames", body = Paginated<Exame>)
    ),
    params(
        ListarExamesQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListarExamesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let pagina = app_state.exame_service.find_all(tenant.0, query).await?;
    Ok(Json(pagina))
}

// GET /api/exames/buscar/{nome}
#[utoipa::path(
    get,
    path = "/api/exames/buscar/{nome}",
    tag = "Exames",
    responses(
        (status = 200, description = "Exames cujo nome contém o termo", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        ("nome" = String, Path, description = "Parte do nome"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn search_exames(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(nome): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state.exame_service.search_by_name(tenant.0, &nome).await?;
    Ok(Json(ApiResponse::new("Exames encontrados", exames)))
}

// GET /api/exames/codigos?tuss=&amb=&sus=
#[utoipa::path(
    get,
    path = "/api/exames/codigos",
    tag = "Exames",
    responses(
        (status = 200, description = "Exames por código TUSS, AMB ou SUS", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        CodigosQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn find_exames_by_codigos(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(codigos): Query<CodigosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state.exame_service.find_by_codigos(tenant.0, codigos).await?;
    Ok(Json(ApiResponse::new("Exames encontrados", exames)))
}

// GET /api/exames/com-preparo
#[utoipa::path(
    get,
    path = "/api/exames/com-preparo",
    tag = "Exames",
    responses(
        (status = 200, description = "Exames ativos que exigem preparo", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_com_preparo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state.exame_service.get_exames_com_preparo(tenant.0).await?;
    Ok(Json(ApiResponse::new("Exames com preparo", exames)))
}

// GET /api/exames/urgentes
#[utoipa::path(
    get,
    path = "/api/exames/urgentes",
    tag = "Exames",
    responses(
        (status = 200, description = "Exames ativos que aceitam urgência", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_urgentes(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state.exame_service.get_exames_urgentes(tenant.0).await?;
    Ok(Json(ApiResponse::new("Exames que aceitam urgência", exames)))
}

// PATCH /api/exames/status
#[utoipa::path(
    patch,
    path = "/api/exames/status",
    tag = "Exames",
    request_body = AtualizarStatusEmLotePayload,
    responses(
        (status = 200, description = "Status alterado", body = ApiResponse<u64>),
        (status = 400, description = "Status inválido")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_update_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<AtualizarStatusEmLotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let alterados = app_state.exame_service.bulk_update_status(tenant.0, payload).await?;
    Ok(Json(ApiResponse::new(format!("{} exame(s) atualizado(s)", alterados), alterados)))
}

// GET /api/exames/tipo/{tipo_id}
#[utoipa::path(
    get,
    path = "/api/exames/tipo/{tipo_id}",
    tag = "Exames",
    responses(
        (status = 200, description = "Exames ativos do tipo", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        ("tipo_id" = Uuid, Path, description = "ID do tipo de exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_by_tipo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(tipo_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state.exame_service.find_by_tipo(tenant.0, tipo_id).await?;
    Ok(Json(ApiResponse::new("Exames encontrados", exames)))
}

// GET /api/exames/laboratorio/{lab_id}
#[utoipa::path(
    get,
    path = "/api/exames/laboratorio/{lab_id}",
    tag = "Exames",
    responses(
        (status = 200, description = "Exames ativos enviados ao laboratório", body = ApiResponse<Vec<Exame>>)
    ),
    params(
        ("lab_id" = Uuid, Path, description = "ID do laboratório de apoio"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_by_laboratorio(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(lab_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exames = app_state.exame_service.find_by_laboratorio_apoio(tenant.0, lab_id).await?;
    Ok(Json(ApiResponse::new("Exames encontrados", exames)))
}

// GET /api/exames/codigo/{codigo}
#[utoipa::path(
    get,
    path = "/api/exames/codigo/{codigo}",
    tag = "Exames",
    responses(
        (status = 200, description = "Exame encontrado", body = ApiResponse<Exame>),
        (status = 404, description = "Código não cadastrado")
    ),
    params(
        ("codigo" = String, Path, description = "Código interno"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_exame_by_codigo(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(codigo): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exame = app_state.exame_service.find_by_codigo(tenant.0, &codigo).await?;
    Ok(Json(ApiResponse::new("Exame encontrado", exame)))
}

// GET /api/exames/{id}
#[utoipa::path(
    get,
    path = "/api/exames/{id}",
    tag = "Exames",
    responses(
        (status = 200, description = "Exame com as unidades vinculadas", body = ApiResponse<ExameDetalhe>),
        (status = 404, description = "Exame não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_exame(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exame = app_state.exame_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Exame encontrado", exame)))
}

// PATCH /api/exames/{id}
#[utoipa::path(
    patch,
    path = "/api/exames/{id}",
    tag = "Exames",
    request_body = AtualizarExamePayload,
    responses(
        (status = 200, description = "Exame atualizado", body = ApiResponse<Exame>),
        (status = 404, description = "Exame não encontrado"),
        (status = 409, description = "Código interno já cadastrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_exame(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    usuario: UsuarioAutenticado,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarExamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let exame = app_state
        .exame_service
        .update(tenant.0, id, payload, Some(usuario.id()))
        .await?;

    Ok(Json(ApiResponse::new("Exame atualizado com sucesso", exame)))
}

// DELETE /api/exames/{id}
#[utoipa::path(
    delete,
    path = "/api/exames/{id}",
    tag = "Exames",
    responses(
        (status = 200, description = "Exame inativado"),
        (status = 404, description = "Exame não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_exame(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.exame_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Exame removido com sucesso")))
}

// =============================================================================
//  ÁREA 2: VÍNCULO EXAME x UNIDADE
// =============================================================================

// POST /api/exames/{id}/unidades
#[utoipa::path(
    post,
    path = "/api/exames/{id}/unidades",
    tag = "Exames",
    request_body = VincularUnidadePayload,
    responses(
        (status = 201, description = "Unidade vinculada", body = ApiResponse<ExameUnidade>),
        (status = 400, description = "Destino incompatível"),
        (status = 404, description = "Exame não encontrado"),
        (status = 409, description = "Exame já vinculado à unidade")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn vincular_unidade(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(exame_id): Path<Uuid>,
    Json(payload): Json<VincularUnidadePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let vinculo = app_state
        .exame_unidade_service
        .create(tenant.0, exame_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new("Unidade vinculada com sucesso", vinculo))))
}

// GET /api/exames/{id}/unidades
#[utoipa::path(
    get,
    path = "/api/exames/{id}/unidades",
    tag = "Exames",
    responses(
        (status = 200, description = "Unidades que realizam o exame", body = ApiResponse<Vec<ExameUnidade>>)
    ),
    params(
        ("id" = Uuid, Path, description = "ID do exame"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_unidades_do_exame(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(exame_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vinculos = app_state.exame_unidade_service.find_by_exame(tenant.0, exame_id).await?;
    Ok(Json(ApiResponse::new("Unidades do exame", vinculos)))
}

// GET /api/unidades/{unidade_id}/exames
#[utoipa::path(
    get,
    path = "/api/unidades/{unidade_id}/exames",
    tag = "Exames",
    responses(
        (status = 200, description = "Vínculos ativos da unidade", body = ApiResponse<Vec<ExameUnidade>>)
    ),
    params(
        ("unidade_id" = Uuid, Path, description = "ID da unidade de saúde"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exames_da_unidade(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(unidade_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vinculos = app_state.exame_unidade_service.find_by_unidade(tenant.0, unidade_id).await?;
    Ok(Json(ApiResponse::new("Exames da unidade", vinculos)))
}

// GET /api/exames/unidades/{id}
#[utoipa::path(
    get,
    path = "/api/exames/unidades/{id}",
    tag = "Exames",
    responses(
        (status = 200, description = "Vínculo encontrado", body = ApiResponse<ExameUnidade>),
        (status = 404, description = "Vínculo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do vínculo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vinculo_unidade(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vinculo = app_state.exame_unidade_service.find_one(tenant.0, id).await?;
    Ok(Json(ApiResponse::new("Vínculo encontrado", vinculo)))
}

// PATCH /api/exames/unidades/{id}
#[utoipa::path(
    patch,
    path = "/api/exames/unidades/{id}",
    tag = "Exames",
    request_body = AtualizarUnidadePayload,
    responses(
        (status = 200, description = "Vínculo atualizado", body = ApiResponse<ExameUnidade>),
        (status = 400, description = "Destino incompatível"),
        (status = 404, description = "Vínculo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do vínculo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vinculo_unidade(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AtualizarUnidadePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let vinculo = app_state.exame_unidade_service.update(tenant.0, id, payload).await?;
    Ok(Json(ApiResponse::new("Vínculo atualizado com sucesso", vinculo)))
}

// DELETE /api/exames/unidades/{id}
#[utoipa::path(
    delete,
    path = "/api/exames/unidades/{id}",
    tag = "Exames",
    responses(
        (status = 200, description = "Vínculo removido"),
        (status = 404, description = "Vínculo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do vínculo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_vinculo_unidade(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.exame_unidade_service.remove(tenant.0, id).await?;
    Ok(Json(ApiResponse::message("Vínculo removido com sucesso")))
}

// PATCH /api/exames/unidades/{id}/toggle-status
#[utoipa::path(
    patch,
    path = "/api/exames/unidades/{id}/toggle-status",
    tag = "Exames",
    responses(
        (status = 200, description = "Status do vínculo invertido", body = ApiResponse<ExameUnidade>),
        (status = 404, description = "Vínculo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do vínculo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_vinculo_unidade(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vinculo = app_state.exame_unidade_service.toggle_status(tenant.0, id).await?;
    let message = if vinculo.ativo { "Vínculo ativado" } else { "Vínculo desativado" };
    Ok(Json(ApiResponse::new(message, vinculo)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exames", post(create_exame).get(list_exames))
        .route("/exames/buscar/{nome}", get(search_exames))
        .route("/exames/codigos", get(find_exames_by_codigos))
        .route("/exames/com-preparo", get(list_exames_com_preparo))
        .route("/exames/urgentes", get(list_exames_urgentes))
        .route("/exames/status", patch(bulk_update_status))
        .route("/exames/tipo/{tipo_id}", get(list_exames_by_tipo))
        .route("/exames/laboratorio/{lab_id}", get(list_exames_by_laboratorio))
        .route("/exames/codigo/{codigo}", get(get_exame_by_codigo))
        .route("/exames/{id}", get(get_exame).patch(update_exame).delete(delete_exame))
        // Unidades
        .route("/exames/{id}/unidades", post(vincular_unidade).get(list_unidades_do_exame))
        .route(
            "/exames/unidades/{id}",
            get(get_vinculo_unidade).patch(update_vinculo_unidade).delete(delete_vinculo_unidade),
        )
        .route("/exames/unidades/{id}/toggle-status", patch(toggle_vinculo_unidade))
        .route("/unidades/{unidade_id}/exames", get(list_exames_da_unidade))
}
