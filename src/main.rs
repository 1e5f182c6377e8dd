//src/main.rs

use axum::{middleware as axum_middleware, routing::get, Router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[macro_use]
mod macros;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::tenancy::tenant_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Tudo abaixo de /api exige token e X-Tenant-ID, exceto o health
    let api_routes = Router::new()
        .merge(handlers::exames::routes())
        .merge(handlers::laboratorios_apoio::routes())
        .merge(handlers::exames_laboratorios::routes())
        .merge(handlers::ordens_servico::routes())
        .merge(handlers::prestadores::routes())
        .merge(handlers::categorias::routes())
        .merge(handlers::telemedicina::routes())
        .merge(handlers::telemedicina_exames::routes())
        .merge(handlers::contas_pagar::routes())
        .merge(handlers::convenios::routes())
        .merge(handlers::formularios::routes())
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .with_state(app_state);

    let listener = TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
