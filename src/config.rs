// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        PgCategoriaRepository, PgContaPagarRepository, PgConvenioRepository, PgEmpresaRepository,
        PgExameLaboratorioApoioRepository, PgExameRepository, PgExameUnidadeRepository, PgFormularioRepository,
        PgLaboratorioApoioRepository, PgOrdemServicoRepository, PgPrestadorRepository,
        PgTelemedicinaExameRepository, PgTelemedicinaRepository,
    },
    services::{
        categoria_service::CategoriaService, conta_pagar_service::ContaPagarService,
        convenio_service::ConvenioService, exame_laboratorio_service::ExameLaboratorioService,
        exame_service::ExameService, exame_unidade_service::ExameUnidadeService,
        formulario_service::FormularioService, laboratorio_apoio_service::LaboratorioApoioService,
        ordem_servico_service::OrdemServicoService, prestador_service::PrestadorService,
        referencias::Referencias, telemedicina_exame_service::TelemedicinaExameService,
        telemedicina_service::TelemedicinaService,
    },
};

const SERVER_ADDR_PADRAO: &str = "0.0.0.0:3000";
const MAX_CONEXOES_PADRAO: u32 = 5;

/// Variáveis de ambiente lidas na inicialização.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| SERVER_ADDR_PADRAO.to_string());
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", v))?,
            Err(_) => MAX_CONEXOES_PADRAO,
        };

        Ok(Self { database_url, jwt_secret, server_addr, max_connections })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub exame_service: ExameService,
    pub exame_unidade_service: ExameUnidadeService,
    pub laboratorio_apoio_service: LaboratorioApoioService,
    pub exame_laboratorio_service: ExameLaboratorioService,
    pub ordem_servico_service: OrdemServicoService,
    pub prestador_service: PrestadorService,
    pub categoria_service: CategoriaService,
    pub telemedicina_service: TelemedicinaService,
    pub telemedicina_exame_service: TelemedicinaExameService,
    pub conta_pagar_service: ContaPagarService,
    pub convenio_service: ConvenioService,
    pub formulario_service: FormularioService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, settings.jwt_secret.clone()))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let empresas = Arc::new(PgEmpresaRepository::new(db_pool.clone()));
        let exames = Arc::new(PgExameRepository::new(db_pool.clone()));
        let exame_unidades = Arc::new(PgExameUnidadeRepository::new(db_pool.clone()));
        let laboratorios = Arc::new(PgLaboratorioApoioRepository::new(db_pool.clone()));
        let exame_laboratorios = Arc::new(PgExameLaboratorioApoioRepository::new(db_pool.clone()));
        let ordens = Arc::new(PgOrdemServicoRepository::new(db_pool.clone()));
        let prestadores = Arc::new(PgPrestadorRepository::new(db_pool.clone()));
        let categorias = Arc::new(PgCategoriaRepository::new(db_pool.clone()));
        let telemedicinas = Arc::new(PgTelemedicinaRepository::new(db_pool.clone()));
        let telemedicina_exames = Arc::new(PgTelemedicinaExameRepository::new(db_pool.clone()));
        let contas = Arc::new(PgContaPagarRepository::new(db_pool.clone()));
        let convenios = Arc::new(PgConvenioRepository::new(db_pool.clone()));
        let formularios = Arc::new(PgFormularioRepository::new(db_pool.clone()));

        // Checagem de exame, laboratório e telemedicina do próprio tenant antes dos vínculos
        let referencias = Referencias::new(exames.clone(), laboratorios.clone(), telemedicinas.clone());

        Self {
            exame_service: ExameService::new(exames.clone(), exame_unidades.clone(), referencias.clone()),
            exame_unidade_service: ExameUnidadeService::new(referencias.clone(), exame_unidades),
            laboratorio_apoio_service: LaboratorioApoioService::new(laboratorios),
            exame_laboratorio_service: ExameLaboratorioService::new(exame_laboratorios, referencias.clone()),
            ordem_servico_service: OrdemServicoService::new(ordens),
            prestador_service: PrestadorService::new(prestadores.clone(), empresas.clone()),
            categoria_service: CategoriaService::new(categorias, prestadores),
            telemedicina_service: TelemedicinaService::new(telemedicinas, empresas.clone()),
            telemedicina_exame_service: TelemedicinaExameService::new(telemedicina_exames, exames, referencias),
            conta_pagar_service: ContaPagarService::new(contas),
            convenio_service: ConvenioService::new(convenios, empresas),
            formulario_service: FormularioService::new(formularios),
            db_pool,
            jwt_secret,
        }
    }
}
