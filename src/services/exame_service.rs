// src/services/exame_service.rs

use std::{collections::BTreeSet, sync::Arc};

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::{ExameRepository, ExameUnidadeRepository},
    models::{
        exame::{
            AtualizarExamePayload, AtualizarStatusEmLotePayload, CodigosQuery, CriarExamePayload, Exame,
            ExameDetalhe, FiltroExames, ListarExamesQuery, OrdemExames, StatusCadastro,
        },
        exame_unidade::ExameUnidade,
    },
    services::{exame_unidade_service::validar_destino, referencias::Referencias},
};

const LIMITE_BUSCA_NOME: i64 = 20;
const LIMITE_URGENTES: i64 = 50;

#[derive(Clone)]
pub struct ExameService {
    exames: Arc<dyn ExameRepository>,
    vinculos: Arc<dyn ExameUnidadeRepository>,
    referencias: Referencias,
}

impl ExameService {
    pub fn new(
        exames: Arc<dyn ExameRepository>,
        vinculos: Arc<dyn ExameUnidadeRepository>,
        referencias: Referencias,
    ) -> Self {
        Self { exames, vinculos, referencias }
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn create(
        &self,
        tenant_id: Uuid,
        mut dados: CriarExamePayload,
        usuario: Option<Uuid>,
    ) -> Result<Exame, AppError> {
        let unidades = dados.unidades.take().unwrap_or_default();
        for u in &unidades {
            validar_destino(u.destino.unwrap_or_default(), u.laboratorio_apoio_id, u.telemedicina_id)?;
            self.referencias
                .destino(tenant_id, u.laboratorio_apoio_id, u.telemedicina_id)
                .await?;
        }

        if self.exames.find_by_codigo(tenant_id, &dados.codigo_interno).await?.is_some() {
            tracing::warn!("Código de exame duplicado: {}", dados.codigo_interno);
            return Err(AppError::Conflict("Já existe um exame com este código interno".into()));
        }

        let exame = Exame::novo(tenant_id, dados, usuario);
        let vinculos: Vec<ExameUnidade> = unidades
            .into_iter()
            .map(|u| ExameUnidade::novo(tenant_id, exame.id, u))
            .collect();

        self.exames.insert(&exame, &vinculos).await?;
        tracing::info!("Exame {} ({}) criado com {} unidade(s)", exame.id, exame.codigo_interno, vinculos.len());
        Ok(exame)
    }

    pub async fn find_all(&self, tenant_id: Uuid, query: ListarExamesQuery) -> Result<Paginated<Exame>, AppError> {
        let pagina = PageQuery { page: query.page, limit: query.limit };
        let filtro = FiltroExames {
            busca: query.search,
            status: query.status,
            tipo_exame_id: query.tipo_exame_id,
            especialidade_id: query.especialidade_id,
            ..Default::default()
        };
        let (exames, total) = self
            .exames
            .list(tenant_id, &filtro, Some(pagina.limit()), pagina.offset())
            .await?;
        Ok(Paginated::new(exames, total, &pagina))
    }

    async fn buscar(&self, tenant_id: Uuid, id: Uuid) -> Result<Exame, AppError> {
        self.exames
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exame com ID {} não encontrado", id)))
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<ExameDetalhe, AppError> {
        let exame = self.buscar(tenant_id, id).await?;
        let unidades = self.vinculos.list_by_exame(tenant_id, id).await?;
        Ok(ExameDetalhe::new(exame, unidades))
    }

    pub async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Exame, AppError> {
        self.exames
            .find_by_codigo(tenant_id, codigo)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exame com código {} não encontrado", codigo)))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarExamePayload,
        usuario: Option<Uuid>,
    ) -> Result<Exame, AppError> {
        let mut exame = self.buscar(tenant_id, id).await?;

        if let Some(codigo) = patch.codigo_interno.as_deref() {
            if codigo != exame.codigo_interno && self.exames.find_by_codigo(tenant_id, codigo).await?.is_some() {
                tracing::warn!("Código de exame duplicado na atualização: {}", codigo);
                return Err(AppError::Conflict("Já existe um exame com este código interno".into()));
            }
        }

        exame.aplicar(patch, usuario);
        self.exames.update(&exame).await?;
        tracing::info!("Exame {} atualizado", id);
        Ok(exame)
    }

    /// Exclusão lógica: o exame fica inativo.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut exame = self.buscar(tenant_id, id).await?;
        exame.status = StatusCadastro::Inativo;
        exame.updated_at = chrono::Utc::now();
        self.exames.update(&exame).await?;
        tracing::info!("Exame {} inativado", id);
        Ok(())
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    async fn listar_ativos(&self, tenant_id: Uuid, filtro: FiltroExames, limite: Option<i64>) -> Result<Vec<Exame>, AppError> {
        let (exames, _) = self.exames.list(tenant_id, &filtro, limite, 0).await?;
        Ok(exames)
    }

    pub async fn find_by_tipo(&self, tenant_id: Uuid, tipo_exame_id: Uuid) -> Result<Vec<Exame>, AppError> {
        let filtro = FiltroExames { tipo_exame_id: Some(tipo_exame_id), ..FiltroExames::ativos() };
        self.listar_ativos(tenant_id, filtro, None).await
    }

    /// Exames realizados pelo laboratório em alguma unidade (vínculos ativos).
    pub async fn find_by_laboratorio_apoio(&self, tenant_id: Uuid, laboratorio_apoio_id: Uuid) -> Result<Vec<Exame>, AppError> {
        let ids: BTreeSet<Uuid> = self
            .vinculos
            .list_ativos_by_laboratorio(tenant_id, laboratorio_apoio_id)
            .await?
            .into_iter()
            .map(|v| v.exame_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filtro = FiltroExames { ids: Some(ids.into_iter().collect()), ..FiltroExames::ativos() };
        self.listar_ativos(tenant_id, filtro, None).await
    }

    /// Nome ou sinônimo, até 20 resultados.
    pub async fn search_by_name(&self, tenant_id: Uuid, nome: &str) -> Result<Vec<Exame>, AppError> {
        let filtro = FiltroExames {
            busca: Some(nome.to_string()),
            busca_sinonimos: true,
            ..FiltroExames::ativos()
        };
        self.listar_ativos(tenant_id, filtro, Some(LIMITE_BUSCA_NOME)).await
    }

    pub async fn find_by_codigos(&self, tenant_id: Uuid, codigos: CodigosQuery) -> Result<Vec<Exame>, AppError> {
        let filtro = FiltroExames {
            codigo_tuss: codigos.tuss,
            codigo_amb: codigos.amb,
            codigo_sus: codigos.sus,
            ..FiltroExames::ativos()
        };
        self.listar_ativos(tenant_id, filtro, None).await
    }

    pub async fn bulk_update_status(&self, tenant_id: Uuid, dados: AtualizarStatusEmLotePayload) -> Result<u64, AppError> {
        let status = StatusCadastro::parse(&dados.status).ok_or_else(|| {
            tracing::warn!("Status inválido na atualização em lote: {}", dados.status);
            AppError::BadRequest(format!("Status inválido: {}", dados.status))
        })?;

        let alterados = self.exames.update_status_many(tenant_id, &dados.ids, status).await?;
        tracing::info!("{} exame(s) alterado(s) para {:?}", alterados, status);
        Ok(alterados)
    }

    pub async fn get_exames_com_preparo(&self, tenant_id: Uuid) -> Result<Vec<Exame>, AppError> {
        let filtro = FiltroExames { necessita_preparo: Some(true), ..FiltroExames::ativos() };
        self.listar_ativos(tenant_id, filtro, None).await
    }

    /// Maior peso primeiro, até 50.
    pub async fn get_exames_urgentes(&self, tenant_id: Uuid) -> Result<Vec<Exame>, AppError> {
        let filtro = FiltroExames { ordem: OrdemExames::PesoDesc, ..FiltroExames::ativos() };
        self.listar_ativos(tenant_id, filtro, Some(LIMITE_URGENTES)).await
    }
}
