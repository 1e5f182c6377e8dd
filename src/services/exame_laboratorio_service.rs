// src/services/exame_laboratorio_service.rs

use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::ExameLaboratorioApoioRepository,
    models::laboratorio_apoio::{
        AtualizarExameLaboratorioPayload, CriarExameLaboratorioPayload, ErroLote, ExameLaboratorioApoio,
        ListarExameLaboratorioQuery, ResultadoLote,
    },
    services::referencias::Referencias,
};

const MSG_PAR_DUPLICADO: &str = "Este exame já está configurado para este laboratório de apoio";

#[derive(Clone)]
pub struct ExameLaboratorioService {
    repo: Arc<dyn ExameLaboratorioApoioRepository>,
    referencias: Referencias,
}

impl ExameLaboratorioService {
    pub fn new(repo: Arc<dyn ExameLaboratorioApoioRepository>, referencias: Referencias) -> Self {
        Self { repo, referencias }
    }

    async fn checar_referencias(&self, tenant_id: Uuid, exame_id: Uuid, laboratorio_apoio_id: Uuid) -> Result<(), AppError> {
        self.referencias.exame(tenant_id, exame_id).await?;
        self.referencias.laboratorio(tenant_id, laboratorio_apoio_id).await
    }

    async fn par_existe(&self, tenant_id: Uuid, exame_id: Uuid, laboratorio_apoio_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .repo
            .find_by_par(tenant_id, exame_id, laboratorio_apoio_id)
            .await?
            .is_some())
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        dados: CriarExameLaboratorioPayload,
    ) -> Result<ExameLaboratorioApoio, AppError> {
        self.checar_referencias(tenant_id, dados.exame_id, dados.laboratorio_apoio_id).await?;
        if self.par_existe(tenant_id, dados.exame_id, dados.laboratorio_apoio_id).await? {
            tracing::warn!(
                "Configuração duplicada: exame {} / laboratório {}",
                dados.exame_id,
                dados.laboratorio_apoio_id
            );
            return Err(AppError::Conflict(MSG_PAR_DUPLICADO.into()));
        }

        let config = ExameLaboratorioApoio::novo(tenant_id, dados);
        self.repo.insert(&config).await?;
        tracing::info!("Configuração exame/laboratório {} criada", config.id);
        Ok(config)
    }

    /// Sucesso parcial: cada item entra em `created` ou em `errors` com o índice original.
    pub async fn create_batch(
        &self,
        tenant_id: Uuid,
        itens: Vec<CriarExameLaboratorioPayload>,
    ) -> Result<ResultadoLote, AppError> {
        let mut errors = Vec::new();
        let mut candidatos: Vec<(usize, ExameLaboratorioApoio)> = Vec::new();
        let mut vistos: HashSet<(Uuid, Uuid)> = HashSet::new();

        for (index, item) in itens.into_iter().enumerate() {
            if let Err(e) = item.validate() {
                errors.push(ErroLote { index, message: AppError::from(e).mensagem_cliente() });
                continue;
            }
            match self.checar_referencias(tenant_id, item.exame_id, item.laboratorio_apoio_id).await {
                Ok(()) => {}
                Err(e @ AppError::NotFound(_)) => {
                    errors.push(ErroLote { index, message: e.mensagem_cliente() });
                    continue;
                }
                Err(e) => return Err(e),
            }
            let par = (item.exame_id, item.laboratorio_apoio_id);
            if vistos.contains(&par) || self.par_existe(tenant_id, par.0, par.1).await? {
                errors.push(ErroLote { index, message: MSG_PAR_DUPLICADO.into() });
                continue;
            }
            vistos.insert(par);
            candidatos.push((index, ExameLaboratorioApoio::novo(tenant_id, item)));
        }

        let configs: Vec<ExameLaboratorioApoio> = candidatos.iter().map(|(_, c)| c.clone()).collect();
        let resultados = self.repo.insert_lote(&configs).await?;

        let mut created = Vec::new();
        for ((index, config), resultado) in candidatos.into_iter().zip(resultados) {
            match resultado {
                Ok(()) => created.push(config),
                Err(e) => {
                    tracing::warn!("Item {} do lote exame/laboratório falhou: {}", index, e);
                    errors.push(ErroLote { index, message: e.mensagem_cliente() });
                }
            }
        }
        errors.sort_by_key(|e| e.index);

        tracing::info!("Lote exame/laboratório: {} criado(s), {} erro(s)", created.len(), errors.len());
        Ok(ResultadoLote { created, errors })
    }

    pub async fn find_all(
        &self,
        tenant_id: Uuid,
        query: ListarExameLaboratorioQuery,
    ) -> Result<Paginated<ExameLaboratorioApoio>, AppError> {
        let pagina = PageQuery { page: query.page, limit: query.limit };
        let (configs, total) = self
            .repo
            .list(tenant_id, query.exame_id, Some(pagina.limit()), pagina.offset())
            .await?;
        Ok(Paginated::new(configs, total, &pagina))
    }

    pub async fn find_by_exame(&self, tenant_id: Uuid, exame_id: Uuid) -> Result<Vec<ExameLaboratorioApoio>, AppError> {
        let (configs, _) = self.repo.list(tenant_id, Some(exame_id), None, 0).await?;
        Ok(configs)
    }

    pub async fn find_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameLaboratorioApoio>, AppError> {
        self.repo.list_ativos_by_laboratorio(tenant_id, laboratorio_apoio_id).await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<ExameLaboratorioApoio, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Configuração com ID {} não encontrada", id)))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarExameLaboratorioPayload,
    ) -> Result<ExameLaboratorioApoio, AppError> {
        let mut config = self.find_one(tenant_id, id).await?;

        if let Some(novo_lab) = patch.laboratorio_apoio_id {
            if novo_lab != config.laboratorio_apoio_id {
                self.referencias.laboratorio(tenant_id, novo_lab).await?;
            }
            if novo_lab != config.laboratorio_apoio_id && self.par_existe(tenant_id, config.exame_id, novo_lab).await? {
                return Err(AppError::Conflict(MSG_PAR_DUPLICADO.into()));
            }
        }

        config.aplicar(patch);
        self.repo.update(&config).await?;
        tracing::info!("Configuração exame/laboratório {} atualizada", id);
        Ok(config)
    }

    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Configuração com ID {} não encontrada", id)));
        }
        tracing::info!("Configuração exame/laboratório {} removida", id);
        Ok(())
    }

    pub async fn toggle_ativo(&self, tenant_id: Uuid, id: Uuid) -> Result<ExameLaboratorioApoio, AppError> {
        let mut config = self.find_one(tenant_id, id).await?;
        config.ativo = !config.ativo;
        config.updated_at = chrono::Utc::now();
        self.repo.update(&config).await?;
        Ok(config)
    }
}
