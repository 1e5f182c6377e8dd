// src/services/laboratorio_apoio_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageQuery, Paginated},
    },
    db::LaboratorioApoioRepository,
    models::{
        exame::StatusCadastro,
        laboratorio_apoio::{
            AtualizarLaboratorioPayload, CriarLaboratorioPayload, FiltroLaboratorios, LaboratorioApoio,
            ListarLaboratoriosQuery,
        },
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe um laboratório de apoio com este código";

#[derive(Clone)]
pub struct LaboratorioApoioService {
    repo: Arc<dyn LaboratorioApoioRepository>,
}

impl LaboratorioApoioService {
    pub fn new(repo: Arc<dyn LaboratorioApoioRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, tenant_id: Uuid, dados: CriarLaboratorioPayload) -> Result<LaboratorioApoio, AppError> {
        if self.repo.find_by_codigo(tenant_id, &dados.codigo).await?.is_some() {
            tracing::warn!("Código de laboratório duplicado: {}", dados.codigo);
            return Err(AppError::Conflict(MSG_CODIGO_DUPLICADO.into()));
        }

        let lab = LaboratorioApoio::novo(tenant_id, dados);
        self.repo.insert(&lab).await?;
        tracing::info!("Laboratório de apoio {} ({}) criado", lab.id, lab.codigo);
        Ok(lab)
    }

    pub async fn find_all(
        &self,
        tenant_id: Uuid,
        query: ListarLaboratoriosQuery,
    ) -> Result<Paginated<LaboratorioApoio>, AppError> {
        let pagina = PageQuery { page: query.page, limit: query.limit };
        let filtro = FiltroLaboratorios { busca: query.search, status: query.status };
        let (labs, total) = self
            .repo
            .list(tenant_id, &filtro, Some(pagina.limit()), pagina.offset())
            .await?;
        Ok(Paginated::new(labs, total, &pagina))
    }

    pub async fn find_ativos(&self, tenant_id: Uuid) -> Result<Vec<LaboratorioApoio>, AppError> {
        let filtro = FiltroLaboratorios { status: Some(StatusCadastro::Ativo), ..Default::default() };
        let (labs, _) = self.repo.list(tenant_id, &filtro, None, 0).await?;
        Ok(labs)
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<LaboratorioApoio, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Laboratório de apoio com ID {} não encontrado", id)))
    }

    pub async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<LaboratorioApoio, AppError> {
        self.repo
            .find_by_codigo(tenant_id, codigo)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Laboratório de apoio com código {} não encontrado", codigo)))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarLaboratorioPayload,
    ) -> Result<LaboratorioApoio, AppError> {
        let mut lab = self.find_one(tenant_id, id).await?;

        if let Some(codigo) = patch.codigo.as_deref() {
            if codigo != lab.codigo && self.repo.find_by_codigo(tenant_id, codigo).await?.is_some() {
                return Err(AppError::Conflict(MSG_CODIGO_DUPLICADO.into()));
            }
        }

        lab.aplicar(patch);
        self.repo.update(&lab).await?;
        tracing::info!("Laboratório de apoio {} atualizado", id);
        Ok(lab)
    }

    /// Ativo vira inativo; inativo ou suspenso voltam a ativo.
    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<LaboratorioApoio, AppError> {
        let mut lab = self.find_one(tenant_id, id).await?;
        lab.status = match lab.status {
            StatusCadastro::Ativo => StatusCadastro::Inativo,
            StatusCadastro::Inativo | StatusCadastro::Suspenso => StatusCadastro::Ativo,
        };
        lab.updated_at = chrono::Utc::now();
        self.repo.update(&lab).await?;
        Ok(lab)
    }

    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut lab = self.find_one(tenant_id, id).await?;
        lab.status = StatusCadastro::Inativo;
        lab.updated_at = chrono::Utc::now();
        self.repo.update(&lab).await?;
        tracing::info!("Laboratório de apoio {} inativado", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn servico() -> LaboratorioApoioService {
        LaboratorioApoioService::new(Arc::new(MemoryStore::default()))
    }

    fn lab(codigo: &str, nome: &str) -> CriarLaboratorioPayload {
        CriarLaboratorioPayload { codigo: codigo.into(), nome: nome.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn codigo_duplicado_gera_conflito() {
        let service = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, lab("LAB001", "Central")).await.unwrap();
        assert!(matches!(
            service.create(tenant, lab("LAB001", "Outro")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn toggle_tira_de_suspenso_para_ativo() {
        let service = servico();
        let tenant = Uuid::new_v4();
        let mut dados = lab("LAB001", "Central");
        dados.status = Some(StatusCadastro::Suspenso);
        let criado = service.create(tenant, dados).await.unwrap();

        let lab = service.toggle_status(tenant, criado.id).await.unwrap();
        assert_eq!(lab.status, StatusCadastro::Ativo);
        let lab = service.toggle_status(tenant, criado.id).await.unwrap();
        assert_eq!(lab.status, StatusCadastro::Inativo);
    }

    #[tokio::test]
    async fn remove_inativa_e_some_dos_ativos() {
        let service = servico();
        let tenant = Uuid::new_v4();
        let a = service.create(tenant, lab("LAB001", "Central")).await.unwrap();
        service.create(tenant, lab("LAB002", "Norte")).await.unwrap();

        service.remove(tenant, a.id).await.unwrap();

        let ativos = service.find_ativos(tenant).await.unwrap();
        assert_eq!(ativos.len(), 1);
        assert_eq!(service.find_one(tenant, a.id).await.unwrap().status, StatusCadastro::Inativo);
    }

    #[tokio::test]
    async fn busca_por_codigo_ou_razao_social() {
        let service = servico();
        let tenant = Uuid::new_v4();
        let mut dados = lab("LAB001", "Central");
        dados.razao_social = Some("Diagnósticos Brasil LTDA".into());
        service.create(tenant, dados).await.unwrap();
        service.create(tenant, lab("XYZ", "Norte")).await.unwrap();

        let query = |busca: &str| ListarLaboratoriosQuery { search: Some(busca.into()), ..Default::default() };
        assert_eq!(service.find_all(tenant, query("lab0")).await.unwrap().total, 1);
        assert_eq!(service.find_all(tenant, query("brasil")).await.unwrap().total, 1);
        assert_eq!(service.find_all(tenant, ListarLaboratoriosQuery::default()).await.unwrap().total, 2);
    }
}
