// src/services/convenio_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{empresa_repo::MSG_CNPJ_DUPLICADO, ConvenioRepository, EmpresaRepository},
    models::{
        convenio::{AtualizarConvenioPayload, Convenio, ConvenioComEmpresa, CriarConvenioPayload},
        empresa::{Empresa, TipoEmpresa},
    },
};

#[derive(Clone)]
pub struct ConvenioService {
    repo: Arc<dyn ConvenioRepository>,
    empresas: Arc<dyn EmpresaRepository>,
}

impl ConvenioService {
    pub fn new(repo: Arc<dyn ConvenioRepository>, empresas: Arc<dyn EmpresaRepository>) -> Self {
        Self { repo, empresas }
    }

    pub async fn create(&self, tenant_id: Uuid, dados: CriarConvenioPayload) -> Result<ConvenioComEmpresa, AppError> {
        if self.empresas.find_by_cnpj(tenant_id, &dados.empresa.cnpj).await?.is_some() {
            tracing::warn!("CNPJ já cadastrado: {}", dados.empresa.cnpj);
            return Err(AppError::Conflict(MSG_CNPJ_DUPLICADO.into()));
        }

        let empresa = Empresa::nova(tenant_id, TipoEmpresa::Convenio, dados.empresa.clone());
        let convenio = Convenio::novo(tenant_id, empresa.id, &dados);
        self.repo.insert(&convenio, &empresa).await?;

        tracing::info!("Convênio {} ({}) criado", convenio.id, convenio.nome);
        Ok(ConvenioComEmpresa { convenio, empresa })
    }

    /// Ordenado pelo nome do convênio.
    pub async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<ConvenioComEmpresa>, AppError> {
        let mut todos = self.repo.list(tenant_id).await?;
        todos.sort_by(|a, b| a.convenio.nome.cmp(&b.convenio.nome));
        Ok(todos)
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<ConvenioComEmpresa, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Convênio com ID {} não encontrado", id)))
    }

    pub async fn find_by_cnpj(&self, tenant_id: Uuid, cnpj: &str) -> Result<ConvenioComEmpresa, AppError> {
        let nao_encontrado = || AppError::NotFound(format!("Convênio com CNPJ {} não encontrado", cnpj));
        let empresa = self.empresas.find_by_cnpj(tenant_id, cnpj).await?.ok_or_else(nao_encontrado)?;
        self.repo
            .find_by_empresa(tenant_id, empresa.id)
            .await?
            .ok_or_else(nao_encontrado)
    }

    pub async fn find_ativos(&self, tenant_id: Uuid) -> Result<Vec<ConvenioComEmpresa>, AppError> {
        Ok(self.find_all(tenant_id).await?.into_iter().filter(|c| c.empresa.ativo).collect())
    }

    pub async fn search(&self, tenant_id: Uuid, termo: &str) -> Result<Vec<ConvenioComEmpresa>, AppError> {
        Ok(self.find_all(tenant_id).await?.into_iter().filter(|c| c.contem(termo)).collect())
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarConvenioPayload,
    ) -> Result<ConvenioComEmpresa, AppError> {
        let mut atual = self.find_one(tenant_id, id).await?;
        atual.convenio.aplicar(patch);
        self.repo.update(&atual.convenio).await?;
        tracing::info!("Convênio {} atualizado", id);
        Ok(atual)
    }

    /// A empresa permanece cadastrada.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Convênio com ID {} não encontrado", id)));
        }
        tracing::info!("Convênio {} removido", id);
        Ok(())
    }

    /// Alterna o `ativo` da empresa do convênio.
    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<ConvenioComEmpresa, AppError> {
        let mut atual = self.find_one(tenant_id, id).await?;
        atual.empresa.ativo = !atual.empresa.ativo;
        atual.empresa.updated_at = Utc::now();
        self.empresas.update(&atual.empresa).await?;
        Ok(atual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::MemoryStore, models::convenio::fixtures::criar_convenio};

    fn servico() -> (Arc<MemoryStore>, ConvenioService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), ConvenioService::new(store.clone(), store))
    }

    #[tokio::test]
    async fn create_grava_empresa_do_tipo_convenio() {
        let (store, service) = servico();
        let criado = service
            .create(Uuid::new_v4(), criar_convenio("Unimed", "11222333000181", "Unimed"))
            .await
            .unwrap();
        assert_eq!(criado.empresa.tipo_empresa, TipoEmpresa::Convenio);
        assert_eq!(criado.convenio.empresa_id, criado.empresa.id);
        assert_eq!(store.convenios.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cnpj_de_outra_empresa_gera_conflito() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        store.semear_telemedicina(tenant, "TELE01");
        let cnpj = store.empresas.lock().unwrap()[0].cnpj.clone();

        let err = service.create(tenant, criar_convenio("Unimed", &cnpj, "Unimed")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_CNPJ_DUPLICADO));
        assert!(store.convenios.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mesmo_cnpj_em_outro_tenant_e_aceito() {
        let (_, service) = servico();
        service.create(Uuid::new_v4(), criar_convenio("Unimed", "11222333000181", "Unimed")).await.unwrap();
        assert!(service.create(Uuid::new_v4(), criar_convenio("Unimed", "11222333000181", "Unimed")).await.is_ok());
    }

    #[tokio::test]
    async fn listagem_por_nome_e_busca_nos_dados_da_empresa() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, criar_convenio("Unimed", "11222333000181", "Cooperativa Médica")).await.unwrap();
        service.create(tenant, criar_convenio("Amil", "99888777000166", "Amil Saúde")).await.unwrap();

        let todos = service.find_all(tenant).await.unwrap();
        assert_eq!(todos[0].convenio.nome, "Amil");
        assert_eq!(service.search(tenant, "cooperativa").await.unwrap()[0].convenio.nome, "Unimed");
        assert_eq!(service.search(tenant, "UNI").await.unwrap().len(), 1);
        assert_eq!(service.find_by_cnpj(tenant, "99888777000166").await.unwrap().convenio.nome, "Amil");
    }

    #[tokio::test]
    async fn toggle_e_update() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criado = service.create(tenant, criar_convenio("Unimed", "11222333000181", "Unimed")).await.unwrap();

        let inativo = service.toggle_status(tenant, criado.convenio.id).await.unwrap();
        assert!(!inativo.empresa.ativo);
        assert!(service.find_ativos(tenant).await.unwrap().is_empty());

        let patch = AtualizarConvenioPayload { dia_vencimento: Some(10), tiss: Some(true), ..Default::default() };
        let atualizado = service.update(tenant, criado.convenio.id, patch).await.unwrap();
        assert_eq!(atualizado.convenio.dia_vencimento, Some(10));
        assert!(service.find_one(tenant, criado.convenio.id).await.unwrap().convenio.tiss);
    }

    #[tokio::test]
    async fn remove_preserva_a_empresa() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        let criado = service.create(tenant, criar_convenio("Unimed", "11222333000181", "Unimed")).await.unwrap();

        service.remove(tenant, criado.convenio.id).await.unwrap();

        assert!(store.convenios.lock().unwrap().is_empty());
        assert_eq!(store.empresas.lock().unwrap().len(), 1);
        assert!(matches!(service.find_one(tenant, criado.convenio.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.remove(tenant, criado.convenio.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn convenio_de_outro_tenant_nao_e_encontrado() {
        let (_, service) = servico();
        let criado = service.create(Uuid::new_v4(), criar_convenio("Unimed", "11222333000181", "Unimed")).await.unwrap();
        assert!(matches!(
            service.find_one(Uuid::new_v4(), criado.convenio.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
