// src/services/telemedicina_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{empresa_repo::MSG_CNPJ_DUPLICADO, EmpresaRepository, TelemedicinaRepository},
    models::{
        empresa::{Empresa, TipoEmpresa},
        telemedicina::{AtualizarTelemedicinaPayload, CriarTelemedicinaPayload, Telemedicina, TelemedicinaComEmpresa},
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe uma telemedicina com este código";

#[derive(Clone)]
pub struct TelemedicinaService {
    repo: Arc<dyn TelemedicinaRepository>,
    empresas: Arc<dyn EmpresaRepository>,
}

impl TelemedicinaService {
    pub fn new(repo: Arc<dyn TelemedicinaRepository>, empresas: Arc<dyn EmpresaRepository>) -> Self {
        Self { repo, empresas }
    }

    /// Empresa e telemedicina na mesma transação.
    pub async fn create(&self, tenant_id: Uuid, dados: CriarTelemedicinaPayload) -> Result<TelemedicinaComEmpresa, AppError> {
        if self.repo.find_by_codigo(tenant_id, &dados.codigo_telemedicina).await?.is_some() {
            tracing::warn!("Código de telemedicina duplicado: {}", dados.codigo_telemedicina);
            return Err(AppError::Conflict(MSG_CODIGO_DUPLICADO.into()));
        }
        if self.empresas.find_by_cnpj(tenant_id, &dados.empresa.cnpj).await?.is_some() {
            tracing::warn!("CNPJ já cadastrado: {}", dados.empresa.cnpj);
            return Err(AppError::Conflict(MSG_CNPJ_DUPLICADO.into()));
        }

        let empresa = Empresa::nova(tenant_id, TipoEmpresa::Telemedicina, dados.empresa.clone());
        let telemedicina = Telemedicina::nova(tenant_id, empresa.id, &dados);
        self.repo.insert(&telemedicina, &empresa).await?;

        tracing::info!("Telemedicina {} ({}) criada", telemedicina.id, telemedicina.codigo_telemedicina);
        Ok(TelemedicinaComEmpresa { telemedicina, empresa })
    }

    /// Ordenado pelo nome fantasia da empresa.
    pub async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaComEmpresa>, AppError> {
        let mut todas = self.repo.list(tenant_id).await?;
        todas.sort_by(|a, b| a.empresa.nome_exibicao().cmp(b.empresa.nome_exibicao()));
        Ok(todas)
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<TelemedicinaComEmpresa, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Telemedicina com ID {} não encontrada", id)))
    }

    pub async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<TelemedicinaComEmpresa, AppError> {
        self.repo
            .find_by_codigo(tenant_id, codigo)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Telemedicina com código {} não encontrada", codigo)))
    }

    pub async fn find_by_cnpj(&self, tenant_id: Uuid, cnpj: &str) -> Result<TelemedicinaComEmpresa, AppError> {
        let nao_encontrada = || AppError::NotFound(format!("Telemedicina com CNPJ {} não encontrada", cnpj));
        let empresa = self.empresas.find_by_cnpj(tenant_id, cnpj).await?.ok_or_else(nao_encontrada)?;
        self.repo
            .find_by_empresa(tenant_id, empresa.id)
            .await?
            .ok_or_else(nao_encontrada)
    }

    pub async fn find_ativos(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaComEmpresa>, AppError> {
        Ok(self.find_all(tenant_id).await?.into_iter().filter(|t| t.empresa.ativo).collect())
    }

    pub async fn search(&self, tenant_id: Uuid, termo: &str) -> Result<Vec<TelemedicinaComEmpresa>, AppError> {
        Ok(self.find_all(tenant_id).await?.into_iter().filter(|t| t.contem(termo)).collect())
    }

    /// Só `integracao_id` e `observacoes`.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarTelemedicinaPayload,
    ) -> Result<TelemedicinaComEmpresa, AppError> {
        let mut atual = self.find_one(tenant_id, id).await?;
        if patch.integracao_id.is_some() {
            atual.telemedicina.integracao_id = patch.integracao_id;
        }
        if patch.observacoes.is_some() {
            atual.telemedicina.observacoes = patch.observacoes;
        }
        atual.telemedicina.updated_at = Utc::now();
        self.repo.update(&atual.telemedicina).await?;
        tracing::info!("Telemedicina {} atualizada", id);
        Ok(atual)
    }

    /// Remove a telemedicina e seus mapeamentos. A empresa permanece.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Telemedicina com ID {} não encontrada", id)));
        }
        tracing::info!("Telemedicina {} removida", id);
        Ok(())
    }

    /// Alterna o `ativo` da empresa dona do cadastro.
    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<TelemedicinaComEmpresa, AppError> {
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
    use crate::{db::memory::MemoryStore, models::empresa::fixtures::dados_empresa};

    fn payload(codigo: &str, cnpj: &str, fantasia: &str) -> CriarTelemedicinaPayload {
        CriarTelemedicinaPayload {
            empresa: dados_empresa(cnpj, &format!("{} S.A.", fantasia), Some(fantasia)),
            codigo_telemedicina: codigo.into(),
            tipo_integracao: None,
            url_integracao: None,
            status_integracao: None,
            tipo_plataforma: None,
            url_plataforma: None,
            teleconsulta: Some(true),
            telediagnostico: None,
            telemonitoramento: None,
            tempo_consulta_padrao: None,
            valor_consulta_particular: None,
            percentual_repasse: None,
            integracao_id: None,
            observacoes: None,
        }
    }

    fn servico() -> (Arc<MemoryStore>, TelemedicinaService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), TelemedicinaService::new(store.clone(), store))
    }

    #[tokio::test]
    async fn create_grava_empresa_do_tipo_telemedicina() {
        let (store, service) = servico();
        let criada = service
            .create(Uuid::new_v4(), payload("TELE001", "11222333000181", "TeleLaudos"))
            .await
            .unwrap();
        assert_eq!(criada.empresa.tipo_empresa, TipoEmpresa::Telemedicina);
        assert_eq!(criada.telemedicina.empresa_id, criada.empresa.id);
        assert_eq!(store.empresas.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cnpj_repetido_gera_conflito_sem_gravar() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, payload("TELE001", "11222333000181", "A")).await.unwrap();

        let err = service.create(tenant, payload("TELE002", "11222333000181", "B")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_CNPJ_DUPLICADO));
        assert_eq!(store.telemedicinas.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_preserva_a_empresa() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        let criada = service.create(tenant, payload("TELE001", "11222333000181", "A")).await.unwrap();

        service.remove(tenant, criada.telemedicina.id).await.unwrap();

        assert!(store.telemedicinas.lock().unwrap().is_empty());
        assert_eq!(store.empresas.lock().unwrap().len(), 1);
        assert!(matches!(
            service.remove(tenant, criada.telemedicina.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn toggle_tira_dos_ativos() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criada = service.create(tenant, payload("TELE001", "11222333000181", "A")).await.unwrap();
        service.create(tenant, payload("TELE002", "99888777000166", "B")).await.unwrap();

        service.toggle_status(tenant, criada.telemedicina.id).await.unwrap();

        let ativos = service.find_ativos(tenant).await.unwrap();
        assert_eq!(ativos.len(), 1);
        assert_eq!(ativos[0].telemedicina.codigo_telemedicina, "TELE002");
    }

    #[tokio::test]
    async fn update_altera_apenas_integracao_e_observacoes() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criada = service.create(tenant, payload("TELE001", "11222333000181", "A")).await.unwrap();
        let integracao = Uuid::new_v4();

        let patch = AtualizarTelemedicinaPayload { integracao_id: Some(integracao), observacoes: None };
        let atualizada = service.update(tenant, criada.telemedicina.id, patch).await.unwrap();

        assert_eq!(atualizada.telemedicina.integracao_id, Some(integracao));
        assert!(atualizada.telemedicina.teleconsulta);
        assert_eq!(service.find_by_cnpj(tenant, "11222333000181").await.unwrap().telemedicina.integracao_id, Some(integracao));
    }

    #[tokio::test]
    async fn busca_e_ordenacao_pelo_nome_fantasia() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, payload("TELE001", "11222333000181", "Zoom Saúde")).await.unwrap();
        service.create(tenant, payload("TELE002", "99888777000166", "Apoio Digital")).await.unwrap();

        let todas = service.find_all(tenant).await.unwrap();
        assert_eq!(todas[0].telemedicina.codigo_telemedicina, "TELE002");
        assert_eq!(service.search(tenant, "zoom").await.unwrap().len(), 1);
        assert_eq!(service.search(tenant, "tele").await.unwrap().len(), 2);
    }
}
