// src/services/ordem_servico_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrdemServicoRepository,
    models::ordem_servico::{
        AdicionarExameOsPayload, AtualizarStatusOsPayload, OrdemServicoExame, RegistrarResultadoPayload,
        ResultadoExame, RevisarResultadoPayload,
    },
};

#[derive(Clone)]
pub struct OrdemServicoService {
    repo: Arc<dyn OrdemServicoRepository>,
}

impl OrdemServicoService {
    pub fn new(repo: Arc<dyn OrdemServicoRepository>) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  EXAMES DA ORDEM
    // =========================================================================

    pub async fn create(
        &self,
        tenant_id: Uuid,
        ordem_servico_id: Uuid,
        dados: AdicionarExameOsPayload,
    ) -> Result<OrdemServicoExame, AppError> {
        let exame = OrdemServicoExame::novo(tenant_id, ordem_servico_id, dados);
        self.repo.insert(&exame).await?;
        tracing::info!("Exame {} adicionado à OS {}", exame.exame_id, ordem_servico_id);
        Ok(exame)
    }

    /// Urgentes primeiro.
    pub async fn find_by_ordem(&self, tenant_id: Uuid, ordem_servico_id: Uuid) -> Result<Vec<OrdemServicoExame>, AppError> {
        self.repo.list_by_ordem(tenant_id, ordem_servico_id).await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<OrdemServicoExame, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exame da OS com ID {} não encontrado", id)))
    }

    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        dados: AtualizarStatusOsPayload,
    ) -> Result<OrdemServicoExame, AppError> {
        let mut exame = self.find_one(tenant_id, id).await?;
        let anterior = exame.status;
        exame.mudar_status(dados);
        self.repo.update(&exame).await?;
        tracing::info!("Exame da OS {}: {:?} -> {:?}", id, anterior, exame.status);
        Ok(exame)
    }

    // =========================================================================
    //  RESULTADOS
    // =========================================================================

    pub async fn add_resultado(
        &self,
        tenant_id: Uuid,
        ordem_servico_exame_id: Uuid,
        dados: RegistrarResultadoPayload,
    ) -> Result<ResultadoExame, AppError> {
        let os_exame = self.find_one(tenant_id, ordem_servico_exame_id).await?;
        let resultado = ResultadoExame::novo(tenant_id, &os_exame, dados);
        self.repo.insert_resultado(&resultado).await?;
        if resultado.valor_critico {
            tracing::warn!("Resultado crítico {} no exame da OS {}", resultado.id, ordem_servico_exame_id);
        }
        tracing::info!("Resultado {} registrado ({})", resultado.id, resultado.parametro);
        Ok(resultado)
    }

    pub async fn list_resultados(
        &self,
        tenant_id: Uuid,
        ordem_servico_exame_id: Uuid,
    ) -> Result<Vec<ResultadoExame>, AppError> {
        self.find_one(tenant_id, ordem_servico_exame_id).await?;
        self.repo.list_resultados(tenant_id, ordem_servico_exame_id).await
    }

    pub async fn revisar_resultado(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        dados: RevisarResultadoPayload,
        usuario: Option<Uuid>,
    ) -> Result<ResultadoExame, AppError> {
        let mut resultado = self
            .repo
            .find_resultado(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resultado com ID {} não encontrado", id)))?;

        resultado.revisar(dados, usuario);
        self.repo.update_resultado(&resultado).await?;
        tracing::info!("Resultado {} revisado (versão {})", id, resultado.versao);
        Ok(resultado)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::MemoryStore, models::ordem_servico::StatusExameOs};

    fn servico() -> OrdemServicoService {
        OrdemServicoService::new(Arc::new(MemoryStore::default()))
    }

    fn adicionar(is_urgente: bool) -> AdicionarExameOsPayload {
        AdicionarExameOsPayload { exame_id: Uuid::new_v4(), is_urgente: Some(is_urgente), ..Default::default() }
    }

    fn status(status: StatusExameOs, usuario_id: Option<Uuid>) -> AtualizarStatusOsPayload {
        AtualizarStatusOsPayload { status, usuario_id, motivo: None, observacoes: None }
    }

    #[tokio::test]
    async fn urgentes_vem_primeiro() {
        let service = servico();
        let (tenant, ordem) = (Uuid::new_v4(), Uuid::new_v4());
        service.create(tenant, ordem, adicionar(false)).await.unwrap();
        let urgente = service.create(tenant, ordem, adicionar(true)).await.unwrap();

        let linhas = service.find_by_ordem(tenant, ordem).await.unwrap();
        assert_eq!(linhas.len(), 2);
        assert_eq!(linhas[0].id, urgente.id);
    }

    #[tokio::test]
    async fn coleta_carimba_data_e_coletor() {
        let service = servico();
        let tenant = Uuid::new_v4();
        let exame = service.create(tenant, Uuid::new_v4(), adicionar(false)).await.unwrap();
        assert!(exame.can_collect());

        let coletor = Uuid::new_v4();
        let coletado = service
            .update_status(tenant, exame.id, status(StatusExameOs::Coletado, Some(coletor)))
            .await
            .unwrap();
        assert!(coletado.is_coletado());
        assert!(coletado.data_coleta.is_some());
        assert_eq!(coletado.coletado_por, Some(coletor));
    }

    #[tokio::test]
    async fn repetir_marca_repeticao_com_motivo() {
        let service = servico();
        let tenant = Uuid::new_v4();
        let exame = service.create(tenant, Uuid::new_v4(), adicionar(false)).await.unwrap();

        let mut dados = status(StatusExameOs::Repetir, None);
        dados.motivo = Some("Amostra hemolisada".into());
        let repetir = service.update_status(tenant, exame.id, dados).await.unwrap();

        assert!(repetir.needs_repeat() && repetir.is_repeticao);
        assert_eq!(repetir.motivo_repeticao.as_deref(), Some("Amostra hemolisada"));
    }

    #[tokio::test]
    async fn revisao_persiste_historico() {
        let service = servico();
        let tenant = Uuid::new_v4();
        let exame = service.create(tenant, Uuid::new_v4(), adicionar(false)).await.unwrap();
        let resultado = service
            .add_resultado(
                tenant,
                exame.id,
                RegistrarResultadoPayload {
                    parametro: "Glicose".into(),
                    resultado: Some("90".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let revisado = service
            .revisar_resultado(
                tenant,
                resultado.id,
                RevisarResultadoPayload { resultado: Some("95".into()), ..Default::default() },
                None,
            )
            .await
            .unwrap();

        assert_eq!(revisado.versao, 2);
        let guardados = service.list_resultados(tenant, exame.id).await.unwrap();
        assert_eq!(guardados[0].versao, 2);
        assert_eq!(guardados[0].historico_versoes.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn resultado_de_exame_inexistente_retorna_not_found() {
        let service = servico();
        let err = service
            .add_resultado(
                Uuid::new_v4(),
                Uuid::new_v4(),
                RegistrarResultadoPayload { parametro: "X".into(), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
