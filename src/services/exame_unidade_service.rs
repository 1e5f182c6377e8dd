// src/services/exame_unidade_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ExameUnidadeRepository,
    models::exame_unidade::{AtualizarUnidadePayload, DestinoExame, ExameUnidade, VincularUnidadePayload},
    services::referencias::Referencias,
};

// ---
// Regra de destino: cada destino exige ou proíbe laboratório de apoio e telemedicina.
// ---
pub fn validar_destino(
    destino: DestinoExame,
    laboratorio_apoio_id: Option<Uuid>,
    telemedicina_id: Option<Uuid>,
) -> Result<(), AppError> {
    let erro = |msg: &str| Err(AppError::BadRequest(msg.to_string()));
    match destino {
        DestinoExame::Interno => {
            if laboratorio_apoio_id.is_some() {
                return erro("Destino INTERNO não permite selecionar laboratório de apoio");
            }
            if telemedicina_id.is_some() {
                return erro("Destino INTERNO não permite selecionar telemedicina");
            }
        }
        DestinoExame::Apoio => {
            if laboratorio_apoio_id.is_none() {
                return erro("Destino APOIO requer seleção de laboratório de apoio");
            }
            if telemedicina_id.is_some() {
                return erro("Destino APOIO não permite selecionar telemedicina");
            }
        }
        DestinoExame::Telemedicina => {
            if telemedicina_id.is_none() {
                return erro("Destino TELEMEDICINA requer seleção de telemedicina");
            }
            if laboratorio_apoio_id.is_some() {
                return erro("Destino TELEMEDICINA não permite selecionar laboratório de apoio");
            }
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ExameUnidadeService {
    referencias: Referencias,
    vinculos: Arc<dyn ExameUnidadeRepository>,
}

impl ExameUnidadeService {
    pub fn new(referencias: Referencias, vinculos: Arc<dyn ExameUnidadeRepository>) -> Self {
        Self { referencias, vinculos }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        dados: VincularUnidadePayload,
    ) -> Result<ExameUnidade, AppError> {
        validar_destino(
            dados.destino.unwrap_or_default(),
            dados.laboratorio_apoio_id,
            dados.telemedicina_id,
        )?;

        self.referencias.exame(tenant_id, exame_id).await?;
        self.referencias
            .destino(tenant_id, dados.laboratorio_apoio_id, dados.telemedicina_id)
            .await?;

        if self.vinculos.find_by_par(tenant_id, exame_id, dados.unidade_id).await?.is_some() {
            tracing::warn!("Vínculo duplicado: exame {} / unidade {}", exame_id, dados.unidade_id);
            return Err(AppError::Conflict("Exame já vinculado a esta unidade".into()));
        }

        let vinculo = ExameUnidade::novo(tenant_id, exame_id, dados);
        self.vinculos.insert(&vinculo).await?;
        tracing::info!("Exame {} vinculado à unidade {}", exame_id, vinculo.unidade_id);
        Ok(vinculo)
    }

    pub async fn find_by_exame(&self, tenant_id: Uuid, exame_id: Uuid) -> Result<Vec<ExameUnidade>, AppError> {
        self.vinculos.list_by_exame(tenant_id, exame_id).await
    }

    pub async fn find_by_unidade(&self, tenant_id: Uuid, unidade_id: Uuid) -> Result<Vec<ExameUnidade>, AppError> {
        self.vinculos.list_by_unidade(tenant_id, unidade_id).await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<ExameUnidade, AppError> {
        self.vinculos
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vínculo com ID {} não encontrado", id)))
    }

    /// Campos ausentes mantêm o valor gravado; a regra de destino vale para o resultado da mescla.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarUnidadePayload,
    ) -> Result<ExameUnidade, AppError> {
        let mut vinculo = self.find_one(tenant_id, id).await?;

        let destino = patch.destino.unwrap_or(vinculo.destino);
        let laboratorio = patch.laboratorio_apoio_id.unwrap_or(vinculo.laboratorio_apoio_id);
        let telemedicina = patch.telemedicina_id.unwrap_or(vinculo.telemedicina_id);
        if patch.altera_destino() {
            validar_destino(destino, laboratorio, telemedicina)?;
            self.referencias.destino(tenant_id, laboratorio, telemedicina).await?;
        }

        vinculo.destino = destino;
        vinculo.laboratorio_apoio_id = laboratorio;
        vinculo.telemedicina_id = telemedicina;
        if let Some(ativo) = patch.ativo {
            vinculo.ativo = ativo;
        }
        vinculo.updated_at = chrono::Utc::now();

        self.vinculos.update(&vinculo).await?;
        tracing::info!("Vínculo exame/unidade {} atualizado", id);
        Ok(vinculo)
    }

    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.vinculos.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Vínculo com ID {} não encontrado", id)));
        }
        tracing::info!("Vínculo exame/unidade {} removido", id);
        Ok(())
    }

    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<ExameUnidade, AppError> {
        let mut vinculo = self.find_one(tenant_id, id).await?;
        vinculo.ativo = !vinculo.ativo;
        vinculo.updated_at = chrono::Utc::now();
        self.vinculos.update(&vinculo).await?;
        Ok(vinculo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory::MemoryStore, ExameRepository},
        models::exame::{CriarExamePayload, Exame},
    };
    use rstest::rstest;

    const MSG_APOIO_SEM_LAB: &str = "Destino APOIO requer seleção de laboratório de apoio";

    #[rstest]
    #[case(DestinoExame::Interno, false, false, None)]
    #[case(DestinoExame::Interno, true, false, Some("Destino INTERNO não permite selecionar laboratório de apoio"))]
    #[case(DestinoExame::Interno, false, true, Some("Destino INTERNO não permite selecionar telemedicina"))]
    #[case(DestinoExame::Apoio, true, false, None)]
    #[case(DestinoExame::Apoio, false, false, Some(MSG_APOIO_SEM_LAB))]
    #[case(DestinoExame::Apoio, true, true, Some("Destino APOIO não permite selecionar telemedicina"))]
    #[case(DestinoExame::Telemedicina, false, true, None)]
    #[case(DestinoExame::Telemedicina, false, false, Some("Destino TELEMEDICINA requer seleção de telemedicina"))]
    #[case(DestinoExame::Telemedicina, true, true, Some("Destino TELEMEDICINA não permite selecionar laboratório de apoio"))]
    fn regra_de_destino(
        #[case] destino: DestinoExame,
        #[case] com_lab: bool,
        #[case] com_tele: bool,
        #[case] esperado: Option<&str>,
    ) {
        let lab = com_lab.then(Uuid::new_v4);
        let tele = com_tele.then(Uuid::new_v4);
        match (validar_destino(destino, lab, tele), esperado) {
            (Ok(()), None) => {}
            (Err(AppError::BadRequest(msg)), Some(esperado)) => assert_eq!(msg, esperado),
            (outro, _) => panic!("resultado inesperado: {:?}", outro),
        }
    }

    async fn cenario() -> (Arc<MemoryStore>, ExameUnidadeService, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::default());
        let tenant = Uuid::new_v4();
        let exame = Exame::novo(
            tenant,
            CriarExamePayload { codigo_interno: "GLI001".into(), nome: "Glicose".into(), ..Default::default() },
            None,
        );
        ExameRepository::insert(store.as_ref(), &exame, &[]).await.unwrap();
        let referencias = Referencias::new(store.clone(), store.clone(), store.clone());
        let service = ExameUnidadeService::new(referencias, store.clone());
        (store, service, tenant, exame.id)
    }

    fn vincular(unidade_id: Uuid) -> VincularUnidadePayload {
        VincularUnidadePayload {
            unidade_id,
            destino: None,
            laboratorio_apoio_id: None,
            telemedicina_id: None,
            ativo: None,
        }
    }

    #[tokio::test]
    async fn vinculo_duplicado_gera_conflito() {
        let (store, service, tenant, exame_id) = cenario().await;
        let unidade = Uuid::new_v4();

        let criado = service.create(tenant, exame_id, vincular(unidade)).await.unwrap();
        assert_eq!(criado.destino, DestinoExame::Interno);

        let err = service.create(tenant, exame_id, vincular(unidade)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.exames_unidades.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn apoio_sem_laboratorio_e_rejeitado_antes_de_gravar() {
        let (store, service, tenant, exame_id) = cenario().await;
        let mut dados = vincular(Uuid::new_v4());
        dados.destino = Some(DestinoExame::Apoio);

        let err = service.create(tenant, exame_id, dados).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == MSG_APOIO_SEM_LAB));
        assert!(store.exames_unidades.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exame_inexistente_retorna_not_found() {
        let (_, service, tenant, _) = cenario().await;
        let err = service.create(tenant, Uuid::new_v4(), vincular(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn laboratorio_inexistente_retorna_not_found_sem_gravar() {
        let (store, service, tenant, exame_id) = cenario().await;
        let mut dados = vincular(Uuid::new_v4());
        dados.destino = Some(DestinoExame::Apoio);
        dados.laboratorio_apoio_id = Some(Uuid::new_v4());

        let err = service.create(tenant, exame_id, dados).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.starts_with("Laboratório de apoio")));
        assert!(store.exames_unidades.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn laboratorio_de_outro_tenant_nao_serve_de_destino() {
        let (store, service, tenant, exame_id) = cenario().await;
        let lab_alheio = store.semear_laboratorio(Uuid::new_v4(), "LAB99");
        let mut dados = vincular(Uuid::new_v4());
        dados.destino = Some(DestinoExame::Apoio);
        dados.laboratorio_apoio_id = Some(lab_alheio);

        assert!(matches!(service.create(tenant, exame_id, dados).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_para_telemedicina_inexistente_retorna_not_found() {
        let (_, service, tenant, exame_id) = cenario().await;
        let vinculo = service.create(tenant, exame_id, vincular(Uuid::new_v4())).await.unwrap();

        let patch = AtualizarUnidadePayload {
            destino: Some(DestinoExame::Telemedicina),
            telemedicina_id: Some(Some(Uuid::new_v4())),
            ..Default::default()
        };
        assert!(matches!(service.update(tenant, vinculo.id, patch).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_valida_a_mescla_com_o_valor_gravado() {
        let (store, service, tenant, exame_id) = cenario().await;
        let lab = store.semear_laboratorio(tenant, "LAB01");
        let mut dados = vincular(Uuid::new_v4());
        dados.destino = Some(DestinoExame::Apoio);
        dados.laboratorio_apoio_id = Some(lab);
        let vinculo = service.create(tenant, exame_id, dados).await.unwrap();

        // Telemedicina sem limpar o laboratório gravado
        let patch = AtualizarUnidadePayload {
            destino: Some(DestinoExame::Telemedicina),
            telemedicina_id: Some(Some(store.semear_telemedicina(tenant, "TELE01"))),
            ..Default::default()
        };
        assert!(matches!(
            service.update(tenant, vinculo.id, patch).await,
            Err(AppError::BadRequest(_))
        ));

        // Limpando o laboratório com null explícito
        let tele = store.semear_telemedicina(tenant, "TELE02");
        let patch = AtualizarUnidadePayload {
            destino: Some(DestinoExame::Telemedicina),
            laboratorio_apoio_id: Some(None),
            telemedicina_id: Some(Some(tele)),
            ..Default::default()
        };
        let atualizado = service.update(tenant, vinculo.id, patch).await.unwrap();
        assert_eq!(atualizado.laboratorio_apoio_id, None);
        assert_eq!(atualizado.telemedicina_id, Some(tele));
    }

    #[tokio::test]
    async fn toggle_duas_vezes_restaura_o_valor() {
        let (_, service, tenant, exame_id) = cenario().await;
        let vinculo = service.create(tenant, exame_id, vincular(Uuid::new_v4())).await.unwrap();

        assert!(!service.toggle_status(tenant, vinculo.id).await.unwrap().ativo);
        assert!(service.toggle_status(tenant, vinculo.id).await.unwrap().ativo);
    }

    #[tokio::test]
    async fn remove_apaga_e_segunda_remocao_nao_encontra() {
        let (_, service, tenant, exame_id) = cenario().await;
        let vinculo = service.create(tenant, exame_id, vincular(Uuid::new_v4())).await.unwrap();

        service.remove(tenant, vinculo.id).await.unwrap();
        assert!(matches!(service.remove(tenant, vinculo.id).await, Err(AppError::NotFound(_))));
    }
}
