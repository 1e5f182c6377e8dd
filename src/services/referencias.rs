// src/services/referencias.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ExameRepository, LaboratorioApoioRepository, TelemedicinaRepository},
};

/// Confere, dentro do tenant, os registros que um vínculo referencia antes da gravação.
#[derive(Clone)]
pub struct Referencias {
    exames: Arc<dyn ExameRepository>,
    laboratorios: Arc<dyn LaboratorioApoioRepository>,
    telemedicinas: Arc<dyn TelemedicinaRepository>,
}

impl Referencias {
    pub fn new(
        exames: Arc<dyn ExameRepository>,
        laboratorios: Arc<dyn LaboratorioApoioRepository>,
        telemedicinas: Arc<dyn TelemedicinaRepository>,
    ) -> Self {
        Self { exames, laboratorios, telemedicinas }
    }

    pub async fn exame(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.exames.find_by_id(tenant_id, id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Exame com ID {} não encontrado", id))),
        }
    }

    pub async fn laboratorio(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.laboratorios.find_by_id(tenant_id, id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Laboratório de apoio com ID {} não encontrado", id))),
        }
    }

    pub async fn telemedicina(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        match self.telemedicinas.find_by_id(tenant_id, id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Telemedicina com ID {} não encontrada", id))),
        }
    }

    /// Laboratório e telemedicina opcionais de um vínculo exame/unidade.
    pub async fn destino(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Option<Uuid>,
        telemedicina_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(id) = laboratorio_apoio_id {
            self.laboratorio(tenant_id, id).await?;
        }
        if let Some(id) = telemedicina_id {
            self.telemedicina(tenant_id, id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        exame_repo::MockExameRepository, laboratorio_apoio_repo::MockLaboratorioApoioRepository,
        telemedicina_repo::MockTelemedicinaRepository,
    };

    #[tokio::test]
    async fn laboratorio_de_outro_tenant_nao_e_encontrado() {
        let tenant = Uuid::new_v4();
        let laboratorio = Uuid::new_v4();

        let mut laboratorios = MockLaboratorioApoioRepository::new();
        laboratorios
            .expect_find_by_id()
            .withf(move |t, id| *t == tenant && *id == laboratorio)
            .times(1)
            .returning(|_, _| Ok(None));

        let refs = Referencias::new(
            Arc::new(MockExameRepository::new()),
            Arc::new(laboratorios),
            Arc::new(MockTelemedicinaRepository::new()),
        );

        let err = refs.destino(tenant, Some(laboratorio), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn destino_sem_referencias_nao_consulta_nada() {
        let refs = Referencias::new(
            Arc::new(MockExameRepository::new()),
            Arc::new(MockLaboratorioApoioRepository::new()),
            Arc::new(MockTelemedicinaRepository::new()),
        );
        assert!(refs.destino(Uuid::new_v4(), None, None).await.is_ok());
    }
}
