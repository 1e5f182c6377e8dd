// src/services/telemedicina_exame_service.rs

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ExameRepository, TelemedicinaExameRepository},
    models::{
        exame::{Exame, FiltroExames, StatusCadastro},
        telemedicina::{
            AtualizarTelemedicinaExamePayload, CriarTelemedicinaExamePayload, EstatisticasTelemedicinaExame,
            FiltroTelemedicinaExame, ResultadoVinculacao, TelemedicinaExame,
        },
    },
    services::referencias::Referencias,
};

const MSG_PAR_DUPLICADO: &str = "Já existe um vínculo entre esta telemedicina e este exame";

#[derive(Clone)]
pub struct TelemedicinaExameService {
    repo: Arc<dyn TelemedicinaExameRepository>,
    exames: Arc<dyn ExameRepository>,
    referencias: Referencias,
}

impl TelemedicinaExameService {
    pub fn new(
        repo: Arc<dyn TelemedicinaExameRepository>,
        exames: Arc<dyn ExameRepository>,
        referencias: Referencias,
    ) -> Self {
        Self { repo, exames, referencias }
    }

    async fn listar(&self, tenant_id: Uuid, filtro: FiltroTelemedicinaExame) -> Result<Vec<TelemedicinaExame>, AppError> {
        self.repo.list(tenant_id, &filtro).await
    }

    async fn exames_ativos(&self, tenant_id: Uuid) -> Result<Vec<Exame>, AppError> {
        let filtro = FiltroExames { status: Some(StatusCadastro::Ativo), ..Default::default() };
        let (exames, _) = self.exames.list(tenant_id, &filtro, None, 0).await?;
        Ok(exames)
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        dados: CriarTelemedicinaExamePayload,
    ) -> Result<TelemedicinaExame, AppError> {
        self.referencias.telemedicina(tenant_id, dados.telemedicina_id).await?;
        self.referencias.exame(tenant_id, dados.exame_id).await?;
        if self
            .repo
            .find_by_par(tenant_id, dados.telemedicina_id, dados.exame_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(MSG_PAR_DUPLICADO.into()));
        }

        let vinculo = TelemedicinaExame::novo(tenant_id, dados);
        self.repo.insert(&vinculo).await?;
        tracing::info!("Exame {} vinculado à telemedicina {}", vinculo.exame_id, vinculo.telemedicina_id);
        Ok(vinculo)
    }

    pub async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaExame>, AppError> {
        self.listar(tenant_id, FiltroTelemedicinaExame::default()).await
    }

    pub async fn find_by_telemedicina(&self, tenant_id: Uuid, telemedicina_id: Uuid) -> Result<Vec<TelemedicinaExame>, AppError> {
        self.listar(tenant_id, FiltroTelemedicinaExame { telemedicina_id: Some(telemedicina_id), ..Default::default() })
            .await
    }

    pub async fn find_by_exame(&self, tenant_id: Uuid, exame_id: Uuid) -> Result<Vec<TelemedicinaExame>, AppError> {
        self.listar(tenant_id, FiltroTelemedicinaExame { exame_id: Some(exame_id), ..Default::default() })
            .await
    }

    pub async fn find_ativos(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaExame>, AppError> {
        self.listar(tenant_id, FiltroTelemedicinaExame { ativo: Some(true), ..Default::default() })
            .await
    }

    /// Exames ativos ainda sem mapeamento nesta telemedicina, por nome.
    pub async fn find_sem_vinculo(&self, tenant_id: Uuid, telemedicina_id: Uuid) -> Result<Vec<Exame>, AppError> {
        let vinculados: HashSet<Uuid> = self
            .find_by_telemedicina(tenant_id, telemedicina_id)
            .await?
            .into_iter()
            .map(|v| v.exame_id)
            .collect();
        Ok(self
            .exames_ativos(tenant_id)
            .await?
            .into_iter()
            .filter(|e| !vinculados.contains(&e.id))
            .collect())
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<TelemedicinaExame, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vínculo telemedicina-exame com ID {} não encontrado", id)))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarTelemedicinaExamePayload,
    ) -> Result<TelemedicinaExame, AppError> {
        let mut vinculo = self.find_one(tenant_id, id).await?;

        let telemedicina_id = patch.telemedicina_id.unwrap_or(vinculo.telemedicina_id);
        let exame_id = patch.exame_id.unwrap_or(vinculo.exame_id);
        if telemedicina_id != vinculo.telemedicina_id {
            self.referencias.telemedicina(tenant_id, telemedicina_id).await?;
        }
        if exame_id != vinculo.exame_id {
            self.referencias.exame(tenant_id, exame_id).await?;
        }
        if (telemedicina_id, exame_id) != (vinculo.telemedicina_id, vinculo.exame_id) {
            let existente = self.repo.find_by_par(tenant_id, telemedicina_id, exame_id).await?;
            if existente.is_some_and(|e| e.id != id) {
                return Err(AppError::Conflict(MSG_PAR_DUPLICADO.into()));
            }
        }

        vinculo.aplicar(patch);
        self.repo.update(&vinculo).await?;
        tracing::info!("Vínculo telemedicina-exame {} atualizado", id);
        Ok(vinculo)
    }

    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Vínculo telemedicina-exame com ID {} não encontrado", id)));
        }
        tracing::info!("Vínculo telemedicina-exame {} removido", id);
        Ok(())
    }

    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<TelemedicinaExame, AppError> {
        let mut vinculo = self.find_one(tenant_id, id).await?;
        vinculo.ativo = !vinculo.ativo;
        vinculo.updated_at = chrono::Utc::now();
        self.repo.update(&vinculo).await?;
        Ok(vinculo)
    }

    /// Mapeia cada exame ativo sem vínculo com o próprio código, nome e categoria.
    /// Falhas individuais são ignoradas.
    pub async fn vincular_automaticamente(
        &self,
        tenant_id: Uuid,
        telemedicina_id: Uuid,
    ) -> Result<ResultadoVinculacao, AppError> {
        self.referencias.telemedicina(tenant_id, telemedicina_id).await?;
        let pendentes = self.find_sem_vinculo(tenant_id, telemedicina_id).await?;
        let total = pendentes.len();
        let mut vinculados = 0;

        for exame in pendentes {
            let dados = CriarTelemedicinaExamePayload {
                telemedicina_id,
                exame_id: exame.id,
                codigo_telemedicina: Some(exame.codigo_interno),
                nome_exame_telemedicina: Some(exame.nome),
                categoria_telemedicina: serde_json::to_value(exame.categoria)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_owned)),
                ativo: Some(true),
                ..Default::default()
            };
            match self.create(tenant_id, dados).await {
                Ok(_) => vinculados += 1,
                Err(e) => tracing::warn!("Exame {} não vinculado automaticamente: {}", exame.id, e),
            }
        }

        tracing::info!("Vinculação automática na telemedicina {}: {}/{}", telemedicina_id, vinculados, total);
        Ok(ResultadoVinculacao { vinculados, total })
    }

    /// Procura nos campos do mapeamento e no nome ou código do exame.
    pub async fn search(
        &self,
        tenant_id: Uuid,
        telemedicina_id: Uuid,
        termo: &str,
    ) -> Result<Vec<TelemedicinaExame>, AppError> {
        let vinculos = self.find_by_telemedicina(tenant_id, telemedicina_id).await?;
        let ids: Vec<Uuid> = vinculos.iter().map(|v| v.exame_id).collect();
        let filtro = FiltroExames { ids: Some(ids), ..Default::default() };
        let (exames, _) = self.exames.list(tenant_id, &filtro, None, 0).await?;
        let exames: HashMap<Uuid, Exame> = exames.into_iter().map(|e| (e.id, e)).collect();

        let minusculo = termo.to_lowercase();
        let mut encontrados: Vec<TelemedicinaExame> = vinculos
            .into_iter()
            .filter(|v| {
                v.contem(termo)
                    || exames.get(&v.exame_id).is_some_and(|e| {
                        e.nome.to_lowercase().contains(&minusculo) || e.codigo_interno.to_lowercase().contains(&minusculo)
                    })
            })
            .collect();
        encontrados.sort_by(|a, b| {
            let nome = |v: &TelemedicinaExame| exames.get(&v.exame_id).map(|e| e.nome.clone());
            nome(a).cmp(&nome(b))
        });
        Ok(encontrados)
    }

    pub async fn get_estatisticas(
        &self,
        tenant_id: Uuid,
        telemedicina_id: Option<Uuid>,
    ) -> Result<EstatisticasTelemedicinaExame, AppError> {
        let vinculos = self
            .listar(tenant_id, FiltroTelemedicinaExame { telemedicina_id, ..Default::default() })
            .await?;
        let ativos = vinculos.iter().filter(|v| v.ativo).count();
        Ok(EstatisticasTelemedicinaExame {
            total: vinculos.len(),
            ativos,
            inativos: vinculos.len() - ativos,
            com_upload_imagem: vinculos.iter().filter(|v| v.permite_upload_imagem).count(),
            requer_especialista: vinculos.iter().filter(|v| v.requer_especialista).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryStore,
        models::exame::{CategoriaExame, CriarExamePayload},
    };

    struct Cenario {
        store: Arc<MemoryStore>,
        service: TelemedicinaExameService,
        tenant: Uuid,
        telemedicina: Uuid,
    }

    fn cenario() -> Cenario {
        let store = Arc::new(MemoryStore::default());
        let tenant = Uuid::new_v4();
        let telemedicina = store.semear_telemedicina(tenant, "TELE01");
        let referencias = Referencias::new(store.clone(), store.clone(), store.clone());
        Cenario {
            service: TelemedicinaExameService::new(store.clone(), store.clone(), referencias),
            store,
            tenant,
            telemedicina,
        }
    }

    async fn exame(c: &Cenario, codigo: &str, nome: &str, ativo: bool) -> Exame {
        let mut exame = Exame::novo(
            c.tenant,
            CriarExamePayload { codigo_interno: codigo.into(), nome: nome.into(), ..Default::default() },
            None,
        );
        exame.categoria = CategoriaExame::Imagem;
        if !ativo {
            exame.status = StatusCadastro::Inativo;
        }
        ExameRepository::insert(c.store.as_ref(), &exame, &[]).await.unwrap();
        exame
    }

    fn vinculo(telemedicina_id: Uuid, exame_id: Uuid) -> CriarTelemedicinaExamePayload {
        CriarTelemedicinaExamePayload { telemedicina_id, exame_id, ..Default::default() }
    }

    #[tokio::test]
    async fn par_duplicado_gera_conflito() {
        let c = cenario();
        let e = exame(&c, "RX01", "Raio-X de tórax", true).await;
        c.service.create(c.tenant, vinculo(c.telemedicina, e.id)).await.unwrap();

        let err = c.service.create(c.tenant, vinculo(c.telemedicina, e.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_PAR_DUPLICADO));
    }

    #[tokio::test]
    async fn vinculacao_automatica_cobre_apenas_ativos_sem_vinculo() {
        let c = cenario();
        let ja_vinculado = exame(&c, "RX01", "Raio-X de tórax", true).await;
        exame(&c, "TC01", "Tomografia de crânio", true).await;
        exame(&c, "US01", "Ultrassom abdominal", true).await;
        exame(&c, "OLD", "Exame descontinuado", false).await;
        c.service.create(c.tenant, vinculo(c.telemedicina, ja_vinculado.id)).await.unwrap();

        let resultado = c.service.vincular_automaticamente(c.tenant, c.telemedicina).await.unwrap();

        assert_eq!(resultado, ResultadoVinculacao { vinculados: 2, total: 2 });
        let vinculos = c.service.find_by_telemedicina(c.tenant, c.telemedicina).await.unwrap();
        assert_eq!(vinculos.len(), 3);
        let tomografia = vinculos.iter().find(|v| v.codigo_telemedicina.as_deref() == Some("TC01")).unwrap();
        assert_eq!(tomografia.nome_exame_telemedicina.as_deref(), Some("Tomografia de crânio"));
        assert_eq!(tomografia.categoria_telemedicina.as_deref(), Some("imagem"));
        assert!(c.service.find_sem_vinculo(c.tenant, c.telemedicina).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trocar_exame_para_par_existente_gera_conflito() {
        let c = cenario();
        let a = exame(&c, "A", "Exame A", true).await;
        let b = exame(&c, "B", "Exame B", true).await;
        let v = c.service.create(c.tenant, vinculo(c.telemedicina, a.id)).await.unwrap();
        c.service.create(c.tenant, vinculo(c.telemedicina, b.id)).await.unwrap();

        let patch = AtualizarTelemedicinaExamePayload { exame_id: Some(b.id), ..Default::default() };
        assert!(matches!(c.service.update(c.tenant, v.id, patch).await, Err(AppError::Conflict(_))));

        let patch = AtualizarTelemedicinaExamePayload { exame_id: Some(a.id), ..Default::default() };
        assert!(c.service.update(c.tenant, v.id, patch).await.is_ok());
    }

    #[tokio::test]
    async fn busca_considera_nome_do_exame() {
        let c = cenario();
        let rx = exame(&c, "RX01", "Raio-X de tórax", true).await;
        let tc = exame(&c, "TC01", "Tomografia de crânio", true).await;
        c.service.create(c.tenant, vinculo(c.telemedicina, rx.id)).await.unwrap();
        c.service.create(c.tenant, vinculo(c.telemedicina, tc.id)).await.unwrap();

        let achados = c.service.search(c.tenant, c.telemedicina, "tomografia").await.unwrap();
        assert_eq!(achados.len(), 1);
        assert_eq!(achados[0].exame_id, tc.id);
    }

    #[tokio::test]
    async fn estatisticas_por_telemedicina() {
        let c = cenario();
        let a = exame(&c, "A", "Exame A", true).await;
        let b = exame(&c, "B", "Exame B", true).await;
        let mut dados = vinculo(c.telemedicina, a.id);
        dados.permite_upload_imagem = Some(true);
        c.service.create(c.tenant, dados).await.unwrap();
        let outro = c.service.create(c.tenant, vinculo(c.telemedicina, b.id)).await.unwrap();
        c.service.toggle_status(c.tenant, outro.id).await.unwrap();
        let outra_tele = c.store.semear_telemedicina(c.tenant, "TELE02");
        c.service.create(c.tenant, vinculo(outra_tele, a.id)).await.unwrap();

        let stats = c.service.get_estatisticas(c.tenant, Some(c.telemedicina)).await.unwrap();
        assert_eq!((stats.total, stats.ativos, stats.inativos, stats.com_upload_imagem), (2, 1, 1, 1));
        assert_eq!(c.service.get_estatisticas(c.tenant, None).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn telemedicina_ou_exame_inexistente_retorna_not_found() {
        let c = cenario();
        let e = exame(&c, "RX01", "Raio-X de tórax", true).await;
        let alheia = c.store.semear_telemedicina(Uuid::new_v4(), "TELE99");

        for dados in [vinculo(Uuid::new_v4(), e.id), vinculo(alheia, e.id), vinculo(c.telemedicina, Uuid::new_v4())] {
            assert!(matches!(c.service.create(c.tenant, dados).await, Err(AppError::NotFound(_))));
        }
        assert!(c.store.telemedicina_exames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn vinculacao_automatica_exige_telemedicina_do_tenant() {
        let c = cenario();
        exame(&c, "RX01", "Raio-X de tórax", true).await;
        assert!(matches!(
            c.service.vincular_automaticamente(c.tenant, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
