// src/services/formulario_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{formulario_repo::MSG_CODIGO_DUPLICADO, FormularioRepository},
    models::formulario::{
        AtualizarFormularioPayload, CriarFormularioPayload, EstatisticasFormularios, FiltroFormularios, Formulario,
        ResultadoValidacao, StatusFormulario,
    },
};

#[derive(Clone)]
pub struct FormularioService {
    repo: Arc<dyn FormularioRepository>,
}

impl FormularioService {
    pub fn new(repo: Arc<dyn FormularioRepository>) -> Self {
        Self { repo }
    }

    async fn garantir_codigo_livre(&self, tenant_id: Uuid, codigo: &str, proprio: Option<Uuid>) -> Result<(), AppError> {
        match self.repo.find_by_codigo(tenant_id, codigo).await? {
            Some(existente) if Some(existente.id) != proprio => {
                tracing::warn!("Código de formulário duplicado: {}", codigo);
                Err(AppError::Conflict(MSG_CODIGO_DUPLICADO.into()))
            }
            _ => Ok(()),
        }
    }

    /// Nasce em rascunho, versão 1.
    pub async fn create(&self, tenant_id: Uuid, dados: CriarFormularioPayload) -> Result<Formulario, AppError> {
        self.garantir_codigo_livre(tenant_id, &dados.codigo_formulario, None).await?;

        let formulario = Formulario::novo(tenant_id, dados);
        self.repo.insert(&formulario).await?;

        tracing::info!("Formulário {} ({}) criado", formulario.id, formulario.codigo_formulario);
        Ok(formulario)
    }

    pub async fn find_all(&self, tenant_id: Uuid, filtro: &FiltroFormularios) -> Result<Vec<Formulario>, AppError> {
        self.repo.list(tenant_id, filtro).await
    }

    pub async fn find_ativos(&self, tenant_id: Uuid) -> Result<Vec<Formulario>, AppError> {
        let filtro = FiltroFormularios { ativo: Some(true), ..Default::default() };
        self.repo.list(tenant_id, &filtro).await
    }

    /// Publicados e ativos.
    pub async fn find_publicados(&self, tenant_id: Uuid) -> Result<Vec<Formulario>, AppError> {
        let filtro = FiltroFormularios {
            status: Some(StatusFormulario::Publicado),
            ativo: Some(true),
            ..Default::default()
        };
        self.repo.list(tenant_id, &filtro).await
    }

    pub async fn search(&self, tenant_id: Uuid, termo: &str) -> Result<Vec<Formulario>, AppError> {
        let filtro = FiltroFormularios { busca: Some(termo.to_string()), ..Default::default() };
        self.repo.list(tenant_id, &filtro).await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<Formulario, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Formulário com ID {} não encontrado", id)))
    }

    pub async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Formulario, AppError> {
        self.repo
            .find_by_codigo(tenant_id, codigo)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Formulário com código {} não encontrado", codigo)))
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, patch: AtualizarFormularioPayload) -> Result<Formulario, AppError> {
        let mut formulario = self.find_one(tenant_id, id).await?;
        if let Some(codigo) = patch.codigo_formulario.as_deref().filter(|c| *c != formulario.codigo_formulario) {
            self.garantir_codigo_livre(tenant_id, codigo, Some(id)).await?;
        }

        formulario.aplicar(patch);
        self.repo.update(&formulario).await?;
        tracing::info!("Formulário {} atualizado", id);
        Ok(formulario)
    }

    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<Formulario, AppError> {
        let mut formulario = self.find_one(tenant_id, id).await?;
        formulario.ativo = !formulario.ativo;
        formulario.updated_at = Utc::now();
        self.repo.update(&formulario).await?;
        Ok(formulario)
    }

    /// Troca direta de status, sem as regras de publicação.
    pub async fn update_status(&self, tenant_id: Uuid, id: Uuid, status: StatusFormulario) -> Result<Formulario, AppError> {
        let mut formulario = self.find_one(tenant_id, id).await?;
        formulario.status = status;
        formulario.updated_at = Utc::now();
        self.repo.update(&formulario).await?;
        Ok(formulario)
    }

    /// Exige ao menos um campo; publicar também reativa o formulário.
    pub async fn publicar(&self, tenant_id: Uuid, id: Uuid) -> Result<Formulario, AppError> {
        let mut formulario = self.find_one(tenant_id, id).await?;
        if formulario.publicado() {
            return Err(AppError::BadRequest("Formulário já está publicado".into()));
        }
        if formulario.campos.is_empty() {
            return Err(AppError::BadRequest("Não é possível publicar formulário sem campos".into()));
        }

        let agora = Utc::now();
        formulario.status = StatusFormulario::Publicado;
        formulario.ativo = true;
        formulario.data_publicacao = Some(agora);
        formulario.updated_at = agora;
        self.repo.update(&formulario).await?;

        tracing::info!("Formulário {} publicado (versão {})", id, formulario.versao);
        Ok(formulario)
    }

    pub async fn criar_versao(&self, tenant_id: Uuid, id: Uuid) -> Result<Formulario, AppError> {
        let original = self.find_one(tenant_id, id).await?;
        let nova = original.nova_versao();
        self.garantir_codigo_livre(tenant_id, &nova.codigo_formulario, None).await?;

        self.repo.insert(&nova).await?;
        tracing::info!("Versão {} do formulário {} criada como {}", nova.versao, id, nova.id);
        Ok(nova)
    }

    /// Publicados não podem ser excluídos.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let formulario = self.find_one(tenant_id, id).await?;
        if formulario.publicado() {
            return Err(AppError::BadRequest("Não é possível excluir formulário publicado".into()));
        }
        self.repo.delete(tenant_id, id).await?;
        tracing::info!("Formulário {} removido", id);
        Ok(())
    }

    pub async fn validar(&self, tenant_id: Uuid, id: Uuid) -> Result<ResultadoValidacao, AppError> {
        Ok(self.find_one(tenant_id, id).await?.validar())
    }

    pub async fn estatisticas(&self, tenant_id: Uuid) -> Result<EstatisticasFormularios, AppError> {
        let todos = self.repo.list(tenant_id, &FiltroFormularios::default()).await?;
        Ok(EstatisticasFormularios::de(&todos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{formulario_repo::MockFormularioRepository, memory::MemoryStore},
        models::formulario::{
            fixtures::{campo, criar_formulario},
            TipoFormulario,
        },
    };

    fn servico() -> (Arc<MemoryStore>, FormularioService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), FormularioService::new(store))
    }

    #[tokio::test]
    async fn codigo_repetido_no_mesmo_tenant_gera_conflito() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, criar_formulario("ANAMNESE", vec![])).await.unwrap();

        let err = service.create(tenant, criar_formulario("ANAMNESE", vec![])).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_CODIGO_DUPLICADO));
        assert!(service.create(Uuid::new_v4(), criar_formulario("ANAMNESE", vec![])).await.is_ok());
        assert_eq!(store.formularios.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn publicar_exige_campos_e_nao_repete() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let vazio = service.create(tenant, criar_formulario("VAZIO", vec![])).await.unwrap();
        let err = service.publicar(tenant, vazio.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Não é possível publicar formulário sem campos"));

        let mut dados = criar_formulario("LAUDO", vec![campo("conclusao", true)]);
        dados.ativo = Some(false);
        let laudo = service.create(tenant, dados).await.unwrap();

        let publicado = service.publicar(tenant, laudo.id).await.unwrap();
        assert_eq!(publicado.status, StatusFormulario::Publicado);
        assert!(publicado.ativo);
        assert!(publicado.data_publicacao.is_some());
        assert_eq!(service.find_publicados(tenant).await.unwrap().len(), 1);

        let err = service.publicar(tenant, laudo.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Formulário já está publicado"));
    }

    #[tokio::test]
    async fn publicado_nao_pode_ser_removido() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        let f = service.create(tenant, criar_formulario("LAUDO", vec![campo("conclusao", true)])).await.unwrap();
        service.publicar(tenant, f.id).await.unwrap();

        assert!(matches!(service.remove(tenant, f.id).await, Err(AppError::BadRequest(_))));

        service.update_status(tenant, f.id, StatusFormulario::Arquivado).await.unwrap();
        service.remove(tenant, f.id).await.unwrap();
        assert!(store.formularios.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nova_versao_e_gravada_em_rascunho() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let f = service.create(tenant, criar_formulario("LAUDO", vec![campo("conclusao", true)])).await.unwrap();
        service.publicar(tenant, f.id).await.unwrap();

        let v2 = service.criar_versao(tenant, f.id).await.unwrap();

        assert_eq!(service.find_by_codigo(tenant, "LAUDO_V2").await.unwrap().id, v2.id);
        assert_eq!(v2.formulario_pai_id, Some(f.id));
        assert_eq!(v2.status, StatusFormulario::Rascunho);
        assert_eq!(service.find_one(tenant, f.id).await.unwrap().status, StatusFormulario::Publicado);
        assert!(matches!(service.criar_versao(tenant, f.id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_troca_campos_e_confere_codigo() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let a = service.create(tenant, criar_formulario("A", vec![])).await.unwrap();
        service.create(tenant, criar_formulario("B", vec![])).await.unwrap();

        let patch = AtualizarFormularioPayload { codigo_formulario: Some("B".into()), ..Default::default() };
        assert!(matches!(service.update(tenant, a.id, patch).await, Err(AppError::Conflict(_))));

        let patch = AtualizarFormularioPayload {
            codigo_formulario: Some("A".into()),
            campos: Some(vec![campo("peso", true), campo("peso", false)]),
            ..Default::default()
        };
        let atualizado = service.update(tenant, a.id, patch).await.unwrap();
        assert_eq!(atualizado.campos.len(), 2);

        let validacao = service.validar(tenant, a.id).await.unwrap();
        assert!(!validacao.valido);
        assert_eq!(validacao.erros, vec!["Códigos de campos duplicados: peso".to_string()]);
    }

    #[tokio::test]
    async fn filtros_busca_e_estatisticas() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let mut dados = criar_formulario("TCLE", vec![campo("aceite", true)]);
        dados.tipo = Some(TipoFormulario::TermoConsentimento);
        dados.descricao = Some("Termo de consentimento para coleta".into());
        let tcle = service.create(tenant, dados).await.unwrap();
        service.create(tenant, criar_formulario("ANAMNESE", vec![])).await.unwrap();
        service.toggle_status(tenant, tcle.id).await.unwrap();

        assert_eq!(service.search(tenant, "coleta").await.unwrap().len(), 1);
        assert_eq!(service.find_ativos(tenant).await.unwrap()[0].codigo_formulario, "ANAMNESE");
        let por_tipo = FiltroFormularios { tipo: Some(TipoFormulario::TermoConsentimento), ..Default::default() };
        assert_eq!(service.find_all(tenant, &por_tipo).await.unwrap()[0].id, tcle.id);

        let stats = service.estatisticas(tenant).await.unwrap();
        assert_eq!((stats.total, stats.ativos, stats.inativos, stats.publicados), (2, 1, 1, 0));
        assert_eq!(stats.por_tipo.get("termo_consentimento"), Some(&1));
    }

    #[tokio::test]
    async fn formulario_inexistente_nao_chega_a_gravar() {
        let mut repo = MockFormularioRepository::new();
        repo.expect_find_by_id().returning(|_, _| Ok(None));
        repo.expect_update().never();
        repo.expect_delete().never();
        let service = FormularioService::new(Arc::new(repo));

        let tenant = Uuid::new_v4();
        assert!(matches!(service.publicar(tenant, Uuid::new_v4()).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.remove(tenant, Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }
}
