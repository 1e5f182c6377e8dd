// src/services/categoria_service.rs

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CategoriaRepository, PrestadorRepository},
    models::prestador::{
        AtualizarCategoriaPayload, CriarCategoriaPayload, EstatisticaTipo, EstatisticasCategoriasPrestador,
        FiltroCategorias, ImportarCategoriaItem, PorTipoPrestador, PrestadorDaCategoria,
        PrestadorServicoCategoria, ResumoCategoriasPrestador, TipoServicoCategoria,
    },
};

#[derive(Clone)]
pub struct CategoriaService {
    repo: Arc<dyn CategoriaRepository>,
    prestadores: Arc<dyn PrestadorRepository>,
}

impl CategoriaService {
    pub fn new(repo: Arc<dyn CategoriaRepository>, prestadores: Arc<dyn PrestadorRepository>) -> Self {
        Self { repo, prestadores }
    }

    async fn garantir_prestador(&self, tenant_id: Uuid, prestador_id: Uuid) -> Result<(), AppError> {
        if self.prestadores.find_by_id(tenant_id, prestador_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Prestador {} não encontrado", prestador_id)));
        }
        Ok(())
    }

    async fn listar(&self, tenant_id: Uuid, filtro: FiltroCategorias) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.repo.list(tenant_id, &filtro).await
    }

    pub async fn create(&self, tenant_id: Uuid, dados: CriarCategoriaPayload) -> Result<PrestadorServicoCategoria, AppError> {
        self.garantir_prestador(tenant_id, dados.prestador_servico_id).await?;

        if self
            .repo
            .find_by_par(tenant_id, dados.prestador_servico_id, dados.tipo_servico)
            .await?
            .is_some()
        {
            tracing::warn!("Categoria {} repetida no prestador {}", dados.tipo_servico, dados.prestador_servico_id);
            return Err(AppError::Conflict(format!(
                "Categoria {} já existe para este prestador",
                dados.tipo_servico
            )));
        }

        let categoria = PrestadorServicoCategoria::nova(tenant_id, dados);
        self.repo.insert(&categoria).await?;
        tracing::info!("Categoria {} criada", categoria.id);
        Ok(categoria)
    }

    pub async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.listar(tenant_id, FiltroCategorias::default()).await
    }

    pub async fn find_by_prestador(&self, tenant_id: Uuid, prestador_id: Uuid) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.listar(tenant_id, FiltroCategorias { prestador_id: Some(prestador_id), ..Default::default() })
            .await
    }

    /// Só as ativas.
    pub async fn find_by_tipo(
        &self,
        tenant_id: Uuid,
        tipo: TipoServicoCategoria,
    ) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.listar(
            tenant_id,
            FiltroCategorias { tipo_servico: Some(tipo), ativo: Some(true), ..Default::default() },
        )
        .await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<PrestadorServicoCategoria, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Categoria {} não encontrada", id)))
    }

    pub async fn find_active(&self, tenant_id: Uuid) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.listar(tenant_id, FiltroCategorias { ativo: Some(true), ..Default::default() }).await
    }

    pub async fn find_active_by_prestador(
        &self,
        tenant_id: Uuid,
        prestador_id: Uuid,
    ) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.listar(
            tenant_id,
            FiltroCategorias { prestador_id: Some(prestador_id), ativo: Some(true), ..Default::default() },
        )
        .await
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        patch: AtualizarCategoriaPayload,
    ) -> Result<PrestadorServicoCategoria, AppError> {
        let mut categoria = self.find_one(tenant_id, id).await?;
        categoria.aplicar(patch);
        self.repo.update(&categoria).await?;
        tracing::info!("Categoria {} atualizada", id);
        Ok(categoria)
    }

    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<PrestadorServicoCategoria, AppError> {
        let mut categoria = self.find_one(tenant_id, id).await?;
        categoria.ativo = !categoria.ativo;
        categoria.updated_at = chrono::Utc::now();
        self.repo.update(&categoria).await?;
        Ok(categoria)
    }

    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Categoria {} não encontrada", id)));
        }
        tracing::info!("Categoria {} removida", id);
        Ok(())
    }

    pub async fn remove_by_prestador(&self, tenant_id: Uuid, prestador_id: Uuid) -> Result<u64, AppError> {
        let removidas = self.repo.delete_by_prestador(tenant_id, prestador_id).await?;
        tracing::info!("{} categoria(s) removida(s) do prestador {}", removidas, prestador_id);
        Ok(removidas)
    }

    // =========================================================================
    //  RELATÓRIOS
    // =========================================================================

    /// Uma linha por tipo de serviço, inclusive os sem categoria.
    pub async fn get_estatisticas_por_tipo(&self, tenant_id: Uuid) -> Result<Vec<EstatisticaTipo>, AppError> {
        let todas = self.find_all(tenant_id).await?;
        Ok(TipoServicoCategoria::TODOS
            .iter()
            .map(|&tipo| {
                let do_tipo: Vec<_> = todas.iter().filter(|c| c.tipo_servico == tipo).collect();
                let ativos = do_tipo.iter().filter(|c| c.ativo).count();
                EstatisticaTipo { tipo, total: do_tipo.len(), ativos, inativos: do_tipo.len() - ativos }
            })
            .collect())
    }

    pub async fn get_estatisticas_prestador(
        &self,
        tenant_id: Uuid,
        prestador_id: Uuid,
    ) -> Result<EstatisticasCategoriasPrestador, AppError> {
        Ok(estatisticas_prestador(&self.find_by_prestador(tenant_id, prestador_id).await?))
    }

    pub async fn get_prestadores_por_categoria(
        &self,
        tenant_id: Uuid,
        tipo: TipoServicoCategoria,
    ) -> Result<Vec<PrestadorDaCategoria>, AppError> {
        let categorias = self.find_by_tipo(tenant_id, tipo).await?;
        let prestadores: HashMap<Uuid, _> = self
            .prestadores
            .list(tenant_id)
            .await?
            .into_iter()
            .map(|p| (p.prestador.id, p))
            .collect();

        Ok(categorias
            .into_iter()
            .filter_map(|c| {
                let p = prestadores.get(&c.prestador_servico_id)?;
                Some(PrestadorDaCategoria {
                    id: p.prestador.id,
                    codigo: p.prestador.codigo_prestador.clone(),
                    nome: p.empresa.nome_exibicao().to_string(),
                    valor_padrao: c.valor_padrao,
                    prazo_execucao: c.prazo_execucao,
                    responsavel_tecnico: c.responsavel_tecnico,
                    requer_orcamento: c.requer_orcamento,
                    requer_aprovacao: c.requer_aprovacao,
                })
            })
            .collect())
    }

    /// Upsert por tipo de serviço. Cada item é gravado de forma independente.
    pub async fn importar_categorias(
        &self,
        tenant_id: Uuid,
        prestador_id: Uuid,
        itens: Vec<ImportarCategoriaItem>,
    ) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        self.garantir_prestador(tenant_id, prestador_id).await?;

        let mut gravadas = Vec::with_capacity(itens.len());
        for item in itens {
            let categoria = match self.repo.find_by_par(tenant_id, prestador_id, item.tipo_servico).await? {
                Some(mut existente) => {
                    existente.aplicar(item.como_atualizacao());
                    self.repo.update(&existente).await?;
                    existente
                }
                None => {
                    let nova = PrestadorServicoCategoria::nova(tenant_id, item.como_criacao(prestador_id));
                    self.repo.insert(&nova).await?;
                    nova
                }
            };
            gravadas.push(categoria);
        }

        tracing::info!("{} categoria(s) importada(s) no prestador {}", gravadas.len(), prestador_id);
        Ok(gravadas)
    }
}

fn estatisticas_prestador(categorias: &[PrestadorServicoCategoria]) -> EstatisticasCategoriasPrestador {
    let ativas = categorias.iter().filter(|c| c.ativo).count();
    let resumo = ResumoCategoriasPrestador {
        total: categorias.len(),
        ativas,
        inativas: categorias.len() - ativas,
        com_orcamento: categorias.iter().filter(|c| c.requer_orcamento).count(),
        com_aprovacao: categorias.iter().filter(|c| c.requer_aprovacao).count(),
    };

    let mut valores: BTreeMap<TipoServicoCategoria, Vec<Decimal>> = BTreeMap::new();
    let mut por_tipo: BTreeMap<TipoServicoCategoria, PorTipoPrestador> = BTreeMap::new();
    for c in categorias {
        let entrada = por_tipo
            .entry(c.tipo_servico)
            .or_insert(PorTipoPrestador { total: 0, ativas: 0, valor_medio: None });
        entrada.total += 1;
        if c.ativo {
            entrada.ativas += 1;
        }
        if let Some(valor) = c.valor_padrao.filter(|v| !v.is_zero()) {
            valores.entry(c.tipo_servico).or_default().push(valor);
        }
    }
    for (tipo, lista) in valores {
        if let Some(entrada) = por_tipo.get_mut(&tipo) {
            let soma: Decimal = lista.iter().sum();
            entrada.valor_medio = Some((soma / Decimal::from(lista.len())).round_dp(2));
        }
    }

    EstatisticasCategoriasPrestador { resumo, por_tipo }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryStore,
        models::{
            empresa::{fixtures::dados_empresa, Empresa, TipoEmpresa},
            prestador::{CriarPrestadorPayload, PrestadorServico},
        },
    };

    async fn com_prestador() -> (Arc<MemoryStore>, CategoriaService, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::default());
        let tenant = Uuid::new_v4();
        let empresa = Empresa::nova(tenant, TipoEmpresa::PrestadorServico, dados_empresa("1", "Manutec LTDA", Some("Manutec")));
        let dados = CriarPrestadorPayload {
            empresa: dados_empresa("1", "Manutec LTDA", Some("Manutec")),
            codigo_prestador: "PSV001".into(),
            tipo_contrato: None,
            numero_contrato: None,
            data_inicio_contrato: None,
            data_fim_contrato: None,
            renovacao_automatica: None,
            prazo_aviso_renovacao: None,
            forma_pagamento: None,
            valor_hora: None,
            valor_mensal: None,
            valor_minimo: None,
            prazo_pagamento: None,
            dia_vencimento: None,
            status_contrato: None,
            sla_resposta: None,
            sla_resolucao: None,
            suporte_24x7: None,
            atende_urgencia: None,
            taxa_urgencia: None,
            observacoes: None,
        };
        let prestador = PrestadorServico::novo(tenant, empresa.id, &dados);
        PrestadorRepository::insert(store.as_ref(), &prestador, &empresa).await.unwrap();
        let service = CategoriaService::new(store.clone(), store.clone());
        (store, service, tenant, prestador.id)
    }

    fn categoria(prestador_servico_id: Uuid, tipo: TipoServicoCategoria, valor: Option<i64>) -> CriarCategoriaPayload {
        CriarCategoriaPayload {
            prestador_servico_id,
            tipo_servico: tipo,
            descricao_servico: None,
            valor_padrao: valor.map(Decimal::from),
            unidade_medida: None,
            prazo_execucao: None,
            periodicidade: None,
            responsavel_tecnico: None,
            telefone_responsavel: None,
            email_responsavel: None,
            requer_aprovacao: None,
            requer_orcamento: None,
            valor_limite_sem_aprovacao: None,
            ativo: None,
            observacoes: None,
        }
    }

    #[tokio::test]
    async fn prestador_inexistente_retorna_not_found() {
        let (_, service, tenant, _) = com_prestador().await;
        let err = service
            .create(tenant, categoria(Uuid::new_v4(), TipoServicoCategoria::Agua, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn tipo_repetido_no_prestador_gera_conflito() {
        let (_, service, tenant, prestador) = com_prestador().await;
        let tipo = TipoServicoCategoria::ManutencaoEquipamentos;
        service.create(tenant, categoria(prestador, tipo, None)).await.unwrap();
        assert!(matches!(
            service.create(tenant, categoria(prestador, tipo, None)).await,
            Err(AppError::Conflict(ref m)) if m == "Categoria manutencao_equipamentos já existe para este prestador"
        ));
    }

    #[tokio::test]
    async fn importar_atualiza_existente_e_cria_nova() {
        let (store, service, tenant, prestador) = com_prestador().await;
        service
            .create(tenant, categoria(prestador, TipoServicoCategoria::Energia, Some(100)))
            .await
            .unwrap();

        let item = |tipo, valor: i64| ImportarCategoriaItem {
            tipo_servico: tipo,
            descricao_servico: None,
            valor_padrao: Some(Decimal::from(valor)),
            unidade_medida: None,
            prazo_execucao: None,
            periodicidade: None,
            responsavel_tecnico: None,
            requer_aprovacao: None,
            requer_orcamento: None,
            valor_limite_sem_aprovacao: None,
            observacoes: None,
        };
        let gravadas = service
            .importar_categorias(
                tenant,
                prestador,
                vec![item(TipoServicoCategoria::Energia, 250), item(TipoServicoCategoria::Agua, 80)],
            )
            .await
            .unwrap();

        assert_eq!(gravadas.len(), 2);
        assert_eq!(store.categorias.lock().unwrap().len(), 2);
        let energia = service.find_by_tipo(tenant, TipoServicoCategoria::Energia).await.unwrap();
        assert_eq!(energia[0].valor_padrao, Some(Decimal::from(250)));
    }

    #[tokio::test]
    async fn estatisticas_cobrem_todos_os_tipos() {
        let (_, service, tenant, prestador) = com_prestador().await;
        let agua = service.create(tenant, categoria(prestador, TipoServicoCategoria::Agua, None)).await.unwrap();
        service.toggle_status(tenant, agua.id).await.unwrap();

        let stats = service.get_estatisticas_por_tipo(tenant).await.unwrap();
        assert_eq!(stats.len(), TipoServicoCategoria::TODOS.len());
        let linha = stats.iter().find(|s| s.tipo == TipoServicoCategoria::Agua).unwrap();
        assert_eq!((linha.total, linha.ativos, linha.inativos), (1, 0, 1));
    }

    #[tokio::test]
    async fn prestadores_por_categoria_trazem_nome_da_empresa() {
        let (_, service, tenant, prestador) = com_prestador().await;
        service
            .create(tenant, categoria(prestador, TipoServicoCategoria::SuporteSoftware, Some(300)))
            .await
            .unwrap();

        let lista = service
            .get_prestadores_por_categoria(tenant, TipoServicoCategoria::SuporteSoftware)
            .await
            .unwrap();
        assert_eq!(lista.len(), 1);
        assert_eq!(lista[0].codigo, "PSV001");
        assert_eq!(lista[0].nome, "Manutec");
    }

    #[tokio::test]
    async fn remove_by_prestador_apaga_todas() {
        let (_, service, tenant, prestador) = com_prestador().await;
        service.create(tenant, categoria(prestador, TipoServicoCategoria::Agua, None)).await.unwrap();
        service.create(tenant, categoria(prestador, TipoServicoCategoria::Energia, None)).await.unwrap();

        assert_eq!(service.remove_by_prestador(tenant, prestador).await.unwrap(), 2);
        assert!(service.find_by_prestador(tenant, prestador).await.unwrap().is_empty());
    }

    #[test]
    fn media_de_valor_ignora_categorias_sem_valor() {
        let tenant = Uuid::new_v4();
        let prestador = Uuid::new_v4();
        let nova = |valor| {
            PrestadorServicoCategoria::nova(tenant, categoria(prestador, TipoServicoCategoria::Agua, valor))
        };
        let categorias = vec![nova(Some(100)), nova(Some(200)), nova(None)];

        let stats = estatisticas_prestador(&categorias);
        let agua = &stats.por_tipo[&TipoServicoCategoria::Agua];
        assert_eq!(agua.total, 3);
        assert_eq!(agua.valor_medio, Some(Decimal::from(150)));
        assert_eq!(stats.resumo.com_aprovacao, 3);
    }
}
