// src/services/prestador_service.rs

use std::{cmp::Reverse, sync::Arc};

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{empresa_repo::MSG_CNPJ_DUPLICADO, EmpresaRepository, PrestadorRepository},
    models::{
        empresa::{Empresa, TipoEmpresa},
        prestador::{
            AtualizarPrestadorPayload, CriarPrestadorPayload, EstatisticasPrestadores, PrestadorComEmpresa,
            PrestadorServico, ResumoPrestadores, StatusContrato,
        },
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe um prestador de serviço com este código";
const TOP_ESTATISTICAS: usize = 5;

#[derive(Clone)]
pub struct PrestadorService {
    repo: Arc<dyn PrestadorRepository>,
    empresas: Arc<dyn EmpresaRepository>,
}

impl PrestadorService {
    pub fn new(repo: Arc<dyn PrestadorRepository>, empresas: Arc<dyn EmpresaRepository>) -> Self {
        Self { repo, empresas }
    }

    async fn garantir_cnpj_livre(&self, tenant_id: Uuid, cnpj: &str) -> Result<(), AppError> {
        if self.empresas.find_by_cnpj(tenant_id, cnpj).await?.is_some() {
            tracing::warn!("CNPJ já cadastrado: {}", cnpj);
            return Err(AppError::Conflict(MSG_CNPJ_DUPLICADO.into()));
        }
        Ok(())
    }

    async fn garantir_codigo_livre(&self, tenant_id: Uuid, codigo: &str) -> Result<(), AppError> {
        if self.repo.find_by_codigo(tenant_id, codigo).await?.is_some() {
            tracing::warn!("Código de prestador duplicado: {}", codigo);
            return Err(AppError::Conflict(MSG_CODIGO_DUPLICADO.into()));
        }
        Ok(())
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    /// Empresa e prestador na mesma transação.
    pub async fn create(&self, tenant_id: Uuid, dados: CriarPrestadorPayload) -> Result<PrestadorComEmpresa, AppError> {
        self.garantir_codigo_livre(tenant_id, &dados.codigo_prestador).await?;
        self.garantir_cnpj_livre(tenant_id, &dados.empresa.cnpj).await?;

        let empresa = Empresa::nova(tenant_id, TipoEmpresa::PrestadorServico, dados.empresa.clone());
        let prestador = PrestadorServico::novo(tenant_id, empresa.id, &dados);
        self.repo.insert(&prestador, &empresa).await?;

        tracing::info!("Prestador {} ({}) criado com empresa {}", prestador.id, prestador.codigo_prestador, empresa.id);
        Ok(PrestadorComEmpresa { prestador, empresa })
    }

    /// Ordenado pelo nome fantasia da empresa.
    pub async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        let mut todos = self.repo.list(tenant_id).await?;
        todos.sort_by(|a, b| a.empresa.nome_exibicao().cmp(b.empresa.nome_exibicao()));
        Ok(todos)
    }

    async fn filtrar<F>(&self, tenant_id: Uuid, filtro: F) -> Result<Vec<PrestadorComEmpresa>, AppError>
    where
        F: Fn(&PrestadorComEmpresa) -> bool,
    {
        Ok(self.find_all(tenant_id).await?.into_iter().filter(|p| filtro(p)).collect())
    }

    pub async fn find_active(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        self.filtrar(tenant_id, |p| p.prestador.status_contrato == StatusContrato::Ativo && p.empresa.ativo)
            .await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<PrestadorComEmpresa, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prestador {} não encontrado", id)))
    }

    pub async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<PrestadorComEmpresa, AppError> {
        self.repo
            .find_by_codigo(tenant_id, codigo)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prestador com código {} não encontrado", codigo)))
    }

    pub async fn find_by_cnpj(&self, tenant_id: Uuid, cnpj: &str) -> Result<PrestadorComEmpresa, AppError> {
        let nao_encontrado = || AppError::NotFound(format!("Prestador com CNPJ {} não encontrado", cnpj));
        let empresa = self.empresas.find_by_cnpj(tenant_id, cnpj).await?.ok_or_else(nao_encontrado)?;
        self.repo
            .find_by_empresa(tenant_id, empresa.id)
            .await?
            .ok_or_else(nao_encontrado)
    }

    /// Código, observações, nome fantasia, razão social ou CNPJ.
    pub async fn search(&self, tenant_id: Uuid, termo: &str) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        self.filtrar(tenant_id, |p| p.contem(termo)).await
    }

    pub async fn find_by_status(&self, tenant_id: Uuid, status: StatusContrato) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        self.filtrar(tenant_id, |p| p.prestador.status_contrato == status).await
    }

    pub async fn find_com_urgencia(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        self.filtrar(tenant_id, |p| {
            p.prestador.atende_urgencia && p.prestador.status_contrato == StatusContrato::Ativo
        })
        .await
    }

    pub async fn find_com_24x7(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        self.filtrar(tenant_id, |p| {
            p.prestador.suporte_24x7 && p.prestador.status_contrato == StatusContrato::Ativo
        })
        .await
    }

    /// Dados da empresa e do prestador na mesma transação.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        mut patch: AtualizarPrestadorPayload,
    ) -> Result<PrestadorComEmpresa, AppError> {
        let PrestadorComEmpresa { mut prestador, mut empresa } = self.find_one(tenant_id, id).await?;

        if let Some(dados_empresa) = patch.empresa.take() {
            if let Some(cnpj) = dados_empresa.cnpj.as_deref() {
                if cnpj != empresa.cnpj {
                    self.garantir_cnpj_livre(tenant_id, cnpj).await?;
                }
            }
            empresa.aplicar(dados_empresa);
        }
        if let Some(codigo) = patch.codigo_prestador.as_deref() {
            if codigo != prestador.codigo_prestador {
                self.garantir_codigo_livre(tenant_id, codigo).await?;
            }
        }

        prestador.aplicar(patch);
        self.repo.update(&prestador, &empresa).await?;
        tracing::info!("Prestador {} atualizado", id);
        Ok(PrestadorComEmpresa { prestador, empresa })
    }

    pub async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: StatusContrato,
    ) -> Result<PrestadorComEmpresa, AppError> {
        let mut atual = self.find_one(tenant_id, id).await?;
        atual.prestador.status_contrato = status;
        atual.prestador.updated_at = Utc::now();
        self.repo.update_prestador(&atual.prestador).await?;
        tracing::info!("Prestador {} com contrato {:?}", id, status);
        Ok(atual)
    }

    /// Alterna o `ativo` da empresa dona do cadastro.
    pub async fn toggle_status(&self, tenant_id: Uuid, id: Uuid) -> Result<PrestadorComEmpresa, AppError> {
        let mut atual = self.find_one(tenant_id, id).await?;
        atual.empresa.ativo = !atual.empresa.ativo;
        atual.empresa.updated_at = Utc::now();
        self.empresas.update(&atual.empresa).await?;
        tracing::info!("Empresa do prestador {} ativo={}", id, atual.empresa.ativo);
        Ok(atual)
    }

    pub async fn avaliar(&self, tenant_id: Uuid, id: Uuid, nota: i32) -> Result<PrestadorComEmpresa, AppError> {
        let nota = u8::try_from(nota)
            .ok()
            .filter(|n| (1..=5).contains(n))
            .ok_or_else(|| AppError::BadRequest("Avaliação deve estar entre 1 e 5".into()))?;

        let mut atual = self.find_one(tenant_id, id).await?;
        atual.prestador.registrar_avaliacao(nota);
        self.repo.update_prestador(&atual.prestador).await?;
        Ok(atual)
    }

    pub async fn incrementar_servicos(&self, tenant_id: Uuid, id: Uuid) -> Result<PrestadorComEmpresa, AppError> {
        let mut atual = self.find_one(tenant_id, id).await?;
        atual.prestador.total_servicos_prestados += 1;
        atual.prestador.updated_at = Utc::now();
        self.repo.update_prestador(&atual.prestador).await?;
        Ok(atual)
    }

    /// Remove o prestador e a empresa na mesma transação.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let atual = self.find_one(tenant_id, id).await?;
        self.repo.delete(tenant_id, id, atual.empresa.id).await?;
        tracing::info!("Prestador {} e empresa {} removidos", id, atual.empresa.id);
        Ok(())
    }

    // =========================================================================
    //  RELATÓRIOS
    // =========================================================================

    pub async fn get_estatisticas(&self, tenant_id: Uuid) -> Result<EstatisticasPrestadores, AppError> {
        Ok(estatisticas(self.repo.list(tenant_id).await?))
    }

    pub async fn get_contratos_vencendo(&self, tenant_id: Uuid, dias: i64) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        let hoje = Utc::now().date_naive();
        self.filtrar(tenant_id, |p| vence_em(&p.prestador, hoje, dias)).await
    }

    pub async fn get_renovacoes_automaticas(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        let hoje = Utc::now().date_naive();
        self.filtrar(tenant_id, |p| em_aviso_de_renovacao(&p.prestador, hoje)).await
    }
}

// Contrato ativo que termina entre hoje e hoje + `dias`.
fn vence_em(p: &PrestadorServico, hoje: NaiveDate, dias: i64) -> bool {
    let limite = hoje + Duration::days(dias);
    p.status_contrato == StatusContrato::Ativo
        && p.data_fim_contrato.is_some_and(|fim| fim >= hoje && fim <= limite)
}

// Renovação automática dentro da janela de aviso que antecede o fim do contrato.
fn em_aviso_de_renovacao(p: &PrestadorServico, hoje: NaiveDate) -> bool {
    if !p.renovacao_automatica || p.status_contrato != StatusContrato::Ativo {
        return false;
    }
    match (p.data_fim_contrato, p.prazo_aviso_renovacao) {
        (Some(fim), Some(prazo)) if prazo > 0 => {
            let aviso = fim - Duration::days(i64::from(prazo));
            aviso <= hoje && hoje <= fim
        }
        _ => false,
    }
}

fn estatisticas(todos: Vec<PrestadorComEmpresa>) -> EstatisticasPrestadores {
    let conta = |status| todos.iter().filter(|p| p.prestador.status_contrato == status).count();
    let ativos: Vec<&PrestadorComEmpresa> = todos
        .iter()
        .filter(|p| p.prestador.status_contrato == StatusContrato::Ativo)
        .collect();

    let resumo = ResumoPrestadores {
        total: todos.len(),
        ativos: ativos.len(),
        inativos: conta(StatusContrato::Inativo),
        suspensos: conta(StatusContrato::Suspenso),
        em_analise: conta(StatusContrato::EmAnalise),
        com_24x7: ativos.iter().filter(|p| p.prestador.suporte_24x7).count(),
        com_urgencia: ativos.iter().filter(|p| p.prestador.atende_urgencia).count(),
    };

    let mut melhores = ativos.clone();
    melhores.sort_by_key(|p| {
        (
            p.prestador.avaliacao_media.is_none(),
            Reverse(p.prestador.avaliacao_media),
            Reverse(p.prestador.total_avaliacoes),
        )
    });
    let mut mais_servicos = ativos;
    mais_servicos.sort_by_key(|p| Reverse(p.prestador.total_servicos_prestados));

    EstatisticasPrestadores {
        resumo,
        melhores_avaliados: melhores.into_iter().take(TOP_ESTATISTICAS).cloned().collect(),
        mais_servicos: mais_servicos.into_iter().take(TOP_ESTATISTICAS).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{
            empresa_repo::MockEmpresaRepository,
            memory::MemoryStore,
            prestador_repo::MockPrestadorRepository,
        },
        models::empresa::fixtures::dados_empresa,
    };
    use rstest::rstest;

    fn payload(codigo: &str, cnpj: &str, fantasia: &str) -> CriarPrestadorPayload {
        CriarPrestadorPayload {
            empresa: dados_empresa(cnpj, &format!("{} LTDA", fantasia), Some(fantasia)),
            codigo_prestador: codigo.into(),
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
            status_contrato: Some(StatusContrato::Ativo),
            sla_resposta: None,
            sla_resolucao: None,
            suporte_24x7: None,
            atende_urgencia: None,
            taxa_urgencia: None,
            observacoes: None,
        }
    }

    fn servico() -> (Arc<MemoryStore>, PrestadorService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), PrestadorService::new(store.clone(), store))
    }

    #[tokio::test]
    async fn create_grava_empresa_e_prestador_na_mesma_chamada() {
        let mut repo = MockPrestadorRepository::new();
        repo.expect_find_by_codigo().returning(|_, _| Ok(None));
        repo.expect_insert()
            .withf(|p, e| e.tipo_empresa == TipoEmpresa::PrestadorServico && p.empresa_id == e.id)
            .times(1)
            .returning(|_, _| Ok(()));
        let mut empresas = MockEmpresaRepository::new();
        empresas.expect_find_by_cnpj().returning(|_, _| Ok(None));

        let service = PrestadorService::new(Arc::new(repo), Arc::new(empresas));
        let criado = service
            .create(Uuid::new_v4(), payload("PSV001", "12345678000190", "Manutec"))
            .await
            .unwrap();
        assert_eq!(criado.empresa.razao_social, "Manutec LTDA");
    }

    #[tokio::test]
    async fn codigo_ou_cnpj_duplicado_gera_conflito() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, payload("PSV001", "12345678000190", "A")).await.unwrap();

        let mesmo_codigo = service.create(tenant, payload("PSV001", "99999999000199", "B")).await;
        assert!(matches!(mesmo_codigo, Err(AppError::Conflict(ref m)) if m == MSG_CODIGO_DUPLICADO));

        let mesmo_cnpj = service.create(tenant, payload("PSV002", "12345678000190", "B")).await;
        assert!(matches!(mesmo_cnpj, Err(AppError::Conflict(ref m)) if m == MSG_CNPJ_DUPLICADO));

        assert_eq!(store.empresas.lock().unwrap().len(), 1);
        assert_eq!(store.prestadores.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_apaga_prestador_e_empresa() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        let criado = service.create(tenant, payload("PSV001", "12345678000190", "A")).await.unwrap();

        service.remove(tenant, criado.prestador.id).await.unwrap();

        assert!(store.prestadores.lock().unwrap().is_empty());
        assert!(store.empresas.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_duas_vezes_restaura_a_empresa() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criado = service.create(tenant, payload("PSV001", "12345678000190", "A")).await.unwrap();
        let id = criado.prestador.id;

        assert!(!service.toggle_status(tenant, id).await.unwrap().empresa.ativo);
        assert!(service.find_active(tenant).await.unwrap().is_empty());
        assert!(service.toggle_status(tenant, id).await.unwrap().empresa.ativo);
        assert_eq!(service.find_active(tenant).await.unwrap().len(), 1);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[tokio::test]
    async fn nota_fora_da_faixa_e_rejeitada(#[case] nota: i32) {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criado = service.create(tenant, payload("PSV001", "12345678000190", "A")).await.unwrap();
        assert!(matches!(
            service.avaliar(tenant, criado.prestador.id, nota).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn avaliacoes_acumulam_media() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let id = service.create(tenant, payload("PSV001", "12345678000190", "A")).await.unwrap().prestador.id;

        service.avaliar(tenant, id, 5).await.unwrap();
        let avaliado = service.avaliar(tenant, id, 4).await.unwrap();
        assert_eq!(avaliado.prestador.avaliacao_media, Some(rust_decimal::Decimal::new(450, 2)));
        assert_eq!(avaliado.prestador.total_avaliacoes, 2);
    }

    #[tokio::test]
    async fn update_troca_dados_da_empresa_e_do_prestador() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let id = service.create(tenant, payload("PSV001", "12345678000190", "A")).await.unwrap().prestador.id;

        let patch = AtualizarPrestadorPayload {
            empresa: Some(crate::models::empresa::AtualizarEmpresa {
                nome_fantasia: Some("Nova Fantasia".into()),
                ..Default::default()
            }),
            suporte_24x7: Some(true),
            ..Default::default()
        };
        service.update(tenant, id, patch).await.unwrap();

        let salvo = service.find_one(tenant, id).await.unwrap();
        assert_eq!(salvo.empresa.nome_fantasia.as_deref(), Some("Nova Fantasia"));
        assert_eq!(service.find_com_24x7(tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn busca_por_cnpj_e_termo() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, payload("PSV001", "12345678000190", "Refrigeração Polar")).await.unwrap();
        service.create(tenant, payload("PSV002", "99999999000199", "Limpa Tudo")).await.unwrap();

        assert_eq!(service.find_by_cnpj(tenant, "99999999000199").await.unwrap().prestador.codigo_prestador, "PSV002");
        assert!(matches!(service.find_by_cnpj(tenant, "000").await, Err(AppError::NotFound(_))));
        assert_eq!(service.search(tenant, "polar").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lista_ordenada_pelo_nome_fantasia() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, payload("PSV001", "12345678000190", "Zeta")).await.unwrap();
        service.create(tenant, payload("PSV002", "99999999000199", "Alfa")).await.unwrap();

        let nomes: Vec<String> = service
            .find_all(tenant)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.empresa.nome_fantasia)
            .collect();
        assert_eq!(nomes, ["Alfa", "Zeta"]);
    }

    fn contrato(fim: Option<NaiveDate>, aviso: Option<i32>, renova: bool) -> PrestadorServico {
        let mut p = PrestadorServico::novo(Uuid::new_v4(), Uuid::new_v4(), &payload("PSV001", "1", "A"));
        p.data_fim_contrato = fim;
        p.prazo_aviso_renovacao = aviso;
        p.renovacao_automatica = renova;
        p
    }

    fn dia(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[rstest]
    #[case(Some(dia(20)), true)]
    #[case(Some(dia(1)), true)]
    #[case(Some(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()), false)]
    #[case(None, false)]
    fn contratos_vencendo_na_janela(#[case] fim: Option<NaiveDate>, #[case] esperado: bool) {
        assert_eq!(vence_em(&contrato(fim, None, false), dia(1), 30), esperado);
    }

    #[rstest]
    #[case(Some(dia(10)), Some(15), true, true)]
    #[case(Some(dia(31)), Some(15), true, false)]
    #[case(Some(dia(10)), Some(15), false, false)]
    #[case(Some(dia(10)), None, true, false)]
    fn janela_de_aviso_de_renovacao(
        #[case] fim: Option<NaiveDate>,
        #[case] aviso: Option<i32>,
        #[case] renova: bool,
        #[case] esperado: bool,
    ) {
        assert_eq!(em_aviso_de_renovacao(&contrato(fim, aviso, renova), dia(5)), esperado);
    }

    #[test]
    fn estatisticas_contam_status_e_limitam_top() {
        let empresa = Empresa::nova(Uuid::new_v4(), TipoEmpresa::PrestadorServico, dados_empresa("1", "A", None));
        let todos: Vec<PrestadorComEmpresa> = (0..7)
            .map(|i| {
                let mut p = contrato(None, None, false);
                p.total_servicos_prestados = i;
                p.suporte_24x7 = i % 2 == 0;
                if i == 6 {
                    p.status_contrato = StatusContrato::Suspenso;
                }
                PrestadorComEmpresa { prestador: p, empresa: empresa.clone() }
            })
            .collect();

        let e = estatisticas(todos);
        assert_eq!((e.resumo.total, e.resumo.ativos, e.resumo.suspensos), (7, 6, 1));
        assert_eq!(e.resumo.com_24x7, 3);
        assert_eq!(e.mais_servicos.len(), 5);
        assert_eq!(e.mais_servicos[0].prestador.total_servicos_prestados, 5);
    }
}
