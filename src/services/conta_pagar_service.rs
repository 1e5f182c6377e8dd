// src/services/conta_pagar_service.rs

use std::sync::Arc;

use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ContaPagarRepository,
    models::conta_pagar::{
        proximo_codigo_interno, AdicionarAnexoPayload, AnexoContaPagar, AtualizarContaPagarPayload, ContaPagar,
        ContaPagarDetalhe, CredorTipo, CriarContaPagarPayload, FiltroContas, NovaContaPagar, PagamentoParcela,
        Parcela, RegistrarPagamentoPayload, StatusContaPagar, StatusParcela,
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe uma conta a pagar com este código interno";
const MSG_PAGAMENTO_DUPLICADO: &str = "Esta parcela já possui pagamento registrado";

#[derive(Clone)]
pub struct ContaPagarService {
    repo: Arc<dyn ContaPagarRepository>,
}

impl ContaPagarService {
    pub fn new(repo: Arc<dyn ContaPagarRepository>) -> Self {
        Self { repo }
    }

    async fn gerar_codigo(&self, tenant_id: Uuid) -> Result<String, AppError> {
        let ano = Utc::now().year();
        let maior = self.repo.maior_sequencia(tenant_id, &format!("CAP{}", ano)).await?;
        proximo_codigo_interno(ano, maior)
            .ok_or_else(|| AppError::Conflict("Sequência de códigos internos do ano esgotada".into()))
    }

    /// Conta, composições, impostos e parcelas na mesma transação.
    pub async fn create(&self, tenant_id: Uuid, dados: CriarContaPagarPayload) -> Result<ContaPagarDetalhe, AppError> {
        let codigo = match dados.codigo_interno.clone() {
            Some(codigo) => {
                if self.repo.find_by_codigo(tenant_id, &codigo).await?.is_some() {
                    tracing::warn!("Código de conta a pagar duplicado: {}", codigo);
                    return Err(AppError::Conflict(MSG_CODIGO_DUPLICADO.into()));
                }
                codigo
            }
            None => self.gerar_codigo(tenant_id).await?,
        };

        let nova = NovaContaPagar::montar(tenant_id, dados, codigo);
        self.repo.insert(&nova).await?;
        tracing::info!(
            "Conta a pagar {} ({}) criada com {} parcela(s)",
            nova.conta.id,
            nova.conta.codigo_interno,
            nova.parcelas.len()
        );

        let NovaContaPagar { conta, parcelas, impostos, composicoes } = nova;
        Ok(ContaPagarDetalhe {
            conta,
            parcelas,
            impostos_retidos: impostos,
            composicoes_financeiras: composicoes,
            anexos: Vec::new(),
        })
    }

    pub async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<ContaPagar>, AppError> {
        self.repo.list(tenant_id, &FiltroContas::default()).await
    }

    pub async fn find_one(&self, tenant_id: Uuid, id: Uuid) -> Result<ContaPagarDetalhe, AppError> {
        self.repo
            .find_detalhe(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conta a pagar com ID {} não encontrada", id)))
    }

    async fn buscar_conta(&self, tenant_id: Uuid, id: Uuid) -> Result<ContaPagar, AppError> {
        self.repo
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conta a pagar com ID {} não encontrada", id)))
    }

    pub async fn find_by_status(&self, tenant_id: Uuid, status: StatusContaPagar) -> Result<Vec<ContaPagar>, AppError> {
        self.repo
            .list(tenant_id, &FiltroContas { status: Some(status), ..Default::default() })
            .await
    }

    pub async fn find_by_credor(
        &self,
        tenant_id: Uuid,
        credor_tipo: CredorTipo,
        credor_id: Uuid,
    ) -> Result<Vec<ContaPagar>, AppError> {
        let filtro = FiltroContas { credor_tipo: Some(credor_tipo), credor_id: Some(credor_id), ..Default::default() };
        self.repo.list(tenant_id, &filtro).await
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, patch: AtualizarContaPagarPayload) -> Result<ContaPagar, AppError> {
        let mut conta = self.buscar_conta(tenant_id, id).await?;
        conta.aplicar(patch);
        self.repo.update(&conta).await?;
        tracing::info!("Conta a pagar {} atualizada", id);
        Ok(conta)
    }

    /// Atribuição direta, sem validar a transição.
    pub async fn update_status(&self, tenant_id: Uuid, id: Uuid, status: StatusContaPagar) -> Result<ContaPagar, AppError> {
        let mut conta = self.buscar_conta(tenant_id, id).await?;
        let anterior = conta.status;
        conta.status = status;
        conta.updated_at = Utc::now();
        self.repo.update(&conta).await?;
        tracing::info!("Conta a pagar {}: {:?} -> {:?}", id, anterior, status);
        Ok(conta)
    }

    /// Apaga a conta com parcelas, pagamentos, impostos, composições e anexos.
    pub async fn remove(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(tenant_id, id).await? {
            return Err(AppError::NotFound(format!("Conta a pagar com ID {} não encontrada", id)));
        }
        tracing::info!("Conta a pagar {} removida", id);
        Ok(())
    }

    // =========================================================================
    //  PARCELAS E ANEXOS
    // =========================================================================

    pub async fn registrar_pagamento(
        &self,
        tenant_id: Uuid,
        parcela_id: Uuid,
        dados: RegistrarPagamentoPayload,
    ) -> Result<Parcela, AppError> {
        let mut parcela = self
            .repo
            .find_parcela(tenant_id, parcela_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Parcela com ID {} não encontrada", parcela_id)))?;

        if self.repo.find_pagamento(parcela_id).await?.is_some() {
            tracing::warn!("Pagamento repetido na parcela {}", parcela_id);
            return Err(AppError::Conflict(MSG_PAGAMENTO_DUPLICADO.into()));
        }

        let agora = Utc::now();
        let pagamento = PagamentoParcela {
            id: Uuid::new_v4(),
            parcela_id,
            forma_pagamento: dados.forma_pagamento,
            conta_bancaria_id: dados.conta_bancaria_id,
            codigo_barras: dados.codigo_barras,
            chave_pix: dados.chave_pix,
            dados_bancarios: dados.dados_bancarios,
            created_at: agora,
        };
        parcela.status = StatusParcela::Paga;
        parcela.data_pagamento = Some(dados.data_pagamento.unwrap_or_else(|| agora.date_naive()));
        parcela.updated_at = agora;

        self.repo.registrar_pagamento(&parcela, &pagamento).await?;
        tracing::info!("Parcela {} paga via {:?}", parcela_id, pagamento.forma_pagamento);
        Ok(parcela)
    }

    pub async fn add_anexo(
        &self,
        tenant_id: Uuid,
        conta_pagar_id: Uuid,
        dados: AdicionarAnexoPayload,
    ) -> Result<AnexoContaPagar, AppError> {
        self.buscar_conta(tenant_id, conta_pagar_id).await?;
        let anexo = AnexoContaPagar {
            id: Uuid::new_v4(),
            conta_pagar_id,
            tipo_anexo: dados.tipo_anexo,
            nome_arquivo: dados.nome_arquivo,
            caminho_arquivo: dados.caminho_arquivo,
            tamanho_bytes: dados.tamanho_bytes,
            mime_type: dados.mime_type,
            created_at: Utc::now(),
        };
        self.repo.insert_anexo(&anexo).await?;
        tracing::info!("Anexo {} adicionado à conta {}", anexo.nome_arquivo, conta_pagar_id);
        Ok(anexo)
    }

    pub async fn list_anexos(&self, tenant_id: Uuid, conta_pagar_id: Uuid) -> Result<Vec<AnexoContaPagar>, AppError> {
        self.buscar_conta(tenant_id, conta_pagar_id).await?;
        self.repo.list_anexos(conta_pagar_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{conta_pagar_repo::MockContaPagarRepository, memory::MemoryStore},
        models::conta_pagar::{FormaPagamentoParcela, ParcelaPayload, TipoAnexo, TipoDocumento},
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn servico() -> (Arc<MemoryStore>, ContaPagarService) {
        let store = Arc::new(MemoryStore::default());
        (store.clone(), ContaPagarService::new(store))
    }

    fn conta(codigo: Option<&str>, parcelas: i32) -> CriarContaPagarPayload {
        let vencimento = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap();
        CriarContaPagarPayload {
            credor_tipo: CredorTipo::PrestadorServico,
            credor_id: Uuid::new_v4(),
            unidade_devedora_id: Uuid::new_v4(),
            tipo_documento: TipoDocumento::NotaFiscal,
            numero_documento: "NF-1001".into(),
            descricao: None,
            valor_bruto: Decimal::from(1000),
            valor_liquido: Decimal::from(950),
            competencia: "09/2025".into(),
            data_emissao: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
            codigo_interno: codigo.map(str::to_owned),
            status: None,
            observacoes: None,
            impostos_retidos: vec![],
            composicoes_financeiras: vec![],
            parcelas: (1..=parcelas)
                .map(|n| ParcelaPayload {
                    numero_parcela: n,
                    total_parcelas: parcelas,
                    valor: Decimal::from(950 / parcelas),
                    data_vencimento: vencimento,
                    data_agendamento: None,
                    status: None,
                })
                .collect(),
        }
    }

    fn pix() -> RegistrarPagamentoPayload {
        RegistrarPagamentoPayload {
            forma_pagamento: FormaPagamentoParcela::Pix,
            conta_bancaria_id: None,
            codigo_barras: None,
            chave_pix: Some("financeiro@lab.com.br".into()),
            dados_bancarios: None,
            data_pagamento: None,
        }
    }

    #[tokio::test]
    async fn codigo_gerado_segue_a_sequencia_do_ano() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let ano = Utc::now().year();

        let primeira = service.create(tenant, conta(None, 1)).await.unwrap();
        let segunda = service.create(tenant, conta(None, 1)).await.unwrap();

        assert_eq!(primeira.conta.codigo_interno, format!("CAP{}0001", ano));
        assert_eq!(segunda.conta.codigo_interno, format!("CAP{}0002", ano));
    }

    #[tokio::test]
    async fn codigo_manual_fora_do_padrao_nao_trava_a_geracao() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let ano = Utc::now().year();

        service.create(tenant, conta(None, 1)).await.unwrap();
        service.create(tenant, conta(Some(&format!("CAP{}X", ano)), 1)).await.unwrap();
        let terceira = service.create(tenant, conta(None, 1)).await.unwrap();
        let quarta = service.create(tenant, conta(None, 1)).await.unwrap();

        assert_eq!(terceira.conta.codigo_interno, format!("CAP{}0002", ano));
        assert_eq!(quarta.conta.codigo_interno, format!("CAP{}0003", ano));
    }

    #[tokio::test]
    async fn sequencia_continua_depois_de_9999() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let ano = Utc::now().year();

        service.create(tenant, conta(Some(&format!("CAP{}9999", ano)), 1)).await.unwrap();
        let depois = service.create(tenant, conta(None, 1)).await.unwrap();
        let seguinte = service.create(tenant, conta(None, 1)).await.unwrap();

        assert_eq!(depois.conta.codigo_interno, format!("CAP{}10000", ano));
        assert_eq!(seguinte.conta.codigo_interno, format!("CAP{}10001", ano));
    }

    #[tokio::test]
    async fn codigo_informado_repetido_gera_conflito() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        service.create(tenant, conta(Some("CAP-X"), 1)).await.unwrap();

        let err = service.create(tenant, conta(Some("CAP-X"), 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_CODIGO_DUPLICADO));
        assert_eq!(store.parcelas.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_persiste_parcelas_e_detalhe_as_traz() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criada = service.create(tenant, conta(None, 3)).await.unwrap();

        let detalhe = service.find_one(tenant, criada.conta.id).await.unwrap();
        let numeros: Vec<i32> = detalhe.parcelas.iter().map(|p| p.numero_parcela).collect();
        assert_eq!(numeros, [1, 2, 3]);
        assert!(detalhe.parcelas.iter().all(|p| p.status == StatusParcela::Pendente));
    }

    #[tokio::test]
    async fn segundo_pagamento_da_parcela_gera_conflito() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let criada = service.create(tenant, conta(None, 2)).await.unwrap();
        let parcela_id = criada.parcelas[0].id;

        let paga = service.registrar_pagamento(tenant, parcela_id, pix()).await.unwrap();
        assert_eq!(paga.status, StatusParcela::Paga);
        assert!(paga.data_pagamento.is_some());

        let err = service.registrar_pagamento(tenant, parcela_id, pix()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == MSG_PAGAMENTO_DUPLICADO));
    }

    #[tokio::test]
    async fn pagamento_nao_grava_quando_ja_existe() {
        let parcela = Parcela {
            id: Uuid::new_v4(),
            conta_pagar_id: Uuid::new_v4(),
            numero_parcela: 1,
            total_parcelas: 1,
            valor: Decimal::from(100),
            data_vencimento: NaiveDate::from_ymd_opt(2025, 10, 10).unwrap(),
            data_pagamento: None,
            data_agendamento: None,
            status: StatusParcela::Pendente,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let pagamento = PagamentoParcela {
            id: Uuid::new_v4(),
            parcela_id: parcela.id,
            forma_pagamento: FormaPagamentoParcela::Boleto,
            conta_bancaria_id: None,
            codigo_barras: None,
            chave_pix: None,
            dados_bancarios: None,
            created_at: Utc::now(),
        };

        let mut repo = MockContaPagarRepository::new();
        repo.expect_find_parcela().returning(move |_, _| Ok(Some(parcela.clone())));
        repo.expect_find_pagamento().returning(move |_| Ok(Some(pagamento.clone())));
        repo.expect_registrar_pagamento().never();

        let service = ContaPagarService::new(Arc::new(repo));
        assert!(matches!(
            service.registrar_pagamento(Uuid::new_v4(), Uuid::new_v4(), pix()).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn status_e_credor_filtram_a_lista() {
        let (_, service) = servico();
        let tenant = Uuid::new_v4();
        let a = service.create(tenant, conta(None, 1)).await.unwrap();
        service.create(tenant, conta(None, 1)).await.unwrap();

        service.update_status(tenant, a.conta.id, StatusContaPagar::Cancelada).await.unwrap();

        assert_eq!(service.find_by_status(tenant, StatusContaPagar::Cancelada).await.unwrap().len(), 1);
        assert_eq!(service.find_by_status(tenant, StatusContaPagar::APagar).await.unwrap().len(), 1);
        let do_credor = service
            .find_by_credor(tenant, CredorTipo::PrestadorServico, a.conta.credor_id)
            .await
            .unwrap();
        assert_eq!(do_credor.len(), 1);
    }

    #[tokio::test]
    async fn remove_apaga_filhos() {
        let (store, service) = servico();
        let tenant = Uuid::new_v4();
        let criada = service.create(tenant, conta(None, 2)).await.unwrap();
        service
            .add_anexo(
                tenant,
                criada.conta.id,
                AdicionarAnexoPayload {
                    tipo_anexo: TipoAnexo::NotaFiscal,
                    nome_arquivo: "nf-1001.pdf".into(),
                    caminho_arquivo: "/anexos/nf-1001.pdf".into(),
                    tamanho_bytes: Some(2048),
                    mime_type: Some("application/pdf".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(service.list_anexos(tenant, criada.conta.id).await.unwrap().len(), 1);

        service.remove(tenant, criada.conta.id).await.unwrap();

        assert!(store.parcelas.lock().unwrap().is_empty());
        assert!(store.anexos.lock().unwrap().is_empty());
        assert!(matches!(service.find_one(tenant, criada.conta.id).await, Err(AppError::NotFound(_))));
    }
}
