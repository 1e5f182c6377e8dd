// src/models/conta_pagar.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "credor_tipo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CredorTipo {
    Empresa,
    PrestadorServico,
    Fornecedor,
    Profissional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_documento", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoDocumento {
    NotaFiscal,
    FolhaPagamento,
    Boleto,
    Recibo,
    Contrato,
    Outros,
}

// Sem motor de transição: o status é atribuído diretamente.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_conta_pagar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusContaPagar {
    #[default]
    APagar,
    Paga,
    Agendada,
    ParcialmentePaga,
    Cancelada,
    Vencida,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_parcela", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusParcela {
    #[default]
    Pendente,
    Paga,
    Agendada,
    Vencida,
    Cancelada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "forma_pagamento_parcela", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FormaPagamentoParcela {
    Boleto,
    Pix,
    CartaoCredito,
    Ted,
    Doc,
    Transferencia,
    Caixa,
    Cheque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_imposto", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoImposto {
    Iss,
    Irrf,
    Csll,
    Pis,
    Cofins,
    Ibs,
    Cbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_anexo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoAnexo {
    Boleto,
    NotaFiscal,
    Contrato,
    ComprovantePagamento,
    Outros,
}

// --- Entidades ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContaPagar {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub credor_tipo: CredorTipo,
    pub credor_id: Uuid,
    pub unidade_devedora_id: Uuid,
    pub tipo_documento: TipoDocumento,
    pub numero_documento: String,
    pub descricao: Option<String>,
    pub valor_bruto: Decimal,
    pub valor_liquido: Decimal,
    /// MM/AAAA
    #[schema(example = "09/2025")]
    pub competencia: String,
    pub data_emissao: NaiveDate,
    #[schema(example = "CAP20250001")]
    pub codigo_interno: String,
    pub status: StatusContaPagar,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContaPagar {
    pub fn aplicar(&mut self, patch: AtualizarContaPagarPayload) {
        aplicar_campos!(
            self, patch;
            credor_tipo, credor_id, unidade_devedora_id, tipo_documento, numero_documento,
            valor_bruto, valor_liquido, competencia, data_emissao, status,
        );
        aplicar_opcionais!(self, patch; descricao, observacoes);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Parcela {
    pub id: Uuid,
    pub conta_pagar_id: Uuid,
    pub numero_parcela: i32,
    pub total_parcelas: i32,
    pub valor: Decimal,
    pub data_vencimento: NaiveDate,
    pub data_pagamento: Option<NaiveDate>,
    pub data_agendamento: Option<NaiveDate>,
    pub status: StatusParcela,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagamentoParcela {
    pub id: Uuid,
    pub parcela_id: Uuid,
    pub forma_pagamento: FormaPagamentoParcela,
    pub conta_bancaria_id: Option<Uuid>,
    pub codigo_barras: Option<String>,
    pub chave_pix: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub dados_bancarios: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImpostoRetido {
    pub id: Uuid,
    pub conta_pagar_id: Uuid,
    pub tipo_imposto: TipoImposto,
    pub percentual: Decimal,
    pub valor_calculado: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposicaoFinanceira {
    pub id: Uuid,
    pub conta_pagar_id: Uuid,
    pub conta_contabil_id: Uuid,
    pub centro_custo_id: Option<Uuid>,
    pub colaborador_id: Option<Uuid>,
    pub colaborador_nome: Option<String>,
    pub valor: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnexoContaPagar {
    pub id: Uuid,
    pub conta_pagar_id: Uuid,
    pub tipo_anexo: TipoAnexo,
    pub nome_arquivo: String,
    pub caminho_arquivo: String,
    pub tamanho_bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Conta com todos os filhos carregados (resposta do GET por id).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContaPagarDetalhe {
    #[serde(flatten)]
    pub conta: ContaPagar,
    pub parcelas: Vec<Parcela>,
    pub impostos_retidos: Vec<ImpostoRetido>,
    pub composicoes_financeiras: Vec<ComposicaoFinanceira>,
    pub anexos: Vec<AnexoContaPagar>,
}

/// Registros montados pelo serviço e gravados juntos pelo repositório.
#[derive(Debug, Clone)]
pub struct NovaContaPagar {
    pub conta: ContaPagar,
    pub parcelas: Vec<Parcela>,
    pub impostos: Vec<ImpostoRetido>,
    pub composicoes: Vec<ComposicaoFinanceira>,
}

impl NovaContaPagar {
    pub fn montar(tenant_id: Uuid, dados: CriarContaPagarPayload, codigo_interno: String) -> Self {
        let agora = Utc::now();
        let conta_id = Uuid::new_v4();

        let parcelas = dados
            .parcelas
            .into_iter()
            .map(|p| Parcela {
                id: Uuid::new_v4(),
                conta_pagar_id: conta_id,
                numero_parcela: p.numero_parcela,
                total_parcelas: p.total_parcelas,
                valor: p.valor,
                data_vencimento: p.data_vencimento,
                data_pagamento: None,
                data_agendamento: p.data_agendamento,
                status: p.status.unwrap_or_default(),
                created_at: agora,
                updated_at: agora,
            })
            .collect();

        let impostos = dados
            .impostos_retidos
            .into_iter()
            .map(|i| ImpostoRetido {
                id: Uuid::new_v4(),
                conta_pagar_id: conta_id,
                tipo_imposto: i.tipo_imposto,
                percentual: i.percentual,
                valor_calculado: i.valor_calculado,
            })
            .collect();

        let composicoes = dados
            .composicoes_financeiras
            .into_iter()
            .map(|c| ComposicaoFinanceira {
                id: Uuid::new_v4(),
                conta_pagar_id: conta_id,
                conta_contabil_id: c.conta_contabil_id,
                centro_custo_id: c.centro_custo_id,
                colaborador_id: c.colaborador_id,
                colaborador_nome: c.colaborador_nome,
                valor: c.valor,
            })
            .collect();

        let conta = ContaPagar {
            id: conta_id,
            tenant_id,
            credor_tipo: dados.credor_tipo,
            credor_id: dados.credor_id,
            unidade_devedora_id: dados.unidade_devedora_id,
            tipo_documento: dados.tipo_documento,
            numero_documento: dados.numero_documento,
            descricao: dados.descricao,
            valor_bruto: dados.valor_bruto,
            valor_liquido: dados.valor_liquido,
            competencia: dados.competencia,
            data_emissao: dados.data_emissao,
            codigo_interno,
            status: dados.status.unwrap_or_default(),
            observacoes: dados.observacoes,
            created_at: agora,
            updated_at: agora,
        };

        Self { conta, parcelas, impostos, composicoes }
    }
}

/// Sequência numérica de um código `{prefixo}{dígitos}`; códigos manuais fora do padrão ficam de fora.
pub fn sequencia_do_codigo(prefixo: &str, codigo: &str) -> Option<i64> {
    let resto = codigo.strip_prefix(prefixo)?;
    if resto.is_empty() || resto.len() > 18 || !resto.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    resto.parse().ok()
}

/// Próximo código do ano: `CAP{ano}{seq:04}`, depois da maior sequência numérica já usada.
/// `None` quando a sequência estoura.
pub fn proximo_codigo_interno(ano: i32, maior_sequencia: Option<i64>) -> Option<String> {
    let seq = maior_sequencia.unwrap_or(0).checked_add(1)?;
    Some(format!("CAP{}{:04}", ano, seq))
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImpostoRetidoPayload {
    pub tipo_imposto: TipoImposto,
    pub percentual: Decimal,
    pub valor_calculado: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposicaoFinanceiraPayload {
    pub conta_contabil_id: Uuid,
    pub centro_custo_id: Option<Uuid>,
    pub colaborador_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub colaborador_nome: Option<String>,
    pub valor: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParcelaPayload {
    #[validate(range(min = 1))]
    pub numero_parcela: i32,
    #[validate(range(min = 1))]
    pub total_parcelas: i32,
    pub valor: Decimal,
    pub data_vencimento: NaiveDate,
    pub data_agendamento: Option<NaiveDate>,
    pub status: Option<StatusParcela>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarContaPagarPayload {
    pub credor_tipo: CredorTipo,
    pub credor_id: Uuid,
    pub unidade_devedora_id: Uuid,
    pub tipo_documento: TipoDocumento,
    #[validate(length(min = 1, max = 100, message = "Número do documento é obrigatório"))]
    pub numero_documento: String,
    pub descricao: Option<String>,
    pub valor_bruto: Decimal,
    pub valor_liquido: Decimal,
    #[validate(length(equal = 7, message = "Competência deve estar no formato MM/AAAA"))]
    #[schema(example = "09/2025")]
    pub competencia: String,
    pub data_emissao: NaiveDate,
    /// Gerado (CAP + ano + sequência de 4 dígitos) quando ausente
    #[validate(length(min = 1, max = 50))]
    pub codigo_interno: Option<String>,
    pub status: Option<StatusContaPagar>,
    pub observacoes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub impostos_retidos: Vec<ImpostoRetidoPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub composicoes_financeiras: Vec<ComposicaoFinanceiraPayload>,
    #[serde(default)]
    #[validate(nested)]
    pub parcelas: Vec<ParcelaPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarContaPagarPayload {
    pub credor_tipo: Option<CredorTipo>,
    pub credor_id: Option<Uuid>,
    pub unidade_devedora_id: Option<Uuid>,
    pub tipo_documento: Option<TipoDocumento>,
    #[validate(length(min = 1, max = 100))]
    pub numero_documento: Option<String>,
    pub descricao: Option<String>,
    pub valor_bruto: Option<Decimal>,
    pub valor_liquido: Option<Decimal>,
    #[validate(length(equal = 7, message = "Competência deve estar no formato MM/AAAA"))]
    pub competencia: Option<String>,
    pub data_emissao: Option<NaiveDate>,
    pub status: Option<StatusContaPagar>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AtualizarStatusContaPayload {
    pub status: StatusContaPagar,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarPagamentoPayload {
    pub forma_pagamento: FormaPagamentoParcela,
    pub conta_bancaria_id: Option<Uuid>,
    #[validate(length(max = 100))]
    pub codigo_barras: Option<String>,
    #[validate(length(max = 100))]
    pub chave_pix: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub dados_bancarios: Option<Value>,
    /// Padrão: hoje
    pub data_pagamento: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdicionarAnexoPayload {
    pub tipo_anexo: TipoAnexo,
    #[validate(length(min = 1, max = 255))]
    pub nome_arquivo: String,
    #[validate(length(min = 1, max = 500))]
    pub caminho_arquivo: String,
    #[validate(range(min = 0))]
    pub tamanho_bytes: Option<i64>,
    pub mime_type: Option<String>,
}

/// Filtro das listagens. `None` não filtra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiltroContas {
    pub status: Option<StatusContaPagar>,
    pub credor_tipo: Option<CredorTipo>,
    pub credor_id: Option<Uuid>,
}

impl FiltroContas {
    pub fn aceita(&self, c: &ContaPagar) -> bool {
        self.status.is_none_or(|s| s == c.status)
            && self.credor_tipo.is_none_or(|t| t == c.credor_tipo)
            && self.credor_id.is_none_or(|id| id == c.credor_id)
    }
}
