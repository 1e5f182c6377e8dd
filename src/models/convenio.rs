// src/models/convenio.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::empresa::{DadosEmpresa, Empresa};

// =============================================================================
//  CONVÊNIO (operadora de plano de saúde)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Convenio {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub empresa_id: Uuid,
    #[schema(example = "Unimed Regional")]
    pub nome: String,
    pub registro_ans: Option<String>,
    pub matricula: Option<String>,
    pub tipo_convenio_id: Option<Uuid>,
    pub forma_liquidacao_id: Option<Uuid>,
    /// Valor do CH (coeficiente de honorários)
    pub valor_ch: Option<Decimal>,
    pub valor_filme: Option<Decimal>,

    // TISS
    pub tiss: bool,
    pub versao_tiss: Option<String>,
    pub codigo_operadora_tiss: Option<String>,
    pub codigo_operadora_autorizacao: Option<String>,
    pub codigo_prestador: Option<String>,

    // Faturamento
    pub envio_faturamento_id: Option<Uuid>,
    pub fatura_ate_dia: Option<i32>,
    pub dia_vencimento: Option<i32>,
    pub data_contrato: Option<NaiveDate>,
    pub data_ultimo_ajuste: Option<NaiveDate>,
    pub instrucoes_faturamento: Option<String>,

    // Tabelas de preço: a base é consultada quando o item não está na de serviço
    pub tabela_servico_id: Option<Uuid>,
    pub tabela_base_id: Option<Uuid>,
    pub tabela_material_id: Option<Uuid>,
    pub cnes: Option<String>,

    pub co_participacao: bool,
    pub nota_fiscal_exige_fatura: bool,
    pub contato: Option<String>,
    pub instrucoes: Option<String>,
    pub observacoes_gerais: Option<String>,
    pub integracao_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Convenio {
    pub fn novo(tenant_id: Uuid, empresa_id: Uuid, dados: &CriarConvenioPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            empresa_id,
            nome: dados.nome.clone(),
            registro_ans: dados.registro_ans.clone(),
            matricula: dados.matricula.clone(),
            tipo_convenio_id: dados.tipo_convenio_id,
            forma_liquidacao_id: dados.forma_liquidacao_id,
            valor_ch: dados.valor_ch,
            valor_filme: dados.valor_filme,
            tiss: dados.tiss.unwrap_or(false),
            versao_tiss: dados.versao_tiss.clone(),
            codigo_operadora_tiss: dados.codigo_operadora_tiss.clone(),
            codigo_operadora_autorizacao: dados.codigo_operadora_autorizacao.clone(),
            codigo_prestador: dados.codigo_prestador.clone(),
            envio_faturamento_id: dados.envio_faturamento_id,
            fatura_ate_dia: dados.fatura_ate_dia,
            dia_vencimento: dados.dia_vencimento,
            data_contrato: dados.data_contrato,
            data_ultimo_ajuste: dados.data_ultimo_ajuste,
            instrucoes_faturamento: dados.instrucoes_faturamento.clone(),
            tabela_servico_id: dados.tabela_servico_id,
            tabela_base_id: dados.tabela_base_id,
            tabela_material_id: dados.tabela_material_id,
            cnes: dados.cnes.clone(),
            co_participacao: dados.co_participacao.unwrap_or(false),
            nota_fiscal_exige_fatura: dados.nota_fiscal_exige_fatura.unwrap_or(false),
            contato: dados.contato.clone(),
            instrucoes: dados.instrucoes.clone(),
            observacoes_gerais: dados.observacoes_gerais.clone(),
            integracao_id: dados.integracao_id,
            created_at: agora,
            updated_at: agora,
        }
    }

    /// Só os dados do convênio; a empresa é mantida pelo próprio cadastro.
    pub fn aplicar(&mut self, patch: AtualizarConvenioPayload) {
        aplicar_campos!(
            self, patch;
            nome, tiss, co_participacao, nota_fiscal_exige_fatura,
        );
        aplicar_opcionais!(
            self, patch;
            registro_ans, matricula, tipo_convenio_id, forma_liquidacao_id, valor_ch, valor_filme,
            versao_tiss, codigo_operadora_tiss, codigo_operadora_autorizacao, codigo_prestador,
            envio_faturamento_id, fatura_ate_dia, dia_vencimento, data_contrato, data_ultimo_ajuste,
            instrucoes_faturamento, tabela_servico_id, tabela_base_id, tabela_material_id, cnes,
            contato, instrucoes, observacoes_gerais, integracao_id,
        );
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvenioComEmpresa {
    #[serde(flatten)]
    pub convenio: Convenio,
    pub empresa: Empresa,
}

impl ConvenioComEmpresa {
    /// Nome do convênio, razão social, nome fantasia ou CNPJ.
    pub fn contem(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        self.convenio.nome.to_lowercase().contains(&termo) || self.empresa.contem(&termo)
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarConvenioPayload {
    #[validate(nested)]
    pub empresa: DadosEmpresa,
    #[validate(length(min = 1, max = 255, message = "Nome do convênio é obrigatório"))]
    pub nome: String,
    #[validate(length(max = 20))]
    pub registro_ans: Option<String>,
    #[validate(length(max = 50))]
    pub matricula: Option<String>,
    pub tipo_convenio_id: Option<Uuid>,
    pub forma_liquidacao_id: Option<Uuid>,
    pub valor_ch: Option<Decimal>,
    pub valor_filme: Option<Decimal>,
    pub tiss: Option<bool>,
    #[validate(length(max = 20))]
    pub versao_tiss: Option<String>,
    pub codigo_operadora_tiss: Option<String>,
    pub codigo_operadora_autorizacao: Option<String>,
    pub codigo_prestador: Option<String>,
    pub envio_faturamento_id: Option<Uuid>,
    #[validate(range(min = 1, max = 31, message = "Dia deve estar entre 1 e 31"))]
    pub fatura_ate_dia: Option<i32>,
    #[validate(range(min = 1, max = 31, message = "Dia deve estar entre 1 e 31"))]
    pub dia_vencimento: Option<i32>,
    pub data_contrato: Option<NaiveDate>,
    pub data_ultimo_ajuste: Option<NaiveDate>,
    pub instrucoes_faturamento: Option<String>,
    pub tabela_servico_id: Option<Uuid>,
    pub tabela_base_id: Option<Uuid>,
    pub tabela_material_id: Option<Uuid>,
    #[validate(length(max = 20))]
    pub cnes: Option<String>,
    pub co_participacao: Option<bool>,
    pub nota_fiscal_exige_fatura: Option<bool>,
    pub contato: Option<String>,
    pub instrucoes: Option<String>,
    pub observacoes_gerais: Option<String>,
    pub integracao_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarConvenioPayload {
    #[validate(length(min = 1, max = 255))]
    pub nome: Option<String>,
    #[validate(length(max = 20))]
    pub registro_ans: Option<String>,
    #[validate(length(max = 50))]
    pub matricula: Option<String>,
    pub tipo_convenio_id: Option<Uuid>,
    pub forma_liquidacao_id: Option<Uuid>,
    pub valor_ch: Option<Decimal>,
    pub valor_filme: Option<Decimal>,
    pub tiss: Option<bool>,
    #[validate(length(max = 20))]
    pub versao_tiss: Option<String>,
    pub codigo_operadora_tiss: Option<String>,
    pub codigo_operadora_autorizacao: Option<String>,
    pub codigo_prestador: Option<String>,
    pub envio_faturamento_id: Option<Uuid>,
    #[validate(range(min = 1, max = 31, message = "Dia deve estar entre 1 e 31"))]
    pub fatura_ate_dia: Option<i32>,
    #[validate(range(min = 1, max = 31, message = "Dia deve estar entre 1 e 31"))]
    pub dia_vencimento: Option<i32>,
    pub data_contrato: Option<NaiveDate>,
    pub data_ultimo_ajuste: Option<NaiveDate>,
    pub instrucoes_faturamento: Option<String>,
    pub tabela_servico_id: Option<Uuid>,
    pub tabela_base_id: Option<Uuid>,
    pub tabela_material_id: Option<Uuid>,
    #[validate(length(max = 20))]
    pub cnes: Option<String>,
    pub co_participacao: Option<bool>,
    pub nota_fiscal_exige_fatura: Option<bool>,
    pub contato: Option<String>,
    pub instrucoes: Option<String>,
    pub observacoes_gerais: Option<String>,
    pub integracao_id: Option<Uuid>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::empresa::fixtures::dados_empresa;

    pub fn criar_convenio(nome: &str, cnpj: &str, fantasia: &str) -> CriarConvenioPayload {
        CriarConvenioPayload {
            empresa: dados_empresa(cnpj, &format!("{} Operadora S.A.", fantasia), Some(fantasia)),
            nome: nome.into(),
            registro_ans: None,
            matricula: None,
            tipo_convenio_id: None,
            forma_liquidacao_id: None,
            valor_ch: None,
            valor_filme: None,
            tiss: None,
            versao_tiss: None,
            codigo_operadora_tiss: None,
            codigo_operadora_autorizacao: None,
            codigo_prestador: None,
            envio_faturamento_id: None,
            fatura_ate_dia: None,
            dia_vencimento: None,
            data_contrato: None,
            data_ultimo_ajuste: None,
            instrucoes_faturamento: None,
            tabela_servico_id: None,
            tabela_base_id: None,
            tabela_material_id: None,
            cnes: None,
            co_participacao: None,
            nota_fiscal_exige_fatura: None,
            contato: None,
            instrucoes: None,
            observacoes_gerais: None,
            integracao_id: None,
        }
    }
}
