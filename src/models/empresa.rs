// src/models/empresa.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Discriminador da tabela compartilhada `empresas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_empresa", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoEmpresa {
    PrestadorServico,
    Telemedicina,
    LaboratorioApoio,
    Fornecedor,
    Convenio,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Empresa {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub tipo_empresa: TipoEmpresa,
    #[schema(example = "12.345.678/0001-90")]
    pub cnpj: String,
    #[schema(example = "Manutenção Técnica LTDA")]
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub codigo_interno: Option<String>,
    pub inscricao_estadual: Option<String>,
    pub inscricao_municipal: Option<String>,
    pub telefone_fixo: Option<String>,
    pub celular: Option<String>,
    pub email_comercial: Option<String>,
    pub site_empresa: Option<String>,
    pub cep: Option<String>,
    pub rua: Option<String>,
    pub numero: Option<String>,
    pub bairro: Option<String>,
    pub complemento: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub nome_responsavel: Option<String>,
    pub email_responsavel: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Empresa {
    pub fn nova(tenant_id: Uuid, tipo_empresa: TipoEmpresa, dados: DadosEmpresa) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            tipo_empresa,
            cnpj: dados.cnpj,
            razao_social: dados.razao_social,
            nome_fantasia: dados.nome_fantasia,
            codigo_interno: dados.codigo_interno,
            inscricao_estadual: dados.inscricao_estadual,
            inscricao_municipal: dados.inscricao_municipal,
            telefone_fixo: dados.telefone_fixo,
            celular: dados.celular,
            email_comercial: dados.email_comercial,
            site_empresa: dados.site_empresa,
            cep: dados.cep,
            rua: dados.rua,
            numero: dados.numero,
            bairro: dados.bairro,
            complemento: dados.complemento,
            cidade: dados.cidade,
            estado: dados.estado,
            nome_responsavel: dados.nome_responsavel,
            email_responsavel: dados.email_responsavel,
            ativo: dados.ativo.unwrap_or(true),
            created_at: agora,
            updated_at: agora,
        }
    }

    /// Nome usado nas ordenações: fantasia quando existe, senão a razão social.
    pub fn nome_exibicao(&self) -> &str {
        self.nome_fantasia.as_deref().unwrap_or(&self.razao_social)
    }

    pub fn aplicar(&mut self, patch: AtualizarEmpresa) {
        aplicar_campos!(self, patch; cnpj, razao_social, ativo);
        aplicar_opcionais!(
            self, patch;
            nome_fantasia, codigo_interno, inscricao_estadual, inscricao_municipal,
            telefone_fixo, celular, email_comercial, site_empresa, cep, rua, numero,
            bairro, complemento, cidade, estado, nome_responsavel, email_responsavel,
        );
        self.updated_at = Utc::now();
    }

    /// Campos pesquisáveis da empresa (busca textual dos cadastros ligados a ela).
    pub fn contem(&self, termo_minusculo: &str) -> bool {
        [
            Some(self.razao_social.as_str()),
            self.nome_fantasia.as_deref(),
            Some(self.cnpj.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|v| v.to_lowercase().contains(termo_minusculo))
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DadosEmpresa {
    #[validate(length(min = 14, max = 18, message = "CNPJ deve ter entre 14 e 18 caracteres"))]
    #[schema(example = "12.345.678/0001-90")]
    pub cnpj: String,
    #[validate(length(min = 1, max = 255, message = "Razão social é obrigatória"))]
    pub razao_social: String,
    pub nome_fantasia: Option<String>,
    pub codigo_interno: Option<String>,
    pub inscricao_estadual: Option<String>,
    pub inscricao_municipal: Option<String>,
    pub telefone_fixo: Option<String>,
    pub celular: Option<String>,
    #[validate(email(message = "E-mail comercial inválido"))]
    pub email_comercial: Option<String>,
    pub site_empresa: Option<String>,
    pub cep: Option<String>,
    pub rua: Option<String>,
    pub numero: Option<String>,
    pub bairro: Option<String>,
    pub complemento: Option<String>,
    pub cidade: Option<String>,
    #[validate(length(equal = 2, message = "Estado deve ser a sigla (UF)"))]
    pub estado: Option<String>,
    pub nome_responsavel: Option<String>,
    #[validate(email(message = "E-mail do responsável inválido"))]
    pub email_responsavel: Option<String>,
    pub ativo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarEmpresa {
    #[validate(length(min = 14, max = 18, message = "CNPJ deve ter entre 14 e 18 caracteres"))]
    pub cnpj: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub razao_social: Option<String>,
    pub nome_fantasia: Option<String>,
    pub codigo_interno: Option<String>,
    pub inscricao_estadual: Option<String>,
    pub inscricao_municipal: Option<String>,
    pub telefone_fixo: Option<String>,
    pub celular: Option<String>,
    #[validate(email(message = "E-mail comercial inválido"))]
    pub email_comercial: Option<String>,
    pub site_empresa: Option<String>,
    pub cep: Option<String>,
    pub rua: Option<String>,
    pub numero: Option<String>,
    pub bairro: Option<String>,
    pub complemento: Option<String>,
    pub cidade: Option<String>,
    #[validate(length(equal = 2, message = "Estado deve ser a sigla (UF)"))]
    pub estado: Option<String>,
    pub nome_responsavel: Option<String>,
    #[validate(email(message = "E-mail do responsável inválido"))]
    pub email_responsavel: Option<String>,
    pub ativo: Option<bool>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn dados_empresa(cnpj: &str, razao: &str, fantasia: Option<&str>) -> DadosEmpresa {
        DadosEmpresa {
            cnpj: cnpj.to_string(),
            razao_social: razao.to_string(),
            nome_fantasia: fantasia.map(str::to_string),
            codigo_interno: None,
            inscricao_estadual: None,
            inscricao_municipal: None,
            telefone_fixo: None,
            celular: None,
            email_comercial: None,
            site_empresa: None,
            cep: None,
            rua: None,
            numero: None,
            bairro: None,
            complemento: None,
            cidade: None,
            estado: None,
            nome_responsavel: None,
            email_responsavel: None,
            ativo: None,
        }
    }
}
