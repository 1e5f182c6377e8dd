// src/models/telemedicina.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::empresa::{DadosEmpresa, Empresa};

// =============================================================================
//  PARCEIRO DE TELEMEDICINA
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_integracao", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoIntegracao {
    ApiRest,
    Webhook,
    Hl7,
    Fhir,
    #[default]
    Manual,
    Dicom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_integracao", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusIntegracao {
    Ativo,
    #[default]
    Inativo,
    Teste,
    Manutencao,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_plataforma", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoPlataforma {
    #[default]
    Web,
    Mobile,
    Desktop,
    Hibrida,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Telemedicina {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub empresa_id: Uuid,
    #[schema(example = "TELE001")]
    pub codigo_telemedicina: String,
    pub tipo_integracao: TipoIntegracao,
    pub url_integracao: Option<String>,
    pub status_integracao: StatusIntegracao,
    pub tipo_plataforma: TipoPlataforma,
    pub url_plataforma: Option<String>,
    pub teleconsulta: bool,
    pub telediagnostico: bool,
    pub telemonitoramento: bool,
    /// Minutos
    pub tempo_consulta_padrao: Option<i32>,
    pub valor_consulta_particular: Option<Decimal>,
    pub percentual_repasse: Option<Decimal>,
    pub integracao_id: Option<Uuid>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Telemedicina {
    pub fn nova(tenant_id: Uuid, empresa_id: Uuid, dados: &CriarTelemedicinaPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            empresa_id,
            codigo_telemedicina: dados.codigo_telemedicina.clone(),
            tipo_integracao: dados.tipo_integracao.unwrap_or_default(),
            url_integracao: dados.url_integracao.clone(),
            status_integracao: dados.status_integracao.unwrap_or_default(),
            tipo_plataforma: dados.tipo_plataforma.unwrap_or_default(),
            url_plataforma: dados.url_plataforma.clone(),
            teleconsulta: dados.teleconsulta.unwrap_or(false),
            telediagnostico: dados.telediagnostico.unwrap_or(false),
            telemonitoramento: dados.telemonitoramento.unwrap_or(false),
            tempo_consulta_padrao: dados.tempo_consulta_padrao,
            valor_consulta_particular: dados.valor_consulta_particular,
            percentual_repasse: dados.percentual_repasse,
            integracao_id: dados.integracao_id,
            observacoes: dados.observacoes.clone(),
            created_at: agora,
            updated_at: agora,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemedicinaComEmpresa {
    #[serde(flatten)]
    pub telemedicina: Telemedicina,
    pub empresa: Empresa,
}

impl TelemedicinaComEmpresa {
    pub fn contem(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        self.telemedicina.codigo_telemedicina.to_lowercase().contains(&termo)
            || self.empresa.contem(&termo)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarTelemedicinaPayload {
    #[validate(nested)]
    pub empresa: DadosEmpresa,
    #[validate(length(min = 1, max = 20, message = "Código deve ter entre 1 e 20 caracteres"))]
    #[schema(example = "TELE001")]
    pub codigo_telemedicina: String,
    pub tipo_integracao: Option<TipoIntegracao>,
    pub url_integracao: Option<String>,
    pub status_integracao: Option<StatusIntegracao>,
    pub tipo_plataforma: Option<TipoPlataforma>,
    pub url_plataforma: Option<String>,
    pub teleconsulta: Option<bool>,
    pub telediagnostico: Option<bool>,
    pub telemonitoramento: Option<bool>,
    #[validate(range(min = 0))]
    pub tempo_consulta_padrao: Option<i32>,
    pub valor_consulta_particular: Option<Decimal>,
    pub percentual_repasse: Option<Decimal>,
    pub integracao_id: Option<Uuid>,
    pub observacoes: Option<String>,
}

/// Só a integração e as observações podem ser alteradas depois do cadastro.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarTelemedicinaPayload {
    pub integracao_id: Option<Uuid>,
    pub observacoes: Option<String>,
}

// =============================================================================
//  MAPEAMENTO EXAME x TELEMEDICINA
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemedicinaExame {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub telemedicina_id: Uuid,
    pub exame_id: Uuid,
    /// Código do exame na plataforma parceira
    pub codigo_telemedicina: Option<String>,
    pub nome_exame_telemedicina: Option<String>,
    pub categoria_telemedicina: Option<String>,
    pub ativo: bool,
    pub permite_upload_imagem: bool,
    pub requer_especialista: bool,
    /// Horas
    pub tempo_laudo_padrao: Option<i32>,
    pub valor_laudo: Option<Decimal>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TelemedicinaExame {
    pub fn novo(tenant_id: Uuid, dados: CriarTelemedicinaExamePayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            telemedicina_id: dados.telemedicina_id,
            exame_id: dados.exame_id,
            codigo_telemedicina: dados.codigo_telemedicina,
            nome_exame_telemedicina: dados.nome_exame_telemedicina,
            categoria_telemedicina: dados.categoria_telemedicina,
            ativo: dados.ativo.unwrap_or(true),
            permite_upload_imagem: dados.permite_upload_imagem.unwrap_or(false),
            requer_especialista: dados.requer_especialista.unwrap_or(false),
            tempo_laudo_padrao: dados.tempo_laudo_padrao,
            valor_laudo: dados.valor_laudo,
            observacoes: dados.observacoes,
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarTelemedicinaExamePayload) {
        aplicar_campos!(
            self, patch;
            telemedicina_id, exame_id, ativo, permite_upload_imagem, requer_especialista,
        );
        aplicar_opcionais!(
            self, patch;
            codigo_telemedicina, nome_exame_telemedicina, categoria_telemedicina,
            tempo_laudo_padrao, valor_laudo, observacoes,
        );
        self.updated_at = Utc::now();
    }

    pub fn contem(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        [
            self.codigo_telemedicina.as_deref(),
            self.nome_exame_telemedicina.as_deref(),
            self.categoria_telemedicina.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|v| v.to_lowercase().contains(&termo))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarTelemedicinaExamePayload {
    pub telemedicina_id: Uuid,
    pub exame_id: Uuid,
    #[validate(length(max = 50))]
    pub codigo_telemedicina: Option<String>,
    #[validate(length(max = 255))]
    pub nome_exame_telemedicina: Option<String>,
    #[validate(length(max = 100))]
    pub categoria_telemedicina: Option<String>,
    pub ativo: Option<bool>,
    pub permite_upload_imagem: Option<bool>,
    pub requer_especialista: Option<bool>,
    #[validate(range(min = 0))]
    pub tempo_laudo_padrao: Option<i32>,
    pub valor_laudo: Option<Decimal>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarTelemedicinaExamePayload {
    pub telemedicina_id: Option<Uuid>,
    pub exame_id: Option<Uuid>,
    #[validate(length(max = 50))]
    pub codigo_telemedicina: Option<String>,
    #[validate(length(max = 255))]
    pub nome_exame_telemedicina: Option<String>,
    #[validate(length(max = 100))]
    pub categoria_telemedicina: Option<String>,
    pub ativo: Option<bool>,
    pub permite_upload_imagem: Option<bool>,
    pub requer_especialista: Option<bool>,
    #[validate(range(min = 0))]
    pub tempo_laudo_padrao: Option<i32>,
    pub valor_laudo: Option<Decimal>,
    pub observacoes: Option<String>,
}

/// Filtro das listagens de mapeamentos. `None` não filtra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiltroTelemedicinaExame {
    pub telemedicina_id: Option<Uuid>,
    pub exame_id: Option<Uuid>,
    pub ativo: Option<bool>,
}

impl FiltroTelemedicinaExame {
    pub fn aceita(&self, v: &TelemedicinaExame) -> bool {
        self.telemedicina_id.is_none_or(|id| id == v.telemedicina_id)
            && self.exame_id.is_none_or(|id| id == v.exame_id)
            && self.ativo.is_none_or(|a| a == v.ativo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResultadoVinculacao {
    pub vinculados: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasTelemedicinaExame {
    pub total: usize,
    pub ativos: usize,
    pub inativos: usize,
    pub com_upload_imagem: usize,
    pub requer_especialista: usize,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EstatisticasQuery {
    pub telemedicina_id: Option<Uuid>,
}
