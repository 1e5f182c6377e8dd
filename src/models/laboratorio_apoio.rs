// src/models/laboratorio_apoio.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::exame::StatusCadastro;

// =============================================================================
//  LABORATÓRIO DE APOIO (cadastro)
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "forma_envio", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FormaEnvio {
    Api,
    Portal,
    Email,
    #[default]
    Manual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "periodicidade_faturamento", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PeriodicidadeFaturamento {
    #[default]
    Mensal,
    Quinzenal,
    Semanal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LaboratorioApoio {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "LAB001")]
    pub codigo: String,
    #[schema(example = "Laboratório Central")]
    pub nome: String,
    pub razao_social: Option<String>,
    pub cnpj: Option<String>,
    pub tem_integracao_api: bool,
    pub url_api: Option<String>,
    pub forma_envio: FormaEnvio,
    pub url_portal: Option<String>,
    pub email_envio: Option<String>,
    pub prazo_padrao_dias: Option<i32>,
    pub aceita_urgencia: bool,
    pub prazo_urgencia_horas: Option<i32>,
    pub percentual_desconto: Decimal,
    pub periodicidade_faturamento: PeriodicidadeFaturamento,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub contato_nome: Option<String>,
    pub observacoes: Option<String>,
    pub status: StatusCadastro,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LaboratorioApoio {
    pub fn novo(tenant_id: Uuid, dados: CriarLaboratorioPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            codigo: dados.codigo,
            nome: dados.nome,
            razao_social: dados.razao_social,
            cnpj: dados.cnpj,
            tem_integracao_api: dados.tem_integracao_api.unwrap_or(false),
            url_api: dados.url_api,
            forma_envio: dados.forma_envio.unwrap_or_default(),
            url_portal: dados.url_portal,
            email_envio: dados.email_envio,
            prazo_padrao_dias: dados.prazo_padrao_dias,
            aceita_urgencia: dados.aceita_urgencia.unwrap_or(false),
            prazo_urgencia_horas: dados.prazo_urgencia_horas,
            percentual_desconto: dados.percentual_desconto.unwrap_or_default(),
            periodicidade_faturamento: dados.periodicidade_faturamento.unwrap_or_default(),
            telefone: dados.telefone,
            email: dados.email,
            contato_nome: dados.contato_nome,
            observacoes: dados.observacoes,
            status: dados.status.unwrap_or_default(),
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarLaboratorioPayload) {
        aplicar_campos!(
            self, patch;
            codigo, nome, tem_integracao_api, forma_envio, aceita_urgencia,
            percentual_desconto, periodicidade_faturamento, status,
        );
        aplicar_opcionais!(
            self, patch;
            razao_social, cnpj, url_api, url_portal, email_envio, prazo_padrao_dias,
            prazo_urgencia_horas, telefone, email, contato_nome, observacoes,
        );
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CriarLaboratorioPayload {
    #[validate(length(min = 1, max = 20, message = "Código deve ter entre 1 e 20 caracteres"))]
    #[schema(example = "LAB001")]
    pub codigo: String,
    #[validate(length(min = 1, max = 255, message = "Nome é obrigatório"))]
    pub nome: String,
    pub razao_social: Option<String>,
    #[validate(length(min = 14, max = 18))]
    pub cnpj: Option<String>,
    pub tem_integracao_api: Option<bool>,
    pub url_api: Option<String>,
    pub forma_envio: Option<FormaEnvio>,
    pub url_portal: Option<String>,
    #[validate(email)]
    pub email_envio: Option<String>,
    #[validate(range(min = 0))]
    pub prazo_padrao_dias: Option<i32>,
    pub aceita_urgencia: Option<bool>,
    #[validate(range(min = 0))]
    pub prazo_urgencia_horas: Option<i32>,
    pub percentual_desconto: Option<Decimal>,
    pub periodicidade_faturamento: Option<PeriodicidadeFaturamento>,
    pub telefone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub contato_nome: Option<String>,
    pub observacoes: Option<String>,
    pub status: Option<StatusCadastro>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AtualizarLaboratorioPayload {
    #[validate(length(min = 1, max = 20))]
    pub codigo: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub nome: Option<String>,
    pub razao_social: Option<String>,
    #[validate(length(min = 14, max = 18))]
    pub cnpj: Option<String>,
    pub tem_integracao_api: Option<bool>,
    pub url_api: Option<String>,
    pub forma_envio: Option<FormaEnvio>,
    pub url_portal: Option<String>,
    #[validate(email)]
    pub email_envio: Option<String>,
    pub prazo_padrao_dias: Option<i32>,
    pub aceita_urgencia: Option<bool>,
    pub prazo_urgencia_horas: Option<i32>,
    pub percentual_desconto: Option<Decimal>,
    pub periodicidade_faturamento: Option<PeriodicidadeFaturamento>,
    pub telefone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub contato_nome: Option<String>,
    pub observacoes: Option<String>,
    pub status: Option<StatusCadastro>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListarLaboratoriosQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Busca em nome, código e razão social
    pub search: Option<String>,
    pub status: Option<StatusCadastro>,
}

/// Filtro das listagens de laboratórios. `None` não filtra.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiltroLaboratorios {
    /// Nome, código ou razão social
    pub busca: Option<String>,
    pub status: Option<StatusCadastro>,
}

impl FiltroLaboratorios {
    pub fn aceita(&self, lab: &LaboratorioApoio) -> bool {
        if self.status.is_some_and(|s| s != lab.status) {
            return false;
        }
        match &self.busca {
            Some(busca) => {
                let termo = busca.to_lowercase();
                lab.nome.to_lowercase().contains(&termo)
                    || lab.codigo.to_lowercase().contains(&termo)
                    || lab
                        .razao_social
                        .as_deref()
                        .is_some_and(|r| r.to_lowercase().contains(&termo))
            }
            None => true,
        }
    }
}

// =============================================================================
//  CONFIGURAÇÃO EXAME x LABORATÓRIO DE APOIO
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExameLaboratorioApoio {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub exame_id: Uuid,
    pub laboratorio_apoio_id: Uuid,
    #[schema(example = "HEM001")]
    pub codigo_exame_apoio: Option<String>,
    pub metodologia_id: Option<Uuid>,
    pub unidade_medida_id: Option<Uuid>,
    pub requer_peso: bool,
    pub requer_altura: bool,
    pub requer_volume: bool,
    pub amostra_id: Option<Uuid>,
    pub tipo_recipiente_id: Option<Uuid>,
    pub preparo_geral: Option<String>,
    pub preparo_feminino: Option<String>,
    pub preparo_infantil: Option<String>,
    pub coleta_geral: Option<String>,
    pub coleta_feminino: Option<String>,
    pub coleta_infantil: Option<String>,
    pub tecnica_coleta: Option<String>,
    pub lembrete_coletora: Option<String>,
    pub distribuicao: Option<String>,
    pub prazo_entrega_dias: Option<i32>,
    pub formatos_laudo: Vec<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExameLaboratorioApoio {
    pub fn novo(tenant_id: Uuid, dados: CriarExameLaboratorioPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            exame_id: dados.exame_id,
            laboratorio_apoio_id: dados.laboratorio_apoio_id,
            codigo_exame_apoio: dados.codigo_exame_apoio,
            metodologia_id: dados.metodologia_id,
            unidade_medida_id: dados.unidade_medida_id,
            requer_peso: dados.requer_peso.unwrap_or(false),
            requer_altura: dados.requer_altura.unwrap_or(false),
            requer_volume: dados.requer_volume.unwrap_or(false),
            amostra_id: dados.amostra_id,
            tipo_recipiente_id: dados.tipo_recipiente_id,
            preparo_geral: dados.preparo_geral,
            preparo_feminino: dados.preparo_feminino,
            preparo_infantil: dados.preparo_infantil,
            coleta_geral: dados.coleta_geral,
            coleta_feminino: dados.coleta_feminino,
            coleta_infantil: dados.coleta_infantil,
            tecnica_coleta: dados.tecnica_coleta,
            lembrete_coletora: dados.lembrete_coletora,
            distribuicao: dados.distribuicao,
            prazo_entrega_dias: dados.prazo_entrega_dias,
            formatos_laudo: dados.formatos_laudo.unwrap_or_default(),
            ativo: dados.ativo.unwrap_or(true),
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarExameLaboratorioPayload) {
        aplicar_campos!(
            self, patch;
            laboratorio_apoio_id, requer_peso, requer_altura, requer_volume, formatos_laudo, ativo,
        );
        aplicar_opcionais!(
            self, patch;
            codigo_exame_apoio, metodologia_id, unidade_medida_id, amostra_id,
            tipo_recipiente_id, preparo_geral, preparo_feminino, preparo_infantil,
            coleta_geral, coleta_feminino, coleta_infantil, tecnica_coleta,
            lembrete_coletora, distribuicao, prazo_entrega_dias,
        );
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CriarExameLaboratorioPayload {
    pub exame_id: Uuid,
    pub laboratorio_apoio_id: Uuid,
    #[validate(length(max = 50))]
    pub codigo_exame_apoio: Option<String>,
    pub metodologia_id: Option<Uuid>,
    pub unidade_medida_id: Option<Uuid>,
    pub requer_peso: Option<bool>,
    pub requer_altura: Option<bool>,
    pub requer_volume: Option<bool>,
    pub amostra_id: Option<Uuid>,
    pub tipo_recipiente_id: Option<Uuid>,
    pub preparo_geral: Option<String>,
    pub preparo_feminino: Option<String>,
    pub preparo_infantil: Option<String>,
    pub coleta_geral: Option<String>,
    pub coleta_feminino: Option<String>,
    pub coleta_infantil: Option<String>,
    pub tecnica_coleta: Option<String>,
    pub lembrete_coletora: Option<String>,
    pub distribuicao: Option<String>,
    #[validate(range(min = 0, message = "Prazo de entrega não pode ser negativo"))]
    pub prazo_entrega_dias: Option<i32>,
    pub formatos_laudo: Option<Vec<String>>,
    pub ativo: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AtualizarExameLaboratorioPayload {
    pub laboratorio_apoio_id: Option<Uuid>,
    #[validate(length(max = 50))]
    pub codigo_exame_apoio: Option<String>,
    pub metodologia_id: Option<Uuid>,
    pub unidade_medida_id: Option<Uuid>,
    pub requer_peso: Option<bool>,
    pub requer_altura: Option<bool>,
    pub requer_volume: Option<bool>,
    pub amostra_id: Option<Uuid>,
    pub tipo_recipiente_id: Option<Uuid>,
    pub preparo_geral: Option<String>,
    pub preparo_feminino: Option<String>,
    pub preparo_infantil: Option<String>,
    pub coleta_geral: Option<String>,
    pub coleta_feminino: Option<String>,
    pub coleta_infantil: Option<String>,
    pub tecnica_coleta: Option<String>,
    pub lembrete_coletora: Option<String>,
    pub distribuicao: Option<String>,
    #[validate(range(min = 0))]
    pub prazo_entrega_dias: Option<i32>,
    pub formatos_laudo: Option<Vec<String>>,
    pub ativo: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CriarLotePayload {
    #[validate(length(min = 1, message = "Informe ao menos um item"))]
    pub items: Vec<CriarExameLaboratorioPayload>,
}

/// Falha de um item do lote, com a posição dele no payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErroLote {
    pub index: usize,
    pub message: String,
}

/// Resultado parcial: o que entrou e o que falhou.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultadoLote {
    pub created: Vec<ExameLaboratorioApoio>,
    pub errors: Vec<ErroLote>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListarExameLaboratorioQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub exame_id: Option<Uuid>,
}
