// src/models/prestador.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::empresa::{AtualizarEmpresa, DadosEmpresa, Empresa};

// =============================================================================
//  PRESTADOR DE SERVIÇO
// =============================================================================

// --- Enums ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_contrato", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoContrato {
    Fixo,
    #[default]
    PorDemanda,
    Retainer,
    Projeto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "forma_pagamento_prestador", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FormaPagamentoPrestador {
    Mensalidade,
    #[default]
    PorServico,
    HoraTrabalhada,
    PacoteFechado,
    Comissao,
    Misto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_contrato", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusContrato {
    Ativo,
    Inativo,
    Suspenso,
    #[default]
    EmAnalise,
    Cancelado,
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrestadorServico {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub empresa_id: Uuid,
    #[schema(example = "PSV001")]
    pub codigo_prestador: String,
    pub tipo_contrato: TipoContrato,
    pub numero_contrato: Option<String>,
    pub data_inicio_contrato: Option<NaiveDate>,
    pub data_fim_contrato: Option<NaiveDate>,
    pub renovacao_automatica: bool,
    pub prazo_aviso_renovacao: Option<i32>,
    pub forma_pagamento: FormaPagamentoPrestador,
    pub valor_hora: Option<Decimal>,
    pub valor_mensal: Option<Decimal>,
    pub valor_minimo: Option<Decimal>,
    pub prazo_pagamento: i32,
    pub dia_vencimento: Option<i32>,
    pub status_contrato: StatusContrato,
    /// Horas para primeira resposta
    pub sla_resposta: Option<i32>,
    /// Horas para resolução
    pub sla_resolucao: Option<i32>,
    pub suporte_24x7: bool,
    pub atende_urgencia: bool,
    pub taxa_urgencia: Option<Decimal>,
    pub avaliacao_media: Option<Decimal>,
    pub total_avaliacoes: i32,
    pub total_servicos_prestados: i32,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrestadorServico {
    pub fn novo(tenant_id: Uuid, empresa_id: Uuid, dados: &CriarPrestadorPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            empresa_id,
            codigo_prestador: dados.codigo_prestador.clone(),
            tipo_contrato: dados.tipo_contrato.unwrap_or_default(),
            numero_contrato: dados.numero_contrato.clone(),
            data_inicio_contrato: dados.data_inicio_contrato,
            data_fim_contrato: dados.data_fim_contrato,
            renovacao_automatica: dados.renovacao_automatica.unwrap_or(false),
            prazo_aviso_renovacao: dados.prazo_aviso_renovacao,
            forma_pagamento: dados.forma_pagamento.unwrap_or_default(),
            valor_hora: dados.valor_hora,
            valor_mensal: dados.valor_mensal,
            valor_minimo: dados.valor_minimo,
            prazo_pagamento: dados.prazo_pagamento.unwrap_or(30),
            dia_vencimento: dados.dia_vencimento,
            status_contrato: dados.status_contrato.unwrap_or_default(),
            sla_resposta: dados.sla_resposta,
            sla_resolucao: dados.sla_resolucao,
            suporte_24x7: dados.suporte_24x7.unwrap_or(false),
            atende_urgencia: dados.atende_urgencia.unwrap_or(false),
            taxa_urgencia: dados.taxa_urgencia,
            avaliacao_media: None,
            total_avaliacoes: 0,
            total_servicos_prestados: 0,
            observacoes: dados.observacoes.clone(),
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarPrestadorPayload) {
        aplicar_campos!(
            self, patch;
            codigo_prestador, tipo_contrato, renovacao_automatica, forma_pagamento,
            prazo_pagamento, status_contrato, suporte_24x7, atende_urgencia,
        );
        aplicar_opcionais!(
            self, patch;
            numero_contrato, data_inicio_contrato, data_fim_contrato, prazo_aviso_renovacao,
            valor_hora, valor_mensal, valor_minimo, dia_vencimento, sla_resposta,
            sla_resolucao, taxa_urgencia, observacoes,
        );
        self.updated_at = Utc::now();
    }

    /// Incorpora uma nota (1 a 5) na média, arredondada em 2 casas.
    pub fn registrar_avaliacao(&mut self, nota: u8) {
        let total_atual = Decimal::from(self.total_avaliacoes);
        let soma = self.avaliacao_media.unwrap_or_default() * total_atual + Decimal::from(nota);
        self.total_avaliacoes += 1;
        self.avaliacao_media = Some((soma / Decimal::from(self.total_avaliacoes)).round_dp(2));
        self.updated_at = Utc::now();
    }
}

/// Prestador com a empresa dona do cadastro.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrestadorComEmpresa {
    #[serde(flatten)]
    pub prestador: PrestadorServico,
    pub empresa: Empresa,
}

impl PrestadorComEmpresa {
    pub fn contem(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        self.prestador.codigo_prestador.to_lowercase().contains(&termo)
            || self
                .prestador
                .observacoes
                .as_deref()
                .is_some_and(|o| o.to_lowercase().contains(&termo))
            || self.empresa.contem(&termo)
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarPrestadorPayload {
    #[validate(nested)]
    pub empresa: DadosEmpresa,
    #[validate(length(min = 3, max = 20, message = "Código deve ter entre 3 e 20 caracteres"))]
    #[schema(example = "PSV001")]
    pub codigo_prestador: String,
    pub tipo_contrato: Option<TipoContrato>,
    pub numero_contrato: Option<String>,
    pub data_inicio_contrato: Option<NaiveDate>,
    pub data_fim_contrato: Option<NaiveDate>,
    pub renovacao_automatica: Option<bool>,
    #[validate(range(min = 0))]
    pub prazo_aviso_renovacao: Option<i32>,
    pub forma_pagamento: Option<FormaPagamentoPrestador>,
    pub valor_hora: Option<Decimal>,
    pub valor_mensal: Option<Decimal>,
    pub valor_minimo: Option<Decimal>,
    #[validate(range(min = 0, max = 365))]
    pub prazo_pagamento: Option<i32>,
    #[validate(range(min = 1, max = 31, message = "Dia de vencimento deve estar entre 1 e 31"))]
    pub dia_vencimento: Option<i32>,
    pub status_contrato: Option<StatusContrato>,
    #[validate(range(min = 0))]
    pub sla_resposta: Option<i32>,
    #[validate(range(min = 0))]
    pub sla_resolucao: Option<i32>,
    pub suporte_24x7: Option<bool>,
    pub atende_urgencia: Option<bool>,
    pub taxa_urgencia: Option<Decimal>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarPrestadorPayload {
    #[validate(nested)]
    pub empresa: Option<AtualizarEmpresa>,
    #[validate(length(min = 3, max = 20))]
    pub codigo_prestador: Option<String>,
    pub tipo_contrato: Option<TipoContrato>,
    pub numero_contrato: Option<String>,
    pub data_inicio_contrato: Option<NaiveDate>,
    pub data_fim_contrato: Option<NaiveDate>,
    pub renovacao_automatica: Option<bool>,
    pub prazo_aviso_renovacao: Option<i32>,
    pub forma_pagamento: Option<FormaPagamentoPrestador>,
    pub valor_hora: Option<Decimal>,
    pub valor_mensal: Option<Decimal>,
    pub valor_minimo: Option<Decimal>,
    #[validate(range(min = 0, max = 365))]
    pub prazo_pagamento: Option<i32>,
    #[validate(range(min = 1, max = 31))]
    pub dia_vencimento: Option<i32>,
    pub status_contrato: Option<StatusContrato>,
    pub sla_resposta: Option<i32>,
    pub sla_resolucao: Option<i32>,
    pub suporte_24x7: Option<bool>,
    pub atende_urgencia: Option<bool>,
    pub taxa_urgencia: Option<Decimal>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarStatusContratoPayload {
    pub status_contrato: StatusContrato,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvaliarPayload {
    #[schema(example = 5)]
    pub nota: i32,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BuscaQuery {
    pub termo: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContratosVencendoQuery {
    /// Janela em dias (padrão 30)
    pub dias: Option<i64>,
}

// --- Relatórios ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumoPrestadores {
    pub total: usize,
    pub ativos: usize,
    pub inativos: usize,
    pub suspensos: usize,
    pub em_analise: usize,
    pub com_24x7: usize,
    pub com_urgencia: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasPrestadores {
    pub resumo: ResumoPrestadores,
    pub melhores_avaliados: Vec<PrestadorComEmpresa>,
    pub mais_servicos: Vec<PrestadorComEmpresa>,
}

// =============================================================================
//  CATEGORIAS DE SERVIÇO DO PRESTADOR
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_servico_categoria", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoServicoCategoria {
    ManutencaoEquipamentos,
    PrestadoresExames,
    HonorarioContabeis,
    HonorarioConsultoria,
    HonorarioAdvocaticio,
    InternetTelefonia,
    Agua,
    Energia,
    SuporteSoftware,
    DesenvolvimentoSoftware,
    SegurancaMonitoramento,
    OutrosServicosPf,
    OutrosServicosPj,
    LimpezaConservacao,
    TransporteLogistica,
    MarketingPublicidade,
    RecursosHumanos,
    TreinamentoCapacitacao,
    ArquiteturaEngenharia,
    VigilanciaSanitaria,
    CalibracaoMetrologia,
}

impl TipoServicoCategoria {
    pub const TODOS: [TipoServicoCategoria; 21] = [
        Self::ManutencaoEquipamentos,
        Self::PrestadoresExames,
        Self::HonorarioContabeis,
        Self::HonorarioConsultoria,
        Self::HonorarioAdvocaticio,
        Self::InternetTelefonia,
        Self::Agua,
        Self::Energia,
        Self::SuporteSoftware,
        Self::DesenvolvimentoSoftware,
        Self::SegurancaMonitoramento,
        Self::OutrosServicosPf,
        Self::OutrosServicosPj,
        Self::LimpezaConservacao,
        Self::TransporteLogistica,
        Self::MarketingPublicidade,
        Self::RecursosHumanos,
        Self::TreinamentoCapacitacao,
        Self::ArquiteturaEngenharia,
        Self::VigilanciaSanitaria,
        Self::CalibracaoMetrologia,
    ];

    /// Valor usado no JSON e no enum do banco.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManutencaoEquipamentos => "manutencao_equipamentos",
            Self::PrestadoresExames => "prestadores_exames",
            Self::HonorarioContabeis => "honorario_contabeis",
            Self::HonorarioConsultoria => "honorario_consultoria",
            Self::HonorarioAdvocaticio => "honorario_advocaticio",
            Self::InternetTelefonia => "internet_telefonia",
            Self::Agua => "agua",
            Self::Energia => "energia",
            Self::SuporteSoftware => "suporte_software",
            Self::DesenvolvimentoSoftware => "desenvolvimento_software",
            Self::SegurancaMonitoramento => "seguranca_monitoramento",
            Self::OutrosServicosPf => "outros_servicos_pf",
            Self::OutrosServicosPj => "outros_servicos_pj",
            Self::LimpezaConservacao => "limpeza_conservacao",
            Self::TransporteLogistica => "transporte_logistica",
            Self::MarketingPublicidade => "marketing_publicidade",
            Self::RecursosHumanos => "recursos_humanos",
            Self::TreinamentoCapacitacao => "treinamento_capacitacao",
            Self::ArquiteturaEngenharia => "arquitetura_engenharia",
            Self::VigilanciaSanitaria => "vigilancia_sanitaria",
            Self::CalibracaoMetrologia => "calibracao_metrologia",
        }
    }
}

impl std::fmt::Display for TipoServicoCategoria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrestadorServicoCategoria {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub prestador_servico_id: Uuid,
    pub tipo_servico: TipoServicoCategoria,
    pub descricao_servico: Option<String>,
    pub valor_padrao: Option<Decimal>,
    pub unidade_medida: Option<String>,
    /// Dias
    pub prazo_execucao: Option<i32>,
    pub periodicidade: Option<String>,
    pub responsavel_tecnico: Option<String>,
    pub telefone_responsavel: Option<String>,
    pub email_responsavel: Option<String>,
    pub requer_aprovacao: bool,
    pub requer_orcamento: bool,
    pub valor_limite_sem_aprovacao: Option<Decimal>,
    pub ativo: bool,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrestadorServicoCategoria {
    pub fn nova(tenant_id: Uuid, dados: CriarCategoriaPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            prestador_servico_id: dados.prestador_servico_id,
            tipo_servico: dados.tipo_servico,
            descricao_servico: dados.descricao_servico,
            valor_padrao: dados.valor_padrao,
            unidade_medida: dados.unidade_medida,
            prazo_execucao: dados.prazo_execucao,
            periodicidade: dados.periodicidade,
            responsavel_tecnico: dados.responsavel_tecnico,
            telefone_responsavel: dados.telefone_responsavel,
            email_responsavel: dados.email_responsavel,
            requer_aprovacao: dados.requer_aprovacao.unwrap_or(true),
            requer_orcamento: dados.requer_orcamento.unwrap_or(false),
            valor_limite_sem_aprovacao: dados.valor_limite_sem_aprovacao,
            ativo: dados.ativo.unwrap_or(true),
            observacoes: dados.observacoes,
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarCategoriaPayload) {
        aplicar_campos!(self, patch; tipo_servico, requer_aprovacao, requer_orcamento, ativo);
        aplicar_opcionais!(
            self, patch;
            descricao_servico, valor_padrao, unidade_medida, prazo_execucao, periodicidade,
            responsavel_tecnico, telefone_responsavel, email_responsavel,
            valor_limite_sem_aprovacao, observacoes,
        );
        self.updated_at = Utc::now();
    }
}

/// Filtro das listagens de categorias. `None` não filtra.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiltroCategorias {
    pub prestador_id: Option<Uuid>,
    pub tipo_servico: Option<TipoServicoCategoria>,
    pub ativo: Option<bool>,
}

impl FiltroCategorias {
    pub fn aceita(&self, c: &PrestadorServicoCategoria) -> bool {
        self.prestador_id.is_none_or(|id| id == c.prestador_servico_id)
            && self.tipo_servico.is_none_or(|t| t == c.tipo_servico)
            && self.ativo.is_none_or(|a| a == c.ativo)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarCategoriaPayload {
    pub prestador_servico_id: Uuid,
    pub tipo_servico: TipoServicoCategoria,
    pub descricao_servico: Option<String>,
    pub valor_padrao: Option<Decimal>,
    #[validate(length(max = 50))]
    pub unidade_medida: Option<String>,
    #[validate(range(min = 0))]
    pub prazo_execucao: Option<i32>,
    #[validate(length(max = 50))]
    pub periodicidade: Option<String>,
    pub responsavel_tecnico: Option<String>,
    pub telefone_responsavel: Option<String>,
    #[validate(email(message = "E-mail do responsável inválido"))]
    pub email_responsavel: Option<String>,
    pub requer_aprovacao: Option<bool>,
    pub requer_orcamento: Option<bool>,
    pub valor_limite_sem_aprovacao: Option<Decimal>,
    pub ativo: Option<bool>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarCategoriaPayload {
    pub tipo_servico: Option<TipoServicoCategoria>,
    pub descricao_servico: Option<String>,
    pub valor_padrao: Option<Decimal>,
    #[validate(length(max = 50))]
    pub unidade_medida: Option<String>,
    #[validate(range(min = 0))]
    pub prazo_execucao: Option<i32>,
    #[validate(length(max = 50))]
    pub periodicidade: Option<String>,
    pub responsavel_tecnico: Option<String>,
    pub telefone_responsavel: Option<String>,
    #[validate(email)]
    pub email_responsavel: Option<String>,
    pub requer_aprovacao: Option<bool>,
    pub requer_orcamento: Option<bool>,
    pub valor_limite_sem_aprovacao: Option<Decimal>,
    pub ativo: Option<bool>,
    pub observacoes: Option<String>,
}

/// Item do import em lote: o prestador vem da rota.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportarCategoriaItem {
    pub tipo_servico: TipoServicoCategoria,
    pub descricao_servico: Option<String>,
    pub valor_padrao: Option<Decimal>,
    pub unidade_medida: Option<String>,
    pub prazo_execucao: Option<i32>,
    pub periodicidade: Option<String>,
    pub responsavel_tecnico: Option<String>,
    pub requer_aprovacao: Option<bool>,
    pub requer_orcamento: Option<bool>,
    pub valor_limite_sem_aprovacao: Option<Decimal>,
    pub observacoes: Option<String>,
}

impl ImportarCategoriaItem {
    pub fn como_atualizacao(self) -> AtualizarCategoriaPayload {
        AtualizarCategoriaPayload {
            tipo_servico: Some(self.tipo_servico),
            descricao_servico: self.descricao_servico,
            valor_padrao: self.valor_padrao,
            unidade_medida: self.unidade_medida,
            prazo_execucao: self.prazo_execucao,
            periodicidade: self.periodicidade,
            responsavel_tecnico: self.responsavel_tecnico,
            requer_aprovacao: self.requer_aprovacao,
            requer_orcamento: self.requer_orcamento,
            valor_limite_sem_aprovacao: self.valor_limite_sem_aprovacao,
            observacoes: self.observacoes,
            ..Default::default()
        }
    }

    pub fn como_criacao(self, prestador_servico_id: Uuid) -> CriarCategoriaPayload {
        CriarCategoriaPayload {
            prestador_servico_id,
            tipo_servico: self.tipo_servico,
            descricao_servico: self.descricao_servico,
            valor_padrao: self.valor_padrao,
            unidade_medida: self.unidade_medida,
            prazo_execucao: self.prazo_execucao,
            periodicidade: self.periodicidade,
            responsavel_tecnico: self.responsavel_tecnico,
            telefone_responsavel: None,
            email_responsavel: None,
            requer_aprovacao: self.requer_aprovacao,
            requer_orcamento: self.requer_orcamento,
            valor_limite_sem_aprovacao: self.valor_limite_sem_aprovacao,
            ativo: None,
            observacoes: self.observacoes,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ImportarCategoriasPayload {
    #[validate(length(min = 1, message = "Informe ao menos uma categoria"))]
    pub categorias: Vec<ImportarCategoriaItem>,
}

// --- Relatórios de categorias ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EstatisticaTipo {
    pub tipo: TipoServicoCategoria,
    pub total: usize,
    pub ativos: usize,
    pub inativos: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumoCategoriasPrestador {
    pub total: usize,
    pub ativas: usize,
    pub inativas: usize,
    pub com_orcamento: usize,
    pub com_aprovacao: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PorTipoPrestador {
    pub total: usize,
    pub ativas: usize,
    /// Média de `valorPadrao` das categorias que têm valor
    pub valor_medio: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasCategoriasPrestador {
    pub resumo: ResumoCategoriasPrestador,
    pub por_tipo: std::collections::BTreeMap<TipoServicoCategoria, PorTipoPrestador>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrestadorDaCategoria {
    pub id: Uuid,
    pub codigo: String,
    pub nome: String,
    pub valor_padrao: Option<Decimal>,
    pub prazo_execucao: Option<i32>,
    pub responsavel_tecnico: Option<String>,
    pub requer_orcamento: bool,
    pub requer_aprovacao: bool,
}
