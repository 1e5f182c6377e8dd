// src/models/ordem_servico.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
//  EXAME DA ORDEM DE SERVIÇO
// =============================================================================

// Fluxo: pendente -> aguardando_coleta -> coletado -> enviado_apoio -> em_analise -> liberado.
// `repetir` corre em paralelo e `cancelado` é terminal. Nenhuma transição é bloqueada.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_exame_os", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusExameOs {
    #[default]
    Pendente,
    AguardandoColeta,
    Coletado,
    EnviadoApoio,
    EmAnalise,
    Liberado,
    Repetir,
    Cancelado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OrdemServicoExame {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub ordem_servico_id: Uuid,
    pub exame_id: Uuid,
    pub laboratorio_apoio_id: Option<Uuid>,
    pub codigo_amostra: Option<String>,
    pub codigo_barras: Option<String>,
    pub status: StatusExameOs,
    pub valor_total: Decimal,
    pub valor_desconto: Decimal,
    pub is_urgente: bool,
    pub is_repeticao: bool,
    pub motivo_repeticao: Option<String>,
    pub data_coleta: Option<DateTime<Utc>>,
    pub coletado_por: Option<Uuid>,
    pub data_envio_apoio: Option<DateTime<Utc>>,
    pub data_inicio_analise: Option<DateTime<Utc>>,
    pub analista_id: Option<Uuid>,
    pub data_liberacao: Option<DateTime<Utc>>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrdemServicoExame {
    pub fn novo(tenant_id: Uuid, ordem_servico_id: Uuid, dados: AdicionarExameOsPayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            ordem_servico_id,
            exame_id: dados.exame_id,
            laboratorio_apoio_id: dados.laboratorio_apoio_id,
            codigo_amostra: dados.codigo_amostra,
            codigo_barras: dados.codigo_barras,
            status: StatusExameOs::Pendente,
            valor_total: dados.valor_total.unwrap_or_default(),
            valor_desconto: dados.valor_desconto.unwrap_or_default(),
            is_urgente: dados.is_urgente.unwrap_or(false),
            is_repeticao: false,
            motivo_repeticao: None,
            data_coleta: None,
            coletado_por: None,
            data_envio_apoio: None,
            data_inicio_analise: None,
            analista_id: None,
            data_liberacao: None,
            observacoes: dados.observacoes,
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn is_coletado(&self) -> bool {
        matches!(
            self.status,
            StatusExameOs::Coletado
                | StatusExameOs::EnviadoApoio
                | StatusExameOs::EmAnalise
                | StatusExameOs::Liberado
        )
    }

    pub fn is_liberado(&self) -> bool {
        self.status == StatusExameOs::Liberado
    }

    pub fn needs_repeat(&self) -> bool {
        self.status == StatusExameOs::Repetir
    }

    /// Realizado fora (laboratório de apoio).
    pub fn is_external(&self) -> bool {
        self.laboratorio_apoio_id.is_some()
    }

    pub fn can_collect(&self) -> bool {
        matches!(self.status, StatusExameOs::Pendente | StatusExameOs::AguardandoColeta)
    }

    pub fn can_release(&self) -> bool {
        self.status == StatusExameOs::EmAnalise
    }

    pub fn valor_liquido(&self) -> Decimal {
        self.valor_total - self.valor_desconto
    }

    /// Atribui o status sem checar transição e carimba a data correspondente.
    pub fn mudar_status(&mut self, dados: AtualizarStatusOsPayload) {
        let agora = Utc::now();
        match dados.status {
            StatusExameOs::Coletado => {
                self.data_coleta = Some(agora);
                if dados.usuario_id.is_some() {
                    self.coletado_por = dados.usuario_id;
                }
            }
            StatusExameOs::EnviadoApoio => self.data_envio_apoio = Some(agora),
            StatusExameOs::EmAnalise => {
                self.data_inicio_analise = Some(agora);
                if dados.usuario_id.is_some() {
                    self.analista_id = dados.usuario_id;
                }
            }
            StatusExameOs::Liberado => self.data_liberacao = Some(agora),
            StatusExameOs::Repetir => {
                self.is_repeticao = true;
                self.motivo_repeticao = dados.motivo;
            }
            _ => {}
        }
        if let Some(obs) = dados.observacoes {
            self.observacoes = Some(obs);
        }
        self.status = dados.status;
        self.updated_at = agora;
    }
}

/// Linha da OS com os predicados de fluxo já avaliados.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrdemServicoExameResposta {
    #[serde(flatten)]
    pub exame: OrdemServicoExame,
    pub valor_liquido: Decimal,
    pub is_coletado: bool,
    pub is_liberado: bool,
    pub is_external: bool,
    pub needs_repeat: bool,
    pub can_collect: bool,
    pub can_release: bool,
}

impl From<OrdemServicoExame> for OrdemServicoExameResposta {
    fn from(exame: OrdemServicoExame) -> Self {
        Self {
            valor_liquido: exame.valor_liquido(),
            is_coletado: exame.is_coletado(),
            is_liberado: exame.is_liberado(),
            is_external: exame.is_external(),
            needs_repeat: exame.needs_repeat(),
            can_collect: exame.can_collect(),
            can_release: exame.can_release(),
            exame,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AdicionarExameOsPayload {
    pub exame_id: Uuid,
    pub laboratorio_apoio_id: Option<Uuid>,
    #[validate(length(max = 50))]
    pub codigo_amostra: Option<String>,
    #[validate(length(max = 50))]
    pub codigo_barras: Option<String>,
    pub valor_total: Option<Decimal>,
    pub valor_desconto: Option<Decimal>,
    pub is_urgente: Option<bool>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AtualizarStatusOsPayload {
    pub status: StatusExameOs,
    /// Quem coletou (coletado) ou analisa (em_analise).
    pub usuario_id: Option<Uuid>,
    pub motivo: Option<String>,
    pub observacoes: Option<String>,
}

// =============================================================================
//  RESULTADOS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "classificacao_resultado", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClassificacaoResultado {
    #[default]
    Normal,
    Alterado,
    Critico,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ResultadoExame {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub ordem_servico_exame_id: Uuid,
    pub exame_id: Uuid,
    #[schema(example = "Hemoglobina")]
    pub parametro: String,
    pub resultado: Option<String>,
    pub resultado_numerico: Option<Decimal>,
    pub resultado_texto: Option<String>,
    pub unidade: Option<String>,
    pub valor_referencia: Option<String>,
    pub valor_minimo: Option<Decimal>,
    pub valor_maximo: Option<Decimal>,
    pub classificacao: ClassificacaoResultado,
    pub flag: Option<String>,
    pub fora_referencia: bool,
    pub valor_critico: bool,
    pub metodo: Option<String>,
    pub observacoes: Option<String>,
    pub versao: i32,
    #[schema(value_type = Vec<Object>)]
    pub historico_versoes: Value,
    pub data_revisao: Option<DateTime<Utc>>,
    pub revisado_por: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultadoExame {
    pub fn novo(tenant_id: Uuid, os_exame: &OrdemServicoExame, dados: RegistrarResultadoPayload) -> Self {
        let agora = Utc::now();
        let mut resultado = Self {
            id: Uuid::new_v4(),
            tenant_id,
            ordem_servico_exame_id: os_exame.id,
            exame_id: os_exame.exame_id,
            parametro: dados.parametro,
            resultado: dados.resultado,
            resultado_numerico: dados.resultado_numerico,
            resultado_texto: dados.resultado_texto,
            unidade: dados.unidade,
            valor_referencia: dados.valor_referencia,
            valor_minimo: dados.valor_minimo,
            valor_maximo: dados.valor_maximo,
            classificacao: dados.classificacao.unwrap_or_default(),
            flag: dados.flag,
            fora_referencia: false,
            valor_critico: false,
            metodo: dados.metodo,
            observacoes: dados.observacoes,
            versao: 1,
            historico_versoes: Value::Array(Vec::new()),
            data_revisao: None,
            revisado_por: None,
            created_at: agora,
            updated_at: agora,
        };
        resultado.avaliar_referencia();
        resultado
    }

    pub fn is_critico(&self) -> bool {
        self.classificacao == ClassificacaoResultado::Critico
    }

    // Recalcula as flags a partir do valor numérico e da faixa de referência.
    fn avaliar_referencia(&mut self) {
        self.fora_referencia = match self.resultado_numerico {
            Some(v) => {
                self.valor_minimo.is_some_and(|min| v < min)
                    || self.valor_maximo.is_some_and(|max| v > max)
            }
            None => false,
        };
        self.valor_critico = self.is_critico();
    }

    /// Empilha a versão atual no histórico, aplica os novos valores e incrementa a versão.
    pub fn revisar(&mut self, dados: RevisarResultadoPayload, usuario: Option<Uuid>) {
        let agora = Utc::now();
        let entrada = json!({
            "versao": self.versao,
            "resultado": self.resultado,
            "resultado_numerico": self.resultado_numerico,
            "resultado_texto": self.resultado_texto,
            "classificacao": self.classificacao,
            "data": agora,
            "usuario": usuario,
        });
        match self.historico_versoes.as_array_mut() {
            Some(historico) => historico.push(entrada),
            None => self.historico_versoes = Value::Array(vec![entrada]),
        }

        aplicar_opcionais!(self, dados; resultado, resultado_numerico, resultado_texto, observacoes);
        if let Some(classificacao) = dados.classificacao {
            self.classificacao = classificacao;
        }
        self.versao += 1;
        self.data_revisao = Some(agora);
        self.revisado_por = usuario;
        self.updated_at = agora;
        self.avaliar_referencia();
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegistrarResultadoPayload {
    #[validate(length(min = 1, max = 255, message = "Parâmetro é obrigatório"))]
    pub parametro: String,
    pub resultado: Option<String>,
    pub resultado_numerico: Option<Decimal>,
    pub resultado_texto: Option<String>,
    pub unidade: Option<String>,
    pub valor_referencia: Option<String>,
    pub valor_minimo: Option<Decimal>,
    pub valor_maximo: Option<Decimal>,
    pub classificacao: Option<ClassificacaoResultado>,
    pub flag: Option<String>,
    pub metodo: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RevisarResultadoPayload {
    pub resultado: Option<String>,
    pub resultado_numerico: Option<Decimal>,
    pub resultado_texto: Option<String>,
    pub classificacao: Option<ClassificacaoResultado>,
    pub observacoes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn linha(status: StatusExameOs) -> OrdemServicoExame {
        let mut l = OrdemServicoExame::novo(
            Uuid::new_v4(),
            Uuid::new_v4(),
            AdicionarExameOsPayload { exame_id: Uuid::new_v4(), ..Default::default() },
        );
        l.status = status;
        l
    }

    #[rstest]
    #[case(StatusExameOs::Pendente, true, false, false)]
    #[case(StatusExameOs::AguardandoColeta, true, false, false)]
    #[case(StatusExameOs::Coletado, false, false, true)]
    #[case(StatusExameOs::EnviadoApoio, false, false, true)]
    #[case(StatusExameOs::EmAnalise, false, true, true)]
    #[case(StatusExameOs::Liberado, false, false, true)]
    #[case(StatusExameOs::Repetir, false, false, false)]
    #[case(StatusExameOs::Cancelado, false, false, false)]
    fn predicados_de_fluxo(
        #[case] status: StatusExameOs,
        #[case] coleta: bool,
        #[case] libera: bool,
        #[case] coletado: bool,
    ) {
        let l = linha(status);
        assert_eq!(l.can_collect(), coleta);
        assert_eq!(l.can_release(), libera);
        assert_eq!(l.is_coletado(), coletado);
    }

    #[test]
    fn status_pode_pular_etapas() {
        let mut l = linha(StatusExameOs::Pendente);
        l.mudar_status(AtualizarStatusOsPayload {
            status: StatusExameOs::Liberado,
            usuario_id: None,
            motivo: None,
            observacoes: None,
        });
        assert!(l.is_liberado());
        assert!(l.data_liberacao.is_some());
        assert!(l.data_coleta.is_none());
    }

    #[test]
    fn valor_liquido_desconta() {
        let mut l = linha(StatusExameOs::Pendente);
        l.valor_total = Decimal::new(10000, 2);
        l.valor_desconto = Decimal::new(1550, 2);
        assert_eq!(l.valor_liquido(), Decimal::new(8450, 2));
    }

    #[test]
    fn revisao_guarda_historico_e_incrementa_versao() {
        let os = linha(StatusExameOs::EmAnalise);
        let mut r = ResultadoExame::novo(
            Uuid::new_v4(),
            &os,
            RegistrarResultadoPayload {
                parametro: "Hemoglobina".into(),
                resultado: Some("13.5".into()),
                resultado_numerico: Some(Decimal::new(135, 1)),
                valor_minimo: Some(Decimal::new(120, 1)),
                valor_maximo: Some(Decimal::new(160, 1)),
                ..Default::default()
            },
        );
        assert_eq!(r.versao, 1);
        assert!(!r.fora_referencia);

        let revisor = Uuid::new_v4();
        r.revisar(
            RevisarResultadoPayload {
                resultado: Some("9.0".into()),
                resultado_numerico: Some(Decimal::new(90, 1)),
                classificacao: Some(ClassificacaoResultado::Critico),
                ..Default::default()
            },
            Some(revisor),
        );

        assert_eq!(r.versao, 2);
        assert!(r.fora_referencia);
        assert!(r.is_critico() && r.valor_critico);
        let historico = r.historico_versoes.as_array().unwrap();
        assert_eq!(historico.len(), 1);
        assert_eq!(historico[0]["versao"], 1);
        assert_eq!(historico[0]["resultado"], "13.5");
        assert_eq!(historico[0]["classificacao"], "normal");
        assert_eq!(r.revisado_por, Some(revisor));
    }
}
