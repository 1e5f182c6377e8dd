// src/models/formulario.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
//  FORMULÁRIOS CONFIGURÁVEIS (anamnese, laudo, questionário...)
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_formulario", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoFormulario {
    Exame,
    Anamnese,
    Prescricao,
    Laudo,
    Receita,
    Atestado,
    Declaracao,
    Questionario,
    FichaClinica,
    Evolucao,
    TermoConsentimento,
    #[default]
    Customizado,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_formulario", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusFormulario {
    #[default]
    Rascunho,
    Publicado,
    Arquivado,
    EmRevisao,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "categoria_formulario", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CategoriaFormulario {
    Clinico,
    Administrativo,
    Financeiro,
    Operacional,
    Qualidade,
    Pesquisa,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TipoCampo {
    #[default]
    Texto,
    TextoLongo,
    Email,
    Telefone,
    Cpf,
    Numero,
    Decimal,
    Moeda,
    Porcentagem,
    Data,
    Hora,
    DataHora,
    Select,
    Radio,
    Checkbox,
    MultiplaEscolha,
    Arquivo,
    Imagem,
    Assinatura,
    Secao,
    Tabela,
    Formula,
}

/// Um campo da definição. Gravado dentro da coluna JSONB `campos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampoFormulario {
    #[validate(length(min = 1, max = 100, message = "Código do campo é obrigatório"))]
    pub codigo_campo: String,
    #[validate(length(min = 1, max = 255))]
    pub nome_campo: String,
    #[serde(default)]
    pub tipo_campo: TipoCampo,
    #[serde(default)]
    pub ordem: i32,
    #[serde(default)]
    pub obrigatorio: bool,
    /// Para `select`, `radio` e `multipla_escolha`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opcoes: Vec<String>,
    pub unidade_medida: Option<String>,
    pub valor_padrao: Option<String>,
    pub texto_ajuda: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Formulario {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "ANAMNESE_GERAL")]
    pub codigo_formulario: String,
    pub nome_formulario: String,
    pub descricao: Option<String>,
    pub tipo: TipoFormulario,
    pub categoria: Option<CategoriaFormulario>,
    pub unidade_saude_id: Option<Uuid>,
    pub versao: i32,
    pub status: StatusFormulario,
    pub ativo: bool,
    pub obrigatorio: bool,
    pub permite_edicao: bool,
    pub requer_assinatura: bool,
    pub permite_anexos: bool,
    pub max_anexos: Option<i32>,
    #[schema(value_type = Vec<CampoFormulario>)]
    pub campos: Json<Vec<CampoFormulario>>,
    /// Formulário de origem quando este é uma nova versão
    pub formulario_pai_id: Option<Uuid>,
    pub data_publicacao: Option<DateTime<Utc>>,
    pub observacoes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Formulario {
    pub fn novo(tenant_id: Uuid, dados: CriarFormularioPayload) -> Self {
        let agora = Utc::now();
        let mut campos = dados.campos;
        campos.sort_by_key(|c| c.ordem);
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            codigo_formulario: dados.codigo_formulario,
            nome_formulario: dados.nome_formulario,
            descricao: dados.descricao,
            tipo: dados.tipo.unwrap_or_default(),
            categoria: dados.categoria,
            unidade_saude_id: dados.unidade_saude_id,
            versao: 1,
            status: StatusFormulario::Rascunho,
            ativo: dados.ativo.unwrap_or(true),
            obrigatorio: dados.obrigatorio.unwrap_or(false),
            permite_edicao: dados.permite_edicao.unwrap_or(true),
            requer_assinatura: dados.requer_assinatura.unwrap_or(false),
            permite_anexos: dados.permite_anexos.unwrap_or(false),
            max_anexos: dados.max_anexos,
            campos: Json(campos),
            formulario_pai_id: None,
            data_publicacao: None,
            observacoes: dados.observacoes,
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarFormularioPayload) {
        aplicar_campos!(
            self, patch;
            codigo_formulario, nome_formulario, tipo, ativo, obrigatorio, permite_edicao,
            requer_assinatura, permite_anexos,
        );
        aplicar_opcionais!(
            self, patch;
            descricao, categoria, unidade_saude_id, max_anexos, observacoes,
        );
        if let Some(mut campos) = patch.campos {
            campos.sort_by_key(|c| c.ordem);
            self.campos = Json(campos);
        }
        self.updated_at = Utc::now();
    }

    pub fn publicado(&self) -> bool {
        self.status == StatusFormulario::Publicado
    }

    /// Cópia em rascunho com `versao + 1` e código `{codigo}_V{n}`.
    pub fn nova_versao(&self) -> Self {
        let agora = Utc::now();
        let versao = self.versao + 1;
        Self {
            id: Uuid::new_v4(),
            codigo_formulario: format!("{}_V{}", self.codigo_formulario, versao),
            versao,
            status: StatusFormulario::Rascunho,
            formulario_pai_id: Some(self.id),
            data_publicacao: None,
            created_at: agora,
            updated_at: agora,
            ..self.clone()
        }
    }

    /// Pelo menos um campo, um deles obrigatório, e códigos sem repetição.
    pub fn validar(&self) -> ResultadoValidacao {
        let mut erros = Vec::new();
        let campos = &self.campos.0;

        if campos.is_empty() {
            erros.push("Formulário deve ter pelo menos um campo".to_string());
        } else if !campos.iter().any(|c| c.obrigatorio) {
            erros.push("Formulário deve ter pelo menos um campo obrigatório".to_string());
        }

        let mut vistos = BTreeSet::new();
        let duplicados: BTreeSet<&str> = campos
            .iter()
            .map(|c| c.codigo_campo.as_str())
            .filter(|codigo| !vistos.insert(*codigo))
            .collect();
        if !duplicados.is_empty() {
            let lista: Vec<&str> = duplicados.into_iter().collect();
            erros.push(format!("Códigos de campos duplicados: {}", lista.join(", ")));
        }

        ResultadoValidacao { valido: erros.is_empty(), erros }
    }

    /// Código, nome ou descrição.
    pub fn contem(&self, termo: &str) -> bool {
        let termo = termo.to_lowercase();
        [Some(self.codigo_formulario.as_str()), Some(self.nome_formulario.as_str()), self.descricao.as_deref()]
            .into_iter()
            .flatten()
            .any(|v| v.to_lowercase().contains(&termo))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResultadoValidacao {
    pub valido: bool,
    pub erros: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstatisticasFormularios {
    pub total: usize,
    pub ativos: usize,
    pub inativos: usize,
    pub publicados: usize,
    pub por_tipo: BTreeMap<String, usize>,
    pub por_status: BTreeMap<String, usize>,
}

impl EstatisticasFormularios {
    pub fn de(formularios: &[Formulario]) -> Self {
        let mut stats = Self { total: formularios.len(), ..Default::default() };
        for f in formularios {
            if f.ativo {
                stats.ativos += 1;
            } else {
                stats.inativos += 1;
            }
            if f.publicado() {
                stats.publicados += 1;
            }
            *stats.por_tipo.entry(texto_serde(&f.tipo)).or_default() += 1;
            *stats.por_status.entry(texto_serde(&f.status)).or_default() += 1;
        }
        stats
    }
}

// Valor snake_case do enum como aparece no JSON.
fn texto_serde<T: Serialize>(valor: &T) -> String {
    match serde_json::to_value(valor) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriarFormularioPayload {
    #[validate(length(min = 1, max = 50, message = "Código deve ter entre 1 e 50 caracteres"))]
    pub codigo_formulario: String,
    #[validate(length(min = 1, max = 255, message = "Nome do formulário é obrigatório"))]
    pub nome_formulario: String,
    pub descricao: Option<String>,
    pub tipo: Option<TipoFormulario>,
    pub categoria: Option<CategoriaFormulario>,
    pub unidade_saude_id: Option<Uuid>,
    pub ativo: Option<bool>,
    pub obrigatorio: Option<bool>,
    pub permite_edicao: Option<bool>,
    pub requer_assinatura: Option<bool>,
    pub permite_anexos: Option<bool>,
    #[validate(range(min = 0))]
    pub max_anexos: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub campos: Vec<CampoFormulario>,
    pub observacoes: Option<String>,
}

/// `campos`, quando presente, substitui a definição inteira.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarFormularioPayload {
    #[validate(length(min = 1, max = 50))]
    pub codigo_formulario: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub nome_formulario: Option<String>,
    pub descricao: Option<String>,
    pub tipo: Option<TipoFormulario>,
    pub categoria: Option<CategoriaFormulario>,
    pub unidade_saude_id: Option<Uuid>,
    pub ativo: Option<bool>,
    pub obrigatorio: Option<bool>,
    pub permite_edicao: Option<bool>,
    pub requer_assinatura: Option<bool>,
    pub permite_anexos: Option<bool>,
    #[validate(range(min = 0))]
    pub max_anexos: Option<i32>,
    #[validate(nested)]
    pub campos: Option<Vec<CampoFormulario>>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct AlterarStatusFormularioPayload {
    pub status: StatusFormulario,
}

/// Filtro das listagens. `None` não filtra.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FiltroFormularios {
    pub tipo: Option<TipoFormulario>,
    pub status: Option<StatusFormulario>,
    pub unidade_saude_id: Option<Uuid>,
    pub ativo: Option<bool>,
    /// Código, nome ou descrição
    pub busca: Option<String>,
}

impl FiltroFormularios {
    pub fn aceita(&self, f: &Formulario) -> bool {
        self.tipo.is_none_or(|t| t == f.tipo)
            && self.status.is_none_or(|s| s == f.status)
            && self.unidade_saude_id.is_none_or(|u| Some(u) == f.unidade_saude_id)
            && self.ativo.is_none_or(|a| a == f.ativo)
            && self.busca.as_deref().is_none_or(|b| f.contem(b))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn campo(codigo: &str, obrigatorio: bool) -> CampoFormulario {
        CampoFormulario {
            codigo_campo: codigo.into(),
            nome_campo: codigo.to_uppercase(),
            tipo_campo: TipoCampo::Texto,
            ordem: 0,
            obrigatorio,
            opcoes: Vec::new(),
            unidade_medida: None,
            valor_padrao: None,
            texto_ajuda: None,
        }
    }

    pub fn criar_formulario(codigo: &str, campos: Vec<CampoFormulario>) -> CriarFormularioPayload {
        CriarFormularioPayload {
            codigo_formulario: codigo.into(),
            nome_formulario: format!("Formulário {}", codigo),
            descricao: None,
            tipo: Some(TipoFormulario::Anamnese),
            categoria: Some(CategoriaFormulario::Clinico),
            unidade_saude_id: None,
            ativo: None,
            obrigatorio: None,
            permite_edicao: None,
            requer_assinatura: None,
            permite_anexos: None,
            max_anexos: None,
            campos,
            observacoes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::{campo, criar_formulario};

    #[test]
    fn novo_comeca_em_rascunho_na_versao_1() {
        let f = Formulario::novo(Uuid::new_v4(), criar_formulario("ANAMNESE", vec![]));
        assert_eq!(f.versao, 1);
        assert_eq!(f.status, StatusFormulario::Rascunho);
        assert!(f.ativo);
        assert!(f.campos.is_empty());
    }

    #[test]
    fn campos_ficam_na_ordem_declarada() {
        let mut peso = campo("peso", true);
        peso.ordem = 2;
        let mut altura = campo("altura", false);
        altura.ordem = 1;
        let f = Formulario::novo(Uuid::new_v4(), criar_formulario("ANAMNESE", vec![peso, altura]));
        assert_eq!(f.campos[0].codigo_campo, "altura");
    }

    #[test]
    fn validacao_aponta_cada_problema() {
        let vazio = Formulario::novo(Uuid::new_v4(), criar_formulario("A", vec![]));
        assert_eq!(vazio.validar().erros, vec!["Formulário deve ter pelo menos um campo"]);

        let sem_obrigatorio = Formulario::novo(
            Uuid::new_v4(),
            criar_formulario("B", vec![campo("peso", false), campo("peso", false), campo("pa", false)]),
        );
        let resultado = sem_obrigatorio.validar();
        assert!(!resultado.valido);
        assert_eq!(
            resultado.erros,
            vec![
                "Formulário deve ter pelo menos um campo obrigatório".to_string(),
                "Códigos de campos duplicados: peso".to_string(),
            ]
        );

        let ok = Formulario::novo(Uuid::new_v4(), criar_formulario("C", vec![campo("peso", true)]));
        assert_eq!(ok.validar(), ResultadoValidacao { valido: true, erros: vec![] });
    }

    #[test]
    fn nova_versao_aponta_para_o_pai() {
        let mut f = Formulario::novo(Uuid::new_v4(), criar_formulario("LAUDO", vec![campo("conclusao", true)]));
        f.status = StatusFormulario::Publicado;

        let v2 = f.nova_versao();

        assert_ne!(v2.id, f.id);
        assert_eq!(v2.codigo_formulario, "LAUDO_V2");
        assert_eq!(v2.versao, 2);
        assert_eq!(v2.status, StatusFormulario::Rascunho);
        assert_eq!(v2.formulario_pai_id, Some(f.id));
        assert_eq!(v2.campos.0, f.campos.0);
    }

    #[test]
    fn campos_sao_lidos_do_json_com_padroes() {
        let json = r#"{"codigoFormulario":"Q1","nomeFormulario":"Questionário",
            "campos":[{"codigoCampo":"fuma","nomeCampo":"Fuma?","tipoCampo":"radio","opcoes":["sim","nao"]}]}"#;
        let dados: CriarFormularioPayload = serde_json::from_str(json).unwrap();
        assert_eq!(dados.campos[0].tipo_campo, TipoCampo::Radio);
        assert!(!dados.campos[0].obrigatorio);
        assert!(dados.validate().is_ok());
    }

    #[test]
    fn campo_sem_codigo_invalida_o_payload() {
        let mut dados = criar_formulario("Q1", vec![campo("", true)]);
        dados.nome_formulario = "Questionário".into();
        assert!(dados.validate().is_err());
    }

    #[test]
    fn estatisticas_por_tipo_e_status() {
        let tenant = Uuid::new_v4();
        let mut a = Formulario::novo(tenant, criar_formulario("A", vec![]));
        a.status = StatusFormulario::Publicado;
        let mut b = Formulario::novo(tenant, criar_formulario("B", vec![]));
        b.ativo = false;
        b.tipo = TipoFormulario::FichaClinica;

        let stats = EstatisticasFormularios::de(&[a, b]);

        assert_eq!((stats.total, stats.ativos, stats.inativos, stats.publicados), (2, 1, 1, 1));
        assert_eq!(stats.por_tipo.get("ficha_clinica"), Some(&1));
        assert_eq!(stats.por_status.get("rascunho"), Some(&1));
    }
}
