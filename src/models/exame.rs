// src/models/exame.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::exame_unidade::{ExameUnidade, VincularUnidadePayload};

// --- Enums ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "categoria_exame", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CategoriaExame {
    #[default]
    Laboratorio,
    Imagem,
    Procedimento,
    Consulta,
}

/// Situação cadastral compartilhada por exames e laboratórios de apoio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_cadastro", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusCadastro {
    #[default]
    Ativo,
    Inativo,
    Suspenso,
}

impl StatusCadastro {
    /// Aceita apenas os valores do enum; qualquer outra string é `None`.
    pub fn parse(valor: &str) -> Option<Self> {
        match valor {
            "ativo" => Some(Self::Ativo),
            "inativo" => Some(Self::Inativo),
            "suspenso" => Some(Self::Suspenso),
            _ => None,
        }
    }
}

// --- Entidade ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Exame {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "HEM001")]
    pub codigo_interno: String,
    #[schema(example = "Hemograma Completo")]
    pub nome: String,
    pub sinonimos: Vec<String>,

    // Códigos padronizados
    pub codigo_tuss: Option<String>,
    pub codigo_amb: Option<String>,
    pub codigo_sus: Option<String>,
    pub codigo_loinc: Option<String>,
    pub codigo_cbhpm: Option<String>,

    // Classificação
    pub tipo_exame_id: Option<Uuid>,
    pub categoria: CategoriaExame,
    pub subgrupo_id: Option<Uuid>,
    pub setor_id: Option<Uuid>,
    pub especialidade_id: Option<Uuid>,
    pub metodologia_id: Option<Uuid>,
    pub peso: Option<i32>,

    // Coleta
    pub amostra_id: Option<Uuid>,
    pub tipo_recipiente_id: Option<Uuid>,
    pub volume_minimo: Option<Decimal>,
    pub volume_ideal: Option<Decimal>,
    pub requer_peso: bool,
    pub requer_altura: bool,
    pub requer_volume: bool,

    // Preparo e coleta por público
    pub preparo_geral: Option<String>,
    pub preparo_feminino: Option<String>,
    pub preparo_infantil: Option<String>,
    pub coleta_geral: Option<String>,
    pub coleta_feminino: Option<String>,
    pub coleta_infantil: Option<String>,
    pub lembrete_coletora: Option<String>,
    pub lembrete_recepcionista_agendamento: Option<String>,
    pub lembrete_recepcionista_os: Option<String>,
    pub necessita_preparo: bool,
    pub termo_consentimento: Option<String>,

    // Prazos e laudo
    pub prazo_entrega_dias: Option<i32>,
    pub formato_prazo: Option<String>,
    pub formatos_laudo: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub valores_referencia: Option<Value>,

    pub status: StatusCadastro,
    pub empresa_id: Option<Uuid>,
    pub criado_por: Option<Uuid>,
    pub atualizado_por: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exame {
    pub fn novo(tenant_id: Uuid, dados: CriarExamePayload, usuario: Option<Uuid>) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            codigo_interno: dados.codigo_interno,
            nome: dados.nome,
            sinonimos: dados.sinonimos.unwrap_or_default(),
            codigo_tuss: dados.codigo_tuss,
            codigo_amb: dados.codigo_amb,
            codigo_sus: dados.codigo_sus,
            codigo_loinc: dados.codigo_loinc,
            codigo_cbhpm: dados.codigo_cbhpm,
            tipo_exame_id: dados.tipo_exame_id,
            categoria: dados.categoria.unwrap_or_default(),
            subgrupo_id: dados.subgrupo_id,
            setor_id: dados.setor_id,
            especialidade_id: dados.especialidade_id,
            metodologia_id: dados.metodologia_id,
            peso: dados.peso,
            amostra_id: dados.amostra_id,
            tipo_recipiente_id: dados.tipo_recipiente_id,
            volume_minimo: dados.volume_minimo,
            volume_ideal: dados.volume_ideal,
            requer_peso: dados.requer_peso.unwrap_or(false),
            requer_altura: dados.requer_altura.unwrap_or(false),
            requer_volume: dados.requer_volume.unwrap_or(false),
            preparo_geral: dados.preparo_geral,
            preparo_feminino: dados.preparo_feminino,
            preparo_infantil: dados.preparo_infantil,
            coleta_geral: dados.coleta_geral,
            coleta_feminino: dados.coleta_feminino,
            coleta_infantil: dados.coleta_infantil,
            lembrete_coletora: dados.lembrete_coletora,
            lembrete_recepcionista_agendamento: dados.lembrete_recepcionista_agendamento,
            lembrete_recepcionista_os: dados.lembrete_recepcionista_os,
            necessita_preparo: dados.necessita_preparo.unwrap_or(false),
            termo_consentimento: dados.termo_consentimento,
            prazo_entrega_dias: dados.prazo_entrega_dias,
            formato_prazo: dados.formato_prazo,
            formatos_laudo: dados.formatos_laudo.unwrap_or_default(),
            valores_referencia: dados.valores_referencia,
            status: dados.status.unwrap_or_default(),
            empresa_id: dados.empresa_id,
            criado_por: usuario,
            atualizado_por: usuario,
            created_at: agora,
            updated_at: agora,
        }
    }

    pub fn aplicar(&mut self, patch: AtualizarExamePayload, usuario: Option<Uuid>) {
        aplicar_campos!(
            self, patch;
            codigo_interno, nome, sinonimos, categoria, requer_peso, requer_altura,
            requer_volume, necessita_preparo, formatos_laudo, status,
        );
        aplicar_opcionais!(
            self, patch;
            codigo_tuss, codigo_amb, codigo_sus, codigo_loinc, codigo_cbhpm, tipo_exame_id,
            subgrupo_id, setor_id, especialidade_id, metodologia_id, peso, amostra_id,
            tipo_recipiente_id, volume_minimo, volume_ideal, preparo_geral, preparo_feminino,
            preparo_infantil, coleta_geral, coleta_feminino, coleta_infantil, lembrete_coletora,
            lembrete_recepcionista_agendamento, lembrete_recepcionista_os, termo_consentimento,
            prazo_entrega_dias, formato_prazo, valores_referencia, empresa_id,
        );
        if usuario.is_some() {
            self.atualizado_por = usuario;
        }
        self.updated_at = Utc::now();
    }

    /// `"HEM001 - Hemograma Completo"`
    pub fn codigo_formatado(&self) -> String {
        format!("{} - {}", self.codigo_interno, self.nome)
    }

    pub fn prazo_formatado(&self) -> String {
        if let Some(formato) = &self.formato_prazo {
            return formato.clone();
        }
        match self.prazo_entrega_dias {
            Some(dias) => format!("{} dia(s) útil(eis)", dias),
            None => "Não informado".to_string(),
        }
    }
}

/// Exame com campos derivados e as unidades vinculadas (resposta do GET por id).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExameDetalhe {
    #[serde(flatten)]
    pub exame: Exame,
    pub codigo_formatado: String,
    pub prazo_formatado: String,
    pub unidades: Vec<ExameUnidade>,
}

impl ExameDetalhe {
    pub fn new(exame: Exame, unidades: Vec<ExameUnidade>) -> Self {
        Self {
            codigo_formatado: exame.codigo_formatado(),
            prazo_formatado: exame.prazo_formatado(),
            exame,
            unidades,
        }
    }
}

// --- Filtros de consulta ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrdemExames {
    #[default]
    Nome,
    /// Peso decrescente (nulos por último), depois nome.
    PesoDesc,
}

/// Filtro único usado por todas as consultas de listagem de exames.
/// Campos `None` não filtram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiltroExames {
    pub busca: Option<String>,
    /// Estende a busca textual aos sinônimos.
    pub busca_sinonimos: bool,
    pub status: Option<StatusCadastro>,
    pub tipo_exame_id: Option<Uuid>,
    pub especialidade_id: Option<Uuid>,
    pub ids: Option<Vec<Uuid>>,
    pub necessita_preparo: Option<bool>,
    pub codigo_tuss: Option<String>,
    pub codigo_amb: Option<String>,
    pub codigo_sus: Option<String>,
    pub ordem: OrdemExames,
}

impl FiltroExames {
    pub fn ativos() -> Self {
        Self { status: Some(StatusCadastro::Ativo), ..Default::default() }
    }

    /// Mesma regra do SQL do repositório, usada pelos repositórios em memória.
    pub fn aceita(&self, exame: &Exame) -> bool {
        if let Some(busca) = &self.busca {
            let termo = busca.to_lowercase();
            let no_nome = exame.nome.to_lowercase().contains(&termo);
            let nos_sinonimos = self.busca_sinonimos
                && exame.sinonimos.iter().any(|s| s.to_lowercase().contains(&termo));
            if !no_nome && !nos_sinonimos {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != exame.status) {
            return false;
        }
        if self.tipo_exame_id.is_some() && self.tipo_exame_id != exame.tipo_exame_id {
            return false;
        }
        if self.especialidade_id.is_some() && self.especialidade_id != exame.especialidade_id {
            return false;
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&exame.id) {
                return false;
            }
        }
        if self.necessita_preparo.is_some_and(|p| p != exame.necessita_preparo) {
            return false;
        }
        let codigo_confere = |filtro: &Option<String>, valor: &Option<String>| {
            filtro.is_none() || filtro == valor
        };
        codigo_confere(&self.codigo_tuss, &exame.codigo_tuss)
            && codigo_confere(&self.codigo_amb, &exame.codigo_amb)
            && codigo_confere(&self.codigo_sus, &exame.codigo_sus)
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CriarExamePayload {
    #[validate(length(min = 1, max = 50, message = "Código interno deve ter entre 1 e 50 caracteres"))]
    #[schema(example = "HEM001")]
    pub codigo_interno: String,
    #[validate(length(min = 1, max = 255, message = "Nome é obrigatório"))]
    #[schema(example = "Hemograma Completo")]
    pub nome: String,
    pub sinonimos: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub codigo_tuss: Option<String>,
    #[validate(length(max = 20))]
    pub codigo_amb: Option<String>,
    #[validate(length(max = 20))]
    pub codigo_sus: Option<String>,
    #[validate(length(max = 20))]
    pub codigo_loinc: Option<String>,
    #[validate(length(max = 20))]
    pub codigo_cbhpm: Option<String>,
    pub tipo_exame_id: Option<Uuid>,
    pub categoria: Option<CategoriaExame>,
    pub subgrupo_id: Option<Uuid>,
    pub setor_id: Option<Uuid>,
    pub especialidade_id: Option<Uuid>,
    pub metodologia_id: Option<Uuid>,
    #[validate(range(min = 0, message = "Peso não pode ser negativo"))]
    pub peso: Option<i32>,
    pub amostra_id: Option<Uuid>,
    pub tipo_recipiente_id: Option<Uuid>,
    pub volume_minimo: Option<Decimal>,
    pub volume_ideal: Option<Decimal>,
    pub requer_peso: Option<bool>,
    pub requer_altura: Option<bool>,
    pub requer_volume: Option<bool>,
    pub preparo_geral: Option<String>,
    pub preparo_feminino: Option<String>,
    pub preparo_infantil: Option<String>,
    pub coleta_geral: Option<String>,
    pub coleta_feminino: Option<String>,
    pub coleta_infantil: Option<String>,
    pub lembrete_coletora: Option<String>,
    pub lembrete_recepcionista_agendamento: Option<String>,
    pub lembrete_recepcionista_os: Option<String>,
    pub necessita_preparo: Option<bool>,
    pub termo_consentimento: Option<String>,
    #[validate(range(min = 0, message = "Prazo de entrega não pode ser negativo"))]
    pub prazo_entrega_dias: Option<i32>,
    pub formato_prazo: Option<String>,
    pub formatos_laudo: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub valores_referencia: Option<Value>,
    pub status: Option<StatusCadastro>,
    pub empresa_id: Option<Uuid>,
    /// Vínculos com unidades criados junto com o exame.
    #[validate(nested)]
    pub unidades: Option<Vec<VincularUnidadePayload>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AtualizarExamePayload {
    #[validate(length(min = 1, max = 50, message = "Código interno deve ter entre 1 e 50 caracteres"))]
    pub codigo_interno: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub nome: Option<String>,
    pub sinonimos: Option<Vec<String>>,
    pub codigo_tuss: Option<String>,
    pub codigo_amb: Option<String>,
    pub codigo_sus: Option<String>,
    pub codigo_loinc: Option<String>,
    pub codigo_cbhpm: Option<String>,
    pub tipo_exame_id: Option<Uuid>,
    pub categoria: Option<CategoriaExame>,
    pub subgrupo_id: Option<Uuid>,
    pub setor_id: Option<Uuid>,
    pub especialidade_id: Option<Uuid>,
    pub metodologia_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub peso: Option<i32>,
    pub amostra_id: Option<Uuid>,
    pub tipo_recipiente_id: Option<Uuid>,
    pub volume_minimo: Option<Decimal>,
    pub volume_ideal: Option<Decimal>,
    pub requer_peso: Option<bool>,
    pub requer_altura: Option<bool>,
    pub requer_volume: Option<bool>,
    pub preparo_geral: Option<String>,
    pub preparo_feminino: Option<String>,
    pub preparo_infantil: Option<String>,
    pub coleta_geral: Option<String>,
    pub coleta_feminino: Option<String>,
    pub coleta_infantil: Option<String>,
    pub lembrete_coletora: Option<String>,
    pub lembrete_recepcionista_agendamento: Option<String>,
    pub lembrete_recepcionista_os: Option<String>,
    pub necessita_preparo: Option<bool>,
    pub termo_consentimento: Option<String>,
    #[validate(range(min = 0))]
    pub prazo_entrega_dias: Option<i32>,
    pub formato_prazo: Option<String>,
    pub formatos_laudo: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub valores_referencia: Option<Value>,
    pub status: Option<StatusCadastro>,
    pub empresa_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListarExamesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Busca por parte do nome
    pub search: Option<String>,
    pub status: Option<StatusCadastro>,
    pub tipo_exame_id: Option<Uuid>,
    pub especialidade_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CodigosQuery {
    pub tuss: Option<String>,
    pub amb: Option<String>,
    pub sus: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AtualizarStatusEmLotePayload {
    #[validate(length(min = 1, message = "Informe ao menos um exame"))]
    pub ids: Vec<Uuid>,
    /// Validado no serviço: apenas ativo, inativo ou suspenso.
    #[schema(example = "inativo")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exame(prazo: Option<i32>, formato: Option<&str>) -> Exame {
        let mut e = Exame::novo(
            Uuid::new_v4(),
            CriarExamePayload {
                codigo_interno: "HEM001".into(),
                nome: "Hemograma".into(),
                ..Default::default()
            },
            None,
        );
        e.prazo_entrega_dias = prazo;
        e.formato_prazo = formato.map(str::to_string);
        e
    }

    #[test]
    fn novo_exame_nasce_ativo_e_de_laboratorio() {
        let e = exame(None, None);
        assert_eq!(e.status, StatusCadastro::Ativo);
        assert_eq!(e.categoria, CategoriaExame::Laboratorio);
        assert_eq!(e.codigo_formatado(), "HEM001 - Hemograma");
    }

    #[test]
    fn formata_prazo() {
        assert_eq!(exame(None, None).prazo_formatado(), "Não informado");
        assert_eq!(exame(Some(3), None).prazo_formatado(), "3 dia(s) útil(eis)");
        assert_eq!(exame(Some(3), Some("24 horas")).prazo_formatado(), "24 horas");
    }

    #[test]
    fn status_so_aceita_valores_do_enum() {
        assert_eq!(StatusCadastro::parse("suspenso"), Some(StatusCadastro::Suspenso));
        assert_eq!(StatusCadastro::parse("ATIVO"), None);
        assert_eq!(StatusCadastro::parse("excluido"), None);
    }

    #[test]
    fn filtro_busca_em_sinonimos_apenas_quando_pedido() {
        let mut e = exame(None, None);
        e.sinonimos = vec!["Hemo".into(), "CBC".into()];

        let mut filtro = FiltroExames { busca: Some("cbc".into()), ..Default::default() };
        assert!(!filtro.aceita(&e));
        filtro.busca_sinonimos = true;
        assert!(filtro.aceita(&e));
    }
}
