// src/models/exame_unidade.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_utils::anulavel;

// Onde o exame é realizado quando pedido naquela unidade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "destino_exame", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DestinoExame {
    #[default]
    Interno,
    Apoio,
    Telemedicina,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExameUnidade {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub exame_id: Uuid,
    pub unidade_id: Uuid,
    pub destino: DestinoExame,
    pub laboratorio_apoio_id: Option<Uuid>,
    pub telemedicina_id: Option<Uuid>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExameUnidade {
    pub fn novo(tenant_id: Uuid, exame_id: Uuid, dados: VincularUnidadePayload) -> Self {
        let agora = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            exame_id,
            unidade_id: dados.unidade_id,
            destino: dados.destino.unwrap_or_default(),
            laboratorio_apoio_id: dados.laboratorio_apoio_id,
            telemedicina_id: dados.telemedicina_id,
            ativo: dados.ativo.unwrap_or(true),
            created_at: agora,
            updated_at: agora,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VincularUnidadePayload {
    pub unidade_id: Uuid,
    /// Padrão: interno
    pub destino: Option<DestinoExame>,
    pub laboratorio_apoio_id: Option<Uuid>,
    pub telemedicina_id: Option<Uuid>,
    pub ativo: Option<bool>,
}

// `null` explícito limpa o vínculo; campo ausente mantém o valor gravado.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct AtualizarUnidadePayload {
    pub destino: Option<DestinoExame>,
    #[serde(default, deserialize_with = "anulavel")]
    #[schema(value_type = Option<Uuid>)]
    pub laboratorio_apoio_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "anulavel")]
    #[schema(value_type = Option<Uuid>)]
    pub telemedicina_id: Option<Option<Uuid>>,
    pub ativo: Option<bool>,
}

impl AtualizarUnidadePayload {
    /// O patch mexe em algum campo que participa da regra de destino?
    pub fn altera_destino(&self) -> bool {
        self.destino.is_some() || self.laboratorio_apoio_id.is_some() || self.telemedicina_id.is_some()
    }
}
