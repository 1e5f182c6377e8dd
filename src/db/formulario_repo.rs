// src/db/formulario_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::formulario::{FiltroFormularios, Formulario},
};

pub(crate) const MSG_CODIGO_DUPLICADO: &str = "Já existe um formulário com este código";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormularioRepository: Send + Sync {
    async fn insert(&self, formulario: &Formulario) -> Result<(), AppError>;

    async fn update(&self, formulario: &Formulario) -> Result<(), AppError>;

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Formulario>, AppError>;

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<Formulario>, AppError>;

    /// Ordenado pelo nome.
    async fn list(&self, tenant_id: Uuid, filtro: &FiltroFormularios) -> Result<Vec<Formulario>, AppError>;
}

#[derive(Clone)]
pub struct PgFormularioRepository {
    pool: PgPool,
}

impl PgFormularioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn filtro_formularios(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filtro: &FiltroFormularios) {
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
    if let Some(tipo) = filtro.tipo {
        qb.push(" AND tipo = ").push_bind(tipo);
    }
    if let Some(status) = filtro.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(unidade) = filtro.unidade_saude_id {
        qb.push(" AND unidade_saude_id = ").push_bind(unidade);
    }
    if let Some(ativo) = filtro.ativo {
        qb.push(" AND ativo = ").push_bind(ativo);
    }
    if let Some(busca) = &filtro.busca {
        let padrao = format!("%{}%", busca);
        qb.push(" AND (codigo_formulario ILIKE ")
            .push_bind(padrao.clone())
            .push(" OR nome_formulario ILIKE ")
            .push_bind(padrao.clone())
            .push(" OR descricao ILIKE ")
            .push_bind(padrao)
            .push(")");
    }
}

#[async_trait]
impl FormularioRepository for PgFormularioRepository {
    async fn insert(&self, f: &Formulario) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO formularios (
                id, tenant_id, codigo_formulario, nome_formulario, descricao, tipo, categoria,
                unidade_saude_id, versao, status, ativo, obrigatorio, permite_edicao,
                requer_assinatura, permite_anexos, max_anexos, campos, formulario_pai_id,
                data_publicacao, observacoes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(f.id)
        .bind(f.tenant_id)
        .bind(&f.codigo_formulario)
        .bind(&f.nome_formulario)
        .bind(&f.descricao)
        .bind(f.tipo)
        .bind(f.categoria)
        .bind(f.unidade_saude_id)
        .bind(f.versao)
        .bind(f.status)
        .bind(f.ativo)
        .bind(f.obrigatorio)
        .bind(f.permite_edicao)
        .bind(f.requer_assinatura)
        .bind(f.permite_anexos)
        .bind(f.max_anexos)
        .bind(&f.campos)
        .bind(f.formulario_pai_id)
        .bind(f.data_publicacao)
        .bind(&f.observacoes)
        .bind(f.created_at)
        .bind(f.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;
        Ok(())
    }

    async fn update(&self, f: &Formulario) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE formularios SET
                codigo_formulario = $3, nome_formulario = $4, descricao = $5, tipo = $6,
                categoria = $7, unidade_saude_id = $8, status = $9, ativo = $10,
                obrigatorio = $11, permite_edicao = $12, requer_assinatura = $13,
                permite_anexos = $14, max_anexos = $15, campos = $16, data_publicacao = $17,
                observacoes = $18, updated_at = $19
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(f.id)
        .bind(f.tenant_id)
        .bind(&f.codigo_formulario)
        .bind(&f.nome_formulario)
        .bind(&f.descricao)
        .bind(f.tipo)
        .bind(f.categoria)
        .bind(f.unidade_saude_id)
        .bind(f.status)
        .bind(f.ativo)
        .bind(f.obrigatorio)
        .bind(f.permite_edicao)
        .bind(f.requer_assinatura)
        .bind(f.permite_anexos)
        .bind(f.max_anexos)
        .bind(&f.campos)
        .bind(f.data_publicacao)
        .bind(&f.observacoes)
        .bind(f.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM formularios WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Formulario>, AppError> {
        let formulario = sqlx::query_as::<_, Formulario>(
            "SELECT * FROM formularios WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(formulario)
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<Formulario>, AppError> {
        let formulario = sqlx::query_as::<_, Formulario>(
            "SELECT * FROM formularios WHERE tenant_id = $1 AND codigo_formulario = $2",
        )
        .bind(tenant_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(formulario)
    }

    async fn list(&self, tenant_id: Uuid, filtro: &FiltroFormularios) -> Result<Vec<Formulario>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM formularios");
        filtro_formularios(&mut qb, tenant_id, filtro);
        qb.push(" ORDER BY nome_formulario ASC, versao ASC");

        let formularios = qb.build_query_as::<Formulario>().fetch_all(&self.pool).await?;
        Ok(formularios)
    }
}
