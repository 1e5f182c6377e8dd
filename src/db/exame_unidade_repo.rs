// src/db/exame_unidade_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::exame_unidade::ExameUnidade};

const MSG_DUPLICADO: &str = "Exame já vinculado a esta unidade";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExameUnidadeRepository: Send + Sync {
    async fn insert(&self, vinculo: &ExameUnidade) -> Result<(), AppError>;

    async fn update(&self, vinculo: &ExameUnidade) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ExameUnidade>, AppError>;

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        unidade_id: Uuid,
    ) -> Result<Option<ExameUnidade>, AppError>;

    async fn list_by_exame(&self, tenant_id: Uuid, exame_id: Uuid) -> Result<Vec<ExameUnidade>, AppError>;

    async fn list_by_unidade(&self, tenant_id: Uuid, unidade_id: Uuid) -> Result<Vec<ExameUnidade>, AppError>;

    /// Vínculos ativos que mandam o exame para o laboratório de apoio informado.
    async fn list_ativos_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameUnidade>, AppError>;

    /// `true` se alguma linha foi removida.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgExameUnidadeRepository {
    pool: PgPool,
}

impl PgExameUnidadeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Também usado dentro da transação de criação do exame.
pub(crate) async fn inserir_vinculo<'e, E>(executor: E, v: &ExameUnidade) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO exames_unidades (
            id, tenant_id, exame_id, unidade_id, destino,
            laboratorio_apoio_id, telemedicina_id, ativo, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(v.id)
    .bind(v.tenant_id)
    .bind(v.exame_id)
    .bind(v.unidade_id)
    .bind(v.destino)
    .bind(v.laboratorio_apoio_id)
    .bind(v.telemedicina_id)
    .bind(v.ativo)
    .bind(v.created_at)
    .bind(v.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl ExameUnidadeRepository for PgExameUnidadeRepository {
    async fn insert(&self, vinculo: &ExameUnidade) -> Result<(), AppError> {
        inserir_vinculo(&self.pool, vinculo)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_DUPLICADO))
    }

    async fn update(&self, v: &ExameUnidade) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE exames_unidades
            SET destino = $3, laboratorio_apoio_id = $4, telemedicina_id = $5,
                ativo = $6, updated_at = $7
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(v.id)
        .bind(v.tenant_id)
        .bind(v.destino)
        .bind(v.laboratorio_apoio_id)
        .bind(v.telemedicina_id)
        .bind(v.ativo)
        .bind(v.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ExameUnidade>, AppError> {
        let vinculo = sqlx::query_as::<_, ExameUnidade>(
            "SELECT * FROM exames_unidades WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vinculo)
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        unidade_id: Uuid,
    ) -> Result<Option<ExameUnidade>, AppError> {
        let vinculo = sqlx::query_as::<_, ExameUnidade>(
            "SELECT * FROM exames_unidades WHERE tenant_id = $1 AND exame_id = $2 AND unidade_id = $3",
        )
        .bind(tenant_id)
        .bind(exame_id)
        .bind(unidade_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vinculo)
    }

    async fn list_by_exame(&self, tenant_id: Uuid, exame_id: Uuid) -> Result<Vec<ExameUnidade>, AppError> {
        let vinculos = sqlx::query_as::<_, ExameUnidade>(
            "SELECT * FROM exames_unidades WHERE tenant_id = $1 AND exame_id = $2 ORDER BY created_at",
        )
        .bind(tenant_id)
        .bind(exame_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vinculos)
    }

    async fn list_by_unidade(&self, tenant_id: Uuid, unidade_id: Uuid) -> Result<Vec<ExameUnidade>, AppError> {
        let vinculos = sqlx::query_as::<_, ExameUnidade>(
            "SELECT * FROM exames_unidades WHERE tenant_id = $1 AND unidade_id = $2 ORDER BY created_at",
        )
        .bind(tenant_id)
        .bind(unidade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vinculos)
    }

    async fn list_ativos_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameUnidade>, AppError> {
        let vinculos = sqlx::query_as::<_, ExameUnidade>(
            r#"
            SELECT * FROM exames_unidades
            WHERE tenant_id = $1 AND laboratorio_apoio_id = $2 AND ativo = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(laboratorio_apoio_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(vinculos)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM exames_unidades WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
