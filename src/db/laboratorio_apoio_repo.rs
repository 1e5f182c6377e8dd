// src/db/laboratorio_apoio_repo.rs

use async_trait::async_trait;
use sqlx::{Connection, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::laboratorio_apoio::{ExameLaboratorioApoio, FiltroLaboratorios, LaboratorioApoio},
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe um laboratório de apoio com este código";
const MSG_PAR_DUPLICADO: &str = "Este exame já está configurado para este laboratório de apoio";

// =============================================================================
//  LABORATÓRIO DE APOIO
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LaboratorioApoioRepository: Send + Sync {
    async fn insert(&self, lab: &LaboratorioApoio) -> Result<(), AppError>;

    async fn update(&self, lab: &LaboratorioApoio) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<LaboratorioApoio>, AppError>;

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<LaboratorioApoio>, AppError>;

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroLaboratorios,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<LaboratorioApoio>, i64), AppError>;
}

#[derive(Clone)]
pub struct PgLaboratorioApoioRepository {
    pool: PgPool,
}

impl PgLaboratorioApoioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn filtro_laboratorios(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filtro: &FiltroLaboratorios) {
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
    if let Some(status) = filtro.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(busca) = &filtro.busca {
        let padrao = format!("%{}%", busca);
        qb.push(" AND (nome ILIKE ")
            .push_bind(padrao.clone())
            .push(" OR codigo ILIKE ")
            .push_bind(padrao.clone())
            .push(" OR razao_social ILIKE ")
            .push_bind(padrao)
            .push(")");
    }
}

#[async_trait]
impl LaboratorioApoioRepository for PgLaboratorioApoioRepository {
    async fn insert(&self, l: &LaboratorioApoio) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO laboratorios_apoio (
                id, tenant_id, codigo, nome, razao_social, cnpj,
                tem_integracao_api, url_api, forma_envio, url_portal, email_envio,
                prazo_padrao_dias, aceita_urgencia, prazo_urgencia_horas,
                percentual_desconto, periodicidade_faturamento,
                telefone, email, contato_nome, observacoes, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(l.id)
        .bind(l.tenant_id)
        .bind(&l.codigo)
        .bind(&l.nome)
        .bind(&l.razao_social)
        .bind(&l.cnpj)
        .bind(l.tem_integracao_api)
        .bind(&l.url_api)
        .bind(l.forma_envio)
        .bind(&l.url_portal)
        .bind(&l.email_envio)
        .bind(l.prazo_padrao_dias)
        .bind(l.aceita_urgencia)
        .bind(l.prazo_urgencia_horas)
        .bind(l.percentual_desconto)
        .bind(l.periodicidade_faturamento)
        .bind(&l.telefone)
        .bind(&l.email)
        .bind(&l.contato_nome)
        .bind(&l.observacoes)
        .bind(l.status)
        .bind(l.created_at)
        .bind(l.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;
        Ok(())
    }

    async fn update(&self, l: &LaboratorioApoio) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE laboratorios_apoio SET
                codigo = $3, nome = $4, razao_social = $5, cnpj = $6,
                tem_integracao_api = $7, url_api = $8, forma_envio = $9, url_portal = $10,
                email_envio = $11, prazo_padrao_dias = $12, aceita_urgencia = $13,
                prazo_urgencia_horas = $14, percentual_desconto = $15,
                periodicidade_faturamento = $16, telefone = $17, email = $18,
                contato_nome = $19, observacoes = $20, status = $21, updated_at = $22
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(l.id)
        .bind(l.tenant_id)
        .bind(&l.codigo)
        .bind(&l.nome)
        .bind(&l.razao_social)
        .bind(&l.cnpj)
        .bind(l.tem_integracao_api)
        .bind(&l.url_api)
        .bind(l.forma_envio)
        .bind(&l.url_portal)
        .bind(&l.email_envio)
        .bind(l.prazo_padrao_dias)
        .bind(l.aceita_urgencia)
        .bind(l.prazo_urgencia_horas)
        .bind(l.percentual_desconto)
        .bind(l.periodicidade_faturamento)
        .bind(&l.telefone)
        .bind(&l.email)
        .bind(&l.contato_nome)
        .bind(&l.observacoes)
        .bind(l.status)
        .bind(l.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<LaboratorioApoio>, AppError> {
        let lab = sqlx::query_as::<_, LaboratorioApoio>(
            "SELECT * FROM laboratorios_apoio WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lab)
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<LaboratorioApoio>, AppError> {
        let lab = sqlx::query_as::<_, LaboratorioApoio>(
            "SELECT * FROM laboratorios_apoio WHERE tenant_id = $1 AND codigo = $2",
        )
        .bind(tenant_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lab)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroLaboratorios,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<LaboratorioApoio>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM laboratorios_apoio");
        filtro_laboratorios(&mut count, tenant_id, filtro);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM laboratorios_apoio");
        filtro_laboratorios(&mut qb, tenant_id, filtro);
        qb.push(" ORDER BY nome ASC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        qb.push(" OFFSET ").push_bind(offset);

        let labs = qb.build_query_as::<LaboratorioApoio>().fetch_all(&self.pool).await?;
        Ok((labs, total))
    }
}

// =============================================================================
//  CONFIGURAÇÃO EXAME x LABORATÓRIO DE APOIO
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExameLaboratorioApoioRepository: Send + Sync {
    async fn insert(&self, config: &ExameLaboratorioApoio) -> Result<(), AppError>;

    /// Grava todos numa transação, com savepoint por item: uma falha descarta só
    /// aquele item. O vetor devolvido segue a ordem da entrada.
    async fn insert_lote(
        &self,
        itens: &[ExameLaboratorioApoio],
    ) -> Result<Vec<Result<(), AppError>>, AppError>;

    async fn update(&self, config: &ExameLaboratorioApoio) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ExameLaboratorioApoio>, AppError>;

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Option<ExameLaboratorioApoio>, AppError>;

    /// Mais recentes primeiro.
    async fn list(
        &self,
        tenant_id: Uuid,
        exame_id: Option<Uuid>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<ExameLaboratorioApoio>, i64), AppError>;

    async fn list_ativos_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameLaboratorioApoio>, AppError>;

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgExameLaboratorioApoioRepository {
    pool: PgPool,
}

impl PgExameLaboratorioApoioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn inserir_config<'e, E>(executor: E, c: &ExameLaboratorioApoio) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO exames_laboratorios_apoio (
            id, tenant_id, exame_id, laboratorio_apoio_id, codigo_exame_apoio,
            metodologia_id, unidade_medida_id, requer_peso, requer_altura, requer_volume,
            amostra_id, tipo_recipiente_id, preparo_geral, preparo_feminino, preparo_infantil,
            coleta_geral, coleta_feminino, coleta_infantil, tecnica_coleta, lembrete_coletora,
            distribuicao, prazo_entrega_dias, formatos_laudo, ativo, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
        "#,
    )
    .bind(c.id)
    .bind(c.tenant_id)
    .bind(c.exame_id)
    .bind(c.laboratorio_apoio_id)
    .bind(&c.codigo_exame_apoio)
    .bind(c.metodologia_id)
    .bind(c.unidade_medida_id)
    .bind(c.requer_peso)
    .bind(c.requer_altura)
    .bind(c.requer_volume)
    .bind(c.amostra_id)
    .bind(c.tipo_recipiente_id)
    .bind(&c.preparo_geral)
    .bind(&c.preparo_feminino)
    .bind(&c.preparo_infantil)
    .bind(&c.coleta_geral)
    .bind(&c.coleta_feminino)
    .bind(&c.coleta_infantil)
    .bind(&c.tecnica_coleta)
    .bind(&c.lembrete_coletora)
    .bind(&c.distribuicao)
    .bind(c.prazo_entrega_dias)
    .bind(&c.formatos_laudo)
    .bind(c.ativo)
    .bind(c.created_at)
    .bind(c.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl ExameLaboratorioApoioRepository for PgExameLaboratorioApoioRepository {
    async fn insert(&self, config: &ExameLaboratorioApoio) -> Result<(), AppError> {
        inserir_config(&self.pool, config)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_PAR_DUPLICADO))
    }

    async fn insert_lote(
        &self,
        itens: &[ExameLaboratorioApoio],
    ) -> Result<Vec<Result<(), AppError>>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut resultados = Vec::with_capacity(itens.len());

        for item in itens {
            let mut savepoint = Connection::begin(&mut *tx).await?;
            match inserir_config(&mut *savepoint, item).await {
                Ok(()) => {
                    savepoint.commit().await?;
                    resultados.push(Ok(()));
                }
                Err(e) => {
                    savepoint.rollback().await?;
                    tracing::warn!("Item do lote descartado: {}", e);
                    resultados.push(Err(AppError::unique_or(e, MSG_PAR_DUPLICADO)));
                }
            }
        }

        tx.commit().await?;
        Ok(resultados)
    }

    async fn update(&self, c: &ExameLaboratorioApoio) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE exames_laboratorios_apoio SET
                laboratorio_apoio_id = $3, codigo_exame_apoio = $4, metodologia_id = $5,
                unidade_medida_id = $6, requer_peso = $7, requer_altura = $8, requer_volume = $9,
                amostra_id = $10, tipo_recipiente_id = $11, preparo_geral = $12,
                preparo_feminino = $13, preparo_infantil = $14, coleta_geral = $15,
                coleta_feminino = $16, coleta_infantil = $17, tecnica_coleta = $18,
                lembrete_coletora = $19, distribuicao = $20, prazo_entrega_dias = $21,
                formatos_laudo = $22, ativo = $23, updated_at = $24
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(c.laboratorio_apoio_id)
        .bind(&c.codigo_exame_apoio)
        .bind(c.metodologia_id)
        .bind(c.unidade_medida_id)
        .bind(c.requer_peso)
        .bind(c.requer_altura)
        .bind(c.requer_volume)
        .bind(c.amostra_id)
        .bind(c.tipo_recipiente_id)
        .bind(&c.preparo_geral)
        .bind(&c.preparo_feminino)
        .bind(&c.preparo_infantil)
        .bind(&c.coleta_geral)
        .bind(&c.coleta_feminino)
        .bind(&c.coleta_infantil)
        .bind(&c.tecnica_coleta)
        .bind(&c.lembrete_coletora)
        .bind(&c.distribuicao)
        .bind(c.prazo_entrega_dias)
        .bind(&c.formatos_laudo)
        .bind(c.ativo)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_PAR_DUPLICADO))?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ExameLaboratorioApoio>, AppError> {
        let config = sqlx::query_as::<_, ExameLaboratorioApoio>(
            "SELECT * FROM exames_laboratorios_apoio WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        exame_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Option<ExameLaboratorioApoio>, AppError> {
        let config = sqlx::query_as::<_, ExameLaboratorioApoio>(
            r#"
            SELECT * FROM exames_laboratorios_apoio
            WHERE tenant_id = $1 AND exame_id = $2 AND laboratorio_apoio_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(exame_id)
        .bind(laboratorio_apoio_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        exame_id: Option<Uuid>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<ExameLaboratorioApoio>, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM exames_laboratorios_apoio
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR exame_id = $2)
            "#,
        )
        .bind(tenant_id)
        .bind(exame_id)
        .fetch_one(&self.pool)
        .await?;

        // LIMIT NULL equivale a sem limite no Postgres.
        let configs = sqlx::query_as::<_, ExameLaboratorioApoio>(
            r#"
            SELECT * FROM exames_laboratorios_apoio
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR exame_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(exame_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((configs, total))
    }

    async fn list_ativos_by_laboratorio(
        &self,
        tenant_id: Uuid,
        laboratorio_apoio_id: Uuid,
    ) -> Result<Vec<ExameLaboratorioApoio>, AppError> {
        let configs = sqlx::query_as::<_, ExameLaboratorioApoio>(
            r#"
            SELECT * FROM exames_laboratorios_apoio
            WHERE tenant_id = $1 AND laboratorio_apoio_id = $2 AND ativo = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(laboratorio_apoio_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(configs)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM exames_laboratorios_apoio WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
