// src/db/exame_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        exame::{Exame, FiltroExames, OrdemExames, StatusCadastro},
        exame_unidade::ExameUnidade,
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe um exame com este código interno";
const MSG_UNIDADE_DUPLICADA: &str = "Exame já vinculado a esta unidade";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExameRepository: Send + Sync {
    /// Grava o exame e os vínculos de unidade numa única transação.
    async fn insert(&self, exame: &Exame, unidades: &[ExameUnidade]) -> Result<(), AppError>;

    async fn update(&self, exame: &Exame) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Exame>, AppError>;

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<Exame>, AppError>;

    /// Página filtrada + total. `limit = None` traz tudo.
    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroExames,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<Exame>, i64), AppError>;

    async fn update_status_many(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: StatusCadastro,
    ) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgExameRepository {
    pool: PgPool,
}

impl PgExameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Monta o WHERE comum à listagem e à contagem.
fn aplicar_filtro(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filtro: &FiltroExames) {
    qb.push(" WHERE tenant_id = ").push_bind(tenant_id);

    if let Some(busca) = &filtro.busca {
        let padrao = format!("%{}%", busca);
        qb.push(" AND (nome ILIKE ").push_bind(padrao.clone());
        if filtro.busca_sinonimos {
            qb.push(" OR EXISTS (SELECT 1 FROM unnest(sinonimos) s WHERE s ILIKE ")
                .push_bind(padrao)
                .push(")");
        }
        qb.push(")");
    }
    if let Some(status) = filtro.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(tipo) = filtro.tipo_exame_id {
        qb.push(" AND tipo_exame_id = ").push_bind(tipo);
    }
    if let Some(especialidade) = filtro.especialidade_id {
        qb.push(" AND especialidade_id = ").push_bind(especialidade);
    }
    if let Some(ids) = &filtro.ids {
        qb.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(preparo) = filtro.necessita_preparo {
        qb.push(" AND necessita_preparo = ").push_bind(preparo);
    }
    if let Some(tuss) = &filtro.codigo_tuss {
        qb.push(" AND codigo_tuss = ").push_bind(tuss.clone());
    }
    if let Some(amb) = &filtro.codigo_amb {
        qb.push(" AND codigo_amb = ").push_bind(amb.clone());
    }
    if let Some(sus) = &filtro.codigo_sus {
        qb.push(" AND codigo_sus = ").push_bind(sus.clone());
    }
}

const INSERT_EXAME: &str = r#"
    INSERT INTO exames (
        id, tenant_id, codigo_interno, nome, sinonimos,
        codigo_tuss, codigo_amb, codigo_sus, codigo_loinc, codigo_cbhpm,
        tipo_exame_id, categoria, subgrupo_id, setor_id, especialidade_id, metodologia_id, peso,
        amostra_id, tipo_recipiente_id, volume_minimo, volume_ideal,
        requer_peso, requer_altura, requer_volume,
        preparo_geral, preparo_feminino, preparo_infantil,
        coleta_geral, coleta_feminino, coleta_infantil,
        lembrete_coletora, lembrete_recepcionista_agendamento, lembrete_recepcionista_os,
        necessita_preparo, termo_consentimento,
        prazo_entrega_dias, formato_prazo, formatos_laudo, valores_referencia,
        status, empresa_id, criado_por, atualizado_por, created_at, updated_at
    )
    VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
        $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
        $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
        $31, $32, $33, $34, $35, $36, $37, $38, $39, $40,
        $41, $42, $43, $44, $45
    )
"#;

const UPDATE_EXAME: &str = r#"
    UPDATE exames SET
        codigo_interno = $3, nome = $4, sinonimos = $5,
        codigo_tuss = $6, codigo_amb = $7, codigo_sus = $8, codigo_loinc = $9, codigo_cbhpm = $10,
        tipo_exame_id = $11, categoria = $12, subgrupo_id = $13, setor_id = $14,
        especialidade_id = $15, metodologia_id = $16, peso = $17,
        amostra_id = $18, tipo_recipiente_id = $19, volume_minimo = $20, volume_ideal = $21,
        requer_peso = $22, requer_altura = $23, requer_volume = $24,
        preparo_geral = $25, preparo_feminino = $26, preparo_infantil = $27,
        coleta_geral = $28, coleta_feminino = $29, coleta_infantil = $30,
        lembrete_coletora = $31, lembrete_recepcionista_agendamento = $32,
        lembrete_recepcionista_os = $33,
        necessita_preparo = $34, termo_consentimento = $35,
        prazo_entrega_dias = $36, formato_prazo = $37, formatos_laudo = $38,
        valores_referencia = $39, status = $40, empresa_id = $41,
        criado_por = $42, atualizado_por = $43, created_at = $44, updated_at = $45
    WHERE id = $1 AND tenant_id = $2
"#;

// Os dois comandos usam a mesma ordem de parâmetros ($1 = id, $2 = tenant_id, ...).
fn bind_exame<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    e: &'q Exame,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(e.id)
        .bind(e.tenant_id)
        .bind(&e.codigo_interno)
        .bind(&e.nome)
        .bind(&e.sinonimos)
        .bind(&e.codigo_tuss)
        .bind(&e.codigo_amb)
        .bind(&e.codigo_sus)
        .bind(&e.codigo_loinc)
        .bind(&e.codigo_cbhpm)
        .bind(e.tipo_exame_id)
        .bind(e.categoria)
        .bind(e.subgrupo_id)
        .bind(e.setor_id)
        .bind(e.especialidade_id)
        .bind(e.metodologia_id)
        .bind(e.peso)
        .bind(e.amostra_id)
        .bind(e.tipo_recipiente_id)
        .bind(e.volume_minimo)
        .bind(e.volume_ideal)
        .bind(e.requer_peso)
        .bind(e.requer_altura)
        .bind(e.requer_volume)
        .bind(&e.preparo_geral)
        .bind(&e.preparo_feminino)
        .bind(&e.preparo_infantil)
        .bind(&e.coleta_geral)
        .bind(&e.coleta_feminino)
        .bind(&e.coleta_infantil)
        .bind(&e.lembrete_coletora)
        .bind(&e.lembrete_recepcionista_agendamento)
        .bind(&e.lembrete_recepcionista_os)
        .bind(e.necessita_preparo)
        .bind(&e.termo_consentimento)
        .bind(e.prazo_entrega_dias)
        .bind(&e.formato_prazo)
        .bind(&e.formatos_laudo)
        .bind(&e.valores_referencia)
        .bind(e.status)
        .bind(e.empresa_id)
        .bind(e.criado_por)
        .bind(e.atualizado_por)
        .bind(e.created_at)
        .bind(e.updated_at)
}

#[async_trait]
impl ExameRepository for PgExameRepository {
    async fn insert(&self, exame: &Exame, unidades: &[ExameUnidade]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        bind_exame(sqlx::query(INSERT_EXAME), exame)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;

        for unidade in unidades {
            super::exame_unidade_repo::inserir_vinculo(&mut *tx, unidade)
                .await
                .map_err(|e| AppError::unique_or(e, MSG_UNIDADE_DUPLICADA))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, exame: &Exame) -> Result<(), AppError> {
        bind_exame(sqlx::query(UPDATE_EXAME), exame)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Exame>, AppError> {
        let exame = sqlx::query_as::<_, Exame>(
            "SELECT * FROM exames WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exame)
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<Exame>, AppError> {
        let exame = sqlx::query_as::<_, Exame>(
            "SELECT * FROM exames WHERE tenant_id = $1 AND codigo_interno = $2",
        )
        .bind(tenant_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exame)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroExames,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<(Vec<Exame>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exames");
        aplicar_filtro(&mut count, tenant_id, filtro);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM exames");
        aplicar_filtro(&mut qb, tenant_id, filtro);
        qb.push(match filtro.ordem {
            OrdemExames::Nome => " ORDER BY nome ASC",
            OrdemExames::PesoDesc => " ORDER BY peso DESC NULLS LAST, nome ASC",
        });
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        qb.push(" OFFSET ").push_bind(offset);

        let exames = qb.build_query_as::<Exame>().fetch_all(&self.pool).await?;
        Ok((exames, total))
    }

    async fn update_status_many(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
        status: StatusCadastro,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE exames SET status = $3, updated_at = NOW() WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
