// src/db/ordem_servico_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::ordem_servico::{OrdemServicoExame, ResultadoExame},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrdemServicoRepository: Send + Sync {
    async fn insert(&self, exame: &OrdemServicoExame) -> Result<(), AppError>;

    async fn update(&self, exame: &OrdemServicoExame) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<OrdemServicoExame>, AppError>;

    async fn list_by_ordem(&self, tenant_id: Uuid, ordem_servico_id: Uuid) -> Result<Vec<OrdemServicoExame>, AppError>;

    async fn insert_resultado(&self, resultado: &ResultadoExame) -> Result<(), AppError>;

    async fn update_resultado(&self, resultado: &ResultadoExame) -> Result<(), AppError>;

    async fn find_resultado(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ResultadoExame>, AppError>;

    async fn list_resultados(
        &self,
        tenant_id: Uuid,
        ordem_servico_exame_id: Uuid,
    ) -> Result<Vec<ResultadoExame>, AppError>;
}

#[derive(Clone)]
pub struct PgOrdemServicoRepository {
    pool: PgPool,
}

impl PgOrdemServicoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrdemServicoRepository for PgOrdemServicoRepository {
    async fn insert(&self, e: &OrdemServicoExame) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO ordens_servico_exames (
                id, tenant_id, ordem_servico_id, exame_id, laboratorio_apoio_id,
                codigo_amostra, codigo_barras, status, valor_total, valor_desconto,
                is_urgente, is_repeticao, motivo_repeticao, data_coleta, coletado_por,
                data_envio_apoio, data_inicio_analise, analista_id, data_liberacao,
                observacoes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(e.id)
        .bind(e.tenant_id)
        .bind(e.ordem_servico_id)
        .bind(e.exame_id)
        .bind(e.laboratorio_apoio_id)
        .bind(&e.codigo_amostra)
        .bind(&e.codigo_barras)
        .bind(e.status)
        .bind(e.valor_total)
        .bind(e.valor_desconto)
        .bind(e.is_urgente)
        .bind(e.is_repeticao)
        .bind(&e.motivo_repeticao)
        .bind(e.data_coleta)
        .bind(e.coletado_por)
        .bind(e.data_envio_apoio)
        .bind(e.data_inicio_analise)
        .bind(e.analista_id)
        .bind(e.data_liberacao)
        .bind(&e.observacoes)
        .bind(e.created_at)
        .bind(e.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, e: &OrdemServicoExame) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE ordens_servico_exames SET
                laboratorio_apoio_id = $3, codigo_amostra = $4, codigo_barras = $5,
                status = $6, valor_total = $7, valor_desconto = $8, is_urgente = $9,
                is_repeticao = $10, motivo_repeticao = $11, data_coleta = $12,
                coletado_por = $13, data_envio_apoio = $14, data_inicio_analise = $15,
                analista_id = $16, data_liberacao = $17, observacoes = $18, updated_at = $19
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(e.id)
        .bind(e.tenant_id)
        .bind(e.laboratorio_apoio_id)
        .bind(&e.codigo_amostra)
        .bind(&e.codigo_barras)
        .bind(e.status)
        .bind(e.valor_total)
        .bind(e.valor_desconto)
        .bind(e.is_urgente)
        .bind(e.is_repeticao)
        .bind(&e.motivo_repeticao)
        .bind(e.data_coleta)
        .bind(e.coletado_por)
        .bind(e.data_envio_apoio)
        .bind(e.data_inicio_analise)
        .bind(e.analista_id)
        .bind(e.data_liberacao)
        .bind(&e.observacoes)
        .bind(e.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<OrdemServicoExame>, AppError> {
        let exame = sqlx::query_as::<_, OrdemServicoExame>(
            "SELECT * FROM ordens_servico_exames WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exame)
    }

    async fn list_by_ordem(&self, tenant_id: Uuid, ordem_servico_id: Uuid) -> Result<Vec<OrdemServicoExame>, AppError> {
        let exames = sqlx::query_as::<_, OrdemServicoExame>(
            r#"
            SELECT * FROM ordens_servico_exames
            WHERE tenant_id = $1 AND ordem_servico_id = $2
            ORDER BY is_urgente DESC, created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(ordem_servico_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exames)
    }

    async fn insert_resultado(&self, r: &ResultadoExame) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resultados_exames (
                id, tenant_id, ordem_servico_exame_id, exame_id, parametro, resultado,
                resultado_numerico, resultado_texto, unidade, valor_referencia,
                valor_minimo, valor_maximo, classificacao, flag, fora_referencia,
                valor_critico, metodo, observacoes, versao, historico_versoes,
                data_revisao, revisado_por, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(r.id)
        .bind(r.tenant_id)
        .bind(r.ordem_servico_exame_id)
        .bind(r.exame_id)
        .bind(&r.parametro)
        .bind(&r.resultado)
        .bind(r.resultado_numerico)
        .bind(&r.resultado_texto)
        .bind(&r.unidade)
        .bind(&r.valor_referencia)
        .bind(r.valor_minimo)
        .bind(r.valor_maximo)
        .bind(r.classificacao)
        .bind(&r.flag)
        .bind(r.fora_referencia)
        .bind(r.valor_critico)
        .bind(&r.metodo)
        .bind(&r.observacoes)
        .bind(r.versao)
        .bind(&r.historico_versoes)
        .bind(r.data_revisao)
        .bind(r.revisado_por)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_resultado(&self, r: &ResultadoExame) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE resultados_exames SET
                resultado = $3, resultado_numerico = $4, resultado_texto = $5,
                classificacao = $6, fora_referencia = $7, valor_critico = $8,
                observacoes = $9, versao = $10, historico_versoes = $11,
                data_revisao = $12, revisado_por = $13, updated_at = $14
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(r.id)
        .bind(r.tenant_id)
        .bind(&r.resultado)
        .bind(r.resultado_numerico)
        .bind(&r.resultado_texto)
        .bind(r.classificacao)
        .bind(r.fora_referencia)
        .bind(r.valor_critico)
        .bind(&r.observacoes)
        .bind(r.versao)
        .bind(&r.historico_versoes)
        .bind(r.data_revisao)
        .bind(r.revisado_por)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_resultado(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ResultadoExame>, AppError> {
        let resultado = sqlx::query_as::<_, ResultadoExame>(
            "SELECT * FROM resultados_exames WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(resultado)
    }

    async fn list_resultados(
        &self,
        tenant_id: Uuid,
        ordem_servico_exame_id: Uuid,
    ) -> Result<Vec<ResultadoExame>, AppError> {
        let resultados = sqlx::query_as::<_, ResultadoExame>(
            r#"
            SELECT * FROM resultados_exames
            WHERE tenant_id = $1 AND ordem_servico_exame_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(ordem_servico_exame_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(resultados)
    }
}
