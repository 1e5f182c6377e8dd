// src/db/convenio_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::empresa_repo::{carregar_empresas, inserir_empresa, MSG_CNPJ_DUPLICADO},
    models::{
        convenio::{Convenio, ConvenioComEmpresa},
        empresa::Empresa,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConvenioRepository: Send + Sync {
    /// Empresa e convênio na mesma transação.
    async fn insert(&self, convenio: &Convenio, empresa: &Empresa) -> Result<(), AppError>;

    async fn update(&self, convenio: &Convenio) -> Result<(), AppError>;

    /// Remove só o convênio; a empresa continua cadastrada.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ConvenioComEmpresa>, AppError>;

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<ConvenioComEmpresa>, AppError>;

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<ConvenioComEmpresa>, AppError>;
}

#[derive(Clone)]
pub struct PgConvenioRepository {
    pool: PgPool,
}

impl PgConvenioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn com_empresas(&self, tenant_id: Uuid, registros: Vec<Convenio>) -> Result<Vec<ConvenioComEmpresa>, AppError> {
        let ids: Vec<Uuid> = registros.iter().map(|c| c.empresa_id).collect();
        let mut empresas = carregar_empresas(&self.pool, tenant_id, &ids).await?;

        Ok(registros
            .into_iter()
            .filter_map(|convenio| {
                empresas
                    .remove(&convenio.empresa_id)
                    .map(|empresa| ConvenioComEmpresa { convenio, empresa })
            })
            .collect())
    }

    async fn com_empresa(&self, tenant_id: Uuid, registro: Option<Convenio>) -> Result<Option<ConvenioComEmpresa>, AppError> {
        match registro {
            Some(c) => Ok(self.com_empresas(tenant_id, vec![c]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ConvenioRepository for PgConvenioRepository {
    async fn insert(&self, c: &Convenio, empresa: &Empresa) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        inserir_empresa(&mut *tx, empresa)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CNPJ_DUPLICADO))?;

        sqlx::query(
            r#"
            INSERT INTO convenios (
                id, tenant_id, empresa_id, nome, registro_ans, matricula, tipo_convenio_id,
                forma_liquidacao_id, valor_ch, valor_filme, tiss, versao_tiss,
                codigo_operadora_tiss, codigo_operadora_autorizacao, codigo_prestador,
                envio_faturamento_id, fatura_ate_dia, dia_vencimento, data_contrato,
                data_ultimo_ajuste, instrucoes_faturamento, tabela_servico_id, tabela_base_id,
                tabela_material_id, cnes, co_participacao, nota_fiscal_exige_fatura, contato,
                instrucoes, observacoes_gerais, integracao_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33)
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(c.empresa_id)
        .bind(&c.nome)
        .bind(&c.registro_ans)
        .bind(&c.matricula)
        .bind(c.tipo_convenio_id)
        .bind(c.forma_liquidacao_id)
        .bind(c.valor_ch)
        .bind(c.valor_filme)
        .bind(c.tiss)
        .bind(&c.versao_tiss)
        .bind(&c.codigo_operadora_tiss)
        .bind(&c.codigo_operadora_autorizacao)
        .bind(&c.codigo_prestador)
        .bind(c.envio_faturamento_id)
        .bind(c.fatura_ate_dia)
        .bind(c.dia_vencimento)
        .bind(c.data_contrato)
        .bind(c.data_ultimo_ajuste)
        .bind(&c.instrucoes_faturamento)
        .bind(c.tabela_servico_id)
        .bind(c.tabela_base_id)
        .bind(c.tabela_material_id)
        .bind(&c.cnes)
        .bind(c.co_participacao)
        .bind(c.nota_fiscal_exige_fatura)
        .bind(&c.contato)
        .bind(&c.instrucoes)
        .bind(&c.observacoes_gerais)
        .bind(c.integracao_id)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, c: &Convenio) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE convenios SET
                nome = $3, registro_ans = $4, matricula = $5, tipo_convenio_id = $6,
                forma_liquidacao_id = $7, valor_ch = $8, valor_filme = $9, tiss = $10,
                versao_tiss = $11, codigo_operadora_tiss = $12, codigo_operadora_autorizacao = $13,
                codigo_prestador = $14, envio_faturamento_id = $15, fatura_ate_dia = $16,
                dia_vencimento = $17, data_contrato = $18, data_ultimo_ajuste = $19,
                instrucoes_faturamento = $20, tabela_servico_id = $21, tabela_base_id = $22,
                tabela_material_id = $23, cnes = $24, co_participacao = $25,
                nota_fiscal_exige_fatura = $26, contato = $27, instrucoes = $28,
                observacoes_gerais = $29, integracao_id = $30, updated_at = $31
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(&c.nome)
        .bind(&c.registro_ans)
        .bind(&c.matricula)
        .bind(c.tipo_convenio_id)
        .bind(c.forma_liquidacao_id)
        .bind(c.valor_ch)
        .bind(c.valor_filme)
        .bind(c.tiss)
        .bind(&c.versao_tiss)
        .bind(&c.codigo_operadora_tiss)
        .bind(&c.codigo_operadora_autorizacao)
        .bind(&c.codigo_prestador)
        .bind(c.envio_faturamento_id)
        .bind(c.fatura_ate_dia)
        .bind(c.dia_vencimento)
        .bind(c.data_contrato)
        .bind(c.data_ultimo_ajuste)
        .bind(&c.instrucoes_faturamento)
        .bind(c.tabela_servico_id)
        .bind(c.tabela_base_id)
        .bind(c.tabela_material_id)
        .bind(&c.cnes)
        .bind(c.co_participacao)
        .bind(c.nota_fiscal_exige_fatura)
        .bind(&c.contato)
        .bind(&c.instrucoes)
        .bind(&c.observacoes_gerais)
        .bind(c.integracao_id)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM convenios WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ConvenioComEmpresa>, AppError> {
        let registro = sqlx::query_as::<_, Convenio>("SELECT * FROM convenios WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.com_empresa(tenant_id, registro).await
    }

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<ConvenioComEmpresa>, AppError> {
        let registro = sqlx::query_as::<_, Convenio>(
            "SELECT * FROM convenios WHERE tenant_id = $1 AND empresa_id = $2",
        )
        .bind(tenant_id)
        .bind(empresa_id)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, registro).await
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<ConvenioComEmpresa>, AppError> {
        let registros = sqlx::query_as::<_, Convenio>(
            "SELECT * FROM convenios WHERE tenant_id = $1 ORDER BY nome ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        self.com_empresas(tenant_id, registros).await
    }
}
