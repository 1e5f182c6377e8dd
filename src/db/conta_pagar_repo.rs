// src/db/conta_pagar_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::conta_pagar::{
        AnexoContaPagar, ComposicaoFinanceira, ContaPagar, ContaPagarDetalhe, FiltroContas,
        ImpostoRetido, NovaContaPagar, PagamentoParcela, Parcela,
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe uma conta a pagar com este código interno";
const MSG_PAGAMENTO_DUPLICADO: &str = "Esta parcela já possui pagamento registrado";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContaPagarRepository: Send + Sync {
    /// Conta, composições, impostos e parcelas numa única transação.
    async fn insert(&self, nova: &NovaContaPagar) -> Result<(), AppError>;

    async fn update(&self, conta: &ContaPagar) -> Result<(), AppError>;

    /// Remove a conta; os filhos saem em cascata.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ContaPagar>, AppError>;

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<ContaPagar>, AppError>;

    async fn find_detalhe(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ContaPagarDetalhe>, AppError>;

    /// Maior sequência numérica entre os códigos `{prefixo}{dígitos}` (ex.: `CAP2025`).
    async fn maior_sequencia(&self, tenant_id: Uuid, prefixo: &str) -> Result<Option<i64>, AppError>;

    async fn list(&self, tenant_id: Uuid, filtro: &FiltroContas) -> Result<Vec<ContaPagar>, AppError>;

    /// Parcela de uma conta do tenant.
    async fn find_parcela(&self, tenant_id: Uuid, parcela_id: Uuid) -> Result<Option<Parcela>, AppError>;

    async fn find_pagamento(&self, parcela_id: Uuid) -> Result<Option<PagamentoParcela>, AppError>;

    /// Grava o pagamento e atualiza a parcela na mesma transação.
    async fn registrar_pagamento(&self, parcela: &Parcela, pagamento: &PagamentoParcela) -> Result<(), AppError>;

    async fn insert_anexo(&self, anexo: &AnexoContaPagar) -> Result<(), AppError>;

    async fn list_anexos(&self, conta_pagar_id: Uuid) -> Result<Vec<AnexoContaPagar>, AppError>;
}

#[derive(Clone)]
pub struct PgContaPagarRepository {
    pool: PgPool,
}

impl PgContaPagarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContaPagarRepository for PgContaPagarRepository {
    async fn insert(&self, nova: &NovaContaPagar) -> Result<(), AppError> {
        let c = &nova.conta;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO contas_pagar (
                id, tenant_id, credor_tipo, credor_id, unidade_devedora_id, tipo_documento,
                numero_documento, descricao, valor_bruto, valor_liquido, competencia,
                data_emissao, codigo_interno, status, observacoes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(c.credor_tipo)
        .bind(c.credor_id)
        .bind(c.unidade_devedora_id)
        .bind(c.tipo_documento)
        .bind(&c.numero_documento)
        .bind(&c.descricao)
        .bind(c.valor_bruto)
        .bind(c.valor_liquido)
        .bind(&c.competencia)
        .bind(c.data_emissao)
        .bind(&c.codigo_interno)
        .bind(c.status)
        .bind(&c.observacoes)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;

        for comp in &nova.composicoes {
            sqlx::query(
                r#"
                INSERT INTO composicoes_financeiras (
                    id, conta_pagar_id, conta_contabil_id, centro_custo_id,
                    colaborador_id, colaborador_nome, valor
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(comp.id)
            .bind(comp.conta_pagar_id)
            .bind(comp.conta_contabil_id)
            .bind(comp.centro_custo_id)
            .bind(comp.colaborador_id)
            .bind(&comp.colaborador_nome)
            .bind(comp.valor)
            .execute(&mut *tx)
            .await?;
        }

        for imposto in &nova.impostos {
            sqlx::query(
                r#"
                INSERT INTO impostos_retidos (id, conta_pagar_id, tipo_imposto, percentual, valor_calculado)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(imposto.id)
            .bind(imposto.conta_pagar_id)
            .bind(imposto.tipo_imposto)
            .bind(imposto.percentual)
            .bind(imposto.valor_calculado)
            .execute(&mut *tx)
            .await?;
        }

        for p in &nova.parcelas {
            sqlx::query(
                r#"
                INSERT INTO parcelas (
                    id, conta_pagar_id, numero_parcela, total_parcelas, valor, data_vencimento,
                    data_pagamento, data_agendamento, status, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(p.id)
            .bind(p.conta_pagar_id)
            .bind(p.numero_parcela)
            .bind(p.total_parcelas)
            .bind(p.valor)
            .bind(p.data_vencimento)
            .bind(p.data_pagamento)
            .bind(p.data_agendamento)
            .bind(p.status)
            .bind(p.created_at)
            .bind(p.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, c: &ContaPagar) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE contas_pagar SET
                credor_tipo = $3, credor_id = $4, unidade_devedora_id = $5, tipo_documento = $6,
                numero_documento = $7, descricao = $8, valor_bruto = $9, valor_liquido = $10,
                competencia = $11, data_emissao = $12, status = $13, observacoes = $14,
                updated_at = $15
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(c.credor_tipo)
        .bind(c.credor_id)
        .bind(c.unidade_devedora_id)
        .bind(c.tipo_documento)
        .bind(&c.numero_documento)
        .bind(&c.descricao)
        .bind(c.valor_bruto)
        .bind(c.valor_liquido)
        .bind(&c.competencia)
        .bind(c.data_emissao)
        .bind(c.status)
        .bind(&c.observacoes)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM contas_pagar WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ContaPagar>, AppError> {
        let conta = sqlx::query_as::<_, ContaPagar>(
            "SELECT * FROM contas_pagar WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conta)
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<ContaPagar>, AppError> {
        let conta = sqlx::query_as::<_, ContaPagar>(
            "SELECT * FROM contas_pagar WHERE tenant_id = $1 AND codigo_interno = $2",
        )
        .bind(tenant_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conta)
    }

    async fn find_detalhe(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ContaPagarDetalhe>, AppError> {
        let Some(conta) = self.find_by_id(tenant_id, id).await? else {
            return Ok(None);
        };

        let parcelas = sqlx::query_as::<_, Parcela>(
            "SELECT * FROM parcelas WHERE conta_pagar_id = $1 ORDER BY numero_parcela ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let impostos_retidos = sqlx::query_as::<_, ImpostoRetido>(
            "SELECT * FROM impostos_retidos WHERE conta_pagar_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let composicoes_financeiras = sqlx::query_as::<_, ComposicaoFinanceira>(
            "SELECT * FROM composicoes_financeiras WHERE conta_pagar_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let anexos = self.list_anexos(id).await?;

        Ok(Some(ContaPagarDetalhe {
            conta,
            parcelas,
            impostos_retidos,
            composicoes_financeiras,
            anexos,
        }))
    }

    async fn maior_sequencia(&self, tenant_id: Uuid, prefixo: &str) -> Result<Option<i64>, AppError> {
        // Compara o sufixo como número: 'CAP202510000' vem depois de 'CAP20259999'
        let maior = sqlx::query_scalar::<_, Option<i64>>(
            r#"
            SELECT MAX(CAST(substring(codigo_interno FROM char_length($2) + 1) AS BIGINT))
            FROM contas_pagar
            WHERE tenant_id = $1 AND codigo_interno ~ ('^' || $2 || '[0-9]{1,18}$')
            "#,
        )
        .bind(tenant_id)
        .bind(prefixo)
        .fetch_one(&self.pool)
        .await?;
        Ok(maior)
    }

    async fn list(&self, tenant_id: Uuid, filtro: &FiltroContas) -> Result<Vec<ContaPagar>, AppError> {
        let contas = sqlx::query_as::<_, ContaPagar>(
            r#"
            SELECT * FROM contas_pagar
            WHERE tenant_id = $1
              AND ($2::status_conta_pagar IS NULL OR status = $2)
              AND ($3::credor_tipo IS NULL OR credor_tipo = $3)
              AND ($4::uuid IS NULL OR credor_id = $4)
            ORDER BY data_emissao DESC, created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(filtro.status)
        .bind(filtro.credor_tipo)
        .bind(filtro.credor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contas)
    }

    async fn find_parcela(&self, tenant_id: Uuid, parcela_id: Uuid) -> Result<Option<Parcela>, AppError> {
        let parcela = sqlx::query_as::<_, Parcela>(
            r#"
            SELECT p.* FROM parcelas p
            JOIN contas_pagar c ON c.id = p.conta_pagar_id
            WHERE c.tenant_id = $1 AND p.id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(parcela_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(parcela)
    }

    async fn find_pagamento(&self, parcela_id: Uuid) -> Result<Option<PagamentoParcela>, AppError> {
        let pagamento = sqlx::query_as::<_, PagamentoParcela>(
            "SELECT * FROM pagamentos_parcelas WHERE parcela_id = $1",
        )
        .bind(parcela_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pagamento)
    }

    async fn registrar_pagamento(&self, parcela: &Parcela, pag: &PagamentoParcela) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pagamentos_parcelas (
                id, parcela_id, forma_pagamento, conta_bancaria_id,
                codigo_barras, chave_pix, dados_bancarios, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(pag.id)
        .bind(pag.parcela_id)
        .bind(pag.forma_pagamento)
        .bind(pag.conta_bancaria_id)
        .bind(&pag.codigo_barras)
        .bind(&pag.chave_pix)
        .bind(&pag.dados_bancarios)
        .bind(pag.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_PAGAMENTO_DUPLICADO))?;

        sqlx::query(
            "UPDATE parcelas SET status = $2, data_pagamento = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(parcela.id)
        .bind(parcela.status)
        .bind(parcela.data_pagamento)
        .bind(parcela.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_anexo(&self, a: &AnexoContaPagar) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO anexos_contas_pagar (
                id, conta_pagar_id, tipo_anexo, nome_arquivo, caminho_arquivo,
                tamanho_bytes, mime_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(a.id)
        .bind(a.conta_pagar_id)
        .bind(a.tipo_anexo)
        .bind(&a.nome_arquivo)
        .bind(&a.caminho_arquivo)
        .bind(a.tamanho_bytes)
        .bind(&a.mime_type)
        .bind(a.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_anexos(&self, conta_pagar_id: Uuid) -> Result<Vec<AnexoContaPagar>, AppError> {
        let anexos = sqlx::query_as::<_, AnexoContaPagar>(
            "SELECT * FROM anexos_contas_pagar WHERE conta_pagar_id = $1 ORDER BY created_at ASC",
        )
        .bind(conta_pagar_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(anexos)
    }
}
