// src/db/empresa_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::empresa::Empresa};

pub(crate) const MSG_CNPJ_DUPLICADO: &str = "Já existe uma empresa cadastrada com este CNPJ";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmpresaRepository: Send + Sync {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Empresa>, AppError>;

    async fn find_by_cnpj(&self, tenant_id: Uuid, cnpj: &str) -> Result<Option<Empresa>, AppError>;

    async fn update(&self, empresa: &Empresa) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgEmpresaRepository {
    pool: PgPool,
}

impl PgEmpresaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---
// Funções compartilhadas com os repositórios de prestador e telemedicina,
// que gravam a empresa dentro das próprias transações.
// ---

pub(crate) async fn inserir_empresa<'e, E>(executor: E, e: &Empresa) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO empresas (
            id, tenant_id, tipo_empresa, cnpj, razao_social, nome_fantasia, codigo_interno,
            inscricao_estadual, inscricao_municipal, telefone_fixo, celular, email_comercial,
            site_empresa, cep, rua, numero, bairro, complemento, cidade, estado,
            nome_responsavel, email_responsavel, ativo, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)
        "#,
    )
    .bind(e.id)
    .bind(e.tenant_id)
    .bind(e.tipo_empresa)
    .bind(&e.cnpj)
    .bind(&e.razao_social)
    .bind(&e.nome_fantasia)
    .bind(&e.codigo_interno)
    .bind(&e.inscricao_estadual)
    .bind(&e.inscricao_municipal)
    .bind(&e.telefone_fixo)
    .bind(&e.celular)
    .bind(&e.email_comercial)
    .bind(&e.site_empresa)
    .bind(&e.cep)
    .bind(&e.rua)
    .bind(&e.numero)
    .bind(&e.bairro)
    .bind(&e.complemento)
    .bind(&e.cidade)
    .bind(&e.estado)
    .bind(&e.nome_responsavel)
    .bind(&e.email_responsavel)
    .bind(e.ativo)
    .bind(e.created_at)
    .bind(e.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn atualizar_empresa<'e, E>(executor: E, e: &Empresa) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        UPDATE empresas SET
            cnpj = $3, razao_social = $4, nome_fantasia = $5, codigo_interno = $6,
            inscricao_estadual = $7, inscricao_municipal = $8, telefone_fixo = $9,
            celular = $10, email_comercial = $11, site_empresa = $12, cep = $13, rua = $14,
            numero = $15, bairro = $16, complemento = $17, cidade = $18, estado = $19,
            nome_responsavel = $20, email_responsavel = $21, ativo = $22, updated_at = $23
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(e.id)
    .bind(e.tenant_id)
    .bind(&e.cnpj)
    .bind(&e.razao_social)
    .bind(&e.nome_fantasia)
    .bind(&e.codigo_interno)
    .bind(&e.inscricao_estadual)
    .bind(&e.inscricao_municipal)
    .bind(&e.telefone_fixo)
    .bind(&e.celular)
    .bind(&e.email_comercial)
    .bind(&e.site_empresa)
    .bind(&e.cep)
    .bind(&e.rua)
    .bind(&e.numero)
    .bind(&e.bairro)
    .bind(&e.complemento)
    .bind(&e.cidade)
    .bind(&e.estado)
    .bind(&e.nome_responsavel)
    .bind(&e.email_responsavel)
    .bind(e.ativo)
    .bind(e.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Carrega as empresas de uma vez (evita N+1 nas listagens), indexadas por id.
pub(crate) async fn carregar_empresas(
    pool: &PgPool,
    tenant_id: Uuid,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Empresa>, sqlx::Error> {
    let empresas = sqlx::query_as::<_, Empresa>(
        "SELECT * FROM empresas WHERE tenant_id = $1 AND id = ANY($2)",
    )
    .bind(tenant_id)
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(empresas.into_iter().map(|e| (e.id, e)).collect())
}

#[async_trait]
impl EmpresaRepository for PgEmpresaRepository {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Empresa>, AppError> {
        let empresa = sqlx::query_as::<_, Empresa>(
            "SELECT * FROM empresas WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(empresa)
    }

    async fn find_by_cnpj(&self, tenant_id: Uuid, cnpj: &str) -> Result<Option<Empresa>, AppError> {
        let empresa = sqlx::query_as::<_, Empresa>(
            "SELECT * FROM empresas WHERE tenant_id = $1 AND cnpj = $2",
        )
        .bind(tenant_id)
        .bind(cnpj)
        .fetch_optional(&self.pool)
        .await?;
        Ok(empresa)
    }

    async fn update(&self, empresa: &Empresa) -> Result<(), AppError> {
        atualizar_empresa(&self.pool, empresa)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CNPJ_DUPLICADO))
    }
}
