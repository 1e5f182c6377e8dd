// src/db/prestador_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::empresa_repo::{atualizar_empresa, carregar_empresas, inserir_empresa, MSG_CNPJ_DUPLICADO},
    models::{
        empresa::Empresa,
        prestador::{
            FiltroCategorias, PrestadorComEmpresa, PrestadorServico, PrestadorServicoCategoria,
            TipoServicoCategoria,
        },
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe um prestador de serviço com este código";
const MSG_CATEGORIA_DUPLICADA: &str = "Prestador já possui uma categoria deste tipo de serviço";

// =============================================================================
//  PRESTADOR DE SERVIÇO
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrestadorRepository: Send + Sync {
    /// Empresa e prestador na mesma transação.
    async fn insert(&self, prestador: &PrestadorServico, empresa: &Empresa) -> Result<(), AppError>;

    /// Grava prestador e empresa na mesma transação.
    async fn update(&self, prestador: &PrestadorServico, empresa: &Empresa) -> Result<(), AppError>;

    /// Só a linha do prestador (avaliação, contadores, status).
    async fn update_prestador(&self, prestador: &PrestadorServico) -> Result<(), AppError>;

    /// Remove o prestador e depois a empresa, na mesma transação.
    async fn delete(&self, tenant_id: Uuid, id: Uuid, empresa_id: Uuid) -> Result<bool, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<PrestadorComEmpresa>, AppError>;

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<PrestadorComEmpresa>, AppError>;

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<PrestadorComEmpresa>, AppError>;

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError>;
}

#[derive(Clone)]
pub struct PgPrestadorRepository {
    pool: PgPool,
}

impl PgPrestadorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Junta cada prestador com a sua empresa. Prestador sem empresa é descartado.
    async fn com_empresas(
        &self,
        tenant_id: Uuid,
        prestadores: Vec<PrestadorServico>,
    ) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        let ids: Vec<Uuid> = prestadores.iter().map(|p| p.empresa_id).collect();
        let mut empresas = carregar_empresas(&self.pool, tenant_id, &ids).await?;

        Ok(prestadores
            .into_iter()
            .filter_map(|prestador| {
                empresas
                    .remove(&prestador.empresa_id)
                    .map(|empresa| PrestadorComEmpresa { prestador, empresa })
            })
            .collect())
    }

    async fn com_empresa(
        &self,
        tenant_id: Uuid,
        prestador: Option<PrestadorServico>,
    ) -> Result<Option<PrestadorComEmpresa>, AppError> {
        match prestador {
            Some(p) => Ok(self.com_empresas(tenant_id, vec![p]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn gravar_prestador<'e, E>(executor: E, p: &PrestadorServico, novo: bool) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = if novo {
        r#"
        INSERT INTO prestadores_servico (
            id, tenant_id, empresa_id, codigo_prestador, tipo_contrato, numero_contrato,
            data_inicio_contrato, data_fim_contrato, renovacao_automatica, prazo_aviso_renovacao,
            forma_pagamento, valor_hora, valor_mensal, valor_minimo, prazo_pagamento,
            dia_vencimento, status_contrato, sla_resposta, sla_resolucao, suporte_24x7,
            atende_urgencia, taxa_urgencia, avaliacao_media, total_avaliacoes,
            total_servicos_prestados, observacoes, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
        "#
    } else {
        r#"
        UPDATE prestadores_servico SET
            empresa_id = $3, codigo_prestador = $4, tipo_contrato = $5, numero_contrato = $6,
            data_inicio_contrato = $7, data_fim_contrato = $8, renovacao_automatica = $9,
            prazo_aviso_renovacao = $10, forma_pagamento = $11, valor_hora = $12,
            valor_mensal = $13, valor_minimo = $14, prazo_pagamento = $15,
            dia_vencimento = $16, status_contrato = $17, sla_resposta = $18,
            sla_resolucao = $19, suporte_24x7 = $20, atende_urgencia = $21,
            taxa_urgencia = $22, avaliacao_media = $23, total_avaliacoes = $24,
            total_servicos_prestados = $25, observacoes = $26, created_at = $27, updated_at = $28
        WHERE id = $1 AND tenant_id = $2
        "#
    };

    sqlx::query(sql)
        .bind(p.id)
        .bind(p.tenant_id)
        .bind(p.empresa_id)
        .bind(&p.codigo_prestador)
        .bind(p.tipo_contrato)
        .bind(&p.numero_contrato)
        .bind(p.data_inicio_contrato)
        .bind(p.data_fim_contrato)
        .bind(p.renovacao_automatica)
        .bind(p.prazo_aviso_renovacao)
        .bind(p.forma_pagamento)
        .bind(p.valor_hora)
        .bind(p.valor_mensal)
        .bind(p.valor_minimo)
        .bind(p.prazo_pagamento)
        .bind(p.dia_vencimento)
        .bind(p.status_contrato)
        .bind(p.sla_resposta)
        .bind(p.sla_resolucao)
        .bind(p.suporte_24x7)
        .bind(p.atende_urgencia)
        .bind(p.taxa_urgencia)
        .bind(p.avaliacao_media)
        .bind(p.total_avaliacoes)
        .bind(p.total_servicos_prestados)
        .bind(&p.observacoes)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(executor)
        .await?;
    Ok(())
}

#[async_trait]
impl PrestadorRepository for PgPrestadorRepository {
    async fn insert(&self, prestador: &PrestadorServico, empresa: &Empresa) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        inserir_empresa(&mut *tx, empresa)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CNPJ_DUPLICADO))?;
        gravar_prestador(&mut *tx, prestador, true)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, prestador: &PrestadorServico, empresa: &Empresa) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        atualizar_empresa(&mut *tx, empresa)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CNPJ_DUPLICADO))?;
        gravar_prestador(&mut *tx, prestador, false)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_prestador(&self, prestador: &PrestadorServico) -> Result<(), AppError> {
        gravar_prestador(&self.pool, prestador, false)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid, empresa_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removidos = sqlx::query("DELETE FROM prestadores_servico WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM empresas WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(empresa_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removidos > 0)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<PrestadorComEmpresa>, AppError> {
        let prestador = sqlx::query_as::<_, PrestadorServico>(
            "SELECT * FROM prestadores_servico WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, prestador).await
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<PrestadorComEmpresa>, AppError> {
        let prestador = sqlx::query_as::<_, PrestadorServico>(
            "SELECT * FROM prestadores_servico WHERE tenant_id = $1 AND codigo_prestador = $2",
        )
        .bind(tenant_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, prestador).await
    }

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<PrestadorComEmpresa>, AppError> {
        let prestador = sqlx::query_as::<_, PrestadorServico>(
            "SELECT * FROM prestadores_servico WHERE tenant_id = $1 AND empresa_id = $2",
        )
        .bind(tenant_id)
        .bind(empresa_id)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, prestador).await
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<PrestadorComEmpresa>, AppError> {
        let prestadores = sqlx::query_as::<_, PrestadorServico>(
            "SELECT * FROM prestadores_servico WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        self.com_empresas(tenant_id, prestadores).await
    }
}

// =============================================================================
//  CATEGORIAS DE SERVIÇO
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoriaRepository: Send + Sync {
    async fn insert(&self, categoria: &PrestadorServicoCategoria) -> Result<(), AppError>;

    async fn update(&self, categoria: &PrestadorServicoCategoria) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<PrestadorServicoCategoria>, AppError>;

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        prestador_id: Uuid,
        tipo_servico: TipoServicoCategoria,
    ) -> Result<Option<PrestadorServicoCategoria>, AppError>;

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroCategorias,
    ) -> Result<Vec<PrestadorServicoCategoria>, AppError>;

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn delete_by_prestador(&self, tenant_id: Uuid, prestador_id: Uuid) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgCategoriaRepository {
    pool: PgPool,
}

impl PgCategoriaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoriaRepository for PgCategoriaRepository {
    async fn insert(&self, c: &PrestadorServicoCategoria) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO prestadores_servico_categorias (
                id, tenant_id, prestador_servico_id, tipo_servico, descricao_servico,
                valor_padrao, unidade_medida, prazo_execucao, periodicidade,
                responsavel_tecnico, telefone_responsavel, email_responsavel,
                requer_aprovacao, requer_orcamento, valor_limite_sem_aprovacao,
                ativo, observacoes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(c.prestador_servico_id)
        .bind(c.tipo_servico)
        .bind(&c.descricao_servico)
        .bind(c.valor_padrao)
        .bind(&c.unidade_medida)
        .bind(c.prazo_execucao)
        .bind(&c.periodicidade)
        .bind(&c.responsavel_tecnico)
        .bind(&c.telefone_responsavel)
        .bind(&c.email_responsavel)
        .bind(c.requer_aprovacao)
        .bind(c.requer_orcamento)
        .bind(c.valor_limite_sem_aprovacao)
        .bind(c.ativo)
        .bind(&c.observacoes)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CATEGORIA_DUPLICADA))?;
        Ok(())
    }

    async fn update(&self, c: &PrestadorServicoCategoria) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE prestadores_servico_categorias SET
                tipo_servico = $3, descricao_servico = $4, valor_padrao = $5,
                unidade_medida = $6, prazo_execucao = $7, periodicidade = $8,
                responsavel_tecnico = $9, telefone_responsavel = $10, email_responsavel = $11,
                requer_aprovacao = $12, requer_orcamento = $13,
                valor_limite_sem_aprovacao = $14, ativo = $15, observacoes = $16, updated_at = $17
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(c.id)
        .bind(c.tenant_id)
        .bind(c.tipo_servico)
        .bind(&c.descricao_servico)
        .bind(c.valor_padrao)
        .bind(&c.unidade_medida)
        .bind(c.prazo_execucao)
        .bind(&c.periodicidade)
        .bind(&c.responsavel_tecnico)
        .bind(&c.telefone_responsavel)
        .bind(&c.email_responsavel)
        .bind(c.requer_aprovacao)
        .bind(c.requer_orcamento)
        .bind(c.valor_limite_sem_aprovacao)
        .bind(c.ativo)
        .bind(&c.observacoes)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CATEGORIA_DUPLICADA))?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<PrestadorServicoCategoria>, AppError> {
        let categoria = sqlx::query_as::<_, PrestadorServicoCategoria>(
            "SELECT * FROM prestadores_servico_categorias WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(categoria)
    }

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        prestador_id: Uuid,
        tipo_servico: TipoServicoCategoria,
    ) -> Result<Option<PrestadorServicoCategoria>, AppError> {
        let categoria = sqlx::query_as::<_, PrestadorServicoCategoria>(
            r#"
            SELECT * FROM prestadores_servico_categorias
            WHERE tenant_id = $1 AND prestador_servico_id = $2 AND tipo_servico = $3
            "#,
        )
        .bind(tenant_id)
        .bind(prestador_id)
        .bind(tipo_servico)
        .fetch_optional(&self.pool)
        .await?;
        Ok(categoria)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroCategorias,
    ) -> Result<Vec<PrestadorServicoCategoria>, AppError> {
        let categorias = sqlx::query_as::<_, PrestadorServicoCategoria>(
            r#"
            SELECT * FROM prestadores_servico_categorias
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR prestador_servico_id = $2)
              AND ($3::tipo_servico_categoria IS NULL OR tipo_servico = $3)
              AND ($4::boolean IS NULL OR ativo = $4)
            ORDER BY tipo_servico ASC, created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filtro.prestador_id)
        .bind(filtro.tipo_servico)
        .bind(filtro.ativo)
        .fetch_all(&self.pool)
        .await?;
        Ok(categorias)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM prestadores_servico_categorias WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_prestador(&self, tenant_id: Uuid, prestador_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM prestadores_servico_categorias WHERE tenant_id = $1 AND prestador_servico_id = $2",
        )
        .bind(tenant_id)
        .bind(prestador_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
