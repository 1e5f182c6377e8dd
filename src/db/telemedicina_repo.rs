// src/db/telemedicina_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::empresa_repo::{carregar_empresas, inserir_empresa, MSG_CNPJ_DUPLICADO},
    models::{
        empresa::Empresa,
        telemedicina::{FiltroTelemedicinaExame, Telemedicina, TelemedicinaComEmpresa, TelemedicinaExame},
    },
};

const MSG_CODIGO_DUPLICADO: &str = "Já existe uma telemedicina com este código";
const MSG_PAR_DUPLICADO: &str = "Este exame já está vinculado a esta telemedicina";

// =============================================================================
//  TELEMEDICINA
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemedicinaRepository: Send + Sync {
    /// Empresa e telemedicina na mesma transação.
    async fn insert(&self, telemedicina: &Telemedicina, empresa: &Empresa) -> Result<(), AppError>;

    async fn update(&self, telemedicina: &Telemedicina) -> Result<(), AppError>;

    /// Remove só a linha da telemedicina; a empresa continua cadastrada.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<TelemedicinaComEmpresa>, AppError>;

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<TelemedicinaComEmpresa>, AppError>;

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<TelemedicinaComEmpresa>, AppError>;

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaComEmpresa>, AppError>;
}

#[derive(Clone)]
pub struct PgTelemedicinaRepository {
    pool: PgPool,
}

impl PgTelemedicinaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn com_empresas(
        &self,
        tenant_id: Uuid,
        registros: Vec<Telemedicina>,
    ) -> Result<Vec<TelemedicinaComEmpresa>, AppError> {
        let ids: Vec<Uuid> = registros.iter().map(|t| t.empresa_id).collect();
        let mut empresas = carregar_empresas(&self.pool, tenant_id, &ids).await?;

        Ok(registros
            .into_iter()
            .filter_map(|telemedicina| {
                empresas
                    .remove(&telemedicina.empresa_id)
                    .map(|empresa| TelemedicinaComEmpresa { telemedicina, empresa })
            })
            .collect())
    }

    async fn com_empresa(
        &self,
        tenant_id: Uuid,
        registro: Option<Telemedicina>,
    ) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        match registro {
            Some(t) => Ok(self.com_empresas(tenant_id, vec![t]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TelemedicinaRepository for PgTelemedicinaRepository {
    async fn insert(&self, t: &Telemedicina, empresa: &Empresa) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        inserir_empresa(&mut *tx, empresa)
            .await
            .map_err(|e| AppError::unique_or(e, MSG_CNPJ_DUPLICADO))?;

        sqlx::query(
            r#"
            INSERT INTO telemedicina (
                id, tenant_id, empresa_id, codigo_telemedicina, tipo_integracao, url_integracao,
                status_integracao, tipo_plataforma, url_plataforma, teleconsulta, telediagnostico,
                telemonitoramento, tempo_consulta_padrao, valor_consulta_particular,
                percentual_repasse, integracao_id, observacoes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(t.id)
        .bind(t.tenant_id)
        .bind(t.empresa_id)
        .bind(&t.codigo_telemedicina)
        .bind(t.tipo_integracao)
        .bind(&t.url_integracao)
        .bind(t.status_integracao)
        .bind(t.tipo_plataforma)
        .bind(&t.url_plataforma)
        .bind(t.teleconsulta)
        .bind(t.telediagnostico)
        .bind(t.telemonitoramento)
        .bind(t.tempo_consulta_padrao)
        .bind(t.valor_consulta_particular)
        .bind(t.percentual_repasse)
        .bind(t.integracao_id)
        .bind(&t.observacoes)
        .bind(t.created_at)
        .bind(t.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_CODIGO_DUPLICADO))?;

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, t: &Telemedicina) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE telemedicina
            SET integracao_id = $3, observacoes = $4, updated_at = $5
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(t.id)
        .bind(t.tenant_id)
        .bind(t.integracao_id)
        .bind(&t.observacoes)
        .bind(t.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM telemedicina WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        let registro = sqlx::query_as::<_, Telemedicina>(
            "SELECT * FROM telemedicina WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, registro).await
    }

    async fn find_by_codigo(&self, tenant_id: Uuid, codigo: &str) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        let registro = sqlx::query_as::<_, Telemedicina>(
            "SELECT * FROM telemedicina WHERE tenant_id = $1 AND codigo_telemedicina = $2",
        )
        .bind(tenant_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, registro).await
    }

    async fn find_by_empresa(&self, tenant_id: Uuid, empresa_id: Uuid) -> Result<Option<TelemedicinaComEmpresa>, AppError> {
        let registro = sqlx::query_as::<_, Telemedicina>(
            "SELECT * FROM telemedicina WHERE tenant_id = $1 AND empresa_id = $2",
        )
        .bind(tenant_id)
        .bind(empresa_id)
        .fetch_optional(&self.pool)
        .await?;
        self.com_empresa(tenant_id, registro).await
    }

    async fn list(&self, tenant_id: Uuid) -> Result<Vec<TelemedicinaComEmpresa>, AppError> {
        let registros = sqlx::query_as::<_, Telemedicina>(
            "SELECT * FROM telemedicina WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        self.com_empresas(tenant_id, registros).await
    }
}

// =============================================================================
//  MAPEAMENTO EXAME x TELEMEDICINA
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemedicinaExameRepository: Send + Sync {
    async fn insert(&self, vinculo: &TelemedicinaExame) -> Result<(), AppError>;

    async fn update(&self, vinculo: &TelemedicinaExame) -> Result<(), AppError>;

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<TelemedicinaExame>, AppError>;

    async fn find_by_par(
        &self,
        tenant_id: Uuid,
        telemedicina_id: Uuid,
        exame_id: Uuid,
    ) -> Result<Option<TelemedicinaExame>, AppError>;

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroTelemedicinaExame,
    ) -> Result<Vec<TelemedicinaExame>, AppError>;

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgTelemedicinaExameRepository {
    pool: PgPool,
}

impl PgTelemedicinaExameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TelemedicinaExameRepository for PgTelemedicinaExameRepository {
    async fn insert(&self, v: &TelemedicinaExame) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO telemedicina_exames (
                id, tenant_id, telemedicina_id, exame_id, codigo_telemedicina,
                nome_exame_telemedicina, categoria_telemedicina, ativo, permite_upload_imagem,
                requer_especialista, tempo_laudo_padrao, valor_laudo, observacoes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(v.id)
        .bind(v.tenant_id)
        .bind(v.telemedicina_id)
        .bind(v.exame_id)
        .bind(&v.codigo_telemedicina)
        .bind(&v.nome_exame_telemedicina)
        .bind(&v.categoria_telemedicina)
        .bind(v.ativo)
        .bind(v.permite_upload_imagem)
        .bind(v.requer_especialista)
        .bind(v.tempo_laudo_padrao)
        .bind(v.valor_laudo)
        .bind(&v.observacoes)
        .bind(v.created_at)
        .bind(v.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_PAR_DUPLICADO))?;
        Ok(())
    }

    async fn update(&self, v: &TelemedicinaExame) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE telemedicina_exames SET
                telemedicina_id = $3, exame_id = $4, codigo_telemedicina = $5,
                nome_exame_telemedicina = $6, categoria_telemedicina = $7, ativo = $8,
                permite_upload_imagem = $9, requer_especialista = $10,
                tempo_laudo_padrao = $11, valor_laudo = $12, observacoes = $13, updated_at = $14
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(v.id)
        .bind(v.tenant_id)
        .bind(v.telemedicina_id)
        .bind(v.exame_id)
        .bind(&v.codigo_telemedicina)
        .bind(&v.nome_exame_telemedicina)
        .bind(&v.categoria_telemedicina)
        .bind(v.ativo)
        .bind(v.permite_upload_imagem)
        .bind(v.requer_especialista)
        .bind(v.tempo_laudo_padrao)
        .bind(v.valor_laudo)
        .bind(&v.observacoes)
        .bind(v.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::unique_or(e, MSG_PAR_DUPLICADO))?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<TelemedicinaExame>, AppError> {
        let vinculo = sqlx::query_as::<_, TelemedicinaExame>(
            "SELECT * FROM telemedicina_exames WHERE tenant_id = $1 AND id = $2",
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
        telemedicina_id: Uuid,
        exame_id: Uuid,
    ) -> Result<Option<TelemedicinaExame>, AppError> {
        let vinculo = sqlx::query_as::<_, TelemedicinaExame>(
            r#"
            SELECT * FROM telemedicina_exames
            WHERE tenant_id = $1 AND telemedicina_id = $2 AND exame_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(telemedicina_id)
        .bind(exame_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vinculo)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filtro: &FiltroTelemedicinaExame,
    ) -> Result<Vec<TelemedicinaExame>, AppError> {
        let vinculos = sqlx::query_as::<_, TelemedicinaExame>(
            r#"
            SELECT * FROM telemedicina_exames
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR telemedicina_id = $2)
              AND ($3::uuid IS NULL OR exame_id = $3)
              AND ($4::boolean IS NULL OR ativo = $4)
            ORDER BY nome_exame_telemedicina ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filtro.telemedicina_id)
        .bind(filtro.exame_id)
        .bind(filtro.ativo)
        .fetch_all(&self.pool)
        .await?;
        Ok(vinculos)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM telemedicina_exames WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
