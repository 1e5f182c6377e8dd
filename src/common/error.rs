use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Erro único da aplicação. Serviços e repositórios devolvem sempre este tipo,
// e os handlers só propagam com `?`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[source] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

pub const MSG_REFERENCIA_INEXISTENTE: &str = "Registro referenciado não existe";

// Chave estrangeira violada é erro do cliente (id inexistente), não do servidor.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if e.as_database_error().is_some_and(|db_err| db_err.is_foreign_key_violation()) {
            return AppError::BadRequest(MSG_REFERENCIA_INEXISTENTE.to_string());
        }
        AppError::DatabaseError(e)
    }
}

impl AppError {
    /// Converte violação de unicidade do Postgres em `Conflict` com a mensagem dada.
    /// Os demais erros seguem a conversão padrão de `sqlx::Error`.
    pub fn unique_or(e: sqlx::Error, message: impl Into<String>) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict(message.into());
            }
        }
        AppError::from(e)
    }

    /// Texto seguro para o cliente, usado quando o erro vai dentro de um corpo de sucesso
    /// (itens de lote). Erros internos não expõem detalhe.
    pub fn mensagem_cliente(&self) -> String {
        match self {
            AppError::ValidationError(errors) => {
                let field_errors = errors.field_errors();
                let mut campos: Vec<&str> = field_errors.keys().map(|c| c.as_ref()).collect();
                campos.sort_unstable();
                format!("Campos inválidos: {}", campos.join(", "))
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) | AppError::Forbidden(msg) => {
                msg.clone()
            }
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "Ocorreu um erro inesperado.".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) | AppError::BadRequest(msg) => msg,
            AppError::Forbidden(msg) => msg,
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),

            // DatabaseError e InternalServerError viram 500. O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapeia_variantes_para_status_http() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    // Erro de banco mínimo para simular as violações que o Postgres devolve
    #[derive(Debug)]
    struct ViolacaoPg {
        chave_estrangeira: bool,
    }

    impl std::fmt::Display for ViolacaoPg {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("violação de restrição")
        }
    }

    impl std::error::Error for ViolacaoPg {}

    impl sqlx::error::DatabaseError for ViolacaoPg {
        fn message(&self) -> &str {
            "violação de restrição"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.chave_estrangeira {
                sqlx::error::ErrorKind::ForeignKeyViolation
            } else {
                sqlx::error::ErrorKind::UniqueViolation
            }
        }
    }

    fn violacao(chave_estrangeira: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ViolacaoPg { chave_estrangeira }))
    }

    #[test]
    fn chave_estrangeira_violada_vira_bad_request() {
        let err = AppError::from(violacao(true));
        assert!(matches!(err, AppError::BadRequest(ref m) if m == MSG_REFERENCIA_INEXISTENTE));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::unique_or(violacao(true), "duplicado");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unicidade_violada_vira_conflito() {
        let err = AppError::unique_or(violacao(false), "duplicado");
        assert!(matches!(err, AppError::Conflict(ref m) if m == "duplicado"));
    }

    #[test]
    fn mensagem_do_cliente_nao_expoe_erro_interno() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        assert_eq!(err.mensagem_cliente(), "Ocorreu um erro inesperado.");
        assert_eq!(AppError::NotFound("Exame não encontrado".into()).mensagem_cliente(), "Exame não encontrado");
    }

    #[test]
    fn erro_que_nao_e_unicidade_continua_como_erro_de_banco() {
        let err = AppError::unique_or(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
