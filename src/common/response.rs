use serde::Serialize;
use utoipa::ToSchema;

/// Envelope padrão das respostas de sucesso: `{ message, data? }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self { message: message.into(), data: Some(data) }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: message.into(), data: None }
    }
}
