// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::common::response::ApiResponse;

// O erro único da aplicação. Os services devolvem AppError e o IntoResponse
// abaixo transforma tudo no envelope padrão.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("O cabeçalho X-Tenant-ID é obrigatório e deve ser um UUID válido.")]
    TenantRequired,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("E-mail ou senha inválidos.")]
    InvalidCredentials,

    #[error("Token de autenticação inválido ou ausente.")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} não encontrado(a).")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Estoque insuficiente para '{product}'. Disponível: {available}.")]
    InsufficientStock { product: String, available: i32 },

    #[error("O carrinho está vazio.")]
    EmptyCart,

    #[error("Cupom inválido: {0}")]
    InvalidCoupon(String),

    #[error("Status inválido '{given}'. Valores aceitos: {allowed}.")]
    InvalidStatus { given: String, allowed: String },

    #[error("{0}")]
    StatusLocked(String),

    #[error("O profissional já possui um agendamento neste horário.")]
    SlotUnavailable,

    #[error("Token de redefinição inválido ou expirado.")]
    InvalidResetToken,

    #[error("Falha no serviço externo: {0}")]
    ExternalService(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de cache: {0}")]
    CacheError(#[from] redis::RedisError),

    #[error("Erro HTTP: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::TenantRequired
            | AppError::EmptyCart
            | AppError::InvalidCoupon(_)
            | AppError::InvalidStatus { .. }
            | AppError::StatusLocked(_)
            | AppError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::Conflict(_)
            | AppError::InsufficientStock { .. }
            | AppError::SlotUnavailable => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Código "de máquina" que o frontend usa para decidir o que mostrar.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::TenantRequired => "TENANT_REQUIRED",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::EmptyCart => "EMPTY_CART",
            AppError::InvalidCoupon(_) => "INVALID_COUPON",
            AppError::InvalidStatus { .. } | AppError::StatusLocked(_) => "INVALID_STATUS",
            AppError::SlotUnavailable => "SLOT_UNAVAILABLE",
            AppError::InvalidResetToken => "INVALID_RESET_TOKEN",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    // Detalhes por campo (só existem para erros de validação).
    fn field_errors(&self) -> Option<HashMap<String, Vec<String>>> {
        let AppError::ValidationError(errors) = self else {
            return None;
        };

        let mut details = HashMap::new();
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(m) => m.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            details.insert(field.to_string(), messages);
        }
        Some(details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Nunca vaza detalhes internos; o log fica com a mensagem completa.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else if let AppError::ValidationError(_) = self {
            "Um ou mais campos são inválidos.".to_string()
        } else {
            self.to_string()
        };

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            code: self.code().to_string(),
            message,
            data: None,
            errors: self.field_errors(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_renders_envelope() {
        let (status, json) = body_json(AppError::NotFound("Produto")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Produto não encontrado(a).");
        assert!(json["data"].is_null());
        assert!(json["errors"].is_null());
    }

    #[tokio::test]
    async fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("name", err);

        let (status, json) = body_json(AppError::ValidationError(errors)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"]["name"][0], "O nome é obrigatório.");
    }

    #[tokio::test]
    async fn unexpected_errors_hide_details() {
        let (status, json) =
            body_json(AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["message"], "Ocorreu um erro inesperado.");
    }

    #[test]
    fn domain_errors_map_to_expected_status() {
        let locked = AppError::StatusLocked("finalizado".into());
        assert_eq!(locked.status(), StatusCode::BAD_REQUEST);
        assert_eq!(locked.code(), "INVALID_STATUS");
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::SlotUnavailable.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InsufficientStock { product: "Café".into(), available: 1 }.code(),
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::TenantRequired.code(), "TENANT_REQUIRED");
    }
}
