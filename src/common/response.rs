// src/common/response.rs

use std::collections::HashMap;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

// Envelope padrão de todas as respostas da API:
// { success, code, message, data, errors }
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[schema(example = "OK")]
    pub code: String,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<HashMap<String, Vec<String>>>,
}

pub type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            code: "OK".to_string(),
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

/// 200 com dados.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    (StatusCode::OK, Json(ApiResponse::success("Operação realizada com sucesso.", data)))
}

/// 201 com o recurso criado.
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    (StatusCode::CREATED, Json(ApiResponse::success("Recurso criado com sucesso.", data)))
}

/// 200 só com mensagem (delete, logout, etc).
pub fn message(msg: impl Into<String>) -> ApiResult<()> {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            code: "OK".to_string(),
            message: msg.into(),
            data: None,
            errors: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_wraps_data_in_envelope() {
        let (status, Json(body)) = created(vec![1, 2, 3]);

        assert_eq!(status, StatusCode::CREATED);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["code"], "OK");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert!(json["errors"].is_null());
    }

    #[test]
    fn message_has_no_data() {
        let (status, Json(body)) = message("Removido.");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "Removido.");
        assert!(body.data.is_none());
    }
}
