// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Helpers de mapeamento de erros do Postgres
// ---

/// Converte uma violação de UNIQUE no erro de domínio devolvido por `on_unique`.
/// Qualquer outro erro segue como `DatabaseError`.
pub(crate) fn unique_violation(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}

/// Igual ao anterior, mas para violações de FOREIGN KEY
/// (ex: apagar uma categoria que ainda tem produtos).
pub(crate) fn foreign_key_violation(e: sqlx::Error, on_fk: impl FnOnce() -> AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return on_fk();
        }
    }
    e.into()
}

/// `DELETE`/`UPDATE` que não afetou linhas = recurso inexistente (ou de outro tenant).
pub(crate) fn ensure_affected(rows: u64, entity: &'static str) -> Result<(), AppError> {
    if rows == 0 {
        return Err(AppError::NotFound(entity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_pass_through() {
        let err = unique_violation(sqlx::Error::RowNotFound, || AppError::EmailAlreadyExists);
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn zero_rows_is_not_found() {
        assert!(matches!(ensure_affected(0, "Cupom"), Err(AppError::NotFound("Cupom"))));
        assert!(ensure_affected(1, "Cupom").is_ok());
    }
}
